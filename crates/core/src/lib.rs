pub mod audio;
pub mod captions;
pub mod lyrics;
pub mod media;
pub mod pipeline;
pub mod shared;
