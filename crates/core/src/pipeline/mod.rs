pub mod align_lyrics_use_case;
pub mod build_captions_use_case;
pub mod pipeline_logger;
