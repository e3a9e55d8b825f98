pub mod lyric_document;
pub mod lyric_mapper;
pub mod time_distribution;
