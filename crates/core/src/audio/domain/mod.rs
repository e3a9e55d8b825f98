pub mod audio_segment;
pub mod language_detector;
pub mod romanizer;
pub mod timed_word;
pub mod transcription_backend;
pub mod word_timing_source;
