pub mod cloud_transcriber;
pub mod whisper_aligner;
