use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::audio::domain::audio_segment::AudioSegment;

#[derive(Error, Debug)]
pub enum AudioReadError {
    #[error("audio file not found: {0}")]
    NotFound(PathBuf),
    #[error("{path} has no audio stream")]
    NoAudioStream { path: PathBuf },
    #[error("could not determine duration of {path}")]
    NoAudioDuration { path: PathBuf },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Domain interface for reading an audio file.
pub trait AudioReader: Send + Sync {
    /// Decode the audio track to mono PCM at the given sample rate.
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<AudioSegment, AudioReadError>;

    /// Length of the audio track in seconds, without decoding it.
    fn duration(&self, path: &Path) -> Result<f64, AudioReadError>;
}
