use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::timed_word::TimedWord;

/// The closed set of transcription capabilities the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Remote speech-to-text service.
    Cloud,
    /// Forced-alignment model run on this machine.
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Cloud => write!(f, "cloud"),
            BackendKind::Local => write!(f, "local"),
        }
    }
}

/// A backend failure. A successful call that hears nothing returns
/// `Ok(vec![])` instead.
#[derive(Error, Debug)]
pub enum TimingSourceError {
    #[error("{backend} backend unavailable: {reason}")]
    BackendUnavailable { backend: BackendKind, reason: String },
    #[error("{backend} backend timed out after {seconds}s")]
    Timeout { backend: BackendKind, seconds: u64 },
    #[error("model not found at {0}")]
    ModelMissing(PathBuf),
    #[error("could not decode audio: {0}")]
    Decode(String),
    #[error("{backend} transcription failed: {reason}")]
    Transcription { backend: BackendKind, reason: String },
}

/// Inputs for one transcription call.
#[derive(Debug, Clone, Copy)]
pub struct TranscriptionRequest<'a> {
    pub audio_path: &'a Path,
    pub language_hint: Option<&'a str>,
    /// Authoritative lyric words the backend may use to bias recognition.
    pub guidance: Option<&'a [String]>,
}

impl<'a> TranscriptionRequest<'a> {
    pub fn new(audio_path: &'a Path) -> Self {
        Self {
            audio_path,
            language_hint: None,
            guidance: None,
        }
    }

    pub fn with_language(mut self, language: Option<&'a str>) -> Self {
        self.language_hint = language;
        self
    }

    pub fn with_guidance(mut self, guidance: Option<&'a [String]>) -> Self {
        self.guidance = guidance;
        self
    }
}

/// Domain interface for producing raw word-level timestamps from audio.
///
/// Implementations report times exactly as the backend measured them;
/// calibration and romanization happen in `WordTimingSource`.
pub trait TranscriptionBackend: Send {
    fn kind(&self) -> BackendKind;

    fn transcribe(
        &self,
        request: &TranscriptionRequest<'_>,
    ) -> Result<Vec<TimedWord>, TimingSourceError>;
}
