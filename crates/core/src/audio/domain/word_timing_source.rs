use std::path::Path;

use super::language_detector::{contains_non_latin, LanguageDetector, ScriptLanguageDetector};
use super::romanizer::Romanizer;
use super::timed_word::TimedWord;
use super::transcription_backend::{
    BackendKind, TimingSourceError, TranscriptionBackend, TranscriptionRequest,
};

/// Uniform word-timing capability over any transcription backend.
///
/// Post-processes raw backend output in two steps:
/// 1. Words in a non-Latin script are romanized, using the language hint
///    (or the word's own script when no hint was given) to pick the scheme.
/// 2. Every timestamp is shifted by the calibration offset and clamped at 0.
pub struct WordTimingSource {
    backend: Box<dyn TranscriptionBackend>,
    romanizer: Box<dyn Romanizer>,
    calibration_offset: f64,
}

impl WordTimingSource {
    pub fn new(
        backend: Box<dyn TranscriptionBackend>,
        romanizer: Box<dyn Romanizer>,
        calibration_offset: f64,
    ) -> Self {
        Self {
            backend,
            romanizer,
            calibration_offset,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn get_word_timings(
        &self,
        audio_path: &Path,
        language_hint: Option<&str>,
        guidance: Option<&[String]>,
    ) -> Result<Vec<TimedWord>, TimingSourceError> {
        let request = TranscriptionRequest::new(audio_path)
            .with_language(language_hint)
            .with_guidance(guidance);
        let raw = self.backend.transcribe(&request)?;

        Ok(raw
            .iter()
            .map(|w| self.romanized(w, language_hint).shifted(self.calibration_offset))
            .collect())
    }

    fn romanized(&self, word: &TimedWord, language_hint: Option<&str>) -> TimedWord {
        if !contains_non_latin(word.text()) {
            return word.clone();
        }
        let language = match language_hint {
            Some(code) => Some(code.to_string()),
            None => ScriptLanguageDetector.detect_language(word.text()),
        };
        match language {
            Some(code) if self.romanizer.supports(&code) => {
                word.with_text(self.romanizer.romanize(word.text(), &code))
            }
            _ => word.clone(),
        }
    }
}
