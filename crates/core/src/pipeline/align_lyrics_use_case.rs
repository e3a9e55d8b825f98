use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::audio::domain::language_detector::LanguageDetector;
use crate::audio::domain::timed_word::TimedWord;
use crate::audio::domain::word_timing_source::WordTimingSource;
use crate::lyrics::domain::lyric_document::LyricDocument;
use crate::lyrics::domain::lyric_mapper::map_to_lyrics;
use crate::lyrics::domain::time_distribution::distribute_evenly;
use crate::media::domain::audio_reader::AudioReader;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::sync_config::SyncConfig;

/// Whether authoritative lyrics came with the request. Fixed for the whole
/// alignment run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LyricState {
    NoLyrics,
    HasLyrics(LyricDocument),
}

impl LyricState {
    /// Normalizes raw lyric text. Absent text, or text with no words left
    /// after stripping markup, means no lyrics.
    pub fn from_text(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return LyricState::NoLyrics;
        };
        let document = LyricDocument::normalize(raw);
        if document.is_empty() {
            LyricState::NoLyrics
        } else {
            LyricState::HasLyrics(document)
        }
    }

    /// Reads lyrics from an optional file. A missing or unreadable file is
    /// logged and treated as no lyrics.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return LyricState::NoLyrics;
        };
        match fs::read_to_string(path) {
            Ok(text) => Self::from_text(Some(&text)),
            Err(e) => {
                log::warn!("Could not read lyrics file {}: {e}", path.display());
                LyricState::NoLyrics
            }
        }
    }

    pub fn document(&self) -> Option<&LyricDocument> {
        match self {
            LyricState::HasLyrics(document) => Some(document),
            LyricState::NoLyrics => None,
        }
    }
}

/// The step that produced the final word timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentMethod {
    Cloud,
    TimeDistribution,
    Local,
}

impl AlignmentMethod {
    /// Attempt order.
    pub const ORDER: [AlignmentMethod; 3] = [
        AlignmentMethod::Cloud,
        AlignmentMethod::TimeDistribution,
        AlignmentMethod::Local,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AlignmentMethod::Cloud => "cloud",
            AlignmentMethod::TimeDistribution => "time_distribution",
            AlignmentMethod::Local => "local",
        }
    }
}

impl fmt::Display for AlignmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlignmentOutcome {
    pub words: Vec<TimedWord>,
    /// `None` when every step failed.
    pub method: Option<AlignmentMethod>,
    /// Language hint the backends were given.
    pub language: Option<String>,
}

enum Attempt {
    Aligned(Vec<TimedWord>),
    Skipped(&'static str),
    Failed(String),
}

/// Produces one canonical list of timed words for a track, trying each
/// timing source once in priority order:
///
/// 1. cloud transcription (mapped onto the lyrics when there are any),
/// 2. even distribution of the lyrics over the track (lyrics only),
/// 3. local transcription.
///
/// Never fails. When every step fails the outcome is empty, which yields a
/// video without captions.
pub struct AlignLyricsUseCase {
    cloud: Option<WordTimingSource>,
    local: Option<WordTimingSource>,
    reader: Box<dyn AudioReader>,
    detector: Box<dyn LanguageDetector>,
    config: SyncConfig,
}

impl AlignLyricsUseCase {
    pub fn new(
        cloud: Option<WordTimingSource>,
        local: Option<WordTimingSource>,
        reader: Box<dyn AudioReader>,
        detector: Box<dyn LanguageDetector>,
        config: SyncConfig,
    ) -> Self {
        Self {
            cloud,
            local,
            reader,
            detector,
            config,
        }
    }

    pub fn run(
        &self,
        audio_path: &Path,
        lyrics: &LyricState,
        declared_language: Option<&str>,
        logger: &mut dyn PipelineLogger,
    ) -> AlignmentOutcome {
        let language = self.language_hint(lyrics, declared_language);
        match (&language, lyrics) {
            (Some(code), LyricState::HasLyrics(doc)) => logger.info(&format!(
                "Aligning {} lyric words (language: {code})",
                doc.word_count()
            )),
            (None, LyricState::HasLyrics(doc)) => {
                logger.info(&format!("Aligning {} lyric words", doc.word_count()))
            }
            (_, LyricState::NoLyrics) => logger.info("No lyrics supplied, transcribing audio"),
        }
        if let LyricState::HasLyrics(doc) = lyrics {
            logger.metric("sections", doc.sections().len() as f64);
        }

        for method in AlignmentMethod::ORDER {
            let started = Instant::now();
            let attempt = match method {
                AlignmentMethod::Cloud => self.try_cloud(audio_path, lyrics, language.as_deref()),
                AlignmentMethod::TimeDistribution => self.try_time_distribution(audio_path, lyrics),
                AlignmentMethod::Local => self.try_local(audio_path, language.as_deref()),
            };
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            match attempt {
                Attempt::Aligned(words) => {
                    logger.timing(method.name(), elapsed_ms);
                    logger.metric("words", words.len() as f64);
                    logger.info(&format!("Aligned {} words via {method}", words.len()));
                    return AlignmentOutcome {
                        words,
                        method: Some(method),
                        language,
                    };
                }
                Attempt::Skipped(reason) => {
                    logger.info(&format!("Skipping {method} alignment: {reason}"));
                }
                Attempt::Failed(reason) => {
                    logger.timing(method.name(), elapsed_ms);
                    logger.warn(&format!("{method} alignment failed: {reason}"));
                }
            }
        }

        logger.warn("All alignment methods failed, captions will be empty");
        logger.metric("words", 0.0);
        AlignmentOutcome {
            words: Vec::new(),
            method: None,
            language,
        }
    }

    /// A declared language always wins; otherwise the lyric text is asked.
    fn language_hint(&self, lyrics: &LyricState, declared: Option<&str>) -> Option<String> {
        if let Some(code) = declared.map(str::trim).filter(|c| !c.is_empty()) {
            return Some(code.to_lowercase());
        }
        lyrics
            .document()
            .and_then(|doc| self.detector.detect_language(&doc.text()))
    }

    fn try_cloud(&self, audio_path: &Path, lyrics: &LyricState, language: Option<&str>) -> Attempt {
        let Some(source) = &self.cloud else {
            return Attempt::Skipped("no cloud backend configured");
        };

        match lyrics {
            LyricState::HasLyrics(doc) => {
                let lyric_words = doc.word_list();
                match source.get_word_timings(audio_path, language, Some(&lyric_words)) {
                    // Sung lyrics that transcribe to nothing is a miss, not an
                    // instrumental.
                    Ok(words) if words.is_empty() => {
                        Attempt::Failed("transcription returned no words".to_string())
                    }
                    Ok(words) => Attempt::Aligned(map_to_lyrics(
                        &words,
                        &lyric_words,
                        self.config.estimated_word_duration,
                    )),
                    Err(e) => Attempt::Failed(e.to_string()),
                }
            }
            LyricState::NoLyrics => match source.get_word_timings(audio_path, language, None) {
                Ok(words) => Attempt::Aligned(words),
                Err(e) => Attempt::Failed(e.to_string()),
            },
        }
    }

    fn try_time_distribution(&self, audio_path: &Path, lyrics: &LyricState) -> Attempt {
        let Some(doc) = lyrics.document() else {
            return Attempt::Skipped("no lyrics to distribute");
        };
        let duration = match self.reader.duration(audio_path) {
            Ok(d) => d,
            Err(e) => return Attempt::Failed(e.to_string()),
        };

        let words = distribute_evenly(
            &doc.word_list(),
            duration,
            self.config.lead_in_fraction,
            self.config.usable_fraction,
        );
        if words.is_empty() {
            return Attempt::Failed(format!("audio duration {duration}s leaves no room for words"));
        }
        Attempt::Aligned(words)
    }

    fn try_local(&self, audio_path: &Path, language: Option<&str>) -> Attempt {
        let Some(source) = &self.local else {
            return Attempt::Skipped("no local backend configured");
        };
        match source.get_word_timings(audio_path, language, None) {
            Ok(words) => Attempt::Aligned(words),
            Err(e) => Attempt::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::audio_segment::AudioSegment;
    use crate::audio::domain::language_detector::{NullLanguageDetector, ScriptLanguageDetector};
    use crate::audio::domain::romanizer::SchemeRomanizer;
    use crate::audio::domain::transcription_backend::{
        BackendKind, TimingSourceError, TranscriptionBackend, TranscriptionRequest,
    };
    use crate::media::domain::audio_reader::AudioReadError;
    use crate::pipeline::pipeline_logger::{NullPipelineLogger, StdoutPipelineLogger};
    use approx::assert_relative_eq;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    // ─── Stubs ───

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        language: Option<String>,
        guidance: Option<Vec<String>>,
    }

    type Calls = Arc<Mutex<Vec<Call>>>;

    struct StubBackend {
        kind: BackendKind,
        result: Result<Vec<TimedWord>, String>,
        calls: Calls,
    }

    impl TranscriptionBackend for StubBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn transcribe(
            &self,
            request: &TranscriptionRequest<'_>,
        ) -> Result<Vec<TimedWord>, TimingSourceError> {
            self.calls.lock().unwrap().push(Call {
                language: request.language_hint.map(String::from),
                guidance: request.guidance.map(<[String]>::to_vec),
            });
            self.result
                .clone()
                .map_err(|reason| TimingSourceError::BackendUnavailable {
                    backend: self.kind,
                    reason,
                })
        }
    }

    struct StubAudioReader {
        duration: Option<f64>,
        duration_reads: Arc<Mutex<usize>>,
    }

    impl AudioReader for StubAudioReader {
        fn read_audio(&self, _: &Path, rate: u32) -> Result<AudioSegment, AudioReadError> {
            Ok(AudioSegment::new(vec![0.0; rate as usize], rate, 1))
        }

        fn duration(&self, path: &Path) -> Result<f64, AudioReadError> {
            *self.duration_reads.lock().unwrap() += 1;
            self.duration.ok_or_else(|| AudioReadError::NoAudioDuration {
                path: path.to_path_buf(),
            })
        }
    }

    struct Harness {
        cloud: Option<Result<Vec<TimedWord>, String>>,
        local: Option<Result<Vec<TimedWord>, String>>,
        duration: Option<f64>,
        detector: Box<dyn LanguageDetector>,
        cloud_calls: Calls,
        local_calls: Calls,
        duration_reads: Arc<Mutex<usize>>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                cloud: None,
                local: None,
                duration: Some(30.0),
                detector: Box::new(NullLanguageDetector),
                cloud_calls: Calls::default(),
                local_calls: Calls::default(),
                duration_reads: Arc::default(),
            }
        }

        fn cloud(mut self, result: Result<Vec<TimedWord>, &str>) -> Self {
            self.cloud = Some(result.map_err(String::from));
            self
        }

        fn local(mut self, result: Result<Vec<TimedWord>, &str>) -> Self {
            self.local = Some(result.map_err(String::from));
            self
        }

        fn duration(mut self, duration: Option<f64>) -> Self {
            self.duration = duration;
            self
        }

        fn detector(mut self, detector: Box<dyn LanguageDetector>) -> Self {
            self.detector = detector;
            self
        }

        fn source(
            kind: BackendKind,
            result: Result<Vec<TimedWord>, String>,
            calls: &Calls,
        ) -> WordTimingSource {
            WordTimingSource::new(
                Box::new(StubBackend {
                    kind,
                    result,
                    calls: calls.clone(),
                }),
                Box::new(SchemeRomanizer),
                SyncConfig::default().calibration_offset,
            )
        }

        fn build(self) -> (AlignLyricsUseCase, Calls, Calls, Arc<Mutex<usize>>) {
            let cloud = self
                .cloud
                .map(|r| Self::source(BackendKind::Cloud, r, &self.cloud_calls));
            let local = self
                .local
                .map(|r| Self::source(BackendKind::Local, r, &self.local_calls));
            let reader = StubAudioReader {
                duration: self.duration,
                duration_reads: self.duration_reads.clone(),
            };
            let use_case = AlignLyricsUseCase::new(
                cloud,
                local,
                Box::new(reader),
                self.detector,
                SyncConfig::default(),
            );
            (use_case, self.cloud_calls, self.local_calls, self.duration_reads)
        }
    }

    fn audio() -> PathBuf {
        PathBuf::from("song.mp3")
    }

    fn lyrics() -> LyricState {
        LyricState::from_text(Some("[Verse]\nHello world\nGoodbye now"))
    }

    fn heard() -> Vec<TimedWord> {
        vec![
            TimedWord::new(0.5, 0.9, "hello"),
            TimedWord::new(0.9, 1.4, "world"),
            TimedWord::new(1.4, 1.8, "goodbye"),
            TimedWord::new(1.8, 2.3, "now"),
        ]
    }

    fn texts(outcome: &AlignmentOutcome) -> Vec<&str> {
        outcome.words.iter().map(|w| w.text()).collect()
    }

    // ─── Lyric state ───

    #[test]
    fn test_whitespace_or_marker_only_lyrics_are_no_lyrics() {
        assert_eq!(LyricState::from_text(None), LyricState::NoLyrics);
        assert_eq!(LyricState::from_text(Some("  \n\t ")), LyricState::NoLyrics);
        assert_eq!(LyricState::from_text(Some("[Intro]\n[Outro]")), LyricState::NoLyrics);
        assert!(matches!(lyrics(), LyricState::HasLyrics(_)));
    }

    #[test]
    fn test_missing_lyrics_file_is_no_lyrics() {
        let dir = tempfile::tempdir().unwrap();
        let state = LyricState::load(Some(&dir.path().join("absent.txt")));
        assert_eq!(state, LyricState::NoLyrics);
        assert_eq!(LyricState::load(None), LyricState::NoLyrics);
    }

    #[test]
    fn test_lyrics_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[Chorus]\nLa la, la").unwrap();
        let state = LyricState::load(Some(file.path()));
        assert_eq!(state.document().unwrap().word_list(), vec!["La", "la,", "la"]);
    }

    // ─── Cloud step ───

    #[test]
    fn test_cloud_result_is_mapped_onto_lyrics() {
        let (uc, cloud_calls, local_calls, duration_reads) =
            Harness::new().cloud(Ok(heard())).local(Ok(vec![])).build();

        let outcome = uc.run(&audio(), &lyrics(), None, &mut NullPipelineLogger);

        assert_eq!(outcome.method, Some(AlignmentMethod::Cloud));
        assert_eq!(texts(&outcome), vec!["Hello", "world", "Goodbye", "now"]);
        // Calibration shifts everything 0.2s earlier
        assert_relative_eq!(outcome.words[0].start(), 0.3, epsilon = 1e-9);
        assert_relative_eq!(outcome.words[3].end(), 2.1, epsilon = 1e-9);

        let calls = cloud_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].guidance.as_deref(),
            Some(&["Hello", "world", "Goodbye", "now"].map(String::from)[..])
        );
        assert!(local_calls.lock().unwrap().is_empty());
        assert_eq!(*duration_reads.lock().unwrap(), 0);
    }

    #[test]
    fn test_partial_cloud_result_extrapolates_remaining_lyrics() {
        let (uc, ..) = Harness::new().cloud(Ok(heard()[..2].to_vec())).build();

        let outcome = uc.run(&audio(), &lyrics(), None, &mut NullPipelineLogger);

        assert_eq!(outcome.words.len(), 4);
        assert_relative_eq!(outcome.words[2].start(), outcome.words[1].end());
        assert_relative_eq!(outcome.words[3].duration(), 0.35, epsilon = 1e-9);
    }

    #[test]
    fn test_no_lyrics_cloud_result_is_used_verbatim() {
        let (uc, cloud_calls, ..) = Harness::new().cloud(Ok(heard())).build();

        let outcome = uc.run(&audio(), &LyricState::NoLyrics, None, &mut NullPipelineLogger);

        assert_eq!(outcome.method, Some(AlignmentMethod::Cloud));
        assert_eq!(texts(&outcome), vec!["hello", "world", "goodbye", "now"]);
        assert_eq!(cloud_calls.lock().unwrap()[0].guidance, None);
    }

    #[test]
    fn test_no_lyrics_empty_cloud_result_is_instrumental() {
        let (uc, _, local_calls, _) = Harness::new().cloud(Ok(vec![])).local(Ok(heard())).build();

        let outcome = uc.run(&audio(), &LyricState::NoLyrics, None, &mut NullPipelineLogger);

        assert_eq!(outcome.method, Some(AlignmentMethod::Cloud));
        assert!(outcome.words.is_empty());
        assert!(local_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_cloud_result_with_lyrics_falls_back() {
        let (uc, ..) = Harness::new().cloud(Ok(vec![])).build();

        let outcome = uc.run(&audio(), &lyrics(), None, &mut NullPipelineLogger);

        assert_eq!(outcome.method, Some(AlignmentMethod::TimeDistribution));
        assert_eq!(outcome.words.len(), 4);
    }

    // ─── Fallback chain ───

    #[test]
    fn test_failed_backends_fall_back_to_time_distribution() {
        let (uc, cloud_calls, local_calls, _) = Harness::new()
            .cloud(Err("quota exceeded"))
            .local(Err("no model"))
            .duration(Some(30.0))
            .build();
        let mut logger = StdoutPipelineLogger::new();

        let outcome = uc.run(&audio(), &lyrics(), None, &mut logger);

        assert_eq!(outcome.method, Some(AlignmentMethod::TimeDistribution));
        assert_eq!(texts(&outcome), vec!["Hello", "world", "Goodbye", "now"]);
        assert_relative_eq!(outcome.words[0].start(), 1.5, epsilon = 1e-9);
        assert_relative_eq!(outcome.words[3].end(), 28.5, epsilon = 1e-9);
        for w in &outcome.words {
            assert_relative_eq!(w.duration(), 27.0 / 4.0, epsilon = 1e-9);
        }
        assert_eq!(cloud_calls.lock().unwrap().len(), 1);
        assert!(local_calls.lock().unwrap().is_empty());
        assert_eq!(logger.timings_for("cloud").map(<[f64]>::len), Some(1));
        assert_eq!(logger.metric_value("words"), Some(4.0));
        assert_eq!(logger.metric_value("sections"), Some(1.0));
    }

    #[test]
    fn test_unreadable_duration_falls_through_to_local() {
        let (uc, _, local_calls, duration_reads) = Harness::new()
            .cloud(Err("network down"))
            .local(Ok(heard()))
            .duration(None)
            .build();

        let outcome = uc.run(&audio(), &lyrics(), None, &mut NullPipelineLogger);

        assert_eq!(outcome.method, Some(AlignmentMethod::Local));
        // Local output is not mapped onto the lyrics
        assert_eq!(texts(&outcome), vec!["hello", "world", "goodbye", "now"]);
        assert_eq!(*duration_reads.lock().unwrap(), 1);
        assert_eq!(local_calls.lock().unwrap()[0].guidance, None);
    }

    #[test]
    fn test_no_lyrics_skips_time_distribution() {
        let (uc, _, local_calls, duration_reads) = Harness::new()
            .cloud(Err("credentials rejected"))
            .local(Ok(heard()))
            .build();

        let outcome = uc.run(&audio(), &LyricState::NoLyrics, None, &mut NullPipelineLogger);

        assert_eq!(outcome.method, Some(AlignmentMethod::Local));
        assert_eq!(*duration_reads.lock().unwrap(), 0);
        assert_eq!(local_calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_no_backends_with_lyrics_uses_time_distribution() {
        let (uc, ..) = Harness::new().build();
        let outcome = uc.run(&audio(), &lyrics(), None, &mut NullPipelineLogger);
        assert_eq!(outcome.method, Some(AlignmentMethod::TimeDistribution));
    }

    #[test]
    fn test_total_exhaustion_returns_empty_outcome() {
        let (uc, cloud_calls, local_calls, _) = Harness::new()
            .cloud(Err("timeout"))
            .local(Err("model missing"))
            .duration(None)
            .build();
        let mut logger = StdoutPipelineLogger::new();

        let outcome = uc.run(&audio(), &lyrics(), None, &mut logger);

        assert_eq!(outcome.method, None);
        assert!(outcome.words.is_empty());
        assert_eq!(cloud_calls.lock().unwrap().len(), 1);
        assert_eq!(local_calls.lock().unwrap().len(), 1);
        assert_eq!(logger.metric_value("words"), Some(0.0));
    }

    #[test]
    fn test_no_backends_and_no_lyrics_is_empty() {
        let (uc, ..) = Harness::new().build();
        let outcome = uc.run(&audio(), &LyricState::NoLyrics, None, &mut NullPipelineLogger);
        assert_eq!(outcome.method, None);
        assert!(outcome.words.is_empty());
    }

    // ─── Language hint ───

    #[test]
    fn test_detected_language_is_passed_to_backends() {
        let (uc, cloud_calls, ..) = Harness::new()
            .cloud(Ok(vec![TimedWord::new(1.0, 1.5, "привет")]))
            .detector(Box::new(ScriptLanguageDetector))
            .build();
        let lyrics = LyricState::from_text(Some("Привет мир"));

        let outcome = uc.run(&audio(), &lyrics, None, &mut NullPipelineLogger);

        assert_eq!(outcome.language.as_deref(), Some("ru"));
        assert_eq!(cloud_calls.lock().unwrap()[0].language.as_deref(), Some("ru"));
        assert_eq!(texts(&outcome), vec!["Привет", "мир"]);
    }

    #[test]
    fn test_declared_language_wins_over_detection() {
        let (uc, cloud_calls, ..) = Harness::new()
            .cloud(Err("down"))
            .detector(Box::new(ScriptLanguageDetector))
            .build();
        let lyrics = LyricState::from_text(Some("Привет мир"));

        let outcome = uc.run(&audio(), &lyrics, Some(" UK "), &mut NullPipelineLogger);

        assert_eq!(outcome.language.as_deref(), Some("uk"));
        assert_eq!(cloud_calls.lock().unwrap()[0].language.as_deref(), Some("uk"));
    }

    #[test]
    fn test_no_lyrics_and_no_declaration_has_no_hint() {
        let (uc, cloud_calls, ..) = Harness::new()
            .cloud(Ok(heard()))
            .detector(Box::new(ScriptLanguageDetector))
            .build();

        uc.run(&audio(), &LyricState::NoLyrics, None, &mut NullPipelineLogger);

        assert_eq!(cloud_calls.lock().unwrap()[0].language, None);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(AlignmentMethod::TimeDistribution.to_string(), "time_distribution");
        let json = serde_json::to_value(AlignmentMethod::Local).unwrap();
        assert_eq!(json, "local");
    }
}
