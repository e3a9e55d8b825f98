use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Duration;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::domain::timed_word::TimedWord;
use crate::audio::domain::transcription_backend::{
    BackendKind, TimingSourceError, TranscriptionBackend, TranscriptionRequest,
};
use crate::media::domain::audio_reader::AudioReader;
use crate::shared::constants::{WHISPER_MODEL_NAME, WHISPER_MODEL_URL, WHISPER_SAMPLE_RATE};
use crate::shared::model_resolver::{self, ProgressFn};
use crate::shared::timeout::{run_with_timeout, CancelFlag, Deadline};

/// One decoded token with its timestamps in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedToken {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// The tokens of one recognized segment.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedSegment {
    pub tokens: Vec<AlignedToken>,
}

enum ModelSource {
    Ready(PathBuf),
    OnDemand {
        explicit: Option<PathBuf>,
        progress: Option<ProgressFn>,
    },
}

/// Local forced alignment using whisper.cpp via whisper-rs.
///
/// Runs entirely on this machine. Inference happens on a worker thread and
/// is cancelled after `timeout`.
pub struct WhisperAligner {
    model: Mutex<ModelSource>,
    reader: Box<dyn AudioReader>,
    timeout: Duration,
}

impl WhisperAligner {
    /// The model is resolved (and downloaded if needed) on the first
    /// transcription, so runs that never reach local alignment never touch
    /// the cache or the network.
    pub fn new(
        explicit_model: Option<&Path>,
        reader: Box<dyn AudioReader>,
        timeout: Duration,
        progress: Option<ProgressFn>,
    ) -> Self {
        Self {
            model: Mutex::new(ModelSource::OnDemand {
                explicit: explicit_model.map(Path::to_path_buf),
                progress,
            }),
            reader,
            timeout,
        }
    }

    fn resolve_model(&self) -> Result<PathBuf, TimingSourceError> {
        let unavailable = |reason: String| TimingSourceError::BackendUnavailable {
            backend: BackendKind::Local,
            reason,
        };
        let mut model = self
            .model
            .lock()
            .map_err(|_| unavailable("model lock poisoned".to_string()))?;

        let path = match &mut *model {
            ModelSource::Ready(path) => return Ok(path.clone()),
            ModelSource::OnDemand { explicit, progress } => {
                log::info!("Resolving model: {WHISPER_MODEL_NAME}");
                model_resolver::resolve(
                    WHISPER_MODEL_NAME,
                    WHISPER_MODEL_URL,
                    explicit.as_deref(),
                    progress.take(),
                )
                .map_err(|e| unavailable(e.to_string()))?
            }
        };
        *model = ModelSource::Ready(path.clone());
        Ok(path)
    }
}

impl TranscriptionBackend for WhisperAligner {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn transcribe(
        &self,
        request: &TranscriptionRequest<'_>,
    ) -> Result<Vec<TimedWord>, TimingSourceError> {
        let audio = self
            .reader
            .read_audio(request.audio_path, WHISPER_SAMPLE_RATE)
            .map_err(|e| TimingSourceError::Decode(e.to_string()))?;
        let samples = audio.mono_samples().into_owned();
        let model_path = self.resolve_model()?;
        let language = request.language_hint.map(String::from);

        log::info!(
            "Running local alignment on {:.1}s of audio (language: {})",
            audio.duration(),
            language.as_deref().unwrap_or("auto")
        );

        match run_with_timeout("whisper-align", self.timeout, move |cancel| {
            run_inference(&model_path, &samples, language.as_deref(), cancel)
        }) {
            Deadline::Completed(result) => Ok(expand_segments(&result?)),
            Deadline::TimedOut => Err(TimingSourceError::Timeout {
                backend: BackendKind::Local,
                seconds: self.timeout.as_secs(),
            }),
            Deadline::Abandoned => Err(TimingSourceError::Transcription {
                backend: BackendKind::Local,
                reason: "inference worker stopped without a result".to_string(),
            }),
        }
    }
}

fn run_inference(
    model_path: &Path,
    samples: &[f32],
    language: Option<&str>,
    cancel: CancelFlag,
) -> Result<Vec<AlignedSegment>, TimingSourceError> {
    let failed = |reason: String| TimingSourceError::Transcription {
        backend: BackendKind::Local,
        reason,
    };

    if !model_path.exists() {
        return Err(TimingSourceError::ModelMissing(model_path.to_path_buf()));
    }
    if cancel.load(Ordering::Relaxed) {
        return Ok(Vec::new());
    }

    let ctx = WhisperContext::new_with_params(
        model_path
            .to_str()
            .ok_or_else(|| failed("model path is not valid UTF-8".to_string()))?,
        WhisperContextParameters::default(),
    )
    .map_err(|e| failed(format!("failed to load Whisper model: {e}")))?;

    let mut state = ctx
        .create_state()
        .map_err(|e| failed(format!("failed to create Whisper state: {e}")))?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(Some(language.unwrap_or("auto")));
    params.set_translate(false);
    params.set_token_timestamps(true);
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);
    params.set_n_threads(num_cpus().min(4) as i32);
    params.set_abort_callback_safe(Box::new(move || cancel.load(Ordering::Relaxed)));

    state
        .full(params, samples)
        .map_err(|e| failed(format!("Whisper inference failed: {e}")))?;

    let mut segments = Vec::new();
    for seg_idx in 0..state.full_n_segments() {
        let Some(segment) = state.get_segment(seg_idx) else {
            continue;
        };

        let mut tokens = Vec::new();
        for tok_idx in 0..segment.n_tokens() {
            let Some(token) = segment.get_token(tok_idx) else {
                continue;
            };
            let Ok(text) = token.to_str() else {
                continue;
            };
            let data = token.token_data();
            // Token timestamps are in centiseconds
            tokens.push(AlignedToken {
                text: text.to_string(),
                start: data.t0 as f64 / 100.0,
                end: data.t1 as f64 / 100.0,
            });
        }

        segments.push(AlignedSegment { tokens });
    }
    Ok(segments)
}

/// Flattens segments into words by walking each segment's tokens.
pub fn expand_segments(segments: &[AlignedSegment]) -> Vec<TimedWord> {
    segments
        .iter()
        .flat_map(|segment| merge_tokens(&segment.tokens))
        .collect()
}

/// Joins sub-word tokens into words. A token with leading whitespace opens
/// a new word; special tokens (`[_BEG_]`, `<|en|>`) and tokens with an
/// empty time range are dropped.
pub fn merge_tokens(tokens: &[AlignedToken]) -> Vec<TimedWord> {
    let mut words = Vec::new();
    let mut current: Option<(String, f64, f64)> = None;

    for token in tokens {
        let trimmed = token.text.trim();
        if trimmed.is_empty() || trimmed.starts_with('[') || trimmed.starts_with('<') {
            continue;
        }
        if token.end <= token.start {
            continue;
        }

        let opens_word = token.text.starts_with(char::is_whitespace);
        match current.as_mut() {
            Some((text, _, end)) if !opens_word => {
                text.push_str(trimmed);
                *end = token.end;
            }
            _ => {
                if let Some((text, start, end)) = current.take() {
                    words.push(TimedWord::new(start, end, text));
                }
                current = Some((trimmed.to_string(), token.start, token.end));
            }
        }
    }
    if let Some((text, start, end)) = current {
        words.push(TimedWord::new(start, end, text));
    }
    words
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
