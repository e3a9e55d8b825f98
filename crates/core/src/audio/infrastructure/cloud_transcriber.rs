use std::collections::HashSet;
use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::audio::domain::timed_word::TimedWord;
use crate::audio::domain::transcription_backend::{
    BackendKind, TimingSourceError, TranscriptionBackend, TranscriptionRequest,
};
use crate::shared::constants::MAX_GUIDANCE_TERMS;

/// Longest a single HTTP call may take; the overall deadline is separate.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Word-level transcription through a hosted speech-to-text API
/// (AssemblyAI-compatible upload / submit / poll protocol).
pub struct CloudTranscriber {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct TranscriptSubmission<'a> {
    audio_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<&'a str>,
    language_detection: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    word_boost: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    boost_param: Option<&'a str>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum TranscriptStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: String,
    status: TranscriptStatus,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    words: Option<Vec<CloudWord>>,
}

#[derive(Debug, Deserialize)]
struct CloudWord {
    text: String,
    /// Milliseconds.
    start: u64,
    /// Milliseconds.
    end: u64,
}

impl CloudTranscriber {
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self, TimingSourceError> {
        if api_key.trim().is_empty() {
            return Err(unavailable("no API key configured"));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            poll_interval,
        })
    }

    fn upload(&self, bytes: Vec<u8>) -> Result<String, TimingSourceError> {
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .header("authorization", &self.api_key)
            .body(bytes)
            .send()
            .map_err(request_failed)?;
        let upload: UploadResponse = check_status(response)?.json().map_err(request_failed)?;
        Ok(upload.upload_url)
    }

    fn submit(
        &self,
        audio_url: &str,
        request: &TranscriptionRequest<'_>,
    ) -> Result<TranscriptResponse, TimingSourceError> {
        let word_boost = request.guidance.map(build_word_boost).unwrap_or_default();
        let submission = TranscriptSubmission {
            audio_url,
            language_code: request.language_hint,
            language_detection: request.language_hint.is_none(),
            boost_param: (!word_boost.is_empty()).then_some("high"),
            word_boost,
        };
        let response = self
            .client
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&submission)
            .send()
            .map_err(request_failed)?;
        check_status(response)?.json().map_err(request_failed)
    }

    fn poll(&self, id: &str, deadline: Instant) -> Result<TranscriptResponse, TimingSourceError> {
        loop {
            let response = self
                .client
                .get(format!("{}/transcript/{id}", self.base_url))
                .header("authorization", &self.api_key)
                .send()
                .map_err(request_failed)?;
            let transcript: TranscriptResponse =
                check_status(response)?.json().map_err(request_failed)?;

            match transcript.status {
                TranscriptStatus::Completed | TranscriptStatus::Error => return Ok(transcript),
                TranscriptStatus::Queued | TranscriptStatus::Processing => {}
            }
            if Instant::now() + self.poll_interval > deadline {
                return Err(TimingSourceError::Timeout {
                    backend: BackendKind::Cloud,
                    seconds: self.timeout.as_secs(),
                });
            }
            log::debug!("Transcript {id} still {:?}", transcript.status);
            thread::sleep(self.poll_interval);
        }
    }
}

impl TranscriptionBackend for CloudTranscriber {
    fn kind(&self) -> BackendKind {
        BackendKind::Cloud
    }

    fn transcribe(
        &self,
        request: &TranscriptionRequest<'_>,
    ) -> Result<Vec<TimedWord>, TimingSourceError> {
        let deadline = Instant::now() + self.timeout;
        let bytes = fs::read(request.audio_path).map_err(|e| {
            TimingSourceError::Decode(format!("{}: {e}", request.audio_path.display()))
        })?;

        log::info!("Uploading {} bytes for cloud transcription", bytes.len());
        let audio_url = self.upload(bytes)?;
        let submitted = self.submit(&audio_url, request)?;
        log::info!("Submitted transcript {}", submitted.id);

        let transcript = match submitted.status {
            TranscriptStatus::Completed | TranscriptStatus::Error => submitted,
            _ => self.poll(&submitted.id, deadline)?,
        };
        words_from_transcript(transcript)
    }
}

fn words_from_transcript(
    transcript: TranscriptResponse,
) -> Result<Vec<TimedWord>, TimingSourceError> {
    if transcript.status == TranscriptStatus::Error {
        return Err(TimingSourceError::Transcription {
            backend: BackendKind::Cloud,
            reason: transcript
                .error
                .unwrap_or_else(|| "unknown error".to_string()),
        });
    }
    Ok(transcript
        .words
        .unwrap_or_default()
        .into_iter()
        .map(|w| TimedWord::new(w.start as f64 / 1000.0, w.end as f64 / 1000.0, w.text))
        .collect())
}

/// Vocabulary boost list from guidance lyrics: lowercase, punctuation
/// stripped, first occurrence order, at most [`MAX_GUIDANCE_TERMS`].
pub fn build_word_boost(guidance: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    guidance
        .iter()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'')
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty() && seen.insert(word.clone()))
        .take(MAX_GUIDANCE_TERMS)
        .collect()
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, TimingSourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let reason = match status.as_u16() {
        401 | 403 => "credentials rejected".to_string(),
        429 => "rate limit or quota exhausted".to_string(),
        code => format!("HTTP {code}"),
    };
    Err(unavailable(reason))
}

fn request_failed(e: reqwest::Error) -> TimingSourceError {
    if e.is_timeout() {
        unavailable(format!("request timed out: {e}"))
    } else {
        unavailable(e.to_string())
    }
}

fn unavailable(reason: impl Into<String>) -> TimingSourceError {
    TimingSourceError::BackendUnavailable {
        backend: BackendKind::Cloud,
        reason: reason.into(),
    }
}
