use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tempfile::NamedTempFile;

use lyricsync_core::audio::domain::language_detector::ScriptLanguageDetector;
use lyricsync_core::audio::domain::romanizer::SchemeRomanizer;
use lyricsync_core::audio::domain::word_timing_source::WordTimingSource;
use lyricsync_core::audio::infrastructure::cloud_transcriber::CloudTranscriber;
use lyricsync_core::audio::infrastructure::whisper_aligner::WhisperAligner;
use lyricsync_core::captions::domain::caption::CaptionFrame;
use lyricsync_core::captions::infrastructure::srt_writer::write_srt;
use lyricsync_core::media::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use lyricsync_core::pipeline::align_lyrics_use_case::{
    AlignLyricsUseCase, AlignmentOutcome, LyricState,
};
use lyricsync_core::pipeline::build_captions_use_case::BuildCaptionsUseCase;
use lyricsync_core::pipeline::pipeline_logger::{PipelineLogger, StdoutPipelineLogger};
use lyricsync_core::shared::constants::{AUDIO_EXTENSIONS, DEFAULT_CLOUD_BASE_URL};
use lyricsync_core::shared::sync_config::SyncConfig;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Alignment result and caption frames as JSON.
    Json,
    /// Caption frames as SubRip subtitles.
    Srt,
}

/// Align lyrics to a song and produce timed caption frames.
#[derive(Parser)]
#[command(name = "lyricsync")]
struct Cli {
    /// Audio file to align.
    audio: PathBuf,

    /// Plain-text lyrics; `[Section]` markers are allowed.
    #[arg(long)]
    lyrics: Option<PathBuf>,

    /// Two-letter language code. Overrides detection from the lyrics.
    #[arg(long)]
    language: Option<String>,

    /// JSON file overriding tuning defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file (stdout if omitted).
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Local whisper model (ggml). Downloaded to the cache on first use if absent.
    #[arg(long)]
    whisper_model: Option<PathBuf>,

    /// API key for the cloud transcription service.
    #[arg(long, env = "LYRICSYNC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the cloud transcription service.
    #[arg(long, env = "LYRICSYNC_CLOUD_URL", default_value = DEFAULT_CLOUD_BASE_URL)]
    cloud_url: String,

    /// Never use the cloud backend.
    #[arg(long)]
    no_cloud: bool,

    /// Never use the local whisper backend.
    #[arg(long)]
    no_local: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = match &cli.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };

    let lyrics = LyricState::load(cli.lyrics.as_deref());
    let align = AlignLyricsUseCase::new(
        build_cloud(&cli, &config),
        build_local(&cli, &config),
        Box::new(FfmpegAudioReader),
        Box::new(ScriptLanguageDetector),
        config.clone(),
    );

    let mut logger = StdoutPipelineLogger::new();
    let outcome = align.run(&cli.audio, &lyrics, cli.language.as_deref(), &mut logger);
    let frames = BuildCaptionsUseCase::new(config).run(
        &outcome.words,
        outcome.language.as_deref(),
        &mut logger,
    );
    logger.summary();

    let rendered = render(cli.format, &outcome, &frames)?;
    match &cli.output {
        Some(path) => {
            write_atomically(path, &rendered)?;
            log::info!("Output written to {}", path.display());
        }
        None => io::stdout().write_all(&rendered)?,
    }
    Ok(())
}

fn build_cloud(cli: &Cli, config: &SyncConfig) -> Option<WordTimingSource> {
    if cli.no_cloud {
        return None;
    }
    let Some(api_key) = cli.api_key.as_deref() else {
        log::info!("No API key set, cloud transcription disabled");
        return None;
    };
    match CloudTranscriber::new(
        api_key,
        &cli.cloud_url,
        Duration::from_secs(config.cloud_timeout_secs),
        Duration::from_millis(config.cloud_poll_interval_ms),
    ) {
        Ok(transcriber) => Some(WordTimingSource::new(
            Box::new(transcriber),
            Box::new(SchemeRomanizer),
            config.calibration_offset,
        )),
        Err(e) => {
            log::warn!("{e}");
            None
        }
    }
}

/// The model is only resolved (and downloaded) if the run actually falls
/// through to local alignment.
fn build_local(cli: &Cli, config: &SyncConfig) -> Option<WordTimingSource> {
    if cli.no_local {
        return None;
    }
    let aligner = WhisperAligner::new(
        cli.whisper_model.as_deref(),
        Box::new(FfmpegAudioReader),
        Duration::from_secs(config.local_timeout_secs),
        Some(Box::new(download_progress)),
    );
    Some(WordTimingSource::new(
        Box::new(aligner),
        Box::new(SchemeRomanizer),
        config.calibration_offset,
    ))
}

fn render(
    format: OutputFormat,
    outcome: &AlignmentOutcome,
    frames: &[CaptionFrame],
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut out = Vec::new();
    match format {
        OutputFormat::Json => {
            let document = serde_json::json!({
                "method": outcome.method,
                "language": outcome.language,
                "words": outcome.words,
                "frames": frames,
            });
            serde_json::to_writer_pretty(&mut out, &document)?;
            out.push(b'\n');
        }
        OutputFormat::Srt => write_srt(&mut out, frames)?,
    }
    Ok(out)
}

/// Writes next to the destination, then renames, so a failed run never
/// leaves a truncated file behind.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.persist(path)?;
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.audio.exists() {
        return Err(format!("Audio file not found: {}", cli.audio.display()).into());
    }
    if !is_audio(&cli.audio) {
        log::warn!(
            "{} does not have a known audio extension, trying anyway",
            cli.audio.display()
        );
    }
    if let Some(code) = &cli.language {
        if code.trim().len() != 2 || !code.trim().chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("Language must be a two-letter code, got '{code}'").into());
        }
    }
    if cli.no_cloud && cli.no_local && cli.lyrics.is_none() {
        log::warn!("No backends enabled and no lyrics given, output will have no captions");
    }
    Ok(())
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading whisper model... {pct}%");
    } else {
        eprint!("\rDownloading whisper model... {downloaded} bytes");
    }
}
