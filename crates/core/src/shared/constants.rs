pub const WHISPER_MODEL_NAME: &str = "ggml-base.bin";
pub const WHISPER_MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin";
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

pub const DEFAULT_CLOUD_BASE_URL: &str = "https://api.assemblyai.com/v2";

/// Upper bound on the vocabulary boost list sent with cloud requests.
pub const MAX_GUIDANCE_TERMS: usize = 1000;

pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "flac", "ogg", "aac", "opus"];
