use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::media::domain::audio_reader::{AudioReadError, AudioReader};

/// ffmpeg reports container durations in these units per second.
const FFMPEG_TIME_BASE: f64 = 1_000_000.0;

/// Decodes audio files and reads their duration using ffmpeg-next.
pub struct FfmpegAudioReader;

impl FfmpegAudioReader {
    fn open(path: &Path) -> Result<ffmpeg_next::format::context::Input, AudioReadError> {
        if !path.exists() {
            return Err(AudioReadError::NotFound(path.to_path_buf()));
        }
        ffmpeg_next::init().map_err(|e| decode_error(path, e))?;
        ffmpeg_next::format::input(path).map_err(|e| decode_error(path, e))
    }
}

impl AudioReader for FfmpegAudioReader {
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<AudioSegment, AudioReadError> {
        let mut ictx = Self::open(path)?;

        let audio_stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or_else(|| AudioReadError::NoAudioStream {
                path: path.to_path_buf(),
            })?;
        let audio_stream_index = audio_stream.index();

        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())
                .map_err(|e| decode_error(path, e))?;
        let mut decoder = codec_ctx
            .decoder()
            .audio()
            .map_err(|e| decode_error(path, e))?;

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            ffmpeg_next::ChannelLayout::MONO,
            target_sample_rate,
        )
        .map_err(|e| decode_error(path, e))?;

        let mut samples: Vec<f32> = Vec::new();
        let mut decoded = ffmpeg_next::util::frame::audio::Audio::empty();
        let mut resampled = ffmpeg_next::util::frame::audio::Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != audio_stream_index {
                continue;
            }
            decoder
                .send_packet(&packet)
                .map_err(|e| decode_error(path, e))?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                resampler
                    .run(&decoded, &mut resampled)
                    .map_err(|e| decode_error(path, e))?;
                extract_f32_samples(&resampled, &mut samples);
            }
        }

        decoder.send_eof().map_err(|e| decode_error(path, e))?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            resampler
                .run(&decoded, &mut resampled)
                .map_err(|e| decode_error(path, e))?;
            extract_f32_samples(&resampled, &mut samples);
        }

        // The resampler may still hold buffered samples
        if let Ok(Some(delay)) = resampler.flush(&mut resampled) {
            if delay.output > 0 {
                extract_f32_samples(&resampled, &mut samples);
            }
        }

        Ok(AudioSegment::new(samples, target_sample_rate, 1))
    }

    fn duration(&self, path: &Path) -> Result<f64, AudioReadError> {
        let ictx = Self::open(path)?;

        let container = ictx.duration();
        if container > 0 {
            return Ok(container as f64 / FFMPEG_TIME_BASE);
        }

        // Some raw streams only carry a per-stream duration
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or_else(|| AudioReadError::NoAudioStream {
                path: path.to_path_buf(),
            })?;
        let time_base = stream.time_base();
        let seconds = stream.duration() as f64 * f64::from(time_base);
        if seconds > 0.0 {
            Ok(seconds)
        } else {
            Err(AudioReadError::NoAudioDuration {
                path: path.to_path_buf(),
            })
        }
    }
}

fn decode_error(path: &Path, e: ffmpeg_next::Error) -> AudioReadError {
    AudioReadError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Extract f32 samples from a planar mono resampled frame.
fn extract_f32_samples(frame: &ffmpeg_next::util::frame::audio::Audio, out: &mut Vec<f32>) {
    let num_samples = frame.samples();
    if num_samples == 0 {
        return;
    }
    out.extend_from_slice(&frame.plane::<f32>(0)[..num_samples]);
}
