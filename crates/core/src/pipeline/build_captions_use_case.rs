use std::time::Instant;

use crate::audio::domain::timed_word::TimedWord;
use crate::captions::domain::boundary_rules::BoundaryRules;
use crate::captions::domain::caption::{CaptionFrame, CaptionSegment};
use crate::captions::domain::caption_segmenter::CaptionSegmenter;
use crate::captions::domain::line_wrapper::wrap;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::sync_config::SyncConfig;

/// Turns canonical timed words into renderable caption frames:
/// segment, wrap each segment's text, then stretch very short frames so
/// they stay on screen long enough to read.
pub struct BuildCaptionsUseCase {
    config: SyncConfig,
}

impl BuildCaptionsUseCase {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        words: &[TimedWord],
        language: Option<&str>,
        logger: &mut dyn PipelineLogger,
    ) -> Vec<CaptionFrame> {
        let started = Instant::now();

        let segmenter = CaptionSegmenter::new(
            BoundaryRules::for_language(language, &self.config),
            self.config.max_segment_duration,
            self.config.min_segment_duration,
        );
        let segments = segmenter.segment(words);
        let frames = self.frames(&segments);

        logger.timing("captions", started.elapsed().as_secs_f64() * 1000.0);
        logger.metric("segments", segments.len() as f64);
        logger.metric("frames", frames.len() as f64);
        frames
    }

    /// Each frame lasts at least `min_display_duration`, but never runs into
    /// the next frame, even when the underlying segments overlap.
    fn frames(&self, segments: &[CaptionSegment]) -> Vec<CaptionFrame> {
        segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                let mut end = segment.end.max(segment.start + self.config.min_display_duration);
                if let Some(next) = segments.get(i + 1) {
                    end = end.min(next.start).max(segment.start);
                }
                CaptionFrame {
                    start: segment.start,
                    end,
                    lines: wrap(
                        &segment.text,
                        self.config.max_chars_per_line,
                        self.config.max_lines,
                    ),
                }
            })
            .collect()
    }
}
