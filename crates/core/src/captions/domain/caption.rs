use serde::Serialize;

/// A span of timed words merged into one on-screen caption.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaptionSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl CaptionSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A caption after line wrapping, as handed to the video renderer.
/// The renderer shows it over `[start, end)`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaptionFrame {
    pub start: f64,
    pub end: f64,
    pub lines: Vec<String>,
}

impl CaptionFrame {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}
