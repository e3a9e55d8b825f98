use serde::Serialize;

/// A single word with its start and end offsets in seconds.
///
/// Immutable: stages that adjust timing build a new word through
/// [`TimedWord::shifted`] or [`TimedWord::with_text`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimedWord {
    start: f64,
    end: f64,
    text: String,
}

impl TimedWord {
    /// Creates a word; an `end` before `start` is raised to `start`.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end: end.max(start),
            text: text.into(),
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True when the text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Same text, both timestamps moved by `offset` and clamped at zero.
    pub fn shifted(&self, offset: f64) -> Self {
        Self::new(
            (self.start + offset).max(0.0),
            (self.end + offset).max(0.0),
            self.text.clone(),
        )
    }

    /// Same timing, different text.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self::new(self.start, self.end, text)
    }
}

/// True when starts never decrease and every word has `end >= start`.
pub fn is_well_ordered(words: &[TimedWord]) -> bool {
    words.iter().all(|w| w.end >= w.start)
        && words.windows(2).all(|pair| pair[0].start <= pair[1].start)
}
