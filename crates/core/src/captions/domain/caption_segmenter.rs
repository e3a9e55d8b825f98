use crate::audio::domain::timed_word::TimedWord;

use super::boundary_rules::BoundaryRules;
use super::caption::CaptionSegment;

/// Groups timed words into captions.
///
/// Greedy, left to right. After each word the running caption closes when
/// either
/// - it has lasted `max_duration` (hard cap), or
/// - it has lasted `min_duration` and the word is a natural break
///   (punctuation, next word opens a clause, or a long pause follows).
///
/// Blank words count towards duration but contribute no text; a caption
/// made only of blank words is dropped.
pub struct CaptionSegmenter {
    rules: BoundaryRules,
    max_duration: f64,
    min_duration: f64,
}

impl CaptionSegmenter {
    pub fn new(rules: BoundaryRules, max_duration: f64, min_duration: f64) -> Self {
        Self {
            rules,
            max_duration,
            min_duration,
        }
    }

    pub fn segment(&self, words: &[TimedWord]) -> Vec<CaptionSegment> {
        let mut segments = Vec::new();
        let mut current: Vec<&TimedWord> = Vec::new();

        for (i, word) in words.iter().enumerate() {
            current.push(word);
            let duration = word.end() - current[0].start();

            let close = duration >= self.max_duration
                || (duration >= self.min_duration
                    && self.rules.is_natural_break(word, words.get(i + 1)));
            if close {
                segments.extend(flush(&current));
                current.clear();
            }
        }
        segments.extend(flush(&current));

        segments
    }
}

/// Builds one caption from the accumulated words, spanning only the words
/// that carry text.
fn flush(words: &[&TimedWord]) -> Option<CaptionSegment> {
    let spoken: Vec<&TimedWord> = words.iter().copied().filter(|w| !w.is_blank()).collect();
    let first = spoken.first()?;
    let last = spoken.last()?;
    Some(CaptionSegment {
        start: first.start(),
        end: last.end(),
        text: spoken
            .iter()
            .map(|w| w.text().trim())
            .collect::<Vec<_>>()
            .join(" "),
    })
}
