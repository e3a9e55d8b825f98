use crate::audio::domain::timed_word::TimedWord;

/// Spreads lyric words evenly over the track.
///
/// Words occupy `usable_fraction` of `audio_duration`, starting after a
/// lead-in of `lead_in_fraction`; whatever remains is trailing silence.
/// Each word gets the same duration, `usable_fraction * audio_duration / n`.
pub fn distribute_evenly(
    words: &[String],
    audio_duration: f64,
    lead_in_fraction: f64,
    usable_fraction: f64,
) -> Vec<TimedWord> {
    let words: Vec<&str> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() || audio_duration <= 0.0 {
        return Vec::new();
    }

    let start_offset = audio_duration * lead_in_fraction;
    let word_duration = audio_duration * usable_fraction / words.len() as f64;

    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let start = start_offset + i as f64 * word_duration;
            TimedWord::new(start, start + word_duration, *word)
        })
        .collect()
}
