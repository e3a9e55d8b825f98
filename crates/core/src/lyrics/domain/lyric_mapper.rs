use crate::audio::domain::timed_word::TimedWord;

/// Transfers machine timing onto the authored lyric words.
///
/// The i-th transcribed timing is given to the i-th lyric word, so the
/// output keeps the user's spelling and punctuation. Lyric words beyond
/// the transcription get `estimated_word_duration` each, laid end to end
/// after the latest known end. Transcribed words beyond the lyrics keep
/// their own text.
///
/// This is positional, not a sequence alignment: a dropped or inserted
/// word in the transcription shifts every following lyric word by one.
pub fn map_to_lyrics(
    transcribed: &[TimedWord],
    lyric_words: &[String],
    estimated_word_duration: f64,
) -> Vec<TimedWord> {
    let mut ordered: Vec<&TimedWord> = transcribed.iter().collect();
    ordered.sort_by(|a, b| a.start().total_cmp(&b.start()));

    let mut mapped: Vec<TimedWord> = ordered
        .iter()
        .enumerate()
        .map(|(i, word)| match lyric_words.get(i) {
            Some(lyric) => word.with_text(lyric.as_str()),
            None => (*word).clone(),
        })
        .collect();

    if lyric_words.len() > mapped.len() {
        log::debug!(
            "Lyrics have {} more words than the transcription, estimating their timing",
            lyric_words.len() - mapped.len()
        );
        let mut cursor = mapped.iter().map(TimedWord::end).fold(0.0, f64::max);
        for lyric in &lyric_words[mapped.len()..] {
            mapped.push(TimedWord::new(
                cursor,
                cursor + estimated_word_duration,
                lyric.as_str(),
            ));
            cursor += estimated_word_duration;
        }
    }

    mapped
}
