/// A run of lyric lines under one optional section label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LyricSection {
    pub label: Option<String>,
    pub lines: Vec<String>,
}

impl LyricSection {
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().flat_map(|line| line.split_whitespace())
    }
}

/// Lyric text with structural markup removed.
///
/// Built once per request by [`LyricDocument::normalize`] and read-only
/// afterwards. Words keep their original casing and attached punctuation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LyricDocument {
    sections: Vec<LyricSection>,
}

impl LyricDocument {
    /// Strips `[...]` markers, drops blank lines and trims each line.
    ///
    /// A line that opens with markers (`[Chorus]` or `[Chorus] La la la`)
    /// starts a new section labelled with the last of those leading markers.
    /// Markers later in a line (`Hold on [x2]`) are dropped without starting
    /// a section. Never fails; empty input gives an empty document.
    pub fn normalize(raw_lyrics: &str) -> Self {
        let mut sections: Vec<LyricSection> = Vec::new();

        for raw_line in raw_lyrics.lines() {
            let text = collapse_whitespace(&strip_markers(raw_line));

            if let Some(label) = leading_label(raw_line) {
                sections.push(LyricSection {
                    label: Some(label),
                    lines: Vec::new(),
                });
            }
            if text.is_empty() {
                continue;
            }

            match sections.last_mut() {
                Some(section) => section.lines.push(text),
                None => sections.push(LyricSection {
                    label: None,
                    lines: vec![text],
                }),
            }
        }

        Self { sections }
    }

    pub fn sections(&self) -> &[LyricSection] {
        &self.sections
    }

    /// All words in order, across sections.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().flat_map(|s| s.words())
    }

    pub fn word_list(&self) -> Vec<String> {
        self.words().map(str::to_string).collect()
    }

    pub fn word_count(&self) -> usize {
        self.words().count()
    }

    pub fn is_empty(&self) -> bool {
        self.words().next().is_none()
    }

    /// The cleaned lyric lines joined by newlines.
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .flat_map(|s| s.lines.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Removes every complete `[...]` span from the line. An unclosed `[` is
/// kept as text.
fn strip_markers(line: &str) -> String {
    let mut text = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']') else {
            break;
        };
        text.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }
    text.push_str(rest);
    text
}

/// The last non-empty marker among those the line starts with.
fn leading_label(line: &str) -> Option<String> {
    let mut label = None;
    let mut rest = line.trim_start();

    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            break;
        };
        let marker = inner[..close].trim();
        if !marker.is_empty() {
            label = Some(marker.to_string());
        }
        rest = inner[close + 1..].trim_start();
    }
    label
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_gives_empty_document() {
        let doc = LyricDocument::normalize("");
        assert!(doc.is_empty());
        assert_eq!(doc.word_count(), 0);
        assert!(doc.sections().is_empty());
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert!(LyricDocument::normalize("  \n\n\t \n").is_empty());
    }

    #[test]
    fn test_section_markers_removed() {
        let doc = LyricDocument::normalize("[Verse]\nHello world\nGoodbye now");
        assert_eq!(doc.word_list(), vec!["Hello", "world", "Goodbye", "now"]);
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.sections()[0].label.as_deref(), Some("Verse"));
    }

    #[test]
    fn test_punctuation_and_case_preserved() {
        let doc = LyricDocument::normalize("Oh, BABY!  don't go...");
        assert_eq!(doc.word_list(), vec!["Oh,", "BABY!", "don't", "go..."]);
    }

    #[test]
    fn test_sections_keep_their_labels() {
        let raw = "Intro line\n\n[Verse 1]\nfirst verse\n\n\n[Chorus]\nsing it\nloud";
        let doc = LyricDocument::normalize(raw);
        let labels: Vec<Option<&str>> = doc.sections().iter().map(|s| s.label.as_deref()).collect();
        assert_eq!(labels, vec![None, Some("Verse 1"), Some("Chorus")]);
        assert_eq!(doc.sections()[2].lines, vec!["sing it", "loud"]);
    }

    #[test]
    fn test_inline_marker_removed_from_sung_line() {
        let doc = LyricDocument::normalize("Hold on [x2] tight");
        assert_eq!(doc.word_list(), vec!["Hold", "on", "tight"]);
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.sections()[0].label, None);
    }

    #[test]
    fn test_marker_opening_a_sung_line_starts_section() {
        let doc = LyricDocument::normalize("intro words\n[Chorus] La la la\nsing");
        let labels: Vec<Option<&str>> = doc.sections().iter().map(|s| s.label.as_deref()).collect();
        assert_eq!(labels, vec![None, Some("Chorus")]);
        assert_eq!(doc.sections()[1].lines, vec!["La la la", "sing"]);
        assert_eq!(doc.word_count(), 6);
    }

    #[test]
    fn test_leading_marker_wins_over_trailing_annotation() {
        let doc = LyricDocument::normalize("[Verse 2] Hold on [x2]\n [] [Bridge]  \nwait");
        let labels: Vec<Option<&str>> = doc.sections().iter().map(|s| s.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("Verse 2"), Some("Bridge")]);
        assert_eq!(doc.sections()[0].lines, vec!["Hold on"]);
        assert_eq!(doc.sections()[1].lines, vec!["wait"]);
    }

    #[test]
    fn test_unclosed_bracket_kept_as_text() {
        let doc = LyricDocument::normalize("a [b c");
        assert_eq!(doc.word_list(), vec!["a", "[b", "c"]);
    }

    #[test]
    fn test_text_collapses_blank_lines() {
        let doc = LyricDocument::normalize("\n\n  one two  \n\n\n\nthree\n");
        assert_eq!(doc.text(), "one two\nthree");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = "[Intro]\nLa la, la\n\n[Outro]\nBye!";
        assert_eq!(LyricDocument::normalize(raw), LyricDocument::normalize(raw));
    }

    #[test]
    fn test_renormalizing_clean_text_keeps_words() {
        let doc = LyricDocument::normalize("[Verse]\nHello world\n\nGoodbye now");
        let again = LyricDocument::normalize(&doc.text());
        assert_eq!(doc.word_list(), again.word_list());
    }
}
