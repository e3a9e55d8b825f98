/// Writing system of a single character, as far as language hints care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Cyrillic,
    Greek,
    Devanagari,
    Hangul,
    Kana,
    Other,
}

impl Script {
    pub fn of(c: char) -> Self {
        match c as u32 {
            0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F | 0x1E00..=0x1EFF => {
                Script::Latin
            }
            0x0400..=0x04FF | 0x0500..=0x052F => Script::Cyrillic,
            0x0370..=0x03FF | 0x1F00..=0x1FFF => Script::Greek,
            0x0900..=0x097F => Script::Devanagari,
            0x1100..=0x11FF | 0x3130..=0x318F | 0xAC00..=0xD7AF => Script::Hangul,
            0x3040..=0x30FF => Script::Kana,
            _ => Script::Other,
        }
    }
}

/// True if any letter in `text` is outside the Latin script.
pub fn contains_non_latin(text: &str) -> bool {
    text.chars()
        .filter(|c| c.is_alphabetic())
        .any(|c| Script::of(c) != Script::Latin)
}

/// Supplies an optional two-letter language hint for a text sample.
pub trait LanguageDetector: Send {
    fn detect_language(&self, text_sample: &str) -> Option<String>;
}

/// Never produces a hint.
pub struct NullLanguageDetector;

impl LanguageDetector for NullLanguageDetector {
    fn detect_language(&self, _text_sample: &str) -> Option<String> {
        None
    }
}

/// Guesses the language from the dominant non-Latin script of the sample.
///
/// Latin text yields no hint: the script alone cannot tell English from
/// Spanish, and a wrong hint hurts transcription more than none.
pub struct ScriptLanguageDetector;

impl LanguageDetector for ScriptLanguageDetector {
    fn detect_language(&self, text_sample: &str) -> Option<String> {
        let letters: Vec<char> = text_sample.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.is_empty() {
            return None;
        }

        let mut counts = [0usize; 7];
        for &c in &letters {
            counts[script_index(Script::of(c))] += 1;
        }
        let (best, &count) = counts.iter().enumerate().max_by_key(|(_, n)| **n)?;
        if count * 2 <= letters.len() {
            return None;
        }

        let code = match SCRIPTS[best] {
            Script::Cyrillic => {
                if letters.iter().any(|c| UKRAINIAN_LETTERS.contains(c)) {
                    "uk"
                } else {
                    "ru"
                }
            }
            Script::Greek => "el",
            Script::Devanagari => "hi",
            Script::Hangul => "ko",
            Script::Kana => "ja",
            Script::Latin | Script::Other => return None,
        };
        Some(code.to_string())
    }
}

const SCRIPTS: [Script; 7] = [
    Script::Latin,
    Script::Cyrillic,
    Script::Greek,
    Script::Devanagari,
    Script::Hangul,
    Script::Kana,
    Script::Other,
];

const UKRAINIAN_LETTERS: &[char] = &['і', 'ї', 'є', 'ґ', 'І', 'Ї', 'Є', 'Ґ'];

fn script_index(script: Script) -> usize {
    SCRIPTS
        .iter()
        .position(|s| *s == script)
        .unwrap_or(SCRIPTS.len() - 1)
}
