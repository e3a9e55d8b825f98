/// Converts text in a non-Latin script to a Latin-alphabet spelling.
pub trait Romanizer: Send {
    /// Returns `text` romanized for `language`; unsupported languages come
    /// back unchanged.
    fn romanize(&self, text: &str, language: &str) -> String;

    fn supports(&self, language: &str) -> bool;
}

/// Table-driven transliteration for Russian, Ukrainian, Greek and Hindi.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemeRomanizer;

impl Romanizer for SchemeRomanizer {
    fn romanize(&self, text: &str, language: &str) -> String {
        match language {
            "ru" => map_alphabet(text, russian),
            "uk" => map_alphabet(text, ukrainian),
            "el" => map_alphabet(text, greek),
            "hi" => devanagari(text),
            _ => text.to_string(),
        }
    }

    fn supports(&self, language: &str) -> bool {
        matches!(language, "ru" | "uk" | "el" | "hi")
    }
}

/// Letter-by-letter substitution preserving the case of the first letter.
fn map_alphabet(text: &str, table: fn(char) -> Option<&'static str>) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        match table(lower) {
            Some(latin) if c != lower => {
                let mut letters = latin.chars();
                if let Some(first) = letters.next() {
                    out.extend(first.to_uppercase());
                    out.push_str(letters.as_str());
                }
            }
            Some(latin) => out.push_str(latin),
            None => out.push(c),
        }
    }
    out
}

fn russian(c: char) -> Option<&'static str> {
    Some(match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    })
}

fn ukrainian(c: char) -> Option<&'static str> {
    match c {
        'г' => Some("h"),
        'ґ' => Some("g"),
        'е' => Some("e"),
        'є' => Some("ye"),
        'и' => Some("y"),
        'і' => Some("i"),
        'ї' => Some("yi"),
        '\'' | 'ʼ' => Some(""),
        _ => russian(c),
    }
}

fn greek(c: char) -> Option<&'static str> {
    Some(match c {
        'α' | 'ά' => "a",
        'β' => "v",
        'γ' => "g",
        'δ' => "d",
        'ε' | 'έ' => "e",
        'ζ' => "z",
        'η' | 'ή' => "i",
        'θ' => "th",
        'ι' | 'ί' | 'ϊ' | 'ΐ' => "i",
        'κ' => "k",
        'λ' => "l",
        'μ' => "m",
        'ν' => "n",
        'ξ' => "x",
        'ο' | 'ό' => "o",
        'π' => "p",
        'ρ' => "r",
        'σ' | 'ς' => "s",
        'τ' => "t",
        'υ' | 'ύ' | 'ϋ' | 'ΰ' => "y",
        'φ' => "f",
        'χ' => "ch",
        'ψ' => "ps",
        'ω' | 'ώ' => "o",
        _ => return None,
    })
}

const VIRAMA: char = '\u{094D}';
const NUKTA: char = '\u{093C}';

fn devanagari_consonant(c: char) -> Option<&'static str> {
    Some(match c {
        'क' => "k",
        'ख' => "kh",
        'ग' => "g",
        'घ' => "gh",
        'ङ' => "ng",
        'च' => "ch",
        'छ' => "chh",
        'ज' => "j",
        'झ' => "jh",
        'ञ' => "ny",
        'ट' => "t",
        'ठ' => "th",
        'ड' => "d",
        'ढ' => "dh",
        'ण' => "n",
        'त' => "t",
        'थ' => "th",
        'द' => "d",
        'ध' => "dh",
        'न' => "n",
        'प' => "p",
        'फ' => "ph",
        'ब' => "b",
        'भ' => "bh",
        'म' => "m",
        'य' => "y",
        'र' => "r",
        'ल' => "l",
        'व' => "v",
        'श' | 'ष' => "sh",
        'स' => "s",
        'ह' => "h",
        _ => return None,
    })
}

fn devanagari_vowel(c: char) -> Option<&'static str> {
    Some(match c {
        'अ' => "a",
        'आ' | 'ा' => "aa",
        'इ' | 'ि' => "i",
        'ई' | 'ी' => "ii",
        'उ' | 'ु' => "u",
        'ऊ' | 'ू' => "uu",
        'ऋ' | 'ृ' => "ri",
        'ए' | 'े' => "e",
        'ऐ' | 'ै' => "ai",
        'ओ' | 'ो' => "o",
        'औ' | 'ौ' => "au",
        _ => return None,
    })
}

fn is_vowel_sign(c: char) -> bool {
    matches!(c as u32, 0x093E..=0x094C)
}

/// Devanagari with inherent-vowel handling: a consonant carries an implicit
/// `a` unless followed by a vowel sign or virama, and the word-final
/// implicit `a` is dropped as in spoken Hindi.
fn devanagari(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Whether the last consonant still carries its implicit vowel, and how
    // many syllables the current word has produced so far.
    let mut pending_a = false;
    let mut syllables = 0usize;

    let close_word = |out: &mut String, pending_a: &mut bool, syllables: &mut usize| {
        if *pending_a && *syllables > 1 {
            out.pop();
        }
        *pending_a = false;
        *syllables = 0;
    };

    for c in text.chars() {
        if let Some(latin) = devanagari_consonant(c) {
            out.push_str(latin);
            out.push('a');
            pending_a = true;
            syllables += 1;
        } else if c == VIRAMA {
            if pending_a {
                out.pop();
                pending_a = false;
            }
        } else if c == NUKTA {
            continue;
        } else if let Some(latin) = devanagari_vowel(c) {
            if is_vowel_sign(c) && pending_a {
                out.pop();
            } else if !is_vowel_sign(c) {
                syllables += 1;
            }
            out.push_str(latin);
            pending_a = false;
        } else if matches!(c, 'ं' | 'ँ') {
            out.push('n');
            pending_a = false;
        } else if c == 'ः' {
            out.push('h');
            pending_a = false;
        } else {
            close_word(&mut out, &mut pending_a, &mut syllables);
            out.push(c);
        }
    }
    close_word(&mut out, &mut pending_a, &mut syllables);
    out
}
