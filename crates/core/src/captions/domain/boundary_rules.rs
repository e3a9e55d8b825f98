use crate::audio::domain::timed_word::TimedWord;
use crate::shared::sync_config::SyncConfig;

/// Language used when no hint is available.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Words that usually open a new clause, per language.
fn builtin_connectors(language: &str) -> &'static [&'static str] {
    match language {
        "en" => &[
            "and", "but", "or", "so", "yet", "then", "while", "though", "because",
        ],
        "es" => &[
            "y", "pero", "o", "entonces", "mientras", "aunque", "porque", "luego",
        ],
        "fr" => &["et", "mais", "ou", "donc", "alors", "puis", "quand", "car"],
        "de" => &[
            "und", "aber", "oder", "dann", "während", "obwohl", "weil", "denn",
        ],
        "pt" => &[
            "e", "mas", "ou", "então", "enquanto", "embora", "porque", "depois",
        ],
        "it" => &["e", "ma", "o", "poi", "mentre", "anche", "perché", "quindi"],
        _ => &[],
    }
}

/// Decides where a caption may end naturally.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryRules {
    punctuation: Vec<char>,
    connectors: Vec<String>,
    gap_threshold: f64,
}

impl BoundaryRules {
    pub fn new(punctuation: Vec<char>, connectors: Vec<String>, gap_threshold: f64) -> Self {
        Self {
            punctuation,
            connectors: connectors.iter().map(|c| c.to_lowercase()).collect(),
            gap_threshold,
        }
    }

    /// Rules for `language` (English when `None`). Connector lists from the
    /// config replace the built-in list; languages without either get
    /// punctuation and pause breaks only.
    pub fn for_language(language: Option<&str>, config: &SyncConfig) -> Self {
        let language = language.unwrap_or(DEFAULT_LANGUAGE);
        let connectors = match config.clause_connectors.get(language) {
            Some(custom) => custom.clone(),
            None => builtin_connectors(language)
                .iter()
                .map(|c| c.to_string())
                .collect(),
        };
        Self::new(
            config.boundary_punctuation.clone(),
            connectors,
            config.gap_threshold,
        )
    }

    pub fn ends_with_punctuation(&self, word: &TimedWord) -> bool {
        word.text()
            .trim_end()
            .chars()
            .last()
            .is_some_and(|c| self.punctuation.contains(&c))
    }

    pub fn is_connector(&self, word: &TimedWord) -> bool {
        let bare = word
            .text()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        !bare.is_empty() && self.connectors.contains(&bare)
    }

    /// Silence between `word` and `next` long enough to be an instrumental.
    pub fn is_pause(&self, word: &TimedWord, next: &TimedWord) -> bool {
        next.start() - word.end() > self.gap_threshold
    }

    /// True when the caption can close after `word`.
    pub fn is_natural_break(&self, word: &TimedWord, next: Option<&TimedWord>) -> bool {
        if self.ends_with_punctuation(word) {
            return true;
        }
        match next {
            Some(next) => self.is_connector(next) || self.is_pause(word, next),
            None => false,
        }
    }
}

impl Default for BoundaryRules {
    fn default() -> Self {
        Self::for_language(None, &SyncConfig::default())
    }
}
