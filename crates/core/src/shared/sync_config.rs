use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CALIBRATION_OFFSET: f64 = -0.2;
pub const DEFAULT_ESTIMATED_WORD_DURATION: f64 = 0.35;
pub const DEFAULT_LEAD_IN_FRACTION: f64 = 0.05;
pub const DEFAULT_USABLE_FRACTION: f64 = 0.9;
pub const DEFAULT_MAX_SEGMENT_DURATION: f64 = 5.0;
pub const DEFAULT_MIN_SEGMENT_DURATION: f64 = 2.5;
pub const DEFAULT_GAP_THRESHOLD: f64 = 3.0;
pub const DEFAULT_MAX_CHARS_PER_LINE: usize = 40;
pub const DEFAULT_MAX_LINES: usize = 2;
pub const DEFAULT_MIN_DISPLAY_DURATION: f64 = 0.5;
pub const DEFAULT_CLOUD_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_CLOUD_POLL_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_LOCAL_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_BOUNDARY_PUNCTUATION: &[char] = &['.', '!', '?', ',', ';', ':'];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{field} must be {requirement}, got {value}")]
    Invalid {
        field: &'static str,
        requirement: &'static str,
        value: String,
    },
}

/// Tuning constants for the alignment and captioning pipeline.
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Shift applied to every backend timestamp, in seconds. Must be <= 0.
    pub calibration_offset: f64,
    /// Duration given to lyric words the transcription did not cover.
    pub estimated_word_duration: f64,
    /// Fraction of the track left silent before the first distributed word.
    pub lead_in_fraction: f64,
    /// Fraction of the track the distributed words occupy.
    pub usable_fraction: f64,
    pub max_segment_duration: f64,
    pub min_segment_duration: f64,
    /// Silence between words, in seconds, treated as an instrumental passage.
    pub gap_threshold: f64,
    pub max_chars_per_line: usize,
    pub max_lines: usize,
    pub min_display_duration: f64,
    pub cloud_timeout_secs: u64,
    pub cloud_poll_interval_ms: u64,
    pub local_timeout_secs: u64,
    pub boundary_punctuation: Vec<char>,
    /// Per-language clause connector lists, keyed by two-letter code.
    /// Entries here replace the built-in list for that language.
    pub clause_connectors: HashMap<String, Vec<String>>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            calibration_offset: DEFAULT_CALIBRATION_OFFSET,
            estimated_word_duration: DEFAULT_ESTIMATED_WORD_DURATION,
            lead_in_fraction: DEFAULT_LEAD_IN_FRACTION,
            usable_fraction: DEFAULT_USABLE_FRACTION,
            max_segment_duration: DEFAULT_MAX_SEGMENT_DURATION,
            min_segment_duration: DEFAULT_MIN_SEGMENT_DURATION,
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            max_chars_per_line: DEFAULT_MAX_CHARS_PER_LINE,
            max_lines: DEFAULT_MAX_LINES,
            min_display_duration: DEFAULT_MIN_DISPLAY_DURATION,
            cloud_timeout_secs: DEFAULT_CLOUD_TIMEOUT_SECS,
            cloud_poll_interval_ms: DEFAULT_CLOUD_POLL_INTERVAL_MS,
            local_timeout_secs: DEFAULT_LOCAL_TIMEOUT_SECS,
            boundary_punctuation: DEFAULT_BOUNDARY_PUNCTUATION.to_vec(),
            clause_connectors: HashMap::new(),
        }
    }
}

impl SyncConfig {
    /// Loads a config file and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.calibration_offset > 0.0 {
            return Err(invalid(
                "calibration_offset",
                "zero or negative",
                self.calibration_offset,
            ));
        }
        positive("estimated_word_duration", self.estimated_word_duration)?;
        positive("max_segment_duration", self.max_segment_duration)?;
        positive("min_segment_duration", self.min_segment_duration)?;
        positive("gap_threshold", self.gap_threshold)?;
        if self.min_segment_duration > self.max_segment_duration {
            return Err(invalid(
                "min_segment_duration",
                "at most max_segment_duration",
                self.min_segment_duration,
            ));
        }
        if !(0.0..=1.0).contains(&self.lead_in_fraction) {
            return Err(invalid(
                "lead_in_fraction",
                "between 0.0 and 1.0",
                self.lead_in_fraction,
            ));
        }
        if !(0.0..=1.0).contains(&self.usable_fraction) || self.usable_fraction == 0.0 {
            return Err(invalid(
                "usable_fraction",
                "in (0.0, 1.0]",
                self.usable_fraction,
            ));
        }
        if self.lead_in_fraction + self.usable_fraction > 1.0 {
            return Err(invalid(
                "usable_fraction",
                "at most 1.0 - lead_in_fraction",
                self.usable_fraction,
            ));
        }
        if self.max_chars_per_line == 0 {
            return Err(invalid("max_chars_per_line", "positive", 0));
        }
        if self.max_lines == 0 {
            return Err(invalid("max_lines", "positive", 0));
        }
        if self.min_display_duration < 0.0 {
            return Err(invalid(
                "min_display_duration",
                "zero or positive",
                self.min_display_duration,
            ));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "positive", value))
    }
}

fn invalid(field: &'static str, requirement: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        field,
        requirement,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        assert!(SyncConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let c = SyncConfig::default();
        assert_eq!(c.max_segment_duration, 5.0);
        assert_eq!(c.min_segment_duration, 2.5);
        assert_eq!(c.gap_threshold, 3.0);
        assert_eq!(c.estimated_word_duration, 0.35);
        assert!(c.calibration_offset < 0.0);
        assert_eq!(c.boundary_punctuation, vec!['.', '!', '?', ',', ';', ':']);
    }

    #[test]
    fn test_positive_calibration_offset_rejected() {
        let c = SyncConfig {
            calibration_offset: 0.1,
            ..SyncConfig::default()
        };
        let err = c.validate().unwrap_err().to_string();
        assert!(err.contains("calibration_offset"), "got: {err}");
    }

    #[test]
    fn test_min_greater_than_max_rejected() {
        let c = SyncConfig {
            min_segment_duration: 6.0,
            ..SyncConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_fractions_over_one_rejected() {
        let c = SyncConfig {
            lead_in_fraction: 0.2,
            usable_fraction: 0.9,
            ..SyncConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_zero_max_lines_rejected() {
        let c = SyncConfig {
            max_lines: 0,
            ..SyncConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_lines": 3, "gap_threshold": 4.5}}"#).unwrap();

        let c = SyncConfig::load(file.path()).unwrap();
        assert_eq!(c.max_lines, 3);
        assert_eq!(c.gap_threshold, 4.5);
        assert_eq!(c.max_chars_per_line, DEFAULT_MAX_CHARS_PER_LINE);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = SyncConfig::load(Path::new("/nonexistent/lyricsync.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_malformed_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let result = SyncConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_chars_per_line": 0}}"#).unwrap();
        let result = SyncConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
