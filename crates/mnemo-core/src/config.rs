//! Runtime configuration.
//!
//! Loaded from TOML, JSON, or YAML keyed on file extension, with every field
//! defaulted so a missing or partial file still yields a working setup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MnemoError, MnemoResult};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MnemoConfig {
    /// Location of the item database.
    pub store_path: PathBuf,
    /// Buffer depth of the live item feed.
    pub feed_capacity: usize,
    pub practice: PracticeConfig,
    pub reminder: ReminderConfig,
}

/// Knobs for practice deck construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    /// Deck size for random sampling.
    pub sample_size: usize,
    /// Ease factor below which an item counts as difficult (exclusive).
    pub difficult_threshold: f64,
}

/// Daily reminder wall-clock time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub hour: u8,
    pub minute: u8,
}

impl Default for MnemoConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            feed_capacity: 64,
            practice: PracticeConfig::default(),
            reminder: ReminderConfig::default(),
        }
    }
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            sample_size: 10,
            difficult_threshold: 2.0,
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self { hour: 18, minute: 0 }
    }
}

fn default_store_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mnemo")
        .join("mnemo.db")
}

impl MnemoConfig {
    /// Load from a file, dispatching on extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> MnemoResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| MnemoError::Configuration(format!("invalid TOML: {}", e)))?,
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| MnemoError::Configuration(format!("invalid YAML: {}", e)))?,
            other => {
                return Err(MnemoError::Configuration(format!(
                    "unsupported config format: {:?}",
                    other
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MnemoResult<()> {
        if self.feed_capacity == 0 {
            return Err(MnemoError::Configuration(
                "feed_capacity must be at least 1".to_string(),
            ));
        }
        if self.practice.sample_size == 0 {
            return Err(MnemoError::Configuration(
                "practice.sample_size must be at least 1".to_string(),
            ));
        }
        if self.practice.difficult_threshold < crate::scheduler::MIN_EASE_FACTOR {
            return Err(MnemoError::Configuration(format!(
                "practice.difficult_threshold must be >= {}",
                crate::scheduler::MIN_EASE_FACTOR
            )));
        }
        if self.reminder.hour > 23 || self.reminder.minute > 59 {
            return Err(MnemoError::Configuration(format!(
                "invalid reminder time {:02}:{:02}",
                self.reminder.hour, self.reminder.minute
            )));
        }
        Ok(())
    }
}
