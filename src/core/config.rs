//! Process configuration
//!
//! Supplied once at start-up (TOML file, then CLI overrides) and treated as
//! fixed input for building the session. Nothing here changes while the
//! shell is running.

use crate::command::launcher::UtilitySpec;
use crate::core::error::{Result, ShellError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Where utterances come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Typed lines on stdin
    #[default]
    Text,
    /// Transcribed speech from an external recognizer
    Voice,
}

/// Configuration for one shell process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Directory every operation is confined to (created if missing)
    pub sandbox_root: PathBuf,

    /// Whether replies should also be spoken
    pub tts: bool,

    pub input_mode: InputMode,

    /// Maximum number of history entries kept in memory
    ///
    /// Oldest entries are evicted first. History is an observation log,
    /// so dropping old entries never changes shell behaviour.
    pub history_capacity: usize,

    /// Append-only JSON-lines audit log; `None` disables it
    pub log_file: Option<PathBuf>,

    /// Line cap for "read file"
    pub read_max_lines: usize,

    /// Upper bound for the depth a user may request from "tree"
    pub tree_max_depth: usize,

    /// Cap on results from "search" and "grep"
    pub search_max_results: usize,

    /// Operator-defined utility allow-list (spoken alias -> program)
    ///
    /// Empty means the platform defaults from `launcher::AllowList`.
    pub utilities: BTreeMap<String, UtilitySpec>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            sandbox_root: PathBuf::from("sandbox"),
            tts: true,
            input_mode: InputMode::Text,
            history_capacity: 100,
            log_file: Some(PathBuf::from("voice-shell-log.jsonl")),
            read_max_lines: 100,
            tree_max_depth: 4,
            search_max_results: 500,
            utilities: BTreeMap::new(),
        }
    }
}

impl ShellConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ShellConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.sandbox_root.as_os_str().is_empty() {
            return Err(ShellError::InvalidConfig("sandbox_root must not be empty".into()));
        }

        if self.history_capacity == 0 {
            return Err(ShellError::InvalidConfig(
                "history_capacity must be at least 1".into(),
            ));
        }

        if self.read_max_lines == 0 || self.tree_max_depth == 0 || self.search_max_results == 0 {
            return Err(ShellError::InvalidConfig(
                "read_max_lines, tree_max_depth and search_max_results must be positive".into(),
            ));
        }

        for (alias, spec) in &self.utilities {
            let single_word = !alias.is_empty()
                && alias
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            if !single_word {
                return Err(ShellError::InvalidConfig(format!(
                    "utility alias '{}' must be a single lowercase word",
                    alias
                )));
            }
            if spec.program.trim().is_empty() {
                return Err(ShellError::InvalidConfig(format!(
                    "utility '{}' has an empty program",
                    alias
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ShellConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.input_mode, InputMode::Text);
        assert!(config.tts);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ShellConfig::from_toml_str(
            r#"
            sandbox_root = "/tmp/box"
            tts = false
            input_mode = "voice"
            "#,
        )
        .unwrap();
        assert_eq!(config.sandbox_root, PathBuf::from("/tmp/box"));
        assert!(!config.tts);
        assert_eq!(config.input_mode, InputMode::Voice);
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.search_max_results, 500);
    }

    #[test]
    fn test_utilities_table() {
        let config = ShellConfig::from_toml_str(
            r#"
            [utilities.editor]
            program = "nano"

            [utilities.calculator]
            program = "bc"
            args = ["-q"]
            "#,
        )
        .unwrap();
        assert_eq!(config.utilities.len(), 2);
        assert_eq!(config.utilities["calculator"].args, vec!["-q".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = ShellConfig {
            history_capacity: 0,
            ..ShellConfig::default()
        };
        assert!(matches!(config.validate(), Err(ShellError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_search_cap() {
        let config = ShellConfig {
            search_max_results: 0,
            ..ShellConfig::default()
        };
        assert!(matches!(config.validate(), Err(ShellError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_bad_alias() {
        let mut config = ShellConfig::default();
        config.utilities.insert(
            "Power Shell".into(),
            UtilitySpec {
                program: "pwsh".into(),
                args: Vec::new(),
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_input_mode_fails() {
        let result = ShellConfig::from_toml_str(r#"input_mode = "telepathy""#);
        assert!(matches!(result, Err(ShellError::ConfigParse(_))));
    }
}
