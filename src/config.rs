//! Interpreter configuration loaded from TOML with defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interpreter::BlockStyle;

/// Configuration file name inside the user's config directory.
const CONFIG_DIR: &str = "snxscript";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading configuration from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Block style in effect at the first line.
    pub style: BlockStyle,
    /// When false, `exec` statements are logged instead of run.
    pub allow_exec: bool,
    /// Print a notice when an `END` statement stops the program.
    pub announce_end: bool,
    /// Default tracing filter when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            style: BlockStyle::default(),
            allow_exec: true,
            announce_end: false,
            log_filter: "warn".to_string(),
        }
    }
}

impl InterpreterConfig {
    /// Load from `path`, or from the user config directory when no path is
    /// given. A missing default file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = InterpreterConfig::from_toml_str("").unwrap();
        assert_eq!(config, InterpreterConfig::default());
        assert_eq!(config.style, BlockStyle::EndKeyword);
        assert!(config.allow_exec);
    }

    #[test]
    fn reads_partial_overrides() {
        let config = InterpreterConfig::from_toml_str(
            "style = \"brackets\"\nallow_exec = false\nlog_filter = \"debug\"\n",
        )
        .unwrap();
        assert_eq!(config.style, BlockStyle::BraceDelimited);
        assert!(!config.allow_exec);
        assert!(!config.announce_end);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn unknown_style_is_rejected() {
        assert!(InterpreterConfig::from_toml_str("style = \"tabs\"").is_err());
    }

    #[test]
    fn explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = InterpreterConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "announce_end = true\n").unwrap();
        let config = InterpreterConfig::load(Some(&path)).unwrap();
        assert!(config.announce_end);
    }
}
