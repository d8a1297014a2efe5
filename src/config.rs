//! CLI configuration, loaded from a TOML file or defaulted.
//!
//! This crate has only one ambient setting worth persisting, the REPL
//! prompt, so config loading here is a single explicit path or the
//! built-in default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Application configuration for the CLI front end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Prompt string shown by the REPL.
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_prompt() -> String {
    "PS> ".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config { prompt: default_prompt() }
    }
}

impl Config {
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_has_standard_prompt() {
        assert_eq!(Config::default().prompt, "PS> ");
    }

    #[test]
    fn loads_prompt_override_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"prompt = "ps? ""#).unwrap();
        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.prompt, "ps? ");
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = Config::load_from_path(Path::new("/nonexistent/postscript.toml"));
        assert!(result.is_err());
    }
}
