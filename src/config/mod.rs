//! Configuration management
//!
//! Loads and validates the selection engine configuration from TOML.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub mod types;

pub use types::{LoggingConfig, RetrievalConfig, SelectionConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Managed selections
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Remote content retrieval
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.selection.selections.is_empty() {
            anyhow::bail!("At least one selection must be configured");
        }

        let mut seen = HashSet::new();
        for name in &self.selection.selections {
            if name.is_empty() {
                anyhow::bail!("Selection names cannot be empty");
            }
            if !seen.insert(name.as_str()) {
                anyhow::bail!("Duplicate selection: {}", name);
            }
        }

        if self.retrieval.idle_abort_secs == 0 {
            anyhow::bail!("idle_abort_secs must be greater than zero");
        }

        if self.retrieval.max_chunk_size == Some(0) {
            anyhow::bail!("max_chunk_size must be greater than zero");
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.selection.selections, vec!["CLIPBOARD", "PRIMARY"]);
        assert!(config.selection.use_xfixes);
        assert_eq!(config.retrieval.idle_abort_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [retrieval]
            idle_abort_secs = 5
            max_chunk_size = 4096
            "#,
        )
        .unwrap();

        assert_eq!(config.retrieval.idle_abort_secs, 5);
        assert_eq!(config.retrieval.max_chunk_size, Some(4096));
        assert_eq!(config.selection.selections.len(), 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[selection]\nselections = [\"CLIPBOARD\"]\nuse_xfixes = false\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.selection.selections, vec!["CLIPBOARD"]);
        assert!(!config.selection.use_xfixes);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load("/nonexistent/lamco-x11-clipboard.toml").is_err());
    }

    #[test]
    fn test_validation_duplicate_selection() {
        let mut config = Config::default_config();
        config.selection.selections = vec!["PRIMARY".to_string(), "PRIMARY".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_idle() {
        let mut config = Config::default_config();
        config.retrieval.idle_abort_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_log_format() {
        let mut config = Config::default_config();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }
}
