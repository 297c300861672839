//! Configuration type definitions

use serde::{Deserialize, Serialize};

/// Which selections to manage and how ownership changes are observed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Selection names to create handles for
    #[serde(default = "default_selections")]
    pub selections: Vec<String>,

    /// Subscribe to XFixes SelectionNotify to notice foreign owner changes
    #[serde(default = "default_true")]
    pub use_xfixes: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            selections: default_selections(),
            use_xfixes: true,
        }
    }
}

fn default_selections() -> Vec<String> {
    vec!["CLIPBOARD".to_string(), "PRIMARY".to_string()]
}

fn default_true() -> bool {
    true
}

/// Retrieval of remote selection contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Seconds without progress after which a transfer is abandoned
    #[serde(default = "default_idle_abort_secs")]
    pub idle_abort_secs: u64,

    /// IO priority passed to the stream factory for background reads
    #[serde(default)]
    pub io_priority: i32,

    /// Chunk size for TARGETS reads (default: display maximum request size)
    #[serde(default)]
    pub max_chunk_size: Option<usize>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            idle_abort_secs: default_idle_abort_secs(),
            io_priority: 0,
            max_chunk_size: None,
        }
    }
}

fn default_idle_abort_secs() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format ("pretty", "compact", "json")
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}
