//! Utility Functions
//!
//! Process-level helpers shared by embedders of the selection engine.
//!
//! ## Logging
//!
//! The [`logging`] module installs a `tracing` subscriber configured from
//! [`LoggingConfig`](crate::config::LoggingConfig):
//!
//! ```rust,no_run
//! use lamco_x11_clipboard::{utils::init_logging, Config};
//!
//! let config = Config::default_config();
//! init_logging(&config.logging).expect("logging");
//! ```

pub mod logging;

pub use logging::init_logging;
