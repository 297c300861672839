//! # lamco-x11-clipboard
//!
//! X11 selection protocol engine.
//!
//! This crate speaks the inter-client selection protocol on behalf of a
//! toolkit's generic clipboard object:
//! - [`clipboard`] - ownership, request answering, target discovery and reads
//! - [`config`] - TOML configuration
//! - [`utils`] - logging setup
//!
//! # Data Flow
//!
//! **Outgoing:** Requestor → SelectionRequest → Dispatcher → X11Clipboard → front-end writer → SelectionNotify
//!
//! **Incoming:** Owner change → claimRemote → TARGETS discovery → front-end formats
//!
//! **Reads:** front-end → X11Clipboard::read → target fallback → stream + MIME type

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Selection engine configuration
pub mod config;

/// Selection protocol engine
pub mod clipboard;

/// Utility functions
pub mod utils;

pub use clipboard::{ClipboardError, Dispatcher, X11Clipboard};
pub use config::Config;
