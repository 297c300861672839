//! Clipboard Error Types
//!
//! Error handling for the X11 selection engine. Every failure is local to the
//! single operation in flight; none of them is allowed to corrupt the
//! ownership state of a selection.

use crate::clipboard::atoms::Timestamp;
use thiserror::Error;

/// Result type for selection operations
pub type Result<T> = std::result::Result<T, ClipboardError>;

/// Selection engine error types
#[derive(Error, Debug)]
pub enum ClipboardError {
    /// Reply carried the wrong advertised type or format width
    #[error("Wrong reply type for {target}: got {reply_type}/{format}")]
    ProtocolMismatch {
        /// Requested target
        target: String,
        /// Advertised property type of the reply
        reply_type: String,
        /// Advertised format width of the reply
        format: u8,
    },

    /// Opening, reading or writing a selection stream failed
    #[error("Selection transfer failed: {0}")]
    Transport(String),

    /// IO error on a selection stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ownership event older than the recorded timestamp
    #[error("Stale event at {event} (recorded {recorded})")]
    StaleEvent {
        /// Timestamp carried by the event
        event: Timestamp,
        /// Timestamp currently recorded for the selection
        recorded: Timestamp,
    },

    /// Owner read-back did not confirm a local claim
    #[error("Failed to claim selection {selection}")]
    ClaimVerificationFailed {
        /// Selection name
        selection: String,
    },

    /// Content was requested in a target this process cannot produce
    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),

    /// None of the acceptable targets could be retrieved
    #[error("No compatible transfer format found")]
    NoCompatibleFormat,

    /// Operation was cancelled through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// Background transfer showed no activity within the idle window
    #[error("Transfer idle for more than {0}s, abandoned")]
    IdleTimeout(u64),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ClipboardError {
    /// Returns true if a fallback target may still succeed after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ProtocolMismatch { .. }
                | Self::Transport(_)
                | Self::Io(_)
                | Self::IdleTimeout(_)
                | Self::UnsupportedTarget(_)
        )
    }
}

/// Error classification for logging and recovery decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Reply type/format mismatch
    Protocol,
    /// Stream open/read/write failures
    Transport,
    /// Outdated ownership notification
    Stale,
    /// Local claim not confirmed by the server
    Claim,
    /// Target or format cannot be produced or consumed
    Format,
    /// Cancelled by the caller
    Cancelled,
    /// State machine misuse
    State,
}

/// Classify error for recovery strategy selection
pub fn classify_error(error: &ClipboardError) -> ErrorType {
    match error {
        ClipboardError::ProtocolMismatch { .. } => ErrorType::Protocol,

        ClipboardError::Transport(_) | ClipboardError::Io(_) | ClipboardError::IdleTimeout(_) => {
            ErrorType::Transport
        }

        ClipboardError::StaleEvent { .. } => ErrorType::Stale,

        ClipboardError::ClaimVerificationFailed { .. } => ErrorType::Claim,

        ClipboardError::UnsupportedTarget(_) | ClipboardError::NoCompatibleFormat => {
            ErrorType::Format
        }

        ClipboardError::Cancelled => ErrorType::Cancelled,

        ClipboardError::InvalidState(_) => ErrorType::State,
    }
}
