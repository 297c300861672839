//! Selection ownership tracking
//!
//! Keeps track of who owns a selection and when ownership last changed.
//! Server timestamps order ownership changes; events carrying a timestamp
//! older than the recorded one describe a state we have already moved past.

use crate::clipboard::atoms::{Timestamp, CURRENT_TIME};
use crate::clipboard::error::{ClipboardError, Result};
use tracing::debug;

/// Selection ownership state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipState {
    /// Nothing recorded yet
    Unclaimed,
    /// This process owns the selection (claimed at timestamp)
    LocalOwner(Timestamp),
    /// Another client owns the selection (noticed at timestamp)
    RemoteOwner(Timestamp),
}

/// Ownership state machine of one selection
#[derive(Debug, Clone)]
pub struct Ownership {
    state: OwnershipState,
}

impl Ownership {
    /// Start unclaimed
    pub fn new() -> Self {
        Self {
            state: OwnershipState::Unclaimed,
        }
    }

    /// Current state
    pub fn state(&self) -> OwnershipState {
        self.state
    }

    /// Timestamp of the last ownership change
    pub fn timestamp(&self) -> Timestamp {
        match self.state {
            OwnershipState::Unclaimed => CURRENT_TIME,
            OwnershipState::LocalOwner(t) | OwnershipState::RemoteOwner(t) => t,
        }
    }

    /// Returns true if this process owns the selection
    pub fn is_local(&self) -> bool {
        matches!(self.state, OwnershipState::LocalOwner(_))
    }

    /// Record a confirmed local claim
    pub fn claim_local(&mut self, time: Timestamp) {
        debug!("Ownership: {:?} -> LocalOwner({})", self.state, time);
        self.state = OwnershipState::LocalOwner(time);
    }

    /// Record that another client owns the selection
    ///
    /// Unconditional; callers that react to server events check
    /// [`check_clear`](Self::check_clear) first.
    pub fn claim_remote(&mut self, time: Timestamp) {
        debug!("Ownership: {:?} -> RemoteOwner({})", self.state, time);
        self.state = OwnershipState::RemoteOwner(time);
    }

    /// Check whether an ownership-lost notification at `time` is current
    pub fn check_clear(&self, time: Timestamp) -> Result<()> {
        let recorded = self.timestamp();
        if time < recorded {
            return Err(ClipboardError::StaleEvent {
                event: time,
                recorded,
            });
        }
        Ok(())
    }
}

impl Default for Ownership {
    fn default() -> Self {
        Self::new()
    }
}
