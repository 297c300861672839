//! X11 selection handle
//!
//! One [`X11Clipboard`] backs one named selection (`CLIPBOARD`, `PRIMARY`,
//! ...). It tracks ownership, answers requests while we own the selection,
//! discovers the targets of remote owners and reads their contents.
//!
//! The handle is a cheap clone over shared state; the [`Dispatcher`] keeps
//! one clone per selection to route server events.
//!
//! [`Dispatcher`]: crate::clipboard::Dispatcher

use crate::clipboard::atoms::{Atom, Timestamp, Window, CURRENT_TIME};
use crate::clipboard::error::{classify_error, ClipboardError, Result};
use crate::clipboard::formats::ContentFormats;
use crate::clipboard::outgoing::{self, RequestOutcome};
use crate::clipboard::ownership::{Ownership, OwnershipState};
use crate::clipboard::retrieval::{self, PendingRetrieval};
use crate::clipboard::stream::{PendingSelectionNotify, SelectionBackend, SelectionReader};
use crate::config::{Config, RetrievalConfig};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Handle for one X11 selection
#[derive(Clone)]
pub struct X11Clipboard {
    inner: Rc<ClipboardInner>,
}

struct ClipboardInner {
    selection: String,
    xselection: Atom,
    ownership: RefCell<Ownership>,
    discoveries: Cell<u64>,
    backend: SelectionBackend,
    retrieval: RetrievalConfig,
}

impl X11Clipboard {
    /// Create the handle for `selection`
    ///
    /// Interns the selection atom, subscribes to owner changes when XFixes is
    /// enabled and assumes a remote owner until told otherwise, which starts
    /// a first TARGETS discovery. Must be called within a
    /// [`tokio::task::LocalSet`].
    pub fn new(backend: SelectionBackend, selection: &str, config: &Config) -> Self {
        let xselection = backend.display.intern_atom(selection);

        if config.selection.use_xfixes {
            backend.display.request_selection_notification(xselection);
        }

        let clipboard = Self {
            inner: Rc::new(ClipboardInner {
                selection: selection.to_string(),
                xselection,
                ownership: RefCell::new(Ownership::new()),
                discoveries: Cell::new(0),
                backend,
                retrieval: config.retrieval.clone(),
            }),
        };

        debug!("{}: created selection handle", selection);
        clipboard.claim_remote(CURRENT_TIME);
        clipboard
    }

    /// Selection name
    pub fn selection(&self) -> &str {
        &self.inner.selection
    }

    /// Selection atom
    pub fn xselection(&self) -> Atom {
        self.inner.xselection
    }

    /// Ownership state
    pub fn state(&self) -> OwnershipState {
        self.inner.ownership.borrow().state()
    }

    /// Timestamp of the last ownership change
    pub fn timestamp(&self) -> Timestamp {
        self.inner.ownership.borrow().timestamp()
    }

    /// Returns true if we own the selection
    pub fn is_local(&self) -> bool {
        self.inner.ownership.borrow().is_local()
    }

    /// Number of TARGETS discoveries started so far
    pub fn discovery_generation(&self) -> u64 {
        self.inner.discoveries.get()
    }

    /// Collaborators of this handle
    pub fn backend(&self) -> &SelectionBackend {
        &self.inner.backend
    }

    /// Take ownership of the selection
    ///
    /// With `has_content` false the selection is released instead (owner set
    /// to `None`), which other clients see as an empty selection. On success
    /// the front-end is told to advertise `formats` as local content.
    pub fn claim_local(&self, formats: ContentFormats, has_content: bool) -> Result<()> {
        let display = &self.inner.backend.display;
        let xselection = self.inner.xselection;
        let time = display.last_seen_time();

        if has_content {
            let window = display.leader_window();
            display.set_selection_owner(xselection, window, time);
            if display.selection_owner(xselection) != window {
                warn!("{}: failed XSetSelectionOwner()", self.inner.selection);
                return Err(ClipboardError::ClaimVerificationFailed {
                    selection: self.inner.selection.clone(),
                });
            }
        } else {
            display.set_selection_owner(xselection, Window::NONE, time);
        }

        self.inner.ownership.borrow_mut().claim_local(time);
        info!(
            "{}: claimed via XSetSelectionOwner() at {}",
            self.inner.selection, time
        );

        self.inner.backend.frontend.claim_local_formats(formats);
        Ok(())
    }

    /// Record a remote owner and discover its targets
    ///
    /// The front-end is reset to an empty remote format set right away;
    /// discovery merges formats in as they arrive. Earlier discoveries keep
    /// running. The returned task resolves to the formats this discovery
    /// merged.
    pub fn claim_remote(&self, timestamp: Timestamp) -> JoinHandle<Result<ContentFormats>> {
        self.inner
            .backend
            .frontend
            .claim_remote_formats(ContentFormats::new());
        self.inner.ownership.borrow_mut().claim_remote(timestamp);

        let generation = self.inner.discoveries.get() + 1;
        self.inner.discoveries.set(generation);
        debug!(
            "{}: remote owner at {}, starting discovery #{}",
            self.inner.selection, timestamp, generation
        );

        let inner = self.inner.clone();
        tokio::task::spawn_local(async move {
            let superseded = || inner.ownership.borrow().is_local();
            let result = retrieval::discover_targets(
                &inner.backend,
                &inner.selection,
                timestamp,
                &inner.retrieval,
                &superseded,
            )
            .await;

            if let Err(e) = &result {
                debug!(
                    "{}: discovery #{} ended ({:?}): {}",
                    inner.selection,
                    generation,
                    classify_error(e),
                    e
                );
            }
            result
        })
    }

    /// React to losing the selection
    ///
    /// Returns false for clears older than the recorded ownership change;
    /// those are ignored.
    pub fn handle_selection_clear(&self, time: Timestamp) -> bool {
        if let Err(e) = self.inner.ownership.borrow().check_clear(time) {
            debug!("{}: ignoring SelectionClear: {}", self.inner.selection, e);
            return false;
        }

        debug!("{}: lost selection ownership at {}", self.inner.selection, time);
        self.claim_remote(time);
        true
    }

    /// React to an XFixes owner change
    ///
    /// Changes caused by our own leader window are ignored. Returns true if a
    /// remote claim was recorded.
    pub fn handle_owner_change(&self, owner: Window, selection_timestamp: Timestamp) -> bool {
        if owner == self.inner.backend.display.leader_window() {
            debug!(
                "{}: ignoring XFixes owner change to ourselves",
                self.inner.selection
            );
            return false;
        }

        debug!(
            "{}: new selection owner {:?} at {}",
            self.inner.selection, owner, selection_timestamp
        );
        self.claim_remote(selection_timestamp);
        true
    }

    /// Answer a SelectionRequest for this selection
    pub fn handle_selection_request(&self, notify: PendingSelectionNotify) -> RequestOutcome {
        let timestamp = self.timestamp();
        outgoing::handle_selection_request(
            &self.inner.backend,
            &self.inner.selection,
            timestamp,
            notify,
        )
    }

    /// Read the remote contents in one of `formats`
    ///
    /// Targets are derived from `formats` alone, so reads work before
    /// discovery finishes and against owners that never answer `TARGETS`.
    /// Returns the stream together with the MIME type it carries.
    pub async fn read(
        &self,
        formats: &ContentFormats,
        priority: i32,
        cancel: CancellationToken,
    ) -> Result<(SelectionReader, String)> {
        let timestamp = self.timestamp();
        let pending = PendingRetrieval::new(formats, priority, cancel);
        let backend = &self.inner.backend;

        retrieval::read_selection(
            &*backend.streams,
            &*backend.converter,
            &self.inner.selection,
            timestamp,
            pending,
            Duration::from_secs(self.inner.retrieval.idle_abort_secs),
        )
        .await
    }
}

impl fmt::Debug for X11Clipboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X11Clipboard")
            .field("selection", &self.inner.selection)
            .field("xselection", &self.inner.xselection)
            .field("state", &self.state())
            .field("discoveries", &self.inner.discoveries.get())
            .finish()
    }
}
