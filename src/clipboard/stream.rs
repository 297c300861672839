//! Collaborator interfaces of the selection engine.
//!
//! The engine does not talk to the X server itself. It is handed:
//!
//! - an [`X11Display`] for atoms, selection ownership and server time
//! - a [`SelectionStreamFactory`] that turns selection conversions into byte
//!   streams (INCR handling, property chunking and SelectionNotify live there)
//! - a [`TextListConverter`] for the legacy `STRING`/`COMPOUND_TEXT` encodings
//! - a [`ClipboardFrontend`], the generic clipboard object that owns the
//!   format bookkeeping and the actual content
//!
//! All of them run on the display thread, hence the `?Send` async traits and
//! `Rc` sharing.

use crate::clipboard::atoms::{Atom, Target, Timestamp, Window};
use crate::clipboard::error::Result;
use crate::clipboard::formats::ContentFormats;
use async_trait::async_trait;
use std::fmt;
use std::pin::Pin;
use std::rc::Rc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Readable selection data
pub type SelectionReader = Pin<Box<dyn AsyncRead>>;

/// Writable selection data; closing it completes the transfer
pub type SelectionWriter = Pin<Box<dyn AsyncWrite>>;

/// Result of converting a selection into a target
pub struct SelectionReply {
    /// The data
    pub stream: SelectionReader,
    /// Property type the owner advertised (e.g. `ATOM`, `STRING`)
    pub reply_type: String,
    /// Property format width in bits (8, 16 or 32)
    pub format: u8,
}

impl fmt::Debug for SelectionReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionReply")
            .field("reply_type", &self.reply_type)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Display connection primitives the engine relies on
#[cfg_attr(test, mockall::automock)]
pub trait X11Display {
    /// Intern an atom by name
    fn intern_atom(&self, name: &str) -> Atom;

    /// Name of an atom, if the server knows it
    fn atom_name(&self, atom: Atom) -> Option<String>;

    /// The hidden window this process uses for selection traffic
    fn leader_window(&self) -> Window;

    /// Most recent server timestamp seen in an event
    fn last_seen_time(&self) -> Timestamp;

    /// Largest property chunk the server accepts in one request, in bytes
    fn max_request_size(&self) -> usize;

    /// `XSetSelectionOwner`
    fn set_selection_owner(&self, selection: Atom, owner: Window, time: Timestamp);

    /// `XGetSelectionOwner`
    fn selection_owner(&self, selection: Atom) -> Window;

    /// Ask for XFixes SelectionNotify events for `selection`
    fn request_selection_notification(&self, selection: Atom);
}

/// Opens selection byte streams
#[async_trait(?Send)]
pub trait SelectionStreamFactory {
    /// Convert `selection` to `target` and stream the result
    async fn open_read_stream(
        &self,
        selection: &str,
        target: &Target,
        timestamp: Timestamp,
        priority: i32,
        cancel: &CancellationToken,
    ) -> Result<SelectionReply>;

    /// Stream for answering a request
    ///
    /// The returned writer owns `notify`; shutting it down sends the positive
    /// SelectionNotify, dropping it early sends the negative one.
    fn open_write_stream(
        &self,
        notify: PendingSelectionNotify,
        reply_type: &str,
        format: u8,
    ) -> SelectionWriter;

    /// Send the SelectionNotify event answering `request`
    fn send_selection_notify(&self, request: &SelectionRequest, success: bool);
}

/// Converters between UTF-8 and legacy X text lists
pub trait TextListConverter {
    /// Decode `encoding` text read from the selection into UTF-8
    fn wrap_for_decode(&self, stream: SelectionReader, encoding: &str, format: u8)
        -> SelectionReader;

    /// Encode UTF-8 written to the returned stream into `encoding`
    fn wrap_for_encode(&self, stream: SelectionWriter, encoding: &str, format: u8)
        -> SelectionWriter;
}

/// The generic clipboard object a selection handle backs
#[async_trait(?Send)]
pub trait ClipboardFrontend {
    /// Record that someone else owns the clipboard with these formats
    fn claim_remote_formats(&self, formats: ContentFormats);

    /// Record that we own the clipboard with these formats
    fn claim_local_formats(&self, formats: ContentFormats);

    /// Currently advertised formats
    fn formats(&self) -> ContentFormats;

    /// Returns true if this process provides the content
    fn is_local(&self) -> bool;

    /// Serialize the local content as `mime_type` into `stream` and close it
    async fn write_content(&self, mime_type: &str, stream: SelectionWriter) -> Result<()>;
}

/// Collaborators of one selection handle
#[derive(Clone)]
pub struct SelectionBackend {
    /// Display connection
    pub display: Rc<dyn X11Display>,
    /// Stream factory
    pub streams: Rc<dyn SelectionStreamFactory>,
    /// Legacy text converter
    pub converter: Rc<dyn TextListConverter>,
    /// Generic clipboard object
    pub frontend: Rc<dyn ClipboardFrontend>,
}

impl fmt::Debug for SelectionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionBackend").finish_non_exhaustive()
    }
}

// =============================================================================
// Outgoing requests
// =============================================================================

/// A SelectionRequest being answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRequest {
    /// Window asking for the data
    pub requestor: Window,
    /// Selection atom
    pub selection: Atom,
    /// Requested target atom
    pub target: Atom,
    /// Destination property atom (the target for obsolete clients)
    pub property: Atom,
    /// Requestor's timestamp
    pub time: Timestamp,
    /// Name of the requested target
    pub target_name: Target,
    /// Name of the destination property
    pub property_name: String,
}

/// Guarantees a SelectionRequest gets exactly one SelectionNotify
///
/// Call [`send`](Self::send) to answer explicitly. If the value is dropped
/// unanswered (failed write, abandoned stream) a refusal is sent.
pub struct PendingSelectionNotify {
    request: SelectionRequest,
    factory: Rc<dyn SelectionStreamFactory>,
    sent: bool,
}

impl PendingSelectionNotify {
    /// Create a pending reply for `request`
    pub fn new(request: SelectionRequest, factory: Rc<dyn SelectionStreamFactory>) -> Self {
        Self {
            request,
            factory,
            sent: false,
        }
    }

    /// The request being answered
    pub fn request(&self) -> &SelectionRequest {
        &self.request
    }

    /// Send the reply
    pub fn send(mut self, success: bool) {
        self.sent = true;
        self.factory.send_selection_notify(&self.request, success);
    }
}

impl Drop for PendingSelectionNotify {
    fn drop(&mut self) {
        if !self.sent {
            warn!(
                "SelectionRequest for {} dropped without reply, refusing",
                self.request.target_name
            );
            self.factory.send_selection_notify(&self.request, false);
        }
    }
}

impl fmt::Debug for PendingSelectionNotify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSelectionNotify")
            .field("request", &self.request)
            .field("sent", &self.sent)
            .finish()
    }
}
