//! X11 selection engine
//!
//! Implements the inter-client selection protocol for one process: claiming
//! ownership of named selections, answering other clients' requests for the
//! contents, and retrieving remote contents asynchronously.
//!
//! # Architecture
//!
//! ```text
//! display event loop
//!   └─> Dispatcher (per-selection registry)
//!         └─> X11Clipboard (one per selection)
//!               ├─> Ownership          claim/clear state machine
//!               ├─> outgoing           SelectionRequest answers
//!               └─> retrieval          TARGETS discovery + fallback reads
//!                     └─> formats      target <-> MIME mapping
//! ```
//!
//! The X server connection, the byte stream plumbing (INCR, property
//! chunking), text list converters and the generic clipboard object are
//! collaborators supplied through the traits in [`stream`].
//!
//! # Threading
//!
//! Everything runs on the display thread. Background work (discovery, reply
//! writes) is spawned with [`tokio::task::spawn_local`], so the engine has to
//! be driven from within a [`tokio::task::LocalSet`].
//!
//! # Example
//!
//! ```ignore
//! let mut dispatcher = Dispatcher::new();
//! let handles = dispatcher.register_all(&config, |name| make_backend(name));
//!
//! // in the display event loop
//! if dispatcher.filter_event(event) == FilterReturn::Remove {
//!     continue;
//! }
//! ```

pub mod atoms;
pub mod dispatcher;
pub mod error;
pub mod formats;
pub mod outgoing;
pub mod ownership;
pub mod retrieval;
pub mod stream;
pub mod x11;

pub use atoms::{Atom, Target, Timestamp, Window, CURRENT_TIME};
pub use dispatcher::{Dispatcher, FilterReturn, XEvent};
pub use error::{ClipboardError, ErrorType, Result};
pub use formats::{ContentFormats, SpecialTarget, MIME_TEXT_UTF8};
pub use outgoing::RequestOutcome;
pub use ownership::{Ownership, OwnershipState};
pub use retrieval::PendingRetrieval;
pub use stream::{
    ClipboardFrontend, PendingSelectionNotify, SelectionBackend, SelectionReader,
    SelectionReply, SelectionRequest, SelectionStreamFactory, SelectionWriter,
    TextListConverter, X11Display,
};
pub use x11::X11Clipboard;
