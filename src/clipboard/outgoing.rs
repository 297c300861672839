//! Answering SelectionRequests
//!
//! When another client asks for the selection we own, the requested target
//! decides how the reply stream is produced:
//!
//! - a MIME type we have content for goes straight to the front-end writer
//! - a special target runs its [`TargetHandler`]
//! - anything else is refused right away
//!
//! Every path ends in exactly one SelectionNotify. Write failures are logged
//! and only affect the request they happened on.

use crate::clipboard::atoms::{encode_atoms, Timestamp};
use crate::clipboard::error::ClipboardError;
use crate::clipboard::formats::{atoms_for_formats, SpecialTarget, TargetHandler, MIME_TEXT_UTF8};
use crate::clipboard::stream::{
    ClipboardFrontend, PendingSelectionNotify, SelectionBackend, SelectionWriter,
};
use std::rc::Rc;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// How a request was answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Content is being written by the front-end in this MIME type
    Content(String),
    /// A special target handler is writing the reply
    Special(SpecialTarget),
    /// A negative reply was sent
    Refused,
}

/// Answer one SelectionRequest
///
/// Must be called from within a [`tokio::task::LocalSet`]; writes continue
/// in the background after this returns.
pub fn handle_selection_request(
    backend: &SelectionBackend,
    selection: &str,
    timestamp: Timestamp,
    notify: PendingSelectionNotify,
) -> RequestOutcome {
    let target = notify.request().target_name.clone();

    if target.is_mime_type() {
        if backend.frontend.formats().contains_mime_type(&target) {
            let stream = backend.streams.open_write_stream(notify, &target, 8);
            spawn_write_content(backend.frontend.clone(), selection, &target, stream);
            return RequestOutcome::Content(target.to_string());
        }
    } else if let Some(special) = SpecialTarget::from_target(&target) {
        if let Some(handler) = special.handler() {
            let stream =
                backend
                    .streams
                    .open_write_stream(notify, special.reply_type(), special.format());
            run_handler(backend, selection, timestamp, special, handler, stream);
            return RequestOutcome::Special(special);
        }
    }

    debug!(
        "{}: refusing request: {}",
        selection,
        ClipboardError::UnsupportedTarget(target.to_string())
    );
    notify.send(false);
    RequestOutcome::Refused
}

fn run_handler(
    backend: &SelectionBackend,
    selection: &str,
    timestamp: Timestamp,
    special: SpecialTarget,
    handler: TargetHandler,
    stream: SelectionWriter,
) {
    match handler {
        TargetHandler::Utf8 => {
            spawn_write_content(backend.frontend.clone(), selection, MIME_TEXT_UTF8, stream);
        }
        TargetHandler::TextList => {
            let stream =
                backend
                    .converter
                    .wrap_for_encode(stream, special.reply_type(), special.format());
            spawn_write_content(backend.frontend.clone(), selection, MIME_TEXT_UTF8, stream);
        }
        TargetHandler::Targets => {
            let atoms = atoms_for_formats(&*backend.display, &backend.frontend.formats());
            debug!("{}: sending {} targets", selection, atoms.len());
            spawn_write_all(stream, encode_atoms(&atoms), selection, "targets");
        }
        TargetHandler::Timestamp => {
            spawn_write_all(
                stream,
                timestamp.to_ne_bytes().to_vec(),
                selection,
                "timestamp",
            );
        }
    }
}

fn spawn_write_content(
    frontend: Rc<dyn ClipboardFrontend>,
    selection: &str,
    mime_type: &str,
    stream: SelectionWriter,
) {
    let selection = selection.to_string();
    let mime_type = mime_type.to_string();
    tokio::task::spawn_local(async move {
        if let Err(e) = frontend.write_content(&mime_type, stream).await {
            debug!("{}: failed to write stream: {}", selection, e);
        }
    });
}

fn spawn_write_all(
    mut stream: SelectionWriter,
    data: Vec<u8>,
    selection: &str,
    what: &'static str,
) {
    let selection = selection.to_string();
    tokio::task::spawn_local(async move {
        let result: std::io::Result<()> = async {
            stream.write_all(&data).await?;
            stream.shutdown().await
        }
        .await;

        if let Err(e) = result {
            debug!("{}: failed to send {}: {}", selection, what, e);
        }
    });
}
