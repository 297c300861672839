//! Retrieving remote selection contents
//!
//! Two flows:
//!
//! - **Discovery** asks a new owner for `TARGETS` and merges what it reports
//!   into the front-end's format set, chunk by chunk.
//! - **Reads** walk an ordered list of acceptable targets until one of them
//!   converts, then hand back the stream and the MIME type it carries.

use crate::clipboard::atoms::{decode_atoms, Target, Timestamp};
use crate::clipboard::error::{ClipboardError, Result};
use crate::clipboard::formats::{
    formats_from_atoms, targets_for_formats, ContentFormats, InputConversion, SpecialTarget,
};
use crate::clipboard::stream::{
    SelectionBackend, SelectionReader, SelectionReply, SelectionStreamFactory, TextListConverter,
};
use crate::config::RetrievalConfig;
use bytes::BytesMut;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// An in-flight read of the selection contents
#[derive(Debug)]
pub struct PendingRetrieval {
    priority: i32,
    cancel: CancellationToken,
    targets: VecDeque<Target>,
}

impl PendingRetrieval {
    /// Prepare a read for any of `formats`
    pub fn new(formats: &ContentFormats, priority: i32, cancel: CancellationToken) -> Self {
        Self {
            priority,
            cancel,
            targets: targets_for_formats(formats).into(),
        }
    }

    /// Targets still to be tried, in order
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    /// IO priority
    pub fn priority(&self) -> i32 {
        self.priority
    }
}

/// Read the selection in the first target that converts
///
/// A failed attempt drops its target and moves on to the next one; once the
/// list is empty the read fails with [`ClipboardError::NoCompatibleFormat`].
/// Cancellation and other unrecoverable errors stop the read without trying
/// further targets.
pub async fn read_selection(
    streams: &dyn SelectionStreamFactory,
    converter: &dyn TextListConverter,
    selection: &str,
    timestamp: Timestamp,
    mut retrieval: PendingRetrieval,
    idle: Duration,
) -> Result<(SelectionReader, String)> {
    match retrieval.targets.front() {
        Some(first) => debug!(
            "{}: new read for {} ({} other options)",
            selection,
            first,
            retrieval.targets.len() - 1
        ),
        None => return Err(ClipboardError::NoCompatibleFormat),
    }

    loop {
        let Some(target) = retrieval.targets.front().cloned() else {
            return Err(ClipboardError::NoCompatibleFormat);
        };

        if retrieval.cancel.is_cancelled() {
            return Err(ClipboardError::Cancelled);
        }

        let attempt = tokio::select! {
            biased;
            _ = retrieval.cancel.cancelled() => return Err(ClipboardError::Cancelled),
            result = tokio::time::timeout(
                idle,
                streams.open_read_stream(
                    selection,
                    &target,
                    timestamp,
                    retrieval.priority,
                    &retrieval.cancel,
                ),
            ) => result.unwrap_or_else(|_| Err(ClipboardError::IdleTimeout(idle.as_secs()))),
        };

        match attempt {
            Ok(reply) => return Ok(finish_read(converter, selection, &target, reply)),
            Err(e) if !e.is_recoverable() => {
                debug!("{}: reading {} aborted: {}", selection, target, e);
                return Err(e);
            }
            Err(e) => {
                retrieval.targets.pop_front();
                match retrieval.targets.front() {
                    Some(next) => debug!(
                        "{}: reading {} failed ({}), trying {} next",
                        selection, target, e, next
                    ),
                    None => {
                        debug!("{}: reading {} failed ({}), giving up", selection, target, e);
                        return Err(ClipboardError::NoCompatibleFormat);
                    }
                }
            }
        }
    }
}

fn finish_read(
    converter: &dyn TextListConverter,
    selection: &str,
    target: &Target,
    reply: SelectionReply,
) -> (SelectionReader, String) {
    let special = SpecialTarget::from_target(target);

    match special.and_then(|s| s.mime_type().map(|m| (s, m))) {
        Some((special, mime_type)) => {
            debug!(
                "{}: reading with converter from {} to {}",
                selection, target, mime_type
            );
            let stream = match special.input_conversion() {
                InputConversion::TextList => {
                    converter.wrap_for_decode(reply.stream, &reply.reply_type, reply.format)
                }
                InputConversion::None => reply.stream,
            };
            (stream, mime_type.to_string())
        }
        None => {
            debug!("{}: reading clipboard as {} now", selection, target);
            (reply.stream, target.to_string())
        }
    }
}

/// Ask the current owner for its targets and merge them into the front-end
///
/// `superseded` is polled before every merge; once it returns true the
/// discovery stops without touching the front-end again. Returns the formats
/// merged by this run.
pub async fn discover_targets(
    backend: &SelectionBackend,
    selection: &str,
    timestamp: Timestamp,
    config: &RetrievalConfig,
    superseded: &dyn Fn() -> bool,
) -> Result<ContentFormats> {
    let target = Target::intern(SpecialTarget::Targets.x_target());
    let cancel = CancellationToken::new();
    let idle = Duration::from_secs(config.idle_abort_secs);

    let open = backend
        .streams
        .open_read_stream(selection, &target, timestamp, config.io_priority, &cancel);
    let reply = match tokio::time::timeout(idle, open).await {
        Ok(result) => {
            result.inspect_err(|e| debug!("{}: can't request TARGETS: {}", selection, e))?
        }
        Err(_) => {
            debug!("{}: TARGETS request idle, abandoning", selection);
            cancel.cancel();
            return Err(ClipboardError::IdleTimeout(config.idle_abort_secs));
        }
    };

    if reply.reply_type != "ATOM" || reply.format != 32 {
        debug!(
            "{}: Wrong reply type to TARGETS: type {} != ATOM or format {} != 32",
            selection, reply.reply_type, reply.format
        );
        return Err(ClipboardError::ProtocolMismatch {
            target: target.to_string(),
            reply_type: reply.reply_type,
            format: reply.format,
        });
    }

    let chunk_size = config
        .max_chunk_size
        .unwrap_or_else(|| backend.display.max_request_size())
        .max(4);

    let mut stream = reply.stream;
    let mut buf = vec![0u8; chunk_size];
    let mut pending = BytesMut::new();
    let mut merged = ContentFormats::new();

    loop {
        let n = match tokio::time::timeout(idle, stream.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                debug!("{}: error reading TARGETS: {}", selection, e);
                return Err(e.into());
            }
            Err(_) => {
                debug!("{}: TARGETS transfer idle, abandoning", selection);
                return Err(ClipboardError::IdleTimeout(config.idle_abort_secs));
            }
        };

        pending.extend_from_slice(&buf[..n]);
        let whole = pending.len() - pending.len() % 4;
        let chunk = pending.split_to(whole);
        let atoms = decode_atoms(&chunk);
        if atoms.is_empty() {
            continue;
        }

        trace!(
            "{}: received targets [ {} ]",
            selection,
            atoms
                .iter()
                .map(|a| backend.display.atom_name(*a).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(", ")
        );

        if superseded() {
            debug!("{}: ownership changed during TARGETS discovery, stopping", selection);
            return Err(ClipboardError::InvalidState(
                "selection claimed locally during discovery".to_string(),
            ));
        }

        let formats = formats_from_atoms(&*backend.display, &atoms);
        debug!("{}: got formats: {}", selection, formats);

        let union = backend.frontend.formats().union(&formats);
        backend.frontend.claim_remote_formats(union);
        merged = merged.union(&formats);
    }

    Ok(merged)
}
