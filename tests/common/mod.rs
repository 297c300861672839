//! In-memory collaborators for driving the selection engine in tests

#![allow(dead_code)]

use async_trait::async_trait;
use lamco_x11_clipboard::clipboard::{
    Atom, ClipboardError, ClipboardFrontend, ContentFormats, PendingSelectionNotify, Result,
    SelectionBackend, SelectionReader, SelectionReply, SelectionRequest, SelectionStreamFactory,
    SelectionWriter, Target, TextListConverter, Timestamp, Window, X11Display,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

pub const LEADER: Window = Window(1);

/// Fake display connection
pub struct FakeDisplay {
    atoms: RefCell<HashMap<String, Atom>>,
    names: RefCell<HashMap<Atom, String>>,
    owners: RefCell<HashMap<Atom, Window>>,
    pub last_seen: Cell<Timestamp>,
    pub max_request: Cell<usize>,
    pub owner_calls: RefCell<Vec<(Atom, Window, Timestamp)>>,
    pub xfixes_requests: RefCell<Vec<Atom>>,
}

impl FakeDisplay {
    pub fn new() -> Self {
        Self {
            atoms: RefCell::new(HashMap::new()),
            names: RefCell::new(HashMap::new()),
            owners: RefCell::new(HashMap::new()),
            last_seen: Cell::new(1000),
            max_request: Cell::new(4096),
            owner_calls: RefCell::new(Vec::new()),
            xfixes_requests: RefCell::new(Vec::new()),
        }
    }

    pub fn atom(&self, name: &str) -> Atom {
        self.intern_atom(name)
    }

    pub fn atoms(&self, names: &[&str]) -> Vec<Atom> {
        names.iter().map(|n| self.intern_atom(n)).collect()
    }
}

impl X11Display for FakeDisplay {
    fn intern_atom(&self, name: &str) -> Atom {
        let mut atoms = self.atoms.borrow_mut();
        if let Some(atom) = atoms.get(name) {
            return *atom;
        }
        let atom = Atom(100 + atoms.len() as u32);
        atoms.insert(name.to_string(), atom);
        self.names.borrow_mut().insert(atom, name.to_string());
        atom
    }

    fn atom_name(&self, atom: Atom) -> Option<String> {
        self.names.borrow().get(&atom).cloned()
    }

    fn leader_window(&self) -> Window {
        LEADER
    }

    fn last_seen_time(&self) -> Timestamp {
        self.last_seen.get()
    }

    fn max_request_size(&self) -> usize {
        self.max_request.get()
    }

    fn set_selection_owner(&self, selection: Atom, owner: Window, time: Timestamp) {
        self.owner_calls.borrow_mut().push((selection, owner, time));
        self.owners.borrow_mut().insert(selection, owner);
    }

    fn selection_owner(&self, selection: Atom) -> Window {
        self.owners
            .borrow()
            .get(&selection)
            .copied()
            .unwrap_or(Window::NONE)
    }

    fn request_selection_notification(&self, selection: Atom) {
        self.xfixes_requests.borrow_mut().push(selection);
    }
}

/// A completed reply written through the fake stream factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReply {
    pub target: String,
    pub reply_type: String,
    pub format: u8,
    pub data: Vec<u8>,
}

/// Fake stream factory: serves canned conversions and records replies
#[derive(Default)]
pub struct FakeStreams {
    conversions: RefCell<HashMap<String, (Vec<u8>, String, u8)>>,
    hanging: RefCell<HashSet<String>>,
    closed: RefCell<HashSet<String>>,
    pub attempts: RefCell<Vec<(String, Timestamp)>>,
    pub written: Rc<RefCell<Vec<WrittenReply>>>,
    pub notifies: RefCell<Vec<(String, String, bool)>>,
}

impl FakeStreams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner answers `target` with `data`
    pub fn serve(&self, target: &str, data: &[u8], reply_type: &str, format: u8) {
        self.conversions.borrow_mut().insert(
            target.to_string(),
            (data.to_vec(), reply_type.to_string(), format),
        );
    }

    /// Owner advertises `atoms` in its TARGETS reply
    pub fn serve_targets(&self, atoms: &[Atom]) {
        let data: Vec<u8> = atoms.iter().flat_map(|a| a.0.to_ne_bytes()).collect();
        self.serve("TARGETS", &data, "ATOM", 32);
    }

    /// Owner never answers `target`
    pub fn hang(&self, target: &str) {
        self.hanging.borrow_mut().insert(target.to_string());
    }

    /// Opening `target` fails with an error no other target can recover from
    pub fn close(&self, target: &str) {
        self.closed.borrow_mut().insert(target.to_string());
    }

    pub fn attempted_targets(&self) -> Vec<String> {
        self.attempts.borrow().iter().map(|(t, _)| t.clone()).collect()
    }
}

#[async_trait(?Send)]
impl SelectionStreamFactory for FakeStreams {
    async fn open_read_stream(
        &self,
        _selection: &str,
        target: &Target,
        timestamp: Timestamp,
        _priority: i32,
        _cancel: &CancellationToken,
    ) -> Result<SelectionReply> {
        self.attempts
            .borrow_mut()
            .push((target.to_string(), timestamp));

        if self.hanging.borrow().contains(target.as_str()) {
            std::future::pending::<()>().await;
        }
        if self.closed.borrow().contains(target.as_str()) {
            return Err(ClipboardError::InvalidState(
                "display connection closed".to_string(),
            ));
        }

        let conversion = self.conversions.borrow().get(target.as_str()).cloned();
        match conversion {
            Some((data, reply_type, format)) => Ok(SelectionReply {
                stream: Box::pin(Cursor::new(data)),
                reply_type,
                format,
            }),
            None => Err(ClipboardError::Transport(format!(
                "conversion to {} refused",
                target
            ))),
        }
    }

    fn open_write_stream(
        &self,
        notify: PendingSelectionNotify,
        reply_type: &str,
        format: u8,
    ) -> SelectionWriter {
        Box::pin(RecordingWriter {
            target: notify.request().target_name.to_string(),
            reply_type: reply_type.to_string(),
            format,
            buf: Vec::new(),
            notify: Some(notify),
            sink: self.written.clone(),
        })
    }

    fn send_selection_notify(&self, request: &SelectionRequest, success: bool) {
        self.notifies.borrow_mut().push((
            request.target_name.to_string(),
            request.property_name.clone(),
            success,
        ));
    }
}

/// Collects written bytes; shutdown completes the reply
struct RecordingWriter {
    target: String,
    reply_type: String,
    format: u8,
    buf: Vec<u8>,
    notify: Option<PendingSelectionNotify>,
    sink: Rc<RefCell<Vec<WrittenReply>>>,
}

impl AsyncWrite for RecordingWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.get_mut().buf.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        if let Some(notify) = this.notify.take() {
            this.sink.borrow_mut().push(WrittenReply {
                target: this.target.clone(),
                reply_type: this.reply_type.clone(),
                format: this.format,
                data: std::mem::take(&mut this.buf),
            });
            notify.send(true);
        }
        Poll::Ready(Ok(()))
    }
}

/// Converter that tags decoded streams and records every wrap
#[derive(Default)]
pub struct FakeConverter {
    pub decodes: RefCell<Vec<(String, u8)>>,
    pub encodes: RefCell<Vec<(String, u8)>>,
}

pub const DECODED_PREFIX: &[u8] = b"decoded:";

impl TextListConverter for FakeConverter {
    fn wrap_for_decode(
        &self,
        stream: SelectionReader,
        encoding: &str,
        format: u8,
    ) -> SelectionReader {
        self.decodes
            .borrow_mut()
            .push((encoding.to_string(), format));
        Box::pin(Cursor::new(DECODED_PREFIX).chain(stream))
    }

    fn wrap_for_encode(
        &self,
        stream: SelectionWriter,
        encoding: &str,
        format: u8,
    ) -> SelectionWriter {
        self.encodes
            .borrow_mut()
            .push((encoding.to_string(), format));
        stream
    }
}

/// Generic clipboard object holding a piece of text
pub struct FakeFrontend {
    formats: RefCell<ContentFormats>,
    local: Cell<bool>,
    pub text: RefCell<Vec<u8>>,
    pub claims: RefCell<Vec<(bool, ContentFormats)>>,
    pub writes: RefCell<Vec<String>>,
}

impl FakeFrontend {
    pub fn new() -> Self {
        Self {
            formats: RefCell::new(ContentFormats::new()),
            local: Cell::new(false),
            text: RefCell::new(b"hello".to_vec()),
            claims: RefCell::new(Vec::new()),
            writes: RefCell::new(Vec::new()),
        }
    }
}

#[async_trait(?Send)]
impl ClipboardFrontend for FakeFrontend {
    fn claim_remote_formats(&self, formats: ContentFormats) {
        self.claims.borrow_mut().push((false, formats.clone()));
        self.local.set(false);
        *self.formats.borrow_mut() = formats;
    }

    fn claim_local_formats(&self, formats: ContentFormats) {
        self.claims.borrow_mut().push((true, formats.clone()));
        self.local.set(true);
        *self.formats.borrow_mut() = formats;
    }

    fn formats(&self) -> ContentFormats {
        self.formats.borrow().clone()
    }

    fn is_local(&self) -> bool {
        self.local.get()
    }

    async fn write_content(&self, mime_type: &str, mut stream: SelectionWriter) -> Result<()> {
        self.writes.borrow_mut().push(mime_type.to_string());
        let text = self.text.borrow().clone();
        stream.write_all(&text).await?;
        stream.shutdown().await?;
        Ok(())
    }
}

/// All fakes of one selection
pub struct Harness {
    pub display: Rc<FakeDisplay>,
    pub streams: Rc<FakeStreams>,
    pub converter: Rc<FakeConverter>,
    pub frontend: Rc<FakeFrontend>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            display: Rc::new(FakeDisplay::new()),
            streams: Rc::new(FakeStreams::new()),
            converter: Rc::new(FakeConverter::default()),
            frontend: Rc::new(FakeFrontend::new()),
        }
    }

    pub fn backend(&self) -> SelectionBackend {
        SelectionBackend {
            display: self.display.clone(),
            streams: self.streams.clone(),
            converter: self.converter.clone(),
            frontend: self.frontend.clone(),
        }
    }

    pub fn request(&self, selection: &str, target: &str, requestor: Window) -> SelectionRequest {
        SelectionRequest {
            requestor,
            selection: self.display.atom(selection),
            target: self.display.atom(target),
            property: self.display.atom("XSEL_DATA"),
            time: 2000,
            target_name: Target::intern(target),
            property_name: "XSEL_DATA".to_string(),
        }
    }
}

/// Let spawned local tasks run until they block
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Drain a selection stream
pub async fn read_all(mut stream: SelectionReader) -> Vec<u8> {
    let mut data = Vec::new();
    stream
        .read_to_end(&mut data)
        .await
        .expect("read selection stream");
    data
}

/// Run `f` inside a `LocalSet` so engine tasks can be spawned
pub async fn run_local<F: std::future::Future>(f: F) -> F::Output {
    tokio::task::LocalSet::new().run_until(f).await
}
