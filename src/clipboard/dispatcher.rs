//! Routing of display events to selection handles
//!
//! The display event loop hands every event to [`Dispatcher::filter_event`].
//! Selection events for a registered selection are consumed or observed by
//! its handle; everything else passes through untouched.

use crate::clipboard::atoms::{Atom, Timestamp, Window};
use crate::clipboard::stream::{PendingSelectionNotify, SelectionBackend, SelectionRequest};
use crate::clipboard::x11::X11Clipboard;
use crate::config::Config;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Server events the selection engine cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XEvent {
    /// We lost ownership of a selection
    SelectionClear {
        /// Window the event was delivered to
        window: Window,
        /// Selection atom
        selection: Atom,
        /// Server time of the ownership change
        time: Timestamp,
    },
    /// Another client asks for the contents of a selection
    SelectionRequest {
        /// Window the event was delivered to (the owner)
        window: Window,
        /// The request
        request: SelectionRequest,
    },
    /// XFixes reports an owner change
    XFixesSelectionNotify {
        /// Window the event was delivered to
        window: Window,
        /// New owner, `None` if the selection was released
        owner: Window,
        /// Selection atom
        selection: Atom,
        /// Event time
        timestamp: Timestamp,
        /// Time the owner took the selection
        selection_timestamp: Timestamp,
    },
    /// Anything else
    Other,
}

/// Whether the event loop should keep processing an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReturn {
    /// Pass the event on
    Continue,
    /// The event was consumed
    Remove,
}

/// Registry of selection handles keyed by selection atom
#[derive(Debug, Default)]
pub struct Dispatcher {
    handles: HashMap<Atom, X11Clipboard>,
}

impl Dispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a handle for every configured selection
    ///
    /// `make_backend` supplies the collaborators of each selection, most
    /// importantly its own front-end clipboard object.
    pub fn register_all(
        &mut self,
        config: &Config,
        mut make_backend: impl FnMut(&str) -> SelectionBackend,
    ) -> Vec<X11Clipboard> {
        config
            .selection
            .selections
            .iter()
            .map(|name| {
                let clipboard = X11Clipboard::new(make_backend(name), name, config);
                self.register(clipboard.clone());
                clipboard
            })
            .collect()
    }

    /// Route events for the handle's selection to it
    ///
    /// Returns the handle previously registered for the same selection.
    pub fn register(&mut self, clipboard: X11Clipboard) -> Option<X11Clipboard> {
        debug!("Registering selection {}", clipboard.selection());
        self.handles.insert(clipboard.xselection(), clipboard)
    }

    /// Stop routing events for `selection`
    pub fn unregister(&mut self, selection: Atom) -> Option<X11Clipboard> {
        let removed = self.handles.remove(&selection);
        if let Some(clipboard) = &removed {
            debug!("Unregistered selection {}", clipboard.selection());
        }
        removed
    }

    /// Handle registered for `selection`
    pub fn get(&self, selection: Atom) -> Option<&X11Clipboard> {
        self.handles.get(&selection)
    }

    /// Number of registered selections
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Let the selection handles look at a display event
    pub fn filter_event(&self, event: XEvent) -> FilterReturn {
        match event {
            XEvent::SelectionClear {
                window,
                selection,
                time,
            } => {
                let Some(clipboard) = self.handle_for(window, selection) else {
                    return FilterReturn::Continue;
                };

                if clipboard.handle_selection_clear(time) {
                    FilterReturn::Remove
                } else {
                    FilterReturn::Continue
                }
            }

            XEvent::SelectionRequest { window, request } => {
                let Some(clipboard) = self.handle_for(window, request.selection) else {
                    return FilterReturn::Continue;
                };

                if !clipboard.is_local() {
                    debug!(
                        "{}: got SelectionRequest for {} while not owning the selection",
                        clipboard.selection(),
                        request.target_name
                    );
                    return FilterReturn::Remove;
                }

                if request.requestor.is_none() {
                    debug!(
                        "{}: got SelectionRequest for {} without a requestor",
                        clipboard.selection(),
                        request.target_name
                    );
                    return FilterReturn::Remove;
                }

                let request = normalize_property(request);
                debug!(
                    "{}: got SelectionRequest for {} @ {}",
                    clipboard.selection(),
                    request.target_name,
                    request.property_name
                );

                let notify =
                    PendingSelectionNotify::new(request, clipboard.backend().streams.clone());
                clipboard.handle_selection_request(notify);
                FilterReturn::Remove
            }

            XEvent::XFixesSelectionNotify {
                window,
                owner,
                selection,
                selection_timestamp,
                ..
            } => {
                if let Some(clipboard) = self.handle_for(window, selection) {
                    clipboard.handle_owner_change(owner, selection_timestamp);
                }
                FilterReturn::Continue
            }

            XEvent::Other => FilterReturn::Continue,
        }
    }

    fn handle_for(&self, window: Window, selection: Atom) -> Option<&X11Clipboard> {
        let clipboard = self.handles.get(&selection)?;
        if window != clipboard.backend().display.leader_window() {
            trace!(
                "{}: event for foreign window {:?}",
                clipboard.selection(),
                window
            );
            return None;
        }
        Some(clipboard)
    }
}

/// Obsolete clients send `None` as the property; reply in the target instead
fn normalize_property(mut request: SelectionRequest) -> SelectionRequest {
    if request.property.is_none() {
        request.property = request.target;
        request.property_name = request.target_name.to_string();
    }
    request
}
