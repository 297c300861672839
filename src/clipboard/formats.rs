//! Target ↔ MIME type mapping.
//!
//! X11 clients advertise selection contents as a list of targets. Modern
//! clients use MIME type names directly; older ones use a handful of legacy
//! names (`STRING`, `UTF8_STRING`, ...). This module owns the table of those
//! legacy targets and the conversions between target lists and MIME sets.

use crate::clipboard::atoms::{Atom, Target};
use crate::clipboard::stream::X11Display;
use tracing::trace;

/// MIME type of UTF-8 plain text
pub const MIME_TEXT_UTF8: &str = "text/plain;charset=utf-8";

// =============================================================================
// Content formats
// =============================================================================

/// An ordered, duplicate-free set of MIME types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFormats {
    mime_types: Vec<String>,
}

impl ContentFormats {
    /// Create an empty format set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a MIME type unless it is already present
    pub fn add_mime_type(&mut self, mime_type: impl Into<String>) {
        let mime_type = mime_type.into();
        if !self.contains_mime_type(&mime_type) {
            self.mime_types.push(mime_type);
        }
    }

    /// Returns true if the MIME type is part of the set
    pub fn contains_mime_type(&self, mime_type: &str) -> bool {
        self.mime_types.iter().any(|m| m == mime_type)
    }

    /// MIME types in insertion order
    pub fn mime_types(&self) -> &[String] {
        &self.mime_types
    }

    /// Union of both sets, keeping `self`'s order first
    pub fn union(&self, other: &ContentFormats) -> ContentFormats {
        let mut merged = self.clone();
        for mime in &other.mime_types {
            merged.add_mime_type(mime.as_str());
        }
        merged
    }

    /// Returns true if this set contains every MIME type of `other`
    pub fn is_superset_of(&self, other: &ContentFormats) -> bool {
        other.mime_types.iter().all(|m| self.contains_mime_type(m))
    }

    /// Number of MIME types
    pub fn len(&self) -> usize {
        self.mime_types.len()
    }

    /// Returns true if the set is empty
    pub fn is_empty(&self) -> bool {
        self.mime_types.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ContentFormats {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut formats = ContentFormats::new();
        for mime in iter {
            formats.add_mime_type(mime);
        }
        formats
    }
}

impl std::fmt::Display for ContentFormats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ {} }}", self.mime_types.join(", "))
    }
}

// =============================================================================
// Special targets
// =============================================================================

/// What to do when a remote client asks for a special target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetHandler {
    /// Hand the raw stream to the UTF-8 text writer
    Utf8,
    /// Encode UTF-8 text into a legacy text list
    TextList,
    /// Write the list of targets we can provide
    Targets,
    /// Write the ownership timestamp
    Timestamp,
}

/// How data read in a special target is turned into its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputConversion {
    /// Bytes are already in the MIME type's encoding
    None,
    /// Decode a legacy text list into UTF-8
    TextList,
}

/// Legacy, non-MIME selection targets with built-in handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialTarget {
    /// `UTF8_STRING`
    Utf8String,
    /// `COMPOUND_TEXT`
    CompoundText,
    /// `TEXT`
    Text,
    /// `STRING` (ISO Latin-1)
    String,
    /// `TARGETS` - list of supported targets
    Targets,
    /// `TIMESTAMP` - time the selection was acquired
    Timestamp,
}

impl SpecialTarget {
    /// All special targets in table order
    pub const ALL: [SpecialTarget; 6] = [
        Self::Utf8String,
        Self::CompoundText,
        Self::Text,
        Self::String,
        Self::Targets,
        Self::Timestamp,
    ];

    /// Look up a target name in the table
    pub fn from_target(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.x_target() == name)
    }

    /// Target name as used on the wire
    pub fn x_target(self) -> &'static str {
        match self {
            Self::Utf8String => "UTF8_STRING",
            Self::CompoundText => "COMPOUND_TEXT",
            Self::Text => "TEXT",
            Self::String => "STRING",
            Self::Targets => "TARGETS",
            Self::Timestamp => "TIMESTAMP",
        }
    }

    /// MIME type the target translates to, if any
    pub fn mime_type(self) -> Option<&'static str> {
        match self {
            Self::Utf8String | Self::CompoundText | Self::Text | Self::String => {
                Some(MIME_TEXT_UTF8)
            }
            Self::Targets | Self::Timestamp => None,
        }
    }

    /// Property type advertised when answering a request
    ///
    /// `TEXT` is answered as `STRING`.
    pub fn reply_type(self) -> &'static str {
        match self {
            Self::Utf8String => "UTF8_STRING",
            Self::CompoundText => "COMPOUND_TEXT",
            Self::Text | Self::String => "STRING",
            Self::Targets => "ATOM",
            Self::Timestamp => "INTEGER",
        }
    }

    /// Property format width in bits
    pub fn format(self) -> u8 {
        match self {
            Self::Targets | Self::Timestamp => 32,
            _ => 8,
        }
    }

    /// Behaviour for outgoing requests
    pub fn handler(self) -> Option<TargetHandler> {
        Some(match self {
            Self::Utf8String => TargetHandler::Utf8,
            Self::CompoundText | Self::Text | Self::String => TargetHandler::TextList,
            Self::Targets => TargetHandler::Targets,
            Self::Timestamp => TargetHandler::Timestamp,
        })
    }

    /// Behaviour for incoming data
    pub fn input_conversion(self) -> InputConversion {
        match self {
            Self::CompoundText | Self::Text | Self::String => InputConversion::TextList,
            _ => InputConversion::None,
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Expand MIME types into the targets they may be transferred as
///
/// Each MIME type is preceded by the legacy aliases that map to it, so the
/// list for `text/plain;charset=utf-8` reads
/// `UTF8_STRING, COMPOUND_TEXT, TEXT, STRING, text/plain;charset=utf-8`.
pub fn targets_for_formats(formats: &ContentFormats) -> Vec<Target> {
    let mut targets = Vec::new();

    for mime in formats.mime_types() {
        for special in SpecialTarget::ALL {
            if special.mime_type() == Some(mime.as_str()) {
                targets.push(Target::intern(special.x_target()));
            }
        }
        targets.push(Target::intern(mime));
    }

    targets
}

/// Targets to advertise in a `TARGETS` reply
///
/// Same as [`targets_for_formats`] plus every special target that is always
/// answerable (`TARGETS`, `TIMESTAMP`). Duplicates are not removed.
pub fn advertised_targets(formats: &ContentFormats) -> Vec<Target> {
    let mut targets = targets_for_formats(formats);

    for special in SpecialTarget::ALL {
        if special.mime_type().is_none() && special.handler().is_some() {
            targets.push(Target::intern(special.x_target()));
        }
    }

    targets
}

/// [`advertised_targets`] resolved to atoms on the given display
pub fn atoms_for_formats(display: &dyn X11Display, formats: &ContentFormats) -> Vec<Atom> {
    advertised_targets(formats)
        .iter()
        .map(|t| display.intern_atom(t))
        .collect()
}

/// Translate a list of target names into MIME types
///
/// Names containing `/` are taken as MIME types. Known legacy targets are
/// translated; everything else is dropped without complaint since peers are
/// known to advertise nonstandard targets.
pub fn formats_from_targets<'a>(names: impl IntoIterator<Item = &'a str>) -> ContentFormats {
    let mut formats = ContentFormats::new();

    for name in names {
        if name.contains('/') {
            formats.add_mime_type(name);
            continue;
        }

        match SpecialTarget::from_target(name).and_then(SpecialTarget::mime_type) {
            Some(mime) => formats.add_mime_type(mime),
            None => trace!("Dropping unmapped target {}", name),
        }
    }

    formats
}

/// [`formats_from_targets`] for atoms received from the display
///
/// Atoms the display cannot name are skipped.
pub fn formats_from_atoms(display: &dyn X11Display, atoms: &[Atom]) -> ContentFormats {
    let names: Vec<String> = atoms.iter().filter_map(|a| display.atom_name(*a)).collect();
    formats_from_targets(names.iter().map(String::as_str))
}
