//! X protocol identifiers and the target name table.
//!
//! Atoms and windows are opaque server handles handed to us by the display
//! connection. Target names are interned process-wide so that repeated
//! lookups share one allocation; equality always falls back to comparing the
//! string, so interning is only ever an optimization.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

/// X server timestamp in milliseconds (wraps around every ~49 days)
pub type Timestamp = u32;

/// The `CurrentTime` placeholder timestamp
pub const CURRENT_TIME: Timestamp = 0;

/// An X atom identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Atom(pub u32);

impl Atom {
    /// The `None` atom
    pub const NONE: Atom = Atom(0);

    /// Returns true for the `None` atom
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// An X window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Window(pub u32);

impl Window {
    /// The `None` window
    pub const NONE: Window = Window(0);

    /// Returns true for the `None` window
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

fn target_table() -> &'static Mutex<HashSet<Arc<str>>> {
    static TABLE: OnceLock<Mutex<HashSet<Arc<str>>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashSet::new()))
}

/// An interned selection target name (`"UTF8_STRING"`, `"image/png"`, ...)
#[derive(Clone)]
pub struct Target(Arc<str>);

impl Target {
    /// Intern a target name, reusing the existing allocation if present
    pub fn intern(name: &str) -> Self {
        let mut table = target_table().lock();
        if let Some(existing) = table.get(name) {
            return Self(existing.clone());
        }
        let entry: Arc<str> = Arc::from(name);
        table.insert(entry.clone());
        Self(entry)
    }

    /// The target name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the name looks like a MIME type
    pub fn is_mime_type(&self) -> bool {
        self.0.contains('/')
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for Target {}

impl Hash for Target {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialEq<str> for Target {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Target {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Deref for Target {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Self::intern(name)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode atoms as the 32-bit property data of an `ATOM` reply
pub fn encode_atoms(atoms: &[Atom]) -> Vec<u8> {
    atoms.iter().flat_map(|a| a.0.to_ne_bytes()).collect()
}

/// Decode 32-bit property data into atoms, ignoring a trailing partial item
pub fn decode_atoms(data: &[u8]) -> Vec<Atom> {
    data.chunks_exact(4)
        .map(|c| Atom(u32::from_ne_bytes([c[0], c[1], c[2], c[3]])))
        .collect()
}
