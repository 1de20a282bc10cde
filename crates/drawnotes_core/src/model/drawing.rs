//! Drawing record and drawing store model.
//!
//! # Responsibility
//! - Hold the ordered sequence of opaque drawing blobs.
//! - Round-trip the whole store through a versioned JSON envelope.
//!
//! # Invariants
//! - Serialization preserves record order and exact byte content.
//! - Decoding is all-or-nothing; a partially decoded store is never returned.
//! - Envelope `format_version` must equal `STORE_FORMAT_VERSION`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::error::Category;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Version written into every serialized store envelope.
pub const STORE_FORMAT_VERSION: u32 = 1;

/// One user drawing as produced by the drawing editor.
///
/// The buffer is immutable and shared, so cloning a record (and therefore
/// snapshotting a whole store for a background save) never copies bytes.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct DrawingRecord(Arc<[u8]>);

impl DrawingRecord {
    /// Returns the blank drawing (zero bytes).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the blank drawing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for DrawingRecord {
    // Contents are opaque user data; only the size is useful in diagnostics.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DrawingRecord({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for DrawingRecord {
    fn from(value: Vec<u8>) -> Self {
        Self(value.into())
    }
}

impl From<&[u8]> for DrawingRecord {
    fn from(value: &[u8]) -> Self {
        Self(value.into())
    }
}

impl AsRef<[u8]> for DrawingRecord {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for DrawingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for DrawingRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<u8>::deserialize(deserializer).map(Self::from)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure to decode persisted store bytes.
#[derive(Debug)]
pub enum StoreError {
    /// Bytes are not structurally valid JSON.
    Format(serde_json::Error),
    /// Bytes are valid JSON but not a readable store.
    Decode(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format(err) => write!(f, "malformed drawing store data: {err}"),
            Self::Decode(message) => write!(f, "unreadable drawing store data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format(err) => Some(err),
            Self::Decode(_) => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        match value.classify() {
            Category::Data => Self::Decode(value.to_string()),
            Category::Syntax | Category::Eof | Category::Io => Self::Format(value),
        }
    }
}

/// Ordered collection of every drawing in the app.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DrawingStore {
    pub drawings: Vec<DrawingRecord>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    drawings: &'a [DrawingRecord],
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    drawings: Vec<DrawingRecord>,
}

impl DrawingStore {
    /// Names of the bundled drawings used to seed a first-run store.
    pub const DEFAULT_DRAWING_NAMES: &'static [&'static str] = &["Notes"];

    /// Logical canvas width the editor lays drawings out against.
    pub const CANVAS_WIDTH: f64 = 768.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drawings(drawings: Vec<DrawingRecord>) -> Self {
        Self { drawings }
    }

    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }

    /// Encodes the whole store.
    ///
    /// # Errors
    /// - Returns `StoreError` only if the encoder itself fails.
    pub fn serialize(&self) -> StoreResult<Vec<u8>> {
        Self::serialize_records(&self.drawings)
    }

    /// Encodes a record sequence in the store envelope.
    ///
    /// Used directly by save snapshots, which carry records without a store.
    pub fn serialize_records(drawings: &[DrawingRecord]) -> StoreResult<Vec<u8>> {
        let envelope = EnvelopeRef {
            format_version: STORE_FORMAT_VERSION,
            drawings,
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    /// Decodes a store previously produced by `serialize`.
    ///
    /// # Errors
    /// - `StoreError::Format` when bytes are not valid JSON.
    /// - `StoreError::Decode` when the JSON shape is wrong or the envelope
    ///   version is unsupported.
    pub fn deserialize(bytes: &[u8]) -> StoreResult<Self> {
        let probe: VersionProbe = serde_json::from_slice(bytes)?;
        if probe.format_version != STORE_FORMAT_VERSION {
            return Err(StoreError::Decode(format!(
                "unsupported format_version {} (expected {STORE_FORMAT_VERSION})",
                probe.format_version
            )));
        }

        let envelope: Envelope = serde_json::from_slice(bytes)?;
        Ok(Self {
            drawings: envelope.drawings,
        })
    }
}
