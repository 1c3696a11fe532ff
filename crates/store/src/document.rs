//! Untyped documents, field values, and batch writes.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;

/// Length of generated document ids.
pub const ID_LENGTH: usize = 20;

/// Field name → value.
pub type Fields = BTreeMap<String, Value>;

/// A field value.
///
/// Mirrors the value types of the document database so that round trips are
/// lossless: integers and doubles stay distinct and timestamps are not
/// flattened to strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    Map(Fields),
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value as a float. Integers widen.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Numeric value as an integer. Doubles are accepted only when integral.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Double(d) if d.fract() == 0.0 && d.is_finite() => Some(*d as i64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&Fields> {
        match self {
            Self::Map(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

/// Opaque per-document version stamp.
///
/// Firestore uses the document's `updateTime`; the in-memory store uses a
/// counter. Only equality is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Last path segment of the document name.
    pub id: String,
    pub fields: Fields,
    pub revision: Revision,
}

impl Document {
    /// Field by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Full state of one collection at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Increases by one with every published change.
    pub sequence: u64,
    /// Every document, ordered by id.
    pub documents: Arc<Vec<Document>>,
}

impl Snapshot {
    #[must_use]
    pub fn new(sequence: u64, documents: Vec<Document>) -> Self {
        Self {
            sequence,
            documents: Arc::new(documents),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }
}

/// Condition a document must meet for an update to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The document exists.
    Exists,
    /// The document is still at this revision.
    Revision(Revision),
}

/// One write in an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create a document with a caller-chosen id. Fails if it already exists.
    Create {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Merge `fields` into an existing document.
    Update {
        collection: String,
        id: String,
        fields: Fields,
        precondition: Precondition,
    },
    /// Delete a document. Deleting a missing document is not an error.
    Delete { collection: String, id: String },
}

impl Write {
    /// Collection the write targets.
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::Create { collection, .. }
            | Self::Update { collection, .. }
            | Self::Delete { collection, .. } => collection,
        }
    }
}

/// Generate a document id in the database's auto-id format.
#[must_use]
pub fn new_document_id() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(ID_LENGTH)
        .map(char::from)
        .collect()
}
