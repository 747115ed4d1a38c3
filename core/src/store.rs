//! Storage traits: blob storage and the schemaless document store.
//!
//! Both stores are external collaborators; the core only depends on
//! these traits and injects concrete clients. The traits use explicit
//! boxed-future returns instead of `async fn` so they stay
//! dyn-compatible (`Arc<dyn ObjectStore>` is passed around freely).
//!
//! Two semantics matter for correctness and are part of the contract,
//! not the implementation:
//!
//! - **Merge writes are field-level.** Unspecified fields are left
//!   untouched, so the pipeline (derivative fields) and user edits
//!   (caption/tags) can write the same document concurrently without
//!   clobbering each other.
//! - **Precondition failure is a normal result.** `merge_if` and
//!   `commit` return [`WriteOutcome::PreconditionFailed`] rather than
//!   an error; a lost first-writer-wins race is expected steady state.

use bytes::Bytes;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// The fixed set of document collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Published portfolio pieces.
    PortfolioItems,
    /// Pre-drawn flash designs.
    FlashItems,
    /// Client booking requests.
    BookingRequests,
    /// Artist offers.
    Offers,
    /// Accepted-offer bookings.
    Bookings,
    /// User profiles (avatar + denormalized portfolio URLs).
    Profiles,
}

impl Collection {
    /// Collection name as stored.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PortfolioItems => "portfolio_items",
            Self::FlashItems => "flash_items",
            Self::BookingRequests => "booking_requests",
            Self::Offers => "offers",
            Self::Bookings => "bookings",
            Self::Profiles => "profiles",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to one document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocRef {
    /// Which collection the document lives in.
    pub collection: Collection,
    /// Opaque document ID within the collection.
    pub id: String,
}

impl DocRef {
    /// Creates a reference to `collection/id`.
    pub fn new(collection: Collection, id: impl fmt::Display) -> Self {
        Self {
            collection,
            id: id.to_string(),
        }
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// One field-level operation inside a [`Patch`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldOp {
    /// Set the field, creating or overwriting it.
    Set(Value),
    /// Union values into an array field. Values already present are
    /// skipped, so re-applying the same append is idempotent; a
    /// non-array field is replaced by the appended values.
    Append(Vec<Value>),
}

/// A partial, field-level update.
///
/// Built with the fluent `set`/`append` methods and applied by the
/// store; fields not named here are untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    ops: BTreeMap<String, FieldOp>,
}

impl Patch {
    /// Creates an empty patch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ops: BTreeMap::new(),
        }
    }

    /// Sets a field.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.ops.insert(field.into(), FieldOp::Set(value));
        self
    }

    /// Unions a value into an array field.
    #[must_use]
    pub fn append(mut self, field: impl Into<String>, value: Value) -> Self {
        self.ops.insert(field.into(), FieldOp::Append(vec![value]));
        self
    }

    /// True when the patch names no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Applies the patch to a document body in place.
    pub fn apply_to(&self, target: &mut Map<String, Value>) {
        for (field, op) in &self.ops {
            match op {
                FieldOp::Set(value) => {
                    target.insert(field.clone(), value.clone());
                },
                FieldOp::Append(values) => {
                    let entry = target
                        .entry(field.clone())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if !entry.is_array() {
                        *entry = Value::Array(Vec::new());
                    }
                    if let Some(array) = entry.as_array_mut() {
                        for value in values {
                            if !array.contains(value) {
                                array.push(value.clone());
                            }
                        }
                    }
                },
            }
        }
    }
}

/// Guard evaluated against the current document before a write.
#[derive(Clone, Debug, PartialEq)]
pub enum Precondition {
    /// No guard; the write always applies.
    None,
    /// The named field must currently equal `expected`.
    FieldEquals {
        /// Field to inspect.
        field: String,
        /// Required current value.
        expected: Value,
    },
}

impl Precondition {
    /// Guard on a field's current value.
    pub fn field_equals(field: impl Into<String>, expected: Value) -> Self {
        Self::FieldEquals {
            field: field.into(),
            expected,
        }
    }
}

/// Result of a guarded write. Losing a race is a normal outcome, never
/// an `Err`.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOutcome {
    /// All writes applied.
    Applied,
    /// A precondition did not hold; nothing was written.
    PreconditionFailed {
        /// The guarded field's actual value, if the document existed.
        actual: Option<Value>,
    },
    /// A guarded document does not exist; nothing was written.
    NotFound,
}

impl WriteOutcome {
    /// True when the write took effect.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// One write inside an atomic batch.
#[derive(Clone, Debug)]
pub struct BatchWrite {
    /// Target document.
    pub doc: DocRef,
    /// Guard for this write.
    pub precondition: Precondition,
    /// The write itself.
    pub op: BatchOp,
}

/// The write operation of a [`BatchWrite`].
#[derive(Clone, Debug)]
pub enum BatchOp {
    /// Create the document; fails the batch if it already exists.
    Create(Value),
    /// Merge a patch into the document, creating it if absent.
    Merge(Patch),
}

/// Errors from either store.
///
/// Precondition failures are deliberately absent: they are outcomes,
/// not errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The object does not exist.
    #[error("object not found: {path}")]
    ObjectNotFound {
        /// Requested object path.
        path: String,
    },

    /// A created document already exists.
    #[error("document already exists: {doc}")]
    AlreadyExists {
        /// The conflicting document.
        doc: String,
    },

    /// A stored document could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend failed (network, I/O, quota).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Content-addressable-by-path blob storage.
pub trait ObjectStore: Send + Sync {
    /// Reads an entire object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ObjectNotFound`] if the object does not
    /// exist, or [`StoreError::Backend`] on infrastructure failure.
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Bytes, StoreError>>;

    /// Writes an object, overwriting any previous bytes at the path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn put<'a>(
        &'a self,
        path: &'a str,
        data: Bytes,
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Deletes an object. Deleting a missing object succeeds, so the
    /// pipeline's raw-input cleanup can be re-run safely.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<(), StoreError>>;
}

/// Schemaless per-entity document store keyed by opaque IDs.
pub trait RecordStore: Send + Sync {
    /// Loads a document body, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn get<'a>(&'a self, doc: &'a DocRef) -> BoxFuture<'a, Result<Option<Value>, StoreError>>;

    /// Creates a document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if the document exists,
    /// or [`StoreError::Backend`] on infrastructure failure.
    fn create<'a>(
        &'a self,
        doc: &'a DocRef,
        value: Value,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Merges a field-level patch into a document, creating it if
    /// absent. Unspecified fields are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn merge<'a>(&'a self, doc: &'a DocRef, patch: Patch)
    -> BoxFuture<'a, Result<(), StoreError>>;

    /// Merges a patch only if the precondition holds against the
    /// current document. The guard and the write are applied
    /// atomically with respect to other writers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure; a
    /// failed precondition is reported through the outcome, not `Err`.
    fn merge_if<'a>(
        &'a self,
        doc: &'a DocRef,
        precondition: Precondition,
        patch: Patch,
    ) -> BoxFuture<'a, Result<WriteOutcome, StoreError>>;

    /// Applies a batch of writes atomically: every precondition is
    /// checked first, then either all writes apply or none do.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if a `Create` collides,
    /// or [`StoreError::Backend`] on infrastructure failure; failed
    /// preconditions are reported through the outcome.
    fn commit<'a>(
        &'a self,
        batch: Vec<BatchWrite>,
    ) -> BoxFuture<'a, Result<WriteOutcome, StoreError>>;
}

/// Loads and deserializes a document into a typed value.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if the stored body does not
/// match `T`, or any error from the underlying load.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn RecordStore,
    doc: &DocRef,
) -> Result<Option<T>, StoreError> {
    match store.get(doc).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}
