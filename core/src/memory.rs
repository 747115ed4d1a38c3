//! In-memory store backends.
//!
//! Used by the development server and the test suites. Both stores
//! serialize all access through a single mutex, which makes `commit`
//! batches genuinely all-or-nothing and conditional writes genuinely
//! first-writer-wins, the same guarantees the production backends
//! provide.

use crate::store::{
    BatchOp, BatchWrite, DocRef, ObjectStore, Patch, Precondition, RecordStore, StoreError,
    WriteOutcome,
};
use bytes::Bytes;
use futures::future::{self, BoxFuture};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Clone, Debug)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

/// In-memory blob storage.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl InMemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when an object exists at `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.lock().contains_key(path)
    }

    /// Snapshot of the bytes at `path`, for assertions.
    #[must_use]
    pub fn object(&self, path: &str) -> Option<Bytes> {
        self.lock().get(path).map(|o| o.data.clone())
    }

    /// Declared content type of the object at `path`.
    #[must_use]
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.lock().get(path).map(|o| o.content_type.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredObject>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Bytes, StoreError>> {
        let result = self.lock().get(path).map(|o| o.data.clone()).ok_or_else(|| {
            StoreError::ObjectNotFound {
                path: path.to_string(),
            }
        });
        Box::pin(future::ready(result))
    }

    fn put<'a>(
        &'a self,
        path: &'a str,
        data: Bytes,
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        self.lock().insert(
            path.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Box::pin(future::ready(Ok(())))
    }

    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        self.lock().remove(path);
        Box::pin(future::ready(Ok(())))
    }
}

/// In-memory schemaless document store.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    docs: Mutex<HashMap<DocRef, Map<String, Value>>>,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents, for assertions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no documents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<DocRef, Map<String, Value>>> {
        self.docs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn as_object(value: Value, doc: &DocRef) -> Result<Map<String, Value>, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!(
            "document body for {doc} must be an object, got {other}"
        ))),
    }
}

/// Evaluates a precondition against the current state of a document.
/// Returns `None` when the write may proceed.
fn check_precondition(
    docs: &HashMap<DocRef, Map<String, Value>>,
    doc: &DocRef,
    precondition: &Precondition,
) -> Option<WriteOutcome> {
    match precondition {
        Precondition::None => None,
        Precondition::FieldEquals { field, expected } => match docs.get(doc) {
            None => Some(WriteOutcome::NotFound),
            Some(body) => {
                let actual = body.get(field);
                if actual == Some(expected) {
                    None
                } else {
                    Some(WriteOutcome::PreconditionFailed {
                        actual: actual.cloned(),
                    })
                }
            },
        },
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get<'a>(&'a self, doc: &'a DocRef) -> BoxFuture<'a, Result<Option<Value>, StoreError>> {
        let result = Ok(self.lock().get(doc).cloned().map(Value::Object));
        Box::pin(future::ready(result))
    }

    fn create<'a>(
        &'a self,
        doc: &'a DocRef,
        value: Value,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        let result = (|| {
            let body = as_object(value, doc)?;
            let mut docs = self.lock();
            if docs.contains_key(doc) {
                return Err(StoreError::AlreadyExists {
                    doc: doc.to_string(),
                });
            }
            docs.insert(doc.clone(), body);
            Ok(())
        })();
        Box::pin(future::ready(result))
    }

    fn merge<'a>(
        &'a self,
        doc: &'a DocRef,
        patch: Patch,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        let mut docs = self.lock();
        patch.apply_to(docs.entry(doc.clone()).or_default());
        Box::pin(future::ready(Ok(())))
    }

    fn merge_if<'a>(
        &'a self,
        doc: &'a DocRef,
        precondition: Precondition,
        patch: Patch,
    ) -> BoxFuture<'a, Result<WriteOutcome, StoreError>> {
        let mut docs = self.lock();
        let outcome = match check_precondition(&docs, doc, &precondition) {
            Some(failure) => failure,
            None => {
                patch.apply_to(docs.entry(doc.clone()).or_default());
                WriteOutcome::Applied
            },
        };
        Box::pin(future::ready(Ok(outcome)))
    }

    fn commit<'a>(
        &'a self,
        batch: Vec<BatchWrite>,
    ) -> BoxFuture<'a, Result<WriteOutcome, StoreError>> {
        let result = (|| {
            let mut docs = self.lock();

            // Validate the whole batch before touching anything.
            for write in &batch {
                if let Some(failure) = check_precondition(&docs, &write.doc, &write.precondition)
                {
                    return Ok(failure);
                }
                if let BatchOp::Create(_) = &write.op {
                    if docs.contains_key(&write.doc) {
                        return Err(StoreError::AlreadyExists {
                            doc: write.doc.to_string(),
                        });
                    }
                }
            }

            for write in batch {
                match write.op {
                    BatchOp::Create(value) => {
                        let body = as_object(value, &write.doc)?;
                        docs.insert(write.doc, body);
                    },
                    BatchOp::Merge(patch) => {
                        patch.apply_to(docs.entry(write.doc).or_default());
                    },
                }
            }
            Ok(WriteOutcome::Applied)
        })();
        Box::pin(future::ready(result))
    }
}
