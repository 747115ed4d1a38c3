//! # Inkbook Pipeline
//!
//! The asynchronous derivative-generation pipeline and the consistency
//! poller that lets callers tolerate its latency.
//!
//! A raw image upload lands in blob storage; a storage-write trigger
//! then invokes [`pipeline::DerivativePipeline::handle`] with the
//! finalized object's path and declared content type, decoupled in time
//! from the upload request. The pipeline classifies the path, re-encodes
//! the image into a full-resolution derivative plus a scaled preview,
//! persists both, deletes the raw input, and annotates the owning
//! record with the derivative addresses.
//!
//! Because all of that happens after the upload call has returned,
//! "derivative not yet produced" is a normal, transient condition.
//! [`poller::await_ready`] resolves it with bounded retry, returning an
//! explicit [`poller::Resolution::Pending`] instead of an error when
//! the bound is exhausted.
//!
//! ## Idempotency
//!
//! The trigger fires at least once per finalized object and may
//! redeliver. Every write the pipeline performs is idempotent:
//! re-encoding is deterministic, derivative uploads overwrite
//! harmlessly, the raw-input delete succeeds when the object is already
//! gone, and the record update is a field-level merge. Running the
//! pipeline on an already-deleted raw object is a silent no-op.

pub mod classify;
pub mod encode;
pub mod pipeline;
pub mod poller;

pub use classify::{Classified, UploadKind, classify};
pub use encode::EncodeError;
pub use pipeline::{DerivativePipeline, Outcome, PipelineError};
pub use poller::{PollPolicy, Resolution, await_derived_urls, await_ready};
