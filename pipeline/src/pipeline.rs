//! The derivative-generation handler.
//!
//! Invoked once per finalized raw-image write, at least once, possibly
//! concurrently with a redelivery of the same trigger. Correctness
//! comes from idempotent writes, not ordering: within one invocation
//! the record update happens after both derivative writes, which
//! happen after the raw-object read; across invocations for the same
//! path no ordering is guaranteed.

use crate::classify::{
    AVATAR_DISPLAY_SIZE, AVATAR_QUALITY, AVATAR_THUMB_SIZE, Classified, DEFAULT_PREVIEW_WIDTH,
    UploadKind, classify,
};
use crate::encode::{
    EncodeError, decode, encode_full_jpeg, encode_preview_webp, encode_square_jpeg,
};
use bytes::Bytes;
use inkbook_core::domain::AssetStatus;
use inkbook_core::store::{ObjectStore, Patch, RecordStore, StoreError};
use serde_json::json;
use std::sync::Arc;

/// What a pipeline invocation did with the trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Derivatives were produced and the owning record annotated.
    Processed,
    /// The object was not our concern, or the raw input was already
    /// consumed by an earlier invocation.
    Ignored,
}

/// Errors from a pipeline invocation.
///
/// Everything here is retryable by trigger redelivery: the raw input
/// is only deleted after both derivatives are durably written, and
/// re-encoding the same input produces byte-identical outputs that
/// overwrite harmlessly.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A storage operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The upload could not be decoded or a derivative encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// The stateless derivative-generation handler.
///
/// Holds only injected clients; every invocation is an independent
/// unit of work with no shared mutable state.
pub struct DerivativePipeline {
    objects: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    preview_width: u32,
}

impl DerivativePipeline {
    /// Creates a pipeline over the given stores.
    #[must_use]
    pub fn new(objects: Arc<dyn ObjectStore>, records: Arc<dyn RecordStore>) -> Self {
        Self {
            objects,
            records,
            preview_width: DEFAULT_PREVIEW_WIDTH,
        }
    }

    /// Overrides the preview width (default 512).
    #[must_use]
    pub const fn with_preview_width(mut self, width: u32) -> Self {
        self.preview_width = width;
        self
    }

    /// Handles one storage-write trigger.
    ///
    /// Unrecognized paths and non-image content types are ignored, as
    /// is a raw object that no longer exists (a duplicate trigger
    /// after an earlier invocation already consumed it).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] on storage or codec failure; the
    /// trigger can safely be redelivered in either case.
    pub async fn handle(
        &self,
        path: &str,
        content_type: &str,
    ) -> Result<Outcome, PipelineError> {
        let Some(classified) = classify(path, content_type) else {
            tracing::debug!(path, content_type, "object is not a recognized upload, ignoring");
            metrics::counter!("pipeline_ignored_total").increment(1);
            return Ok(Outcome::Ignored);
        };

        let raw = match self.objects.get(path).await {
            Ok(bytes) => bytes,
            Err(StoreError::ObjectNotFound { .. }) => {
                tracing::info!(
                    path,
                    category = classified.kind.label(),
                    "raw object already consumed, duplicate trigger is a no-op"
                );
                return Ok(Outcome::Ignored);
            },
            Err(err) => return Err(err.into()),
        };

        let image = decode(&raw, content_type)?;

        match &classified.kind {
            UploadKind::Avatar { .. } => self.process_avatar(path, &classified, &image).await?,
            _ => self.process_standard(path, &classified, &image).await?,
        }

        metrics::counter!("pipeline_derivatives_total", "category" => classified.kind.label())
            .increment(1);
        Ok(Outcome::Processed)
    }

    /// Portfolio, flash and reference uploads: full JPEG + preview WebP
    /// at upload-unique destination paths.
    async fn process_standard(
        &self,
        raw_path: &str,
        classified: &Classified,
        image: &image::DynamicImage,
    ) -> Result<(), PipelineError> {
        let full = encode_full_jpeg(image, classified.jpeg_quality())?;
        let thumb = encode_preview_webp(image, self.preview_width)?;

        let full_path = classified.destination_full();
        let thumb_path = classified.destination_thumb();

        // The two uploads are independent; the record write below must
        // not happen until both have succeeded.
        tokio::try_join!(
            self.objects.put(&full_path, Bytes::from(full), "image/jpeg"),
            self.objects.put(&thumb_path, Bytes::from(thumb), "image/webp"),
        )?;

        self.delete_raw_best_effort(raw_path).await;

        let mut patch = Patch::new()
            .set("full_url", json!(full_path))
            .set("thumb_url", json!(thumb_path));
        if classified.flips_status() {
            patch = patch.set("status", json!(AssetStatus::Ready.as_str()));
        }
        self.records.merge(&classified.owner_doc(), patch).await?;

        if let Some(profile) = classified.profile_append() {
            self.records
                .merge(&profile, Patch::new().append("portfolio_urls", json!(full_path)))
                .await?;
        }

        tracing::info!(
            category = classified.kind.label(),
            full = %full_path,
            thumb = %thumb_path,
            "derivatives written and record annotated"
        );
        Ok(())
    }

    /// Avatars: two fixed square sizes at owner-scoped fixed filenames.
    /// Prior derivatives at those exact paths are deleted first so a
    /// cached address can never serve stale bytes.
    async fn process_avatar(
        &self,
        raw_path: &str,
        classified: &Classified,
        image: &image::DynamicImage,
    ) -> Result<(), PipelineError> {
        let display = encode_square_jpeg(image, AVATAR_DISPLAY_SIZE, AVATAR_QUALITY)?;
        let thumb = encode_square_jpeg(image, AVATAR_THUMB_SIZE, AVATAR_QUALITY)?;

        let display_path = classified.destination_full();
        let thumb_path = classified.destination_thumb();

        self.objects.delete(&display_path).await?;
        self.objects.delete(&thumb_path).await?;

        tokio::try_join!(
            self.objects
                .put(&display_path, Bytes::from(display), "image/jpeg"),
            self.objects.put(&thumb_path, Bytes::from(thumb), "image/jpeg"),
        )?;

        self.delete_raw_best_effort(raw_path).await;

        self.records
            .merge(
                &classified.owner_doc(),
                Patch::new()
                    .set("avatar_url", json!(display_path))
                    .set("avatar_thumb_url", json!(thumb_path)),
            )
            .await?;

        tracing::info!(display = %display_path, thumb = %thumb_path, "avatar derivatives replaced");
        Ok(())
    }

    /// Raw-input cleanup is best-effort: an orphaned raw object is
    /// acceptable garbage, not a correctness violation.
    async fn delete_raw_best_effort(&self, raw_path: &str) {
        if let Err(err) = self.objects.delete(raw_path).await {
            tracing::warn!(path = raw_path, error = %err, "failed to delete raw upload");
        }
    }
}
