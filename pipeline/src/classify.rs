//! Storage-path classification for raw uploads.
//!
//! The object's path is the sole coordinate system the trigger gives
//! us, so classification is an explicit, exhaustive function from path
//! shapes to a closed enum. Anything that does not match a recognized
//! shape is not an error; it is simply not our concern, and the
//! pipeline ignores it. The derivative outputs the pipeline itself
//! writes never contain an `originals` segment (and avatars drop the
//! `-original` suffix), so a redelivered trigger for an output path
//! falls through to the ignore arm rather than recursing.

use inkbook_core::id::{BookingRequestId, FlashItemId, PortfolioItemId, UserId};
use inkbook_core::store::{Collection, DocRef};

/// JPEG quality for portfolio and flash derivatives.
pub const GALLERY_FULL_QUALITY: u8 = 85;

/// JPEG quality for booking-request reference derivatives. These are
/// ephemeral, so storage cost wins over fidelity.
pub const REFERENCE_FULL_QUALITY: u8 = 72;

/// JPEG quality for avatar derivatives.
pub const AVATAR_QUALITY: u8 = 82;

/// Edge length of the display-size avatar square.
pub const AVATAR_DISPLAY_SIZE: u32 = 512;

/// Edge length of the thumbnail avatar square.
pub const AVATAR_THUMB_SIZE: u32 = 128;

/// Default width of the scaled preview derivative.
pub const DEFAULT_PREVIEW_WIDTH: u32 = 512;

/// The closed set of recognized upload categories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadKind {
    /// A portfolio original: `artists/{artist}/portfolio/originals/{item}/{base}.{ext}`.
    Portfolio {
        /// Owning artist.
        artist: UserId,
        /// Owning portfolio item.
        item: PortfolioItemId,
    },
    /// A flash original: `artists/{artist}/flash/originals/{item}/{base}.{ext}`.
    Flash {
        /// Owning artist.
        artist: UserId,
        /// Owning flash item.
        item: FlashItemId,
    },
    /// A booking-request reference original:
    /// `booking-requests/{request}/originals/{base}.{ext}`.
    Reference {
        /// Owning booking request.
        request: BookingRequestId,
    },
    /// An avatar original: `users/{user}/avatar-original.{ext}`.
    Avatar {
        /// Owning user.
        user: UserId,
    },
}

impl UploadKind {
    /// Short label for logging and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Portfolio { .. } => "portfolio",
            Self::Flash { .. } => "flash",
            Self::Reference { .. } => "reference",
            Self::Avatar { .. } => "avatar",
        }
    }
}

/// A recognized raw upload with everything the pipeline needs to
/// process it: destination paths, encode quality, and the owning
/// record. All of it derives deterministically from the path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classified {
    /// Which category the upload belongs to.
    pub kind: UploadKind,
    /// Upload-unique base name (fixed `avatar` for avatars).
    pub base: String,
}

impl Classified {
    /// Destination path of the full-resolution derivative (the
    /// display-size square for avatars).
    #[must_use]
    pub fn destination_full(&self) -> String {
        match &self.kind {
            UploadKind::Portfolio { artist, item } => {
                format!("artists/{artist}/portfolio/{item}/{}.jpg", self.base)
            },
            UploadKind::Flash { artist, item } => {
                format!("artists/{artist}/flash/{item}/{}.jpg", self.base)
            },
            UploadKind::Reference { request } => {
                format!("booking-requests/{request}/{}.jpg", self.base)
            },
            UploadKind::Avatar { user } => format!("users/{user}/avatar.jpg"),
        }
    }

    /// Destination path of the preview derivative (the thumbnail
    /// square for avatars).
    #[must_use]
    pub fn destination_thumb(&self) -> String {
        match &self.kind {
            UploadKind::Portfolio { artist, item } => {
                format!("artists/{artist}/portfolio/{item}/{}-thumb.webp", self.base)
            },
            UploadKind::Flash { artist, item } => {
                format!("artists/{artist}/flash/{item}/{}-thumb.webp", self.base)
            },
            UploadKind::Reference { request } => {
                format!("booking-requests/{request}/{}-thumb.webp", self.base)
            },
            UploadKind::Avatar { user } => format!("users/{user}/avatar-thumb.jpg"),
        }
    }

    /// The record the derivative addresses are attached to.
    #[must_use]
    pub fn owner_doc(&self) -> DocRef {
        match &self.kind {
            UploadKind::Portfolio { item, .. } => DocRef::new(Collection::PortfolioItems, item),
            UploadKind::Flash { item, .. } => DocRef::new(Collection::FlashItems, item),
            UploadKind::Reference { request } => DocRef::new(Collection::BookingRequests, request),
            UploadKind::Avatar { user } => DocRef::new(Collection::Profiles, user),
        }
    }

    /// JPEG quality of the full-resolution derivative.
    #[must_use]
    pub const fn jpeg_quality(&self) -> u8 {
        match &self.kind {
            UploadKind::Portfolio { .. } | UploadKind::Flash { .. } => GALLERY_FULL_QUALITY,
            UploadKind::Reference { .. } => REFERENCE_FULL_QUALITY,
            UploadKind::Avatar { .. } => AVATAR_QUALITY,
        }
    }

    /// Whether the owning record carries a `processing`/`ready` status
    /// the pipeline flips on completion.
    #[must_use]
    pub const fn flips_status(&self) -> bool {
        matches!(
            &self.kind,
            UploadKind::Portfolio { .. } | UploadKind::Flash { .. }
        )
    }

    /// Profile record to append the published full URL onto, for the
    /// categories that denormalize onto the owner's profile.
    #[must_use]
    pub fn profile_append(&self) -> Option<DocRef> {
        match &self.kind {
            UploadKind::Portfolio { artist, .. } => {
                Some(DocRef::new(Collection::Profiles, artist))
            },
            _ => None,
        }
    }
}

/// Classifies a finalized object into a recognized upload, or `None`
/// when the object is not the pipeline's concern.
///
/// Non-image content types are ignored regardless of path.
#[must_use]
pub fn classify(path: &str, content_type: &str) -> Option<Classified> {
    if !content_type.starts_with("image/") {
        return None;
    }

    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        ["artists", artist, "portfolio", "originals", item, file] => Some(Classified {
            kind: UploadKind::Portfolio {
                artist: artist.parse().ok()?,
                item: item.parse().ok()?,
            },
            base: file_base(file)?,
        }),
        ["artists", artist, "flash", "originals", item, file] => Some(Classified {
            kind: UploadKind::Flash {
                artist: artist.parse().ok()?,
                item: item.parse().ok()?,
            },
            base: file_base(file)?,
        }),
        ["booking-requests", request, "originals", file] => Some(Classified {
            kind: UploadKind::Reference {
                request: request.parse().ok()?,
            },
            base: file_base(file)?,
        }),
        ["users", user, file] if file.starts_with("avatar-original.") => Some(Classified {
            kind: UploadKind::Avatar {
                user: user.parse().ok()?,
            },
            base: "avatar".to_string(),
        }),
        _ => None,
    }
}

/// File name without its extension; `None` for an empty stem.
fn file_base(file: &str) -> Option<String> {
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
