//! # Inkbook Testing
//!
//! Testing utilities shared across the workspace:
//!
//! - [`FixedClock`] for deterministic timestamps
//! - In-memory image fixtures for pipeline tests
//! - Re-exports of the in-memory store backends from `inkbook-core`

use chrono::{DateTime, Utc};
use inkbook_core::environment::Clock;

// The in-memory backends live beside the store traits so the dev
// server can use them too; tests reach them from here.
pub use inkbook_core::memory::{InMemoryObjectStore, InMemoryRecordStore};

/// Fixed clock for deterministic tests.
///
/// Always returns the same time, making audit timestamps and snapshot
/// `created_at` fields reproducible.
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given time.
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// Create a default fixed clock for tests (2026-01-01 00:00:00 UTC).
///
/// # Panics
///
/// Panics if the hardcoded timestamp fails to parse, which should
/// never happen in practice.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_clock() -> FixedClock {
    FixedClock::new(
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc),
    )
}

/// In-memory image fixtures for exercising the derivative pipeline.
pub mod fixtures {
    use bytes::Bytes;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode(img: &DynamicImage, format: ImageFormat) -> Bytes {
        let mut out = Cursor::new(Vec::new());
        // Encoding a freshly built RGB8 image into these formats
        // cannot fail; an empty fixture would fail the test loudly
        // anyway.
        let _ = img.write_to(&mut out, format);
        Bytes::from(out.into_inner())
    }

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 96])
        }))
    }

    /// A PNG with a deterministic gradient fill.
    #[must_use]
    pub fn png_image(width: u32, height: u32) -> Bytes {
        encode(&gradient(width, height), ImageFormat::Png)
    }

    /// A JPEG filled with one solid color, so re-uploads with a
    /// different color observably change the derivative bytes.
    #[must_use]
    pub fn jpeg_image_solid(width: u32, height: u32, rgb: [u8; 3]) -> Bytes {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)));
        encode(&img, ImageFormat::Jpeg)
    }

    /// A TIFF, for the exotic-format normalize path.
    #[must_use]
    pub fn tiff_image(width: u32, height: u32) -> Bytes {
        encode(&gradient(width, height), ImageFormat::Tiff)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use inkbook_core::environment::Clock;

    #[test]
    fn fixed_clock_is_fixed() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn fixtures_decode_with_expected_dimensions() {
        let png = fixtures::png_image(12, 8);
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 8));

        let tiff = fixtures::tiff_image(6, 6);
        let decoded = image::ImageReader::with_format(
            std::io::Cursor::new(tiff.as_ref()),
            image::ImageFormat::Tiff,
        )
        .decode()
        .unwrap();
        assert_eq!((decoded.width(), decoded.height()), (6, 6));
    }
}
