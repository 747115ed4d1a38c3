//! Image decoding and derivative encoding.
//!
//! Every derivative starts from a decode into 8-bit RGB. Most uploads
//! carry a format the decoder can sniff from the bytes; known exotic
//! camera-adjacent containers (TIFF) are decoded through an explicit
//! format-normalizing step instead, since their headers are routinely
//! mis-sniffed. Full-resolution outputs are JPEG at a per-category
//! quality; previews are lossless WebP scaled to a fixed width;
//! avatars are center-cropped squares.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Errors from decoding or encoding an upload.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The raw bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// A derivative could not be encoded.
    #[error("failed to encode derivative: {0}")]
    Encode(#[source] image::ImageError),
}

/// Formats that need the explicit normalize-before-re-encode path.
fn is_exotic(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Tiff)
}

/// Decodes raw upload bytes into a normalized 8-bit RGB image.
///
/// The declared content type picks the decode path: known exotic
/// formats decode with an explicit format, everything else is sniffed
/// from the bytes.
///
/// # Errors
///
/// Returns [`EncodeError::Decode`] when the bytes are not a decodable
/// image.
pub fn decode(bytes: &[u8], content_type: &str) -> Result<DynamicImage, EncodeError> {
    let declared = ImageFormat::from_mime_type(content_type);
    let decoded = match declared {
        Some(format) if is_exotic(format) => ImageReader::with_format(Cursor::new(bytes), format)
            .decode()
            .map_err(EncodeError::Decode)?,
        _ => image::load_from_memory(bytes).map_err(EncodeError::Decode)?,
    };
    Ok(DynamicImage::ImageRgb8(decoded.to_rgb8()))
}

/// Encodes a full-resolution JPEG at the given quality.
///
/// # Errors
///
/// Returns [`EncodeError::Encode`] when the encoder fails.
pub fn encode_full_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
        .map_err(EncodeError::Encode)?;
    Ok(out.into_inner())
}

/// Encodes a lossless WebP preview scaled down to `width` pixels wide,
/// preserving aspect ratio. Images already narrower than `width` are
/// encoded as-is.
///
/// # Errors
///
/// Returns [`EncodeError::Encode`] when the encoder fails.
pub fn encode_preview_webp(image: &DynamicImage, width: u32) -> Result<Vec<u8>, EncodeError> {
    let scaled;
    let source = if image.width() > width {
        scaled = image.resize(width, u32::MAX, FilterType::Lanczos3);
        &scaled
    } else {
        image
    };

    let mut out = Cursor::new(Vec::new());
    source
        .write_with_encoder(WebPEncoder::new_lossless(&mut out))
        .map_err(EncodeError::Encode)?;
    Ok(out.into_inner())
}

/// Encodes a `size`×`size` JPEG square, center-cropping to fill.
///
/// # Errors
///
/// Returns [`EncodeError::Encode`] when the encoder fails.
pub fn encode_square_jpeg(
    image: &DynamicImage,
    size: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    let square = image.resize_to_fill(size, size, FilterType::Lanczos3);
    let mut out = Cursor::new(Vec::new());
    square
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
        .map_err(EncodeError::Encode)?;
    Ok(out.into_inner())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        }));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn tiff_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
            image::Rgb([200, 30, 30])
        }));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Tiff).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_sniffable_formats() {
        let img = decode(&png_bytes(20, 10), "image/png").unwrap();
        assert_eq!((img.width(), img.height()), (20, 10));
    }

    #[test]
    fn decodes_exotic_tiff_through_explicit_format() {
        let img = decode(&tiff_bytes(16, 16), "image/tiff").unwrap();
        assert_eq!((img.width(), img.height()), (16, 16));
    }

    #[test]
    fn rejects_undecodable_bytes() {
        let err = decode(b"definitely not an image", "image/jpeg").unwrap_err();
        assert!(matches!(err, EncodeError::Decode(_)));
    }

    #[test]
    fn full_jpeg_keeps_dimensions() {
        let img = decode(&png_bytes(33, 21), "image/png").unwrap();
        let jpeg = encode_full_jpeg(&img, 85).unwrap();
        let round = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((round.width(), round.height()), (33, 21));
    }

    #[test]
    fn preview_scales_to_fixed_width() {
        let img = decode(&png_bytes(800, 400), "image/png").unwrap();
        let webp = encode_preview_webp(&img, 200).unwrap();
        let round = image::load_from_memory(&webp).unwrap();
        assert_eq!((round.width(), round.height()), (200, 100));
    }

    #[test]
    fn preview_does_not_upscale_small_images() {
        let img = decode(&png_bytes(100, 60), "image/png").unwrap();
        let webp = encode_preview_webp(&img, 512).unwrap();
        let round = image::load_from_memory(&webp).unwrap();
        assert_eq!((round.width(), round.height()), (100, 60));
    }

    #[test]
    fn square_crops_to_exact_size() {
        let img = decode(&png_bytes(300, 200), "image/png").unwrap();
        let jpeg = encode_square_jpeg(&img, 128, 82).unwrap();
        let round = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((round.width(), round.height()), (128, 128));
    }
}
