//! Normalization of validated uploads to the display width.

use ba_core::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::validate::ValidatedUpload;

/// Bytes ready to be written, with the final dimensions and extension.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub width: u32,
    pub height: u32,
    /// False when the original bytes are stored untouched.
    pub resized: bool,
}

/// Bring an upload to `target_width`.
///
/// An image that is already exactly `target_width` wide keeps its bytes and
/// format. Anything else is resized with its aspect ratio kept and
/// re-encoded as JPEG at `jpeg_quality`.
pub fn normalize(
    upload: ValidatedUpload,
    target_width: u32,
    jpeg_quality: u8,
) -> Result<NormalizedImage> {
    let img = upload.image;
    let (width, height) = (img.width(), img.height());
    if width == target_width {
        return Ok(NormalizedImage {
            extension: upload.kind.extension(),
            bytes: upload.bytes,
            width,
            height,
            resized: false,
        });
    }

    let target_height = scaled_height(width, height, target_width);
    let resized = img
        .resize_exact(target_width, target_height, FilterType::Lanczos3)
        .to_rgb8();

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, jpeg_quality)
        .encode_image(&resized)
        .map_err(|e| Error::Image(format!("Failed to encode JPEG: {e}")))?;

    Ok(NormalizedImage {
        bytes,
        extension: ".jpg",
        width: target_width,
        height: target_height,
        resized: true,
    })
}

/// Height after scaling `width` to `target_width`, truncated, at least 1.
fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = u64::from(height) * u64::from(target_width) / u64::from(width.max(1));
    scaled.clamp(1, u64::from(u32::MAX)) as u32
}
