//! Upload validation.
//!
//! Checks run in a fixed order and stop at the first failure: transport,
//! MIME type, decodability, size. A rejection carries the message shown
//! to the admin user and never leaves anything behind.

use std::io::Cursor;

use image::{DynamicImage, ImageReader};

/// Why an upload was refused. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("There was a problem uploading the file. Please try again.")]
    Transport,

    #[error("Wrong file type. Only PNG and JPEG files can be uploaded.")]
    UnsupportedType,

    #[error("Wrong file format. Maybe this is not an image?")]
    NotAnImage,

    #[error("The file is too large. The maximum file size is {}.", human_size(*.max_bytes))]
    TooLarge { max_bytes: u64 },
}

fn human_size(bytes: u64) -> String {
    if bytes >= 1_000_000 {
        format!("{} MB", bytes / 1_000_000)
    } else {
        format!("{bytes} bytes")
    }
}

/// The two accepted upload types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Png,
    Jpeg,
}

impl UploadKind {
    /// Match a declared MIME type exactly.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(Self::Png),
            "image/jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Extension used when the file is stored unmodified.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => ".png",
            Self::Jpeg => ".jpg",
        }
    }
}

/// An upload that passed every check, with its decoded pixels.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub kind: UploadKind,
    pub bytes: Vec<u8>,
    pub image: DynamicImage,
}

/// Validate a received file.
///
/// `content_type` is the MIME type declared for the multipart field.
pub fn validate(
    content_type: Option<&str>,
    bytes: Vec<u8>,
    max_bytes: u64,
) -> Result<ValidatedUpload, UploadRejection> {
    let kind = content_type
        .and_then(UploadKind::from_mime)
        .ok_or(UploadRejection::UnsupportedType)?;

    let image = decode(&bytes).ok_or(UploadRejection::NotAnImage)?;

    if bytes.len() as u64 > max_bytes {
        return Err(UploadRejection::TooLarge { max_bytes });
    }

    Ok(ValidatedUpload { kind, bytes, image })
}

/// Fully decode `bytes`. Truncated data, unknown formats and images over
/// the decoder limits all come back as `None`.
fn decode(bytes: &[u8]) -> Option<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    reader.format()?;
    match reader.decode() {
        Ok(img) if img.width() > 0 && img.height() > 0 => Some(img),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Upload failed to decode: {e}");
            None
        }
    }
}
