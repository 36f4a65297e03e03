//! ba-images: upload validation, normalization and storage.
//!
//! An uploaded file goes through [`validate`] (transport, MIME, decode,
//! size), is normalized to the target width by [`normalize`], written
//! under a fresh random name by [`UploadStore`], and linked to a banner by
//! [`ImageService`], which also owns the compensating cleanup.

mod normalize;
mod service;
mod storage;
mod validate;

pub use normalize::{normalize, NormalizedImage};
pub use service::{AttachedImage, ImageService, UploadOutcome};
pub use storage::UploadStore;
pub use validate::{validate, UploadKind, UploadRejection, ValidatedUpload};
