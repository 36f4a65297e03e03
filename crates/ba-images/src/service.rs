//! Image service coordinating upload storage with banner and image records.
//!
//! None of the multi-step operations here run in a transaction. Failures
//! after a file was written remove that file before the error is returned;
//! an image row inserted before a failed banner update is left in place.

use ba_core::config::UploadConfig;
use ba_core::{BannerId, Error, ImageId, Result};
use ba_db::pool::{get_conn, DbPool};
use ba_db::queries::{banners, images};

use crate::normalize::normalize;
use crate::storage::UploadStore;
use crate::validate::{validate, UploadRejection};

/// A stored upload linked to its banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedImage {
    pub image_id: ImageId,
    pub file: String,
    /// Public path of the file (`<public_base>/<file>`).
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// Result of an upload that did not fail on the server side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Attached(AttachedImage),
    Rejected(UploadRejection),
}

/// High-level service that coordinates filesystem storage with database records.
#[derive(Debug, Clone)]
pub struct ImageService {
    store: UploadStore,
    pool: DbPool,
    config: UploadConfig,
}

impl ImageService {
    /// Build the service from the upload config and a database pool.
    pub fn new(config: &UploadConfig, pool: DbPool) -> Self {
        Self {
            store: UploadStore::new(config.dir.clone(), config.name_length),
            pool,
            config: config.clone(),
        }
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    /// Validate, normalize and store an upload, then link it to `banner_id`.
    ///
    /// Validation failures come back as [`UploadOutcome::Rejected`] with no
    /// side effects. `Err` means a server-side failure; the written file has
    /// already been removed by then.
    pub fn attach_upload(
        &self,
        banner_id: BannerId,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome> {
        let upload = match validate(content_type, bytes, self.config.max_bytes) {
            Ok(upload) => upload,
            Err(rejection) => return Ok(UploadOutcome::Rejected(rejection)),
        };

        let normalized = normalize(
            upload,
            self.config.target_width,
            self.config.jpeg_quality,
        )?;
        let file = self
            .store
            .write_unique(&normalized.bytes, normalized.extension)?;
        tracing::debug!(
            file = %file,
            resized = normalized.resized,
            "Stored upload {}x{}",
            normalized.width,
            normalized.height
        );

        let conn = match get_conn(&self.pool) {
            Ok(conn) => conn,
            Err(e) => return Err(self.discard(&file, e)),
        };

        let image_id = match images::create_image(&conn, &file, normalized.width, normalized.height)
        {
            Ok(id) => id,
            Err(e) => return Err(self.discard(&file, e)),
        };

        let previous = match banners::get_banner(&conn, banner_id) {
            Ok(banner) => banner.and_then(|b| b.image_id),
            Err(e) => return Err(self.discard(&file, e)),
        };

        match banners::set_banner_image(&conn, banner_id, image_id) {
            Ok(true) => {}
            Ok(false) => {
                let e = Error::not_found("banner", banner_id);
                return Err(self.discard(&file, e));
            }
            Err(e) => return Err(self.discard(&file, e)),
        }
        drop(conn);

        if let Some(old) = previous.filter(|old| *old != image_id) {
            self.purge_image(old);
        }

        Ok(UploadOutcome::Attached(AttachedImage {
            image_id,
            path: self.config.public_path(&file),
            file,
            width: normalized.width,
            height: normalized.height,
        }))
    }

    /// Delete a banner and, if it had one, its image row and file.
    ///
    /// The result reflects only the banner row delete; image cleanup is
    /// best-effort and its failures are logged.
    pub fn delete_banner(&self, banner_id: BannerId) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        let image_id = banners::get_banner(&conn, banner_id)?.and_then(|b| b.image_id);

        let deleted = banners::delete_banner(&conn, banner_id)?;
        drop(conn);

        if deleted {
            if let Some(image_id) = image_id {
                self.purge_image(image_id);
            }
        }
        Ok(deleted)
    }

    /// Best-effort removal of an image row and its file.
    pub fn purge_image(&self, image_id: ImageId) {
        let conn = match get_conn(&self.pool) {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Could not purge image {image_id}: {e}");
                return;
            }
        };

        let file = match images::get_image_file(&conn, image_id) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("Could not look up image {image_id}: {e}");
                None
            }
        };

        if let Err(e) = images::delete_image(&conn, image_id) {
            tracing::warn!("Could not delete image row {image_id}: {e}");
        }

        if let Some(file) = file {
            if let Err(e) = self.store.remove(&file) {
                tracing::warn!("Could not remove image file {file}: {e}");
            }
        }
    }

    /// Remove a just-written file after a later step failed.
    fn discard(&self, file: &str, cause: Error) -> Error {
        tracing::error!("Upload linkage failed, removing {file}: {cause}");
        if let Err(e) = self.store.remove(file) {
            tracing::warn!("Could not remove {file} after failed upload: {e}");
        }
        cause
    }
}
