//! Uploaded image record operations.

use ba_core::{Error, ImageId, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::models::Image;

const COLS: &str = "id, file, width, height";

/// Insert an image record and return its new id.
pub fn create_image(conn: &Connection, file: &str, width: u32, height: u32) -> Result<ImageId> {
    conn.execute(
        "INSERT INTO images (file, width, height) VALUES (?1, ?2, ?3)",
        rusqlite::params![file, width, height],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(ImageId::from(conn.last_insert_rowid()))
}

/// Get an image record by ID.
pub fn get_image(conn: &Connection, id: ImageId) -> Result<Option<Image>> {
    let q = format!("SELECT {COLS} FROM images WHERE id = ?1");
    conn.query_row(&q, [id.get()], Image::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Look up only the stored filename of an image.
pub fn get_image_file(conn: &Connection, id: ImageId) -> Result<Option<String>> {
    conn.query_row("SELECT file FROM images WHERE id = ?1", [id.get()], |row| {
        row.get(0)
    })
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Delete an image by ID.
pub fn delete_image(conn: &Connection, id: ImageId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM images WHERE id = ?1", [id.get()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
