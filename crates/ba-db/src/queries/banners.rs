//! Banner CRUD operations.

use ba_core::{BannerId, BannerPatch, Error, ImageId, Result};
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension};

use crate::models::{Banner, BannerListing};

const COLS: &str = "id, is_silent, start_date, end_date, url, weight, image_id";

/// List every banner with its linked image, in storage order.
pub fn list_banners(conn: &Connection) -> Result<Vec<BannerListing>> {
    let mut stmt = conn
        .prepare(
            "SELECT b.id, b.is_silent, b.start_date, b.end_date, b.url, b.weight, b.image_id,
                    i.file, i.width, i.height
             FROM banners b
             LEFT JOIN images i ON i.id = b.image_id
             ORDER BY b.id",
        )
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], BannerListing::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Insert a banner with every column at its default.
pub fn create_banner(conn: &Connection) -> Result<Banner> {
    conn.execute("INSERT INTO banners DEFAULT VALUES", [])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(Banner::with_defaults(BannerId::from(conn.last_insert_rowid())))
}

/// Get a banner by ID.
pub fn get_banner(conn: &Connection, id: BannerId) -> Result<Option<Banner>> {
    let q = format!("SELECT {COLS} FROM banners WHERE id = ?1");
    conn.query_row(&q, [id.get()], Banner::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Apply the assigned fields of `patch` to a banner.
///
/// Returns `false` when no banner has this id. An empty patch writes
/// nothing and only reports whether the banner exists.
pub fn update_banner(conn: &Connection, id: BannerId, patch: &BannerPatch) -> Result<bool> {
    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(silent) = patch.is_silent {
        sets.push("is_silent");
        values.push(Box::new(silent));
    }
    if let Some(start) = patch.start_date {
        sets.push("start_date");
        values.push(Box::new(start));
    }
    if let Some(end) = patch.end_date {
        sets.push("end_date");
        values.push(Box::new(end));
    }
    if let Some(url) = &patch.url {
        sets.push("url");
        values.push(Box::new(url.clone()));
    }
    if let Some(weight) = patch.weight {
        sets.push("weight");
        values.push(Box::new(weight));
    }

    if sets.is_empty() {
        return Ok(get_banner(conn, id)?.is_some());
    }

    let assignments: Vec<String> = sets
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{col} = ?{}", i + 1))
        .collect();
    let sql = format!(
        "UPDATE banners SET {} WHERE id = ?{}",
        assignments.join(", "),
        sets.len() + 1
    );
    values.push(Box::new(id.get()));

    let n = conn
        .execute(&sql, rusqlite::params_from_iter(values))
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Point a banner at an image. Returns `false` when no banner has this id.
pub fn set_banner_image(conn: &Connection, id: BannerId, image_id: ImageId) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE banners SET image_id = ?1 WHERE id = ?2",
            [image_id.get(), id.get()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a banner by ID. Linked images are left to the caller.
pub fn delete_banner(conn: &Connection, id: BannerId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM banners WHERE id = ?1", [id.get()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
