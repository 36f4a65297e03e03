//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order. A
//! `schema_migrations` table tracks which versions have been applied.

use ba_core::{Error, Result};
use rusqlite::Connection;

/// V1: initial schema -- uploaded images and the banners that link to them.
const V1_INITIAL: &str = r#"
-- Uploaded images (stored files and their final dimensions)
CREATE TABLE images (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    file   TEXT NOT NULL,
    width  INTEGER NOT NULL CHECK (width > 0),
    height INTEGER NOT NULL CHECK (height > 0)
);

-- Banners
CREATE TABLE banners (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    is_silent  INTEGER NOT NULL DEFAULT 0,
    start_date TEXT,
    end_date   TEXT,
    url        TEXT,
    weight     INTEGER NOT NULL DEFAULT 10,
    image_id   INTEGER REFERENCES images(id)
);

CREATE INDEX idx_banners_image ON banners(image_id);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL)];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS {
        let applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if applied {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit().map_err(|e| Error::database(e.to_string()))?;
        tracing::debug!("Applied migration V{version}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        // second call is a no-op
        run_migrations(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_all_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        for t in ["banners", "images", "schema_migrations"] {
            let exists: bool = conn
                .query_row(
                    "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
                    [t],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists, "table {t} should exist");
        }
    }

    #[test]
    fn banner_defaults_come_from_schema() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute("INSERT INTO banners DEFAULT VALUES", []).unwrap();

        let (silent, weight): (i64, i64) = conn
            .query_row("SELECT is_silent, weight FROM banners", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(silent, 0);
        assert_eq!(weight, 10);
    }

    #[test]
    fn image_dimensions_must_be_positive() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let res = conn.execute(
            "INSERT INTO images (file, width, height) VALUES ('a.jpg', 0, 10)",
            [],
        );
        assert!(res.is_err());
    }
}
