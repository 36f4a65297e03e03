//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row` whose columns follow the owning query module's `COLS`.

use ba_core::{BannerId, ImageId, DEFAULT_WEIGHT};
use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Banner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub id: BannerId,
    pub is_silent: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub url: Option<String>,
    pub weight: i32,
    pub image_id: Option<ImageId>,
}

impl Banner {
    /// A banner as it exists right after `INSERT ... DEFAULT VALUES`.
    pub fn with_defaults(id: BannerId) -> Self {
        Self {
            id,
            is_silent: false,
            start_date: None,
            end_date: None,
            url: None,
            weight: DEFAULT_WEIGHT,
            image_id: None,
        }
    }

    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: BannerId::from(row.get::<_, i64>(0)?),
            is_silent: row.get(1)?,
            start_date: row.get(2)?,
            end_date: row.get(3)?,
            url: row.get(4)?,
            weight: row.get(5)?,
            image_id: row.get::<_, Option<i64>>(6)?.map(ImageId::from),
        })
    }
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: ImageId,
    pub file: String,
    pub width: u32,
    pub height: u32,
}

impl Image {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: ImageId::from(row.get::<_, i64>(0)?),
            file: row.get(1)?,
            width: row.get(2)?,
            height: row.get(3)?,
        })
    }
}

// ---------------------------------------------------------------------------
// BannerListing
// ---------------------------------------------------------------------------

/// A banner joined with the file and dimensions of its linked image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerListing {
    pub banner: Banner,
    pub image_file: Option<String>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
}

impl BannerListing {
    /// Banner columns first, then `file, width, height` of the joined image.
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            banner: Banner::from_row(row)?,
            image_file: row.get(7)?,
            image_width: row.get(8)?,
            image_height: row.get(9)?,
        })
    }
}
