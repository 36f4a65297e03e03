//! Banner domain types shared between the store and the HTTP boundary.

use chrono::NaiveDate;

/// Weight given to freshly created banners.
pub const DEFAULT_WEIGHT: i32 = 10;

/// Sparse set of column assignments for a banner.
///
/// Each slot is `None` when the field was not supplied and must be left
/// untouched. For nullable columns the inner `Option` distinguishes
/// "set to value" from "clear to null".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannerPatch {
    pub is_silent: Option<bool>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub url: Option<Option<String>>,
    pub weight: Option<i32>,
}
