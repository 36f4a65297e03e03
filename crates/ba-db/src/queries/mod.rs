//! Database query modules.

pub mod banners;
pub mod images;
