//! Route handlers grouped by resource.

pub mod banners;
pub mod health;
