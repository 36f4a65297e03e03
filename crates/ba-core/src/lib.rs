//! ba-core: shared types, IDs, errors, and configuration.
//!
//! This crate is the foundational dependency for all other ba-* crates,
//! providing integer-backed typed identifiers, a unified error type,
//! the banner domain types, and application configuration.

pub mod banner;
pub mod config;
pub mod error;
pub mod ids;

// Re-export the most commonly used items at the crate root.
pub use banner::{BannerPatch, DEFAULT_WEIGHT};
pub use error::{Error, Result};
pub use ids::*;
