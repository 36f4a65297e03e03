//! Application and per-request context.
//!
//! [`AppContext`] is shared across all route handlers via Axum state.
//! [`RequestContext`] is extracted per request from what the middleware
//! stack left in the request extensions.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

use ba_core::config::Config;
use ba_db::pool::DbPool;
use ba_images::ImageService;

use crate::middleware::auth::Principal;
use crate::middleware::request_id::RequestId;

/// Application context shared by all request handlers (via Axum state).
///
/// This is cheaply cloneable because it only holds `Arc`s.
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Upload processing and banner/image linkage.
    pub images: Arc<ImageService>,
}

impl AppContext {
    pub fn new(config: Config, db: DbPool) -> Self {
        let images = Arc::new(ImageService::new(&config.uploads, db.clone()));
        Self {
            db,
            config: Arc::new(config),
            images,
        }
    }
}

/// Who is calling and under which request id.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub principal: Principal,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or(StatusCode::UNAUTHORIZED)?;
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_else(|| "-".to_string());

        Ok(Self {
            request_id,
            principal,
        })
    }
}
