//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`ba_core::Error`] so that route handlers
//! can return `Result<T, ba_core::Error>` directly. Server-side failures are
//! logged here and answered with a bare status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: ba_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: ba_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    fn code(&self) -> &'static str {
        match &self.inner {
            ba_core::Error::NotFound { .. } => "not_found",
            ba_core::Error::Unauthorized(_) => "unauthorized",
            ba_core::Error::Validation(_) => "validation_error",
            ba_core::Error::Database { .. } => "database_error",
            ba_core::Error::Io { .. } => "io_error",
            ba_core::Error::Image(_) => "image_error",
            ba_core::Error::Internal(_) => "internal_error",
        }
    }
}

impl From<ba_core::Error> for AppError {
    fn from(e: ba_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                code = self.code(),
                request_id = self.request_id.as_deref().unwrap_or("-"),
                error = %self.inner,
                "Server error in API handler"
            );
            return status.into_response();
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.code(),
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}
