//! API key authentication middleware.
//!
//! Applied to the banner routes only. Resolves a [`Principal`] from the
//! request headers and stores it in the request extensions, or answers 401.

use std::fmt;

use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use ba_core::config::AuthConfig;

use crate::context::AppContext;

/// Header carrying the API key as an alternative to `Authorization: Bearer`.
pub const X_API_KEY: &str = "x-api-key";

/// The caller a request was authenticated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// Presented the configured API key.
    ApiKey,
    /// Auth is disabled; every caller is anonymous.
    Anonymous,
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::ApiKey => f.write_str("api-key"),
            Principal::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// Resolve the principal for a set of request headers.
///
/// Token resolution order:
/// 1. `Authorization: Bearer <key>`
/// 2. `X-Api-Key: <key>`
pub fn authenticate(auth_config: &AuthConfig, headers: &HeaderMap) -> Option<Principal> {
    if !auth_config.enabled {
        return Some(Principal::Anonymous);
    }

    let expected = auth_config.api_key.as_deref().filter(|k| !k.is_empty())?;

    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    let api_key = headers
        .get(X_API_KEY)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    [bearer, api_key]
        .into_iter()
        .flatten()
        .any(|token| token == expected)
        .then_some(Principal::ApiKey)
}

/// Generate a random API key suitable for `auth.api_key`.
pub fn generate_api_key() -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Authentication middleware.
///
/// On success, inserts the resolved [`Principal`] into request extensions.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    match authenticate(&ctx.config.auth, request.headers()) {
        Some(principal) => {
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated request");
            Err((StatusCode::UNAUTHORIZED, "Authentication required").into_response())
        }
    }
}
