//! Banner route handlers.
//!
//! Edit and delete answer with a bare 200 or 400. Upload validation failures
//! are reported in a 200 JSON body; server-side upload failures are a bare 500.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ba_core::config::UploadConfig;
use ba_core::{BannerId, BannerPatch};
use ba_db::models::{Banner, BannerListing};
use ba_images::{UploadOutcome, UploadRejection};

use crate::context::{AppContext, RequestContext};
use crate::error::AppError;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "SelectedFile";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Banner response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BannerResponse {
    pub id: i64,
    pub is_silent: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub image_url: Option<String>,
    pub image_height: Option<u32>,
    pub image_width: Option<u32>,
    pub url: Option<String>,
    pub weight: i32,
}

impl BannerResponse {
    fn from_banner(banner: &Banner) -> Self {
        Self {
            id: banner.id.get(),
            is_silent: banner.is_silent,
            start_date: banner.start_date.map(format_date),
            end_date: banner.end_date.map(format_date),
            image_url: None,
            image_height: None,
            image_width: None,
            url: banner.url.clone(),
            weight: banner.weight,
        }
    }

    fn from_listing(listing: &BannerListing, uploads: &UploadConfig) -> Self {
        Self {
            image_url: listing
                .image_file
                .as_deref()
                .map(|file| uploads.public_path(file)),
            image_height: listing.image_height,
            image_width: listing.image_width,
            ..Self::from_banner(&listing.banner)
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Form body for editing a banner. Every field is optional.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditBannerForm {
    /// `"True"` marks the banner silent; any other value clears the flag.
    pub silent: Option<String>,
    /// `YYYY-MM-DD`, or empty to clear.
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, or empty to clear.
    pub end_date: Option<String>,
    /// Target URL, or empty to clear.
    pub url: Option<String>,
    /// Integer weight; unparseable input counts as 0.
    pub weight: Option<String>,
}

impl EditBannerForm {
    /// Fields set here win; unset ones fall back to `fallback`.
    pub fn or(self, fallback: Self) -> Self {
        Self {
            silent: self.silent.or(fallback.silent),
            start_date: self.start_date.or(fallback.start_date),
            end_date: self.end_date.or(fallback.end_date),
            url: self.url.or(fallback.url),
            weight: self.weight.or(fallback.weight),
        }
    }

    /// Slot for a submitted field name, if it is one of the edit fields.
    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "silent" => Some(&mut self.silent),
            "startDate" => Some(&mut self.start_date),
            "endDate" => Some(&mut self.end_date),
            "url" => Some(&mut self.url),
            "weight" => Some(&mut self.weight),
            _ => None,
        }
    }

    /// Decode the submitted strings into a sparse update.
    pub fn into_patch(self) -> ba_core::Result<BannerPatch> {
        Ok(BannerPatch {
            is_silent: self.silent.map(|s| s == "True"),
            start_date: self
                .start_date
                .map(|raw| parse_optional_date("startDate", &raw))
                .transpose()?,
            end_date: self
                .end_date
                .map(|raw| parse_optional_date("endDate", &raw))
                .transpose()?,
            url: self.url.map(|raw| (!raw.is_empty()).then_some(raw)),
            weight: self.weight.map(|raw| parse_leading_int(&raw)),
        })
    }
}

fn parse_optional_date(field: &str, raw: &str) -> ba_core::Result<Option<NaiveDate>> {
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|e| ba_core::Error::Validation(format!("{field} '{raw}': {e}")))
}

/// Edit fields merged from the query string and the request body.
///
/// The body may be urlencoded or multipart; any other body is ignored.
/// Values from the body override the same field in the query string.
#[derive(Debug, Default)]
pub struct EditFields(pub EditBannerForm);

impl<S> FromRequest<S> for EditFields
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<EditBannerForm>::try_from_uri(req.uri()).map_err(|e| {
            tracing::debug!(error = %e, "Unreadable edit query string");
            StatusCode::BAD_REQUEST
        })?;

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let body = if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state).await.map_err(|e| {
                tracing::debug!(error = %e, "Unreadable multipart edit body");
                StatusCode::BAD_REQUEST
            })?;
            read_edit_fields(&mut multipart).await.map_err(|e| {
                tracing::debug!(error = %e, "Unreadable multipart edit field");
                StatusCode::BAD_REQUEST
            })?
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<EditBannerForm>::from_request(req, state).await.map_err(|e| {
                tracing::debug!(error = %e, "Unreadable edit form");
                StatusCode::BAD_REQUEST
            })?;
            form
        } else {
            EditBannerForm::default()
        };

        Ok(Self(body.or(query)))
    }
}

/// Collect the edit fields from a multipart body. Other fields are skipped.
async fn read_edit_fields(multipart: &mut Multipart) -> Result<EditBannerForm, MultipartError> {
    let mut form = EditBannerForm::default();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if let Some(slot) = form.slot(&name) {
            *slot = Some(field.text().await?);
        }
    }
    Ok(form)
}

/// Parse the leading integer of `raw`, ignoring anything after it.
///
/// Leading whitespace and one sign are accepted. No digits yields 0; values
/// outside `i32` saturate.
pub fn parse_leading_int(raw: &str) -> i32 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
        if value > i64::from(i32::MAX) + 1 {
            break;
        }
    }
    let value = if negative { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Successful upload response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    /// Public path of the stored file.
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// Upload rejected by validation.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadErrorResponse {
    /// Always `true`.
    pub error: bool,
    pub message: String,
}

impl From<UploadRejection> for UploadErrorResponse {
    fn from(rejection: UploadRejection) -> Self {
        Self {
            error: true,
            message: rejection.to_string(),
        }
    }
}

/// GET /banners
#[utoipa::path(
    get,
    path = "/banners",
    responses(
        (status = 200, description = "List all banners", body = Vec<BannerResponse>),
        (status = 401, description = "Missing or invalid API key")
    )
)]
pub async fn list_banners(
    State(ctx): State<AppContext>,
    req: RequestContext,
) -> Result<Json<Vec<BannerResponse>>, AppError> {
    let with_id = |e: ba_core::Error| AppError::from(e).with_request_id(req.request_id.clone());

    let conn = ba_db::pool::get_conn(&ctx.db).map_err(with_id)?;
    let listings = ba_db::queries::banners::list_banners(&conn).map_err(with_id)?;
    let uploads = &ctx.config.uploads;
    Ok(Json(
        listings
            .iter()
            .map(|l| BannerResponse::from_listing(l, uploads))
            .collect(),
    ))
}

/// POST /banners
#[utoipa::path(
    post,
    path = "/banners",
    responses(
        (status = 200, description = "Banner created with default values", body = BannerResponse),
        (status = 401, description = "Missing or invalid API key")
    )
)]
pub async fn create_banner(
    State(ctx): State<AppContext>,
    req: RequestContext,
) -> Result<Json<BannerResponse>, AppError> {
    let with_id = |e: ba_core::Error| AppError::from(e).with_request_id(req.request_id.clone());

    let conn = ba_db::pool::get_conn(&ctx.db).map_err(with_id)?;
    let banner = ba_db::queries::banners::create_banner(&conn).map_err(with_id)?;
    tracing::info!(banner_id = %banner.id, actor = %req.principal, "Banner created");
    Ok(Json(BannerResponse::from_banner(&banner)))
}

/// DELETE /banners/{id}
#[utoipa::path(
    delete,
    path = "/banners/{id}",
    params(("id" = i64, Path, description = "Banner ID")),
    responses(
        (status = 200, description = "Banner deleted"),
        (status = 400, description = "Banner not found or could not be deleted"),
        (status = 401, description = "Missing or invalid API key")
    )
)]
pub async fn delete_banner(
    State(ctx): State<AppContext>,
    req: RequestContext,
    Path(id): Path<BannerId>,
) -> StatusCode {
    let images = ctx.images.clone();
    match tokio::task::spawn_blocking(move || images.delete_banner(id)).await {
        Ok(Ok(true)) => {
            tracing::info!(banner_id = %id, actor = %req.principal, "Banner deleted");
            StatusCode::OK
        }
        Ok(Ok(false)) => {
            tracing::debug!(banner_id = %id, "Delete of unknown banner");
            StatusCode::BAD_REQUEST
        }
        Ok(Err(e)) => {
            tracing::warn!(banner_id = %id, error = %e, "Banner delete failed");
            StatusCode::BAD_REQUEST
        }
        Err(e) => {
            tracing::error!(banner_id = %id, error = %e, "Banner delete task failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// POST /banners/{id}/edit
#[utoipa::path(
    post,
    path = "/banners/{id}/edit",
    params(("id" = i64, Path, description = "Banner ID")),
    request_body(
        content = EditBannerForm,
        description = "Fields may also be sent as multipart form data or in the query string",
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 200, description = "Banner updated"),
        (status = 400, description = "Banner not found or update rejected"),
        (status = 401, description = "Missing or invalid API key")
    )
)]
pub async fn edit_banner(
    State(ctx): State<AppContext>,
    req: RequestContext,
    Path(id): Path<BannerId>,
    EditFields(form): EditFields,
) -> StatusCode {
    let patch = match form.into_patch() {
        Ok(patch) => patch,
        Err(e) => {
            tracing::debug!(banner_id = %id, error = %e, "Rejected banner edit");
            return StatusCode::BAD_REQUEST;
        }
    };

    let updated = ba_db::pool::get_conn(&ctx.db)
        .and_then(|conn| ba_db::queries::banners::update_banner(&conn, id, &patch));
    match updated {
        Ok(true) => {
            tracing::info!(banner_id = %id, actor = %req.principal, "Banner updated");
            StatusCode::OK
        }
        Ok(false) => StatusCode::BAD_REQUEST,
        Err(e) => {
            tracing::warn!(banner_id = %id, error = %e, "Banner update failed");
            StatusCode::BAD_REQUEST
        }
    }
}

/// POST /banners/{id}/upload
///
/// Expects a PNG or JPEG file in the `SelectedFile` multipart field.
#[utoipa::path(
    post,
    path = "/banners/{id}/upload",
    params(("id" = i64, Path, description = "Banner ID")),
    responses(
        (status = 200, description = "Image stored and linked, or an `UploadErrorResponse` when the file was rejected", body = UploadResponse),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Upload could not be stored or linked")
    )
)]
pub async fn upload_banner_image(
    State(ctx): State<AppContext>,
    req: RequestContext,
    Path(id): Path<BannerId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(
                banner_id = %id,
                request_id = %req.request_id,
                error = %e,
                "Upload request is not multipart"
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let (content_type, bytes) = match read_upload_field(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            tracing::error!(
                banner_id = %id,
                request_id = %req.request_id,
                "Upload is missing the {UPLOAD_FIELD} field"
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        Err(e) => {
            tracing::debug!(banner_id = %id, error = %e, "Upload transport failure");
            return Json(UploadErrorResponse::from(UploadRejection::Transport)).into_response();
        }
    };

    let images = ctx.images.clone();
    let result = tokio::task::spawn_blocking(move || {
        images.attach_upload(id, content_type.as_deref(), bytes)
    })
    .await;

    match result {
        Ok(Ok(UploadOutcome::Attached(image))) => {
            tracing::info!(
                banner_id = %id,
                image_id = %image.image_id,
                actor = %req.principal,
                "Image {} attached ({}x{})",
                image.file,
                image.width,
                image.height
            );
            Json(UploadResponse {
                path: image.path,
                width: image.width,
                height: image.height,
            })
            .into_response()
        }
        Ok(Ok(UploadOutcome::Rejected(rejection))) => {
            tracing::debug!(banner_id = %id, reason = %rejection, "Upload rejected");
            Json(UploadErrorResponse::from(rejection)).into_response()
        }
        Ok(Err(e)) => {
            tracing::error!(
                banner_id = %id,
                request_id = %req.request_id,
                error = %e,
                "Upload failed"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            tracing::error!(banner_id = %id, error = %e, "Upload task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Find the upload field and read it fully. Other fields are skipped.
async fn read_upload_field(
    multipart: &mut Multipart,
) -> Result<Option<(Option<String>, Vec<u8>)>, axum::extract::multipart::MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await?;
        return Ok(Some((content_type, bytes.to_vec())));
    }
    Ok(None)
}
