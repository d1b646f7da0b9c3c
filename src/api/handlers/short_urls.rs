//! Handlers for creating and listing short URLs.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::short_url::{CreateShortUrlRequest, CreateShortUrlResponse};
use crate::api::middleware::auth::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL owned by the caller.
///
/// # Endpoint
///
/// `POST /api/short-urls`
///
/// # Request Body
///
/// ```json
/// { "url": "example.com/landing" }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// { "code": "stdk9XbQ2e" }
/// ```
///
/// # Errors
///
/// - 401 if the caller headers are missing
/// - 422 if the URL is empty, too long or not http(s)
/// - 503 if no counter value could be allocated
pub async fn create_short_url_handler(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateShortUrlRequest>,
) -> Result<(StatusCode, Json<CreateShortUrlResponse>), AppError> {
    payload.validate()?;

    let record = state
        .link_service
        .create_short_url(&payload.url, &caller.owner_id, caller.tier)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateShortUrlResponse { code: record.code }),
    ))
}

/// Lists the caller's codes, ordered by code.
///
/// # Endpoint
///
/// `GET /api/short-urls`
pub async fn list_short_urls_handler(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<String>>, AppError> {
    let codes = state.link_service.list_by_owner(&caller.owner_id).await?;
    Ok(Json(codes))
}
