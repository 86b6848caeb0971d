//! Handler for link creation.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::shorten::{CreateLinkRequest, CreateLinkResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a shortened URL.
///
/// # Endpoint
///
/// `POST /api/v1/links`
///
/// # Request Body
///
/// ```json
/// { "long_url": "https://example.com/some/very/long/path" }
/// ```
///
/// # Response
///
/// `201 Created` with:
///
/// ```json
/// {
///   "short_code": "aZ3kQ9",
///   "long_url": "https://example.com/some/very/long/path",
///   "full_short_url": "http://localhost:8080/aZ3kQ9"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the URL is invalid, 500 if the code space is
/// exhausted or the store fails.
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<CreateLinkResponse>), AppError> {
    payload.validate()?;

    let link = state.link_service.create_link(payload.long_url).await?;

    let full_short_url = state
        .link_service
        .full_short_url(&state.base_url, &link.code);

    Ok((
        StatusCode::CREATED,
        Json(CreateLinkResponse {
            short_code: link.code,
            long_url: link.long_url,
            full_short_url,
        }),
    ))
}
