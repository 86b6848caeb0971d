//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::net::SocketAddr;

use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Look up the link by short code
/// 2. Build a click event from request metadata
/// 3. Publish it to the click queue without blocking; a full queue drops the
///    event rather than delaying the redirect
/// 4. Return 302 Found to the long URL
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist. Click-pipeline
/// pressure never fails the redirect.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, AppError> {
    let link = state.link_service.get_link_by_code(&code).await?;

    let click_event = ClickEvent::new(
        link.id,
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        Some(addr.ip().to_string()),
    );

    // Fire-and-forget: a `false` return means the event was shed under load.
    state.click_sender.try_publish(click_event);

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, link.long_url)],
    ))
}
