//! DTOs for the link statistics endpoint.

use serde::Serialize;

/// Aggregated statistics for a short link.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub short_code: String,
    pub long_url: String,
    pub total_clicks: i64,
}
