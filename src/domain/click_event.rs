//! Click event model for asynchronous click tracking.

use chrono::{DateTime, Utc};

use crate::domain::entities::NewClick;

/// An in-memory representation of a click, produced on the redirect path.
///
/// Exists only in transit between the redirect handler and the worker pool.
/// It is a value: copied into the queue by the producer and consumed exactly
/// once by whichever worker dequeues it, or dropped when the queue is full.
///
/// # Usage Flow
///
/// 1. Created in the redirect handler with request metadata
/// 2. Published to the bounded queue (non-blocking)
/// 3. Picked up by [`crate::domain::click_worker::run_click_worker`]
/// 4. Converted to [`crate::domain::entities::NewClick`] for persistence
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub link_id: i64,
    pub occurred_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

impl ClickEvent {
    /// Creates a new click event, stamped with the current time.
    pub fn new(link_id: i64, user_agent: Option<&str>, ip: Option<String>) -> Self {
        Self {
            link_id,
            occurred_at: Utc::now(),
            user_agent: user_agent.map(|s| s.to_string()),
            ip,
        }
    }

    /// Converts the event into its durable form.
    pub fn into_new_click(self) -> NewClick {
        NewClick {
            link_id: self.link_id,
            clicked_at: self.occurred_at,
            user_agent: self.user_agent,
            ip: self.ip,
        }
    }
}
