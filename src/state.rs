//! Shared application state injected into HTTP handlers.

use std::sync::Arc;

use crate::application::services::LinkService;
use crate::domain::click_queue::ClickSender;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    /// Producer handle for the click event queue. Cloned per request;
    /// the queue closes once every handle (and the server) is gone.
    pub click_sender: ClickSender,
    pub base_url: String,
}
