//! In-memory repository implementations.
//!
//! Back the integration tests and local development without a Postgres
//! instance. They uphold the same contracts as the Postgres repositories,
//! including the duplicate-code rejection on insert, so the allocation
//! protocol can be exercised against them unchanged.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::RwLock;

use crate::domain::entities::{Click, Link, NewClick, NewLink};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::error::AppError;

/// In-memory link store with the same unique-code semantics as Postgres.
#[derive(Default)]
pub struct MemoryLinkRepository {
    links: RwLock<Vec<Link>>,
    next_id: AtomicI64,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self {
            links: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        // The write lock spans check and insert, mirroring the atomicity the
        // unique index gives the Postgres implementation.
        let mut links = self.links.write().await;

        if links.iter().any(|l| l.code == new_link.code) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "links_code_key" }),
            ));
        }

        let link = Link::new(
            self.next_id.fetch_add(1, Ordering::SeqCst),
            new_link.code,
            new_link.long_url,
            Utc::now(),
        );
        links.push(link.clone());

        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let links = self.links.read().await;
        Ok(links.iter().find(|l| l.code == code).cloned())
    }
}

/// In-memory click store with optional persist-failure injection.
#[derive(Default)]
pub struct MemoryClickRepository {
    clicks: RwLock<Vec<Click>>,
    next_id: AtomicI64,
    pending_failures: RwLock<u32>,
}

impl MemoryClickRepository {
    pub fn new() -> Self {
        Self {
            clicks: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
            pending_failures: RwLock::new(0),
        }
    }

    /// Makes the next `count` calls to `create` fail with a store error.
    pub async fn inject_failures(&self, count: u32) {
        *self.pending_failures.write().await = count;
    }

    /// Total number of clicks stored, across all links.
    pub async fn total_clicks(&self) -> i64 {
        self.clicks.read().await.len() as i64
    }
}

#[async_trait]
impl ClickRepository for MemoryClickRepository {
    async fn create(&self, new_click: NewClick) -> Result<Click, AppError> {
        {
            let mut failures = self.pending_failures.write().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(AppError::internal("Simulated store failure", json!({})));
            }
        }

        let click = Click::new(
            self.next_id.fetch_add(1, Ordering::SeqCst),
            new_click.link_id,
            new_click.clicked_at,
            new_click.user_agent,
            new_click.ip,
        );

        self.clicks.write().await.push(click.clone());

        Ok(click)
    }

    async fn count_by_link_id(&self, link_id: i64) -> Result<i64, AppError> {
        let clicks = self.clicks.read().await;
        Ok(clicks.iter().filter(|c| c.link_id == link_id).count() as i64)
    }

    async fn list_by_link_id(&self, link_id: i64) -> Result<Vec<Click>, AppError> {
        let mut clicks: Vec<Click> = self
            .clicks
            .read()
            .await
            .iter()
            .filter(|c| c.link_id == link_id)
            .cloned()
            .collect();

        clicks.sort_by(|a, b| b.clicked_at.cmp(&a.clicked_at));
        Ok(clicks)
    }
}
