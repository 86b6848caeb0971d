//! Link creation, lookup, and stats service.
//!
//! Owns the short-code allocation protocol: generate a random candidate,
//! check it against the store, insert, and restart the whole cycle when the
//! store's unique constraint rejects the insert. Uniqueness is enforced by
//! the store, not by in-process locks, so the protocol stays correct when
//! several processes share one database.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;
use url::Url;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::error::AppError;
use crate::utils::code_generator::generate_code;

/// Service for creating and retrieving shortened links.
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    clicks: Arc<dyn ClickRepository>,
    code_length: usize,
    retry_budget: u32,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(
        links: Arc<dyn LinkRepository>,
        clicks: Arc<dyn ClickRepository>,
        code_length: usize,
        retry_budget: u32,
    ) -> Self {
        Self {
            links,
            clicks,
            code_length,
            retry_budget,
        }
    }

    /// Creates a short link for the given URL.
    ///
    /// # Allocation protocol
    ///
    /// Each attempt generates a fresh random code, checks it against the
    /// store, and inserts. Two races are handled:
    ///
    /// - a lookup hit is an ordinary collision: try a new candidate;
    /// - a duplicate-key rejection at insert time means another allocation
    ///   won the check-then-insert race for the same candidate; it counts as
    ///   a collision and restarts the cycle.
    ///
    /// Both are bounded by the same retry budget.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is not a valid http(s) URL.
    /// Returns [`AppError::CodeSpaceExhausted`] when the budget runs out.
    /// Returns [`AppError::Internal`] on any other store fault, immediately.
    pub async fn create_link(&self, long_url: String) -> Result<Link, AppError> {
        validate_long_url(&long_url)?;

        for attempt in 1..=self.retry_budget {
            let code = generate_code(self.code_length)?;

            if self.links.find_by_code(&code).await?.is_some() {
                warn!(
                    code,
                    attempt,
                    budget = self.retry_budget,
                    "short code collision, retrying"
                );
                continue;
            }

            match self
                .links
                .create(NewLink {
                    code: code.clone(),
                    long_url: long_url.clone(),
                })
                .await
            {
                Ok(link) => return Ok(link),
                Err(AppError::Conflict { .. }) => {
                    // Lost the check-then-insert race against a concurrent
                    // allocation; the candidate is taken after all.
                    warn!(
                        code,
                        attempt,
                        budget = self.retry_budget,
                        "short code taken at insert, retrying"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::CodeSpaceExhausted {
            attempts: self.retry_budget,
        })
    }

    /// Retrieves a link by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches the code.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn get_link_by_code(&self, code: &str) -> Result<Link, AppError> {
        self.links
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))
    }

    /// Retrieves a link together with its total click count.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches the code.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn get_link_stats(&self, code: &str) -> Result<(Link, i64), AppError> {
        let link = self.get_link_by_code(code).await?;
        let total_clicks = self.clicks.count_by_link_id(link.id).await?;

        Ok((link, total_clicks))
    }

    /// Constructs the full short URL for a code.
    pub fn full_short_url(&self, base_url: &str, code: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), code)
    }
}

/// Validates that the URL parses and uses an http(s) scheme.
fn validate_long_url(long_url: &str) -> Result<(), AppError> {
    let parsed = Url::parse(long_url).map_err(|e| {
        AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::bad_request(
            "URL must use http or https",
            json!({ "scheme": parsed.scheme() }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockClickRepository, MockLinkRepository};
    use crate::utils::code_generator::is_alphabet_code;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_link(id: i64, code: &str, url: &str) -> Link {
        Link::new(id, code.to_string(), url.to_string(), Utc::now())
    }

    fn service(links: MockLinkRepository, clicks: MockClickRepository) -> LinkService {
        LinkService::new(Arc::new(links), Arc::new(clicks), 6, 5)
    }

    #[tokio::test]
    async fn test_create_link_success() {
        let mut links = MockLinkRepository::new();
        let clicks = MockClickRepository::new();

        links
            .expect_find_by_code()
            .times(1)
            .returning(|_| Ok(None));

        links
            .expect_create()
            .withf(|new_link| new_link.code.len() == 6 && is_alphabet_code(&new_link.code))
            .times(1)
            .returning(|new_link| Ok(test_link(1, &new_link.code, &new_link.long_url)));

        let service = service(links, clicks);

        let link = service
            .create_link("https://example.com".to_string())
            .await
            .unwrap();

        assert_eq!(link.long_url, "https://example.com");
        assert_eq!(link.code.len(), 6);
        assert!(is_alphabet_code(&link.code));
    }

    #[tokio::test]
    async fn test_create_link_retries_on_lookup_collision() {
        let mut links = MockLinkRepository::new();
        let clicks = MockClickRepository::new();

        let lookups = AtomicUsize::new(0);
        links.expect_find_by_code().times(2).returning(move |code| {
            // First candidate is taken, second is free.
            if lookups.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(Some(test_link(9, code, "https://other.com")))
            } else {
                Ok(None)
            }
        });

        links
            .expect_create()
            .times(1)
            .returning(|new_link| Ok(test_link(1, &new_link.code, &new_link.long_url)));

        let service = service(links, clicks);

        let result = service.create_link("https://example.com".to_string()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_link_exhausts_budget_without_insert() {
        let mut links = MockLinkRepository::new();
        let clicks = MockClickRepository::new();

        // Every candidate is already taken.
        links.expect_find_by_code().times(5).returning(|code| {
            Ok(Some(test_link(9, code, "https://other.com")))
        });
        links.expect_create().times(0);

        let service = service(links, clicks);

        let result = service.create_link("https://example.com".to_string()).await;

        assert!(matches!(
            result.unwrap_err(),
            AppError::CodeSpaceExhausted { attempts: 5 }
        ));
    }

    #[tokio::test]
    async fn test_create_link_retries_on_duplicate_key_at_insert() {
        let mut links = MockLinkRepository::new();
        let clicks = MockClickRepository::new();

        links
            .expect_find_by_code()
            .times(2)
            .returning(|_| Ok(None));

        let inserts = AtomicUsize::new(0);
        links.expect_create().times(2).returning(move |new_link| {
            // A concurrent allocation wins the first insert.
            if inserts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::conflict(
                    "Unique constraint violation",
                    json!({ "constraint": "links_code_key" }),
                ))
            } else {
                Ok(test_link(1, &new_link.code, &new_link.long_url))
            }
        });

        let service = service(links, clicks);

        let result = service.create_link("https://example.com".to_string()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_link_duplicate_key_exhausts_budget() {
        let mut links = MockLinkRepository::new();
        let clicks = MockClickRepository::new();

        links.expect_find_by_code().times(5).returning(|_| Ok(None));
        links.expect_create().times(5).returning(|_| {
            Err(AppError::conflict("Unique constraint violation", json!({})))
        });

        let service = service(links, clicks);

        let result = service.create_link("https://example.com".to_string()).await;
        assert!(matches!(
            result.unwrap_err(),
            AppError::CodeSpaceExhausted { .. }
        ));
    }

    #[tokio::test]
    async fn test_create_link_store_error_aborts_immediately() {
        let mut links = MockLinkRepository::new();
        let clicks = MockClickRepository::new();

        links
            .expect_find_by_code()
            .times(1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));
        links.expect_create().times(0);

        let service = service(links, clicks);

        let result = service.create_link("https://example.com".to_string()).await;
        assert!(matches!(result.unwrap_err(), AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_create_link_invalid_url() {
        let links = MockLinkRepository::new();
        let clicks = MockClickRepository::new();

        let service = service(links, clicks);

        let result = service.create_link("not-a-url".to_string()).await;
        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_link_rejects_non_http_scheme() {
        let links = MockLinkRepository::new();
        let clicks = MockClickRepository::new();

        let service = service(links, clicks);

        let result = service.create_link("ftp://example.com/file".to_string()).await;
        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_get_link_by_code_found() {
        let mut links = MockLinkRepository::new();
        let clicks = MockClickRepository::new();

        links
            .expect_find_by_code()
            .withf(|code| code == "abc123")
            .times(1)
            .returning(|_| Ok(Some(test_link(1, "abc123", "https://example.com"))));

        let service = service(links, clicks);

        let link = service.get_link_by_code("abc123").await.unwrap();
        assert_eq!(link.long_url, "https://example.com");
    }

    #[tokio::test]
    async fn test_get_link_by_code_not_found() {
        let mut links = MockLinkRepository::new();
        let clicks = MockClickRepository::new();

        links.expect_find_by_code().times(1).returning(|_| Ok(None));

        let service = service(links, clicks);

        let result = service.get_link_by_code("missing").await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_link_stats_counts_clicks() {
        let mut links = MockLinkRepository::new();
        let mut clicks = MockClickRepository::new();

        links
            .expect_find_by_code()
            .times(1)
            .returning(|_| Ok(Some(test_link(7, "abc123", "https://example.com"))));

        clicks
            .expect_count_by_link_id()
            .withf(|&link_id| link_id == 7)
            .times(1)
            .returning(|_| Ok(3));

        let service = service(links, clicks);

        let (link, total) = service.get_link_stats("abc123").await.unwrap();
        assert_eq!(link.code, "abc123");
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_get_link_stats_not_found_counts_nothing() {
        let mut links = MockLinkRepository::new();
        let mut clicks = MockClickRepository::new();

        links.expect_find_by_code().times(1).returning(|_| Ok(None));
        clicks.expect_count_by_link_id().times(0);

        let service = service(links, clicks);

        let result = service.get_link_stats("missing").await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound { .. }));
    }

    #[test]
    fn test_full_short_url_trims_trailing_slash() {
        let service = service(MockLinkRepository::new(), MockClickRepository::new());

        assert_eq!(
            service.full_short_url("http://localhost:8080/", "abc123"),
            "http://localhost:8080/abc123"
        );
        assert_eq!(
            service.full_short_url("http://localhost:8080", "abc123"),
            "http://localhost:8080/abc123"
        );
    }
}
