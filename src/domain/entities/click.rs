//! Click entity representing a single persisted redirect.

use chrono::{DateTime, Utc};

/// A click recorded when a shortened link was accessed.
///
/// The durable form of a click event: owns a generated identifier and
/// references its link by id, never by an embedded value.
#[derive(Debug, Clone, PartialEq)]
pub struct Click {
    pub id: i64,
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

impl Click {
    /// Creates a new Click instance.
    ///
    /// Client metadata is optional to handle cases where headers are missing
    /// or the client address could not be determined.
    pub fn new(
        id: i64,
        link_id: i64,
        clicked_at: DateTime<Utc>,
        user_agent: Option<String>,
        ip: Option<String>,
    ) -> Self {
        Self {
            id,
            link_id,
            clicked_at,
            user_agent,
            ip,
        }
    }
}

/// Input data for recording a new click.
///
/// The `link_id` must reference an existing link.
#[derive(Debug, Clone)]
pub struct NewClick {
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_click_creation_with_all_fields() {
        let now = Utc::now();
        let click = Click::new(
            1,
            42,
            now,
            Some("Mozilla/5.0".to_string()),
            Some("192.168.1.1".to_string()),
        );

        assert_eq!(click.id, 1);
        assert_eq!(click.link_id, 42);
        assert_eq!(click.clicked_at, now);
        assert_eq!(click.user_agent, Some("Mozilla/5.0".to_string()));
        assert_eq!(click.ip, Some("192.168.1.1".to_string()));
    }

    #[test]
    fn test_click_creation_minimal() {
        let click = Click::new(1, 10, Utc::now(), None, None);

        assert_eq!(click.link_id, 10);
        assert!(click.user_agent.is_none());
        assert!(click.ip.is_none());
    }

    #[test]
    fn test_new_click_creation() {
        let new_click = NewClick {
            link_id: 99,
            clicked_at: Utc::now(),
            user_agent: Some("Chrome/120".to_string()),
            ip: Some("10.0.0.1".to_string()),
        };

        assert_eq!(new_click.link_id, 99);
        assert!(new_click.user_agent.is_some());
        assert!(new_click.ip.is_some());
    }
}
