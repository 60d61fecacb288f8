//! Link entity representing a slug to target URL mapping.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Length of the opaque record identifier.
const LINK_ID_LENGTH: usize = 12;

/// A stored short link.
///
/// The `slug` is the unique key; it is stored already normalized according to
/// the active case policy. `expires_at` is enforced on every resolution,
/// independently of any cache TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub id: String,
    pub slug: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl LinkRecord {
    /// Builds a fresh record for `slug` from creation input.
    pub fn new(slug: String, new_link: NewLink, now: DateTime<Utc>) -> Self {
        let id = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(LINK_ID_LENGTH)
            .map(char::from)
            .collect();

        Self {
            id,
            slug,
            url: new_link.url,
            comment: new_link.comment,
            title: new_link.title,
            created_at: now,
            updated_at: now,
            expires_at: new_link.expires_at,
        }
    }

    /// Returns true if the record has passed its expiry time at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, patch: LinkPatch, now: DateTime<Utc>) {
        if let Some(url) = patch.url {
            self.url = url;
        }
        if let Some(comment) = patch.comment {
            self.comment = comment;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(expires_at) = patch.expires_at {
            self.expires_at = expires_at;
        }
        self.updated_at = now;
    }
}

/// Input data for creating a new link. The slug is supplied separately,
/// either by the caller or by the generator.
#[derive(Debug, Clone, Default)]
pub struct NewLink {
    pub url: String,
    pub comment: Option<String>,
    pub title: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
/// `Some(None)` clears an optional field; `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub url: Option<String>,
    pub comment: Option<Option<String>>,
    pub title: Option<Option<String>>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_link(url: &str) -> NewLink {
        NewLink {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_link_creation() {
        let now = Utc::now();
        let link = LinkRecord::new("abc123".to_string(), new_link("https://example.com"), now);

        assert_eq!(link.slug, "abc123");
        assert_eq!(link.url, "https://example.com");
        assert_eq!(link.id.len(), LINK_ID_LENGTH);
        assert_eq!(link.created_at, now);
        assert_eq!(link.updated_at, now);
        assert!(!link.is_expired());
    }

    #[test]
    fn test_link_is_expired() {
        let now = Utc::now();
        let mut input = new_link("https://example.com");
        input.expires_at = Some(now - Duration::seconds(1));

        let link = LinkRecord::new("code".to_string(), input, now);
        assert!(link.is_expired());
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let mut input = new_link("https://example.com");
        input.expires_at = Some(now);

        let link = LinkRecord::new("code".to_string(), input, now);
        assert!(link.is_expired_at(now));
        assert!(!link.is_expired_at(now - Duration::milliseconds(1)));
    }

    #[test]
    fn test_apply_patch() {
        let created = Utc::now();
        let mut input = new_link("https://example.com");
        input.comment = Some("old".to_string());
        input.expires_at = Some(created + Duration::days(1));
        let mut link = LinkRecord::new("code".to_string(), input, created);

        let later = created + Duration::seconds(5);
        link.apply(
            LinkPatch {
                url: Some("https://rust-lang.org".to_string()),
                comment: Some(None),
                title: Some(Some("Rust".to_string())),
                expires_at: None,
            },
            later,
        );

        assert_eq!(link.url, "https://rust-lang.org");
        assert!(link.comment.is_none());
        assert_eq!(link.title.as_deref(), Some("Rust"));
        assert!(link.expires_at.is_some());
        assert_eq!(link.created_at, created);
        assert_eq!(link.updated_at, later);
    }

    #[test]
    fn test_json_uses_camel_case() {
        let link = LinkRecord::new("abc".to_string(), new_link("https://example.com"), Utc::now());
        let value = serde_json::to_value(&link).unwrap();

        assert!(value.get("createdAt").is_some());
        assert!(value.get("comment").is_none());

        let back: LinkRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, link);
    }
}
