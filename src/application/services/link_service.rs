//! Link management service behind the `/api/link/*` endpoints.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use super::link_store::{CreateOutcome, LinkPage, LinkStore};
use super::slug_generator::{GenerationMode, SlugGenerator};
use crate::domain::entities::{LinkPatch, LinkRecord, NewLink};
use crate::domain::repositories::KvStore;
use crate::error::AppError;
use crate::utils::target_url::normalize_url;

/// Input for [`LinkService::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    pub url: String,
    /// Caller-chosen slug; generated when absent.
    pub slug: Option<String>,
    pub comment: Option<String>,
    pub title: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub mode: GenerationMode,
}

/// Service for creating, editing and listing links.
///
/// Handles URL normalization, slug validation and generation. Every
/// user-supplied slug goes through the same policy as generated ones.
pub struct LinkService<K: KvStore + ?Sized = dyn KvStore> {
    store: Arc<LinkStore<K>>,
    generator: Arc<SlugGenerator<K>>,
}

fn normalize_target(url: &str) -> Result<String, AppError> {
    normalize_url(url).map_err(|e| {
        AppError::bad_request(
            "Invalid URL format",
            json!({ "field": "url", "reason": e.to_string() }),
        )
    })
}

fn check_expiry(expires_at: Option<DateTime<Utc>>) -> Result<(), AppError> {
    match expires_at {
        Some(at) if at <= Utc::now() => Err(AppError::bad_request(
            "Expiration must be in the future",
            json!({ "field": "expiresAt" }),
        )),
        _ => Ok(()),
    }
}

impl<K: KvStore + ?Sized> LinkService<K> {
    /// Creates a new link service.
    pub fn new(store: Arc<LinkStore<K>>, generator: Arc<SlugGenerator<K>>) -> Self {
        Self { store, generator }
    }

    /// Creates a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an invalid URL or past expiry,
    /// [`AppError::MalformedSlug`] / [`AppError::ReservedSlug`] for a rejected
    /// slug, [`AppError::SlugAlreadyExists`] if the slug is taken, and
    /// [`AppError::GenerationExhausted`] if no free slug could be generated.
    pub async fn create(&self, input: CreateLink) -> Result<LinkRecord, AppError> {
        let url = normalize_target(&input.url)?;
        check_expiry(input.expires_at)?;

        let new_link = NewLink {
            url,
            comment: input.comment,
            title: input.title,
            expires_at: input.expires_at,
        };

        let Some(candidate) = input.slug else {
            return self.generator.create_link(new_link, input.mode).await;
        };

        let slug = self.store.policy().check(&candidate)?;
        let record = LinkRecord::new(slug.clone(), new_link, Utc::now());

        match self.store.create_if_absent(record).await? {
            CreateOutcome::Created(record) => Ok(record),
            CreateOutcome::AlreadyExists => Err(AppError::SlugAlreadyExists { slug }),
        }
    }

    /// Retrieves a link by slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live link has this slug.
    pub async fn get(&self, slug: &str) -> Result<LinkRecord, AppError> {
        self.store
            .get(slug)
            .await?
            .filter(|record| !record.is_expired())
            .ok_or_else(|| AppError::NotFound {
                slug: slug.to_string(),
            })
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the slug does not exist and
    /// [`AppError::Validation`] for an invalid URL.
    pub async fn update(&self, slug: &str, mut patch: LinkPatch) -> Result<LinkRecord, AppError> {
        if let Some(url) = patch.url.as_deref() {
            patch.url = Some(normalize_target(url)?);
        }
        if let Some(expires_at) = patch.expires_at {
            check_expiry(expires_at)?;
        }

        self.store
            .update(slug, patch)
            .await?
            .ok_or_else(|| AppError::NotFound {
                slug: slug.to_string(),
            })
    }

    /// Deletes a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if there was nothing to delete.
    pub async fn delete(&self, slug: &str) -> Result<(), AppError> {
        if self.store.delete(slug).await? {
            Ok(())
        } else {
            Err(AppError::NotFound {
                slug: slug.to_string(),
            })
        }
    }

    /// Lists links in slug order.
    pub async fn list(
        &self,
        cursor: Option<String>,
        limit: Option<usize>,
    ) -> Result<LinkPage, AppError> {
        Ok(self.store.list(cursor, limit).await?)
    }

    /// Suggests a slug for a URL without reserving it.
    ///
    /// Falls back to a random slug when the completion service is unavailable.
    pub async fn suggest(&self, url: &str) -> Result<String, AppError> {
        let url = normalize_target(url)?;
        self.generator.generate(&url, GenerationMode::Assisted).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::providers::MockCompletionProvider;
    use crate::error::CompletionError;
    use crate::infrastructure::cache::MokaLinkCache;
    use crate::infrastructure::persistence::MemoryKvStore;
    use chrono::Duration;

    fn service() -> LinkService<MemoryKvStore> {
        let config = Config::default();
        let policy = Arc::new(config.slug_policy().unwrap());
        let store = Arc::new(LinkStore::new(
            Arc::new(MemoryKvStore::new()),
            Arc::new(MokaLinkCache::new(config.cache_settings())),
            policy.clone(),
            config.list_query_limit,
        ));

        let mut completion = MockCompletionProvider::new();
        completion
            .expect_complete()
            .returning(|_, _| Err(CompletionError::Disabled));

        let generator = Arc::new(SlugGenerator::new(
            store.clone(),
            Arc::new(completion),
            policy,
            config.generation_settings(),
        ));

        LinkService::new(store, generator)
    }

    fn create_input(url: &str, slug: Option<&str>) -> CreateLink {
        CreateLink {
            url: url.to_string(),
            slug: slug.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_with_custom_slug() {
        let service = service();

        let record = service
            .create(create_input("HTTPS://Example.COM/Path#frag", Some("My-Link")))
            .await
            .unwrap();

        assert_eq!(record.slug, "my-link");
        assert_eq!(record.url, "https://example.com/Path");
    }

    #[tokio::test]
    async fn test_create_distinguishes_rejections() {
        let service = service();

        let malformed = service
            .create(create_input("https://example.com", Some("bad slug")))
            .await;
        assert!(matches!(malformed, Err(AppError::MalformedSlug { .. })));

        let reserved = service
            .create(create_input("https://example.com", Some("dashboard")))
            .await;
        assert!(matches!(reserved, Err(AppError::ReservedSlug { .. })));

        service
            .create(create_input("https://example.com", Some("taken")))
            .await
            .unwrap();
        let duplicate = service
            .create(create_input("https://example.org", Some("TAKEN")))
            .await;
        assert!(matches!(duplicate, Err(AppError::SlugAlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_url_and_past_expiry() {
        let service = service();

        let bad_url = service
            .create(create_input("javascript:alert(1)", None))
            .await;
        assert!(matches!(bad_url, Err(AppError::Validation { .. })));

        let mut input = create_input("https://example.com", None);
        input.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(matches!(
            service.create(input).await,
            Err(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_generated_slug_when_absent() {
        let service = service();

        let mut input = create_input("https://example.com", None);
        input.mode = GenerationMode::Assisted;
        let record = service.create(input).await.unwrap();

        assert_eq!(record.slug.len(), 6);
        assert_eq!(service.get(&record.slug).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = service();
        service
            .create(create_input("https://example.com", Some("edit-me")))
            .await
            .unwrap();

        let updated = service
            .update(
                "edit-me",
                LinkPatch {
                    url: Some("https://rust-lang.org/learn".to_string()),
                    title: Some(Some("Learn".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.url, "https://rust-lang.org/learn");
        assert_eq!(updated.title.as_deref(), Some("Learn"));

        service.delete("edit-me").await.unwrap();
        assert!(matches!(
            service.get("edit-me").await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete("edit-me").await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            service.update("edit-me", LinkPatch::default()).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_suggest_falls_back_to_random() {
        let slug = service().suggest("https://example.com").await.unwrap();
        assert_eq!(slug.len(), 6);
    }
}
