//! Slug resolution: cache, store, expiry, redirect and analytics hand-off.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use tracing::{debug, warn};

use super::analytics_recorder::AnalyticsRecorder;
use super::link_store::LinkStore;
use crate::config::RedirectSettings;
use crate::domain::entities::{AnalyticsEvent, LinkRecord, RequestMetadata, TrustLevel};
use crate::domain::providers::BotClassifier;
use crate::domain::repositories::KvStore;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheLookup, LinkCache};
use crate::utils::slug::SlugPolicy;
use crate::utils::target_url::merge_query;

/// One inbound resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub slug: String,
    /// Raw query string of the inbound request, without the leading `?`.
    pub query: Option<String>,
    pub trust: TrustLevel,
    pub metadata: RequestMetadata,
}

/// What the HTTP layer should answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectInstruction {
    pub target: String,
    pub status: u16,
}

/// Answers "given this slug, where do I send the caller".
///
/// Reserved and cached-absent slugs never reach the store. Expiry is checked
/// on every record regardless of whether it came from the cache or the
/// store. Analytics are enqueued without waiting.
pub struct RedirectResolver<K: KvStore + ?Sized = dyn KvStore> {
    store: Arc<LinkStore<K>>,
    cache: Arc<dyn LinkCache>,
    classifier: Arc<dyn BotClassifier>,
    recorder: AnalyticsRecorder,
    policy: Arc<SlugPolicy>,
    settings: RedirectSettings,
}

impl<K: KvStore + ?Sized> RedirectResolver<K> {
    pub fn new(
        store: Arc<LinkStore<K>>,
        cache: Arc<dyn LinkCache>,
        classifier: Arc<dyn BotClassifier>,
        recorder: AnalyticsRecorder,
        policy: Arc<SlugPolicy>,
        settings: RedirectSettings,
    ) -> Self {
        Self {
            store,
            cache,
            classifier,
            recorder,
            policy,
            settings,
        }
    }

    /// Resolves a slug to a redirect.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotRedirectable`] for reserved slugs
    /// - [`AppError::NotFound`] for absent, malformed or expired slugs
    /// - [`AppError::StoreUnavailable`] if the store cannot be read
    pub async fn resolve(&self, request: ResolveRequest) -> Result<RedirectInstruction, AppError> {
        let result = self.resolve_inner(request).await;
        let outcome = match &result {
            Ok(_) => "redirect",
            Err(AppError::NotFound { .. }) => "not_found",
            Err(AppError::NotRedirectable { .. }) => "not_redirectable",
            Err(_) => "error",
        };
        counter!("redirects_total", "outcome" => outcome).increment(1);
        result
    }

    async fn resolve_inner(
        &self,
        request: ResolveRequest,
    ) -> Result<RedirectInstruction, AppError> {
        let slug = self.policy.normalize(&request.slug).into_owned();

        if self.policy.is_reserved(&slug) {
            return Err(AppError::NotRedirectable { slug });
        }

        // Nothing outside the pattern can have been created.
        if self.policy.validate(&slug).is_err() {
            return Err(AppError::NotFound { slug });
        }

        let record = self.lookup(&slug, request.trust).await?;

        if record.is_expired_at(Utc::now()) {
            debug!("Link {} expired", slug);
            if let Err(e) = self.cache.invalidate(&slug).await {
                warn!("Cache invalidation failed for {}: {}", slug, e);
            }
            return Err(AppError::NotFound { slug });
        }

        let target = if self.settings.with_query {
            merge_query(&record.url, request.query.as_deref())
        } else {
            record.url.clone()
        };

        self.emit(record, request.metadata);

        Ok(RedirectInstruction {
            target,
            status: self.settings.status_code,
        })
    }

    /// Cache first, then the store, populating the cache on the way back.
    async fn lookup(&self, slug: &str, trust: TrustLevel) -> Result<LinkRecord, AppError> {
        let cached = self.cache.lookup(slug, trust).await.unwrap_or_else(|e| {
            warn!("Cache lookup failed for {}: {}", slug, e);
            CacheLookup::Miss
        });
        counter!("cache_lookups_total", "result" => cached.as_label()).increment(1);

        match cached {
            CacheLookup::Hit(record) => Ok(record),
            CacheLookup::NegativeHit => Err(AppError::NotFound {
                slug: slug.to_string(),
            }),
            CacheLookup::Miss => match self.store.get(slug).await? {
                Some(record) => {
                    if let Err(e) = self.cache.store(slug, &record, trust).await {
                        warn!("Cache population failed for {}: {}", slug, e);
                    }
                    Ok(record)
                }
                None => {
                    if let Err(e) = self.cache.store_absent(slug).await {
                        warn!("Negative cache population failed for {}: {}", slug, e);
                    }
                    Err(AppError::NotFound {
                        slug: slug.to_string(),
                    })
                }
            },
        }
    }

    fn emit(&self, record: LinkRecord, metadata: RequestMetadata) {
        let classification = self.classifier.classify(&metadata);

        if classification.is_bot() && self.settings.disable_bot_access_log {
            return;
        }

        let event = AnalyticsEvent::new(
            record.slug,
            record.url,
            metadata,
            classification,
            Utc::now(),
        );
        self.recorder.record(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::entities::{Classification, NewLink};
    use crate::domain::providers::MockBotClassifier;
    use crate::domain::repositories::{MockAnalyticsSink, MockKvStore};
    use crate::error::StoreError;
    use crate::infrastructure::cache::{MockLinkCache, MokaLinkCache};
    use crate::infrastructure::persistence::MemoryKvStore;
    use chrono::Duration;
    use parking_lot::Mutex;

    struct Harness {
        resolver: RedirectResolver<MemoryKvStore>,
        store: Arc<LinkStore<MemoryKvStore>>,
        events: Arc<Mutex<Vec<AnalyticsEvent>>>,
    }

    fn policy() -> Arc<SlugPolicy> {
        Arc::new(Config::default().slug_policy().unwrap())
    }

    fn recorder(events: Arc<Mutex<Vec<AnalyticsEvent>>>) -> AnalyticsRecorder {
        let mut sink = MockAnalyticsSink::new();
        sink.expect_write().returning(move |batch| {
            events.lock().extend_from_slice(batch);
            Ok(())
        });
        let settings = crate::config::AnalyticsSettings {
            batch_size: 1,
            flush_interval: std::time::Duration::from_millis(10),
            ..Config::default().analytics_settings()
        };
        AnalyticsRecorder::spawn(Arc::new(sink), settings).0
    }

    fn classifier(classification: Classification) -> Arc<dyn BotClassifier> {
        let mut classifier = MockBotClassifier::new();
        classifier
            .expect_classify()
            .returning(move |_| classification);
        Arc::new(classifier)
    }

    fn harness(settings: RedirectSettings, classification: Classification) -> Harness {
        let kv = Arc::new(MemoryKvStore::new());
        let cache: Arc<dyn LinkCache> =
            Arc::new(MokaLinkCache::new(Config::default().cache_settings()));
        let store = Arc::new(LinkStore::new(kv, cache.clone(), policy(), 500));
        let events = Arc::new(Mutex::new(Vec::new()));

        let resolver = RedirectResolver::new(
            store.clone(),
            cache,
            classifier(classification),
            recorder(events.clone()),
            policy(),
            settings,
        );

        Harness {
            resolver,
            store,
            events,
        }
    }

    fn default_settings() -> RedirectSettings {
        Config::default().redirect_settings()
    }

    fn request(slug: &str) -> ResolveRequest {
        ResolveRequest {
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    async fn create(store: &LinkStore<MemoryKvStore>, slug: &str, url: &str) -> LinkRecord {
        let record = LinkRecord::new(
            slug.to_string(),
            NewLink {
                url: url.to_string(),
                ..Default::default()
            },
            Utc::now(),
        );
        store.create_if_absent(record.clone()).await.unwrap();
        record
    }

    async fn wait_for_events(events: &Mutex<Vec<AnalyticsEvent>>, count: usize) {
        for _ in 0..100 {
            if events.lock().len() >= count {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_resolves_created_link() {
        let h = harness(default_settings(), Classification::Human);
        create(&h.store, "rust", "https://rust-lang.org").await;

        let instruction = h.resolver.resolve(request("rust")).await.unwrap();

        assert_eq!(instruction.target, "https://rust-lang.org");
        assert_eq!(instruction.status, 301);
    }

    #[tokio::test]
    async fn test_case_insensitive_resolution() {
        let h = harness(default_settings(), Classification::Human);
        create(&h.store, "rust", "https://rust-lang.org").await;

        assert!(h.resolver.resolve(request("RUST")).await.is_ok());
    }

    #[tokio::test]
    async fn test_reserved_slug_is_not_redirectable() {
        let mut cache = MockLinkCache::new();
        cache.expect_lookup().never();
        let mut kv = MockKvStore::new();
        kv.expect_get().never();

        let cache: Arc<dyn LinkCache> = Arc::new(cache);
        let store = Arc::new(LinkStore::new(Arc::new(kv), cache.clone(), policy(), 500));
        let resolver = RedirectResolver::new(
            store,
            cache,
            classifier(Classification::Human),
            recorder(Arc::new(Mutex::new(Vec::new()))),
            policy(),
            default_settings(),
        );

        let result = resolver.resolve(request("Dashboard")).await;
        assert!(matches!(result, Err(AppError::NotRedirectable { .. })));
    }

    #[tokio::test]
    async fn test_negative_hit_skips_store() {
        let mut cache = MockLinkCache::new();
        cache
            .expect_lookup()
            .returning(|_, _| Ok(CacheLookup::NegativeHit));
        let mut kv = MockKvStore::new();
        kv.expect_get().never();

        let cache: Arc<dyn LinkCache> = Arc::new(cache);
        let store = Arc::new(LinkStore::new(Arc::new(kv), cache.clone(), policy(), 500));
        let resolver = RedirectResolver::new(
            store,
            cache,
            classifier(Classification::Human),
            recorder(Arc::new(Mutex::new(Vec::new()))),
            policy(),
            default_settings(),
        );

        let result = resolver.resolve(request("missing")).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_miss_populates_negative_cache() {
        let mut cache = MockLinkCache::new();
        cache.expect_lookup().returning(|_, _| Ok(CacheLookup::Miss));
        cache
            .expect_store_absent()
            .times(1)
            .returning(|_| Ok(()));
        let mut kv = MockKvStore::new();
        kv.expect_get().times(1).returning(|_| Ok(None));

        let cache: Arc<dyn LinkCache> = Arc::new(cache);
        let store = Arc::new(LinkStore::new(Arc::new(kv), cache.clone(), policy(), 500));
        let resolver = RedirectResolver::new(
            store,
            cache,
            classifier(Classification::Human),
            recorder(Arc::new(Mutex::new(Vec::new()))),
            policy(),
            default_settings(),
        );

        let result = resolver.resolve(request("missing")).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let mut cache = MockLinkCache::new();
        cache.expect_lookup().returning(|_, _| Ok(CacheLookup::Miss));
        let mut kv = MockKvStore::new();
        kv.expect_get()
            .returning(|_| Err(StoreError::Backend("connection refused".to_string())));

        let cache: Arc<dyn LinkCache> = Arc::new(cache);
        let store = Arc::new(LinkStore::new(Arc::new(kv), cache.clone(), policy(), 500));
        let resolver = RedirectResolver::new(
            store,
            cache,
            classifier(Classification::Human),
            recorder(Arc::new(Mutex::new(Vec::new()))),
            policy(),
            default_settings(),
        );

        let result = resolver.resolve(request("abc")).await;
        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_expired_cached_record_is_not_found_and_evicted() {
        let mut record = LinkRecord::new(
            "soon".to_string(),
            NewLink {
                url: "https://example.com".to_string(),
                ..Default::default()
            },
            Utc::now() - Duration::minutes(5),
        );
        record.expires_at = Some(Utc::now() - Duration::seconds(1));

        let mut cache = MockLinkCache::new();
        cache
            .expect_lookup()
            .returning(move |_, _| Ok(CacheLookup::Hit(record.clone())));
        cache
            .expect_invalidate()
            .withf(|slug| slug == "soon")
            .times(1)
            .returning(|_| Ok(()));
        let mut kv = MockKvStore::new();
        kv.expect_get().never();

        let cache: Arc<dyn LinkCache> = Arc::new(cache);
        let store = Arc::new(LinkStore::new(Arc::new(kv), cache.clone(), policy(), 500));
        let resolver = RedirectResolver::new(
            store,
            cache,
            classifier(Classification::Human),
            recorder(Arc::new(Mutex::new(Vec::new()))),
            policy(),
            default_settings(),
        );

        let result = resolver.resolve(request("soon")).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_query_is_merged_when_enabled() {
        let settings = RedirectSettings {
            with_query: true,
            status_code: 302,
            ..default_settings()
        };
        let h = harness(settings, Classification::Human);
        create(&h.store, "page", "https://example.com/page").await;

        let instruction = h
            .resolver
            .resolve(ResolveRequest {
                query: Some("ref=abc".to_string()),
                ..request("page")
            })
            .await
            .unwrap();

        assert_eq!(instruction.target, "https://example.com/page?ref=abc");
        assert_eq!(instruction.status, 302);
    }

    #[tokio::test]
    async fn test_query_is_ignored_when_disabled() {
        let h = harness(default_settings(), Classification::Human);
        create(&h.store, "page", "https://example.com/page").await;

        let instruction = h
            .resolver
            .resolve(ResolveRequest {
                query: Some("ref=abc".to_string()),
                ..request("page")
            })
            .await
            .unwrap();

        assert_eq!(instruction.target, "https://example.com/page");
    }

    #[tokio::test]
    async fn test_analytics_emitted_for_humans() {
        let h = harness(default_settings(), Classification::Human);
        create(&h.store, "rust", "https://rust-lang.org").await;

        h.resolver.resolve(request("rust")).await.unwrap();
        wait_for_events(&h.events, 1).await;

        let events = h.events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].slug, "rust");
        assert!(!events[0].is_bot);
    }

    #[tokio::test]
    async fn test_bot_analytics_skipped_when_disabled() {
        let settings = RedirectSettings {
            disable_bot_access_log: true,
            ..default_settings()
        };
        let h = harness(settings, Classification::Bot);
        create(&h.store, "rust", "https://rust-lang.org").await;

        h.resolver.resolve(request("rust")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert!(h.events.lock().is_empty());
    }

    #[tokio::test]
    async fn test_bot_analytics_recorded_by_default() {
        let h = harness(default_settings(), Classification::Bot);
        create(&h.store, "rust", "https://rust-lang.org").await;

        h.resolver.resolve(request("rust")).await.unwrap();
        wait_for_events(&h.events, 1).await;

        assert!(h.events.lock()[0].is_bot);
    }

    #[tokio::test]
    async fn test_recreated_slug_resolves_after_negative_entry() {
        let h = harness(default_settings(), Classification::Human);

        let missing = h.resolver.resolve(request("later")).await;
        assert!(matches!(missing, Err(AppError::NotFound { .. })));

        create(&h.store, "later", "https://example.com/later").await;

        let instruction = h.resolver.resolve(request("later")).await.unwrap();
        assert_eq!(instruction.target, "https://example.com/later");
    }
}
