//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::api::middleware::auth::SiteToken;
use crate::application::services::{
    AnalyticsRecorder, LinkService, LinkStore, RedirectResolver, SlugGenerator,
};
use crate::config::Config;
use crate::domain::providers::{BotClassifier, CompletionProvider};
use crate::domain::repositories::KvStore;
use crate::infrastructure::cache::LinkCache;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<RedirectResolver>,
    pub link_service: Arc<LinkService>,
    pub link_store: Arc<LinkStore>,
    pub cache: Arc<dyn LinkCache>,
    pub recorder: AnalyticsRecorder,
    pub site_token: Arc<SiteToken>,
    pub preview_mode: bool,
    pub behind_proxy: bool,
}

impl AppState {
    /// Wires the engine from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured slug pattern does not compile.
    pub fn new(
        config: &Config,
        kv: Arc<dyn KvStore>,
        cache: Arc<dyn LinkCache>,
        completion: Arc<dyn CompletionProvider>,
        classifier: Arc<dyn BotClassifier>,
        recorder: AnalyticsRecorder,
    ) -> anyhow::Result<Self> {
        let policy = Arc::new(config.slug_policy()?);

        let link_store = Arc::new(LinkStore::new(
            kv,
            cache.clone(),
            policy.clone(),
            config.list_query_limit,
        ));

        let generator = Arc::new(SlugGenerator::new(
            link_store.clone(),
            completion,
            policy.clone(),
            config.generation_settings(),
        ));

        let resolver = Arc::new(RedirectResolver::new(
            link_store.clone(),
            cache.clone(),
            classifier,
            recorder.clone(),
            policy,
            config.redirect_settings(),
        ));

        let link_service = Arc::new(LinkService::new(link_store.clone(), generator));

        Ok(Self {
            resolver,
            link_service,
            link_store,
            cache,
            recorder,
            site_token: Arc::new(SiteToken::new(&config.site_token)),
            preview_mode: config.preview_mode,
            behind_proxy: config.behind_proxy,
        })
    }
}
