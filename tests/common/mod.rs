#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, extract::ConnectInfo, middleware, routing::get};
use axum_test::TestServer;
use chrono::Utc;
use parking_lot::Mutex;
use slug_engine::api;
use slug_engine::api::handlers::{health_handler, redirect_handler};
use slug_engine::api::middleware::auth;
use slug_engine::application::services::AnalyticsRecorder;
use slug_engine::config::Config;
use slug_engine::domain::entities::{AnalyticsEvent, LinkRecord, NewLink};
use slug_engine::domain::providers::CompletionProvider;
use slug_engine::domain::repositories::{AnalyticsSink, KvStore, PutOptions};
use slug_engine::error::{CompletionError, SinkError};
use slug_engine::infrastructure::cache::MokaLinkCache;
use slug_engine::infrastructure::persistence::MemoryKvStore;
use slug_engine::infrastructure::providers::WootheeBotClassifier;
use slug_engine::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::Layer;

pub const TEST_TOKEN: &str = "test-site-token";

/// Inserts a fixed peer address, as `into_make_service_with_connect_info` would.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

/// Sink that keeps every written event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().clone()
    }

    /// Waits up to one second for at least `count` events to be written.
    pub async fn wait_for(&self, count: usize) -> Vec<AnalyticsEvent> {
        for _ in 0..50 {
            if self.events.lock().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.events()
    }
}

#[async_trait]
impl AnalyticsSink for RecordingSink {
    async fn write(&self, events: &[AnalyticsEvent]) -> Result<(), SinkError> {
        self.events.lock().extend_from_slice(events);
        Ok(())
    }
}

/// Completion backend that always answers with the same text.
pub struct StaticCompletion(pub Result<String, ()>);

#[async_trait]
impl CompletionProvider for StaticCompletion {
    async fn complete(&self, _system_prompt: &str, _input: &str) -> Result<String, CompletionError> {
        self.0
            .clone()
            .map_err(|_| CompletionError::Request("connection refused".to_string()))
    }
}

pub fn test_config() -> Config {
    Config {
        site_token: TEST_TOKEN.to_string(),
        analytics_batch_size: 1,
        analytics_flush_interval: Duration::from_millis(20),
        ..Config::default()
    }
}

pub struct TestApp {
    pub state: AppState,
    pub kv: Arc<MemoryKvStore>,
    pub sink: Arc<RecordingSink>,
}

impl TestApp {
    /// Writes a link straight into the key-value store, bypassing the cache.
    pub async fn seed_link(&self, slug: &str, url: &str) -> LinkRecord {
        let record = LinkRecord::new(
            slug.to_string(),
            NewLink {
                url: url.to_string(),
                ..Default::default()
            },
            Utc::now(),
        );
        self.kv
            .put(
                &format!("link:{}", slug),
                serde_json::to_string(&record).unwrap(),
                PutOptions::default(),
            )
            .await
            .unwrap();
        record
    }
}

pub fn create_test_app(config: Config) -> TestApp {
    create_test_app_with_completion(config, StaticCompletion(Err(())))
}

pub fn create_test_app_with_completion(config: Config, completion: StaticCompletion) -> TestApp {
    let kv = Arc::new(MemoryKvStore::new());
    let sink = Arc::new(RecordingSink::default());

    let (recorder, _worker) = AnalyticsRecorder::spawn(sink.clone(), config.analytics_settings());

    let state = AppState::new(
        &config,
        kv.clone(),
        Arc::new(MokaLinkCache::new(config.cache_settings())),
        Arc::new(completion),
        Arc::new(WootheeBotClassifier),
        recorder,
    )
    .unwrap();

    TestApp { state, kv, sink }
}

/// Full route tree without rate limiting.
pub fn test_router(state: AppState) -> Router {
    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/{slug}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .layer(MockConnectInfoLayer)
        .with_state(state)
}

pub fn test_server(app: &TestApp) -> TestServer {
    TestServer::new(test_router(app.state.clone())).unwrap()
}

pub fn bearer() -> String {
    format!("Bearer {}", TEST_TOKEN)
}
