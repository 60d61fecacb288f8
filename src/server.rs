//! HTTP server initialization and runtime setup.
//!
//! Selects the capability implementations from configuration, spawns the
//! analytics worker, and runs the Axum server until shutdown.

use crate::application::services::AnalyticsRecorder;
use crate::config::Config;
use crate::domain::providers::CompletionProvider;
use crate::domain::repositories::{AnalyticsSink, KvStore};
use crate::infrastructure::cache::{LinkCache, MokaLinkCache, RedisLinkCache};
use crate::infrastructure::persistence::{
    LogAnalyticsSink, MemoryKvStore, PgAnalyticsSink, PgKvStore,
};
use crate::infrastructure::providers::{DisabledCompletion, WootheeBotClassifier, WorkersAiClient};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Key-value store: PostgreSQL (with migrations) or in-memory
/// - Analytics sink: PostgreSQL click table or structured log
/// - Cache: Redis, falling back to the in-process Moka cache
/// - Completion client for assisted slug generation (if configured)
/// - Background analytics worker
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let (kv, sink) = build_storage(&config).await?;
    let cache = build_cache(&config).await;
    let completion = build_completion(&config);

    let (recorder, worker) = AnalyticsRecorder::spawn(sink, config.analytics_settings());
    tracing::info!("Analytics worker started");

    let state = AppState::new(
        &config,
        kv,
        cache,
        completion,
        Arc::new(WootheeBotClassifier),
        recorder,
    )?;

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Every recorder handle is gone with the router; the worker drains and exits.
    if let Err(e) = worker.await {
        tracing::error!("Analytics worker terminated abnormally: {}", e);
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn build_storage(config: &Config) -> Result<(Arc<dyn KvStore>, Arc<dyn AnalyticsSink>)> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set, using in-memory store; links are lost on restart");
        return Ok((Arc::new(MemoryKvStore::new()), Arc::new(LogAnalyticsSink)));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let pool = Arc::new(pool);
    Ok((
        Arc::new(PgKvStore::new(pool.clone())),
        Arc::new(PgAnalyticsSink::new(pool)),
    ))
}

async fn build_cache(config: &Config) -> Arc<dyn LinkCache> {
    if let Some(redis_url) = &config.redis_url {
        match RedisLinkCache::connect(redis_url, config.cache_settings()).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                return Arc::new(redis);
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using in-process cache.", e);
            }
        }
    } else {
        tracing::info!("Cache enabled (in-process)");
    }

    Arc::new(MokaLinkCache::new(config.cache_settings()))
}

fn build_completion(config: &Config) -> Arc<dyn CompletionProvider> {
    let (Some(endpoint), Some(token)) = (&config.ai_endpoint, &config.ai_api_token) else {
        tracing::info!("Assisted slug generation disabled");
        return Arc::new(DisabledCompletion);
    };

    match WorkersAiClient::new(endpoint, &config.ai_model, token.clone(), config.ai_timeout) {
        Ok(client) => {
            tracing::info!(model = %config.ai_model, "Assisted slug generation enabled");
            Arc::new(client)
        }
        Err(e) => {
            tracing::warn!("Failed to build completion client: {}. Falling back to random slugs.", e);
            Arc::new(DisabledCompletion)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
