//! Handlers for health check and token verification endpoints.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse, VerifyResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Store**: Probes the key-value store with a read
/// 2. **Cache**: Backend ping (always ok for the in-process cache)
/// 3. **Analytics queue**: Checks the worker is running and reports depth
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "store": { "status": "ok", "message": "Reachable" },
///     "cache": { "status": "ok", "message": "Reachable" },
///     "analytics_queue": { "status": "ok", "message": "Depth: 0 / 10000" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store = if state.link_store.health_check().await {
        CheckStatus::ok("Reachable")
    } else {
        CheckStatus::error("Store unreachable")
    };

    let cache = if state.cache.health_check().await {
        CheckStatus::ok("Reachable")
    } else {
        CheckStatus::error("Cache unreachable")
    };

    let analytics_queue = if state.recorder.is_running() {
        CheckStatus::ok(format!(
            "Depth: {} / {}",
            state.recorder.queue_depth(),
            state.recorder.queue_capacity()
        ))
    } else {
        CheckStatus::error("Analytics worker stopped")
    };

    let all_healthy = store.is_ok() && cache.is_ok() && analytics_queue.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            store,
            cache,
            analytics_queue,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Confirms that the caller's site token is valid.
///
/// # Endpoint
///
/// `GET /api/verify`
///
/// Authentication is enforced by the API middleware, so reaching this
/// handler means the token was accepted.
pub async fn verify_handler() -> Json<VerifyResponse> {
    Json(VerifyResponse { valid: true })
}
