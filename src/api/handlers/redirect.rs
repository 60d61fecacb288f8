//! Handler for slug redirects.

use axum::{
    extract::{ConnectInfo, Path, Request, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::application::services::ResolveRequest;
use crate::domain::entities::TrustLevel;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_metadata::extract_client_metadata;

/// Redirects a slug to its target URL.
///
/// # Endpoint
///
/// `GET /{slug}`
///
/// # Request Flow
///
/// 1. Classify the caller's trust level
/// 2. Collect client metadata (user agent, referrer, IP, country)
/// 3. Resolve through cache and store
/// 4. Answer with the configured redirect status and a `Location` header
///
/// # Trust Level
///
/// With `PREVIEW_MODE` enabled, requests that do not carry a valid site
/// token are resolved at preview trust and see shorter cache lifetimes.
///
/// # Errors
///
/// Returns 404 Not Found for absent, expired, malformed or reserved slugs,
/// and 503 Service Unavailable if the store cannot be read.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    let (parts, _body) = request.into_parts();
    let headers = &parts.headers;
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let trust = if state.preview_mode && !state.site_token.authorizes(headers) {
        TrustLevel::Preview
    } else {
        TrustLevel::Standard
    };

    let resolve = ResolveRequest {
        slug,
        query: parts.uri.query().map(str::to_string),
        trust,
        metadata: extract_client_metadata(headers, peer, state.behind_proxy),
    };

    let instruction = state.resolver.resolve(resolve).await?;
    redirect_response(&instruction.target, instruction.status)
}

fn redirect_response(target: &str, status: u16) -> Result<Response, AppError> {
    let location = HeaderValue::from_str(target).map_err(|_| {
        AppError::StoreUnavailable(format!("stored target is not a valid header: {}", target))
    })?;
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::MOVED_PERMANENTLY);

    Ok((status, [(header::LOCATION, location)]).into_response())
}
