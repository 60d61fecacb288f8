//! Rate limiting middleware using token bucket algorithm.

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_governor::{
    GovernorError, GovernorLayer, governor::GovernorConfigBuilder, key_extractor::KeyExtractor,
};

use crate::utils::client_metadata::forwarded_ip;

/// Keys the rate limiter by client IP.
///
/// Forwarded headers are only consulted when the service runs behind a
/// trusted reverse proxy; otherwise the socket peer address is used.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor {
    behind_proxy: bool,
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let ip = if self.behind_proxy {
            forwarded_ip(req.headers()).or(peer)
        } else {
            peer
        };

        ip.ok_or(GovernorError::UnableToExtractKey)
    }
}

type ClientIpGovernor =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn build(per_second: u64, burst_size: u32, behind_proxy: bool) -> ClientIpGovernor {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(per_second)
            .burst_size(burst_size)
            .key_extractor(ClientIpKeyExtractor { behind_proxy })
            .finish()
            .expect("rate limit quota is non-zero"),
    );

    GovernorLayer::new(governor_conf)
}

/// Creates a rate limiter for public endpoints.
///
/// # Limits
///
/// - **Rate**: 50 requests per second
/// - **Burst**: 200 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/{slug}", get(redirect_handler))
///     .layer(rate_limit::layer(config.behind_proxy));
/// ```
pub fn layer(behind_proxy: bool) -> ClientIpGovernor {
    build(50, 200, behind_proxy)
}

/// Creates a stricter rate limiter for authenticated endpoints.
///
/// # Limits
///
/// - **Rate**: 1 request per second
/// - **Burst**: 10 requests
///
/// Used for the link management API.
pub fn secure_layer(behind_proxy: bool) -> ClientIpGovernor {
    build(1, 10, behind_proxy)
}
