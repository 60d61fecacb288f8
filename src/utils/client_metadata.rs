//! Client metadata extraction from HTTP request headers.

use crate::domain::entities::RequestMetadata;
use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Country code set by Cloudflare-style edge proxies.
const COUNTRY_HEADER: &str = "cf-ipcountry";
/// Autonomous system number forwarded by an upstream proxy.
const ASN_HEADER: &str = "x-asn";

/// Builds [`RequestMetadata`] from request headers and the peer address.
///
/// When `behind_proxy` is true the client IP is taken from
/// `CF-Connecting-IP`, `X-Real-IP` or the first `X-Forwarded-For` entry, in
/// that order, falling back to the peer address. Otherwise forwarded headers
/// are ignored.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert(header::USER_AGENT, "Mozilla/5.0".parse().unwrap());
///
/// let metadata = extract_client_metadata(&headers, None, false);
/// assert_eq!(metadata.user_agent.as_deref(), Some("Mozilla/5.0"));
/// ```
pub fn extract_client_metadata(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    behind_proxy: bool,
) -> RequestMetadata {
    let ip = if behind_proxy {
        forwarded_ip(headers).or(peer)
    } else {
        peer
    };

    RequestMetadata {
        user_agent: header_string(headers, header::USER_AGENT.as_str()),
        referrer: header_string(headers, header::REFERER.as_str()),
        ip: ip.map(|ip| ip.to_string()),
        country: header_string(headers, COUNTRY_HEADER).map(|c| c.to_ascii_uppercase()),
        asn: header_string(headers, ASN_HEADER),
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Client IP announced by a reverse proxy, if any.
pub fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    ["cf-connecting-ip", "x-real-ip"]
        .iter()
        .find_map(|name| header_string(headers, name).and_then(|v| v.parse().ok()))
        .or_else(|| {
            header_string(headers, "x-forwarded-for")
                .and_then(|v| v.split(',').next().and_then(|ip| ip.trim().parse().ok()))
        })
}
