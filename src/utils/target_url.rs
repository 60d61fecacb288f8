//! Target URL utilities.
//!
//! Ensures consistent target URL representation at creation time and merges
//! inbound query strings into targets at redirect time.

use url::{Url, form_urlencoded};

/// Errors that can occur during URL normalization.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("Failed to normalize URL: {0}")]
    NormalizationFailed(String),
}

/// Normalizes a target URL to a canonical form before it is stored.
///
/// # Normalization Rules
///
/// 1. **Protocol**: Only HTTP and HTTPS are allowed
/// 2. **Hostname**: Converted to lowercase
/// 3. **Default ports**: Removed (80 for HTTP, 443 for HTTPS)
/// 4. **Fragments**: Removed (e.g., `#section`)
/// 5. **Query parameters**: Preserved as-is
/// 6. **Path**: Preserved with case sensitivity
///
/// # Security
///
/// Rejects potentially dangerous protocols like `javascript:`, `data:`, `file:`, etc.
///
/// # Errors
///
/// Returns [`UrlNormalizationError::InvalidFormat`] for malformed URLs.
/// Returns [`UrlNormalizationError::UnsupportedProtocol`] for non-HTTP(S) schemes.
///
/// # Examples
///
/// ```ignore
/// // Case normalization
/// assert_eq!(
///     normalize_url("HTTPS://EXAMPLE.COM/Path").unwrap(),
///     "https://example.com/Path"
/// );
///
/// // Default port removal
/// assert_eq!(
///     normalize_url("https://example.com:443/path").unwrap(),
///     "https://example.com/path"
/// );
///
/// // Fragment removal
/// assert_eq!(
///     normalize_url("https://example.com/page#section").unwrap(),
///     "https://example.com/page"
/// );
/// ```
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let mut url =
        Url::parse(input).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlNormalizationError::UnsupportedProtocol),
    }

    if let Some(host) = url.host_str() {
        let host_lowercase = host.to_ascii_lowercase();
        url.set_host(Some(&host_lowercase)).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to set normalized host".to_string())
        })?;
    }

    url.set_fragment(None);

    let is_default_port = matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    );
    if is_default_port {
        url.set_port(None).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to remove default port".to_string())
        })?;
    }

    Ok(url.to_string())
}

/// Merges an inbound query string into a stored target URL.
///
/// Parameters already present on the target are overridden by inbound
/// parameters with the same name; all others are appended in order.
/// An empty or absent query returns the target unchanged.
pub fn merge_query(target: &str, query: Option<&str>) -> String {
    let query = match query.map(|q| q.trim_start_matches('?')) {
        Some(q) if !q.is_empty() => q,
        _ => return target.to_string(),
    };

    let Ok(mut url) = Url::parse(target) else {
        let separator = if target.contains('?') { '&' } else { '?' };
        return format!("{target}{separator}{query}");
    };

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value.into_owned(),
            None => pairs.push((key.into_owned(), value.into_owned())),
        }
    }

    if pairs.is_empty() {
        return target.to_string();
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}
