//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use sha2::{Digest, Sha256};

use crate::{error::AppError, state::AppState};

/// The configured site token, kept only as its SHA-256 digest.
///
/// Candidates are hashed before comparison so the comparison time does not
/// depend on how many leading bytes of the token were guessed.
pub struct SiteToken {
    digest: [u8; 32],
}

impl SiteToken {
    pub fn new(token: &str) -> Self {
        Self {
            digest: Sha256::digest(token.as_bytes()).into(),
        }
    }

    pub fn verify(&self, candidate: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        candidate == self.digest
    }

    /// Returns true if the headers carry `Authorization: Bearer <token>`
    /// with a valid token.
    pub fn authorizes(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| self.verify(token.trim()))
    }
}

/// Authenticates requests using the site token from the Authorization header.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// Returns `401 Unauthorized` if the header is missing, malformed or carries
/// the wrong token. Adds `WWW-Authenticate: Bearer` to 401 responses per RFC 6750.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, routing::get, middleware};
/// use crate::api::middleware::auth;
///
/// let protected = Router::new()
///     .route("/api/link/list", get(list_links_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                serde_json::json!({"reason": "Authorization header is missing or invalid"}),
            )
        })?;

    if !st.site_token.verify(&token) {
        tracing::warn!("Rejected request with invalid site token");
        return Err(AppError::unauthorized(
            "Unauthorized",
            serde_json::json!({"reason": "Invalid token"}),
        ));
    }

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_verify() {
        let token = SiteToken::new("s3cret");
        assert!(token.verify("s3cret"));
        assert!(!token.verify("s3cre"));
        assert!(!token.verify(""));
    }

    #[test]
    fn test_authorizes_bearer_header() {
        let token = SiteToken::new("s3cret");
        let mut headers = HeaderMap::new();
        assert!(!token.authorizes(&headers));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic s3cret"));
        assert!(!token.authorizes(&headers));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert!(token.authorizes(&headers));
    }
}
