//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    create_link_handler, delete_link_handler, edit_link_handler, list_links_handler,
    query_link_handler, suggest_slug_handler, verify_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// All API routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `POST /link/create`  - Create a link (custom or generated slug)
/// - `GET  /link/query`   - Fetch a link by slug
/// - `PUT  /link/edit`    - Partially update a link
/// - `POST /link/delete`  - Delete a link
/// - `GET  /link/list`    - List links with cursor pagination
/// - `GET  /link/ai`      - Suggest a slug for a URL
/// - `GET  /verify`       - Check the site token
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/link/create", post(create_link_handler))
        .route("/link/query", get(query_link_handler))
        .route("/link/edit", put(edit_link_handler))
        .route("/link/delete", post(delete_link_handler))
        .route("/link/list", get(list_links_handler))
        .route("/link/ai", get(suggest_slug_handler))
        .route("/verify", get(verify_handler))
}
