//! Handlers for link management endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::link::{
    CreateLinkRequest, DeleteLinkRequest, EditLinkRequest, SlugQuery, SuggestQuery,
    SuggestResponse,
};
use crate::api::dto::list::{ListQuery, ListResponse};
use crate::domain::entities::LinkRecord;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a link.
///
/// # Endpoint
///
/// `POST /api/link/create`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com",
///   "slug": "my-link",          // optional
///   "comment": "launch post",   // optional
///   "expiresAt": "2030-01-01T00:00:00Z", // optional
///   "generation": "assisted"    // optional: "random" (default) | "assisted"
/// }
/// ```
///
/// # Errors
///
/// - 400 for an invalid URL, a malformed or reserved slug, or a past expiry
/// - 409 if the slug is already taken
/// - 500 if no free slug could be generated
pub async fn create_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkRecord>), AppError> {
    payload.validate()?;

    let record = state.link_service.create(payload.into()).await?;

    tracing::info!(slug = %record.slug, "Link created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// Returns the link stored under a slug.
///
/// # Endpoint
///
/// `GET /api/link/query?slug=<slug>`
///
/// # Errors
///
/// Returns 404 if the slug does not exist or has expired.
pub async fn query_link_handler(
    State(state): State<AppState>,
    Query(query): Query<SlugQuery>,
) -> Result<Json<LinkRecord>, AppError> {
    query.validate()?;

    let record = state.link_service.get(&query.slug).await?;
    Ok(Json(record))
}

/// Partially updates a link.
///
/// # Endpoint
///
/// `PUT /api/link/edit`
///
/// # Errors
///
/// Returns 404 if the slug does not exist and 400 for invalid fields.
pub async fn edit_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<EditLinkRequest>,
) -> Result<Json<LinkRecord>, AppError> {
    payload.validate()?;

    let (slug, patch) = payload.into_patch();
    let record = state.link_service.update(&slug, patch).await?;

    tracing::info!(slug = %record.slug, "Link updated");
    Ok(Json(record))
}

/// Deletes a link.
///
/// # Endpoint
///
/// `POST /api/link/delete`
///
/// # Errors
///
/// Returns 404 if there was nothing to delete.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<DeleteLinkRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    state.link_service.delete(&payload.slug).await?;

    tracing::info!(slug = %payload.slug, "Link deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Lists links in slug order with cursor pagination.
///
/// # Endpoint
///
/// `GET /api/link/list?cursor=<cursor>&limit=<n>`
///
/// # Response
///
/// ```json
/// {
///   "links": [ { "slug": "abc", "url": "https://example.com", ... } ],
///   "cursor": "abc",
///   "listComplete": false
/// }
/// ```
pub async fn list_links_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let page = state.link_service.list(query.cursor, query.limit).await?;
    Ok(Json(page.into()))
}

/// Suggests a slug for a URL without reserving it.
///
/// # Endpoint
///
/// `GET /api/link/ai?url=<url>`
///
/// Uses the completion service when configured and falls back to a random
/// slug otherwise, so this endpoint never fails on completion errors.
pub async fn suggest_slug_handler(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> Result<Json<SuggestResponse>, AppError> {
    query.validate()?;

    let slug = state.link_service.suggest(&query.url).await?;
    Ok(Json(SuggestResponse { slug }))
}
