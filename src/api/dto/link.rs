//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use validator::Validate;

use crate::application::services::{CreateLink, GenerationMode};
use crate::domain::entities::LinkPatch;

const MAX_URL_LENGTH: u64 = 4096;
const MAX_SLUG_LENGTH: u64 = 128;
const MAX_TEXT_LENGTH: u64 = 2048;

/// Request body for `POST /api/link/create`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    #[validate(url(message = "Invalid URL format"), length(max = MAX_URL_LENGTH))]
    pub url: String,

    /// Custom slug. Checked against the slug policy, not here.
    #[validate(length(min = 1, max = MAX_SLUG_LENGTH))]
    pub slug: Option<String>,

    #[validate(length(max = MAX_TEXT_LENGTH))]
    pub comment: Option<String>,

    #[validate(length(max = MAX_TEXT_LENGTH))]
    pub title: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,

    /// How to pick a slug when none is given.
    #[serde(default)]
    pub generation: GenerationMode,
}

impl From<CreateLinkRequest> for CreateLink {
    fn from(req: CreateLinkRequest) -> Self {
        Self {
            url: req.url,
            slug: req.slug,
            comment: req.comment,
            title: req.title,
            expires_at: req.expires_at,
            mode: req.generation,
        }
    }
}

/// Request body for `PUT /api/link/edit`.
///
/// Only provided fields change. For `comment`, `title` and `expiresAt`:
///
/// - **Absent** → leave existing value unchanged
/// - **`null`** → clear
/// - **Value** → set
#[serde_as]
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditLinkRequest {
    #[validate(length(min = 1, max = MAX_SLUG_LENGTH))]
    pub slug: String,

    #[validate(url(message = "Invalid URL format"), length(max = MAX_URL_LENGTH))]
    pub url: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub comment: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub title: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl EditLinkRequest {
    /// Splits the request into the target slug and the patch to apply.
    pub fn into_patch(self) -> (String, LinkPatch) {
        (
            self.slug,
            LinkPatch {
                url: self.url,
                comment: self.comment,
                title: self.title,
                expires_at: self.expires_at,
            },
        )
    }
}

/// Request body for `POST /api/link/delete`.
#[derive(Debug, Deserialize, Validate)]
pub struct DeleteLinkRequest {
    #[validate(length(min = 1, max = MAX_SLUG_LENGTH))]
    pub slug: String,
}

/// Query string for `GET /api/link/query`.
#[derive(Debug, Deserialize, Validate)]
pub struct SlugQuery {
    #[validate(length(min = 1, max = MAX_SLUG_LENGTH))]
    pub slug: String,
}

/// Query string for `GET /api/link/ai`.
#[derive(Debug, Deserialize, Validate)]
pub struct SuggestQuery {
    #[validate(url(message = "Invalid URL format"), length(max = MAX_URL_LENGTH))]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub slug: String,
}
