//! DTOs for the link listing endpoint.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::application::services::LinkPage;
use crate::domain::entities::LinkRecord;

/// Cursor pagination query parameters.
///
/// Uses `serde_with` to parse the limit from the query string as an integer.
/// The limit is clamped to the configured maximum by the store.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub cursor: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<usize>,
}

/// One page of links.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub links: Vec<LinkRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub list_complete: bool,
}

impl From<LinkPage> for ListResponse {
    fn from(page: LinkPage) -> Self {
        Self {
            links: page.links,
            cursor: page.cursor,
            list_complete: page.list_complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_wire_names() {
        let response = ListResponse::from(LinkPage {
            links: vec![],
            cursor: None,
            list_complete: true,
        });
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["listComplete"], true);
        assert!(value.get("cursor").is_none());
    }
}
