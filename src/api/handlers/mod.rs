//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod links;
pub mod redirect;

pub use health::{health_handler, verify_handler};
pub use links::{
    create_link_handler, delete_link_handler, edit_link_handler, list_links_handler,
    query_link_handler, suggest_slug_handler,
};
pub use redirect::redirect_handler;
