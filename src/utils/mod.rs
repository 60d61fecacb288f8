//! Utility functions for slug handling, URL processing, and request handling.
//!
//! - [`slug`] - Slug policy, validation and random generation
//! - [`target_url`] - Target URL normalization and query merging
//! - [`client_metadata`] - Client metadata extraction from HTTP headers

pub mod client_metadata;
pub mod slug;
pub mod target_url;
