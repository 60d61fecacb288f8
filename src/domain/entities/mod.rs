//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`LinkRecord`] - A stored slug to URL mapping
//! - [`AnalyticsEvent`] - A served redirect, destined for the analytics sink
//! - [`RequestMetadata`], [`TrustLevel`], [`Classification`] - Per-request context
//!
//! # Design Pattern
//!
//! Creation and updates use separate input types:
//! - `NewLink` - For creating new records
//! - `LinkPatch` - For partial updates

pub mod analytics_event;
pub mod link;
pub mod request;

pub use analytics_event::AnalyticsEvent;
pub use link::{LinkPatch, LinkRecord, NewLink};
pub use request::{Classification, RequestMetadata, TrustLevel};
