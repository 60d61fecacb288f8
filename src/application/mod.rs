//! Application layer services implementing the engine.
//!
//! This layer composes the capability traits from the domain layer into the
//! resolution and creation paths. Services take their collaborators and an
//! immutable settings value at construction.
//!
//! # Available Services
//!
//! - [`services::link_store::LinkStore`] - Link records over a key-value store
//! - [`services::slug_generator::SlugGenerator`] - Random and assisted slugs
//! - [`services::redirect_resolver::RedirectResolver`] - Slug resolution
//! - [`services::analytics_recorder::AnalyticsRecorder`] - Click event queue
//! - [`services::link_service::LinkService`] - Link management API

pub mod services;
