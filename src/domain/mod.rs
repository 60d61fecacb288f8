//! Domain layer containing business entities and capability contracts.
//!
//! This module defines entities and the traits the engine depends on,
//! independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Storage capability traits (key-value store, analytics sink)
//! - [`providers`] - External service traits (completion, bot classification)
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Capability traits define contracts implemented by the infrastructure layer
//! - Orchestration lives in services (see [`crate::application::services`])
//!
//! # Resolution Flow
//!
//! 1. HTTP handler hands the slug to the redirect resolver
//! 2. The resolver consults the cache, then the link store on a miss
//! 3. An [`entities::AnalyticsEvent`] is enqueued without waiting
//! 4. The analytics worker delivers batches to an [`repositories::AnalyticsSink`]

pub mod entities;
pub mod providers;
pub mod repositories;
