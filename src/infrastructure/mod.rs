//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for storage, caching and outbound services.
//!
//! # Modules
//!
//! - [`cache`] - Link cache (moka and Redis implementations)
//! - [`persistence`] - Key-value stores and analytics sinks
//! - [`providers`] - Completion client and bot classifier

pub mod cache;
pub mod persistence;
pub mod providers;
