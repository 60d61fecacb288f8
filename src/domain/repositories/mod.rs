//! Storage-facing capability traits for the domain layer.
//!
//! These traits abstract the durable collaborators of the engine. They are
//! implemented in `crate::infrastructure::persistence`; mock implementations
//! are auto-generated via `mockall` for unit tests.
//!
//! # Available Capabilities
//!
//! - [`KvStore`] - Key-value storage with conditional writes
//! - [`AnalyticsSink`] - Click event destination

pub mod analytics_sink;
pub mod kv_store;

pub use analytics_sink::AnalyticsSink;
pub use kv_store::{KeyPage, KvStore, PutCondition, PutOptions, PutOutcome};

#[cfg(test)]
pub use analytics_sink::MockAnalyticsSink;
#[cfg(test)]
pub use kv_store::MockKvStore;
