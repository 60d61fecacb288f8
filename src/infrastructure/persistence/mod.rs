//! Storage backend implementations.
//!
//! Concrete implementations of the domain capability traits. PostgreSQL
//! backends use SQLx runtime queries; in-memory and log backends need no
//! external service.
//!
//! # Backends
//!
//! - [`PgKvStore`] - Link storage in the `kv_entries` table
//! - [`MemoryKvStore`] - Link storage in an in-process ordered map
//! - [`PgAnalyticsSink`] - Click events in the `link_clicks` table
//! - [`LogAnalyticsSink`] - Click events as structured log lines

pub mod log_analytics_sink;
pub mod memory_kv_store;
pub mod pg_analytics_sink;
pub mod pg_kv_store;

pub use log_analytics_sink::LogAnalyticsSink;
pub use memory_kv_store::MemoryKvStore;
pub use pg_analytics_sink::PgAnalyticsSink;
pub use pg_kv_store::PgKvStore;
