//! Business logic services for the application layer.

pub mod analytics_recorder;
pub mod link_service;
pub mod link_store;
pub mod redirect_resolver;
pub mod slug_generator;

pub use analytics_recorder::AnalyticsRecorder;
pub use link_service::{CreateLink, LinkService};
pub use link_store::{CreateOutcome, LINK_KEY_PREFIX, LinkPage, LinkStore};
pub use redirect_resolver::{RedirectInstruction, RedirectResolver, ResolveRequest};
pub use slug_generator::{GenerationMode, SlugGenerator};
