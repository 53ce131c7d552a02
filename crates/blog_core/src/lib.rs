//! Persistence core for the blog application.
//!
//! Articles and comments are tracked in a request-scoped unit of work that
//! wraps the identity store. Every commit stamps creation and modification
//! provenance on auditable entities before the durable write.

pub mod audit;
pub mod cancel;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod tracking;

pub use audit::{
    AnonymousActor, AuditInterceptor, AuditSummary, Clock, CurrentActor, ManualActor, ManualClock,
    ProviderError, SystemClock,
};
pub use cancel::CancellationToken;
pub use config::{ConfigError, DatabaseLocation, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use identity::{IdentityStore, User};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::article::{Article, ArticleId};
pub use model::audit::{ActorId, AuditFields, Auditable, EpochMillis};
pub use model::comment::{Comment, CommentId};
pub use model::ValidationError;
pub use service::article_service::ArticleService;
pub use store::{BlogStore, BLOG_CONFIGURATIONS};
pub use tracking::{ChangeTracker, Entity, EntityState, EntryKey, PendingChange};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
