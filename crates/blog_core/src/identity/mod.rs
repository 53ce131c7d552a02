//! Identity subsystem consumed by the blog store.
//!
//! # Responsibility
//! - Own the user table and the base unit-of-work commit.
//! - Register identity configurations ahead of any application list.
//!
//! # Invariants
//! - Users are not auditable; commits never stamp provenance on them.
//! - Token and grant storage of the identity provider lives elsewhere.

mod store;
mod user;

pub use store::{IdentityStore, IDENTITY_CONFIGURATIONS};
pub use user::{User, UserConfiguration};
