//! Content use-case services.
//!
//! # Responsibility
//! - Turn single user actions into one committed unit of work each.
//! - Keep callers decoupled from tracking and commit details.

pub mod article_service;
