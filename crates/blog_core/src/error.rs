//! Error taxonomy of the unit-of-work commit.

use crate::audit::ProviderError;
use crate::db::DbError;
use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a store operation.
///
/// Storage failures keep the original `DbError`; the store never retries or
/// reinterprets them.
#[derive(Debug)]
pub enum StoreError {
    /// Current-actor or clock provider failed; nothing was written.
    Provider(ProviderError),
    /// A pending entity failed validation; nothing was written.
    Validation(ValidationError),
    Db(DbError),
    /// Requested entity does not exist.
    NotFound { table: &'static str, key: String },
    /// An update or delete matched no row.
    ConcurrencyConflict { table: &'static str, key: String },
    /// The cancellation token fired; the transaction was rolled back.
    Cancelled,
    /// The blocking adapter could not start its runtime.
    Runtime(std::io::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { table, key } => write!(f, "{table} row not found: {key}"),
            Self::ConcurrencyConflict { table, key } => {
                write!(f, "no {table} row matched key `{key}`; it was changed or removed")
            }
            Self::Cancelled => write!(f, "commit cancelled"),
            Self::Runtime(err) => write!(f, "failed to start commit runtime: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Runtime(err) => Some(err),
            Self::NotFound { .. } | Self::ConcurrencyConflict { .. } | Self::Cancelled => None,
        }
    }
}

impl StoreError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Provider(_) => "provider_failed",
            Self::Validation(_) => "validation_failed",
            Self::Db(_) => "db_failed",
            Self::NotFound { .. } => "not_found",
            Self::ConcurrencyConflict { .. } => "concurrency_conflict",
            Self::Cancelled => "cancelled",
            Self::Runtime(_) => "runtime_failed",
        }
    }
}

impl From<ProviderError> for StoreError {
    fn from(value: ProviderError) -> Self {
        Self::Provider(value)
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
