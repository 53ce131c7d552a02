//! Blog domain model.
//!
//! # Responsibility
//! - Define the article/comment records persisted by the blog store.
//! - Define the auditable capability shared by content entities.
//!
//! # Invariants
//! - Every entity is identified by a stable primary key that is never reused.
//! - Entities are validated before they are written, never after.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod article;
pub mod audit;
pub mod comment;

/// Entity validation failure raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace only.
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { entity, field } => {
                write!(f, "{entity}.{field} must not be empty")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { entity, field });
    }
    Ok(())
}

pub(crate) fn parse_uuid_column(
    row: &rusqlite::Row<'_>,
    column: &str,
) -> rusqlite::Result<uuid::Uuid> {
    let text: String = row.get(column)?;
    uuid::Uuid::parse_str(&text).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            row.as_ref().column_index(column).unwrap_or_default(),
            rusqlite::types::Type::Text,
            Box::new(err),
        )
    })
}
