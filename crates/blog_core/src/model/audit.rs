//! Auditable capability and provenance fields.
//!
//! # Invariants
//! - `created_by`/`created_on` are written once, by the commit that inserts
//!   the entity.
//! - `modified_by`/`modified_on` are written only by commits that update the
//!   entity.
//! - An absent actor leaves actor fields unset; no placeholder is stored.

use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Identifier of the principal on whose behalf an operation executes.
pub type ActorId = String;

/// Unix epoch milliseconds.
pub type EpochMillis = i64;

/// Column list shared by every auditable table, in `AuditFields` order.
pub(crate) const AUDIT_COLUMNS_SQL: &str = "created_by, created_on, modified_by, modified_on";

/// Creation and modification provenance of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    pub created_by: Option<ActorId>,
    pub created_on: EpochMillis,
    pub modified_by: Option<ActorId>,
    pub modified_on: Option<EpochMillis>,
}

impl AuditFields {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            created_by: row.get("created_by")?,
            created_on: row.get("created_on")?,
            modified_by: row.get("modified_by")?,
            modified_on: row.get("modified_on")?,
        })
    }

    /// Returns whether any commit has stamped a modification.
    pub fn is_modified(&self) -> bool {
        self.modified_on.is_some()
    }
}

/// Capability of entities that carry provenance fields.
///
/// Any entity type opts in independently by implementing this trait and
/// returning itself from `Entity::as_auditable_mut`.
pub trait Auditable {
    fn audit(&self) -> &AuditFields;
    fn audit_mut(&mut self) -> &mut AuditFields;
}
