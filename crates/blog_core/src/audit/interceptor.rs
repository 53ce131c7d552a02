//! Pre-commit audit interceptor.

use crate::audit::{Clock, CurrentActor, ProviderError};
use crate::tracking::{EntityState, PendingChange};
use log::debug;

/// Counts of entities stamped by one interceptor pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub created: usize,
    pub modified: usize,
}

/// Stateless stamping policy, constructed fresh for each commit.
pub struct AuditInterceptor<'a> {
    current_actor: &'a dyn CurrentActor,
    clock: &'a dyn Clock,
}

impl<'a> AuditInterceptor<'a> {
    pub fn new(current_actor: &'a dyn CurrentActor, clock: &'a dyn Clock) -> Self {
        Self {
            current_actor,
            clock,
        }
    }

    /// Stamps provenance on `changes` in place.
    ///
    /// - `Added`: `created_by` only when unset, `created_on` always.
    /// - `Modified`: `modified_by` and `modified_on` always.
    /// - `Deleted`/`Unchanged`: untouched.
    ///
    /// Both providers are read once, and only when something needs a stamp,
    /// so a provider failure returns before any field changes.
    pub fn apply(&self, changes: &mut [PendingChange<'_>]) -> Result<AuditSummary, ProviderError> {
        let mut summary = AuditSummary::default();
        let needs_stamp = changes
            .iter()
            .any(|change| matches!(change.kind, EntityState::Added | EntityState::Modified));
        if !needs_stamp {
            return Ok(summary);
        }

        let actor = self.current_actor.actor_id()?;
        let now = self.clock.now()?;

        for change in changes.iter_mut() {
            let audit = change.entity.audit_mut();
            match change.kind {
                EntityState::Added => {
                    if audit.created_by.is_none() {
                        audit.created_by = actor.clone();
                    }
                    audit.created_on = now;
                    summary.created += 1;
                }
                EntityState::Modified => {
                    audit.modified_by = actor.clone();
                    audit.modified_on = Some(now);
                    summary.modified += 1;
                }
                EntityState::Deleted | EntityState::Unchanged => {}
            }
        }

        debug!(
            "event=audit_apply module=audit status=ok created={} modified={} anonymous={}",
            summary.created,
            summary.modified,
            actor.is_none()
        );
        Ok(summary)
    }
}
