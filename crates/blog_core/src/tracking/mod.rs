//! Unit-of-work change tracking.
//!
//! # Responsibility
//! - Own every entity loaded into or added to one store instance.
//! - Record a mutation kind per entity until the next successful commit.
//! - Expose auditable entries, by capability, to the audit interceptor.
//!
//! # Invariants
//! - Entries iterate in tracking order, so commit writes are deterministic.
//! - Mutable access to an `Unchanged` entry marks it `Modified`.
//! - Removing an `Added` entry detaches it; nothing is ever written for it.

use crate::model::audit::{AuditFields, Auditable};
use crate::model::ValidationError;
use rusqlite::Connection;
use std::any::Any;
use std::collections::BTreeMap;

/// Mutation kind of one tracked entity since the last commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    Added,
    Modified,
    Deleted,
    Unchanged,
}

impl EntityState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Persistable entity owned by a change tracker.
///
/// Implementations describe how a single row is written; the tracker decides
/// which of `insert`, `update` or `delete` runs on commit.
pub trait Entity: Any + Send + Sync {
    /// Storage table of this entity.
    fn table(&self) -> &'static str;

    /// Primary key, as stored in the table's `id` column.
    fn key(&self) -> String;

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize>;

    fn update(&self, conn: &Connection) -> rusqlite::Result<usize>;

    fn delete(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", self.table()),
            [self.key()],
        )
    }

    /// Auditable capability probe. Entities without provenance keep `None`.
    fn as_auditable(&self) -> Option<&dyn Auditable> {
        None
    }

    fn as_auditable_mut(&mut self) -> Option<&mut dyn Auditable> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Handle to one tracked entry, valid for the lifetime of its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey(u64);

/// Auditable entity paired with its mutation kind for one commit.
pub struct PendingChange<'a> {
    pub kind: EntityState,
    pub entity: &'a mut dyn Auditable,
}

/// Audit fields captured before a commit, used to undo stamps on failure.
#[derive(Debug, Clone, Default)]
pub struct AuditSnapshot {
    fields: Vec<(EntryKey, AuditFields)>,
}

impl AuditSnapshot {
    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }
}

struct TrackedEntry {
    state: EntityState,
    entity: Box<dyn Entity>,
}

/// Tracks entity mutations for one unit of work.
#[derive(Default)]
pub struct ChangeTracker {
    entries: BTreeMap<EntryKey, TrackedEntry>,
    next_key: u64,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a new entity that will be inserted on commit.
    pub fn add<T: Entity>(&mut self, entity: T) -> EntryKey {
        self.track(Box::new(entity), EntityState::Added)
    }

    /// Starts tracking an entity that already exists in storage.
    pub fn attach<T: Entity>(&mut self, entity: T) -> EntryKey {
        self.track(Box::new(entity), EntityState::Unchanged)
    }

    fn track(&mut self, entity: Box<dyn Entity>, state: EntityState) -> EntryKey {
        let key = EntryKey(self.next_key);
        self.next_key += 1;
        self.entries.insert(key, TrackedEntry { state, entity });
        key
    }

    pub fn get<T: Entity>(&self, key: EntryKey) -> Option<&T> {
        self.entries
            .get(&key)
            .and_then(|entry| entry.entity.as_any().downcast_ref::<T>())
    }

    /// Returns the entity for mutation and marks an `Unchanged` entry
    /// `Modified`. `Added` and `Deleted` entries keep their state.
    pub fn get_mut<T: Entity>(&mut self, key: EntryKey) -> Option<&mut T> {
        let entry = self.entries.get_mut(&key)?;
        let entity = entry.entity.as_any_mut().downcast_mut::<T>()?;
        if entry.state == EntityState::Unchanged {
            entry.state = EntityState::Modified;
        }
        Some(entity)
    }

    /// Schedules deletion. Returns `false` when the key is not tracked.
    pub fn remove(&mut self, key: EntryKey) -> bool {
        let Some(entry) = self.entries.get_mut(&key) else {
            return false;
        };
        match entry.state {
            EntityState::Added => {
                self.entries.remove(&key);
            }
            EntityState::Modified | EntityState::Unchanged => {
                entry.state = EntityState::Deleted;
            }
            EntityState::Deleted => {}
        }
        true
    }

    /// Stops tracking an entry whatever its state; nothing is written for it.
    ///
    /// A later load of the same row attaches a fresh copy from storage.
    pub fn detach(&mut self, key: EntryKey) -> bool {
        self.entries.remove(&key).is_some()
    }

    pub fn state(&self, key: EntryKey) -> Option<EntityState> {
        self.entries.get(&key).map(|entry| entry.state)
    }

    /// Finds a tracked entry by table and primary key (identity map).
    pub fn find(&self, table: &str, primary_key: &str) -> Option<EntryKey> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.entity.table() == table && entry.entity.key() == primary_key)
            .map(|(key, _)| *key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_changes(&self) -> bool {
        self.entries
            .values()
            .any(|entry| entry.state != EntityState::Unchanged)
    }

    /// Enumerates every tracked auditable entity with its mutation kind.
    ///
    /// Non-auditable entities are skipped, whatever their state.
    pub fn auditable_changes(&mut self) -> Vec<PendingChange<'_>> {
        self.entries
            .values_mut()
            .filter_map(|entry| {
                let kind = entry.state;
                entry
                    .entity
                    .as_auditable_mut()
                    .map(|entity| PendingChange { kind, entity })
            })
            .collect()
    }

    pub fn snapshot_audit(&self) -> AuditSnapshot {
        let fields = self
            .entries
            .iter()
            .filter_map(|(key, entry)| {
                entry
                    .entity
                    .as_auditable()
                    .map(|auditable| (*key, auditable.audit().clone()))
            })
            .collect();
        AuditSnapshot { fields }
    }

    pub fn restore_audit(&mut self, snapshot: AuditSnapshot) {
        for (key, fields) in snapshot.fields {
            let auditable = self
                .entries
                .get_mut(&key)
                .and_then(|entry| entry.entity.as_auditable_mut());
            if let Some(auditable) = auditable {
                *auditable.audit_mut() = fields;
            }
        }
    }

    /// Entities that need a write, in tracking order.
    pub fn pending(&self) -> impl Iterator<Item = (EntityState, &dyn Entity)> + '_ {
        self.entries
            .values()
            .filter(|entry| entry.state != EntityState::Unchanged)
            .map(|entry| (entry.state, entry.entity.as_ref()))
    }

    /// Marks all writes durable: added/modified become unchanged and deleted
    /// entries are detached.
    pub fn accept_all_changes(&mut self) {
        self.entries
            .retain(|_, entry| entry.state != EntityState::Deleted);
        for entry in self.entries.values_mut() {
            entry.state = EntityState::Unchanged;
        }
    }
}
