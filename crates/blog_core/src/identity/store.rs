//! Base unit of work over the identity database.
//!
//! # Responsibility
//! - Register identity tables, then the caller's registration list.
//! - Persist all pending tracked changes in one SQLite transaction.
//!
//! # Invariants
//! - A failed or cancelled commit leaves storage untouched and tracking
//!   states unchanged.
//! - Cancellation is checked before every statement and before `COMMIT`.
//! - Deletes run first, dependents before the tables they reference, so a
//!   delete never finds its row already removed by `ON DELETE CASCADE`.

use crate::cancel::CancellationToken;
use crate::db::{register_models, ModelConfiguration};
use crate::error::{StoreError, StoreResult};
use crate::identity::user::{User, UserConfiguration, USER_TABLE};
use crate::tracking::{ChangeTracker, Entity, EntityState, EntryKey};
use log::{debug, error, info, warn};
use rusqlite::{Connection, Row};
use std::cmp::Reverse;
use std::time::Instant;

/// Identity configurations, applied before any application configuration.
pub const IDENTITY_CONFIGURATIONS: &[&dyn ModelConfiguration] = &[&UserConfiguration];

/// Change-tracking store owning the connection and the base commit.
pub struct IdentityStore {
    conn: Connection,
    tracker: ChangeTracker,
    /// Registered table names, referenced tables before dependents.
    table_order: Vec<&'static str>,
}

impl IdentityStore {
    /// Creates a store and runs the one-time model registration hook.
    ///
    /// `configurations` are registered after the identity tables, in order.
    pub fn new(
        mut conn: Connection,
        configurations: &[&dyn ModelConfiguration],
    ) -> StoreResult<Self> {
        let registration: Vec<&dyn ModelConfiguration> = IDENTITY_CONFIGURATIONS
            .iter()
            .chain(configurations.iter())
            .copied()
            .collect();
        register_models(&mut conn, &registration)?;

        Ok(Self {
            conn,
            tracker: ChangeTracker::new(),
            table_order: registration.iter().map(|config| config.name()).collect(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }

    /// Loads a user and tracks it as `Unchanged`.
    pub fn find_user(&mut self, id: &str) -> StoreResult<Option<EntryKey>> {
        self.load_one(
            USER_TABLE,
            id,
            "SELECT id, user_name, email FROM users WHERE id = ?1;",
            User::from_row,
        )
    }

    /// Loads one row by primary key, reusing the tracked entry if present.
    pub(crate) fn load_one<T: Entity>(
        &mut self,
        table: &str,
        key: &str,
        sql: &str,
        parse: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> StoreResult<Option<EntryKey>> {
        if let Some(existing) = self.tracker.find(table, key) {
            return Ok(Some(existing));
        }

        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => {
                let entity = parse(row)?;
                Ok(Some(self.tracker.attach(entity)))
            }
            None => Ok(None),
        }
    }

    /// Loads every row matching one bound parameter, tracked-entry aware.
    pub(crate) fn load_many<T: Entity>(
        &mut self,
        sql: &str,
        param: &str,
        parse: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> StoreResult<Vec<EntryKey>> {
        let loaded = {
            let mut stmt = self.conn.prepare(sql)?;
            let rows = stmt.query_map([param], parse)?;
            rows.collect::<rusqlite::Result<Vec<T>>>()?
        };

        let keys = loaded
            .into_iter()
            .map(|entity| match self.tracker.find(entity.table(), &entity.key()) {
                Some(existing) => existing,
                None => self.tracker.attach(entity),
            })
            .collect();
        Ok(keys)
    }

    /// Writes every pending change atomically and returns affected rows.
    ///
    /// # Errors
    /// - `Validation` before any statement runs.
    /// - `Cancelled` when `cancel` fires before `COMMIT`.
    /// - `ConcurrencyConflict` when an update/delete matches no row.
    /// - `Db` for any SQLite failure, unchanged.
    pub async fn save_changes(&mut self, cancel: &CancellationToken) -> StoreResult<usize> {
        if !self.tracker.has_changes() {
            debug!("event=store_commit module=identity status=skip reason=no_changes");
            return Ok(0);
        }
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        for (state, entity) in self.tracker.pending() {
            if matches!(state, EntityState::Added | EntityState::Modified) {
                entity.validate()?;
            }
        }

        let started_at = Instant::now();
        self.conn.execute_batch("BEGIN IMMEDIATE;")?;

        let writes = write_plan(&self.tracker, &self.table_order);
        let outcome = match write_pending(&mut self.conn, writes, cancel).await {
            Ok(affected) => self
                .conn
                .execute_batch("COMMIT;")
                .map(|()| affected)
                .map_err(StoreError::from),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(affected) => {
                self.tracker.accept_all_changes();
                info!(
                    "event=store_commit module=identity status=ok affected={} duration_ms={}",
                    affected,
                    started_at.elapsed().as_millis()
                );
                Ok(affected)
            }
            Err(err) => {
                if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK;") {
                    error!(
                        "event=store_commit module=identity status=error error_code=rollback_failed error={}",
                        rollback_err
                    );
                }
                warn!(
                    "event=store_commit module=identity status=error duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }
}

/// Orders pending writes: deletes in reverse registration order, then
/// inserts and updates in tracking order.
fn write_plan<'a>(
    tracker: &'a ChangeTracker,
    table_order: &[&'static str],
) -> Vec<(EntityState, &'a dyn Entity)> {
    let rank = |table: &str| {
        table_order
            .iter()
            .position(|name| *name == table)
            .unwrap_or(table_order.len())
    };

    let mut writes: Vec<_> = tracker
        .pending()
        .filter(|(state, _)| *state == EntityState::Deleted)
        .collect();
    writes.sort_by_key(|(_, entity)| Reverse(rank(entity.table())));
    writes.extend(
        tracker
            .pending()
            .filter(|(state, _)| *state != EntityState::Deleted),
    );
    writes
}

async fn write_pending(
    conn: &mut Connection,
    writes: Vec<(EntityState, &dyn Entity)>,
    cancel: &CancellationToken,
) -> StoreResult<usize> {
    let mut affected = 0;
    for (state, entity) in writes {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let changed = match state {
            EntityState::Added => entity.insert(conn)?,
            EntityState::Modified => entity.update(conn)?,
            EntityState::Deleted => entity.delete(conn)?,
            EntityState::Unchanged => continue,
        };
        if changed == 0 {
            return Err(StoreError::ConcurrencyConflict {
                table: entity.table(),
                key: entity.key(),
            });
        }
        affected += changed;
        debug!(
            "event=store_write module=identity state={} table={}",
            state.as_str(),
            entity.table()
        );

        tokio::task::yield_now().await;
    }

    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    Ok(affected)
}
