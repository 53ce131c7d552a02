//! Model configuration registry and executor.
//!
//! # Responsibility
//! - Describe each entity table as one `ModelConfiguration`.
//! - Apply an explicit, ordered registration list atomically.
//!
//! # Invariants
//! - Configuration DDL must be idempotent (`CREATE ... IF NOT EXISTS`).
//! - Configuration names are unique within one registration list.
//! - Applied schema version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::time::Instant;

/// Schema version written by this binary after registration.
pub const SCHEMA_VERSION: u32 = 1;

/// Declarative mapping of one entity type onto storage.
pub trait ModelConfiguration: Sync {
    /// Stable configuration name, usually the table name.
    fn name(&self) -> &'static str;
    /// Idempotent DDL creating the table and its indexes.
    fn create_sql(&self) -> &'static str;
}

/// Applies all configurations in list order inside one transaction.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer binary.
/// - `DuplicateConfiguration` when a name appears twice; nothing is applied.
pub fn register_models(
    conn: &mut Connection,
    configurations: &[&dyn ModelConfiguration],
) -> DbResult<()> {
    let started_at = Instant::now();

    let mut seen = BTreeSet::new();
    for configuration in configurations {
        if !seen.insert(configuration.name()) {
            return Err(DbError::DuplicateConfiguration(configuration.name()));
        }
    }

    let current_version = current_user_version(conn)?;
    if current_version > SCHEMA_VERSION {
        error!(
            "event=schema_register module=db status=error error_code=schema_too_new db_version={} latest_supported={}",
            current_version, SCHEMA_VERSION
        );
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    for configuration in configurations {
        tx.execute_batch(configuration.create_sql())?;
    }
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;

    info!(
        "event=schema_register module=db status=ok configurations={} duration_ms={}",
        configurations.len(),
        started_at.elapsed().as_millis()
    );
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
