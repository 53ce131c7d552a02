use blog_core::db::{open_db, open_db_in_memory, DbError, SCHEMA_VERSION};
use blog_core::{AnonymousActor, BlogStore, StoreError, SystemClock};
use rusqlite::Connection;
use std::sync::Arc;

fn open_store(conn: Connection) -> Result<BlogStore, StoreError> {
    BlogStore::new(conn, Arc::new(AnonymousActor), Arc::new(SystemClock))
}

#[test]
fn new_store_registers_identity_and_blog_tables() {
    let store = open_store(open_db_in_memory().unwrap()).unwrap();
    let conn = store.connection();

    assert_eq!(schema_version(conn), SCHEMA_VERSION);
    assert_table_exists(conn, "users");
    assert_table_exists(conn, "articles");
    assert_table_exists(conn, "comments");
}

#[test]
fn reopening_same_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blog.db");

    let first = open_store(open_db(&path).unwrap()).unwrap();
    drop(first);

    let second = open_store(open_db(&path).unwrap()).unwrap();
    assert_eq!(schema_version(second.connection()), SCHEMA_VERSION);
    assert_table_exists(second.connection(), "comments");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_store(open_db(&path).unwrap()).err().unwrap();
    match err {
        StoreError::Db(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        }) => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn opened_connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
