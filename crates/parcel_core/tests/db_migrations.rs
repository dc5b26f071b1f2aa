use parcel_core::db::migrations::latest_version;
use parcel_core::db::{open_db, open_db_in_memory, open_db_with_options, DbError, DbOptions};
use parcel_core::{ParcelStatus, ParcelStore, SqliteParcelStore};
use rusqlite::Connection;
use std::time::Duration;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_object_exists(&conn, "table", "parcel");
    assert_object_exists(&conn, "index", "parcel_client_idx");
}

#[test]
fn opening_same_database_twice_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.db");

    let conn_first = open_db(&path).unwrap();
    let number = SqliteParcelStore::new(&conn_first)
        .add(&parcel_core::Parcel::new(1, "kept", "2024-01-01T00:00:00Z"))
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let loaded = SqliteParcelStore::new(&conn_second).get(number).unwrap();
    assert_eq!(loaded.address, "kept");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn existing_unversioned_parcel_table_is_adopted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE parcel (
            number INTEGER PRIMARY KEY AUTOINCREMENT,
            client INTEGER NOT NULL DEFAULT 0,
            status VARCHAR(128) NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            created_at VARCHAR(128) NOT NULL DEFAULT ''
        );
        INSERT INTO parcel (client, status, address, created_at)
        VALUES (3, 'sent', 'old street', '2023-05-05T12:00:00Z');",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_object_exists(&conn, "index", "parcel_client_idx");

    let parcels = SqliteParcelStore::new(&conn).get_by_client(3).unwrap();
    assert_eq!(parcels.len(), 1);
    assert_eq!(parcels[0].status, ParcelStatus::Sent);
    assert_eq!(parcels[0].address, "old street");
}

#[test]
fn open_db_with_options_applies_busy_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tuned.db");
    let options = DbOptions {
        busy_timeout: Duration::from_millis(1500),
    };

    let conn = open_db_with_options(&path, &options).unwrap();
    let timeout: i64 = conn
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 1500);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_object_exists(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
