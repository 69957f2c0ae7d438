//! One-version schema bootstrap.
//!
//! # Responsibility
//! - Create every cart/catalog table on an empty database.
//! - Refuse databases created for a different schema version.
//!
//! # Invariants
//! - The bootstrap runs in a single transaction.
//! - `PRAGMA user_version` equals `SCHEMA_VERSION` after success.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Tables (and their columns) every store relies on.
pub const REQUIRED_TABLES: &[(&str, &[&str])] = &[
    ("school", &["id", "name"]),
    ("grade", &["id", "name", "school_id"]),
    ("equipment", &["id", "name"]),
    ("requirement", &["grade_id", "equipment_id", "quantity"]),
    ("users", &["id", "username", "password"]),
    ("cart_entry", &["id", "grade_id", "user_id"]),
    ("applied_unit", &["cart_entry_id", "equipment_id"]),
];

/// Creates the schema on a fresh database; no-op when already current.
pub fn apply_schema(conn: &mut Connection) -> DbResult<()> {
    let current = current_user_version(conn)?;
    if current == SCHEMA_VERSION {
        return Ok(());
    }
    if current != 0 {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;
    Ok(())
}

/// Reads the schema version stamped on the connection's database.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
