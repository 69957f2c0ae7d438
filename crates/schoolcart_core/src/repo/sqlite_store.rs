//! SQLite-backed cart store.
//!
//! # Responsibility
//! - Own the connection every SQLite repository implementation runs on.
//! - Reject connections whose schema cannot serve cart queries.
//!
//! # Invariants
//! - A constructed store always sits on a schema at `SCHEMA_VERSION` with
//!   every required table and column present.

use crate::db::schema::{current_user_version, REQUIRED_TABLES, SCHEMA_VERSION};
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::Connection;

/// Production storage backend.
///
/// Catalog, identity and cart traits are implemented in their own repository
/// modules on top of this connection.
pub struct SqliteStore {
    pub(super) conn: Connection,
    pub(super) max_units_per_save: Option<usize>,
}

impl SqliteStore {
    /// Wraps a bootstrapped connection (see `db::open_db`).
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_store_connection_ready(&conn)?;
        Ok(Self {
            conn,
            max_units_per_save: None,
        })
    }

    /// Caps the unit rows one `save_cart` may write across all entries.
    pub fn with_max_units_per_save(mut self, max_units: Option<usize>) -> Self {
        self.max_units_per_save = max_units;
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    if actual_version != SCHEMA_VERSION {
        return Err(RepoError::UninitializedConnection {
            expected_version: SCHEMA_VERSION,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for column in columns.iter().copied() {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
