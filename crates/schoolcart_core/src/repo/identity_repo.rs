//! User identity lookups.
//!
//! Credentials are compared verbatim against the `users` table; hashing is
//! outside this crate.

use crate::model::ids::UserId;
use crate::repo::error::RepoResult;
use crate::repo::sqlite_store::SqliteStore;
use rusqlite::{params, OptionalExtension};

pub trait IdentityReader {
    /// Returns the user matching both fields exactly.
    fn resolve_user_id(&self, username: &str, password: &str) -> RepoResult<Option<UserId>>;
    fn resolve_username(&self, user_id: UserId) -> RepoResult<Option<String>>;
    fn user_exists(&self, user_id: UserId) -> RepoResult<bool>;
}

impl IdentityReader for SqliteStore {
    fn resolve_user_id(&self, username: &str, password: &str) -> RepoResult<Option<UserId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1 AND password = ?2;",
                params![username, password],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.map(UserId::new))
    }

    fn resolve_username(&self, user_id: UserId) -> RepoResult<Option<String>> {
        let username = self
            .conn
            .query_row(
                "SELECT username FROM users WHERE id = ?1;",
                [user_id.get()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(username)
    }

    fn user_exists(&self, user_id: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
            [user_id.get()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}
