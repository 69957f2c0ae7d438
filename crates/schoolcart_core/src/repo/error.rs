//! Repository error type shared by every storage backend.

use crate::db::DbError;
use crate::model::cart::CartValidationError;
use crate::model::ids::{EquipmentId, GradeId, UserId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level failure for catalog, identity and cart operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Cart rejected before any mutation.
    Validation(CartValidationError),
    /// Save target user does not exist.
    UserNotFound(UserId),
    /// Cart entry references an unknown grade.
    GradeNotFound(GradeId),
    /// Cart item references unknown equipment.
    EquipmentNotFound(EquipmentId),
    /// Connection schema is not at the expected version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Stored rows cannot be turned into a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::GradeNotFound(id) => write!(f, "grade not found: {id}"),
            Self::EquipmentNotFound(id) => write!(f, "equipment not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "cart store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "cart store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "cart store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid stored cart data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CartValidationError> for RepoError {
    fn from(value: CartValidationError) -> Self {
        Self::Validation(value)
    }
}
