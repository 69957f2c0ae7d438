//! Cart use-case service.
//!
//! # Responsibility
//! - Expose catalog, identity and cart operations with string identifiers.
//! - Apply the configured read-failure policy.
//!
//! # Invariants
//! - A malformed identifier behaves like an unknown one on read paths.
//! - Write failures always reach the caller; they are never degraded.

use crate::config::{ReadPolicy, StoreConfig};
use crate::model::cart::CartEntry;
use crate::model::catalog::{Grade, RequiredEquipment, School};
use crate::model::ids::{GradeId, SchoolId, UserId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::{open_store, CartStore};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Storage failure (surfaced for reads only under `ReadPolicy::Strict`).
    Repo(RepoError),
    /// `save_cart` target id is not a valid user key.
    UnknownUser(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::UnknownUser(value) => write!(f, "unknown user id `{value}`"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::UnknownUser(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UserNotFound(user_id) => Self::UnknownUser(user_id.to_string()),
            other => Self::Repo(other),
        }
    }
}

/// Entry point used by the outer application layer.
pub struct CartService<S: CartStore> {
    store: S,
    read_policy: ReadPolicy,
}

impl CartService<Box<dyn CartStore>> {
    /// Opens the configured backend and wraps it with the configured policy.
    pub fn from_config(config: &StoreConfig) -> RepoResult<Self> {
        Ok(Self::new(open_store(config)?, config.read_policy))
    }
}

impl<S: CartStore> CartService<S> {
    pub fn new(store: S, read_policy: ReadPolicy) -> Self {
        Self { store, read_policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn read_policy(&self) -> ReadPolicy {
        self.read_policy
    }

    pub fn list_schools(&self) -> ServiceResult<Vec<School>> {
        self.degrade("list_schools", self.store.list_schools())
    }

    /// Lists grades of a school; empty for unknown or malformed ids.
    pub fn list_grades(&self, school_id: &str) -> ServiceResult<Vec<Grade>> {
        let Some(school_id) = SchoolId::parse_external(school_id) else {
            return Ok(Vec::new());
        };
        self.degrade("list_grades", self.store.list_grades(school_id))
    }

    pub fn list_required_equipment(
        &self,
        grade_id: &str,
    ) -> ServiceResult<Vec<RequiredEquipment>> {
        let Some(grade_id) = GradeId::parse_external(grade_id) else {
            return Ok(Vec::new());
        };
        self.degrade(
            "list_required_equipment",
            self.store.list_required_equipment(grade_id),
        )
    }

    /// Returns the external user id for an exact credential match.
    pub fn resolve_user_id(
        &self,
        username: &str,
        password: &str,
    ) -> ServiceResult<Option<String>> {
        let user_id = self.degrade(
            "resolve_user_id",
            self.store.resolve_user_id(username, password),
        )?;
        Ok(user_id.map(|id| id.to_string()))
    }

    pub fn resolve_username(&self, user_id: &str) -> ServiceResult<Option<String>> {
        let Some(user_id) = UserId::parse_external(user_id) else {
            return Ok(None);
        };
        self.degrade("resolve_username", self.store.resolve_username(user_id))
    }

    pub fn is_valid_user_id(&self, user_id: &str) -> ServiceResult<bool> {
        let Some(user_id) = UserId::parse_external(user_id) else {
            return Ok(false);
        };
        self.degrade("is_valid_user_id", self.store.user_exists(user_id))
    }

    pub fn get_cart(&self, user_id: &str) -> ServiceResult<Vec<CartEntry>> {
        let Some(user_id) = UserId::parse_external(user_id) else {
            return Ok(Vec::new());
        };
        self.degrade("get_cart", self.store.get_cart(user_id))
    }

    /// Replaces the user's cart with `entries`.
    ///
    /// # Errors
    /// - `ServiceError::UnknownUser` for malformed or unknown user ids.
    /// - `ServiceError::Repo` for validation or storage failures; the previous
    ///   cart is still in place.
    pub fn save_cart(&mut self, user_id: &str, entries: &[CartEntry]) -> ServiceResult<()> {
        let parsed = UserId::parse_external(user_id)
            .ok_or_else(|| ServiceError::UnknownUser(user_id.to_string()))?;
        self.store.save_cart(parsed, entries)?;
        Ok(())
    }

    fn degrade<T: Default>(
        &self,
        operation: &'static str,
        result: RepoResult<T>,
    ) -> ServiceResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => match self.read_policy {
                ReadPolicy::Strict => Err(ServiceError::Repo(err)),
                ReadPolicy::DegradeToEmpty => {
                    warn!(
                        "event=read_degraded module=service status=error operation={} error={}",
                        operation, err
                    );
                    Ok(T::default())
                }
            },
        }
    }
}
