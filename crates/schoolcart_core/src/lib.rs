//! Cart persistence core for school equipment requirements.
//! This crate owns the cart storage invariants and the catalog reads around them.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{load_config, BackendKind, ConfigError, LogConfig, ReadPolicy, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::cart::{check_unit_limit, CartEntry, CartItem, CartValidationError};
pub use model::catalog::{
    CatalogSeed, EquipmentItem, Grade, RequiredEquipment, Requirement, School, UserAccount,
};
pub use model::ids::{CartEntryId, EquipmentId, GradeId, IdParseError, SchoolId, UserId};
pub use repo::cart_repo::{CartReader, CartWriter};
pub use repo::catalog_repo::CatalogReader;
pub use repo::error::{RepoError, RepoResult};
pub use repo::identity_repo::IdentityReader;
pub use repo::memory_store::MemoryStore;
pub use repo::sqlite_store::SqliteStore;
pub use repo::{open_store, CartStore};
pub use service::cart_service::{CartService, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
