//! Repository layer abstractions and storage backends.
//!
//! # Responsibility
//! - Define the catalog, identity and cart data access contracts.
//! - Provide SQLite and in-memory implementations of every contract.
//! - Select a backend from configuration.
//!
//! # Invariants
//! - Both backends store quantities as unit rows and read them back by
//!   aggregation, so they return identical carts for identical saves.
//! - Lookups that match nothing return empty values, not errors.

pub mod cart_repo;
pub mod catalog_repo;
pub mod error;
pub mod identity_repo;
pub mod memory_store;
pub mod sqlite_store;

use crate::config::{BackendKind, StoreConfig};
use crate::db::{open_db, open_db_in_memory, seed_catalog};
use crate::model::cart::CartEntry;
use crate::model::catalog::{CatalogSeed, Grade, RequiredEquipment, School};
use crate::model::ids::{GradeId, SchoolId, UserId};
use cart_repo::{CartReader, CartWriter};
use catalog_repo::CatalogReader;
use error::RepoResult;
use identity_repo::IdentityReader;
use log::info;
use memory_store::MemoryStore;
use sqlite_store::SqliteStore;

/// Everything the cart service needs from one backend.
pub trait CartStore: CatalogReader + IdentityReader + CartReader + CartWriter {}

impl<T> CartStore for T where T: CatalogReader + IdentityReader + CartReader + CartWriter {}

impl<S: CatalogReader + ?Sized> CatalogReader for Box<S> {
    fn list_schools(&self) -> RepoResult<Vec<School>> {
        (**self).list_schools()
    }

    fn list_grades(&self, school_id: SchoolId) -> RepoResult<Vec<Grade>> {
        (**self).list_grades(school_id)
    }

    fn list_required_equipment(&self, grade_id: GradeId) -> RepoResult<Vec<RequiredEquipment>> {
        (**self).list_required_equipment(grade_id)
    }
}

impl<S: IdentityReader + ?Sized> IdentityReader for Box<S> {
    fn resolve_user_id(&self, username: &str, password: &str) -> RepoResult<Option<UserId>> {
        (**self).resolve_user_id(username, password)
    }

    fn resolve_username(&self, user_id: UserId) -> RepoResult<Option<String>> {
        (**self).resolve_username(user_id)
    }

    fn user_exists(&self, user_id: UserId) -> RepoResult<bool> {
        (**self).user_exists(user_id)
    }
}

impl<S: CartReader + ?Sized> CartReader for Box<S> {
    fn get_cart(&self, user_id: UserId) -> RepoResult<Vec<CartEntry>> {
        (**self).get_cart(user_id)
    }
}

impl<S: CartWriter + ?Sized> CartWriter for Box<S> {
    fn save_cart(&mut self, user_id: UserId, entries: &[CartEntry]) -> RepoResult<()> {
        (**self).save_cart(user_id, entries)
    }
}

/// Opens the backend named by `config`.
///
/// With `seed_sample_catalog`, an empty store is loaded with
/// `CatalogSeed::sample()`; a store that already has schools is left as is.
pub fn open_store(config: &StoreConfig) -> RepoResult<Box<dyn CartStore>> {
    match config.backend {
        BackendKind::Memory => {
            let catalog = if config.seed_sample_catalog {
                CatalogSeed::sample()
            } else {
                CatalogSeed::default()
            };
            info!(
                "event=store_open module=repo status=ok backend=memory seeded={}",
                config.seed_sample_catalog
            );
            let store =
                MemoryStore::try_new(catalog)?.with_max_units_per_save(config.max_units_per_save);
            Ok(Box::new(store))
        }
        BackendKind::Sqlite => {
            let mut conn = match config.db_path.as_ref() {
                Some(path) => open_db(path, config.busy_timeout())?,
                None => open_db_in_memory()?,
            };
            if config.seed_sample_catalog {
                let schools: i64 =
                    conn.query_row("SELECT COUNT(*) FROM school;", [], |row| row.get(0))?;
                if schools == 0 {
                    seed_catalog(&mut conn, &CatalogSeed::sample())?;
                }
            }
            info!(
                "event=store_open module=repo status=ok backend=sqlite file={}",
                config.db_path.is_some()
            );
            let store =
                SqliteStore::try_new(conn)?.with_max_units_per_save(config.max_units_per_save);
            Ok(Box::new(store))
        }
    }
}
