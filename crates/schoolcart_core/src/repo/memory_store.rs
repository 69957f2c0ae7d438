//! In-memory cart store.
//!
//! # Responsibility
//! - Serve catalog/identity reads from static reference lists.
//! - Keep carts per user with the same unit-row strategy as SQLite.
//!
//! # Invariants
//! - A save builds the complete replacement before touching stored state,
//!   so a rejected save leaves the previous cart in place.
//! - Entry ids are never reused within one store instance.

use crate::model::cart::{aggregate_units, check_unit_limit, expand_units, CartEntry, CartItem};
use crate::model::catalog::{CatalogSeed, Grade, RequiredEquipment, School};
use crate::model::ids::{CartEntryId, EquipmentId, GradeId, SchoolId, UserId};
use crate::repo::cart_repo::{CartReader, CartWriter};
use crate::repo::catalog_repo::CatalogReader;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::identity_repo::IdentityReader;
use log::info;
use std::collections::{BTreeMap, BTreeSet};

/// Stored header plus one equipment id per applied unit.
#[derive(Debug, Clone)]
struct StoredEntry {
    id: CartEntryId,
    grade_id: GradeId,
    units: Vec<EquipmentId>,
}

/// Process-local storage backend for tests and demos.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    catalog: CatalogSeed,
    carts: BTreeMap<UserId, Vec<StoredEntry>>,
    next_entry_id: i64,
    max_units_per_save: Option<usize>,
}

impl MemoryStore {
    /// Builds a store over `catalog`.
    ///
    /// # Errors
    /// - `RepoError::InvalidData` when two users share a username, which the
    ///   SQLite `users` table would refuse as well.
    pub fn try_new(catalog: CatalogSeed) -> RepoResult<Self> {
        let mut usernames = BTreeSet::new();
        for user in &catalog.users {
            if !usernames.insert(user.username.as_str()) {
                return Err(RepoError::InvalidData(format!(
                    "duplicate username `{}` in catalog",
                    user.username
                )));
            }
        }

        Ok(Self {
            catalog,
            carts: BTreeMap::new(),
            next_entry_id: 1,
            max_units_per_save: None,
        })
    }

    /// Caps the unit rows one `save_cart` may write across all entries.
    pub fn with_max_units_per_save(mut self, max_units: Option<usize>) -> Self {
        self.max_units_per_save = max_units;
        self
    }

    pub fn catalog(&self) -> &CatalogSeed {
        &self.catalog
    }

    /// Number of stored unit rows for one entry of one user.
    pub fn unit_rows(&self, user_id: UserId, entry_id: CartEntryId) -> usize {
        self.carts
            .get(&user_id)
            .and_then(|entries| entries.iter().find(|entry| entry.id == entry_id))
            .map_or(0, |entry| entry.units.len())
    }

    fn hydrate(&self, stored: &StoredEntry) -> RepoResult<CartEntry> {
        let grade = self.catalog.grade(stored.grade_id).ok_or_else(|| {
            RepoError::InvalidData(format!("stored entry {} has unknown grade", stored.id))
        })?;
        let school = self.catalog.school(grade.school_id).ok_or_else(|| {
            RepoError::InvalidData(format!("grade {} has unknown school", grade.id))
        })?;

        let mut items = Vec::new();
        for (equipment_id, quantity) in aggregate_units(stored.units.iter().copied()) {
            let equipment = self.catalog.equipment_item(equipment_id).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "stored entry {} has unknown equipment {equipment_id}",
                    stored.id
                ))
            })?;
            items.push(CartItem::new(equipment.clone(), quantity));
        }

        Ok(CartEntry {
            id: Some(stored.id),
            school: school.clone(),
            grade: grade.clone(),
            items,
        })
    }
}

impl CatalogReader for MemoryStore {
    fn list_schools(&self) -> RepoResult<Vec<School>> {
        let mut schools = self.catalog.schools.clone();
        schools.sort_by_key(|school| school.id);
        Ok(schools)
    }

    fn list_grades(&self, school_id: SchoolId) -> RepoResult<Vec<Grade>> {
        let mut grades: Vec<Grade> = self
            .catalog
            .grades
            .iter()
            .filter(|grade| grade.school_id == school_id)
            .cloned()
            .collect();
        grades.sort_by_key(|grade| grade.id);
        Ok(grades)
    }

    fn list_required_equipment(&self, grade_id: GradeId) -> RepoResult<Vec<RequiredEquipment>> {
        let mut required = Vec::new();
        for requirement in self
            .catalog
            .requirements
            .iter()
            .filter(|requirement| requirement.grade_id == grade_id)
        {
            let equipment = self
                .catalog
                .equipment_item(requirement.equipment_id)
                .ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "requirement references unknown equipment {}",
                        requirement.equipment_id
                    ))
                })?;
            required.push(RequiredEquipment {
                equipment: equipment.clone(),
                quantity: requirement.quantity,
            });
        }
        required.sort_by_key(|item| item.equipment.id);
        Ok(required)
    }
}

impl IdentityReader for MemoryStore {
    fn resolve_user_id(&self, username: &str, password: &str) -> RepoResult<Option<UserId>> {
        Ok(self
            .catalog
            .users
            .iter()
            .find(|user| user.username == username && user.password == password)
            .map(|user| user.id))
    }

    fn resolve_username(&self, user_id: UserId) -> RepoResult<Option<String>> {
        Ok(self.catalog.user(user_id).map(|user| user.username.clone()))
    }

    fn user_exists(&self, user_id: UserId) -> RepoResult<bool> {
        Ok(self.catalog.user(user_id).is_some())
    }
}

impl CartReader for MemoryStore {
    fn get_cart(&self, user_id: UserId) -> RepoResult<Vec<CartEntry>> {
        let Some(stored) = self.carts.get(&user_id) else {
            return Ok(Vec::new());
        };
        stored.iter().map(|entry| self.hydrate(entry)).collect()
    }
}

impl CartWriter for MemoryStore {
    fn save_cart(&mut self, user_id: UserId, entries: &[CartEntry]) -> RepoResult<()> {
        check_unit_limit(entries, self.max_units_per_save)?;
        if self.catalog.user(user_id).is_none() {
            return Err(RepoError::UserNotFound(user_id));
        }

        let mut next_entry_id = self.next_entry_id;
        let mut replacement = Vec::with_capacity(entries.len());
        let mut unit_total = 0;
        for entry in entries {
            if self.catalog.grade(entry.grade.id).is_none() {
                return Err(RepoError::GradeNotFound(entry.grade.id));
            }
            let units = expand_units(&entry.items);
            if let Some(missing) = units
                .iter()
                .copied()
                .find(|id| self.catalog.equipment_item(*id).is_none())
            {
                return Err(RepoError::EquipmentNotFound(missing));
            }

            unit_total += units.len();
            replacement.push(StoredEntry {
                id: CartEntryId::new(next_entry_id),
                grade_id: entry.grade.id,
                units,
            });
            next_entry_id += 1;
        }

        self.next_entry_id = next_entry_id;
        if replacement.is_empty() {
            self.carts.remove(&user_id);
        } else {
            self.carts.insert(user_id, replacement);
        }

        info!(
            "event=cart_save module=memory_store status=ok user_id={} entries={} units={}",
            user_id,
            entries.len(),
            unit_total
        );
        Ok(())
    }
}
