//! Catalog reference data.
//!
//! # Responsibility
//! - Define schools, grades, equipment and per-grade requirements.
//! - Provide the reference lists used to seed a store.
//!
//! # Invariants
//! - Reference data is immutable once seeded; carts only point at it.
//! - Every grade belongs to exactly one school.

use crate::model::ids::{EquipmentId, GradeId, SchoolId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
}

impl School {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: SchoolId::new(id),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    pub name: String,
    /// Owning school.
    pub school_id: SchoolId,
}

impl Grade {
    pub fn new(id: i64, name: impl Into<String>, school_id: i64) -> Self {
        Self {
            id: GradeId::new(id),
            name: name.into(),
            school_id: SchoolId::new(school_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub id: EquipmentId,
    pub name: String,
}

impl EquipmentItem {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: EquipmentId::new(id),
            name: name.into(),
        }
    }
}

/// Equipment the catalog lists for a grade, with its nominal quantity.
///
/// This is not a cart selection; callers typically use it to prefill one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredEquipment {
    pub equipment: EquipmentItem,
    pub quantity: i64,
}

/// One `requirement` association row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub grade_id: GradeId,
    pub equipment_id: EquipmentId,
    pub quantity: i64,
}

/// One `users` row. Passwords are compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub password: String,
}

/// Full set of reference rows used to populate a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeed {
    pub schools: Vec<School>,
    pub grades: Vec<Grade>,
    pub equipment: Vec<EquipmentItem>,
    pub requirements: Vec<Requirement>,
    pub users: Vec<UserAccount>,
}

impl CatalogSeed {
    /// Built-in demo catalog with two schools and two users.
    pub fn sample() -> Self {
        let requirement = |grade_id: i64, equipment_id: i64, quantity: i64| Requirement {
            grade_id: GradeId::new(grade_id),
            equipment_id: EquipmentId::new(equipment_id),
            quantity,
        };
        let user = |id: i64, username: &str, password: &str| UserAccount {
            id: UserId::new(id),
            username: username.to_string(),
            password: password.to_string(),
        };

        Self {
            schools: vec![
                School::new(1, "Oak Valley Primary"),
                School::new(2, "Riverside Middle School"),
            ],
            grades: vec![
                Grade::new(1, "Grade 1", 1),
                Grade::new(2, "Grade 2", 1),
                Grade::new(3, "Grade 7", 2),
                Grade::new(4, "Grade 8", 2),
            ],
            equipment: vec![
                EquipmentItem::new(1, "Pencil HB"),
                EquipmentItem::new(2, "Notebook A4"),
                EquipmentItem::new(3, "Ruler 30cm"),
                EquipmentItem::new(4, "Crayons (12 pack)"),
                EquipmentItem::new(5, "Scientific calculator"),
                EquipmentItem::new(6, "Geometry set"),
            ],
            requirements: vec![
                requirement(1, 1, 4),
                requirement(1, 2, 2),
                requirement(1, 4, 1),
                requirement(2, 1, 6),
                requirement(2, 2, 4),
                requirement(2, 3, 1),
                requirement(3, 2, 6),
                requirement(3, 5, 1),
                requirement(4, 2, 8),
                requirement(4, 5, 1),
                requirement(4, 6, 1),
            ],
            users: vec![user(1, "alice", "secret"), user(2, "bob", "hunter2")],
        }
    }

    pub fn school(&self, id: SchoolId) -> Option<&School> {
        self.schools.iter().find(|school| school.id == id)
    }

    pub fn grade(&self, id: GradeId) -> Option<&Grade> {
        self.grades.iter().find(|grade| grade.id == id)
    }

    pub fn equipment_item(&self, id: EquipmentId) -> Option<&EquipmentItem> {
        self.equipment.iter().find(|item| item.id == id)
    }

    pub fn user(&self, id: UserId) -> Option<&UserAccount> {
        self.users.iter().find(|user| user.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::CatalogSeed;
    use std::collections::HashSet;

    #[test]
    fn sample_catalog_is_referentially_consistent() {
        let seed = CatalogSeed::sample();
        for grade in &seed.grades {
            assert!(seed.school(grade.school_id).is_some());
        }
        for requirement in &seed.requirements {
            assert!(seed.grade(requirement.grade_id).is_some());
            assert!(seed.equipment_item(requirement.equipment_id).is_some());
        }
        let usernames: HashSet<_> = seed.users.iter().map(|user| &user.username).collect();
        assert_eq!(usernames.len(), seed.users.len());
    }
}
