//! Catalog read contracts and SQLite implementation.
//!
//! # Invariants
//! - Listings are ordered by primary key so repeated calls are stable.
//! - Unknown parent ids produce empty listings, never errors.

use crate::model::catalog::{EquipmentItem, Grade, RequiredEquipment, School};
use crate::model::ids::{EquipmentId, GradeId, SchoolId};
use crate::repo::error::RepoResult;
use crate::repo::sqlite_store::SqliteStore;

/// Read-only access to schools, grades and grade requirements.
pub trait CatalogReader {
    fn list_schools(&self) -> RepoResult<Vec<School>>;
    /// Grades owned by `school_id`.
    fn list_grades(&self, school_id: SchoolId) -> RepoResult<Vec<Grade>>;
    /// Equipment required for `grade_id` with nominal quantities.
    fn list_required_equipment(&self, grade_id: GradeId) -> RepoResult<Vec<RequiredEquipment>>;
}

impl CatalogReader for SqliteStore {
    fn list_schools(&self) -> RepoResult<Vec<School>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM school ORDER BY id ASC;")?;
        let rows = stmt.query_map([], |row| {
            Ok(School {
                id: SchoolId::new(row.get("id")?),
                name: row.get("name")?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn list_grades(&self, school_id: SchoolId) -> RepoResult<Vec<Grade>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, school_id
             FROM grade
             WHERE school_id = ?1
             ORDER BY id ASC;",
        )?;
        let rows = stmt.query_map([school_id.get()], |row| {
            Ok(Grade {
                id: GradeId::new(row.get("id")?),
                name: row.get("name")?,
                school_id: SchoolId::new(row.get("school_id")?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn list_required_equipment(&self, grade_id: GradeId) -> RepoResult<Vec<RequiredEquipment>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.name, r.quantity
             FROM requirement r
             INNER JOIN equipment e ON e.id = r.equipment_id
             WHERE r.grade_id = ?1
             ORDER BY e.id ASC;",
        )?;
        let rows = stmt.query_map([grade_id.get()], |row| {
            Ok(RequiredEquipment {
                equipment: EquipmentItem {
                    id: EquipmentId::new(row.get("id")?),
                    name: row.get("name")?,
                },
                quantity: row.get("quantity")?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
