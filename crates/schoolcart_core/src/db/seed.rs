//! Reference data loading.

use crate::db::DbResult;
use crate::model::catalog::CatalogSeed;
use log::info;
use rusqlite::{params, Connection};

/// Inserts every row of `seed` in one transaction.
///
/// Ids are taken from the seed verbatim, so seeding the same rows twice fails
/// on the primary keys and leaves the database unchanged.
pub fn seed_catalog(conn: &mut Connection, seed: &CatalogSeed) -> DbResult<()> {
    let tx = conn.transaction()?;
    {
        let mut insert_school = tx.prepare("INSERT INTO school (id, name) VALUES (?1, ?2);")?;
        for school in &seed.schools {
            insert_school.execute(params![school.id.get(), school.name])?;
        }

        let mut insert_grade =
            tx.prepare("INSERT INTO grade (id, name, school_id) VALUES (?1, ?2, ?3);")?;
        for grade in &seed.grades {
            insert_grade.execute(params![grade.id.get(), grade.name, grade.school_id.get()])?;
        }

        let mut insert_equipment =
            tx.prepare("INSERT INTO equipment (id, name) VALUES (?1, ?2);")?;
        for item in &seed.equipment {
            insert_equipment.execute(params![item.id.get(), item.name])?;
        }

        let mut insert_requirement = tx.prepare(
            "INSERT INTO requirement (grade_id, equipment_id, quantity) VALUES (?1, ?2, ?3);",
        )?;
        for requirement in &seed.requirements {
            insert_requirement.execute(params![
                requirement.grade_id.get(),
                requirement.equipment_id.get(),
                requirement.quantity,
            ])?;
        }

        let mut insert_user =
            tx.prepare("INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3);")?;
        for user in &seed.users {
            insert_user.execute(params![user.id.get(), user.username, user.password])?;
        }
    }
    tx.commit()?;

    info!(
        "event=catalog_seed module=db status=ok schools={} grades={} equipment={} users={}",
        seed.schools.len(),
        seed.grades.len(),
        seed.equipment.len(),
        seed.users.len()
    );
    Ok(())
}
