//! Cart read/write contracts and SQLite implementation.
//!
//! # Responsibility
//! - Rebuild a user's cart from `cart_entry` + `applied_unit` rows.
//! - Replace a user's whole cart in one write transaction.
//!
//! # Invariants
//! - Item quantity equals the number of `applied_unit` rows for the
//!   (entry, equipment) pair.
//! - `save_cart` deletes and reinserts; rows are never updated in place.
//! - A failed save leaves the previously committed cart untouched.
//! - Readers observe one committed snapshot per `get_cart` call.

use crate::model::cart::{check_unit_limit, expand_units, CartEntry, CartItem};
use crate::model::catalog::{EquipmentItem, Grade, School};
use crate::model::ids::{CartEntryId, EquipmentId, GradeId, SchoolId, UserId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::sqlite_store::SqliteStore;
use log::{debug, error, info};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::time::Instant;

pub trait CartReader {
    /// Loads every entry of the user's current cart, ordered by entry id.
    ///
    /// The SQLite implementation opens its own read transaction, so it must
    /// not be called while a transaction is open on `SqliteStore::connection()`.
    fn get_cart(&self, user_id: UserId) -> RepoResult<Vec<CartEntry>>;
}

pub trait CartWriter {
    /// Replaces the user's entire cart with `entries`, all or nothing.
    fn save_cart(&mut self, user_id: UserId, entries: &[CartEntry]) -> RepoResult<()>;
}

/// Row counts written by one successful save.
#[derive(Debug, Clone, Copy, Default)]
struct SaveSummary {
    entries: usize,
    units: usize,
}

impl CartReader for SqliteStore {
    fn get_cart(&self, user_id: UserId) -> RepoResult<Vec<CartEntry>> {
        let tx = self.conn.unchecked_transaction()?;
        let entries = load_cart(&tx, user_id)?;
        tx.commit()?;

        debug!(
            "event=cart_load module=repo status=ok user_id={} entries={}",
            user_id,
            entries.len()
        );
        Ok(entries)
    }
}

impl CartWriter for SqliteStore {
    fn save_cart(&mut self, user_id: UserId, entries: &[CartEntry]) -> RepoResult<()> {
        check_unit_limit(entries, self.max_units_per_save)?;

        let started_at = Instant::now();
        match replace_cart(&mut self.conn, user_id, entries) {
            Ok(summary) => {
                info!(
                    "event=cart_save module=repo status=ok user_id={} entries={} units={} duration_ms={}",
                    user_id,
                    summary.entries,
                    summary.units,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=cart_save module=repo status=error user_id={} duration_ms={} error={}",
                    user_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

fn load_cart(conn: &Connection, user_id: UserId) -> RepoResult<Vec<CartEntry>> {
    let mut stmt = conn.prepare(
        "SELECT
            ce.id AS entry_id,
            g.id AS grade_id,
            g.name AS grade_name,
            s.id AS school_id,
            s.name AS school_name
         FROM cart_entry ce
         INNER JOIN grade g ON g.id = ce.grade_id
         INNER JOIN school s ON s.id = g.school_id
         WHERE ce.user_id = ?1
         ORDER BY ce.id ASC;",
    )?;

    let mut rows = stmt.query([user_id.get()])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        let entry_id = CartEntryId::new(row.get("entry_id")?);
        let school_id = SchoolId::new(row.get("school_id")?);
        entries.push(CartEntry {
            id: Some(entry_id),
            school: School {
                id: school_id,
                name: row.get("school_name")?,
            },
            grade: Grade {
                id: GradeId::new(row.get("grade_id")?),
                name: row.get("grade_name")?,
                school_id,
            },
            items: load_entry_items(conn, entry_id)?,
        });
    }

    Ok(entries)
}

fn load_entry_items(conn: &Connection, entry_id: CartEntryId) -> RepoResult<Vec<CartItem>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.name, COUNT(*) AS quantity
         FROM applied_unit au
         INNER JOIN equipment e ON e.id = au.equipment_id
         WHERE au.cart_entry_id = ?1
         GROUP BY e.id, e.name
         ORDER BY e.id ASC;",
    )?;

    let mut rows = stmt.query([entry_id.get()])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        let quantity: i64 = row.get("quantity")?;
        if quantity <= 0 {
            return Err(RepoError::InvalidData(format!(
                "non-positive unit count {quantity} in applied_unit for entry {entry_id}"
            )));
        }
        items.push(CartItem {
            equipment: EquipmentItem {
                id: EquipmentId::new(row.get("id")?),
                name: row.get("name")?,
            },
            quantity,
        });
    }

    Ok(items)
}

fn replace_cart(
    conn: &mut Connection,
    user_id: UserId,
    entries: &[CartEntry],
) -> RepoResult<SaveSummary> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if !row_exists(&tx, "users", user_id.get())? {
        return Err(RepoError::UserNotFound(user_id));
    }

    tx.execute(
        "DELETE FROM applied_unit
         WHERE cart_entry_id IN (SELECT id FROM cart_entry WHERE user_id = ?1);",
        [user_id.get()],
    )?;
    tx.execute("DELETE FROM cart_entry WHERE user_id = ?1;", [user_id.get()])?;

    let mut summary = SaveSummary::default();
    {
        let mut insert_entry =
            tx.prepare("INSERT INTO cart_entry (grade_id, user_id) VALUES (?1, ?2);")?;
        let mut insert_unit = tx.prepare(
            "INSERT INTO applied_unit (cart_entry_id, equipment_id) VALUES (?1, ?2);",
        )?;
        let mut known_equipment = BTreeSet::new();

        for entry in entries {
            let grade_id = entry.grade.id;
            if !row_exists(&tx, "grade", grade_id.get())? {
                return Err(RepoError::GradeNotFound(grade_id));
            }
            let entry_id = insert_entry.insert(params![grade_id.get(), user_id.get()])?;
            summary.entries += 1;

            for equipment_id in expand_units(&entry.items) {
                if known_equipment.insert(equipment_id)
                    && !row_exists(&tx, "equipment", equipment_id.get())?
                {
                    return Err(RepoError::EquipmentNotFound(equipment_id));
                }
                insert_unit.execute(params![entry_id, equipment_id.get()])?;
                summary.units += 1;
            }
        }
    }

    tx.commit()?;
    Ok(summary)
}

fn row_exists(tx: &Transaction<'_>, table: &'static str, id: i64) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
