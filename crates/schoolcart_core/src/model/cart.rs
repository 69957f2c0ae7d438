//! Cart domain model and the unit-row storage strategy.
//!
//! # Responsibility
//! - Define the in-memory cart shape exchanged with callers.
//! - Own the quantity <-> unit-row mapping shared by every backend.
//!
//! # Invariants
//! - A quantity `N > 0` is stored as `N` unit rows; `N <= 0` as none.
//! - Aggregating the expanded units yields the summed positive quantity per
//!   equipment id.
//! - Entry ids are assigned by storage and change on every save.

use crate::model::catalog::{EquipmentItem, Grade, School};
use crate::model::ids::{CartEntryId, EquipmentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One equipment selection inside a cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub equipment: EquipmentItem,
    pub quantity: i64,
}

impl CartItem {
    pub fn new(equipment: EquipmentItem, quantity: i64) -> Self {
        Self {
            equipment,
            quantity,
        }
    }
}

/// Grade-scoped line of a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// `None` until the entry has been persisted.
    pub id: Option<CartEntryId>,
    /// Display copy of the grade's owning school.
    pub school: School,
    pub grade: Grade,
    pub items: Vec<CartItem>,
}

impl CartEntry {
    /// Creates an unsaved entry.
    pub fn new(school: School, grade: Grade, items: Vec<CartItem>) -> Self {
        Self {
            id: None,
            school,
            grade,
            items,
        }
    }

    /// Returns the shape this entry has after a save/load cycle.
    ///
    /// Drops the id, removes non-positive lines, merges duplicate equipment
    /// and orders items by equipment id.
    pub fn canonical(&self) -> Self {
        let mut merged: BTreeMap<EquipmentId, CartItem> = BTreeMap::new();
        for item in self.items.iter().filter(|item| item.quantity > 0) {
            merged
                .entry(item.equipment.id)
                .and_modify(|existing| existing.quantity += item.quantity)
                .or_insert_with(|| item.clone());
        }

        Self {
            id: None,
            school: self.school.clone(),
            grade: self.grade.clone(),
            items: merged.into_values().collect(),
        }
    }

    /// Number of unit rows a save writes for this entry.
    pub fn unit_count(&self) -> usize {
        self.items
            .iter()
            .map(|item| usize::try_from(item.quantity).unwrap_or(0))
            .sum()
    }
}

/// Write-side cart validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartValidationError {
    /// The whole cart would expand into more unit rows than allowed.
    TooManyUnits { units: usize, max: usize },
}

impl Display for CartValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyUnits { units, max } => write!(
                f,
                "cart expands to {units} unit rows, exceeding the limit of {max}"
            ),
        }
    }
}

impl Error for CartValidationError {}

/// Sums the unit rows `entries` would write and checks them against
/// `max_units`. `None` means unbounded.
pub fn check_unit_limit(
    entries: &[CartEntry],
    max_units: Option<usize>,
) -> Result<usize, CartValidationError> {
    let units: usize = entries.iter().map(CartEntry::unit_count).sum();
    match max_units {
        Some(max) if units > max => Err(CartValidationError::TooManyUnits { units, max }),
        _ => Ok(units),
    }
}

/// Expands item quantities into one equipment id per unit row.
pub fn expand_units(items: &[CartItem]) -> Vec<EquipmentId> {
    let mut units = Vec::new();
    for item in items {
        let count = usize::try_from(item.quantity).unwrap_or(0);
        units.extend(std::iter::repeat(item.equipment.id).take(count));
    }
    units
}

/// Counts unit rows per equipment id, ordered by id.
pub fn aggregate_units(units: impl IntoIterator<Item = EquipmentId>) -> Vec<(EquipmentId, i64)> {
    let mut counts: BTreeMap<EquipmentId, i64> = BTreeMap::new();
    for equipment_id in units {
        *counts.entry(equipment_id).or_default() += 1;
    }
    counts.into_iter().collect()
}
