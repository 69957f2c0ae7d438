//! Domain model for catalog reference data and user carts.
//!
//! # Responsibility
//! - Define the data structures exchanged between storage and callers.
//! - Keep the quantity storage strategy in one place.
//!
//! # Invariants
//! - Storage keys are numeric; their external form is a string.
//! - Carts reference catalog rows by id and never own them.

pub mod cart;
pub mod catalog;
pub mod ids;
