//! Core use-case services.
//!
//! # Responsibility
//! - Translate external string identifiers into storage keys.
//! - Keep callers decoupled from the selected storage backend.

pub mod cart_service;
