//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// Transaction history entity and API types
pub mod transaction;
/// Ledger account (user) entity
pub mod user;
