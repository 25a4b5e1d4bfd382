//! Database module for SQLite operations.
//!
//! Provides initialization with schema and pragmas, plus the repository
//! layer over position, reposition, and pending-transaction records.

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
