//! # Identity Reconciliation Common Library
//!
//! Shared code for the identity reconciliation service:
//! - Contact model (ContactRecord, LinkPrecedence)
//! - ContactStore trait and its SQLite / in-memory implementations
//! - Database initialization
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod store;

pub use db::models::{ContactRecord, LinkPrecedence, NewContact};
pub use error::{Error, Result};
pub use store::{ContactId, ContactStore, MemoryContactStore, SqliteContactStore};
