//! # Contact Store
//!
//! Narrow CRUD interface the reconciler consults. Implementations:
//! - `SqliteContactStore`: sqlx-backed `contacts` table
//! - `MemoryContactStore`: arena of records keyed by id, for tests and
//!   throwaway runs

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::db::models::{ContactRecord, LinkPrecedence, NewContact};
use crate::Result;

mod memory;
mod sqlite;

pub use memory::MemoryContactStore;
pub use sqlite::SqliteContactStore;

/// Store-assigned contact identifier (monotonically increasing)
pub type ContactId = i64;

/// Persistence operations needed to consolidate a contact cluster
///
/// Queries over an empty id set return an empty list. Unless stated
/// otherwise, results come back in ascending id order.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Records whose email equals `email` OR whose phone equals `phone_number`.
    /// An absent field never matches.
    async fn find_by_email_or_phone(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Vec<ContactRecord>>;

    /// Records whose `linked_id` is in `ids`
    async fn find_by_linked_ids(&self, ids: &BTreeSet<ContactId>) -> Result<Vec<ContactRecord>>;

    /// Records by primary key
    async fn find_by_ids(&self, ids: &BTreeSet<ContactId>) -> Result<Vec<ContactRecord>>;

    /// Records by primary key, oldest first (`created_at`, then `id`)
    async fn find_by_ids_ordered_by_creation(
        &self,
        ids: &BTreeSet<ContactId>,
    ) -> Result<Vec<ContactRecord>>;

    /// Persist a new record, assigning id and timestamps
    async fn insert(&self, contact: NewContact) -> Result<ContactRecord>;

    /// Set link and precedence of a single record, refreshing `updated_at`
    async fn update_link(
        &self,
        id: ContactId,
        linked_id: Option<ContactId>,
        precedence: LinkPrecedence,
    ) -> Result<()>;

    /// Re-point every record linked to `filter_linked_id` at `new_linked_id`.
    /// Returns the number of records changed.
    async fn update_linked_id(
        &self,
        filter_linked_id: ContactId,
        new_linked_id: ContactId,
    ) -> Result<u64>;
}
