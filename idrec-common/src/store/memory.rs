//! In-memory contact store

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

use super::{ContactId, ContactStore};
use crate::db::models::{ContactRecord, LinkPrecedence, NewContact};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Arena {
    contacts: BTreeMap<ContactId, ContactRecord>,
    last_id: ContactId,
}

/// Contact store holding every record in a `BTreeMap` keyed by id
///
/// Ids start at 1 and are never reused, matching the SQLite
/// `AUTOINCREMENT` column.
#[derive(Debug, Default)]
pub struct MemoryContactStore {
    arena: RwLock<Arena>,
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored contact in id order
    pub async fn all_contacts(&self) -> Vec<ContactRecord> {
        self.arena.read().await.contacts.values().cloned().collect()
    }

    pub async fn get(&self, id: ContactId) -> Option<ContactRecord> {
        self.arena.read().await.contacts.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.arena.read().await.contacts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn find_by_email_or_phone(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Vec<ContactRecord>> {
        let arena = self.arena.read().await;
        Ok(arena
            .contacts
            .values()
            .filter(|c| {
                let email_hit = email.is_some() && c.email.as_deref() == email;
                let phone_hit = phone_number.is_some() && c.phone_number.as_deref() == phone_number;
                email_hit || phone_hit
            })
            .cloned()
            .collect())
    }

    async fn find_by_linked_ids(&self, ids: &BTreeSet<ContactId>) -> Result<Vec<ContactRecord>> {
        let arena = self.arena.read().await;
        Ok(arena
            .contacts
            .values()
            .filter(|c| c.linked_id.map_or(false, |l| ids.contains(&l)))
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, ids: &BTreeSet<ContactId>) -> Result<Vec<ContactRecord>> {
        let arena = self.arena.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| arena.contacts.get(id))
            .cloned()
            .collect())
    }

    async fn find_by_ids_ordered_by_creation(
        &self,
        ids: &BTreeSet<ContactId>,
    ) -> Result<Vec<ContactRecord>> {
        let mut contacts = self.find_by_ids(ids).await?;
        contacts.sort_by_key(|c| c.creation_key());
        Ok(contacts)
    }

    async fn insert(&self, contact: NewContact) -> Result<ContactRecord> {
        let mut arena = self.arena.write().await;
        let now = Utc::now();

        arena.last_id += 1;
        let record = ContactRecord {
            id: arena.last_id,
            email: contact.email,
            phone_number: contact.phone_number,
            linked_id: contact.linked_id,
            link_precedence: contact.link_precedence,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        arena.contacts.insert(record.id, record.clone());

        Ok(record)
    }

    async fn update_link(
        &self,
        id: ContactId,
        linked_id: Option<ContactId>,
        precedence: LinkPrecedence,
    ) -> Result<()> {
        let mut arena = self.arena.write().await;
        let record = arena
            .contacts
            .get_mut(&id)
            .ok_or_else(|| Error::InvalidInput(format!("Contact {} does not exist", id)))?;

        record.linked_id = linked_id;
        record.link_precedence = precedence;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn update_linked_id(
        &self,
        filter_linked_id: ContactId,
        new_linked_id: ContactId,
    ) -> Result<u64> {
        let mut arena = self.arena.write().await;
        let now = Utc::now();
        let mut changed = 0;

        for record in arena.contacts.values_mut() {
            if record.linked_id == Some(filter_linked_id) {
                record.linked_id = Some(new_linked_id);
                record.updated_at = now;
                changed += 1;
            }
        }

        Ok(changed)
    }
}
