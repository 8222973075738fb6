//! SQLite-backed contact store

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::BTreeSet;

use super::{ContactId, ContactStore};
use crate::db::models::{ContactRecord, LinkPrecedence, NewContact};
use crate::Result;

const CONTACT_COLUMNS: &str =
    "id, email, phone_number, linked_id, link_precedence, created_at, updated_at, deleted_at";

/// Contact store over the `contacts` table created by `db::init_database`
#[derive(Clone)]
pub struct SqliteContactStore {
    pool: SqlitePool,
}

impl SqliteContactStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Every stored contact in id order
    pub async fn all_contacts(&self) -> Result<Vec<ContactRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM contacts ORDER BY id",
            CONTACT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(contact_from_row).collect()
    }

    /// SELECT ... WHERE `column` IN (ids) ORDER BY `order_by`
    async fn select_where_in(
        &self,
        column: &str,
        ids: &BTreeSet<ContactId>,
        order_by: &str,
    ) -> Result<Vec<ContactRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM contacts WHERE {} IN (",
            CONTACT_COLUMNS, column
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        builder.push(" ORDER BY ");
        builder.push(order_by);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(contact_from_row).collect()
    }
}

fn contact_from_row(row: &SqliteRow) -> Result<ContactRecord> {
    let precedence: String = row.try_get("link_precedence")?;

    Ok(ContactRecord {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        phone_number: row.try_get("phone_number")?,
        linked_id: row.try_get("linked_id")?,
        link_precedence: precedence.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    async fn find_by_email_or_phone(
        &self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Vec<ContactRecord>> {
        if email.is_none() && phone_number.is_none() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM contacts WHERE ", CONTACT_COLUMNS));

        if let Some(email) = email {
            builder.push("email = ");
            builder.push_bind(email.to_string());
        }
        if let Some(phone_number) = phone_number {
            if email.is_some() {
                builder.push(" OR ");
            }
            builder.push("phone_number = ");
            builder.push_bind(phone_number.to_string());
        }
        builder.push(" ORDER BY id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(contact_from_row).collect()
    }

    async fn find_by_linked_ids(&self, ids: &BTreeSet<ContactId>) -> Result<Vec<ContactRecord>> {
        self.select_where_in("linked_id", ids, "id").await
    }

    async fn find_by_ids(&self, ids: &BTreeSet<ContactId>) -> Result<Vec<ContactRecord>> {
        self.select_where_in("id", ids, "id").await
    }

    async fn find_by_ids_ordered_by_creation(
        &self,
        ids: &BTreeSet<ContactId>,
    ) -> Result<Vec<ContactRecord>> {
        self.select_where_in("id", ids, "created_at ASC, id ASC").await
    }

    async fn insert(&self, contact: NewContact) -> Result<ContactRecord> {
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "INSERT INTO contacts (email, phone_number, linked_id, link_precedence, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {}",
            CONTACT_COLUMNS
        ))
        .bind(&contact.email)
        .bind(&contact.phone_number)
        .bind(contact.linked_id)
        .bind(contact.link_precedence.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        contact_from_row(&row)
    }

    async fn update_link(
        &self,
        id: ContactId,
        linked_id: Option<ContactId>,
        precedence: LinkPrecedence,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE contacts SET linked_id = ?, link_precedence = ?, updated_at = ? WHERE id = ?",
        )
        .bind(linked_id)
        .bind(precedence.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_linked_id(
        &self,
        filter_linked_id: ContactId,
        new_linked_id: ContactId,
    ) -> Result<u64> {
        let result =
            sqlx::query("UPDATE contacts SET linked_id = ?, updated_at = ? WHERE linked_id = ?")
                .bind(new_linked_id)
                .bind(Utc::now())
                .bind(filter_linked_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
