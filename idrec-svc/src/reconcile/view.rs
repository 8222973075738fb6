//! Consolidated contact view

use serde::{Deserialize, Serialize};

use idrec_common::{ContactId, ContactRecord};

/// Consolidated identity returned by `identify`
///
/// The primary's own email and phone number, when present, sit at index 0
/// of their lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedView {
    pub primary_contact_id: ContactId,
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub secondary_contact_ids: Vec<ContactId>,
}

/// Build the view for `primary` over `records`
///
/// `records` should include the primary; when empty the primary alone is
/// used.
pub fn assemble(primary: &ContactRecord, records: &[ContactRecord]) -> ConsolidatedView {
    let records = if records.is_empty() {
        std::slice::from_ref(primary)
    } else {
        records
    };

    let emails = distinct_primary_first(
        primary.email.as_deref(),
        records.iter().map(|r| r.email.as_deref()),
    );
    let phone_numbers = distinct_primary_first(
        primary.phone_number.as_deref(),
        records.iter().map(|r| r.phone_number.as_deref()),
    );

    let mut secondary_contact_ids = Vec::new();
    for record in records.iter().filter(|r| r.is_secondary()) {
        if !secondary_contact_ids.contains(&record.id) {
            secondary_contact_ids.push(record.id);
        }
    }

    ConsolidatedView {
        primary_contact_id: primary.id,
        emails,
        phone_numbers,
        secondary_contact_ids,
    }
}

fn distinct_primary_first<'a>(
    first: Option<&'a str>,
    rest: impl Iterator<Item = Option<&'a str>>,
) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for value in std::iter::once(first).chain(rest).flatten() {
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }
    values
}
