//! Cluster snapshots and merge planning
//!
//! Everything here is pure: the reconciler loads a snapshot of the cluster
//! from the store, asks `plan_merge` what must change, and applies the
//! resulting `MergePlan` as a batch of writes.

use std::collections::BTreeSet;

use idrec_common::{ContactId, ContactRecord, NewContact};

use crate::error::{ReconcileError, Result, MISSING_IDENTIFIER};

/// A validated identity assertion
///
/// Empty strings count as absent; at least one field is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    email: Option<String>,
    phone_number: Option<String>,
}

impl Identity {
    pub fn new(email: Option<String>, phone_number: Option<String>) -> Result<Self> {
        let email = email.filter(|e| !e.is_empty());
        let phone_number = phone_number.filter(|p| !p.is_empty());

        if email.is_none() && phone_number.is_none() {
            return Err(ReconcileError::Validation(MISSING_IDENTIFIER.to_string()));
        }

        Ok(Self {
            email,
            phone_number,
        })
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }
}

/// Records reachable from a submission, de-duplicated by id
///
/// Keeps the order in which records were first added; the first record is
/// the fallback canonical primary.
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    records: Vec<ContactRecord>,
    ids: BTreeSet<ContactId>,
}

impl Cluster {
    pub fn from_records(records: impl IntoIterator<Item = ContactRecord>) -> Self {
        let mut cluster = Self::default();
        cluster.extend(records);
        cluster
    }

    /// Add records not already present (first occurrence wins)
    pub fn extend(&mut self, records: impl IntoIterator<Item = ContactRecord>) {
        for record in records {
            if self.ids.insert(record.id) {
                self.records.push(record);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[ContactRecord] {
        &self.records
    }

    pub fn first(&self) -> Option<&ContactRecord> {
        self.records.first()
    }

    pub fn contains_email(&self, email: &str) -> bool {
        self.records.iter().any(|r| r.email.as_deref() == Some(email))
    }

    pub fn contains_phone_number(&self, phone_number: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.phone_number.as_deref() == Some(phone_number))
    }

    /// Ids of every primary reachable from the cluster: records that are
    /// primary themselves plus the link targets of secondaries.
    pub fn primary_candidates(&self) -> BTreeSet<ContactId> {
        self.records
            .iter()
            .filter_map(|r| if r.is_primary() { Some(r.id) } else { r.linked_id })
            .collect()
    }

    /// Records that break flatness relative to `canonical_id`: another
    /// primary, or a secondary linked anywhere but the canonical primary.
    pub fn stray_links(&self, canonical_id: ContactId) -> Vec<ContactId> {
        self.records
            .iter()
            .filter(|r| r.id != canonical_id)
            .filter(|r| r.is_primary() || r.linked_id != Some(canonical_id))
            .map(|r| r.id)
            .collect()
    }
}

/// Pick the canonical primary
///
/// `ordered_candidates` must be oldest first. Falls back to `first`, the
/// first cluster record, when no candidate could be loaded.
pub fn choose_canonical(
    ordered_candidates: Vec<ContactRecord>,
    first: ContactRecord,
) -> ContactRecord {
    ordered_candidates.into_iter().next().unwrap_or(first)
}

/// Writes needed to consolidate a cluster under one primary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub canonical_id: ContactId,
    /// Secondary to insert when the submission carries unseen data
    pub new_secondary: Option<NewContact>,
    /// Competing primaries to demote; records linked to each are re-pointed
    /// at the canonical primary as well
    pub demotions: Vec<ContactId>,
}

impl MergePlan {
    pub fn is_noop(&self) -> bool {
        self.new_secondary.is_none() && self.demotions.is_empty()
    }
}

/// True when the submission names an email or phone number absent from
/// every record of the cluster
pub fn has_new_information(cluster: &Cluster, identity: &Identity) -> bool {
    let new_email = identity
        .email()
        .map_or(false, |email| !cluster.contains_email(email));
    let new_phone = identity
        .phone_number()
        .map_or(false, |phone| !cluster.contains_phone_number(phone));

    new_email || new_phone
}

/// Compute the consolidation writes for a non-empty cluster
///
/// The new secondary carries the submitted fields exactly as given, even
/// when only one of them is new.
pub fn plan_merge(cluster: &Cluster, canonical: &ContactRecord, identity: &Identity) -> MergePlan {
    let new_secondary = has_new_information(cluster, identity).then(|| {
        NewContact::secondary(
            identity.email.clone(),
            identity.phone_number.clone(),
            canonical.id,
        )
    });

    let demotions = cluster
        .records()
        .iter()
        .filter(|r| r.is_primary() && r.id != canonical.id)
        .map(|r| r.id)
        .collect();

    MergePlan {
        canonical_id: canonical.id,
        new_secondary,
        demotions,
    }
}
