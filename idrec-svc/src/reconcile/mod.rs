//! Identity reconciliation
//!
//! `Reconciler::identify` folds an `{email?, phoneNumber?}` submission into
//! the contact graph:
//! 1. load the cluster reachable from the submitted identifiers
//! 2. with no cluster, store the submission as a new primary
//! 3. otherwise pick the oldest reachable primary as canonical, plan the
//!    writes (new secondary, demotions, re-links) and apply them
//! 4. reload the cluster and assemble the consolidated view
//!
//! After a merge every secondary links directly to the canonical primary.
//! Concurrent requests are not serialized here; two first-time submissions
//! racing on the same identifier can leave two primaries that merge on the
//! next request touching both.

use std::collections::BTreeSet;
use std::sync::Arc;

use idrec_common::{ContactRecord, ContactStore, LinkPrecedence, NewContact};
use tracing::{debug, info, warn};

use crate::error::Result;

pub mod plan;
pub mod view;

pub use plan::{Cluster, Identity, MergePlan};
pub use view::ConsolidatedView;

/// Consolidates contact submissions against a `ContactStore`
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn ContactStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }

    /// Resolve a submission to its consolidated contact
    ///
    /// Fails with `ReconcileError::Validation` when both identifiers are
    /// absent or empty; store failures propagate unchanged.
    pub async fn identify(
        &self,
        email: Option<String>,
        phone_number: Option<String>,
    ) -> Result<ConsolidatedView> {
        let identity = Identity::new(email, phone_number)?;

        let cluster = self.find_related(&identity).await?;
        debug!(cluster_size = cluster.len(), "Loaded contact cluster");

        let Some(first) = cluster.first().cloned() else {
            return self.create_primary(&identity).await;
        };

        let candidates = self
            .store
            .find_by_ids_ordered_by_creation(&cluster.primary_candidates())
            .await?;
        let canonical = plan::choose_canonical(candidates, first);

        let merge = plan::plan_merge(&cluster, &canonical, &identity);
        if !merge.is_noop() {
            self.apply(&merge).await?;
        }

        let refreshed = self.load_consolidated(&identity, &canonical).await?;
        Ok(view::assemble(&canonical, refreshed.records()))
    }

    /// Direct matches plus one hop in each direction: records linked to a
    /// match, and the records each match links to.
    async fn find_related(&self, identity: &Identity) -> Result<Cluster> {
        let direct = self
            .store
            .find_by_email_or_phone(identity.email(), identity.phone_number())
            .await?;

        if direct.is_empty() {
            return Ok(Cluster::default());
        }

        let direct_ids: BTreeSet<_> = direct.iter().map(|c| c.id).collect();
        let link_targets: BTreeSet<_> = direct.iter().filter_map(|c| c.linked_id).collect();

        let linked = self.store.find_by_linked_ids(&direct_ids).await?;
        let targets = self.store.find_by_ids(&link_targets).await?;

        debug!(
            direct = direct.len(),
            linked = linked.len(),
            targets = targets.len(),
            "Expanded direct matches"
        );

        let mut cluster = Cluster::from_records(direct);
        cluster.extend(linked);
        cluster.extend(targets);
        Ok(cluster)
    }

    /// Reload the cluster after writes and warn about any link that is
    /// still not flat
    async fn load_consolidated(
        &self,
        identity: &Identity,
        canonical: &ContactRecord,
    ) -> Result<Cluster> {
        let cluster = self.find_related(identity).await?;

        let stray = cluster.stray_links(canonical.id);
        if !stray.is_empty() {
            warn!(
                primary_id = canonical.id,
                ?stray,
                "Cluster still has records not linked to its primary"
            );
        }

        Ok(cluster)
    }

    async fn create_primary(&self, identity: &Identity) -> Result<ConsolidatedView> {
        let created = self
            .store
            .insert(NewContact::primary(
                identity.email().map(str::to_string),
                identity.phone_number().map(str::to_string),
            ))
            .await?;

        info!(contact_id = created.id, "Created primary contact");
        Ok(view::assemble(&created, std::slice::from_ref(&created)))
    }

    async fn apply(&self, merge: &MergePlan) -> Result<()> {
        if let Some(contact) = &merge.new_secondary {
            let created = self.store.insert(contact.clone()).await?;
            info!(
                contact_id = created.id,
                primary_id = merge.canonical_id,
                "Created secondary contact"
            );
        }

        for &demoted in &merge.demotions {
            self.store
                .update_link(demoted, Some(merge.canonical_id), LinkPrecedence::Secondary)
                .await?;
            let relinked = self
                .store
                .update_linked_id(demoted, merge.canonical_id)
                .await?;

            info!(
                contact_id = demoted,
                primary_id = merge.canonical_id,
                relinked,
                "Demoted primary contact"
            );
        }

        Ok(())
    }
}
