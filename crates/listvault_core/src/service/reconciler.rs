//! Batch upsert reconciliation for one owner's submitted lists.
//!
//! # Responsibility
//! - Partition a payload batch into creates and updates by (owner, name).
//! - Run every pre-write gate (validation, capacity, change-set) before the
//!   first persistence write.
//!
//! # Invariants
//! - Any gate failure aborts the whole batch with no record touched.
//! - Existing matches are fetched in one batched lookup, never per payload.
//! - Created records leave this module with id-scoped authz descriptors.

use crate::config::CoreConfig;
use crate::model::list::{AuthzDescriptor, ListDraft, ListId, ListPayload, ListRecord};
use crate::repo::list_repo::ListStore;
use crate::schema::validator::validate_item;
use crate::service::capacity::{check_item_count, check_list_count};
use crate::service::changeset::{diff, ChangeSet};
use crate::service::list_service::ListServiceError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Records affected by one reconciled batch.
#[derive(Debug, Clone, Default)]
pub struct UpsertOutcome {
    /// Freshly created records, id-scoped authz already applied.
    pub created: Vec<ListRecord>,
    /// Records updated through staged field patches.
    pub updated: Vec<ListRecord>,
}

impl UpsertOutcome {
    /// All affected records in creation-then-update order.
    pub fn records(&self) -> impl Iterator<Item = &ListRecord> {
        self.created.iter().chain(self.updated.iter())
    }
}

/// A staged update: the matched record plus its allow-listed patch.
struct StagedUpdate {
    id: ListId,
    changes: ChangeSet,
}

/// Reconciles one owner's payload batch against stored state.
///
/// Implements the all-or-nothing pipeline: item validation, draft
/// construction, last-wins keying by name, one batched existence lookup,
/// create/update partition, capacity gates, change-set staging, and finally
/// the writes. Callers run this inside one transaction so a storage fault
/// cannot leave a partial batch behind.
pub fn reconcile_batch<S: ListStore>(
    store: &S,
    config: &CoreConfig,
    owner: &str,
    payloads: Vec<ListPayload>,
    now: DateTime<Utc>,
) -> Result<UpsertOutcome, ListServiceError> {
    // Gate 1: every item of every payload, before anything else.
    for payload in &payloads {
        for (key, item) in &payload.items {
            validate_item(config.registry(), key, item)?;
        }
    }

    // Duplicate names within one batch collapse last-wins; only the keyed
    // mapping survives.
    let mut candidates: BTreeMap<String, ListDraft> = BTreeMap::new();
    for payload in payloads {
        let draft = ListDraft::new(owner, payload, now);
        draft.validate()?;
        candidates.insert(draft.name.clone(), draft);
    }

    let names: Vec<String> = candidates.keys().cloned().collect();
    let existing_by_name: BTreeMap<String, ListRecord> = store
        .get_all_matching(owner, &names)?
        .into_iter()
        .map(|record| (record.name.clone(), record))
        .collect();

    let mut to_create: Vec<ListDraft> = Vec::new();
    let mut matched: Vec<(ListDraft, &ListRecord)> = Vec::new();
    for (name, draft) in candidates {
        match existing_by_name.get(&name) {
            None => to_create.push(draft),
            Some(existing) => matched.push((draft, existing)),
        }
    }

    check_list_count(store.count_for_owner(owner)?, to_create.len(), config.max_lists)?;

    let mut to_update: Vec<StagedUpdate> = Vec::new();
    for (draft, existing) in matched {
        check_item_count(
            existing.items.len(),
            draft.items.len(),
            config.max_list_items,
        )?;
        let changes = diff(existing, &draft.name, &draft.items);
        if changes.is_empty() {
            return Err(ListServiceError::NothingToUpdate { name: draft.name });
        }
        to_update.push(StagedUpdate {
            id: existing.id,
            changes,
        });
    }

    for draft in &to_create {
        if draft.items.is_empty() {
            return Err(ListServiceError::EmptyItems {
                name: draft.name.clone(),
            });
        }
        check_item_count(0, draft.items.len(), config.max_list_items)?;
    }

    // Every gate has passed; from here on only storage faults can fail, and
    // the enclosing transaction rolls those back.
    let mut outcome = UpsertOutcome::default();

    for draft in to_create {
        let mut record = store.insert(&draft)?;
        let authz = AuthzDescriptor::for_list(owner, record.id);
        store.update_authz(record.id, &authz)?;
        record.authz = authz;
        outcome.created.push(record);
    }

    for staged in to_update {
        let record = store.apply_patch(
            staged.id,
            staged.changes.name.as_deref(),
            staged.changes.items.as_ref(),
            now,
        )?;
        outcome.updated.push(record);
    }

    Ok(outcome)
}
