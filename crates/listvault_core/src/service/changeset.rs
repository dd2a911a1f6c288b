//! Allow-listed field diff between a stored record and a proposal.
//!
//! # Responsibility
//! - Compute which mutable fields an update actually changes.
//!
//! # Invariants
//! - Only `name` and `items` are diffable; `id`, `creator`, `created_time`
//!   and `authz` are never compared or patched.
//! - Timestamps are excluded by construction, so a timestamp-only difference
//!   can never count as a change.

use crate::model::list::{ItemMap, ListRecord};

/// The minimal allow-listed patch an update stages against one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// New name, when it differs from the stored one.
    pub name: Option<String>,
    /// New full item set, when it differs from the stored one.
    pub items: Option<ItemMap>,
}

impl ChangeSet {
    /// An empty change-set means the update would alter nothing allow-listed.
    ///
    /// Callers must treat this as a `NothingToUpdate` conflict, not as a
    /// silent no-op success.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.items.is_none()
    }
}

/// Computes the allow-listed difference between `existing` and a proposal.
pub fn diff(existing: &ListRecord, proposed_name: &str, proposed_items: &ItemMap) -> ChangeSet {
    let mut changes = ChangeSet::default();

    if existing.name != proposed_name {
        changes.name = Some(proposed_name.to_string());
    }
    if &existing.items != proposed_items {
        changes.items = Some(proposed_items.clone());
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::diff;
    use crate::model::list::{ListDraft, ListPayload, ListRecord};
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn stored(name: &str, items: &[(&str, serde_json::Value)]) -> ListRecord {
        let draft = ListDraft::new(
            "1",
            ListPayload {
                name: name.to_string(),
                items: items
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.clone()))
                    .collect(),
            },
            Utc::now(),
        );
        ListRecord {
            id: Uuid::new_v4(),
            version: draft.version,
            creator: draft.creator,
            name: draft.name,
            authz: draft.authz,
            created_time: draft.created_time,
            updated_time: draft.updated_time,
            items: draft.items,
        }
    }

    #[test]
    fn identical_proposal_yields_empty_changeset() {
        let record = stored("L", &[("k", json!({"type": "X"}))]);
        let changes = diff(&record, "L", &record.items);
        assert!(changes.is_empty());
    }

    #[test]
    fn item_difference_is_detected() {
        let record = stored("L", &[("k", json!({"type": "X"}))]);
        let proposed = [("k".to_string(), json!({"type": "Y"}))].into_iter().collect();
        let changes = diff(&record, "L", &proposed);
        assert!(changes.name.is_none());
        assert_eq!(changes.items, Some(proposed));
    }

    #[test]
    fn name_difference_is_detected() {
        let record = stored("L", &[]);
        let changes = diff(&record, "Renamed", &record.items);
        assert_eq!(changes.name.as_deref(), Some("Renamed"));
        assert!(changes.items.is_none());
    }
}
