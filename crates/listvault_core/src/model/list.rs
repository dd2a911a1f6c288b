//! List record domain model.
//!
//! # Responsibility
//! - Define the canonical record for one owner's named list of items.
//! - Provide the draft shape used before persistence assigns an id.
//! - Own access-descriptor construction for both authz phases.
//!
//! # Invariants
//! - `id` is stable and never reused for another list.
//! - `created_time == updated_time` at creation; `updated_time` never moves
//!   backwards afterwards.
//! - `authz.authz` carries exactly one resource path, id-scoped once the id
//!   is known.

use crate::authz::{list_resource_path, lists_collection_path};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every persisted list.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ListId = Uuid;

/// Item payloads keyed by an opaque label or URI-like reference.
///
/// `BTreeMap` keeps iteration deterministic for diffing and serialization.
pub type ItemMap = BTreeMap<String, serde_json::Value>;

/// Version value assigned to every record at creation.
///
/// The field is a placeholder for optimistic-concurrency support; nothing
/// increments it yet.
pub const INITIAL_VERSION: i64 = 0;

/// Structured access descriptor stored with every record.
///
/// Built in two phases: owner-scoped before persistence assigns an id,
/// corrected to an id-scoped path in the same transaction afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthzDescriptor {
    /// Descriptor schema version. Currently always 0.
    pub version: i64,
    /// Resource paths this record is guarded by. Exactly one entry.
    pub authz: Vec<String>,
}

impl AuthzDescriptor {
    /// Owner-scoped provisional descriptor for a record without an id.
    pub fn provisional(owner: &str) -> Self {
        Self {
            version: 0,
            authz: vec![lists_collection_path(owner)],
        }
    }

    /// Id-scoped descriptor applied once persistence has assigned the id.
    pub fn for_list(owner: &str, id: ListId) -> Self {
        Self {
            version: 0,
            authz: vec![list_resource_path(owner, id)],
        }
    }
}

/// Client-submitted shape for one list in an upsert batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPayload {
    /// Desired list name, unique per owner.
    pub name: String,
    /// Full desired item set (not a delta).
    #[serde(default)]
    pub items: ItemMap,
}

/// Candidate record built from a payload, before an id exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDraft {
    pub version: i64,
    pub creator: String,
    pub name: String,
    pub authz: AuthzDescriptor,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
    pub items: ItemMap,
}

impl ListDraft {
    /// Builds a creation candidate with the provisional owner-scoped
    /// descriptor and equal creation/update timestamps.
    pub fn new(owner: &str, payload: ListPayload, now: DateTime<Utc>) -> Self {
        Self {
            version: INITIAL_VERSION,
            creator: owner.to_string(),
            name: payload.name,
            authz: AuthzDescriptor::provisional(owner),
            created_time: now,
            updated_time: now,
            items: payload.items,
        }
    }

    /// Validates draft-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ListValidationError> {
        validate_parts(&self.creator, &self.name, &self.authz)
    }
}

/// Canonical persisted record for one owner's named list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRecord {
    /// Stable global id, assigned by the persistence gateway at insert.
    pub id: ListId,
    /// Placeholder for optimistic concurrency. Always 0 today.
    pub version: i64,
    /// Authenticated principal that created the list. Immutable.
    pub creator: String,
    /// List name, unique per creator. Mutable under the same uniqueness rule.
    pub name: String,
    /// Structured access descriptor, id-scoped once persisted.
    pub authz: AuthzDescriptor,
    /// Creation timestamp. Immutable.
    pub created_time: DateTime<Utc>,
    /// Refreshed on every successful field mutation.
    pub updated_time: DateTime<Utc>,
    /// Item payloads keyed by label or URI-like reference. May be empty.
    pub items: ItemMap,
}

impl ListRecord {
    /// Validates record-level invariants.
    ///
    /// Read paths use this to reject corrupt persisted state instead of
    /// masking it; write paths use it before SQL mutations.
    pub fn validate(&self) -> Result<(), ListValidationError> {
        validate_parts(&self.creator, &self.name, &self.authz)?;
        if self.updated_time < self.created_time {
            return Err(ListValidationError::UpdatedBeforeCreated {
                created_time: self.created_time,
                updated_time: self.updated_time,
            });
        }
        Ok(())
    }

    /// Serializes the record for the response envelope: all fields except
    /// `id` (the id is exposed as the outer map key), timestamps RFC 3339.
    pub fn to_response_body(&self) -> serde_json::Value {
        serde_json::json!({
            "version": self.version,
            "creator": self.creator,
            "name": self.name,
            "authz": self.authz,
            "created_time": self.created_time.to_rfc3339(),
            "updated_time": self.updated_time.to_rfc3339(),
            "items": self.items,
        })
    }
}

fn validate_parts(
    creator: &str,
    name: &str,
    authz: &AuthzDescriptor,
) -> Result<(), ListValidationError> {
    if creator.trim().is_empty() {
        return Err(ListValidationError::EmptyCreator);
    }
    if name.trim().is_empty() {
        return Err(ListValidationError::EmptyName);
    }
    if authz.authz.len() != 1 {
        return Err(ListValidationError::InvalidAuthzPathCount(authz.authz.len()));
    }
    Ok(())
}

/// Model-level invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListValidationError {
    /// `creator` is empty or whitespace-only.
    EmptyCreator,
    /// `name` is empty or whitespace-only.
    EmptyName,
    /// `authz.authz` must hold exactly one resource path.
    InvalidAuthzPathCount(usize),
    /// `updated_time` precedes `created_time`.
    UpdatedBeforeCreated {
        created_time: DateTime<Utc>,
        updated_time: DateTime<Utc>,
    },
}

impl Display for ListValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCreator => write!(f, "list creator must not be empty"),
            Self::EmptyName => write!(f, "list name must not be empty"),
            Self::InvalidAuthzPathCount(count) => {
                write!(f, "authz descriptor must hold exactly one path, got {count}")
            }
            Self::UpdatedBeforeCreated {
                created_time,
                updated_time,
            } => write!(
                f,
                "updated_time {updated_time} precedes created_time {created_time}"
            ),
        }
    }
}

impl Error for ListValidationError {}
