//! List use-case service.
//!
//! # Responsibility
//! - Provide the authorize-first entry points for every list operation.
//! - Run each operation's store work inside one transaction.
//! - Assemble the id-keyed response mapping consumed by transport layers.
//!
//! # Invariants
//! - No store call happens before the authorization decision.
//! - A batch either commits completely or leaves storage untouched.
//! - An update that changes nothing allow-listed is a conflict, not a no-op.

use crate::authz::{
    list_resource_path, lists_collection_path, AccessMethod, Authorizer, AuthzUnreachable,
};
use crate::config::CoreConfig;
use crate::db::DbError;
use crate::model::list::{ItemMap, ListId, ListPayload, ListRecord, ListValidationError};
use crate::repo::list_repo::{ListStore, SqliteListStore, StoreError};
use crate::schema::validator::{validate_item, SchemaValidationError};
use crate::service::capacity::{check_item_count, CapacityError};
use crate::service::reconciler::{reconcile_batch, UpsertOutcome};
use chrono::Utc;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error taxonomy for list use-cases.
#[derive(Debug)]
pub enum ListServiceError {
    /// An item failed structural validation; the batch was not applied.
    Schema(SchemaValidationError),
    /// A payload violated a model invariant (empty name, bad descriptor).
    InvalidPayload(ListValidationError),
    /// A create or append carried zero items.
    EmptyItems { name: String },
    /// An update payload produced no allow-listed field difference.
    NothingToUpdate { name: String },
    /// A capacity ceiling was exceeded; nothing was written for the batch.
    Capacity(CapacityError),
    /// Referenced list id has no matching record.
    NotFound(ListId),
    /// (`creator`, `name`) uniqueness violated at commit time.
    DuplicateName { creator: String, name: String },
    /// Policy engine explicitly refused the operation.
    AuthorizationDenied {
        user: String,
        method: AccessMethod,
        resource: String,
    },
    /// Policy engine could not be consulted; distinct from a deny.
    AuthorizationUnreachable(AuthzUnreachable),
    /// Any other persistence-layer failure; the transaction rolled back.
    Storage(StoreError),
}

impl Display for ListServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "{err}"),
            Self::InvalidPayload(err) => write!(f, "{err}"),
            Self::EmptyItems { name } => {
                write!(f, "list `{name}`: payload must carry at least one item")
            }
            Self::NothingToUpdate { name } => {
                write!(f, "list `{name}`: update changes no updatable field")
            }
            Self::Capacity(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "list not found: {id}"),
            Self::DuplicateName { creator, name } => {
                write!(f, "list name `{name}` already exists for creator `{creator}`")
            }
            Self::AuthorizationDenied {
                user,
                method,
                resource,
            } => write!(f, "user `{user}` denied {method} on {resource}"),
            Self::AuthorizationUnreachable(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ListServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::InvalidPayload(err) => Some(err),
            Self::Capacity(err) => Some(err),
            Self::AuthorizationUnreachable(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaValidationError> for ListServiceError {
    fn from(value: SchemaValidationError) -> Self {
        Self::Schema(value)
    }
}

impl From<ListValidationError> for ListServiceError {
    fn from(value: ListValidationError) -> Self {
        Self::InvalidPayload(value)
    }
}

impl From<CapacityError> for ListServiceError {
    fn from(value: CapacityError) -> Self {
        Self::Capacity(value)
    }
}

impl From<AuthzUnreachable> for ListServiceError {
    fn from(value: AuthzUnreachable) -> Self {
        Self::AuthorizationUnreachable(value)
    }
}

impl From<StoreError> for ListServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::DuplicateName { creator, name } => Self::DuplicateName { creator, name },
            StoreError::Validation(err) => Self::InvalidPayload(err),
            other => Self::Storage(other),
        }
    }
}

impl From<rusqlite::Error> for ListServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(StoreError::Db(DbError::Sqlite(value)))
    }
}

/// Use-case service facade over the SQLite list store.
///
/// Holds the connection mutably so every operation can own one transaction:
/// begin on entry, commit on success, roll back when the transaction drops on
/// an error path.
pub struct ListService<'a, A: Authorizer> {
    conn: &'a mut Connection,
    config: &'a CoreConfig,
    authorizer: A,
}

impl<'a, A: Authorizer> ListService<'a, A> {
    /// Creates a service over a migrated connection.
    pub fn new(conn: &'a mut Connection, config: &'a CoreConfig, authorizer: A) -> Self {
        Self {
            conn,
            config,
            authorizer,
        }
    }

    /// Reconciles a payload batch for `owner`: creates lists with no stored
    /// (owner, name) match, updates the rest, all-or-nothing.
    pub fn upsert_batch(
        &mut self,
        owner: &str,
        payloads: Vec<ListPayload>,
    ) -> Result<UpsertOutcome, ListServiceError> {
        self.require(owner, AccessMethod::Create, &lists_collection_path(owner))?;

        let now = Utc::now();
        let batch_size = payloads.len();
        let tx = self.conn.transaction()?;
        let outcome = {
            let store = SqliteListStore::try_new(&tx)?;
            reconcile_batch(&store, self.config, owner, payloads, now)?
        };
        tx.commit()?;

        info!(
            "event=lists_upsert module=service status=ok owner={owner} batch={batch_size} created={} updated={}",
            outcome.created.len(),
            outcome.updated.len()
        );
        Ok(outcome)
    }

    /// Gets one list by id.
    pub fn get_list(&mut self, user: &str, id: ListId) -> Result<ListRecord, ListServiceError> {
        self.require(user, AccessMethod::Read, &list_resource_path(user, id))?;

        let store = SqliteListStore::try_new(self.conn)?;
        owned_by(store.get_by_id(id)?, user, id)
    }

    /// Fully overwrites one list's mutable content, preserving its id.
    ///
    /// `creator`, `created_time`, and the id-scoped authz descriptor survive
    /// the overwrite; `updated_time` is refreshed.
    pub fn replace_list(
        &mut self,
        user: &str,
        id: ListId,
        payload: ListPayload,
    ) -> Result<ListRecord, ListServiceError> {
        self.require(user, AccessMethod::Update, &list_resource_path(user, id))?;

        for (key, item) in &payload.items {
            validate_item(self.config.registry(), key, item)?;
        }

        let now = Utc::now();
        let tx = self.conn.transaction()?;
        let replaced = {
            let store = SqliteListStore::try_new(&tx)?;
            let existing = owned_by(store.get_by_id(id)?, user, id)?;
            check_item_count(
                existing.items.len(),
                payload.items.len(),
                self.config.max_list_items,
            )?;

            let record = ListRecord {
                id: existing.id,
                version: existing.version,
                creator: existing.creator,
                name: payload.name,
                authz: existing.authz,
                created_time: existing.created_time,
                updated_time: now,
                items: payload.items,
            };
            store.replace(&record)?
        };
        tx.commit()?;

        Ok(replaced)
    }

    /// Merges `items` into one list; key collisions overwrite stored items.
    ///
    /// Rejects empty payloads and enforces the item ceiling against the
    /// post-merge total.
    pub fn append_items(
        &mut self,
        user: &str,
        id: ListId,
        items: ItemMap,
    ) -> Result<ListRecord, ListServiceError> {
        self.require(user, AccessMethod::Update, &list_resource_path(user, id))?;

        for (key, item) in &items {
            validate_item(self.config.registry(), key, item)?;
        }

        let now = Utc::now();
        let tx = self.conn.transaction()?;
        let merged = {
            let store = SqliteListStore::try_new(&tx)?;
            let existing = owned_by(store.get_by_id(id)?, user, id)?;
            if items.is_empty() {
                return Err(ListServiceError::EmptyItems {
                    name: existing.name,
                });
            }

            // Collisions overwrite, so the bound applies to the union count,
            // not existing + incoming.
            let merged_count = existing
                .items
                .keys()
                .chain(items.keys())
                .collect::<std::collections::BTreeSet<_>>()
                .len();
            check_item_count(existing.items.len(), merged_count, self.config.max_list_items)?;

            store.merge_items(id, &items, now)?
        };
        tx.commit()?;

        Ok(merged)
    }

    /// Deletes one list by id. Deleting a missing id is reported as
    /// `NotFound`, not as success.
    pub fn delete_list(&mut self, user: &str, id: ListId) -> Result<(), ListServiceError> {
        self.require(user, AccessMethod::Delete, &list_resource_path(user, id))?;

        let store = SqliteListStore::try_new(self.conn)?;
        owned_by(store.get_by_id(id)?, user, id)?;
        if store.delete_by_id(id)? == 0 {
            return Err(ListServiceError::NotFound(id));
        }

        info!("event=list_delete module=service status=ok user={user} id={id}");
        Ok(())
    }

    /// Deletes every list of `owner`. Returns the number of lists removed.
    pub fn delete_all_lists(&mut self, owner: &str) -> Result<usize, ListServiceError> {
        self.require(owner, AccessMethod::Delete, &lists_collection_path(owner))?;

        let store = SqliteListStore::try_new(self.conn)?;
        let deleted = store.delete_all_for_owner(owner)?;

        info!("event=lists_delete_all module=service status=ok owner={owner} deleted={deleted}");
        Ok(deleted)
    }

    fn require(
        &self,
        user: &str,
        method: AccessMethod,
        resource: &str,
    ) -> Result<(), ListServiceError> {
        let allowed = self.authorizer.authorize(user, method, resource)?;
        if !allowed {
            return Err(ListServiceError::AuthorizationDenied {
                user: user.to_string(),
                method,
                resource: resource.to_string(),
            });
        }
        Ok(())
    }
}

/// A record only exists for callers who own it; foreign ids read as absent.
fn owned_by(
    record: Option<ListRecord>,
    user: &str,
    id: ListId,
) -> Result<ListRecord, ListServiceError> {
    match record {
        Some(record) if record.creator == user => Ok(record),
        _ => Err(ListServiceError::NotFound(id)),
    }
}

/// Assembles the transport-facing response mapping: list id as the outer key,
/// the `id` field stripped from each nested body, timestamps RFC 3339.
pub fn response_map<'r>(
    records: impl IntoIterator<Item = &'r ListRecord>,
) -> serde_json::Map<String, serde_json::Value> {
    records
        .into_iter()
        .map(|record| (record.id.to_string(), record.to_response_body()))
        .collect()
}
