//! Core domain logic for listvault, a CRUD service for owner-scoped,
//! schema-validated user lists.
//! This crate is the single source of truth for business invariants.

pub mod authz;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;
pub mod service;

pub use authz::{
    list_resource_path, lists_collection_path, user_library_path, AccessMethod, Authorizer,
    AuthzUnreachable, OwnerPolicy,
};
pub use config::{CoreConfig, DEFAULT_MAX_LISTS, DEFAULT_MAX_LIST_ITEMS};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::list::{
    AuthzDescriptor, ItemMap, ListDraft, ListId, ListPayload, ListRecord, ListValidationError,
};
pub use repo::list_repo::{ListStore, SqliteListStore, StoreError, StoreResult};
pub use schema::registry::{FieldSpec, FieldType, ItemSchema, SchemaDefinitionError, SchemaRegistry};
pub use schema::validator::{validate_item, SchemaValidationError, ValidationFailure};
pub use service::capacity::CapacityError;
pub use service::changeset::ChangeSet;
pub use service::list_service::{response_map, ListService, ListServiceError};
pub use service::reconciler::UpsertOutcome;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
