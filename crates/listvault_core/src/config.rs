//! Core configuration surface.
//!
//! # Responsibility
//! - Bundle capacity limits and the schema registry into one immutable
//!   object constructed at process start.
//!
//! # Invariants
//! - Configuration is never mutated after construction; components receive
//!   it by reference.

use crate::schema::registry::{ItemSchema, SchemaRegistry};

/// Default ceiling on stored lists per owner.
pub const DEFAULT_MAX_LISTS: usize = 100;
/// Default ceiling on items within one list.
pub const DEFAULT_MAX_LIST_ITEMS: usize = 100;

/// Immutable configuration injected into the service layer.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Maximum stored lists per owner.
    pub max_lists: usize,
    /// Maximum items within one list.
    pub max_list_items: usize,
    registry: SchemaRegistry,
}

impl CoreConfig {
    /// Builds a configuration with explicit limits and registry.
    pub fn new(max_lists: usize, max_list_items: usize, registry: SchemaRegistry) -> Self {
        Self {
            max_lists,
            max_list_items,
            registry,
        }
    }

    /// Builds a configuration with default limits and builtin schemas.
    pub fn with_defaults() -> Self {
        Self::new(
            DEFAULT_MAX_LISTS,
            DEFAULT_MAX_LIST_ITEMS,
            SchemaRegistry::builtin(),
        )
    }

    /// Resolves an item type tag to its governing schema.
    pub fn schema_for(&self, tag: Option<&str>) -> &ItemSchema {
        self.registry.schema_for(tag)
    }

    /// The schema registry backing `schema_for`.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }
}
