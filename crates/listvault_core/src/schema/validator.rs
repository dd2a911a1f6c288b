//! Structural item validation against the schema registry.
//!
//! # Responsibility
//! - Validate one item payload against the schema its type tag selects.
//! - Report precise, item-keyed failures so whole batches can abort early.
//!
//! # Invariants
//! - Validation has no side effects and touches no storage.
//! - Every item of a batch is validated before any persistence call.

use crate::schema::registry::{ItemSchema, SchemaRegistry, TYPE_FIELD};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Structural validation failure for one item payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidationError {
    /// Key of the offending item within its list payload.
    pub item_key: String,
    /// What the item failed to satisfy.
    pub reason: ValidationFailure,
}

/// Concrete reasons an item payload can fail validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Item value is not a JSON object.
    NotAnObject,
    /// Item key is empty or whitespace-only.
    EmptyItemKey,
    /// The `type` tag is present but not a string.
    NonStringTypeTag,
    /// A required field is absent.
    MissingField { field: String },
    /// A field is present with the wrong structural kind.
    WrongFieldKind { field: String, expected: &'static str },
}

impl Display for SchemaValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "item `{}`: ", self.item_key)?;
        match &self.reason {
            ValidationFailure::NotAnObject => write!(f, "payload must be a JSON object"),
            ValidationFailure::EmptyItemKey => write!(f, "item key must not be empty"),
            ValidationFailure::NonStringTypeTag => {
                write!(f, "`{TYPE_FIELD}` tag must be a string")
            }
            ValidationFailure::MissingField { field } => {
                write!(f, "required field `{field}` is missing")
            }
            ValidationFailure::WrongFieldKind { field, expected } => {
                write!(f, "field `{field}` must be of kind `{expected}`")
            }
        }
    }
}

impl Error for SchemaValidationError {}

/// Validates one item payload against the registry.
///
/// Resolves the schema from the item's own `type` tag; items without a
/// recognized tag are held to the generic fallback schema.
pub fn validate_item(
    registry: &SchemaRegistry,
    item_key: &str,
    item: &serde_json::Value,
) -> Result<(), SchemaValidationError> {
    let fail = |reason| SchemaValidationError {
        item_key: item_key.to_string(),
        reason,
    };

    if item_key.trim().is_empty() {
        return Err(fail(ValidationFailure::EmptyItemKey));
    }

    let body = item
        .as_object()
        .ok_or_else(|| fail(ValidationFailure::NotAnObject))?;

    let tag = match body.get(TYPE_FIELD) {
        None => None,
        Some(value) => Some(
            value
                .as_str()
                .ok_or_else(|| fail(ValidationFailure::NonStringTypeTag))?,
        ),
    };

    check_against(registry.schema_for(tag), body, item_key)
}

fn check_against(
    schema: &ItemSchema,
    body: &serde_json::Map<String, serde_json::Value>,
    item_key: &str,
) -> Result<(), SchemaValidationError> {
    let fail = |reason| SchemaValidationError {
        item_key: item_key.to_string(),
        reason,
    };

    for field in &schema.required {
        match body.get(&field.name) {
            None => {
                return Err(fail(ValidationFailure::MissingField {
                    field: field.name.clone(),
                }))
            }
            Some(value) if !field.kind.matches(value) => {
                return Err(fail(ValidationFailure::WrongFieldKind {
                    field: field.name.clone(),
                    expected: field.kind.as_str(),
                }))
            }
            Some(_) => {}
        }
    }

    for field in &schema.optional {
        if let Some(value) = body.get(&field.name) {
            if !field.kind.matches(value) {
                return Err(fail(ValidationFailure::WrongFieldKind {
                    field: field.name.clone(),
                    expected: field.kind.as_str(),
                }));
            }
        }
    }

    Ok(())
}
