//! Type-tag keyed schema registry.
//!
//! # Responsibility
//! - Parse an external schema-definition document into an immutable table.
//! - Resolve a type tag (possibly absent) to the schema that governs it.
//!
//! # Invariants
//! - Field kinds are an enumerated closed set; no reflective dispatch.
//! - `schema_for` always returns a schema; the generic fallback is the
//!   explicit default arm.

use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Builtin schema definitions shipped with the crate.
const BUILTIN_DEFINITIONS: &str = include_str!("default_schemas.json");

/// Key every item schema checks for its type tag.
pub const TYPE_FIELD: &str = "type";

/// Closed set of structural kinds a schema field may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    /// Stable string id used in definition documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Parses one field kind from its definition string.
    pub fn parse(value: &str) -> Result<Self, SchemaDefinitionError> {
        match value {
            "string" => Ok(Self::String),
            "integer" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "object" => Ok(Self::Object),
            "array" => Ok(Self::Array),
            other => Err(SchemaDefinitionError::UnsupportedFieldType(
                other.to_string(),
            )),
        }
    }

    /// Returns whether `value` matches this structural kind.
    pub fn matches(self, value: &serde_json::Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// One required or optional field of an item schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldType,
}

/// Structural schema governing one item type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSchema {
    /// Fields that must be present with a matching kind.
    pub required: Vec<FieldSpec>,
    /// Fields that may be present; kind is checked when they are.
    pub optional: Vec<FieldSpec>,
}

impl ItemSchema {
    /// The generic fallback: any object carrying some string `type` field.
    ///
    /// Deliberately looser than every named schema so unrecognized item kinds
    /// can still round-trip through storage.
    pub fn generic() -> Self {
        Self {
            required: vec![FieldSpec {
                name: TYPE_FIELD.to_string(),
                kind: FieldType::String,
            }],
            optional: Vec::new(),
        }
    }
}

/// On-disk shape of one schema entry in the definition document.
#[derive(Debug, Deserialize)]
struct SchemaDefinition {
    #[serde(default)]
    required: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    optional: serde_json::Map<String, serde_json::Value>,
}

/// Immutable type-tag to schema table with an explicit generic fallback.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    by_type: HashMap<String, ItemSchema>,
    generic: ItemSchema,
}

impl SchemaRegistry {
    /// Builds the registry from a JSON definition document.
    ///
    /// The document maps type tags to `{required, optional}` field tables,
    /// each mapping a field name to its kind string.
    pub fn from_definition_str(source: &str) -> Result<Self, SchemaDefinitionError> {
        let definitions: HashMap<String, SchemaDefinition> =
            serde_json::from_str(source).map_err(SchemaDefinitionError::Malformed)?;

        let mut by_type = HashMap::with_capacity(definitions.len());
        for (tag, definition) in definitions {
            if tag.trim().is_empty() {
                return Err(SchemaDefinitionError::EmptyTypeTag);
            }
            let schema = ItemSchema {
                required: parse_fields(&tag, &definition.required)?,
                optional: parse_fields(&tag, &definition.optional)?,
            };
            by_type.insert(tag, schema);
        }

        Ok(Self {
            by_type,
            generic: ItemSchema::generic(),
        })
    }

    /// Builds the registry from a definition file on disk.
    pub fn from_definition_file(path: impl AsRef<Path>) -> Result<Self, SchemaDefinitionError> {
        let source = std::fs::read_to_string(path.as_ref())
            .map_err(|err| SchemaDefinitionError::Io(err.to_string()))?;
        Self::from_definition_str(&source)
    }

    /// Builds the registry from the builtin definitions.
    pub fn builtin() -> Self {
        Self::from_definition_str(BUILTIN_DEFINITIONS).expect("valid builtin schema definitions")
    }

    /// Resolves a type tag to its schema, defaulting to the generic fallback
    /// for absent or unrecognized tags.
    pub fn schema_for(&self, tag: Option<&str>) -> &ItemSchema {
        match tag {
            Some(tag) => self.by_type.get(tag).unwrap_or(&self.generic),
            None => &self.generic,
        }
    }

    /// Returns the registered type tags, for diagnostics.
    pub fn registered_types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }
}

fn parse_fields(
    tag: &str,
    table: &serde_json::Map<String, serde_json::Value>,
) -> Result<Vec<FieldSpec>, SchemaDefinitionError> {
    let mut fields = Vec::with_capacity(table.len());
    for (name, kind) in table {
        let kind = kind
            .as_str()
            .ok_or_else(|| SchemaDefinitionError::NonStringFieldType {
                type_tag: tag.to_string(),
                field: name.clone(),
            })?;
        fields.push(FieldSpec {
            name: name.clone(),
            kind: FieldType::parse(kind)?,
        });
    }
    Ok(fields)
}

/// Schema definition document errors.
#[derive(Debug)]
pub enum SchemaDefinitionError {
    /// Definition document is not valid JSON of the expected shape.
    Malformed(serde_json::Error),
    /// Definition file could not be read.
    Io(String),
    /// A type tag key is empty or whitespace-only.
    EmptyTypeTag,
    /// A field kind value is not a string.
    NonStringFieldType { type_tag: String, field: String },
    /// A field kind string is outside the supported set.
    UnsupportedFieldType(String),
}

impl Display for SchemaDefinitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed schema definitions: {err}"),
            Self::Io(detail) => write!(f, "cannot read schema definitions: {detail}"),
            Self::EmptyTypeTag => write!(f, "schema type tag must not be empty"),
            Self::NonStringFieldType { type_tag, field } => {
                write!(f, "field kind for `{type_tag}.{field}` must be a string")
            }
            Self::UnsupportedFieldType(kind) => {
                write!(f, "unsupported field kind `{kind}`")
            }
        }
    }
}

impl Error for SchemaDefinitionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            _ => None,
        }
    }
}
