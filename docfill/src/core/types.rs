//! Shared deterministic types for template definitions and generated fields.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across runs.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::placeholders::extract_dependencies;
use crate::error::DefinitionError;

/// Where a field's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    /// Supplied by the caller.
    Input,
    /// Produced by the generation loop.
    Auto,
}

/// Serialized form of a field definition, before dependency extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFieldDefinition {
    id: String,
    source: SourceType,
    schema: Value,
    #[serde(default)]
    instructions: String,
}

/// A single fillable field of a template.
///
/// `dependencies` is derived from the placeholders in `instructions` when the
/// definition is built and cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldDefinition", into = "RawFieldDefinition")]
pub struct FieldDefinition {
    id: String,
    source: SourceType,
    schema: Value,
    instructions: String,
    dependencies: BTreeSet<String>,
}

impl FieldDefinition {
    /// Build a definition, scanning `instructions` for referenced field ids.
    pub fn new(
        id: impl Into<String>,
        source: SourceType,
        schema: Value,
        instructions: impl Into<String>,
    ) -> Result<Self, DefinitionError> {
        let id = id.into();
        let instructions = instructions.into();
        let dependencies = extract_dependencies(&instructions).map_err(|detail| {
            DefinitionError::InvalidInstructions {
                field: id.clone(),
                detail,
            }
        })?;
        Ok(Self {
            id,
            source,
            schema,
            instructions,
            dependencies,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> SourceType {
        self.source
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Field ids referenced by `instructions`, in lexicographic order.
    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }
}

impl TryFrom<RawFieldDefinition> for FieldDefinition {
    type Error = DefinitionError;

    fn try_from(raw: RawFieldDefinition) -> Result<Self, Self::Error> {
        FieldDefinition::new(raw.id, raw.source, raw.schema, raw.instructions)
    }
}

impl From<FieldDefinition> for RawFieldDefinition {
    fn from(def: FieldDefinition) -> Self {
        Self {
            id: def.id,
            source: def.source,
            schema: def.schema,
            instructions: def.instructions,
        }
    }
}

/// A document template together with the fields needed to fill it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub name: String,
    /// Document template reference. Opaque to the generation core.
    pub file: PathBuf,
    #[serde(default)]
    pub description: String,
    /// Global guidance passed to the model backend as the system prompt.
    #[serde(default)]
    pub instructions: String,
    pub fields: Vec<FieldDefinition>,
}

impl TemplateDefinition {
    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.id() == id)
    }

    /// Ids of fields the caller must supply, in definition order.
    pub fn required_inputs(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|field| field.source() == SourceType::Input)
            .map(FieldDefinition::id)
    }
}

/// A resolved field value produced during a single generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub value: Value,
}

impl Field {
    pub fn new(id: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// Parsing strategy selected from a field schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaShape {
    /// A single primitive value.
    Simple,
    /// An array of primitive values.
    SimpleArray,
    /// An object, or an array of objects.
    Complex,
}
