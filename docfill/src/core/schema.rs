//! JSON Schema helpers: shape classification, definition checks, and validation.
//!
//! Field schemas follow JSON Schema Draft 7.

use jsonschema::{Draft, Validator};
use serde_json::Value;

use crate::core::types::SchemaShape;

/// Keywords allowed at the top level of a field schema.
///
/// Anything else is almost always a typo (`require`, `item`, `maxlength`) that
/// a lenient validator would silently ignore.
const DRAFT7_KEYWORDS: &[&str] = &[
    "$id",
    "$schema",
    "$ref",
    "$comment",
    "title",
    "description",
    "default",
    "readOnly",
    "writeOnly",
    "examples",
    "multipleOf",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "pattern",
    "additionalItems",
    "items",
    "maxItems",
    "minItems",
    "uniqueItems",
    "contains",
    "maxProperties",
    "minProperties",
    "required",
    "additionalProperties",
    "definitions",
    "properties",
    "patternProperties",
    "dependencies",
    "propertyNames",
    "const",
    "enum",
    "type",
    "format",
    "contentMediaType",
    "contentEncoding",
    "if",
    "then",
    "else",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
];

/// Classify a schema into the shape that decides how replies are parsed.
///
/// - `object` among the types -> `Complex`
/// - `array` whose `items` type includes `object` -> `Complex`
/// - any other `array` -> `SimpleArray`
/// - everything else -> `Simple`
pub fn classify_schema(schema: &Value) -> SchemaShape {
    let types = type_names(schema);
    if types.contains(&"object") {
        return SchemaShape::Complex;
    }
    if types.contains(&"array") {
        let item_types = schema.get("items").map(type_names).unwrap_or_default();
        if item_types.contains(&"object") {
            return SchemaShape::Complex;
        }
        return SchemaShape::SimpleArray;
    }
    SchemaShape::Simple
}

/// Type names declared by `type`, accepting either a string or a list.
pub fn type_names(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(name)) => vec![name.as_str()],
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Check that `schema` is usable as a field schema.
///
/// It must be a non-empty object, use only known top-level keywords, and be a
/// valid Draft 7 schema. Returns a human-readable reason on failure.
pub fn check_schema(schema: &Value) -> Result<(), String> {
    let object = schema
        .as_object()
        .ok_or_else(|| "schema must be a JSON object".to_string())?;
    if object.is_empty() {
        return Err("schema must not be empty".to_string());
    }

    let unknown: Vec<&str> = object
        .keys()
        .map(String::as_str)
        .filter(|key| !DRAFT7_KEYWORDS.contains(key))
        .collect();
    if !unknown.is_empty() {
        return Err(format!("unknown keyword(s): {}", unknown.join(", ")));
    }

    SchemaValidator::compile(schema).map(|_| ())
}

/// A compiled field schema.
pub struct SchemaValidator {
    compiled: Validator,
}

impl SchemaValidator {
    pub fn compile(schema: &Value) -> Result<Self, String> {
        let compiled = jsonschema::options()
            .with_draft(Draft::Draft7)
            .build(schema)
            .map_err(|err| err.to_string())?;
        Ok(Self { compiled })
    }

    /// Validate `instance`, joining every violation into one message.
    pub fn validate(&self, instance: &Value) -> Result<(), String> {
        let messages: Vec<String> = self
            .compiled
            .iter_errors(instance)
            .map(|err| err.to_string())
            .collect();
        if messages.is_empty() {
            return Ok(());
        }
        Err(messages.join("; "))
    }
}
