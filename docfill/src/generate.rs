//! Field generation orchestrator.
//!
//! Walks the template's fields in dependency order and asks the answer loop for
//! every AUTO field, feeding it the values of the fields it depends on.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::answer::SchemaAnswerer;
use crate::core::graph::sort_fields;
use crate::core::placeholders::substitute;
use crate::core::types::{Field, FieldDefinition, SourceType, TemplateDefinition};
use crate::error::GenerationError;
use crate::io::backend::ModelBackend;

/// Ids of required INPUT fields absent from `inputs`, sorted.
pub fn missing_inputs(template: &TemplateDefinition, inputs: &[Field]) -> Vec<String> {
    let provided: BTreeSet<&str> = inputs.iter().map(|field| field.id.as_str()).collect();
    template
        .required_inputs()
        .filter(|id| !provided.contains(id))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Produce every field value of `template`.
///
/// Returns the given inputs in their original order followed by AUTO fields in
/// generation order. Fails before any model call when an INPUT is missing. The
/// template's `instructions` become the system prompt of every model call.
#[instrument(
    skip_all,
    fields(template = %template.name, inputs = inputs.len(), max_attempts = max_attempts)
)]
pub fn generate_fields<B: ModelBackend>(
    template: &TemplateDefinition,
    inputs: &[Field],
    backend: B,
    max_attempts: u32,
) -> Result<Vec<Field>, GenerationError> {
    let missing = missing_inputs(template, inputs);
    if !missing.is_empty() {
        return Err(GenerationError::MissingInputs(missing));
    }

    let order = sort_fields(&template.fields)?;
    let answerer = SchemaAnswerer::new(
        backend,
        Some(template.instructions.clone()),
        max_attempts,
    )
    .map_err(GenerationError::Answerer)?;

    let mut context: BTreeMap<&str, Value> = inputs
        .iter()
        .map(|field| (field.id.as_str(), field.value.clone()))
        .collect();
    let mut generated: Vec<Field> = Vec::new();

    for definition in order {
        if definition.source() != SourceType::Auto {
            continue;
        }
        let id = definition.id();
        let instructions = render_instructions(definition, &context)?;
        debug!(field = id, instructions = %instructions, "generating field");

        let value = answerer
            .answer(&instructions, definition.schema())
            .map_err(|source| GenerationError::Field {
                field: id.to_string(),
                source,
            })?;
        info!(field = id, "field generated");
        context.insert(id, value.clone());
        generated.push(Field::new(id, value));
    }

    let mut fields = inputs.to_vec();
    fields.extend(generated);
    Ok(fields)
}

/// Substitute dependency values into a field's instructions.
///
/// Instructions without dependencies are passed through untouched.
fn render_instructions(
    definition: &FieldDefinition,
    context: &BTreeMap<&str, Value>,
) -> Result<String, GenerationError> {
    let id = definition.id();
    let mut field_context: BTreeMap<&str, &Value> = BTreeMap::new();
    for dependency in definition.dependencies() {
        let value = context.get(dependency.as_str()).ok_or_else(|| {
            GenerationError::UnresolvedDependency {
                field: id.to_string(),
                dependency: dependency.clone(),
            }
        })?;
        field_context.insert(dependency.as_str(), value);
    }

    if field_context.is_empty() {
        return Ok(definition.instructions().to_string());
    }
    substitute(definition.instructions(), &field_context).map_err(|err| {
        GenerationError::Instructions {
            field: id.to_string(),
            detail: format!("{err:#}"),
        }
    })
}
