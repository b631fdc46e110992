//! End-to-end fill: look up a template, generate its fields, render the document.

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::core::types::Field;
use crate::error::RegistryError;
use crate::generate::generate_fields;
use crate::io::backend::ModelBackend;
use crate::io::config::GeneratorConfig;
use crate::io::document::{PlaceholderSource, Renderer, fields_to_context};
use crate::registry::TemplateRegistry;

/// Result of a successful fill.
#[derive(Debug, Clone)]
pub struct Filled<D> {
    /// Inputs followed by generated fields, in generation order.
    pub fields: Vec<Field>,
    pub document: D,
}

/// Fill the registered template `template_name` with `inputs`.
///
/// Registry and generation failures keep their typed errors inside the returned
/// `anyhow::Error` so callers can downcast them.
#[instrument(skip_all, fields(template = template_name, inputs = inputs.len()))]
pub fn fill<P, B, R>(
    registry: &TemplateRegistry<P>,
    template_name: &str,
    inputs: &[Field],
    backend: B,
    config: &GeneratorConfig,
    renderer: &R,
) -> Result<Filled<R::Document>>
where
    P: PlaceholderSource,
    B: ModelBackend,
    R: Renderer,
{
    let template = registry
        .get(template_name)
        .ok_or_else(|| RegistryError::NotFound(template_name.to_string()))?;

    let fields = generate_fields(template, inputs, backend, config.max_attempts)?;
    let document = renderer
        .render(&fields_to_context(&fields))
        .with_context(|| format!("render template {template_name}"))?;
    info!(fields = fields.len(), "document filled");
    Ok(Filled { fields, document })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::io::document::TextRenderer;
    use crate::test_support::{
        ScriptedBackend, StaticPlaceholders, auto_field, input_field, template,
    };
    use serde_json::json;

    fn registry() -> TemplateRegistry<StaticPlaceholders> {
        let mut registry = TemplateRegistry::new(StaticPlaceholders::new(["user", "username"]));
        registry
            .register(template(vec![
                input_field("user"),
                auto_field("username", "Enter the username for {{ user }}"),
            ]))
            .expect("register");
        registry
    }

    #[test]
    fn renders_inputs_and_generated_values() {
        let backend = ScriptedBackend::new(["jdoe"]);
        let renderer = TextRenderer::from_source("inline", "{{ user }} is {{ username }}");

        let filled = fill(
            &registry(),
            "test",
            &[Field::new("user", json!("John Doe"))],
            &backend,
            &GeneratorConfig::default(),
            &renderer,
        )
        .expect("fill");

        assert_eq!(filled.document, "John Doe is jdoe");
        assert_eq!(filled.fields.len(), 2);
    }

    #[test]
    fn unknown_template_is_not_found() {
        let backend = ScriptedBackend::always("x");
        let renderer = TextRenderer::from_source("inline", "");

        let err = fill(
            &registry(),
            "missing",
            &[],
            &backend,
            &GeneratorConfig::default(),
            &renderer,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<RegistryError>(),
            Some(&RegistryError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn missing_inputs_are_downcastable() {
        let backend = ScriptedBackend::always("x");
        let renderer = TextRenderer::from_source("inline", "");

        let err = fill(
            &registry(),
            "test",
            &[],
            &backend,
            &GeneratorConfig::default(),
            &renderer,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<GenerationError>(),
            Some(&GenerationError::MissingInputs(vec!["user".to_string()]))
        );
        assert_eq!(backend.call_count(), 0);
    }
}
