//! In-memory registry of validated template definitions.

use std::collections::BTreeMap;

use tracing::{info, instrument};

use crate::core::types::TemplateDefinition;
use crate::error::RegistryError;
use crate::io::document::PlaceholderSource;
use crate::validate::validate_template;

/// Templates keyed by name. Only definitions that pass validation get in.
pub struct TemplateRegistry<P> {
    placeholders: P,
    templates: BTreeMap<String, TemplateDefinition>,
}

impl<P: PlaceholderSource> TemplateRegistry<P> {
    pub fn new(placeholders: P) -> Self {
        Self {
            placeholders,
            templates: BTreeMap::new(),
        }
    }

    /// Validate and store `template`. Validation runs before the name check.
    #[instrument(skip_all, fields(template = %template.name))]
    pub fn register(&mut self, template: TemplateDefinition) -> Result<(), RegistryError> {
        validate_template(&template, &self.placeholders)?;
        if self.templates.contains_key(&template.name) {
            return Err(RegistryError::AlreadyRegistered(template.name));
        }
        info!(fields = template.fields.len(), "template registered");
        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TemplateDefinition> {
        self.templates.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Result<TemplateDefinition, RegistryError> {
        self.templates
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Registered template names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}
