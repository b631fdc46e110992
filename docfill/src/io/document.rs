//! Document templates: placeholder discovery and rendering.
//!
//! The generation engine only needs two things from a document template: the
//! names of the placeholders it expects ([`PlaceholderSource`]) and a way to
//! merge final values into it ([`Renderer`]). [`TextDocuments`] and
//! [`TextRenderer`] implement both for plain-text templates in Jinja syntax.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use minijinja::{Environment, UndefinedBehavior};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::core::placeholders::undeclared_variables;
use crate::core::types::Field;

/// Reports the placeholders a document template expects to be filled.
pub trait PlaceholderSource {
    fn undeclared_variables(&self, document: &Path) -> Result<BTreeSet<String>>;
}

/// Merges field values into a document.
pub trait Renderer {
    type Document;

    fn render(&self, values: &BTreeMap<String, Value>) -> Result<Self::Document>;
}

/// Placeholder source for plain-text templates on disk.
///
/// Relative document paths resolve against `base_dir` when one is set.
#[derive(Debug, Clone, Default)]
pub struct TextDocuments {
    base_dir: Option<PathBuf>,
}

impl TextDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    pub fn resolve(&self, document: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if document.is_relative() => base.join(document),
            _ => document.to_path_buf(),
        }
    }
}

impl PlaceholderSource for TextDocuments {
    fn undeclared_variables(&self, document: &Path) -> Result<BTreeSet<String>> {
        let path = self.resolve(document);
        let source = read_document(&path)?;
        let names = undeclared_variables(&source)
            .map_err(|err| anyhow!("parse template {}: {err:#}", path.display()))?;
        debug!(document = %path.display(), placeholders = names.len(), "scanned document");
        Ok(names)
    }
}

/// Renders a plain-text template with strict undefined handling.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    path: PathBuf,
    source: String,
}

impl TextRenderer {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let source = read_document(&path)?;
        Ok(Self { path, source })
    }

    pub fn from_source(name: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: name.into(),
            source: source.into(),
        }
    }
}

impl Renderer for TextRenderer {
    type Document = String;

    #[instrument(skip_all, fields(document = %self.path.display(), values = values.len()))]
    fn render(&self, values: &BTreeMap<String, Value>) -> Result<String> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        let template = env
            .template_from_str(&self.source)
            .with_context(|| format!("parse template {}", self.path.display()))?;
        let rendered = template
            .render(values)
            .with_context(|| format!("render template {}", self.path.display()))?;
        Ok(rendered)
    }
}

/// Collect fields into the id -> value mapping a renderer consumes.
///
/// Later fields win when ids repeat.
pub fn fields_to_context(fields: &[Field]) -> BTreeMap<String, Value> {
    fields
        .iter()
        .map(|field| (field.id.clone(), field.value.clone()))
        .collect()
}

/// Write a rendered document, creating parent directories as needed.
pub fn write_document(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read document template {}", path.display()))
}
