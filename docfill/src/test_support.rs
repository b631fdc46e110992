//! Test-only helpers: scripted collaborators and definition builders.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::core::types::{FieldDefinition, SourceType, TemplateDefinition};
use crate::io::backend::ModelBackend;
use crate::io::document::PlaceholderSource;

/// One recorded backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub prompt: String,
    pub system_prompt: Option<String>,
}

/// Model backend that replays predetermined replies and records every prompt.
///
/// Replies are consumed in order. Once the script runs out, the fallback reply is
/// repeated if one was set; otherwise the call fails.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: RefCell<VecDeque<String>>,
    fallback: Option<String>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: RefCell::new(replies.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Backend that answers every prompt with `reply`.
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|call| call.prompt.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ModelBackend for ScriptedBackend {
    fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        self.calls.borrow_mut().push(RecordedCall {
            prompt: prompt.to_string(),
            system_prompt: system_prompt.map(str::to_string),
        });
        if let Some(reply) = self.replies.borrow_mut().pop_front() {
            return Ok(reply);
        }
        self.fallback
            .clone()
            .ok_or_else(|| anyhow!("scripted backend has no reply left"))
    }
}

/// Placeholder source that reports a fixed set of names for any document.
#[derive(Debug, Clone, Default)]
pub struct StaticPlaceholders {
    names: BTreeSet<String>,
    failure: Option<String>,
}

impl StaticPlaceholders {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            failure: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Source whose every lookup fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            names: BTreeSet::new(),
            failure: Some(message.into()),
        }
    }
}

impl PlaceholderSource for StaticPlaceholders {
    fn undeclared_variables(&self, _document: &Path) -> Result<BTreeSet<String>> {
        match &self.failure {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(self.names.clone()),
        }
    }
}

/// INPUT field with a string schema.
pub fn input_field(id: &str) -> FieldDefinition {
    field(id, SourceType::Input, json!({"type": "string"}), "")
}

/// AUTO field with a string schema.
pub fn auto_field(id: &str, instructions: &str) -> FieldDefinition {
    field(id, SourceType::Auto, json!({"type": "string"}), instructions)
}

pub fn field(id: &str, source: SourceType, schema: Value, instructions: &str) -> FieldDefinition {
    FieldDefinition::new(id, source, schema, instructions).expect("test field definition")
}

/// Template named `test` over `test.txt` with the given fields.
pub fn template(fields: Vec<FieldDefinition>) -> TemplateDefinition {
    TemplateDefinition {
        name: "test".to_string(),
        file: PathBuf::from("test.txt"),
        description: String::new(),
        instructions: String::new(),
        fields,
    }
}

/// Temporary directory holding a document template and its definition file.
pub struct TempTemplate {
    dir: TempDir,
    definition: PathBuf,
}

impl TempTemplate {
    /// Write `document.txt` and `definition.toml` into a fresh temp directory.
    pub fn new(document: &str, definition_toml: &str) -> Result<Self> {
        let dir = tempfile::tempdir().context("create tempdir")?;
        fs::write(dir.path().join("document.txt"), document).context("write document")?;
        let definition = dir.path().join("definition.toml");
        fs::write(&definition, definition_toml).context("write definition")?;
        Ok(Self { dir, definition })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn definition(&self) -> &Path {
        &self.definition
    }

    /// Write an extra file (config, inputs) next to the definition.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
