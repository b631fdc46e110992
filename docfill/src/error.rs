//! Error taxonomy for definition, input, and generation failures.

use thiserror::Error;

fn join(ids: &[String]) -> String {
    ids.join(", ")
}

/// Errors raised while ordering fields by their dependencies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Dependency {dependency} not found among field definitions (required by '{field}')")]
    DependencyNotFound { field: String, dependency: String },

    #[error("Circular dependency between fields: {}", join(.fields))]
    Cycle { fields: Vec<String> },
}

/// Errors that make a template definition unusable. Always fatal to registration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Duplicate field IDs found: {}", join(.0))]
    DuplicateFieldIds(Vec<String>),

    #[error("Invalid JSON schema: field '{field}': {detail}")]
    InvalidSchema { field: String, detail: String },

    #[error("Invalid instructions template for field '{field}': {detail}")]
    InvalidInstructions { field: String, detail: String },

    #[error("Missing dependencies: {}", join(.0))]
    MissingDependencies(Vec<String>),

    #[error("Missing defined fields, which are present in template: {}", join(.0))]
    MissingTemplateFields(Vec<String>),

    #[error("Failed to read placeholders of {document}: {detail}")]
    Placeholders { document: String, detail: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Terminal failures of the schema-constrained answer loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnswerError {
    #[error("Model backend failed on attempt {attempt}: {detail}")]
    Backend { attempt: u32, detail: String },

    #[error("Failed to build prompt: {0}")]
    Prompt(String),

    #[error("Schema cannot be compiled: {0}")]
    Schema(String),

    #[error(
        "No valid reply after {attempts} attempts; last error: {last_error}; last reply: {last_reply}"
    )]
    Exhausted {
        attempts: u32,
        last_reply: String,
        last_error: String,
    },
}

/// Errors that abort a single generation run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Missing inputs: {}", join(.0))]
    MissingInputs(Vec<String>),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Dependency '{dependency}' of field '{field}' was not resolved before generation")]
    UnresolvedDependency { field: String, dependency: String },

    #[error("Failed to render instructions for field '{field}': {detail}")]
    Instructions { field: String, detail: String },

    #[error("Failed to prepare the answer loop")]
    Answerer(#[source] AnswerError),

    #[error("Failed to generate field '{field}'")]
    Field {
        field: String,
        #[source]
        source: AnswerError,
    },
}

/// Errors from the template registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Template {0} already registered")]
    AlreadyRegistered(String),

    #[error("Template {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}
