//! I/O collaborators: model backends, documents, definitions, and config.

pub mod backend;
pub mod config;
pub mod definition_store;
pub mod document;
pub mod process;
pub mod prompt;
