//! Deterministic, pure logic shared by the generation engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod graph;
pub mod placeholders;
pub mod reply;
pub mod schema;
pub mod types;
