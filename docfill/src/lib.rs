//! Schema-constrained document field generation.
//!
//! A template definition lists the fields a document needs. INPUT fields are
//! supplied by the caller; AUTO fields are produced by a language model, one at
//! a time, in an order where every field sees the values it depends on. Each
//! model reply is parsed and validated against the field's JSON Schema and
//! corrected with feedback until it complies or the attempt budget runs out.
//!
//! - **[`core`]**: Pure, deterministic logic (dependency extraction, ordering,
//!   schema classification, reply parsing). No I/O.
//! - **[`io`]**: Side-effecting collaborators (model processes, document files,
//!   definition and config files). Behind traits to enable fakes in tests.
//!
//! Orchestration modules ([`validate`], [`registry`], [`answer`], [`generate`],
//! [`fill`]) combine the two to implement the CLI commands.

pub mod answer;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod fill;
pub mod generate;
pub mod io;
pub mod logging;
pub mod registry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validate;
