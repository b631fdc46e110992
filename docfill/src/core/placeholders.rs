//! Placeholder scanning and substitution for Jinja-syntax text.
//!
//! Dependency extraction is pure text analysis: it only looks at which
//! top-level variables a template reads and knows nothing about fields,
//! graphs, or schemas.

use std::collections::BTreeSet;

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

/// Top-level variables referenced by `source`, excluding names bound inside it.
///
/// `{{ user.name }}` and `{{ user }}` both report `user`.
pub fn undeclared_variables(source: &str) -> Result<BTreeSet<String>, minijinja::Error> {
    let env = Environment::new();
    let template = env.template_from_str(source)?;
    Ok(template.undeclared_variables(false).into_iter().collect())
}

/// Field ids a set of field instructions depends on.
pub fn extract_dependencies(instructions: &str) -> Result<BTreeSet<String>, String> {
    undeclared_variables(instructions).map_err(|err| format!("{err:#}"))
}

/// Substitute placeholder values into `source`.
///
/// Values are rendered as plain text. Referencing a variable missing from
/// `ctx` is an error rather than an empty substitution.
pub fn substitute<S: Serialize>(source: &str, ctx: S) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    let template = env.template_from_str(source)?;
    template.render(ctx)
}
