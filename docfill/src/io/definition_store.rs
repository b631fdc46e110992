//! Template definition loading (TOML, or JSON by extension).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::types::TemplateDefinition;

/// Load a template definition from disk.
///
/// `.json` files are parsed as JSON, anything else as TOML. A relative `file`
/// is resolved against the definition's directory. Field dependencies are
/// extracted while parsing, so a malformed instructions template fails here.
pub fn load_definition(path: &Path) -> Result<TemplateDefinition> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read definition {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let mut template: TemplateDefinition = if is_json {
        serde_json::from_str(&contents)
            .with_context(|| format!("parse definition {}", path.display()))?
    } else {
        toml::from_str(&contents).with_context(|| format!("parse definition {}", path.display()))?
    };

    if template.file.is_relative()
        && let Some(dir) = path.parent()
    {
        template.file = dir.join(&template.file);
    }
    debug!(
        template = %template.name,
        document = %template.file.display(),
        fields = template.fields.len(),
        "loaded definition"
    );
    Ok(template)
}
