//! Registration-time validation of template definitions.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use crate::core::graph::sort_fields;
use crate::core::schema::check_schema;
use crate::core::types::TemplateDefinition;
use crate::error::DefinitionError;
use crate::io::document::PlaceholderSource;

/// Check a template definition, failing on the first violated rule.
///
/// Rules, in order:
/// 1. field ids are unique
/// 2. every schema is a non-empty, valid Draft 7 schema with known keywords
/// 3. every dependency names a defined field
/// 4. every placeholder of the document template names a defined field
/// 5. the dependency graph is acyclic
#[instrument(skip_all, fields(template = %template.name, fields = template.fields.len()))]
pub fn validate_template<P: PlaceholderSource + ?Sized>(
    template: &TemplateDefinition,
    placeholders: &P,
) -> Result<(), DefinitionError> {
    ensure_unique_ids(template)?;
    ensure_valid_schemas(template)?;

    let defined: BTreeSet<&str> = template.fields.iter().map(|field| field.id()).collect();

    let missing_dependencies: Vec<String> = template
        .fields
        .iter()
        .flat_map(|field| field.dependencies())
        .filter(|dep| !defined.contains(dep.as_str()))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if !missing_dependencies.is_empty() {
        return Err(DefinitionError::MissingDependencies(missing_dependencies));
    }

    let in_document = placeholders
        .undeclared_variables(&template.file)
        .map_err(|err| DefinitionError::Placeholders {
            document: template.file.display().to_string(),
            detail: format!("{err:#}"),
        })?;
    let orphans: Vec<String> = in_document
        .into_iter()
        .filter(|name| !defined.contains(name.as_str()))
        .collect();
    if !orphans.is_empty() {
        return Err(DefinitionError::MissingTemplateFields(orphans));
    }

    sort_fields(&template.fields)?;
    debug!("template definition valid");
    Ok(())
}

fn ensure_unique_ids(template: &TemplateDefinition) -> Result<(), DefinitionError> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for field in &template.fields {
        *counts.entry(field.id()).or_default() += 1;
    }
    let duplicates: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id.to_string())
        .collect();
    if duplicates.is_empty() {
        return Ok(());
    }
    Err(DefinitionError::DuplicateFieldIds(duplicates))
}

fn ensure_valid_schemas(template: &TemplateDefinition) -> Result<(), DefinitionError> {
    for field in &template.fields {
        check_schema(field.schema()).map_err(|detail| DefinitionError::InvalidSchema {
            field: field.id().to_string(),
            detail,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SourceType;
    use crate::error::GraphError;
    use crate::test_support::{StaticPlaceholders, auto_field, input_field, template};
    use serde_json::json;

    #[test]
    fn valid_template_passes() {
        let template = template(vec![
            auto_field("username", "Enter the username for {{ user }}"),
            input_field("user"),
        ]);
        let placeholders = StaticPlaceholders::new(["user", "username"]);

        validate_template(&template, &placeholders).expect("valid");
    }

    #[test]
    fn duplicate_ids_are_named_once_each() {
        let template = template(vec![
            input_field("username"),
            input_field("username"),
            input_field("email"),
            input_field("email"),
            input_field("email"),
            input_field("other"),
        ]);

        let err = validate_template(&template, &StaticPlaceholders::empty()).expect_err("dupes");
        assert_eq!(
            err,
            DefinitionError::DuplicateFieldIds(vec!["email".into(), "username".into()])
        );
        assert!(err.to_string().starts_with("Duplicate field IDs found:"));
    }

    #[test]
    fn invalid_schema_names_the_field() {
        let mut fields = vec![input_field("ok")];
        fields.push(
            crate::core::types::FieldDefinition::new(
                "bad",
                SourceType::Input,
                json!({"1": 1}),
                "",
            )
            .expect("field"),
        );
        let template = template(fields);

        let err = validate_template(&template, &StaticPlaceholders::empty()).expect_err("schema");
        assert!(matches!(err, DefinitionError::InvalidSchema { ref field, .. } if field == "bad"));
        assert!(err.to_string().starts_with("Invalid JSON schema:"));
    }

    #[test]
    fn duplicate_check_runs_before_schema_check() {
        let bad = crate::core::types::FieldDefinition::new(
            "dup",
            SourceType::Input,
            json!({}),
            "",
        )
        .expect("field");
        let template = template(vec![bad.clone(), bad]);

        let err = validate_template(&template, &StaticPlaceholders::empty()).expect_err("fail");
        assert!(matches!(err, DefinitionError::DuplicateFieldIds(_)));
    }

    #[test]
    fn missing_dependencies_are_listed() {
        let template = template(vec![
            auto_field("a", "Uses {{ ghost }} and {{ phantom }}"),
            auto_field("b", "Uses {{ ghost }}"),
        ]);

        let err = validate_template(&template, &StaticPlaceholders::empty()).expect_err("deps");
        assert_eq!(err.to_string(), "Missing dependencies: ghost, phantom");
    }

    #[test]
    fn orphan_document_placeholders_are_listed() {
        let template = template(vec![
            auto_field("name", "Get name of the person"),
            auto_field("date", "Get date of birth"),
        ]);
        let placeholders = StaticPlaceholders::new(["name", "date", "purpose"]);

        let err = validate_template(&template, &placeholders).expect_err("orphans");
        assert_eq!(
            err.to_string(),
            "Missing defined fields, which are present in template: purpose"
        );
    }

    #[test]
    fn cycle_is_surfaced_as_definition_error() {
        let template = template(vec![
            auto_field("name", "Get name of the person {{ purpose }}"),
            auto_field("date", "Get date of birth {{ name }}"),
            auto_field("purpose", "Purpose of event {{ date }}"),
        ]);
        let placeholders = StaticPlaceholders::new(["name", "date", "purpose"]);

        let err = validate_template(&template, &placeholders).expect_err("cycle");
        assert!(matches!(err, DefinitionError::Graph(GraphError::Cycle { .. })));
        assert!(
            err.to_string()
                .contains("Circular dependency between fields")
        );
    }

    #[test]
    fn unreadable_document_is_reported() {
        let template = template(vec![input_field("a")]);
        let err = validate_template(&template, &StaticPlaceholders::failing("no such file"))
            .expect_err("placeholders");
        assert!(matches!(err, DefinitionError::Placeholders { .. }));
        assert!(err.to_string().contains("no such file"));
    }
}
