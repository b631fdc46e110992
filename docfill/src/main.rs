//! Document template filler.
//!
//! Loads a template definition, generates its AUTO fields with a model CLI, and
//! renders the document. Every model reply is validated against the field's JSON
//! Schema before it is used.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;

use docfill::core::graph::sort_fields;
use docfill::core::types::{Field, TemplateDefinition};
use docfill::error::GenerationError;
use docfill::exit_codes;
use docfill::fill::fill;
use docfill::io::backend::CommandBackend;
use docfill::io::config::{GeneratorConfig, load_config, write_config};
use docfill::io::definition_store::load_definition;
use docfill::io::document::{TextDocuments, TextRenderer, write_document};
use docfill::logging;
use docfill::registry::TemplateRegistry;

#[derive(Parser)]
#[command(
    name = "docfill",
    version,
    about = "Fill document templates with schema-validated model output"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a definition: unique ids, valid schemas, resolvable dependencies, no cycles.
    Validate {
        /// Template definition file (TOML, or JSON by extension).
        definition: PathBuf,
    },
    /// Print field ids in generation order, one per line.
    Order {
        /// Template definition file (TOML, or JSON by extension).
        definition: PathBuf,
    },
    /// Generate AUTO fields and render the document.
    Fill {
        /// Template definition file (TOML, or JSON by extension).
        definition: PathBuf,
        /// INPUT value as `id=value`; the value is parsed as JSON when possible.
        #[arg(long = "input", value_name = "ID=VALUE")]
        inputs: Vec<String>,
        /// JSON object of INPUT values. `--input` entries take precedence.
        #[arg(long = "inputs", value_name = "FILE")]
        inputs_file: Option<PathBuf>,
        /// Generator config; defaults apply when the file is missing.
        #[arg(long, default_value = "docfill.toml")]
        config: PathBuf,
        /// Write the rendered document here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write a default generator config.
    Init {
        /// Config file to create.
        #[arg(long, default_value = "docfill.toml")]
        config: PathBuf,
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    logging::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::INVALID
            } else {
                exit_codes::OK
            };
            if let Err(print_err) = err.print() {
                eprintln!("{print_err}");
            }
            std::process::exit(code);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("{:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Validate { definition } => cmd_validate(&definition),
        Command::Order { definition } => cmd_order(&definition),
        Command::Fill {
            definition,
            inputs,
            inputs_file,
            config,
            output,
        } => cmd_fill(
            &definition,
            &inputs,
            inputs_file.as_deref(),
            &config,
            output.as_deref(),
        ),
        Command::Init { config, force } => cmd_init(&config, force),
    }
}

fn cmd_validate(definition: &Path) -> Result<()> {
    load_registered(definition)?;
    println!("ok");
    Ok(())
}

fn cmd_order(definition: &Path) -> Result<()> {
    let (registry, name) = load_registered(definition)?;
    let template = registry
        .get(&name)
        .ok_or_else(|| anyhow!("template {name} missing after registration"))?;
    for field in sort_fields(&template.fields)? {
        println!("{}", field.id());
    }
    Ok(())
}

fn cmd_fill(
    definition: &Path,
    input_args: &[String],
    inputs_file: Option<&Path>,
    config_path: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let (registry, name) = load_registered(definition)?;
    let template = registry
        .get(&name)
        .ok_or_else(|| anyhow!("template {name} missing after registration"))?;

    let inputs = collect_inputs(input_args, inputs_file)?;
    let renderer = TextRenderer::load(&template.file)?;
    let backend = CommandBackend::new(&config.backend)?;

    let filled = fill(&registry, &name, &inputs, &backend, &config, &renderer)?;
    match output {
        Some(path) => write_document(path, &filled.document)?,
        None => print!("{}", filled.document),
    }
    Ok(())
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    write_config(config_path, &GeneratorConfig::default())?;
    println!("wrote {}", config_path.display());
    Ok(())
}

/// Load a definition and register it, which validates it against its document.
fn load_registered(definition: &Path) -> Result<(TemplateRegistry<TextDocuments>, String)> {
    let template: TemplateDefinition = load_definition(definition)?;
    let name = template.name.clone();
    let mut registry = TemplateRegistry::new(TextDocuments::new());
    registry
        .register(template)
        .with_context(|| format!("register {}", definition.display()))?;
    Ok((registry, name))
}

/// Merge `--inputs` file values with `--input` arguments; later ids replace earlier ones.
fn collect_inputs(input_args: &[String], inputs_file: Option<&Path>) -> Result<Vec<Field>> {
    let mut inputs: Vec<Field> = Vec::new();
    if let Some(path) = inputs_file {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read inputs {}", path.display()))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("parse inputs {}", path.display()))?;
        let Value::Object(map) = value else {
            bail!("inputs file {} must contain a JSON object", path.display());
        };
        for (id, value) in map {
            upsert(&mut inputs, Field::new(id, value));
        }
    }
    for arg in input_args {
        upsert(&mut inputs, parse_input_arg(arg)?);
    }
    Ok(inputs)
}

fn upsert(inputs: &mut Vec<Field>, field: Field) {
    match inputs.iter_mut().find(|existing| existing.id == field.id) {
        Some(existing) => existing.value = field.value,
        None => inputs.push(field),
    }
}

/// Parse `id=value`. The value is JSON when it parses as JSON, else a plain string.
fn parse_input_arg(arg: &str) -> Result<Field> {
    let (id, raw) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("input must be ID=VALUE, got {arg:?}"))?;
    let id = id.trim();
    if id.is_empty() {
        bail!("input id must not be empty in {arg:?}");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok(Field::new(id, value))
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<GenerationError>() {
        Some(GenerationError::MissingInputs(_)) => exit_codes::MISSING_INPUTS,
        Some(GenerationError::Graph(_)) | None => exit_codes::INVALID,
        Some(_) => exit_codes::GENERATION_FAILED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfill::error::{AnswerError, RegistryError};
    use serde_json::json;

    #[test]
    fn parse_fill_with_inputs() {
        let cli = Cli::parse_from([
            "docfill",
            "fill",
            "letter.toml",
            "--input",
            "user=Jane",
            "--input",
            "age=41",
            "--output",
            "out.txt",
        ]);
        match cli.command {
            Command::Fill {
                definition,
                inputs,
                config,
                output,
                ..
            } => {
                assert_eq!(definition, PathBuf::from("letter.toml"));
                assert_eq!(inputs, vec!["user=Jane", "age=41"]);
                assert_eq!(config, PathBuf::from("docfill.toml"));
                assert_eq!(output, Some(PathBuf::from("out.txt")));
            }
            _ => panic!("expected fill"),
        }
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["docfill", "init", "--force"]);
        match cli.command {
            Command::Init { config, force } => {
                assert_eq!(config, PathBuf::from("docfill.toml"));
                assert!(force);
            }
            _ => panic!("expected init"),
        }
    }

    #[test]
    fn input_values_prefer_json() {
        assert_eq!(parse_input_arg("age=41").expect("age").value, json!(41));
        assert_eq!(
            parse_input_arg("tags=[\"a\",\"b\"]").expect("tags").value,
            json!(["a", "b"])
        );
        assert_eq!(
            parse_input_arg("user=Jane Doe").expect("user").value,
            json!("Jane Doe")
        );
        assert_eq!(parse_input_arg("eq=a=b").expect("eq").value, json!("a=b"));
        assert!(parse_input_arg("novalue").is_err());
        assert!(parse_input_arg("=x").is_err());
    }

    #[test]
    fn input_args_override_inputs_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("inputs.json");
        fs::write(&path, r#"{"user": "From file", "city": "Ljubljana"}"#).expect("write");

        let inputs = collect_inputs(&["user=Override".to_string()], Some(&path)).expect("inputs");
        let user = inputs.iter().find(|f| f.id == "user").expect("user");
        assert_eq!(user.value, json!("Override"));
        assert_eq!(inputs.len(), 2);
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let missing = anyhow::Error::from(GenerationError::MissingInputs(vec!["user".into()]));
        assert_eq!(exit_code_for(&missing), exit_codes::MISSING_INPUTS);

        let failed = anyhow::Error::from(GenerationError::Field {
            field: "count".into(),
            source: AnswerError::Exhausted {
                attempts: 5,
                last_reply: "many".into(),
                last_error: "not an integer".into(),
            },
        });
        assert_eq!(exit_code_for(&failed), exit_codes::GENERATION_FAILED);

        let invalid = anyhow::Error::from(RegistryError::NotFound("x".into()));
        assert_eq!(exit_code_for(&invalid), exit_codes::INVALID);
    }
}
