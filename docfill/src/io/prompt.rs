//! Prompt builder for the schema-constrained answer loop.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;
use serde_json::Value;

const ANSWER_TEMPLATE: &str = include_str!("prompts/answer.md");

/// The rejected reply and the reason, fed back into a correction prompt.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Feedback<'a> {
    pub invalid_reply: &'a str,
    pub error_message: &'a str,
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("answer", ANSWER_TEMPLATE)
            .context("parse answer prompt template")?;
        Ok(Self { env })
    }

    /// Render the prompt for one model call.
    ///
    /// The draft prompt passes `None`; correction prompts carry the previous reply and its error.
    pub fn render_answer(
        &self,
        instructions: &str,
        schema: &Value,
        feedback: Option<Feedback<'_>>,
    ) -> Result<String> {
        let schema = serde_json::to_string_pretty(schema).context("serialize schema")?;
        let template = self.env.get_template("answer")?;
        let rendered = template
            .render(context! {
                instructions => instructions.trim(),
                schema => schema,
                feedback => feedback,
            })
            .context("render answer prompt")?;
        Ok(rendered)
    }
}
