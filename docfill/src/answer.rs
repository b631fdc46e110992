//! Schema-constrained answer loop.
//!
//! A field value is produced by asking the model backend for a reply, cleaning
//! and parsing it according to the schema shape, and validating it against the
//! schema. A rejected reply is sent back together with the exact error until a
//! valid value arrives or the attempt budget is spent.

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::core::reply::{ReplyError, ReplyParser, clean_reply};
use crate::core::schema::{SchemaValidator, classify_schema};
use crate::error::AnswerError;
use crate::io::backend::ModelBackend;
use crate::io::prompt::{Feedback, PromptEngine};

/// Loop position between model calls.
enum LoopState {
    Drafting,
    Validating { reply: String },
    Correcting { invalid_reply: String, error: String },
}

/// Produces schema-valid values from a model backend.
pub struct SchemaAnswerer<B> {
    backend: B,
    system_prompt: Option<String>,
    max_attempts: u32,
    prompts: PromptEngine,
}

impl<B: ModelBackend> SchemaAnswerer<B> {
    /// `max_attempts` counts every model call, the draft included; zero is treated as one.
    pub fn new(
        backend: B,
        system_prompt: Option<String>,
        max_attempts: u32,
    ) -> Result<Self, AnswerError> {
        let prompts = PromptEngine::new().map_err(|err| AnswerError::Prompt(format!("{err:#}")))?;
        Ok(Self {
            backend,
            system_prompt: system_prompt.filter(|s| !s.trim().is_empty()),
            max_attempts: max_attempts.max(1),
            prompts,
        })
    }

    /// Ask for a value matching `schema`, correcting the model until it complies.
    #[instrument(skip_all, fields(max_attempts = self.max_attempts))]
    pub fn answer(&self, instructions: &str, schema: &Value) -> Result<Value, AnswerError> {
        let shape = classify_schema(schema);
        let parse = shape.parser();
        let validator = SchemaValidator::compile(schema).map_err(AnswerError::Schema)?;
        debug!(?shape, "answering");

        let mut attempt = 0u32;
        let mut state = LoopState::Drafting;
        loop {
            state = match state {
                LoopState::Drafting => {
                    attempt += 1;
                    let reply = self.ask(attempt, instructions, schema, None)?;
                    LoopState::Validating { reply }
                }
                LoopState::Validating { reply } => {
                    match check_reply(&reply, schema, parse, &validator) {
                        Ok(value) => {
                            debug!(attempt, "reply accepted");
                            return Ok(value);
                        }
                        Err(err) => {
                            let error = err.to_string();
                            warn!(attempt, reply = %reply, error = %error, "reply rejected");
                            if attempt >= self.max_attempts {
                                return Err(AnswerError::Exhausted {
                                    attempts: attempt,
                                    last_reply: reply,
                                    last_error: error,
                                });
                            }
                            LoopState::Correcting {
                                invalid_reply: reply,
                                error,
                            }
                        }
                    }
                }
                LoopState::Correcting {
                    invalid_reply,
                    error,
                } => {
                    attempt += 1;
                    let feedback = Feedback {
                        invalid_reply: &invalid_reply,
                        error_message: &error,
                    };
                    let reply = self.ask(attempt, instructions, schema, Some(feedback))?;
                    LoopState::Validating { reply }
                }
            };
        }
    }

    fn ask(
        &self,
        attempt: u32,
        instructions: &str,
        schema: &Value,
        feedback: Option<Feedback<'_>>,
    ) -> Result<String, AnswerError> {
        let prompt = self
            .prompts
            .render_answer(instructions, schema, feedback)
            .map_err(|err| AnswerError::Prompt(format!("{err:#}")))?;
        debug!(attempt, correcting = feedback.is_some(), "calling model backend");
        self.backend
            .complete(&prompt, self.system_prompt.as_deref())
            .map_err(|err| AnswerError::Backend {
                attempt,
                detail: format!("{err:#}"),
            })
    }
}

fn check_reply(
    reply: &str,
    schema: &Value,
    parse: ReplyParser,
    validator: &SchemaValidator,
) -> Result<Value, ReplyError> {
    let cleaned = clean_reply(reply);
    let value = parse(&cleaned, schema)?;
    validator.validate(&value).map_err(ReplyError::Schema)?;
    Ok(value)
}
