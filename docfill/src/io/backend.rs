//! Model backend abstraction.
//!
//! The [`ModelBackend`] trait decouples generation from the actual language
//! model. [`CommandBackend`] pipes prompts through an external CLI; tests use
//! scripted backends that return predetermined replies without spawning
//! processes.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::io::config::BackendConfig;
use crate::io::process::run_command_with_timeout;

/// Number of stderr characters kept in backend failure messages.
const STDERR_TAIL_CHARS: usize = 2_000;

/// A language model that answers a prompt with text.
///
/// Every call is externally visible and non-idempotent (cost, latency).
pub trait ModelBackend {
    fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String>;
}

impl<T: ModelBackend + ?Sized> ModelBackend for &T {
    fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        (**self).complete(prompt, system_prompt)
    }
}

/// Backend that spawns a model CLI, writes the prompt on stdin, and reads the reply from stdout.
///
/// The system prompt, when present, precedes the prompt separated by a blank line.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        if config.command.is_empty() || config.command[0].trim().is_empty() {
            return Err(anyhow!("backend.command must be a non-empty array"));
        }
        Ok(Self {
            command: config.command.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            output_limit_bytes: config.output_limit_bytes,
        })
    }

    fn stdin_payload(prompt: &str, system_prompt: Option<&str>) -> String {
        match system_prompt.map(str::trim).filter(|s| !s.is_empty()) {
            Some(system) => format!("{system}\n\n{prompt}"),
            None => prompt.to_string(),
        }
    }
}

impl ModelBackend for CommandBackend {
    #[instrument(
        skip_all,
        fields(program = %self.command[0], timeout_secs = self.timeout.as_secs())
    )]
    fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        let payload = Self::stdin_payload(prompt, system_prompt);
        info!(prompt_bytes = payload.len(), "invoking model backend");

        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]);

        let output = run_command_with_timeout(
            cmd,
            Some(payload.as_bytes()),
            self.timeout,
            self.output_limit_bytes,
        )
        .with_context(|| format!("run model command {}", self.command[0]))?;

        if output.timed_out {
            warn!(timeout_secs = self.timeout.as_secs(), "model command timed out");
            return Err(anyhow!("model command timed out after {:?}", self.timeout));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "model command failed");
            return Err(anyhow!(
                "model command failed with status {:?}: {}",
                output.status.code(),
                output.stderr_tail(STDERR_TAIL_CHARS)
            ));
        }
        if output.stdout_truncated > 0 {
            return Err(anyhow!(
                "model reply exceeded {} bytes",
                self.output_limit_bytes
            ));
        }

        let reply = output.stdout_lossy();
        debug!(reply_bytes = reply.len(), "model backend replied");
        Ok(reply)
    }
}
