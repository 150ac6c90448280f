//! Agent Configuration
//!
//! Settings for the reasoning step and the turn loop, with environment overrides.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::provider::GenerationOptions;

pub(crate) const DEFAULT_SYSTEM_PROMPT: &str = r"You are a helpful AI assistant.

Use the available tools whenever they can answer part of the question.
After receiving tool results, synthesize them into a helpful response.
If you can answer directly without tools, do so.
Be concise and accurate.";

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Fixed system instruction, prepended to every reasoning call and never stored
    pub system_prompt: String,

    /// Whether to append tool descriptions to the system prompt
    pub inject_tool_descriptions: bool,

    /// Generation options
    pub generation: GenerationOptions,

    /// Maximum reasoning calls per turn
    pub max_iterations: usize,

    /// Deadline for a whole turn
    pub turn_timeout: Duration,

    /// How long a turn waits for another turn on the same session
    pub lock_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            inject_tool_descriptions: true,
            generation: GenerationOptions::default(),
            max_iterations: 10,
            turn_timeout: Duration::from_secs(120),
            lock_timeout: Duration::from_secs(30),
        }
    }
}

impl AgentConfig {
    /// Defaults overridden by `AGENT_*` environment variables
    ///
    /// - `AGENT_MODEL`
    /// - `AGENT_TEMPERATURE`
    /// - `AGENT_MAX_ITERATIONS`
    /// - `AGENT_TURN_TIMEOUT_SECS`
    /// - `AGENT_LOCK_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("AGENT_MODEL") {
            config.generation.model = model;
        }
        if let Some(temp) = env_parse::<f32>("AGENT_TEMPERATURE")? {
            config.generation.temperature = temp;
        }
        if let Some(max) = env_parse::<usize>("AGENT_MAX_ITERATIONS")? {
            config.max_iterations = max;
        }
        if let Some(secs) = env_parse::<u64>("AGENT_TURN_TIMEOUT_SECS")? {
            config.turn_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("AGENT_LOCK_TIMEOUT_SECS")? {
            config.lock_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the turn loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }
        if self.turn_timeout.is_zero() {
            return Err(AgentError::Config("turn_timeout must be non-zero".into()));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AgentError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}
