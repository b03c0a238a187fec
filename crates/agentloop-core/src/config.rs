//! Runtime configuration for the loop and its Ollama backend.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::ModelConfig;
use crate::ollama::DEFAULT_OLLAMA_URL;
use crate::role_orchestration::engine::DEFAULT_MAX_TURNS;

pub const ENV_OLLAMA_URL: &str = "AGENTLOOP_OLLAMA_URL";
pub const ENV_MODEL: &str = "AGENTLOOP_MODEL";
pub const ENV_TEMPERATURE: &str = "AGENTLOOP_TEMPERATURE";
pub const ENV_MAX_TURNS: &str = "AGENTLOOP_MAX_TURNS";
pub const ENV_TIMEOUT_SECS: &str = "AGENTLOOP_TIMEOUT_SECS";

/// Loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Ollama server URL
    pub ollama_url: String,
    /// Model and sampling options for planner calls
    pub model: ModelConfig,
    /// Hard cap on planner rounds
    pub max_turns: u32,
    /// HTTP timeout for a single model call
    pub request_timeout_secs: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: ModelConfig::default(),
            max_turns: DEFAULT_MAX_TURNS,
            request_timeout_secs: 120,
        }
    }
}

impl LoopConfig {
    /// Defaults overridden by `AGENTLOOP_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`LoopConfig::from_env`] but reading from an arbitrary source.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_OLLAMA_URL) {
            config.ollama_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            config.model.model = model;
        }
        if let Some(t) = parse_var(&lookup, ENV_TEMPERATURE) {
            config.model.temperature = t;
        }
        if let Some(n) = parse_var(&lookup, ENV_MAX_TURNS) {
            config.max_turns = n;
        }
        if let Some(secs) = parse_var(&lookup, ENV_TIMEOUT_SECS) {
            config.request_timeout_secs = secs;
        }
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key = key, value = %raw, "ignoring unparseable config value");
            None
        }
    }
}
