//! Model-invocation collaborator.
//!
//! The loop only ever needs "generate text from a prompt". Backends implement
//! [`ModelClient`]; the engine receives one at construction and never looks
//! inside it.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::ModelError;

/// Per-call generation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Backend model identifier, e.g. `phi3:mini`.
    pub model: String,
    /// Response randomness in `[0, 1]`.
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "phi3:mini".to_string(),
            temperature: 0.2,
        }
    }
}

impl ModelConfig {
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.model.trim().is_empty() {
            return Err(ModelError::InvalidConfig("model must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ModelError::InvalidConfig(format!(
                "temperature {} outside [0, 1]",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Text generation backend.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, prompt: &str, config: &ModelConfig) -> Result<String, ModelError>;
}

/// Deterministic client that replays canned responses in order.
///
/// Records every prompt it receives. Once the script is empty each call fails
/// with [`ModelError::Exhausted`].
#[derive(Debug, Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a transport failure as the next response.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(message.into()));
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(&self, prompt: &str, _config: &ModelConfig) -> Result<String, ModelError> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ModelError::Http(message)),
            None => Err(ModelError::Exhausted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ModelConfig::default();
        assert_eq!(config.model, "phi3:mini");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_temperature_out_of_range_is_rejected() {
        let err = ModelConfig::new("m", 1.5).validate().unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig(_)));
        assert!(ModelConfig::new("m", -0.1).validate().is_err());
        assert!(ModelConfig::new("  ", 0.5).validate().is_err());
    }

    #[tokio::test]
    async fn test_scripted_model_replays_in_order_then_exhausts() {
        let model = ScriptedModel::new(["one", "two"]);
        let config = ModelConfig::default();
        assert_eq!(model.generate("p1", &config).await.unwrap(), "one");
        assert_eq!(model.generate("p2", &config).await.unwrap(), "two");
        assert!(matches!(
            model.generate("p3", &config).await,
            Err(ModelError::Exhausted)
        ));
        assert_eq!(model.prompts(), vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_scripted_failure_surfaces_as_http_error() {
        let model = ScriptedModel::new(Vec::<String>::new());
        model.push_failure("connection refused");
        let err = model
            .generate("p", &ModelConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
