//! Ollama backend for [`ModelClient`].
//!
//! Talks to the non-streaming `/api/generate` endpoint of a local or remote
//! Ollama server.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::error::ModelError;
use crate::model::{ModelClient, ModelConfig};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP client for an Ollama server.
pub struct OllamaClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ModelError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("agentloop/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, prompt: &str, config: &ModelConfig) -> Result<String, ModelError> {
        config.validate()?;
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: config.temperature,
            },
        };

        debug!(url = %url, model = %config.model, prompt_chars = prompt.len(), "calling ollama");
        let response = self.http_client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;
        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = OllamaClient::new("http://localhost:11434/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            model: "phi3:mini",
            prompt: "hi",
            stream: false,
            options: GenerateOptions { temperature: 0.5 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "phi3:mini",
                "prompt": "hi",
                "stream": false,
                "options": {"temperature": 0.5}
            })
        );
    }
}
