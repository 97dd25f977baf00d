//! Decision oracle backends.
//!
//! The kernel never talks HTTP directly: it holds a [`DecisionOracle`]
//! trait object and sends it rendered prompt text. The production
//! backend speaks the OpenAI-compatible chat completions API over a
//! blocking `reqwest` client; tests wire a [`ScriptedOracle`] with
//! canned responses.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::OracleError;

/// A backend that turns a prompt into raw response text.
///
/// Calls are synchronous; the tick loop blocks on each decision. A
/// backend must be `Send + Sync` because the kernel runtime drives
/// ticks from a worker thread.
pub trait DecisionOracle: Send + Sync {
    /// Send a prompt and return the raw response text.
    fn generate(&self, prompt: &str) -> Result<String, OracleError>;

    /// Human-readable backend name for logging.
    fn name(&self) -> &'static str;
}

/// Connection settings for the HTTP oracle backend.
#[derive(Debug, Clone)]
pub struct HttpOracleConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token sent in the `Authorization` header.
    pub api_key: String,
    /// Model name to request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Whole-request timeout.
    pub timeout: Duration,
}

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Works with OpenAI, DeepSeek, and Ollama endpoints. Sends requests
/// to `{base_url}/chat/completions`.
pub struct HttpOracle {
    client: reqwest::blocking::Client,
    config: HttpOracleConfig,
}

impl HttpOracle {
    /// Build a backend with the request timeout baked into the client.
    pub fn new(config: HttpOracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OracleError::Backend(format!("client build failed: {e}")))?;
        Ok(Self { client, config })
    }
}

impl DecisionOracle for HttpOracle {
    fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": self.config.temperature,
            "max_tokens": 512,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .map_err(|e| OracleError::Backend(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(OracleError::Backend(format!(
                "backend returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| OracleError::Backend(format!("response parse failed: {e}")))?;

        extract_content(&json)
    }

    fn name(&self) -> &'static str {
        "openai-compatible"
    }
}

/// Extract the text content from a chat completions response.
fn extract_content(json: &serde_json::Value) -> Result<String, OracleError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            OracleError::Backend("response missing choices[0].message.content".to_owned())
        })
}

/// Test backend replaying a fixed queue of responses.
///
/// Each [`generate`](DecisionOracle::generate) call pops the next queued
/// response; an exhausted queue is a backend error, which exercises the
/// caller's failure path.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedOracle {
    /// Queue up responses to replay in order.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }
}

impl DecisionOracle for ScriptedOracle {
    fn generate(&self, _prompt: &str) -> Result<String, OracleError> {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| OracleError::Backend("scripted responses exhausted".to_owned()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn extract_content_valid() {
        let json = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "{\"action_type\": \"idle\"}"
                }
            }]
        });
        assert!(extract_content(&json).unwrap().contains("idle"));
    }

    #[test]
    fn extract_content_missing_choices() {
        let json = serde_json::json!({"error": "rate_limit"});
        assert!(extract_content(&json).is_err());
    }

    #[test]
    fn scripted_oracle_replays_in_order_then_errors() {
        let oracle = ScriptedOracle::new(["first", "second"]);
        assert_eq!(oracle.generate("p").unwrap(), "first");
        assert_eq!(oracle.generate("p").unwrap(), "second");
        assert!(oracle.generate("p").is_err());
    }
}
