//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use pitchlens_shared::{LlmConfig, PitchLensError, Result};

const USER_AGENT: &str = concat!("PitchLens/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

/// Sends single-turn prompts to `{base_url}/chat/completions`.
pub struct OpenAiCompatibleClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatibleClient {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PitchLensError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` as one user message and return the first choice's text.
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PitchLensError::Timeout(format!("language model: {e}"))
                } else {
                    PitchLensError::Network(format!("language model: {e}"))
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(PitchLensError::Unauthorized(
                "language model rejected the API key".into(),
            ));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PitchLensError::http("language model", status.as_u16(), text));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| PitchLensError::parse(format!("language model: invalid JSON response: {e}")))?;

        let content = json
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| PitchLensError::parse("language model returned no choices"))?;

        debug!(response_len = content.len(), "completion received");
        Ok(content.to_string())
    }
}
