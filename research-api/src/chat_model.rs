//! [`ChatModel`]: a [`research_core::LanguageModel`] backed by an
//! OpenAI-compatible `chat/completions` endpoint.
//!
//! Non-streaming by design — Planner/Reflector/Finalizer calls are all
//! single-shot, so there is no reason to carry the SSE machinery a
//! chat UI would need.

use std::time::Duration;

use research_core::{LanguageModel, LlmRequest};
use schemars::JsonSchema;
use schemars::schema_for;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Errors talking to the chat-completions endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ChatModelError {
    /// The HTTP call itself failed (network, TLS, timeout).
    #[error("request to language model failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The endpoint returned a non-success status.
    #[error("language model returned {status}: {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Truncated response body, for diagnostics.
        body: String,
    },
    /// The response body wasn't the shape we expected, or the
    /// structured-output payload didn't parse as `T`.
    #[error("could not parse language model response: {0}")]
    Malformed(String),
}

/// A chat-completions-backed language model.
///
/// Cloning is cheap: `reqwest::Client` is internally `Arc`-backed.
#[derive(Debug, Clone)]
pub struct ChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatModel {
    /// Builds a client against the default `api.openai.com` endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Builds a client against an OpenAI-compatible endpoint at
    /// `base_url` (useful for self-hosted or alternate providers).
    #[must_use]
    pub fn with_base_url(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    async fn complete(&self, request: &LlmRequest, response_format: Option<serde_json::Value>) -> Result<String, ChatModelError> {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(format) = response_format {
            body["response_format"] = format;
        }

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let truncated: String = text.chars().take(500).collect();
            return Err(ChatModelError::Upstream {
                status: status.as_u16(),
                body: truncated,
            });
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| ChatModelError::Malformed(err.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ChatModelError::Malformed("no choices in response".into()))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl LanguageModel for ChatModel {
    type Error = ChatModelError;

    async fn generate<T>(&self, request: LlmRequest) -> Result<T, Self::Error>
    where
        T: DeserializeOwned + JsonSchema + Send + 'static,
    {
        let schema = schema_for!(T);
        let response_format = serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": "structured_output",
                "schema": schema,
                "strict": true,
            },
        });
        let text = self.complete(&request, Some(response_format)).await?;
        serde_json::from_str(&text).map_err(|err| ChatModelError::Malformed(err.to_string()))
    }

    async fn generate_text(&self, request: LlmRequest) -> Result<String, Self::Error> {
        self.complete(&request, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_base_url_overrides_default_endpoint() {
        let model = ChatModel::with_base_url("key", "gpt-4o-mini", "https://example.com/v1/chat/completions");
        assert_eq!(model.base_url, "https://example.com/v1/chat/completions");
        assert_eq!(model.model, "gpt-4o-mini");
    }
}
