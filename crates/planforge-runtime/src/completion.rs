//! Hosted Completion Provider
//!
//! Implementation of `LlmProvider` against an OpenAI-style chat-completions
//! endpoint. One request per call, bounded by a client-level deadline; a
//! timeout follows the same error path as any other provider failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use planforge_core::{
    ChatMessage, Completion, CoreError, GenerationOptions, LlmProvider, Result,
};

/// Completion endpoint configuration
#[derive(Clone, Debug)]
pub struct CompletionConfig {
    /// API base URL (up to and excluding `/chat/completions`)
    pub base_url: String,

    /// Bearer token
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Request deadline in seconds
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.kimi.com/coding/v1".into(),
            api_key: String::new(),
            model: "kimi-for-coding".into(),
            timeout_secs: 45,
        }
    }
}

impl CompletionConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("AI_API_KEY")
            .map_err(|_| CoreError::Config("AI_API_KEY not set".into()))?;
        let base_url = std::env::var("AI_BASE_URL")
            .unwrap_or_else(|_| Self::default().base_url);
        let model = std::env::var("AI_MODEL").unwrap_or_else(|_| Self::default().model);
        let timeout_secs = std::env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::default().timeout_secs);

        Ok(Self {
            base_url,
            api_key,
            model,
            timeout_secs,
        })
    }
}

/// Chat-completions provider for a hosted endpoint
pub struct HostedCompletionProvider {
    client: reqwest::Client,
    config: CompletionConfig,
}

impl HostedCompletionProvider {
    /// Create from configuration
    pub fn from_config(config: CompletionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("KimiCLI/0.77")
            .build()
            .map_err(|e| CoreError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(CompletionConfig::from_env()?)
    }

    /// The configured model identifier
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LlmProvider for HostedCompletionProvider {
    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await;

        match response {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("Completion endpoint health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = ChatCompletionRequest {
            model: &options.model,
            messages,
            temperature: options.temperature,
            response_format: options
                .json_response
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    CoreError::ProviderUnavailable(e.to_string())
                } else {
                    CoreError::Provider(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(CoreError::Provider(format!(
                "completion endpoint returned {}",
                response.status()
            )));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Provider(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CoreError::Provider("empty completion".into()))?;

        Ok(Completion {
            content,
            model: options.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CompletionConfig::default();
        assert_eq!(config.model, "kimi-for-coding");
        assert_eq!(config.timeout_secs, 45);
    }

    #[test]
    fn test_endpoint_join_handles_trailing_slash() {
        let provider = HostedCompletionProvider::from_config(CompletionConfig {
            base_url: "https://api.example.com/v1/".into(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            provider.endpoint("chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_wire_format() {
        let messages = [ChatMessage::user("hello")];
        let request = ChatCompletionRequest {
            model: "kimi-for-coding",
            messages: &messages,
            temperature: 0.7,
            response_format: Some(ResponseFormat { kind: "json_object" }),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "kimi-for-coding");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_response_format_omitted_for_plain_text() {
        let messages = [ChatMessage::user("hello")];
        let request = ChatCompletionRequest {
            model: "kimi-for-coding",
            messages: &messages,
            temperature: 0.7,
            response_format: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("response_format").is_none());
    }
}
