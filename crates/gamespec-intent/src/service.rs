//! Intent service contract and its HTTP implementation

use crate::config::IntentConfig;
use crate::error::IntentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Instructions sent with every proposal request
pub const SYSTEM_INSTRUCTIONS: &str = "\
You edit a JSON Game Spec for a 2D browser game. Reply with ONLY a JSON array \
of patch operations, no prose and no code fences. Each operation is \
{\"op\": \"add\"|\"replace\"|\"remove\", \"path\": \"/slash/delimited/path\", \"value\": ...}; \
remove takes no value. Known sections: meta (title, template: sandbox|bubble_clicker, \
skin: bubble|balloon|chicken|slime|asteroid, theme: dark|light), scene (size.w, size.h, hidpi), \
player (controller, speed, hp, weapons), entities, enemies, goals, controls, aesthetics, \
rules.spawn (mode: doubling|linear|fixed, interval_ms, add_per_interval), \
rules.limit (max_concurrent, end_on_limit), hud (show_time, show_count, show_spawn_rate, \
sound, pause_hotkey). Change only what the user asks for. A skin change must never touch \
rules. Return [] when nothing should change.";

/// Source of patch proposals
///
/// Implementations are untrusted: any text may come back, and the resolver
/// treats errors and unparseable replies as "no proposal".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IntentService: Send + Sync {
    /// Ask for a patch; returns the raw reply text
    ///
    /// # Errors
    /// Returns error on transport failure or an unusable reply
    async fn propose(&self, system: &str, payload: &str) -> Result<String, IntentError>;

    /// Model identifier, recorded in generation metadata
    fn model(&self) -> String;
}

/// Build the user payload: reduced spec, trimmed summary, prompt
#[must_use]
pub fn build_payload(reduced_spec: &Value, summary: &str, prompt: &str) -> String {
    format!(
        "BRIEF SUMMARY (<=300 chars):\n{summary}\n\nCURRENT SPEC_JSON:\n{reduced_spec}\n\n\
         USER MESSAGE:\n{prompt}\n\nReturn ONLY a JSON array of patch operations.\n"
    )
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Messages-API client
///
/// One attempt per call; the client-level timeout bounds the round trip.
#[derive(Debug, Clone)]
pub struct AnthropicService {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    config: IntentConfig,
}

impl AnthropicService {
    /// Create a client from configuration
    ///
    /// # Errors
    /// Returns [`IntentError::NotConfigured`] without an API key, or a
    /// transport error if the HTTP client cannot be built
    pub fn new(config: IntentConfig) -> Result<Self, IntentError> {
        let api_key = config.api_key.clone().ok_or(IntentError::NotConfigured)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        let endpoint = format!("{}/v1/messages", config.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            api_key,
            endpoint,
            config,
        })
    }

    /// Endpoint URL
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IntentService for AnthropicService {
    async fn propose(&self, system: &str, payload: &str) -> Result<String, IntentError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system,
            messages: [Message {
                role: "user",
                content: payload,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.config.anthropic_version)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntentError::status(status.as_u16(), &body));
        }

        let body: MessagesResponse = response.json().await?;
        body.content
            .into_iter()
            .find_map(|block| block.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(IntentError::EmptyResponse)
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn service_requires_api_key() {
        let err = AnthropicService::new(IntentConfig::default()).unwrap_err();
        assert!(matches!(err, IntentError::NotConfigured));
    }

    #[test]
    fn endpoint_joins_base_url() {
        let service = AnthropicService::new(
            IntentConfig::default()
                .with_api_key("k")
                .with_base_url("http://localhost:8080/"),
        )
        .unwrap();
        assert_eq!(service.endpoint(), "http://localhost:8080/v1/messages");
        assert_eq!(service.model(), "claude-3-5-haiku-20241022");
    }

    #[test]
    fn request_serializes_messages_shape() {
        let request = MessagesRequest {
            model: "m",
            max_tokens: 800,
            temperature: 0.2,
            system: "sys",
            messages: [Message {
                role: "user",
                content: "hi",
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"], json!([{"role": "user", "content": "hi"}]));
        assert_eq!(value["max_tokens"], 800);
    }

    #[test]
    fn response_text_is_extracted() {
        let body: MessagesResponse =
            serde_json::from_value(json!({"content": [{"type": "text", "text": "[]"}]})).unwrap();
        assert_eq!(body.content[0].text.as_deref(), Some("[]"));
    }

    #[test]
    fn payload_embeds_all_parts() {
        let payload = build_payload(&json!({"title": "T"}), "so far", "add 3 every 2 seconds");
        assert!(payload.contains(r#"{"title":"T"}"#));
        assert!(payload.contains("so far"));
        assert!(payload.ends_with("Return ONLY a JSON array of patch operations.\n"));
    }
}
