//! Intent resolver configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default messages API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
/// Default model
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";

/// Configuration for [`crate::IntentResolver`] and [`crate::AnthropicService`]
///
/// A missing API key means no intent service: the resolver runs on cache and
/// pattern rules alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    /// API key; never serialized
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub anthropic_version: String,
    pub timeout_ms: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub proposal_ttl_secs: u64,
    pub cache_capacity: u64,
    /// Prompt characters that take part in the proposal key
    pub prompt_key_chars: usize,
    /// Summary characters that take part in the proposal key
    pub summary_key_chars: usize,
    /// Summary characters sent to the intent service
    pub summary_chars: usize,
    /// Prefix that routes a prompt to direct mode
    pub direct_mode_keyword: String,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            anthropic_version: "2023-06-01".to_string(),
            timeout_ms: 15_000,
            max_tokens: 800,
            temperature: 0.2,
            proposal_ttl_secs: 30 * 60,
            cache_capacity: 10_000,
            prompt_key_chars: 400,
            summary_key_chars: 200,
            summary_chars: 300,
            direct_mode_keyword: "direct:".to_string(),
        }
    }
}

impl IntentConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ANTHROPIC_API_KEY` - intent service key (absent: no service)
    /// - `ANTHROPIC_MODEL` - model name
    /// - `ANTHROPIC_BASE_URL` - endpoint base URL
    /// - `INTENT_TIMEOUT_MS` - request timeout (minimum 100)
    /// - `PROPOSAL_TTL_SECS` - proposal cache time-to-live
    /// - `PROPOSAL_CACHE_CAPACITY` - proposal cache entries
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self {
            api_key: env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            ..Self::default()
        };

        if let Some(model) = read_env::<String>("ANTHROPIC_MODEL").filter(|m| !m.is_empty()) {
            config.model = model;
        }
        if let Some(url) = read_env::<String>("ANTHROPIC_BASE_URL").filter(|u| !u.is_empty()) {
            config.base_url = url;
        }
        if let Some(ms) = read_env::<u64>("INTENT_TIMEOUT_MS") {
            config.timeout_ms = ms.max(100);
        }
        if let Some(secs) = read_env::<u64>("PROPOSAL_TTL_SECS") {
            config.proposal_ttl_secs = secs;
        }
        if let Some(capacity) = read_env::<u64>("PROPOSAL_CACHE_CAPACITY") {
            config.cache_capacity = capacity;
        }

        config
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the endpoint base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the proposal time-to-live
    #[must_use]
    pub fn with_proposal_ttl(mut self, ttl: Duration) -> Self {
        self.proposal_ttl_secs = ttl.as_secs();
        self
    }

    /// Set the direct-mode keyword
    #[must_use]
    pub fn with_direct_mode_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.direct_mode_keyword = keyword.into();
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Proposal time-to-live
    #[inline]
    #[must_use]
    pub fn proposal_ttl(&self) -> Duration {
        Duration::from_secs(self.proposal_ttl_secs)
    }

    /// Whether an intent service can be built
    #[inline]
    #[must_use]
    pub fn has_service(&self) -> bool {
        self.api_key.is_some()
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let config = IntentConfig::default();
        assert_eq!(config.model, "claude-3-5-haiku-20241022");
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.proposal_ttl(), Duration::from_secs(1800));
        assert_eq!((config.max_tokens, config.summary_chars), (800, 300));
        assert!(!config.has_service());
    }

    #[test]
    fn partial_config_deserializes_with_defaults() {
        let config: IntentConfig =
            serde_json::from_str(r#"{"timeout_ms": 2500, "api_key": "k"}"#).unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert!(config.has_service());
        assert_eq!(config.cache_capacity, 10_000);
    }

    #[test]
    fn api_key_is_not_serialized() {
        let config = IntentConfig::default().with_api_key("secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn builders_set_fields() {
        let config = IntentConfig::default()
            .with_model("m")
            .with_base_url("http://localhost:9")
            .with_timeout(Duration::from_millis(40))
            .with_proposal_ttl(Duration::from_secs(5))
            .with_direct_mode_keyword("raw!");
        assert_eq!(config.model, "m");
        assert_eq!(config.base_url, "http://localhost:9");
        assert_eq!(config.timeout_ms, 40);
        assert_eq!(config.proposal_ttl_secs, 5);
        assert_eq!(config.direct_mode_keyword, "raw!");
    }
}
