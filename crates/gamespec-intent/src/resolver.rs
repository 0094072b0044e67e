//! Intent resolution: prompt to patch
//!
//! [`IntentResolver::propose`] is total. It tries, in order, the direct-mode
//! prefix, the proposal cache, the intent service and the fallback rules,
//! then merges the high-confidence prompt overrides on top. Every sub-step
//! failure is recorded as a [`Degradation`] instead of being returned.

use crate::cache::{MemoryProposalStore, ProposalKey, ProposalStore};
use crate::config::IntentConfig;
use crate::error::IntentError;
use crate::patterns::{direct_mode_patch, fallback_patch, is_direct_mode, override_ops};
use crate::service::{build_payload, AnthropicService, IntentService, SYSTEM_INSTRUCTIONS};
use crate::truncate_chars;
use gamespec_model::{reduced_projection, Patch, SpecReader};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the base of a proposal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalSource {
    /// Direct-mode prefix; cache and service bypassed
    DirectMode,
    /// Live proposal cache entry
    Cache,
    /// Intent service reply
    Service,
    /// Deterministic rules
    Fallback,
    /// Nothing applicable
    Empty,
}

impl ProposalSource {
    /// Stable name for logs and metadata
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DirectMode => "direct_mode",
            Self::Cache => "cache",
            Self::Service => "service",
            Self::Fallback => "fallback",
            Self::Empty => "empty",
        }
    }
}

impl fmt::Display for ProposalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sub-step that did not work out during a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    /// No intent service configured
    ServiceUnavailable,
    /// Intent service exceeded the request timeout
    ServiceTimeout,
    /// Intent service failed (transport, status, empty reply)
    ServiceError,
    /// Intent service reply held no patch
    UnparseableResponse,
    /// Proposal store failed; cache skipped
    CacheUnavailable,
}

/// Outcome of [`IntentResolver::propose`]
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub patch: Patch,
    pub source: ProposalSource,
    pub degradations: Vec<Degradation>,
    /// Model that answered, when the intent service was consulted
    pub model: Option<String>,
}

impl Proposal {
    fn new(patch: Patch, source: ProposalSource) -> Self {
        Self {
            patch,
            source,
            degradations: Vec::new(),
            model: None,
        }
    }

    /// Whether any sub-step degraded
    #[inline]
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    /// Take the patch
    #[inline]
    #[must_use]
    pub fn into_patch(self) -> Patch {
        self.patch
    }
}

/// Resolves prompts into patches
///
/// Collaborators are injected: the intent service is optional and the
/// proposal store is any [`ProposalStore`].
#[derive(Clone)]
pub struct IntentResolver {
    config: IntentConfig,
    service: Option<Arc<dyn IntentService>>,
    store: Arc<dyn ProposalStore>,
}

impl IntentResolver {
    /// Create a resolver with explicit collaborators
    #[must_use]
    pub fn new(
        config: IntentConfig,
        service: Option<Arc<dyn IntentService>>,
        store: Arc<dyn ProposalStore>,
    ) -> Self {
        Self {
            config,
            service,
            store,
        }
    }

    /// Create a resolver from configuration alone
    ///
    /// Builds the HTTP intent service when an API key is configured and an
    /// in-memory proposal store sized from the configuration.
    #[must_use]
    pub fn from_config(config: IntentConfig) -> Self {
        let service: Option<Arc<dyn IntentService>> = if config.has_service() {
            match AnthropicService::new(config.clone()) {
                Ok(service) => Some(Arc::new(service)),
                Err(e) => {
                    warn!(error = %e, "intent service disabled");
                    None
                }
            }
        } else {
            None
        };
        let store = Arc::new(MemoryProposalStore::from_config(&config));
        Self::new(config, service, store)
    }

    /// Replace the intent service
    #[must_use]
    pub fn with_service(mut self, service: Arc<dyn IntentService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Remove the intent service
    #[must_use]
    pub fn without_service(mut self) -> Self {
        self.service = None;
        self
    }

    /// Replace the proposal store
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ProposalStore>) -> Self {
        self.store = store;
        self
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &IntentConfig {
        &self.config
    }

    /// Whether an intent service is attached
    #[inline]
    #[must_use]
    pub fn has_service(&self) -> bool {
        self.service.is_some()
    }

    /// Derive a patch for `prompt` against `spec`
    ///
    /// Never fails and finishes within the service timeout plus local work.
    pub async fn propose(&self, spec: &Value, prompt: &str, summary: &str) -> Proposal {
        if is_direct_mode(prompt, &self.config.direct_mode_keyword) {
            debug!("direct mode prompt");
            return Proposal::new(direct_mode_patch(prompt), ProposalSource::DirectMode);
        }

        let summary = truncate_chars(summary, self.config.summary_chars);
        let key = ProposalKey::derive(spec, prompt, summary, &self.config);
        let mut degradations = Vec::new();
        let mut cache_ok = true;

        match self.store.get(&key).await {
            Ok(Some(patch)) => {
                debug!(%key, ops = patch.len(), "proposal cache hit");
                return Proposal::new(patch, ProposalSource::Cache);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "proposal store unavailable, skipping cache");
                degradations.push(Degradation::CacheUnavailable);
                cache_ok = false;
            }
        }

        let mut model = None;
        let mut patch = match &self.service {
            Some(service) => {
                model = Some(service.model());
                match self.ask_service(service.as_ref(), spec, summary, prompt).await {
                    Ok(patch) => patch,
                    Err(degradation) => {
                        degradations.push(degradation);
                        Patch::new()
                    }
                }
            }
            None => {
                degradations.push(Degradation::ServiceUnavailable);
                Patch::new()
            }
        };

        let mut source = ProposalSource::Service;
        if patch.is_empty() {
            patch = fallback_patch(spec, prompt);
            source = ProposalSource::Fallback;
        }

        let template = SpecReader::new(&patch.apply_to(spec)).template();
        for op in override_ops(prompt, &template) {
            patch.push(op);
        }
        if patch.is_empty() {
            source = ProposalSource::Empty;
        }

        if cache_ok {
            if let Err(e) = self.store.put(key, patch.clone()).await {
                warn!(error = %e, "failed to store proposal");
                degradations.push(Degradation::CacheUnavailable);
            }
        }

        info!(
            %key,
            source = source.as_str(),
            ops = patch.len(),
            degraded = !degradations.is_empty(),
            "proposal resolved"
        );

        Proposal {
            patch,
            source,
            degradations,
            model,
        }
    }

    async fn ask_service(
        &self,
        service: &dyn IntentService,
        spec: &Value,
        summary: &str,
        prompt: &str,
    ) -> Result<Patch, Degradation> {
        let payload = build_payload(&reduced_projection(spec), summary, prompt);
        let reply = tokio::time::timeout(
            self.config.timeout(),
            service.propose(SYSTEM_INSTRUCTIONS, &payload),
        )
        .await;

        let text = match reply {
            Ok(Ok(text)) => text,
            Ok(Err(IntentError::Transport(e))) if e.is_timeout() => {
                warn!(error = %e, "intent service timed out");
                return Err(Degradation::ServiceTimeout);
            }
            Ok(Err(e)) => {
                warn!(error = %e, "intent service failed");
                return Err(Degradation::ServiceError);
            }
            Err(_) => {
                warn!(timeout_ms = self.config.timeout_ms, "intent service timed out");
                return Err(Degradation::ServiceTimeout);
            }
        };

        match Patch::from_text(&text) {
            Ok(patch) => {
                debug!(ops = patch.len(), "intent service proposal parsed");
                Ok(patch)
            }
            Err(e) => {
                warn!(error = %e, "unparseable intent service reply");
                Err(Degradation::UnparseableResponse)
            }
        }
    }
}

impl fmt::Debug for IntentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntentResolver")
            .field("config", &self.config)
            .field("has_service", &self.service.is_some())
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::service::MockIntentService;
    use async_trait::async_trait;
    use gamespec_model::{apply, SpawnRule};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn mock_service(reply: &'static str, times: usize) -> MockIntentService {
        let mut service = MockIntentService::new();
        service
            .expect_propose()
            .times(times)
            .returning(move |_, _| Ok(reply.to_string()));
        service.expect_model().return_const("mock-model".to_string());
        service
    }

    fn resolver_with(service: MockIntentService) -> IntentResolver {
        IntentResolver::from_config(IntentConfig::default()).with_service(Arc::new(service))
    }

    #[derive(Debug)]
    struct BrokenStore;

    #[async_trait]
    impl ProposalStore for BrokenStore {
        async fn get(&self, _key: &ProposalKey) -> Result<Option<Patch>, CacheError> {
            Err(CacheError::Unavailable("offline".into()))
        }

        async fn put(&self, _key: ProposalKey, _patch: Patch) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("offline".into()))
        }
    }

    struct SlowService;

    #[async_trait]
    impl IntentService for SlowService {
        async fn propose(&self, _system: &str, _payload: &str) -> Result<String, IntentError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("[]".into())
        }

        fn model(&self) -> String {
            "slow".into()
        }
    }

    #[tokio::test]
    async fn identical_requests_hit_the_service_once() {
        let resolver = resolver_with(mock_service(
            r#"[{"op":"add","path":"/meta/title","value":"Service Title"}]"#,
            1,
        ));
        let spec = json!({"meta": {"title": "Old"}});

        let first = resolver.propose(&spec, "rename it", "summary").await;
        let second = resolver.propose(&spec, "rename it", "summary").await;

        assert_eq!(first.source, ProposalSource::Service);
        assert_eq!(first.model.as_deref(), Some("mock-model"));
        assert_eq!(second.source, ProposalSource::Cache);
        assert_eq!(first.patch, second.patch);
    }

    #[tokio::test]
    async fn service_error_falls_back_to_spawn_rule() {
        let mut service = MockIntentService::new();
        service
            .expect_propose()
            .times(1)
            .returning(|_, _| Err(IntentError::status(500, "boom")));
        service.expect_model().return_const("mock-model".to_string());
        let resolver = resolver_with(service);

        let spec = json!({});
        let proposal = resolver.propose(&spec, "add 3 every 2 seconds", "").await;

        assert_eq!(proposal.source, ProposalSource::Fallback);
        assert_eq!(proposal.degradations, vec![Degradation::ServiceError]);
        let next = apply(&spec, proposal.patch.ops());
        assert_eq!(
            next["rules"]["spawn"],
            json!({"mode": "linear", "interval_ms": 2000, "add_per_interval": 3})
        );
        assert_eq!(next["meta"]["template"], "bubble_clicker");
    }

    #[tokio::test]
    async fn missing_service_is_a_degradation() {
        let resolver = IntentResolver::from_config(IntentConfig::default());
        assert!(!resolver.has_service());

        let proposal = resolver.propose(&json!({}), "hello there", "").await;
        assert_eq!(proposal.source, ProposalSource::Empty);
        assert!(proposal.patch.is_empty());
        assert_eq!(proposal.degradations, vec![Degradation::ServiceUnavailable]);
        assert_eq!(proposal.model, None);
    }

    #[tokio::test]
    async fn slow_service_times_out_into_fallback() {
        let config = IntentConfig::default().with_timeout(Duration::from_millis(20));
        let resolver = IntentResolver::from_config(config).with_service(Arc::new(SlowService));

        let proposal = resolver
            .propose(&json!({}), "spawn 2 bubbles every 1 second", "")
            .await;

        assert_eq!(proposal.degradations, vec![Degradation::ServiceTimeout]);
        assert_eq!(proposal.source, ProposalSource::Fallback);
        let next = proposal.patch.apply_to(&json!({}));
        assert_eq!(next["rules"]["spawn"], SpawnRule::linear(2, 1000).to_value());
    }

    #[tokio::test]
    async fn prose_reply_is_unparseable() {
        let resolver = resolver_with(mock_service("Sure! I made it more fun.", 1));
        let proposal = resolver.propose(&json!({}), "make it fun", "").await;

        assert_eq!(proposal.degradations, vec![Degradation::UnparseableResponse]);
        assert_eq!(proposal.source, ProposalSource::Empty);
    }

    #[tokio::test]
    async fn prompt_overrides_win_over_service() {
        let resolver = resolver_with(mock_service(
            r#"[{"op":"add","path":"/meta/skin","value":"balloon"},
                {"op":"add","path":"/rules/spawn","value":{"mode":"doubling","interval_ms":9000}}]"#,
            1,
        ));
        let spec = json!({"meta": {"template": "bubble_clicker"}});

        let proposal = resolver
            .propose(&spec, "make them chickens and add 4 every 3 seconds", "")
            .await;
        let next = proposal.patch.apply_to(&spec);

        assert_eq!(proposal.source, ProposalSource::Service);
        assert_eq!(next["meta"]["skin"], "chicken");
        assert_eq!(next["rules"]["spawn"], SpawnRule::linear(4, 3000).to_value());
    }

    #[tokio::test]
    async fn direct_mode_bypasses_everything() {
        let resolver = resolver_with(mock_service("[]", 0));
        let proposal = resolver
            .propose(&json!({}), "direct: a full tetris clone", "")
            .await;

        assert_eq!(proposal.source, ProposalSource::DirectMode);
        let next = proposal.patch.apply_to(&json!({}));
        assert_eq!(next["meta"]["direct_mode"], true);
        assert_eq!(next["meta"]["raw_prompt"], "direct: a full tetris clone");
    }

    #[tokio::test]
    async fn broken_store_degrades_to_recompute() {
        let resolver = resolver_with(mock_service(
            r#"[{"op":"add","path":"/meta/title","value":"T"}]"#,
            2,
        ))
        .with_store(Arc::new(BrokenStore));

        let first = resolver.propose(&json!({}), "title T", "").await;
        let second = resolver.propose(&json!({}), "title T", "").await;

        assert_eq!(first.degradations, vec![Degradation::CacheUnavailable]);
        assert_eq!(first.source, ProposalSource::Service);
        assert_eq!(first.patch, second.patch);
    }

    #[tokio::test]
    async fn summary_is_truncated_before_keying() {
        let resolver = resolver_with(mock_service(
            r#"[{"op":"add","path":"/meta/title","value":"T"}]"#,
            1,
        ));
        let long = "x".repeat(500);
        let first = resolver.propose(&json!({}), "p", &long).await;
        let second = resolver
            .propose(&json!({}), "p", &format!("{long}more"))
            .await;

        assert_eq!(first.source, ProposalSource::Service);
        assert_eq!(second.source, ProposalSource::Cache);
    }

    #[test]
    fn source_names_are_stable() {
        assert_eq!(ProposalSource::Fallback.to_string(), "fallback");
        assert_eq!(
            serde_json::to_value(Degradation::ServiceTimeout).unwrap(),
            json!("service_timeout")
        );
    }
}
