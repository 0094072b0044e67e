//! Proposal cache keyed by spec projection, prompt and summary
//!
//! Stores accepted patches so that a repeated request against the same
//! reduced spec skips the intent service entirely.

use crate::config::IntentConfig;
use crate::error::CacheError;
use crate::truncate_chars;
use async_trait::async_trait;
use gamespec_model::{reduced_projection, Patch, SpecDigest};
use moka::future::Cache;
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// Key of a cached proposal
///
/// Derived from the digest of the reduced projection, a bounded prefix of the
/// prompt and a bounded prefix of the summary. Skin and other cosmetic fields
/// are outside the projection, so reskinning does not invalidate entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProposalKey(SpecDigest);

impl ProposalKey {
    /// Derive the key for a request
    #[must_use]
    pub fn derive(spec: &Value, prompt: &str, summary: &str, config: &IntentConfig) -> Self {
        let projection = SpecDigest::of_value(&reduced_projection(spec));
        let prompt = truncate_chars(prompt, config.prompt_key_chars);
        let summary = truncate_chars(summary, config.summary_key_chars);
        Self(SpecDigest::of_parts(&[
            projection.as_bytes(),
            prompt.as_bytes(),
            summary.as_bytes(),
        ]))
    }

    /// Underlying digest
    #[inline]
    #[must_use]
    pub fn digest(&self) -> &SpecDigest {
        &self.0
    }
}

impl Display for ProposalKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "proposal:{}", self.0.short())
    }
}

/// Storage for accepted proposals
///
/// Failures are reported, never retried; the resolver treats an unavailable
/// store as a cache miss.
#[async_trait]
pub trait ProposalStore: Send + Sync + std::fmt::Debug {
    /// Look up a proposal
    ///
    /// # Errors
    /// Returns error if the store cannot be reached
    async fn get(&self, key: &ProposalKey) -> Result<Option<Patch>, CacheError>;

    /// Store a proposal, replacing any previous entry
    ///
    /// # Errors
    /// Returns error if the store cannot be reached
    async fn put(&self, key: ProposalKey, patch: Patch) -> Result<(), CacheError>;
}

/// In-process proposal store with capacity bound and time-to-live
#[derive(Debug, Clone)]
pub struct MemoryProposalStore {
    inner: Cache<ProposalKey, Patch>,
}

impl MemoryProposalStore {
    /// Create store with max capacity and time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Create store sized and timed from configuration
    #[must_use]
    pub fn from_config(config: &IntentConfig) -> Self {
        Self::with_ttl(config.cache_capacity, config.proposal_ttl())
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Get approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for MemoryProposalStore {
    /// Create store with default capacity (10,000 entries) and 30 minute TTL
    fn default() -> Self {
        Self::from_config(&IntentConfig::default())
    }
}

#[async_trait]
impl ProposalStore for MemoryProposalStore {
    async fn get(&self, key: &ProposalKey) -> Result<Option<Patch>, CacheError> {
        Ok(self.inner.get(key).await)
    }

    async fn put(&self, key: ProposalKey, patch: Patch) -> Result<(), CacheError> {
        self.inner.insert(key, patch).await;
        Ok(())
    }
}
