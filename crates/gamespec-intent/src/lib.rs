//! gamespec Intent
//!
//! Turns a natural-language prompt into a Game Spec patch. The intent service
//! is an untrusted, possibly absent oracle: every proposal is total, and the
//! degraded paths are reported rather than raised.
//!
//! # Core Concepts
//!
//! - [`IntentResolver`]: direct mode, cache, service, fallback, override merge
//! - [`Proposal`]: the patch plus its [`ProposalSource`] and [`Degradation`]s
//! - [`ProposalStore`] / [`MemoryProposalStore`]: TTL cache keyed by [`ProposalKey`]
//! - [`IntentService`] / [`AnthropicService`]: the external proposal contract
//! - [`patterns`]: the deterministic prompt rules
//!
//! # Example
//!
//! ```rust
//! use gamespec_intent::{IntentConfig, IntentResolver, ProposalSource};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let resolver = IntentResolver::from_config(IntentConfig::default());
//! let proposal = resolver.propose(&json!({}), "add 3 every 2 seconds", "").await;
//!
//! assert_eq!(proposal.source, ProposalSource::Fallback);
//! let next = proposal.patch.apply_to(&json!({}));
//! assert_eq!(next["rules"]["spawn"]["add_per_interval"], 3);
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod cache;
mod config;
mod error;
pub mod patterns;
mod resolver;
mod service;

pub use cache::{MemoryProposalStore, ProposalKey, ProposalStore};
pub use config::{IntentConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::{CacheError, IntentError};
pub use resolver::{Degradation, IntentResolver, Proposal, ProposalSource};
pub use service::{build_payload, AnthropicService, IntentService, SYSTEM_INSTRUCTIONS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Longest prefix of `s` holding at most `max` characters
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
