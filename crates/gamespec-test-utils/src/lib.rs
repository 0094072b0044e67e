//! Testing utilities for the gamespec workspace
//!
//! Shared fixtures and collaborator doubles.

#![allow(missing_docs)]

use async_trait::async_trait;
use gamespec_core::{ForgeConfig, GameForge, GameId, GameRecord, RecordStore, StoreError};
use gamespec_intent::{
    CacheError, IntentConfig, IntentError, IntentResolver, IntentService, MemoryProposalStore,
    ProposalKey, ProposalStore,
};
use gamespec_model::Patch;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn bubble_spec() -> Value {
    json!({
        "meta": {"title": "Bubble Rush", "template": "bubble_clicker", "skin": "bubble", "theme": "dark"},
        "scene": {"size": {"w": 800, "h": 500}, "hidpi": true},
        "rules": {
            "spawn": {"mode": "linear", "interval_ms": 1500, "add_per_interval": 5},
            "limit": {"max_concurrent": 60, "end_on_limit": true}
        },
        "hud": {"show_time": true, "show_count": true, "show_spawn_rate": true, "sound": true, "pause_hotkey": "P"}
    })
}

pub fn sandbox_spec() -> Value {
    json!({
        "meta": {"title": "Mover", "template": "sandbox", "theme": "light"},
        "scene": {"size": {"w": 640, "h": 360}},
        "player": {"controller": "topdown", "speed": 240},
        "controls": ["arrows", "wasd"]
    })
}

enum Reply {
    Text(String),
    Fail,
    Slow(Duration),
}

/// Intent service double with a call counter
pub struct FakeIntentService {
    reply: Reply,
    calls: AtomicUsize,
    model: String,
}

impl FakeIntentService {
    /// Always answers `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_reply(Reply::Text(text.into()))
    }

    /// Always fails with a 503
    pub fn failing() -> Self {
        Self::with_reply(Reply::Fail)
    }

    /// Answers `[]` after `delay`
    pub fn slow(delay: Duration) -> Self {
        Self::with_reply(Reply::Slow(delay))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            model: "fake-model".to_string(),
        }
    }

    /// Number of `propose` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentService for FakeIntentService {
    async fn propose(&self, _system: &str, _payload: &str) -> Result<String, IntentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(IntentError::status(503, "unavailable")),
            Reply::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok("[]".to_string())
            }
        }
    }

    fn model(&self) -> String {
        self.model.clone()
    }
}

/// Proposal store that is always down
#[derive(Debug, Default)]
pub struct UnavailableProposalStore;

#[async_trait]
impl ProposalStore for UnavailableProposalStore {
    async fn get(&self, _key: &ProposalKey) -> Result<Option<Patch>, CacheError> {
        Err(CacheError::Unavailable("proposal store offline".into()))
    }

    async fn put(&self, _key: ProposalKey, _patch: Patch) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("proposal store offline".into()))
    }
}

/// Record store that is always down
#[derive(Debug, Default)]
pub struct UnavailableRecordStore;

#[async_trait]
impl RecordStore for UnavailableRecordStore {
    async fn insert(&self, _record: GameRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("record store offline".into()))
    }

    async fn get(&self, _id: GameId) -> Result<Option<GameRecord>, StoreError> {
        Err(StoreError::Unavailable("record store offline".into()))
    }

    async fn put(&self, _record: GameRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("record store offline".into()))
    }
}

/// Resolver over `service` with a fresh in-memory cache
pub fn resolver_with(service: Arc<FakeIntentService>, config: IntentConfig) -> IntentResolver {
    let service: Arc<dyn IntentService> = service;
    let store = Arc::new(MemoryProposalStore::from_config(&config));
    IntentResolver::new(config, Some(service), store)
}

pub fn setup_test_forge() -> GameForge {
    GameForge::in_memory(ForgeConfig::new())
}
