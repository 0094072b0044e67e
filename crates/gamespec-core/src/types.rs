//! Core types for gamespec sessions
//!
//! Defines the fundamental types for the orchestrator:
//! - Forge configuration
//! - Game and user identifiers
//! - Game records, conversation turns and generation metadata
//! - Turn and publication outcomes

use crate::error::ForgeError;
use chrono::{DateTime, Duration, Utc};
use gamespec_intent::{Degradation, IntentConfig, ProposalSource};
use gamespec_model::ApplyReport;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique game identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameId(pub Uuid);

impl GameId {
    /// Generate new game ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GameId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Stable caller identity, as yielded by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Wrap an identity
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of a game's conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// User turn
    #[inline]
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Lifecycle of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Session created, nothing compiled yet
    #[default]
    Creating,
    /// A document has been compiled
    Generated,
    /// The document is publicly hosted
    Published,
}

/// Which operation produced the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Propose, apply and compile
    #[serde(rename = "spec+compile")]
    SpecCompile,
    /// Propose and apply only
    #[serde(rename = "patchOnly")]
    PatchOnly,
    /// Compile the stored spec only
    #[serde(rename = "compileOnly")]
    CompileOnly,
}

/// Bookkeeping for the last turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub strategy: Strategy,
    /// Model name, `mock` without an intent service, `none` for compile only
    pub model: String,
    pub patch_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ProposalSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degradations: Vec<Degradation>,
    pub generated_at: DateTime<Utc>,
}

/// Persisted state of one game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: GameId,
    /// Creator; `None` means any caller may edit
    pub owner: Option<UserId>,
    pub creator_name: Option<String>,
    pub title: String,
    pub description: String,
    pub status: GameStatus,
    pub spec: Option<Value>,
    /// Rolling brief of past prompts
    pub summary: String,
    pub history: Vec<Turn>,
    pub html: Option<String>,
    pub metadata: Option<GenerationMetadata>,
    pub storage_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub auto_delete_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl GameRecord {
    /// Fresh draft owned by `owner`
    #[must_use]
    pub fn draft(owner: UserId, creator_name: Option<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: GameId::new(),
            owner: Some(owner),
            creator_name,
            title: "Untitled Game".to_string(),
            description: String::new(),
            status: GameStatus::Creating,
            spec: None,
            summary: String::new(),
            history: Vec::new(),
            html: None,
            metadata: None,
            storage_path: None,
            created_at: now,
            updated_at: now,
            auto_delete_at: Some(now + ttl),
            published_at: None,
        }
    }

    /// Whether `user` may modify this game
    #[inline]
    #[must_use]
    pub fn is_editable_by(&self, user: &UserId) -> bool {
        self.owner.as_ref().map_or(true, |owner| owner == user)
    }
}

/// Forge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Rolling summary length in characters
    pub summary_chars: usize,
    /// Publication title length in characters
    pub title_chars: usize,
    /// Hours until an unpublished draft is eligible for deletion
    pub auto_delete_hours: i64,
    /// Key prefix inside the publication store
    pub publication_prefix: String,
    /// Public base URL of the publication store
    pub public_base_url: Option<String>,
    /// Intent resolver settings
    pub intent: IntentConfig,
}

impl ForgeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns [`ForgeError::Config`] on malformed TOML
    pub fn from_toml_str(text: &str) -> Result<Self, ForgeError> {
        Ok(toml::from_str(text)?)
    }

    /// With intent configuration
    #[inline]
    #[must_use]
    pub fn with_intent(mut self, intent: IntentConfig) -> Self {
        self.intent = intent;
        self
    }

    /// With public base URL
    #[inline]
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    /// Draft lifetime
    #[inline]
    #[must_use]
    pub fn auto_delete_after(&self) -> Duration {
        Duration::hours(self.auto_delete_hours)
    }

    /// Publication key for a game
    #[must_use]
    pub fn publication_path(&self, id: GameId) -> String {
        format!("{}/{id}/index.html", self.publication_prefix.trim_end_matches('/'))
    }
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            summary_chars: 300,
            title_chars: 60,
            auto_delete_hours: 72,
            publication_prefix: "games".to_string(),
            public_base_url: None,
            intent: IntentConfig::default(),
        }
    }
}

/// Result of a generate or update turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub game_id: GameId,
    pub spec: Value,
    /// Compiled document; `None` for patch-only turns
    pub html: Option<String>,
    pub history: Vec<Turn>,
    pub source: ProposalSource,
    pub degradations: Vec<Degradation>,
    pub report: ApplyReport,
    /// Model recorded in metadata
    pub model: String,
    /// The turn asked to bypass the template compiler
    pub direct_mode: bool,
}

/// Result of a publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub game_id: GameId,
    pub path: String,
    pub url: Option<String>,
}

/// Rolling brief: previous summary plus the new prompt, bounded to `limit`
/// characters with a trailing ellipsis when cut
#[must_use]
pub fn summarize(previous: &str, prompt: &str, limit: usize) -> String {
    let joined = format!("{previous} {prompt}");
    let joined = joined.trim();
    if joined.chars().count() <= limit {
        return joined.to_string();
    }
    let mut out: String = joined.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_joins_and_bounds() {
        assert_eq!(summarize("", "first", 300), "first");
        assert_eq!(summarize("first", "second", 300), "first second");

        let long = "x".repeat(400);
        let summary = summarize(&long, "tail", 300);
        assert_eq!(summary.chars().count(), 300);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn draft_expires_after_ttl() {
        let record = GameRecord::draft(UserId::new("u1"), None, Duration::hours(72));
        assert_eq!(record.status, GameStatus::Creating);
        assert_eq!(record.auto_delete_at, Some(record.created_at + Duration::hours(72)));
        assert!(record.html.is_none());
        assert!(record.is_editable_by(&UserId::new("u1")));
        assert!(!record.is_editable_by(&UserId::new("u2")));
    }

    #[test]
    fn ownerless_record_is_open() {
        let mut record = GameRecord::draft(UserId::new("u1"), None, Duration::hours(1));
        record.owner = None;
        assert!(record.is_editable_by(&UserId::new("anyone")));
    }

    #[test]
    fn strategy_wire_names() {
        assert_eq!(
            serde_json::to_value(Strategy::SpecCompile).unwrap(),
            serde_json::json!("spec+compile")
        );
        assert_eq!(
            serde_json::to_value(GameStatus::Published).unwrap(),
            serde_json::json!("published")
        );
    }

    #[test]
    fn config_from_partial_toml() {
        let config = ForgeConfig::from_toml_str(
            r#"
            summary_chars = 120
            public_base_url = "https://cdn.example"

            [intent]
            timeout_ms = 2000
            "#,
        )
        .unwrap();
        assert_eq!(config.summary_chars, 120);
        assert_eq!(config.title_chars, 60);
        assert_eq!(config.intent.timeout_ms, 2000);
        assert_eq!(config.intent.summary_chars, 300);
    }

    #[test]
    fn publication_path_is_per_game() {
        let id = GameId::new();
        assert_eq!(
            ForgeConfig::default().publication_path(id),
            format!("games/{id}/index.html")
        );
    }

    #[test]
    fn game_id_parses_back() {
        let id = GameId::new();
        assert_eq!(id.to_string().parse::<GameId>().unwrap(), id);
    }
}
