//! Error types for gamespec Core
//!
//! Only session-level failures surface here. Patch, proposal and compile
//! problems are absorbed by the lower layers and reported as data.

use crate::types::{GameId, UserId};

/// Main orchestration error type
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    /// No record for this game
    #[error("game not found: {0}")]
    GameNotFound(GameId),

    /// Caller does not own the game
    #[error("user {user} may not modify game {game}")]
    Forbidden { game: GameId, user: UserId },

    /// Empty or whitespace-only prompt
    #[error("missing prompt")]
    MissingPrompt,

    /// Empty or whitespace-only publication title
    #[error("missing title")]
    MissingTitle,

    /// Publish requested before anything was compiled
    #[error("game {0} has no compiled document")]
    NoArtifact(GameId),

    /// Game has not been published
    #[error("game {0} is not published")]
    NotPublished(GameId),

    /// Record or publication store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl ForgeError {
    /// Whether asking again could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(StoreError::Unavailable(_)))
    }

    /// Create forbidden error
    pub fn forbidden(game: GameId, user: &UserId) -> Self {
        Self::Forbidden {
            game,
            user: user.clone(),
        }
    }
}

impl From<toml::de::Error> for ForgeError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// Errors from record and publication stores
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backing store cannot serve requests
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Insert of an id that already exists
    #[error("duplicate record: {0}")]
    Duplicate(String),
}
