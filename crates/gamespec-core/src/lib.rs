//! gamespec Core - session orchestration
//!
//! The caller-facing layer around the pipeline:
//! - Opens draft game sessions per user
//! - Runs prompt turns: propose, apply, compile, persist
//! - Keeps the rolling summary and conversation log
//! - Publishes compiled documents to a public store
//!
//! # Example
//!
//! ```rust
//! use gamespec_core::{ForgeConfig, GameForge, UserId};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let forge = GameForge::in_memory(ForgeConfig::default());
//! let user = UserId::new("player-one");
//!
//! let game = forge.create_session(&user, None).await?;
//! let turn = forge.generate(&user, game, "pop bubbles, add 2 every 1 second").await?;
//!
//! assert_eq!(turn.spec["meta"]["template"], "bubble_clicker");
//! assert!(turn.html.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod forge;
pub mod store;
pub mod types;

pub use error::{ForgeError, StoreError};
pub use forge::GameForge;
pub use store::{
    MemoryPublicationStore, MemoryRecordStore, PublicationStore, RecordStore, StoredObject,
    HTML_CONTENT_TYPE,
};
pub use types::{
    summarize, ForgeConfig, GameId, GameRecord, GameStatus, GenerationMetadata, Publication, Role,
    Strategy, Turn, TurnOutcome, UserId,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with gamespec Core
    pub use crate::{ForgeConfig, ForgeError, GameForge, GameId, TurnOutcome, UserId};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
