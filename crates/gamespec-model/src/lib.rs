//! gamespec Model
//!
//! The Game Spec document, the structured patches that evolve it, and the
//! digests that identify it.
//!
//! # Core Concepts
//!
//! - [`GameSpec`] / [`default_spec`]: the canonical document shape and default
//! - [`SpecReader`]: never-failing typed reads over an untyped document
//! - [`PatchOp`] / [`Patch`]: add/replace/remove operations on [`PatchPath`]s
//! - [`apply`]: pure, total patch application producing a new document
//! - [`SpecDigest`]: 32-byte Blake3 digest for content addressing
//!
//! # Example
//!
//! ```rust
//! use gamespec_model::{apply, default_spec, PatchOp, PatchPath};
//!
//! let spec = default_spec("pop the bubbles");
//! let op = PatchOp::add("/meta/template".parse::<PatchPath>().unwrap(), "bubble_clicker");
//! let next = apply(&spec, &[op]);
//!
//! assert_eq!(next["meta"]["template"], "bubble_clicker");
//! assert!(spec["meta"].get("template").is_none());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod digest;
mod patch;
mod path;
mod reader;
mod spec;

pub use digest::{DigestError, SpecDigest};
pub use patch::{
    apply, apply_with_report, ApplyReport, Patch, PatchOp, PatchParseError, SkipReason, SkippedOp,
};
pub use path::{PatchPath, PathError};
pub use reader::SpecReader;
pub use spec::{
    default_spec, reduced_projection, GameSpec, HudToggles, LimitRule, Meta, Skin, SpawnMode,
    SpawnRule, TemplateId, Theme, TITLE_LIMIT,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
