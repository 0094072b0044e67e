//! gamespec Compiler
//!
//! Deterministic compilation of a Game Spec into one self-contained HTML
//! document.
//!
//! # Core Concepts
//!
//! - [`compile`] / [`Compiler`]: pure dispatch from spec to document
//! - [`Template`] / [`TemplateRegistry`]: renderers keyed by `meta.template`
//! - [`SpawnSchedule`]: window-based spawn targets of the survival game
//! - [`SurvivalRun`]: seeded reference model of the survival runtime
//!
//! Pages are Tera templates with HTML autoescaping, so spec text never
//! reaches the document as markup.
//!
//! # Example
//!
//! ```rust
//! use gamespec_compiler::compile;
//! use serde_json::json;
//!
//! let spec = json!({"meta": {"title": "Pop!", "template": "bubble_clicker"}});
//! let html = compile(&spec);
//!
//! assert!(html.starts_with("<!DOCTYPE html>"));
//! assert_eq!(html, compile(&spec));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod compiler;
mod params;
mod registry;
mod schedule;
mod survival;
mod templates;

pub use compiler::{compile, Compiler};
pub use params::{
    RuntimeConfig, SandboxParams, SceneParams, SurvivalParams, DEFAULT_HEIGHT, DEFAULT_SPEED,
    DEFAULT_WIDTH,
};
pub use registry::{Template, TemplateRegistry};
pub use schedule::{SpawnSchedule, CATCH_UP_CAP};
pub use survival::{
    Orb, RunState, SurvivalRun, DEFAULT_FRAME_MS, MAX_FRAME_MS, PALETTE_LEN, POP_MS,
};
pub use templates::{BubbleClickerTemplate, SandboxTemplate};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use gamespec_model::{apply, default_spec, PatchOp};
    use serde_json::json;

    #[test]
    fn default_spec_compiles_with_sandbox() {
        let spec = default_spec("a tiny maze");
        let html = compile(&spec);
        assert!(html.contains("<title>a tiny maze</title>"));
        assert!(html.contains(r#"id="player""#));
    }

    #[test]
    fn template_switch_changes_renderer() {
        let spec = default_spec("pop some bubbles");
        let next = apply(
            &spec,
            &[PatchOp::add("/meta/template".parse().unwrap(), "bubble_clicker")],
        );
        assert!(!compile(&spec).contains("<canvas"));
        assert!(compile(&next).contains(r#"<canvas id="game""#));
    }

    #[test]
    fn custom_registry_is_used() {
        let compiler = Compiler::new(TemplateRegistry::new());
        let html = compiler.compile(&json!({"meta": {"template": "bubble_clicker"}}));
        assert!(!html.contains("<canvas"));
        assert_eq!(compiler.registry().len(), 1);
    }
}
