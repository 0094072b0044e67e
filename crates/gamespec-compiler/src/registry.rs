//! Template registry
//!
//! Provides [`Template`] and [`TemplateRegistry`] for dispatching a spec to
//! its renderer by `meta.template`.

use crate::templates::{BubbleClickerTemplate, SandboxTemplate};
use gamespec_model::{SpecReader, TemplateId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A renderer for one game family
///
/// # Contract
/// `render` must be pure: equal specs produce byte-identical documents, and
/// every spec (including `{}`) produces a complete document.
pub trait Template: Send + Sync + std::fmt::Debug {
    /// Template id as written in `meta.template`
    fn id(&self) -> &'static str;

    /// Render a complete HTML document
    fn render(&self, spec: &Value) -> String;
}

/// Registry of renderers keyed by template id
///
/// Unknown or missing ids resolve to the fallback renderer.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, Arc<dyn Template>>,
    fallback: Arc<dyn Template>,
}

impl TemplateRegistry {
    /// Registry holding only the sandbox fallback
    #[must_use]
    pub fn new() -> Self {
        let fallback: Arc<dyn Template> = Arc::new(SandboxTemplate);
        let mut templates = HashMap::new();
        templates.insert(fallback.id().to_string(), Arc::clone(&fallback));
        Self {
            templates,
            fallback,
        }
    }

    /// Registry with the built-in templates
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BubbleClickerTemplate));
        registry
    }

    /// Register a template, replacing any with the same id
    pub fn register(&mut self, template: Arc<dyn Template>) {
        self.templates.insert(template.id().to_string(), template);
    }

    /// Check if a template id is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Registered ids, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get number of registered templates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Renderer for a template id, or the fallback
    #[must_use]
    pub fn resolve(&self, id: &TemplateId) -> &Arc<dyn Template> {
        self.templates.get(id.as_str()).unwrap_or(&self.fallback)
    }

    /// Renderer selected by a spec's `meta.template`
    #[must_use]
    pub fn select(&self, spec: &Value) -> &Arc<dyn Template> {
        let id = SpecReader::new(spec).template();
        let template = self.resolve(&id);
        if template.id() != id.as_str() {
            tracing::debug!(requested = %id, using = template.id(), "unknown template, using fallback");
        }
        template
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
