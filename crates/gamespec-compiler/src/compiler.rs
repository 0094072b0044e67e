//! Spec to document compilation

use crate::registry::TemplateRegistry;
use once_cell::sync::Lazy;
use serde_json::Value;

static DEFAULT_COMPILER: Lazy<Compiler> = Lazy::new(Compiler::default);

/// Dispatches specs to template renderers
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    registry: TemplateRegistry,
}

impl Compiler {
    /// Compiler over a custom registry
    #[inline]
    #[must_use]
    pub fn new(registry: TemplateRegistry) -> Self {
        Self { registry }
    }

    /// Template registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Render a spec to a complete HTML document
    ///
    /// Never fails: malformed fields are defaulted or clamped and unknown
    /// templates render with the sandbox.
    #[must_use]
    pub fn compile(&self, spec: &Value) -> String {
        let template = self.registry.select(spec);
        let html = template.render(spec);
        tracing::debug!(template = template.id(), bytes = html.len(), "compiled spec");
        html
    }
}

/// Compile with the built-in templates
#[must_use]
pub fn compile(spec: &Value) -> String {
    DEFAULT_COMPILER.compile(spec)
}
