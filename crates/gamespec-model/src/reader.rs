//! Lenient reads over an untyped spec document
//!
//! Patches are untyped, so any field may hold the wrong kind of value.
//! [`SpecReader`] never fails: a missing or mistyped field reads as `None`
//! and callers supply the default.

use crate::spec::{Skin, SpawnMode, TemplateId, Theme};
use serde_json::Value;

/// Borrowed view over a spec document
#[derive(Debug, Clone, Copy)]
pub struct SpecReader<'a> {
    doc: &'a Value,
}

impl<'a> SpecReader<'a> {
    /// Wrap a document
    #[inline]
    #[must_use]
    pub fn new(doc: &'a Value) -> Self {
        Self { doc }
    }

    /// Underlying document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &'a Value {
        self.doc
    }

    /// Raw value at a slash pointer
    #[inline]
    #[must_use]
    pub fn get(&self, pointer: &str) -> Option<&'a Value> {
        self.doc.pointer(pointer)
    }

    /// Non-empty string at a pointer
    #[must_use]
    pub fn str_at(&self, pointer: &str) -> Option<&'a str> {
        self.get(pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Finite number at a pointer; numeric strings are accepted
    #[must_use]
    pub fn f64_at(&self, pointer: &str) -> Option<f64> {
        let n = match self.get(pointer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }?;
        n.is_finite().then_some(n)
    }

    /// Boolean at a pointer
    #[must_use]
    pub fn bool_at(&self, pointer: &str) -> Option<bool> {
        self.get(pointer).and_then(Value::as_bool)
    }

    /// `meta.title`
    #[must_use]
    pub fn title(&self) -> Option<&'a str> {
        self.str_at("/meta/title")
    }

    /// `meta.template`, defaulting to sandbox
    #[must_use]
    pub fn template(&self) -> TemplateId {
        self.str_at("/meta/template")
            .map(TemplateId::parse)
            .unwrap_or_default()
    }

    /// Whether `meta.template` is explicitly set
    #[must_use]
    pub fn has_template(&self) -> bool {
        self.str_at("/meta/template").is_some()
    }

    /// `meta.theme`
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.str_at("/meta/theme").map(Theme::parse).unwrap_or_default()
    }

    /// `meta.skin` when it names a known skin
    #[must_use]
    pub fn skin(&self) -> Option<Skin> {
        self.str_at("/meta/skin").and_then(Skin::from_noun)
    }

    /// `rules.spawn.mode`
    #[must_use]
    pub fn spawn_mode(&self) -> Option<SpawnMode> {
        self.str_at("/rules/spawn/mode").and_then(SpawnMode::parse)
    }

    /// `meta.direct_mode`
    #[must_use]
    pub fn direct_mode(&self) -> bool {
        self.bool_at("/meta/direct_mode").unwrap_or(false)
    }

    /// String items of a sequence, or a single string
    #[must_use]
    pub fn strings_at(&self, pointer: &str) -> Vec<&'a str> {
        match self.get(pointer) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(s)) => vec![s.as_str()],
            _ => Vec::new(),
        }
    }
}
