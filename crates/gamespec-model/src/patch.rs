//! Structured patches over spec documents
//!
//! Provides [`PatchOp`] and [`Patch`], the minimal add/replace/remove subset
//! of a JSON document patch, and [`apply`], the engine that produces a new
//! document from an old one.
//!
//! The engine is defensive rather than strict: patches come from
//! best-effort sources, so an operation that cannot be applied is skipped
//! and recorded in the [`ApplyReport`] instead of failing the batch.

use crate::path::PatchPath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};

/// One patch operation
///
/// Wire form: `{"op": "add", "path": "/meta/skin", "value": "balloon"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// Set a value, creating intermediate mappings as needed
    Add {
        #[serde(with = "path_string")]
        path: PatchPath,
        value: Value,
    },

    /// Set a value under an existing parent
    Replace {
        #[serde(with = "path_string")]
        path: PatchPath,
        value: Value,
    },

    /// Delete a value; missing keys are a no-op
    Remove {
        #[serde(with = "path_string")]
        path: PatchPath,
    },
}

impl PatchOp {
    /// Add operation
    #[inline]
    #[must_use]
    pub fn add(path: PatchPath, value: impl Into<Value>) -> Self {
        Self::Add {
            path,
            value: value.into(),
        }
    }

    /// Replace operation
    #[inline]
    #[must_use]
    pub fn replace(path: PatchPath, value: impl Into<Value>) -> Self {
        Self::Replace {
            path,
            value: value.into(),
        }
    }

    /// Remove operation
    #[inline]
    #[must_use]
    pub fn remove(path: PatchPath) -> Self {
        Self::Remove { path }
    }

    /// Target path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &PatchPath {
        match self {
            Self::Add { path, .. } | Self::Replace { path, .. } | Self::Remove { path } => path,
        }
    }

    /// Value carried by add/replace
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Add { value, .. } | Self::Replace { value, .. } => Some(value),
            Self::Remove { .. } => None,
        }
    }

    /// Operation kind as it appears on the wire
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Replace { .. } => "replace",
            Self::Remove { .. } => "remove",
        }
    }
}

impl Display for PatchOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.path())
    }
}

mod path_string {
    use crate::path::PatchPath;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(path: &PatchPath, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(path)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<PatchPath, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered list of patch operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(Vec<PatchOp>);

impl Patch {
    /// Empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Operations in order
    #[inline]
    #[must_use]
    pub fn ops(&self) -> &[PatchOp] {
        &self.0
    }

    /// Number of operations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the patch has no operations
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append one operation
    #[inline]
    pub fn push(&mut self, op: PatchOp) {
        self.0.push(op);
    }

    /// Append all operations of another patch
    #[inline]
    pub fn extend(&mut self, other: Patch) {
        self.0.extend(other.0);
    }

    /// Iterate operations
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, PatchOp> {
        self.0.iter()
    }

    /// Whether any operation touches `prefix` or a path beneath it
    #[must_use]
    pub fn touches(&self, prefix: &PatchPath) -> bool {
        self.0.iter().any(|op| op.path().starts_with(prefix))
    }

    /// Apply to a document, producing an independent new document
    #[inline]
    #[must_use]
    pub fn apply_to(&self, spec: &Value) -> Value {
        apply(spec, &self.0)
    }

    /// Parse patch text from an untrusted source
    ///
    /// Accepts a bare JSON array, an array wrapped in a markdown code fence or
    /// surrounded by prose, or an object with a `patch`/`ops` array field.
    /// Entries that are not well-formed operations (unknown `op`, bad path,
    /// missing value) are dropped individually.
    ///
    /// # Errors
    /// Returns error if no JSON array of operations can be located at all
    pub fn from_text(text: &str) -> Result<Self, PatchParseError> {
        let body = strip_fences(text.trim());
        let value: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(_) => {
                let start = body.find('[').ok_or(PatchParseError::NoArray)?;
                let end = body.rfind(']').ok_or(PatchParseError::NoArray)?;
                if end <= start {
                    return Err(PatchParseError::NoArray);
                }
                serde_json::from_str(&body[start..=end])
                    .map_err(|e| PatchParseError::InvalidJson(e.to_string()))?
            }
        };
        Self::from_value(value)
    }

    /// Build a patch from an already-decoded JSON value, dropping malformed
    /// entries
    ///
    /// # Errors
    /// Returns error if the value holds neither an operation array nor a
    /// single operation
    pub fn from_value(value: Value) -> Result<Self, PatchParseError> {
        let entries = match value {
            Value::Array(items) => items,
            Value::Object(map) if map.contains_key("op") => vec![Value::Object(map)],
            Value::Object(mut map) => match map.remove("patch").or_else(|| map.remove("ops")) {
                Some(Value::Array(items)) => items,
                _ => return Err(PatchParseError::NoArray),
            },
            _ => return Err(PatchParseError::NoArray),
        };

        let total = entries.len();
        let ops: Vec<PatchOp> = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();
        if ops.len() < total {
            tracing::debug!(dropped = total - ops.len(), "dropped malformed patch entries");
        }
        Ok(Self(ops))
    }
}

impl From<Vec<PatchOp>> for Patch {
    fn from(ops: Vec<PatchOp>) -> Self {
        Self(ops)
    }
}

impl IntoIterator for Patch {
    type Item = PatchOp;
    type IntoIter = std::vec::IntoIter<PatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Patch {
    type Item = &'a PatchOp;
    type IntoIter = std::slice::Iter<'a, PatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Errors while reading patch text
#[derive(Debug, thiserror::Error)]
pub enum PatchParseError {
    /// Text contains no operation array
    #[error("no patch array found")]
    NoArray,

    /// The located array is not valid JSON
    #[error("invalid patch json: {0}")]
    InvalidJson(String),
}

/// Why an operation was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Operation targets the document root
    RootPath,
    /// An intermediate segment does not exist (replace/remove only)
    MissingParent,
    /// Path walks through a string, number, boolean or null
    NotAContainer,
    /// Sequence segment is not a number (or `-` outside add)
    InvalidIndex,
    /// Sequence index beyond the end
    IndexOutOfRange,
}

/// One skipped operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOp {
    /// Position in the patch
    pub index: usize,
    /// Path of the skipped operation
    pub path: String,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// Outcome of applying a patch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Number of operations applied
    pub applied: usize,
    /// Operations dropped, in order
    pub skipped: Vec<SkippedOp>,
}

impl ApplyReport {
    /// Whether every operation was applied
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Apply `ops` to `spec`, returning an independent new document
///
/// `spec` is never modified. A non-mapping root is treated as an empty
/// mapping.
#[must_use]
pub fn apply(spec: &Value, ops: &[PatchOp]) -> Value {
    apply_with_report(spec, ops).0
}

/// Apply `ops` to `spec` and report which operations were skipped
#[must_use]
pub fn apply_with_report(spec: &Value, ops: &[PatchOp]) -> (Value, ApplyReport) {
    let mut doc = match spec {
        Value::Object(_) => spec.clone(),
        _ => Value::Object(Map::new()),
    };
    let mut report = ApplyReport::default();

    for (index, op) in ops.iter().enumerate() {
        match apply_op(&mut doc, op) {
            Ok(()) => report.applied += 1,
            Err(reason) => {
                tracing::debug!(index, op = %op, ?reason, "skipping patch operation");
                report.skipped.push(SkippedOp {
                    index,
                    path: op.path().to_string(),
                    reason,
                });
            }
        }
    }

    (doc, report)
}

fn apply_op(doc: &mut Value, op: &PatchOp) -> Result<(), SkipReason> {
    let (leaf, parents) = op.path().split_last().ok_or(SkipReason::RootPath)?;
    let create = matches!(op, PatchOp::Add { .. });
    let parent = resolve_parent(doc, parents, create)?;

    match op {
        PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } => {
            set_leaf(parent, leaf, value.clone(), create)
        }
        PatchOp::Remove { .. } => remove_leaf(parent, leaf),
    }
}

fn resolve_parent<'a>(
    doc: &'a mut Value,
    segments: &[String],
    create: bool,
) -> Result<&'a mut Value, SkipReason> {
    let mut current = doc;
    for segment in segments {
        current = match (current, create) {
            (Value::Object(map), true) => {
                let slot = map.entry(segment.clone()).or_insert(Value::Null);
                if slot.is_null() {
                    *slot = Value::Object(Map::new());
                }
                slot
            }
            (Value::Object(map), false) => {
                map.get_mut(segment).ok_or(SkipReason::MissingParent)?
            }
            (Value::Array(items), _) => {
                let index = parse_index(segment).ok_or(SkipReason::InvalidIndex)?;
                items.get_mut(index).ok_or(SkipReason::IndexOutOfRange)?
            }
            _ => return Err(SkipReason::NotAContainer),
        };
    }
    Ok(current)
}

fn set_leaf(parent: &mut Value, leaf: &str, value: Value, create: bool) -> Result<(), SkipReason> {
    match parent {
        Value::Object(map) => {
            map.insert(leaf.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            if leaf == "-" {
                if !create {
                    return Err(SkipReason::InvalidIndex);
                }
                items.push(value);
                return Ok(());
            }
            let index = parse_index(leaf).ok_or(SkipReason::InvalidIndex)?;
            if index < items.len() {
                items[index] = value;
                Ok(())
            } else if index == items.len() && create {
                items.push(value);
                Ok(())
            } else {
                Err(SkipReason::IndexOutOfRange)
            }
        }
        _ => Err(SkipReason::NotAContainer),
    }
}

fn remove_leaf(parent: &mut Value, leaf: &str) -> Result<(), SkipReason> {
    match parent {
        Value::Object(map) => {
            map.remove(leaf);
            Ok(())
        }
        Value::Array(items) => {
            if let Some(index) = parse_index(leaf) {
                if index < items.len() {
                    items.remove(index);
                }
            }
            Ok(())
        }
        _ => Err(SkipReason::NotAContainer),
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    // Reject "+1" and leading zeros so one index has one spelling.
    if segment.is_empty()
        || !segment.bytes().all(|b| b.is_ascii_digit())
        || (segment.len() > 1 && segment.starts_with('0'))
    {
        return None;
    }
    segment.parse().ok()
}
