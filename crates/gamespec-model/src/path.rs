//! Slash-delimited paths into a spec document
//!
//! Provides [`PatchPath`] for addressing nested mapping keys and sequence
//! indices, e.g. `/rules/spawn/interval_ms` or `/entities/0/kind`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path within a spec document
///
/// Segments are stored unescaped. The textual form escapes `~` as `~0` and
/// `/` as `~1` inside a segment.
///
/// # Examples
/// - `["meta", "skin"]` → `/meta/skin`
/// - `["a/b"]` → `/a~1b`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatchPath(Vec<String>);

impl PatchPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Build a path from string slices
    #[must_use]
    pub fn from_segments(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| (*s).to_string()).collect())
    }

    /// Empty path (document root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the root path
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split into parent segments and leaf key (None for root)
    #[inline]
    #[must_use]
    pub fn split_last(&self) -> Option<(&str, &[String])> {
        self.0.split_last().map(|(leaf, parents)| (leaf.as_str(), parents))
    }

    /// First segment (the top-level section)
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Whether this path equals or lies beneath `other`
    #[inline]
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        self.0.len() >= other.0.len() && self.0[..other.0.len()] == other.0[..]
    }
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape_segment(segment: &str) -> Result<String, PathError> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return Err(PathError::InvalidEscape(segment.to_string())),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

impl Display for PatchPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", escape_segment(segment))?;
        }
        Ok(())
    }
}

impl FromStr for PatchPath {
    type Err = PathError;

    /// Parse a slash path
    ///
    /// The leading slash is optional, and both `""` and `"/"` denote the
    /// root.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix('/').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let segments = trimmed
            .split('/')
            .map(unescape_segment)
            .collect::<Result<_, _>>()?;
        Ok(Self(segments))
    }
}

impl TryFrom<String> for PatchPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PatchPath> for String {
    fn from(path: PatchPath) -> Self {
        path.to_string()
    }
}

impl Default for PatchPath {
    fn default() -> Self {
        Self::root()
    }
}

/// Errors related to patch paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// `~` not followed by `0` or `1`
    #[error("invalid escape in path segment: {0}")]
    InvalidEscape(String),
}
