//! Game Spec document model
//!
//! The canonical document is an untyped JSON tree (so that unknown fields
//! survive patching verbatim). This module provides the typed vocabulary
//! used to build and read it: template tags, themes, spawn modes, skins,
//! and the default document.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::{self, Display, Formatter};

/// Maximum title length taken from a prompt
pub const TITLE_LIMIT: usize = 60;

/// Template tag in `meta.template`
///
/// The tag alone decides which renderer handles a spec; it is never
/// inferred from the rest of the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TemplateId {
    /// Movable-object demo; also the fallback for unknown tags
    #[default]
    Sandbox,
    /// Timed-spawn survival game
    BubbleClicker,
    /// Any other tag (rendered by the fallback)
    Other(String),
}

impl TemplateId {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sandbox => "sandbox",
            Self::BubbleClicker => "bubble_clicker",
            Self::Other(name) => name,
        }
    }

    /// Parse a wire name; never fails
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "sandbox" => Self::Sandbox,
            "bubble_clicker" => Self::BubbleClicker,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Display for TemplateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TemplateId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TemplateId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Self::parse(&String::deserialize(d)?))
    }
}

/// Colour theme in `meta.theme`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Parse leniently; anything but `light` is dark
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("light") {
            Self::Light
        } else {
            Self::Dark
        }
    }
}

/// Spawn schedule mode in `rules.spawn.mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnMode {
    /// `2^k` objects in window `k`
    #[default]
    Doubling,
    /// A fixed count each window
    Linear,
    /// Same schedule as linear
    Fixed,
}

impl SpawnMode {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Doubling => "doubling",
            Self::Linear => "linear",
            Self::Fixed => "fixed",
        }
    }

    /// Parse a wire name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "doubling" => Some(Self::Doubling),
            "linear" => Some(Self::Linear),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }

    /// Whether the window target is a fixed per-interval count
    #[must_use]
    pub fn is_per_interval(self) -> bool {
        matches!(self, Self::Linear | Self::Fixed)
    }
}

/// Cosmetic skin in `meta.skin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skin {
    Bubble,
    Balloon,
    Chicken,
    Slime,
    Asteroid,
}

impl Skin {
    /// Every known skin
    pub const ALL: [Skin; 5] = [
        Skin::Bubble,
        Skin::Balloon,
        Skin::Chicken,
        Skin::Slime,
        Skin::Asteroid,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bubble => "bubble",
            Self::Balloon => "balloon",
            Self::Chicken => "chicken",
            Self::Slime => "slime",
            Self::Asteroid => "asteroid",
        }
    }

    /// Match a noun, singular or plural, case-insensitively
    #[must_use]
    pub fn from_noun(word: &str) -> Option<Self> {
        let lower = word.to_ascii_lowercase();
        let singular = lower.strip_suffix('s').unwrap_or(&lower);
        Self::ALL.into_iter().find(|skin| skin.as_str() == singular)
    }

    /// Baseline skin for a template
    #[must_use]
    pub fn baseline_for(_template: &TemplateId) -> Self {
        // Only the survival template draws skins today; sandbox ignores it.
        Self::Bubble
    }
}

impl Display for Skin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `rules.spawn` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRule {
    pub mode: SpawnMode,
    pub interval_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_per_interval: Option<u32>,
}

impl SpawnRule {
    /// Default schedule: doubling every two seconds
    pub const DEFAULT: SpawnRule = SpawnRule {
        mode: SpawnMode::Doubling,
        interval_ms: 2000,
        add_per_interval: None,
    };

    /// Doubling schedule
    #[must_use]
    pub fn doubling(interval_ms: u64) -> Self {
        Self {
            mode: SpawnMode::Doubling,
            interval_ms,
            add_per_interval: None,
        }
    }

    /// Fixed count per interval
    #[must_use]
    pub fn linear(add_per_interval: u32, interval_ms: u64) -> Self {
        Self {
            mode: SpawnMode::Linear,
            interval_ms,
            add_per_interval: Some(add_per_interval),
        }
    }

    /// Document form
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// `rules.limit` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitRule {
    pub max_concurrent: u32,
    pub end_on_limit: bool,
}

impl LimitRule {
    /// Default ceiling of 100 live objects
    pub const DEFAULT: LimitRule = LimitRule {
        max_concurrent: 100,
        end_on_limit: true,
    };

    /// Document form
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// `hud` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudToggles {
    pub show_time: bool,
    pub show_count: bool,
    pub show_spawn_rate: bool,
    pub sound: bool,
    pub pause_hotkey: String,
}

impl Default for HudToggles {
    fn default() -> Self {
        Self {
            show_time: true,
            show_count: true,
            show_spawn_rate: true,
            sound: true,
            pause_hotkey: "P".to_string(),
        }
    }
}

/// `meta` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<Skin>,
    pub theme: Theme,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed form of a freshly created spec
///
/// Free-form sections stay as JSON values; unknown top-level fields are kept
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSpec {
    pub meta: Meta,
    pub scene: Value,
    pub player: Value,
    pub entities: Vec<Value>,
    pub enemies: Vec<Value>,
    pub goals: Value,
    pub rules: Map<String, Value>,
    pub controls: Value,
    pub aesthetics: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hud: Option<HudToggles>,
    pub notes: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GameSpec {
    /// Default spec for a new session, titled from the first prompt
    #[must_use]
    pub fn for_prompt(prompt: &str) -> Self {
        let trimmed = prompt.trim();
        let title = if trimmed.is_empty() {
            "Untitled Game".to_string()
        } else {
            trimmed.chars().take(TITLE_LIMIT).collect()
        };

        let mut rules = Map::new();
        rules.insert("difficulty".into(), json!("normal"));

        Self {
            meta: Meta {
                title,
                template: None,
                skin: None,
                theme: Theme::Dark,
                extra: Map::new(),
            },
            scene: json!({"size": {"w": 800, "h": 500}, "hidpi": true}),
            player: json!({"controller": "topdown", "speed": 200, "hp": 1, "weapons": []}),
            entities: Vec::new(),
            enemies: Vec::new(),
            goals: json!(["survive_timer"]),
            rules,
            controls: json!(["wasd"]),
            aesthetics: json!({"palette": "midnight", "sfx": []}),
            hud: None,
            notes: String::new(),
            extra: Map::new(),
        }
    }

    /// Document form
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

impl Default for GameSpec {
    fn default() -> Self {
        Self::for_prompt("")
    }
}

/// Default document for a new session
#[must_use]
pub fn default_spec(prompt: &str) -> Value {
    GameSpec::for_prompt(prompt).to_value()
}

/// Compiler-relevant projection of a spec
///
/// Only title, template, scene, player, goals and rules take part; notes,
/// skin and aesthetics do not.
#[must_use]
pub fn reduced_projection(spec: &Value) -> Value {
    let pick = |pointer: &str| spec.pointer(pointer).cloned().unwrap_or(Value::Null);
    json!({
        "title": pick("/meta/title"),
        "template": pick("/meta/template"),
        "scene": pick("/scene"),
        "player": pick("/player"),
        "goals": pick("/goals"),
        "rules": pick("/rules"),
    })
}
