//! Render parameters extracted from a spec
//!
//! Every numeric field is defaulted when missing or mistyped and clamped
//! into a playable range, so a hostile or stale spec still renders.

use gamespec_model::{LimitRule, Skin, SpawnMode, SpawnRule, SpecDigest, SpecReader, Theme};
use serde::Serialize;
use serde_json::Value;

/// Default scene width in CSS pixels
pub const DEFAULT_WIDTH: u32 = 800;
/// Default scene height in CSS pixels
pub const DEFAULT_HEIGHT: u32 = 500;
/// Default player speed in pixels per second
pub const DEFAULT_SPEED: u32 = 200;

const MIN_SIDE: f64 = 120.0;
const MAX_SIDE: f64 = 4096.0;
const MAX_SPEED: f64 = 2000.0;
const MIN_INTERVAL_MS: f64 = 100.0;
const MAX_INTERVAL_MS: f64 = 600_000.0;
const MAX_ADD_PER_INTERVAL: f64 = 1000.0;
const MAX_LIMIT: f64 = 10_000.0;

// Values are finite (SpecReader filters NaN and infinities) and the casts
// below happen after clamping into small positive ranges.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamped(value: Option<f64>, default: u32, min: f64, max: f64) -> u32 {
    value.map_or(default, |v| v.round().clamp(min, max) as u32)
}

/// Parameters shared by every template
#[derive(Debug, Clone, PartialEq)]
pub struct SceneParams {
    pub title: String,
    pub theme: Theme,
    pub width: u32,
    pub height: u32,
    pub hidpi: bool,
}

impl SceneParams {
    /// Read scene parameters, using `default_title` when the spec has none
    #[must_use]
    pub fn from_spec(spec: &Value, default_title: &str) -> Self {
        let r = SpecReader::new(spec);
        Self {
            title: r.title().unwrap_or(default_title).to_string(),
            theme: r.theme(),
            width: clamped(r.f64_at("/scene/size/w"), DEFAULT_WIDTH, MIN_SIDE, MAX_SIDE),
            height: clamped(r.f64_at("/scene/size/h"), DEFAULT_HEIGHT, MIN_SIDE, MAX_SIDE),
            hidpi: r.bool_at("/scene/hidpi").unwrap_or(true),
        }
    }
}

/// Parameters for the sandbox renderer
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxParams {
    pub scene: SceneParams,
    pub speed: u32,
    pub controller: String,
    pub controls: Vec<String>,
}

impl SandboxParams {
    /// Read sandbox parameters
    #[must_use]
    pub fn from_spec(spec: &Value) -> Self {
        let r = SpecReader::new(spec);
        let mut controls: Vec<String> = r
            .strings_at("/controls")
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string)
            .collect();
        if controls.is_empty() {
            controls.push("wasd".to_string());
        }

        Self {
            scene: SceneParams::from_spec(spec, "Your Game"),
            speed: clamped(r.f64_at("/player/speed"), DEFAULT_SPEED, 0.0, MAX_SPEED),
            controller: r
                .str_at("/player/controller")
                .unwrap_or("topdown")
                .to_string(),
            controls,
        }
    }

    /// Controls list as shown in the HUD
    #[must_use]
    pub fn controls_label(&self) -> String {
        self.controls.join(", ").to_uppercase()
    }
}

/// Parameters for the timed-spawn survival renderer
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivalParams {
    pub scene: SceneParams,
    pub spawn: SpawnRule,
    pub limit: LimitRule,
    pub skin: Skin,
    pub pause_key: char,
    pub show_time: bool,
    pub show_count: bool,
    pub show_spawn_rate: bool,
    pub sound: bool,
}

impl SurvivalParams {
    /// Read survival parameters
    ///
    /// Legacy spawn keys (`window_ms`, `intervalSeconds`, `addPerTick`) and
    /// the legacy limit key (`concurrent_bubbles`) are honoured when the
    /// current keys are absent.
    #[must_use]
    pub fn from_spec(spec: &Value) -> Self {
        let r = SpecReader::new(spec);

        let mode = r.spawn_mode().unwrap_or(SpawnMode::Doubling);
        let interval = r
            .f64_at("/rules/spawn/interval_ms")
            .or_else(|| r.f64_at("/rules/spawn/intervalSeconds").map(|s| s * 1000.0))
            .or_else(|| r.f64_at("/rules/spawn/window_ms"));
        let interval_ms = u64::from(clamped(
            interval,
            2000,
            MIN_INTERVAL_MS,
            MAX_INTERVAL_MS,
        ));
        let add_per_interval = mode.is_per_interval().then(|| {
            clamped(
                r.f64_at("/rules/spawn/add_per_interval")
                    .or_else(|| r.f64_at("/rules/spawn/addPerTick")),
                1,
                0.0,
                MAX_ADD_PER_INTERVAL,
            )
        });

        let max_concurrent = clamped(
            r.f64_at("/rules/limit/max_concurrent")
                .or_else(|| r.f64_at("/rules/limit/concurrent_bubbles")),
            LimitRule::DEFAULT.max_concurrent,
            1.0,
            MAX_LIMIT,
        );

        let template = r.template();
        let pause_key = r
            .str_at("/hud/pause_hotkey")
            .and_then(|s| s.trim().chars().next())
            .filter(char::is_ascii_alphanumeric)
            .map_or('P', |c| c.to_ascii_uppercase());

        Self {
            scene: SceneParams::from_spec(spec, "Bubble Rush"),
            spawn: SpawnRule {
                mode,
                interval_ms,
                add_per_interval,
            },
            limit: LimitRule {
                max_concurrent,
                end_on_limit: r.bool_at("/rules/limit/end_on_limit").unwrap_or(true),
            },
            skin: r.skin().unwrap_or_else(|| Skin::baseline_for(&template)),
            pause_key,
            show_time: r.bool_at("/hud/show_time").unwrap_or(true),
            show_count: r.bool_at("/hud/show_count").unwrap_or(true),
            show_spawn_rate: r.bool_at("/hud/show_spawn_rate").unwrap_or(true),
            sound: r.bool_at("/hud/sound").unwrap_or(true),
        }
    }

    /// Objects added per window in per-interval modes
    #[inline]
    #[must_use]
    pub fn add_per_interval(&self) -> u32 {
        self.spawn.add_per_interval.unwrap_or(0)
    }

    /// Interval formatted in seconds, e.g. `2` or `1.5`
    #[must_use]
    pub fn interval_seconds_label(&self) -> String {
        #[allow(clippy::cast_precision_loss)]
        let secs = self.spawn.interval_ms as f64 / 1000.0;
        format!("{secs}")
    }

    /// Local-storage key for the best time
    ///
    /// Derived from the title so that different games keep separate records.
    #[must_use]
    pub fn best_time_key(&self) -> String {
        let digest = SpecDigest::compute(self.scene.title.as_bytes());
        format!("gamespec_best_v1_{}", digest.short())
    }

    /// Configuration object consumed by the emitted runtime
    #[must_use]
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            css_w: self.scene.width,
            css_h: self.scene.height,
            hidpi: self.scene.hidpi,
            mode: if self.spawn.mode.is_per_interval() {
                "linear"
            } else {
                "doubling"
            },
            interval_ms: self.spawn.interval_ms,
            add_per_interval: self.add_per_interval(),
            limit: self.limit.max_concurrent,
            end_on_limit: self.limit.end_on_limit,
            pause_key: self.pause_key.to_string(),
            skin: self.skin.as_str(),
            sound: self.sound,
            best_key: self.best_time_key(),
        }
    }
}

/// Runtime configuration, serialized into the document as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub css_w: u32,
    pub css_h: u32,
    pub hidpi: bool,
    pub mode: &'static str,
    pub interval_ms: u64,
    pub add_per_interval: u32,
    pub limit: u32,
    pub end_on_limit: bool,
    pub pause_key: String,
    pub skin: &'static str,
    pub sound: bool,
    pub best_key: String,
}
