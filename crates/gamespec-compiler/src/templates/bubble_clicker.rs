use super::{render_page, BUBBLE_CLICKER_PAGE};
use crate::params::{RuntimeConfig, SurvivalParams};
use crate::registry::Template;
use crate::schedule::SpawnSchedule;
use gamespec_model::{Skin, Theme};
use serde::Serialize;
use serde_json::Value;

const DARK_VARS: &str = "--bg:#0b1020;--panel:#121a2b;--text:#e6f0ff;--muted:#9aa6b2;--stage:#0a0a0a";
const LIGHT_VARS: &str = "--bg:#f4f6fb;--panel:#ffffff;--text:#111827;--muted:#4b5563;--stage:#e8edf5";

/// Timed-spawn survival game
///
/// Objects spawn on a doubling or per-interval schedule; clicking pops them
/// and the run ends when the live count reaches the limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct BubbleClickerTemplate;

/// Plural noun, HUD label and action verb for a skin
fn wording(skin: Skin) -> (&'static str, &'static str, &'static str) {
    match skin {
        Skin::Bubble => ("bubbles", "Bubbles", "Pop"),
        Skin::Balloon => ("balloons", "Balloons", "Pop"),
        Skin::Chicken => ("chickens", "Chickens", "Catch"),
        Skin::Slime => ("slimes", "Slimes", "Squish"),
        Skin::Asteroid => ("asteroids", "Asteroids", "Blast"),
    }
}

fn help_text(p: &SurvivalParams, noun: &str) -> String {
    let secs = p.interval_seconds_label();
    let limit = p.limit.max_concurrent;
    let schedule = if p.spawn.mode.is_per_interval() {
        format!("Every {secs}s spawns +{} {noun}.", p.add_per_interval())
    } else {
        format!("Every {secs}s the spawn amount doubles.")
    };
    if p.limit.end_on_limit {
        format!("{schedule} Hit {limit} {noun} on screen and it's game over.")
    } else {
        format!("{schedule} At most {limit} {noun} fit on screen.")
    }
}

#[derive(Serialize)]
struct SurvivalPage<'a> {
    title: &'a str,
    theme_vars: &'static str,
    show_time: bool,
    show_count: bool,
    show_spawn_rate: bool,
    noun_label: &'static str,
    noun: &'static str,
    verb: &'static str,
    verb_lower: String,
    help: String,
    spawn_label: String,
    sound_label: &'static str,
    pause_key: String,
    w: u32,
    h: u32,
    config: RuntimeConfig,
}

impl Template for BubbleClickerTemplate {
    fn id(&self) -> &'static str {
        "bubble_clicker"
    }

    fn render(&self, spec: &Value) -> String {
        let p = SurvivalParams::from_spec(spec);
        let (noun, noun_label, verb) = wording(p.skin);
        let schedule = SpawnSchedule::new(&p.spawn);

        render_page(
            BUBBLE_CLICKER_PAGE,
            &SurvivalPage {
                title: &p.scene.title,
                theme_vars: match p.scene.theme {
                    Theme::Dark => DARK_VARS,
                    Theme::Light => LIGHT_VARS,
                },
                show_time: p.show_time,
                show_count: p.show_count,
                show_spawn_rate: p.show_spawn_rate,
                noun_label,
                noun,
                verb,
                verb_lower: verb.to_ascii_lowercase(),
                help: help_text(&p, noun),
                spawn_label: schedule.rate_label(0),
                sound_label: if p.sound { "Sound: On" } else { "Sound: Off" },
                pause_key: p.pause_key.to_string(),
                w: p.scene.width,
                h: p.scene.height,
                config: p.runtime_config(),
            },
        )
    }
}
