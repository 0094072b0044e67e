//! Deterministic prompt rules
//!
//! A narrow set of phrasings is recognized without the intent service:
//! spawn-rate phrases, skin nouns, limit phrases, and the timed-spawn game
//! family. These feed the fallback patch and the override merge.

use gamespec_model::{
    HudToggles, LimitRule, Patch, PatchOp, PatchPath, Skin, SpawnMode, SpawnRule, SpecReader, TemplateId,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const SECONDS: &str = r"(?:s|secs?|seconds?)\b";

static DOUBLING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\bdoubl(?:e|es|ing)\b.*?\b(?:every|each)\s+(?:(\d+(?:\.\d+)?)\s*)?{SECONDS}"
    ))
    .expect("valid doubling pattern")
});

static COUNT_THEN_INTERVAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:add|adds|spawn|spawns)\s+(\d+)\b.*?\b(?:every|per|each)\s+(?:(\d+(?:\.\d+)?)\s*)?{SECONDS}"
    ))
    .expect("valid count/interval pattern")
});

static INTERVAL_THEN_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:every|per|each)\s+(?:(\d+(?:\.\d+)?)\s*)?{SECONDS}.*?\b(?:add|adds|spawn|spawns)\s+(\d+)\b"
    ))
    .expect("valid interval/count pattern")
});

static FIXED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfixed\b").expect("valid fixed pattern")
});

static SKIN_NOUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(bubbles?|balloons?|chickens?|slimes?|asteroids?)\b")
        .expect("valid skin pattern")
});

static RESKIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:make|turn)\s+(?:them|it|the\s+\w+)\s+(?:into|look\s+like)\s+|skin\s*(?:to|:|=)\s*|reskin\s+(?:as|to|into)\s+)([a-z]+)\b",
    )
    .expect("valid reskin pattern")
});

static LIMIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:game\s*over\s+at|ends?\s+at|limit(?:\s+(?:of|to|at|is))?|max(?:imum)?(?:\s+of)?|up\s+to)\s+(\d+)\b",
    )
    .expect("valid limit pattern")
});

static TIMED_SPAWN_FAMILY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:bubbles?|prick(?:s|ing|ed)?|pop(?:s|ping|ped)?|balloons?|chickens?|slimes?|asteroids?)\b",
    )
    .expect("valid family pattern")
});

static BUBBLE_SAFETY_NET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:bubbles?|prick(?:s|ing|ed)?|pop(?:s|ping|ped)?)\b")
        .expect("valid bubble pattern")
});

fn path(segments: &[&str]) -> PatchPath {
    PatchPath::from_segments(segments)
}

// Seconds are finite, positive and bounded by the regex to short decimals.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn interval_ms(seconds: Option<&str>) -> Option<u64> {
    let secs: f64 = seconds.map_or(Ok(1.0), str::parse).ok()?;
    let ms = (secs * 1000.0).round();
    (ms >= 1.0 && ms.is_finite()).then_some(ms as u64)
}

/// Whether the prompt starts with the direct-mode keyword
#[must_use]
pub fn is_direct_mode(prompt: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    !keyword.is_empty()
        && prompt
            .trim()
            .to_lowercase()
            .starts_with(&keyword.to_lowercase())
}

/// Patch that routes the turn around the compiler
#[must_use]
pub fn direct_mode_patch(prompt: &str) -> Patch {
    Patch::from(vec![
        PatchOp::add(path(&["meta", "direct_mode"]), true),
        PatchOp::add(path(&["meta", "raw_prompt"]), prompt),
    ])
}

/// Spawn schedule stated in the prompt
///
/// Doubling phrases win over count phrases when both appear.
#[must_use]
pub fn spawn_phrase(prompt: &str) -> Option<SpawnRule> {
    if let Some(caps) = DOUBLING.captures(prompt) {
        if let Some(ms) = interval_ms(caps.get(1).map(|m| m.as_str())) {
            return Some(SpawnRule::doubling(ms));
        }
    }

    let (count, seconds) = if let Some(caps) = COUNT_THEN_INTERVAL.captures(prompt) {
        (caps.get(1)?.as_str(), caps.get(2).map(|m| m.as_str()))
    } else {
        let caps = INTERVAL_THEN_COUNT.captures(prompt)?;
        (caps.get(2)?.as_str(), caps.get(1).map(|m| m.as_str()))
    };
    let add: u32 = count.parse().ok()?;
    let ms = interval_ms(seconds)?;
    let mode = if FIXED.is_match(prompt) {
        SpawnMode::Fixed
    } else {
        SpawnMode::Linear
    };
    Some(SpawnRule {
        mode,
        interval_ms: ms,
        add_per_interval: Some(add),
    })
}

/// Skin named in the prompt
///
/// A known noun maps to its skin. A reskin request naming an unknown noun
/// maps to the template's baseline skin.
#[must_use]
pub fn skin_phrase(prompt: &str, template: &TemplateId) -> Option<Skin> {
    if let Some(skin) = SKIN_NOUN
        .captures(prompt)
        .and_then(|caps| Skin::from_noun(caps.get(1)?.as_str()))
    {
        return Some(skin);
    }
    RESKIN
        .captures(prompt)
        .is_some()
        .then(|| Skin::baseline_for(template))
}

/// Concurrency limit stated in the prompt
#[must_use]
pub fn limit_phrase(prompt: &str) -> Option<u32> {
    LIMIT
        .captures(prompt)
        .and_then(|caps| caps.get(1)?.as_str().parse().ok())
        .filter(|n| *n > 0)
}

/// Whether the prompt describes a timed-spawn game
#[must_use]
pub fn is_timed_spawn_prompt(prompt: &str) -> bool {
    TIMED_SPAWN_FAMILY.is_match(prompt) || spawn_phrase(prompt).is_some()
}

/// Whether the prompt mentions bubbles, pricking or popping
#[must_use]
pub fn mentions_bubbles(prompt: &str) -> bool {
    BUBBLE_SAFETY_NET.is_match(prompt)
}

/// Last-resort patch built from fixed rules
///
/// For timed-spawn prompts on a spec not yet using `bubble_clicker`, switches
/// the template and seeds only the sections the spec lacks. The spawn
/// schedule is left to [`override_ops`] when the prompt states one. Other
/// prompts yield an empty patch.
#[must_use]
pub fn fallback_patch(spec: &Value, prompt: &str) -> Patch {
    let mut patch = Patch::new();
    if !is_timed_spawn_prompt(prompt) {
        return patch;
    }

    let r = SpecReader::new(spec);
    let limit = limit_phrase(prompt);
    let has_limit = r.get("/rules/limit").is_some_and(Value::is_object);

    let switching = r.template() != TemplateId::BubbleClicker;

    if switching {
        patch.push(PatchOp::add(path(&["meta", "template"]), "bubble_clicker"));
        if r.title().is_none() {
            let skin = skin_phrase(prompt, &TemplateId::BubbleClicker).unwrap_or(Skin::Bubble);
            let noun = skin.as_str();
            let mut title = noun[..1].to_ascii_uppercase();
            title.push_str(&noun[1..]);
            title.push_str(" Rush");
            patch.push(PatchOp::add(path(&["meta", "title"]), title));
        }
        if r.get("/rules/spawn").is_none() && spawn_phrase(prompt).is_none() {
            patch.push(PatchOp::add(
                path(&["rules", "spawn"]),
                SpawnRule::DEFAULT.to_value(),
            ));
        }
        if r.get("/hud").is_none() {
            let hud = serde_json::to_value(HudToggles::default()).unwrap_or(Value::Null);
            patch.push(PatchOp::add(path(&["hud"]), hud));
        }
        if r.get("/scene/hidpi").is_none() {
            patch.push(PatchOp::add(path(&["scene", "hidpi"]), true));
        }
    }

    if has_limit {
        if let Some(n) = limit {
            patch.push(PatchOp::add(path(&["rules", "limit", "max_concurrent"]), n));
        }
    } else if switching || limit.is_some() {
        let rule = LimitRule {
            max_concurrent: limit.unwrap_or(LimitRule::DEFAULT.max_concurrent),
            ..LimitRule::DEFAULT
        };
        patch.push(PatchOp::add(path(&["rules", "limit"]), rule.to_value()));
    }
    patch
}

/// High-confidence operations re-applied after any proposal
///
/// Only `/meta/skin` and `/rules/spawn` are ever touched.
#[must_use]
pub fn override_ops(prompt: &str, template: &TemplateId) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    if let Some(skin) = skin_phrase(prompt, template) {
        ops.push(PatchOp::add(path(&["meta", "skin"]), skin.as_str()));
    }
    if let Some(rule) = spawn_phrase(prompt) {
        ops.push(PatchOp::add(path(&["rules", "spawn"]), rule.to_value()));
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamespec_model::{apply, default_spec};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn direct_mode_is_case_insensitive_prefix() {
        assert!(is_direct_mode("  DIRECT: build me tetris", "direct:"));
        assert!(!is_direct_mode("make it direct: please", "direct:"));
        assert!(!is_direct_mode("anything", ""));
        let patch = direct_mode_patch("direct: x");
        assert_eq!(patch.len(), 2);
        assert_eq!(patch.ops()[1].value(), Some(&json!("direct: x")));
    }

    #[test]
    fn doubling_phrases() {
        assert_eq!(
            spawn_phrase("make them double every 3 seconds"),
            Some(SpawnRule::doubling(3000))
        );
        assert_eq!(
            spawn_phrase("doubling each 1.5s"),
            Some(SpawnRule::doubling(1500))
        );
        assert_eq!(spawn_phrase("doubles every second"), Some(SpawnRule::doubling(1000)));
    }

    #[test]
    fn count_phrases_in_either_order() {
        assert_eq!(spawn_phrase("add 3 every 2 seconds"), Some(SpawnRule::linear(3, 2000)));
        assert_eq!(
            spawn_phrase("spawn 5 bubbles per 4 secs"),
            Some(SpawnRule::linear(5, 4000))
        );
        assert_eq!(
            spawn_phrase("every 2 seconds add 7 more"),
            Some(SpawnRule::linear(7, 2000))
        );
        let fixed = spawn_phrase("fixed rate: spawn 2 every 1 s").unwrap();
        assert_eq!(fixed.mode, SpawnMode::Fixed);
        assert_eq!(spawn_phrase("add more enemies"), None);
        assert_eq!(spawn_phrase("add 3 every 0 seconds"), None);
    }

    #[test]
    fn skin_nouns_and_reskin_requests() {
        let t = TemplateId::BubbleClicker;
        assert_eq!(skin_phrase("make it chickens", &t), Some(Skin::Chicken));
        assert_eq!(skin_phrase("Asteroids please", &t), Some(Skin::Asteroid));
        assert_eq!(skin_phrase("turn them into dragons", &t), Some(Skin::Bubble));
        assert_eq!(skin_phrase("make it faster", &t), None);
        assert_eq!(skin_phrase("skin: dragon", &t), Some(Skin::Bubble));
    }

    #[test]
    fn limit_phrases() {
        assert_eq!(limit_phrase("game over at 50 bubbles"), Some(50));
        assert_eq!(limit_phrase("limit 25"), Some(25));
        assert_eq!(limit_phrase("max of 80 on screen"), Some(80));
        assert_eq!(limit_phrase("limit 0"), None);
        assert_eq!(limit_phrase("no limits"), None);
    }

    #[test]
    fn family_detection() {
        assert!(is_timed_spawn_prompt("pop the balloons"));
        assert!(is_timed_spawn_prompt("spawn 3 every 2 seconds"));
        assert!(!is_timed_spawn_prompt("a popular platformer"));
        assert!(mentions_bubbles("prick them all"));
        assert!(!mentions_bubbles("asteroids"));
    }

    #[test]
    fn fallback_seeds_missing_sections_only() {
        let spec = default_spec("bubbles");
        let patch = fallback_patch(&spec, "a bubble game, game over at 60");
        let next = apply(&spec, patch.ops());
        assert_eq!(next["meta"]["template"], "bubble_clicker");
        assert_eq!(next["meta"]["title"], "bubbles");
        assert_eq!(next["rules"]["spawn"], SpawnRule::DEFAULT.to_value());
        assert_eq!(next["rules"]["limit"]["max_concurrent"], 60);
        assert_eq!(next["hud"]["pause_hotkey"], "P");
        assert_eq!(next["rules"]["difficulty"], "normal");
    }

    #[test]
    fn fallback_never_overwrites_mechanics() {
        let mut spec = default_spec("x");
        spec["rules"]["spawn"] = SpawnRule::linear(9, 900).to_value();
        let patch = fallback_patch(&spec, "balloons!");
        assert!(!patch.touches(&path(&["rules", "spawn"])));

        spec["meta"]["template"] = json!("bubble_clicker");
        assert!(fallback_patch(&spec, "more balloons").is_empty());
    }

    #[test]
    fn fallback_titles_untitled_specs_by_skin() {
        let patch = fallback_patch(&json!({}), "slimes everywhere");
        let next = apply(&json!({}), patch.ops());
        assert_eq!(next["meta"]["title"], "Slime Rush");
    }

    #[test]
    fn fallback_ignores_unrelated_prompts() {
        assert!(fallback_patch(&default_spec("x"), "make the player faster").is_empty());
    }

    #[test]
    fn overrides_touch_only_skin_and_spawn() {
        let ops = override_ops("chickens, add 3 every 2 seconds, limit 10", &TemplateId::Sandbox);
        let paths: Vec<String> = ops.iter().map(|op| op.path().to_string()).collect();
        assert_eq!(paths, vec!["/meta/skin", "/rules/spawn"]);
    }
}
