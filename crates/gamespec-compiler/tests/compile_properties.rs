//! Compiler guarantees: determinism, default safety and spawn schedule
//! correctness.

use gamespec_compiler::{
    compile, RunState, SpawnSchedule, SurvivalParams, SurvivalRun, TemplateRegistry, CATCH_UP_CAP,
};
use gamespec_model::{Skin, SpawnRule};
use proptest::prelude::*;
use serde_json::{json, Value};

fn arbitrary_spec() -> impl Strategy<Value = Value> {
    let template = prop_oneof![
        Just(json!("sandbox")),
        Just(json!("bubble_clicker")),
        Just(json!("unknown")),
        Just(Value::Null),
        Just(json!(7)),
    ];
    let number = prop_oneof![
        any::<i32>().prop_map(Value::from),
        (-1e6f64..1e6).prop_map(Value::from),
        "[a-z0-9]{0,4}".prop_map(Value::from),
        Just(Value::Null),
    ];
    (
        template,
        "\\PC{0,24}",
        number.clone(),
        number.clone(),
        number,
        prop_oneof![Just("doubling"), Just("linear"), Just("fixed"), Just("?")],
        prop::sample::select(Skin::ALL.to_vec()),
    )
        .prop_map(|(template, title, w, interval, limit, mode, skin)| {
            json!({
                "meta": {"title": title, "template": template, "skin": skin.as_str()},
                "scene": {"size": {"w": w, "h": 400}},
                "rules": {
                    "spawn": {"mode": mode, "interval_ms": interval, "add_per_interval": 2},
                    "limit": {"max_concurrent": limit}
                }
            })
        })
}

proptest! {
    #[test]
    fn prop_compile_is_deterministic(spec in arbitrary_spec()) {
        let copy: Value = serde_json::from_str(&spec.to_string()).unwrap();
        let a = compile(&spec);
        let b = compile(&copy);
        prop_assert!(a.starts_with("<!DOCTYPE html>"));
        prop_assert_eq!(a, b);
    }
}

#[test]
fn empty_spec_renders_scaffold_for_every_template() {
    let registry = TemplateRegistry::with_defaults();
    for name in registry.names() {
        let spec = json!({"meta": {"template": name}});
        let html = compile(&spec);
        assert!(html.starts_with("<!DOCTYPE html>"), "{name}");
        assert!(html.contains("<h1 id=\"title\">"), "{name}: title region");
        assert!(html.contains("id=\"game\""), "{name}: playable surface");
        assert!(html.trim_end().ends_with("</html>"), "{name}");
        assert!(!html.contains("{{"), "{name}: unfilled slot");
    }

    let bare = compile(&json!({}));
    assert!(bare.contains("id=\"game\""));
}

#[test]
fn non_object_specs_still_compile() {
    for spec in [Value::Null, json!([]), json!("text"), json!(3)] {
        assert!(compile(&spec).contains("<title>Your Game</title>"));
    }
}

#[test]
fn doubling_spawns_follow_cumulative_formula() {
    let spec = json!({
        "meta": {"template": "bubble_clicker"},
        "rules": {
            "spawn": SpawnRule::doubling(2000).to_value(),
            "limit": {"max_concurrent": 10000, "end_on_limit": true}
        }
    });
    let params = SurvivalParams::from_spec(&spec);
    let mut run = SurvivalRun::new(&params, 2024);
    run.start();

    // Windows 0..=4 need at most 16 spawns each, below the per-frame cap.
    for _ in 0..(10_000 / 16) {
        run.advance(16.0);
        let t = run.elapsed_ms();
        let last = (t / 2000.0).floor() as u32;
        let expected: u64 = (0..=last).map(|k| 1u64 << k).sum();
        assert_eq!(run.total_spawned(), expected, "t = {t}");
    }
    assert_eq!(run.state(), RunState::Running);
}

#[test]
fn large_windows_catch_up_within_cap() {
    let schedule = SpawnSchedule::new(&SpawnRule::linear(130, 5000));
    let params = SurvivalParams::from_spec(&json!({
        "rules": {
            "spawn": {"mode": "linear", "add_per_interval": 130, "interval_ms": 5000},
            "limit": {"max_concurrent": 10000}
        }
    }));
    let mut run = SurvivalRun::new(&params, 1);
    run.start();

    run.advance(16.0);
    assert_eq!(run.total_spawned(), CATCH_UP_CAP);
    run.advance(16.0);
    assert_eq!(run.total_spawned(), 2 * CATCH_UP_CAP);
    run.advance(16.0);
    assert_eq!(run.total_spawned(), 130);
    run.advance(16.0);
    assert_eq!(run.total_spawned(), schedule.cumulative_target(run.elapsed_ms()));
}
