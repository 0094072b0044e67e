//! Property tests for the patch engine.
//!
//! Guarantees exercised here:
//! - Applying a patch never changes the input document.
//! - Re-applying an add/replace patch is a no-op on its own output when
//!   every replace targets an existing parent.
//! - Application is total: arbitrary paths and operations never panic.
//! - A skin-only patch leaves spawn and limit rules untouched.

use gamespec_model::{
    apply, apply_with_report, default_spec, LimitRule, PatchOp, PatchPath, SpawnRule,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("meta".to_string()),
        Just("rules".to_string()),
        Just("spawn".to_string()),
        Just("scene".to_string()),
        "[a-z]{1,6}",
    ]
}

fn object_path() -> impl Strategy<Value = PatchPath> {
    proptest::collection::vec(key(), 1..4).prop_map(PatchPath::new)
}

fn any_path() -> impl Strategy<Value = PatchPath> {
    proptest::collection::vec(
        prop_oneof![key(), "[0-9]{1,2}", Just("-".to_string()), Just(String::new())],
        0..5,
    )
    .prop_map(PatchPath::new)
}

fn leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::from),
        Just(json!([1, 2, 3])),
        Just(json!({"nested": true})),
    ]
}

/// Mappings present in `seeded_spec`
fn seeded_parent() -> impl Strategy<Value = Vec<String>> {
    prop_oneof![
        Just(vec!["meta"]),
        Just(vec!["scene"]),
        Just(vec!["player"]),
        Just(vec!["rules"]),
        Just(vec!["rules", "spawn"]),
        Just(vec!["rules", "limit"]),
        Just(vec!["aesthetics"]),
    ]
    .prop_map(|segments| segments.into_iter().map(str::to_string).collect())
}

/// Adds anywhere; replaces only under parents the seeded spec already has,
/// so the first pass never skips a replace that a later add would unblock
fn set_op() -> impl Strategy<Value = PatchOp> {
    prop_oneof![
        (object_path(), leaf_value()).prop_map(|(path, value)| PatchOp::add(path, value)),
        (seeded_parent(), key(), leaf_value()).prop_map(|(mut segments, leaf, value)| {
            segments.push(leaf);
            PatchOp::replace(PatchPath::new(segments), value)
        }),
    ]
}

fn any_op() -> impl Strategy<Value = PatchOp> {
    (any_path(), leaf_value(), 0..3u8).prop_map(|(path, value, kind)| match kind {
        0 => PatchOp::add(path, value),
        1 => PatchOp::replace(path, value),
        _ => PatchOp::remove(path),
    })
}

fn seeded_spec() -> Value {
    let mut spec = default_spec("survive the swarm");
    spec["rules"]["spawn"] = SpawnRule::linear(4, 1500).to_value();
    spec["rules"]["limit"] = LimitRule {
        max_concurrent: 40,
        end_on_limit: true,
    }
    .to_value();
    spec["entities"] = json!([{"kind": "wall"}, {"kind": "coin"}]);
    spec
}

proptest! {
    #[test]
    fn prop_apply_never_mutates_input(ops in proptest::collection::vec(any_op(), 0..12)) {
        let spec = seeded_spec();
        let snapshot = spec.clone();
        let _ = apply(&spec, &ops);
        prop_assert_eq!(spec, snapshot);
    }

    #[test]
    fn prop_set_ops_are_idempotent(ops in proptest::collection::vec(set_op(), 0..10)) {
        let spec = seeded_spec();
        let once = apply(&spec, &ops);
        let twice = apply(&once, &ops);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_apply_is_total(ops in proptest::collection::vec(any_op(), 0..16)) {
        let (_, report) = apply_with_report(&seeded_spec(), &ops);
        prop_assert_eq!(report.applied + report.skipped.len(), ops.len());
    }

    #[test]
    fn prop_skin_patch_keeps_mechanics(skin in "[a-z]{1,10}") {
        let spec = seeded_spec();
        let next = apply(&spec, &[PatchOp::add("/meta/skin".parse().unwrap(), skin)]);
        prop_assert_eq!(&next["rules"]["spawn"], &spec["rules"]["spawn"]);
        prop_assert_eq!(&next["rules"]["limit"], &spec["rules"]["limit"]);
    }
}

#[test]
fn replace_unblocked_by_later_add_lands_on_second_pass() {
    let spec = seeded_spec();
    let ops = [
        PatchOp::replace("/meta/scene/meta".parse().unwrap(), false),
        PatchOp::add("/meta/scene/rules".parse().unwrap(), false),
    ];

    let (once, report) = apply_with_report(&spec, &ops);
    assert_eq!(report.applied, 1);
    assert_eq!(once["meta"]["scene"], json!({"rules": false}));

    let (twice, report) = apply_with_report(&once, &ops);
    assert!(report.is_complete());
    assert_eq!(twice["meta"]["scene"], json!({"rules": false, "meta": false}));
}

#[test]
fn remove_of_removed_is_noop() {
    let spec = seeded_spec();
    let ops = [PatchOp::remove("/rules/limit".parse().unwrap())];
    let once = apply(&spec, &ops);
    let twice = apply(&once, &ops);
    assert_eq!(once, twice);
    assert!(once["rules"].get("limit").is_none());
}

#[test]
fn operations_apply_in_order() {
    let spec = json!({});
    let ops = [
        PatchOp::add("/meta/title".parse().unwrap(), "first"),
        PatchOp::replace("/meta/title".parse().unwrap(), "second"),
        PatchOp::remove("/meta/title".parse().unwrap()),
        PatchOp::add("/meta/title".parse().unwrap(), "third"),
    ];
    assert_eq!(apply(&spec, &ops), json!({"meta": {"title": "third"}}));
}
