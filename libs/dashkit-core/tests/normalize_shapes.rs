use dashkit_core::{normalize, normalize_value, ListResult, NormalizeError, ResponseShape};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Item {
    id: u32,
    name: String,
}

fn fixture_items() -> serde_json::Value {
    json!([
        {"id": 3, "name": "Chalk"},
        {"id": 1, "name": "Crayons"},
        {"id": 2, "name": "Glue"}
    ])
}

#[test]
fn all_three_shapes_normalize_to_the_same_result() {
    let bare = fixture_items();
    let envelope = json!({"items": fixture_items(), "total": 3});
    let nested = json!({"data": {"items": fixture_items(), "total": 3}});

    let a: ListResult<Item> = normalize(bare).unwrap();
    let b: ListResult<Item> = normalize(envelope).unwrap();
    let c: ListResult<Item> = normalize(nested).unwrap();

    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a.total, 3);
    let ids: Vec<u32> = a.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![3, 1, 2], "order must be preserved");
}

#[test]
fn shape_is_reported() {
    let (shape, _) = normalize_value(json!([])).unwrap();
    assert_eq!(shape, ResponseShape::Bare);
    let (shape, _) = normalize_value(json!({"items": []})).unwrap();
    assert_eq!(shape, ResponseShape::Envelope);
    let (shape, _) = normalize_value(json!({"data": {"items": []}})).unwrap();
    assert_eq!(shape, ResponseShape::Nested);
}

#[test]
fn envelope_total_wins_over_item_count() {
    let r: ListResult<Item> =
        normalize(json!({"items": [{"id": 1, "name": "Chalk"}], "total": 57})).unwrap();
    assert_eq!(r.len(), 1);
    assert_eq!(r.total, 57);
}

#[test]
fn missing_or_null_total_falls_back_to_length() {
    let r: ListResult<Item> = normalize(json!({"items": fixture_items()})).unwrap();
    assert_eq!(r.total, 3);
    let r: ListResult<Item> =
        normalize(json!({"data": {"items": fixture_items(), "total": null}})).unwrap();
    assert_eq!(r.total, 3);
}

#[test]
fn whole_float_and_numeric_string_totals_are_accepted() {
    let r: ListResult<Item> = normalize(json!({"items": fixture_items(), "total": 25.0})).unwrap();
    assert_eq!(r.total, 25);
    let r: ListResult<Item> =
        normalize(json!({"data": {"items": fixture_items(), "total": " 25 "}})).unwrap();
    assert_eq!(r.total, 25);
}

#[test]
fn top_level_items_take_precedence_over_data() {
    let r: ListResult<Item> = normalize(json!({
        "items": [{"id": 9, "name": "Top"}],
        "data": {"items": fixture_items(), "total": 3}
    }))
    .unwrap();
    assert_eq!(r.items, vec![Item { id: 9, name: "Top".into() }]);
    assert_eq!(r.total, 1);
}

#[test]
fn unknown_shapes_are_malformed() {
    for payload in [
        json!(null),
        json!("oops"),
        json!(42),
        json!({"rows": []}),
        json!({"items": "not-a-list"}),
        json!({"data": {"rows": []}}),
        json!({"data": [1, 2]}),
        json!({"items": [], "total": -1}),
        json!({"items": [], "total": 2.5}),
        json!({"items": [], "total": "many"}),
        json!({"items": [], "total": true}),
    ] {
        let err = normalize::<serde_json::Value>(payload.clone()).unwrap_err();
        assert!(
            matches!(err, NormalizeError::UnrecognizedShape { .. }),
            "payload {payload} should be rejected, got {err:?}"
        );
    }
}

#[test]
fn undecodable_item_reports_its_index() {
    let err = normalize::<Item>(json!([
        {"id": 1, "name": "ok"},
        {"id": "two", "name": "bad"}
    ]))
    .unwrap_err();
    match err {
        NormalizeError::InvalidItem { index, .. } => assert_eq!(index, 1),
        other => panic!("expected InvalidItem, got {other:?}"),
    }
}
