use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn parses_nodes_literals_and_sequences() {
    let value = json!({
        "id": 1,
        "processor": "merge",
        "sources": [
            { "id": "a", "processor": "var_int", "value": 3 },
            "literal",
            [1, 2]
        ],
        "mergeType": "union"
    });

    let slot = SlotValue::try_from(value).unwrap();
    let node = slot.as_node().unwrap();
    assert_eq!(node.id, "1");
    assert_eq!(node.processor, "merge");
    assert_eq!(node.slot("mergeType"), Some(&SlotValue::literal("union")));

    match node.slot("sources").unwrap() {
        SlotValue::Sequence(items) => {
            assert_eq!(items.len(), 3);
            assert_eq!(items[0].as_node().unwrap().id, "a");
            assert_eq!(items[1], SlotValue::literal("literal"));
            assert!(matches!(items[2], SlotValue::Sequence(_)));
        }
        other => panic!("expected sequence, got {:?}", other),
    }

    let children: Vec<&str> = node.child_nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(children, vec!["a"]);
}

#[test]
fn mapping_without_processor_is_literal() {
    let slot = SlotValue::try_from(json!({ "key": "value" })).unwrap();
    assert_eq!(slot, SlotValue::literal(json!({ "key": "value" })));
}

#[test]
fn processor_without_id_is_malformed() {
    let err = SlotValue::try_from(json!({ "processor": "var_int", "value": 1 })).unwrap_err();
    assert!(matches!(err, ApiError::MalformedDefinition { .. }));
}

#[test]
fn slot_value_round_trips_through_json() {
    let raw = json!({
        "id": "1",
        "processor": "add",
        "a": { "id": "2", "processor": "var_int", "value": 3 },
        "b": [4, { "id": "3", "processor": "var_int", "value": 5 }]
    });
    let slot: SlotValue = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(serde_json::to_value(&slot).unwrap(), raw);
}

#[test]
fn all_nodes_walks_pre_order() {
    let slot = SlotValue::try_from(json!({
        "id": "root",
        "processor": "add",
        "a": { "id": "left", "processor": "var_int", "value": { "id": "deep", "processor": "var_int", "value": 1 } },
        "b": { "id": "right", "processor": "var_int", "value": 2 }
    }))
    .unwrap();

    let ids: Vec<&str> = slot.all_nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["root", "left", "deep", "right"]);
}

#[test]
fn parses_yaml_document() {
    let yaml = r#"
name: Greeting
description: Say hi
uri: /Hello/World/
method: GET
appid: 2
ttl: 30
fragments:
  greeting:
    id: 10
    processor: var_text
    value: hi
process:
  id: 1
  processor: fragment
  name: greeting
"#;
    let document = ResourceDocument::parse(yaml).unwrap();
    assert_eq!(document.uri, "hello/world");
    assert_eq!(document.method, "get");
    assert_eq!(document.appid, "2");
    assert_eq!(document.ttl, 30);
    assert!(document.meta.fragments.contains_key("greeting"));
    assert_eq!(document.meta.process.as_node().unwrap().processor, "fragment");
}

#[test]
fn document_requires_keys_and_positive_ttl() {
    let missing = json!({ "name": "x", "process": 1 });
    let err = ResourceDocument::from_value(&missing).unwrap_err();
    assert_eq!(err.to_string(), "missing description in new resource");

    let negative = json!({
        "name": "x", "description": "d", "uri": "a/b", "method": "get",
        "appid": 1, "ttl": -1, "process": "ok"
    });
    let err = ResourceDocument::from_value(&negative).unwrap_err();
    assert_eq!(err.to_string(), "negative ttl in new resource");
}

#[test]
fn fragments_must_be_a_mapping() {
    let err = ResourceMeta::from_value(&json!({ "process": 1, "fragments": ["a"] })).unwrap_err();
    assert_eq!(err.to_string(), "invalid fragments structure in new resource");
}
