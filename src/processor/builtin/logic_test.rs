use super::*;
use crate::processor::contract::InputValue;
use std::collections::BTreeMap;
use std::sync::Arc;

fn run<P: Processor>(processor: P, slots: Vec<(&str, InputValue)>) -> ApiResult<DataContainer> {
    let mut ctx = RequestContext::new("1", "get");
    run_in(processor, slots, &mut ctx)
}

fn run_in<P: Processor>(
    processor: P,
    slots: Vec<(&str, InputValue)>,
    ctx: &mut RequestContext,
) -> ApiResult<DataContainer> {
    let slots: BTreeMap<String, InputValue> = slots.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    let input = ProcessorInput::new("5", Arc::new(processor.contract()), slots);
    processor.process(&input, ctx)
}

fn lit(value: Value) -> InputValue {
    InputValue::Literal(value)
}

fn seq(values: Vec<Value>) -> InputValue {
    InputValue::Sequence(values.into_iter().map(InputValue::Literal).collect())
}

#[test]
fn add_keeps_integers_integral() {
    let three = InputValue::Container(DataContainer::new(json!(3), DataType::Integer));
    let four = InputValue::Container(DataContainer::new(json!(4), DataType::Integer));
    let sum = run(Add, vec![("a", three), ("b", four)]).unwrap();
    assert_eq!(sum, DataContainer::new(json!(7), DataType::Integer));

    let mixed = run(Add, vec![("a", lit(json!(1.5))), ("b", lit(json!("2")))]).unwrap();
    assert_eq!(mixed, DataContainer::new(json!(3.5), DataType::Float));
}

#[test]
fn add_rejects_text_operands() {
    let err = run(Add, vec![("a", lit(json!("x"))), ("b", lit(json!(1)))]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid type (text), only 'integer', 'float' allowed in input 'a'."
    );
}

#[test]
fn merge_lists() {
    let sources = || seq(vec![json!([1, 2, 3]), json!([3, 4])]);

    let union = run(Merge, vec![("sources", sources())]).unwrap();
    assert_eq!(union.data(), &json!([1, 2, 3, 3, 4]));

    let unique = run(Merge, vec![("sources", sources()), ("unique", lit(json!(true)))]).unwrap();
    assert_eq!(unique.data(), &json!([1, 2, 3, 4]));

    let intersect = run(Merge, vec![("sources", sources()), ("merge_type", lit(json!("intersect")))]).unwrap();
    assert_eq!(intersect.data(), &json!([3]));

    let difference = run(Merge, vec![("sources", sources()), ("merge_type", lit(json!("difference")))]).unwrap();
    assert_eq!(difference.data(), &json!([1, 2, 4]));
}

#[test]
fn merge_objects_and_scalars() {
    let objects = run(
        Merge,
        vec![("sources", seq(vec![json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4})]))],
    )
    .unwrap();
    assert_eq!(objects.data(), &json!({"a": 1, "b": 3, "c": 4}));

    let scalars = run(Merge, vec![("sources", seq(vec![json!("x"), json!(["y"])]))]).unwrap();
    assert_eq!(scalars.data(), &json!(["x", "y"]));

    let err = run(Merge, vec![("sources", seq(vec![json!([1]), json!([2])])), ("merge_type", lit(json!("xor")))])
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid merge_type: xor");
}

#[test]
fn filter_by_key_and_value() {
    let source = || {
        InputValue::Container(DataContainer::new(
            json!({"keep": 1, "drop": 2, "nested": {"drop": 3, "other": "drop"}}),
            DataType::Array,
        ))
    };

    let by_key = run(Filter, vec![("source", source()), ("filter", lit(json!("drop")))]).unwrap();
    assert_eq!(by_key.data(), &json!({"keep": 1, "nested": {"drop": 3, "other": "drop"}}));

    let recursive = run(
        Filter,
        vec![("source", source()), ("filter", lit(json!("drop"))), ("recursive", lit(json!(true)))],
    )
    .unwrap();
    assert_eq!(recursive.data(), &json!({"keep": 1, "nested": {"other": "drop"}}));

    let by_value = run(
        Filter,
        vec![
            ("source", source()),
            ("filter", lit(json!("drop"))),
            ("key_or_value", lit(json!("value"))),
            ("recursive", lit(json!(true))),
        ],
    )
    .unwrap();
    assert_eq!(by_value.data(), &json!({"keep": 1, "drop": 2, "nested": {"drop": 3}}));

    let inverse = run(
        Filter,
        vec![("source", source()), ("filter", seq(vec![json!("keep")])), ("inverse", lit(json!(true)))],
    )
    .unwrap();
    assert_eq!(inverse.data(), &json!({"keep": 1}));
}

#[test]
fn filter_with_regex() {
    let source = InputValue::Container(DataContainer::new(
        json!(["apple", "Avocado", "banana"]),
        DataType::Array,
    ));
    let filtered = run(
        Filter,
        vec![
            ("source", source),
            ("filter", lit(json!("/^a/i"))),
            ("regex", lit(json!(true))),
            ("key_or_value", lit(json!("value"))),
        ],
    )
    .unwrap();
    assert_eq!(filtered.data(), &json!(["banana"]));

    let err = run(
        Filter,
        vec![
            ("source", lit(json!(["a"]))),
            ("filter", seq(vec![json!("a"), json!("b")])),
            ("regex", lit(json!(true))),
        ],
    )
    .unwrap_err();
    assert_eq!(err.status(), 417);
}

#[test]
fn fragment_reads_context() {
    let mut ctx = RequestContext::new("1", "get");
    ctx.insert_fragment("greeting".to_string(), DataContainer::text("hi"));

    let value = run_in(Fragment, vec![("name", lit(json!("greeting")))], &mut ctx).unwrap();
    assert_eq!(value, DataContainer::text("hi"));

    let err = run_in(Fragment, vec![("name", lit(json!("nope")))], &mut ctx).unwrap_err();
    assert_eq!(err.code(), 6);
    assert_eq!(err.node_id(), Some("5"));
}

#[test]
fn convert_to_json_encodes_structures() {
    let object = run(ConvertToJson, vec![("source", lit(json!({"a": [1, 2]})))]).unwrap();
    assert_eq!(object, DataContainer::new(json!("{\"a\":[1,2]}"), DataType::Json));

    let already = run(ConvertToJson, vec![("source", lit(json!("[1]")))]).unwrap();
    assert_eq!(already.data(), &json!("[1]"));

    let text = run(ConvertToJson, vec![("source", lit(json!("plain")))]).unwrap();
    assert_eq!(text.data(), &json!("\"plain\""));
}
