use super::*;
use serde_json::json;

fn uri_contract() -> Arc<ProcessorContract> {
    Arc::new(
        ProcessorContract::new("Var (URI)", "var_uri", "A value from the request URI.", "Request")
            .input(
                "index",
                InputSpec::new("Index of the URI argument.")
                    .required()
                    .limit_types([InputType::Integer]),
            )
            .input(
                "nullable",
                InputSpec::new("Allow a missing argument.")
                    .limit_types([InputType::Boolean])
                    .default_value(true),
            ),
    )
}

fn input(slots: Vec<(&str, InputValue)>) -> ProcessorInput {
    ProcessorInput::new(
        "uri node",
        uri_contract(),
        slots.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    )
}

#[test]
fn absent_slot_yields_contract_default() {
    let input = input(vec![]);
    assert_eq!(input.value("nullable").unwrap(), json!(true));
    assert!(input.boolean("nullable").unwrap());
}

#[test]
fn runtime_type_mismatch_names_slot_and_types() {
    let input = input(vec![("index", InputValue::Literal(json!("1.6")))]);
    let err = input.val("index").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid type (float), only 'integer' allowed in input 'index'."
    );
    assert_eq!(err.node_id(), Some("uri node"));
    assert_eq!(err.status(), 400);
}

#[test]
fn literals_are_coerced_like_at_authoring_time() {
    let input = input(vec![
        ("index", InputValue::Literal(json!(5.0))),
        ("nullable", InputValue::Literal(json!("yes"))),
    ]);
    assert_eq!(input.integer("index").unwrap(), 5);
    assert!(input.boolean("nullable").unwrap());

    let input = input_with_nullable(json!(1));
    assert!(input.boolean("nullable").unwrap());

    let input = input_with_nullable(json!("maybe"));
    assert!(input.val("nullable").is_err());
}

fn input_with_nullable(value: Value) -> ProcessorInput {
    input(vec![("nullable", InputValue::Literal(value))])
}

#[test]
fn evaluated_containers_keep_their_tag() {
    let input = input(vec![(
        "index",
        InputValue::Container(DataContainer::new(json!(1), DataType::Integer)),
    )]);
    assert_eq!(input.integer("index").unwrap(), 1);
}

#[test]
fn literal_matching_is_loose() {
    assert!(InputType::Integer.accepts_literal(&json!("5")));
    assert!(InputType::Integer.accepts_literal(&json!(5)));
    assert!(!InputType::Integer.accepts_literal(&json!("abc")));
    assert!(InputType::Boolean.accepts_literal(&json!("true")));
    assert!(InputType::File.accepts_literal(&json!({ "any": "thing" })));
    assert!(InputType::Literal.accepts_literal(&json!(2.5)));
    assert!(!InputType::Text.accepts_literal(&json!(2)));
    assert!(InputType::Array.accepts_literal(&json!([1])));
}

#[test]
fn cardinality_serializes_unbounded_as_star() {
    let spec = InputSpec::new("sources").cardinality(2, None);
    let value = serde_json::to_value(&spec).unwrap();
    assert_eq!(value["cardinality"], json!([2, "*"]));
    assert_eq!(value["literalAllowed"], json!(true));
}

#[test]
fn inconsistent_cardinality_is_rejected() {
    let contract = ProcessorContract::new("Bad", "bad", "", "Test")
        .input("x", InputSpec::new("x").cardinality(3, Some(1)));
    assert!(contract.check().is_err());
}

#[test]
fn sequences_list_elements_individually() {
    let input = input(vec![(
        "index",
        InputValue::Sequence(vec![
            InputValue::Literal(json!(1)),
            InputValue::Container(DataContainer::text("two")),
        ]),
    )]);
    let items = input.list("index").unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].data(), &json!("two"));
}
