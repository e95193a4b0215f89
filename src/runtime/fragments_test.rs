use super::*;
use crate::core::{ApiError, DataContainer, DataType};
use crate::processor::builtin::logic::Fragment;
use crate::processor::contract::{InputSpec, Processor, ProcessorContract, ProcessorInput};
use crate::processor::registry::{Namespace, ProcessorRegistry};
use crate::resource::types::MetaNode;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// `var_text` stand-in that counts its evaluations
struct CountingText {
    calls: Arc<AtomicUsize>,
}

impl Processor for CountingText {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Var (text)", "var_text", "Counting text variable", "Test")
            .input("value", InputSpec::new("The value").required())
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DataContainer::text(input.text("value")?))
    }
}

fn evaluator(calls: &Arc<AtomicUsize>) -> GraphEvaluator {
    let mut registry = ProcessorRegistry::new();
    let calls = Arc::clone(calls);
    registry
        .register(Namespace::Processor, move || {
            Box::new(CountingText {
                calls: Arc::clone(&calls),
            }) as Box<dyn Processor>
        })
        .unwrap();
    registry.register_default::<Fragment>(Namespace::Processor).unwrap();
    GraphEvaluator::new(Arc::new(registry))
}

fn greeting() -> BTreeMap<String, SlotValue> {
    let mut fragments = BTreeMap::new();
    fragments.insert(
        "greeting".to_string(),
        SlotValue::node(MetaNode::new("10", "var_text").with_slot("value", SlotValue::literal("hi"))),
    );
    fragments
}

fn reference(id: &str, name: &str) -> SlotValue {
    SlotValue::node(MetaNode::new(id, "fragment").with_slot("name", SlotValue::literal(name)))
}

#[test]
fn fragment_reference_yields_resolved_value() {
    let calls = Arc::new(AtomicUsize::new(0));
    let evaluator = evaluator(&calls);
    let mut ctx = RequestContext::new("1", "get");

    FragmentResolver::new(&evaluator).resolve(&greeting(), &mut ctx).unwrap();
    let result = evaluator.evaluate(&reference("1", "greeting"), &mut ctx).unwrap();

    assert_eq!(result, DataContainer::text("hi"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn fragments_are_evaluated_at_most_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let evaluator = evaluator(&calls);
    let mut ctx = RequestContext::new("1", "get");
    let resolver = FragmentResolver::new(&evaluator);

    resolver.resolve(&greeting(), &mut ctx).unwrap();
    // second pass for the same request does nothing
    resolver.resolve(&greeting(), &mut ctx).unwrap();

    let tree = SlotValue::Sequence(vec![reference("1", "greeting"), reference("2", "greeting")]);
    let result = evaluator.evaluate(&tree, &mut ctx).unwrap();

    assert_eq!(result.data(), &json!(["hi", "hi"]));
    assert_eq!(result.data_type(), DataType::Array);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn later_fragments_see_earlier_ones() {
    let calls = Arc::new(AtomicUsize::new(0));
    let evaluator = evaluator(&calls);
    let mut ctx = RequestContext::new("1", "get");

    let mut fragments = greeting();
    fragments.insert("salute".to_string(), reference("20", "greeting"));
    FragmentResolver::new(&evaluator).resolve(&fragments, &mut ctx).unwrap();

    assert_eq!(ctx.fragment("salute"), Some(&DataContainer::text("hi")));
    assert!(ctx.fragments_resolved());
}

#[test]
fn literal_fragments_are_wrapped() {
    let calls = Arc::new(AtomicUsize::new(0));
    let evaluator = evaluator(&calls);
    let mut ctx = RequestContext::new("1", "get");

    let mut fragments = BTreeMap::new();
    fragments.insert("limit".to_string(), SlotValue::literal(25));
    FragmentResolver::new(&evaluator).resolve(&fragments, &mut ctx).unwrap();

    let value = ctx.fragment("limit").unwrap();
    assert_eq!(value.data_type(), DataType::Integer);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_fragment_name_fails() {
    let calls = Arc::new(AtomicUsize::new(0));
    let evaluator = evaluator(&calls);
    let mut ctx = RequestContext::new("1", "get");
    FragmentResolver::new(&evaluator).resolve(&greeting(), &mut ctx).unwrap();

    let err = evaluator.evaluate(&reference("3", "missing"), &mut ctx).unwrap_err();
    assert_eq!(
        err,
        ApiError::FragmentResolution {
            name: "missing".to_string(),
            id: "3".to_string(),
        }
    );
    assert_eq!(err.to_string(), "invalid fragment name: missing");
}
