use super::*;
use crate::processor::contract::{InputSpec, Processor, ProcessorContract};
use crate::processor::registry::Namespace;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records the order in which nodes are invoked
#[derive(Default)]
struct Recorder {
    counter: AtomicUsize,
    order: Mutex<Vec<String>>,
}

struct RecordingProcessor {
    recorder: Arc<Recorder>,
}

impl Processor for RecordingProcessor {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Record", "record", "Records invocation order", "Test")
            .input("child", InputSpec::new("Nested node"))
            .input("items", InputSpec::new("Nested nodes").cardinality(0, None))
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let tick = self.recorder.counter.fetch_add(1, Ordering::SeqCst);
        self.recorder.order.lock().unwrap().push(input.id().to_string());
        Ok(DataContainer::new(json!(tick), DataType::Integer))
    }
}

struct Failing;

impl Processor for Failing {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Fail", "fail", "Always fails", "Test")
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        Err(ApiError::processor_with("upstream unavailable", input.id(), 1, 502))
    }
}

struct Echo;

impl Processor for Echo {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Echo", "echo", "Returns its inputs as an array", "Test")
            .input("values", InputSpec::new("Anything").cardinality(0, None))
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        input.val("values")
    }
}

fn evaluator() -> (GraphEvaluator, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let mut registry = ProcessorRegistry::new();
    let shared = Arc::clone(&recorder);
    registry
        .register(Namespace::Processor, move || {
            Box::new(RecordingProcessor {
                recorder: Arc::clone(&shared),
            }) as Box<dyn Processor>
        })
        .unwrap();
    registry
        .register(Namespace::Processor, || Box::new(Failing) as Box<dyn Processor>)
        .unwrap();
    registry
        .register(Namespace::Processor, || Box::new(Echo) as Box<dyn Processor>)
        .unwrap();
    (GraphEvaluator::new(Arc::new(registry)), recorder)
}

fn chain(depth: usize) -> SlotValue {
    let mut node = MetaNode::new(format!("n{}", depth), "record");
    for level in (0..depth).rev() {
        node = MetaNode::new(format!("n{}", level), "record").with_slot("child", SlotValue::node(node));
    }
    SlotValue::node(node)
}

fn ctx() -> RequestContext {
    RequestContext::new("1", "get")
}

#[test]
fn children_run_before_parents_at_any_depth() {
    for depth in [1usize, 3, 10] {
        let (evaluator, recorder) = evaluator();
        let result = evaluator.evaluate(&chain(depth), &mut ctx()).unwrap();

        let order = recorder.order.lock().unwrap().clone();
        let expected: Vec<String> = (0..=depth).rev().map(|i| format!("n{}", i)).collect();
        assert_eq!(order, expected, "depth {}", depth);
        // root is invoked last
        assert_eq!(result.data(), &json!(depth));
    }
}

#[test]
fn deep_trees_do_not_recurse() {
    let (evaluator, recorder) = evaluator();
    evaluator.evaluate(&chain(1_000), &mut ctx()).unwrap();
    assert_eq!(recorder.counter.load(Ordering::SeqCst), 1_001);
}

#[test]
fn every_node_is_evaluated_once_and_siblings_in_slot_order() {
    let (evaluator, recorder) = evaluator();
    let tree = SlotValue::node(
        MetaNode::new("root", "record")
            .with_slot("child", SlotValue::node(MetaNode::new("a", "record")))
            .with_slot(
                "items",
                SlotValue::Sequence(vec![
                    SlotValue::node(MetaNode::new("b", "record")),
                    SlotValue::literal(5),
                    SlotValue::node(
                        MetaNode::new("c", "record")
                            .with_slot("child", SlotValue::node(MetaNode::new("d", "record"))),
                    ),
                ]),
            ),
    );

    evaluator.evaluate(&tree, &mut ctx()).unwrap();
    let order = recorder.order.lock().unwrap().clone();
    assert_eq!(order, vec!["a", "b", "d", "c", "root"]);
}

#[test]
fn sequence_results_are_substituted_by_index() {
    let (evaluator, _) = evaluator();
    let tree = SlotValue::node(MetaNode::new("root", "echo").with_slot(
        "values",
        SlotValue::Sequence(vec![
            SlotValue::literal("first"),
            SlotValue::node(MetaNode::new("x", "record")),
            SlotValue::literal(3),
        ]),
    ));

    let result = evaluator.evaluate(&tree, &mut ctx()).unwrap();
    assert_eq!(result.data(), &json!(["first", 0, 3]));
    assert_eq!(result.data_type(), DataType::Array);
}

#[test]
fn literal_passes_through_without_registry() {
    let evaluator = GraphEvaluator::new(Arc::new(ProcessorRegistry::new()));
    let result = evaluator.evaluate(&SlotValue::literal("hello"), &mut ctx()).unwrap();
    assert_eq!(result, DataContainer::text("hello"));
}

#[test]
fn processor_failure_aborts_evaluation() {
    let (evaluator, recorder) = evaluator();
    let tree = SlotValue::node(
        MetaNode::new("root", "record")
            .with_slot("child", SlotValue::node(MetaNode::new("boom", "fail"))),
    );

    let err = evaluator.evaluate(&tree, &mut ctx()).unwrap_err();
    assert_eq!(err.status(), 502);
    assert_eq!(err.node_id(), Some("boom"));
    assert_eq!(recorder.counter.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_processor_carries_node_id() {
    let (evaluator, _) = evaluator();
    let tree = SlotValue::node(MetaNode::new("7", "does_not_exist"));
    let err = evaluator.evaluate(&tree, &mut ctx()).unwrap_err();
    assert!(matches!(err, ApiError::UnknownProcessor { .. }));
    assert_eq!(err.node_id(), Some("7"));
}

#[test]
fn shared_ids_are_rejected() {
    let (evaluator, _) = evaluator();
    let tree = SlotValue::node(
        MetaNode::new("root", "record")
            .with_slot("child", SlotValue::node(MetaNode::new("dup", "record")))
            .with_slot(
                "items",
                SlotValue::Sequence(vec![SlotValue::node(MetaNode::new("dup", "record"))]),
            ),
    );
    let err = evaluator.evaluate(&tree, &mut ctx()).unwrap_err();
    assert_eq!(err.to_string(), "identical ID in resource: dup");
}
