/// Graph evaluator for resource metadata trees
///
/// A process tree is an implicit DAG: every processor node depends on the
/// processor nodes nested in its input slots. The evaluator walks it with an
/// explicit worklist (no recursion, so deep trees cannot exhaust the stack),
/// evaluates each node exactly once after all of its children, substitutes
/// the children's results into the node's slots and invokes its processor.

use crate::core::{ApiError, ApiResult, DataContainer, DataType, RequestContext};
use crate::processor::contract::{InputValue, ProcessorInput};
use crate::processor::registry::ProcessorRegistry;
use crate::resource::types::{MetaNode, SlotValue};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Evaluation state of one node during a worklist pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    /// Discovered, children not yet inspected
    Pending,
    /// Re-queued behind its unevaluated children
    WaitingOnChildren,
    /// All children evaluated; about to be invoked
    Ready,
    Done,
}

/// Dependency-ordered evaluator over `SlotValue` trees
#[derive(Debug, Clone)]
pub struct GraphEvaluator {
    registry: Arc<ProcessorRegistry>,
}

impl GraphEvaluator {
    pub fn new(registry: Arc<ProcessorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Evaluate a tree to one final value
    ///
    /// Literals are returned unchanged (wrapped) without touching the registry.
    /// A top-level sequence evaluates to an array of its elements' values.
    pub fn evaluate(&self, root: &SlotValue, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        match root {
            SlotValue::Literal(value) => Ok(DataContainer::from_literal(value.clone())),
            SlotValue::Node(node) => self.evaluate_node(node, ctx),
            SlotValue::Sequence(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.evaluate(item, ctx)?.into_data());
                }
                Ok(DataContainer::new(Value::Array(values), DataType::Array))
            }
        }
    }

    fn evaluate_node(&self, root: &MetaNode, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let eval_start = std::time::Instant::now();
        tracing::debug!("🌳 Evaluating tree rooted at '{}' ({})", root.id, root.processor);

        let mut states: HashMap<&str, NodeState> = HashMap::new();
        let mut owners: HashMap<&str, &MetaNode> = HashMap::new();
        let mut results: HashMap<&str, DataContainer> = HashMap::new();
        let mut worklist: Vec<&MetaNode> = Vec::new();
        let mut evaluated = 0usize;

        claim(root, &mut states, &mut owners)?;
        worklist.push(root);

        while let Some(node) = worklist.pop() {
            let id = node.id.as_str();
            match states.get(id).copied() {
                Some(NodeState::Done) => continue,
                Some(NodeState::Pending) => {
                    let unevaluated: Vec<&MetaNode> = node
                        .child_nodes()
                        .into_iter()
                        .filter(|child| !results.contains_key(child.id.as_str()))
                        .collect();
                    if !unevaluated.is_empty() {
                        states.insert(id, NodeState::WaitingOnChildren);
                        worklist.push(node);
                        // Reverse so the first slot's child is popped first
                        for child in unevaluated.into_iter().rev() {
                            claim(child, &mut states, &mut owners)?;
                            worklist.push(child);
                        }
                        continue;
                    }
                }
                Some(NodeState::WaitingOnChildren) => {
                    if let Some(missing) = node
                        .child_nodes()
                        .into_iter()
                        .find(|child| !results.contains_key(child.id.as_str()))
                    {
                        return Err(ApiError::malformed(
                            format!(
                                "invalid process definition: node '{}' still waits on '{}'",
                                id, missing.id
                            ),
                            Some(id),
                        ));
                    }
                }
                Some(NodeState::Ready) | None => {
                    return Err(ApiError::malformed(
                        format!("invalid process definition: node '{}' queued out of order", id),
                        Some(id),
                    ))
                }
            }

            states.insert(id, NodeState::Ready);
            let value = self.invoke(node, &mut results, ctx)?;
            results.insert(id, value);
            states.insert(id, NodeState::Done);
            evaluated += 1;
        }

        let result = results.remove(root.id.as_str()).ok_or_else(|| {
            ApiError::malformed(
                format!("invalid process definition: no result for '{}'", root.id),
                Some(&root.id),
            )
        })?;

        tracing::debug!(
            "✅ Tree '{}' evaluated {} nodes in {:?}",
            root.id,
            evaluated,
            eval_start.elapsed()
        );
        Ok(result)
    }

    /// Substitute children's results into the node's slots and run its processor
    fn invoke<'a>(
        &self,
        node: &'a MetaNode,
        results: &mut HashMap<&'a str, DataContainer>,
        ctx: &mut RequestContext,
    ) -> ApiResult<DataContainer> {
        let resolved = self
            .registry
            .resolve(&node.processor)
            .map_err(|e| e.with_node_id(&node.id))?;

        let mut slots = BTreeMap::new();
        for (name, value) in &node.slots {
            slots.insert(name.clone(), substitute(value, results)?);
        }

        let processor = resolved.instantiate();
        let input = ProcessorInput::new(node.id.clone(), resolved.contract, slots);

        tracing::debug!("📍 Executing node '{}' (processor: {})", node.id, node.processor);
        let node_start = std::time::Instant::now();
        match processor.process(&input, ctx) {
            Ok(value) => {
                tracing::debug!(
                    "  ✅ Node '{}' -> {} in {:?}",
                    node.id,
                    value.data_type(),
                    node_start.elapsed()
                );
                Ok(value)
            }
            Err(e) => {
                tracing::warn!("  ❌ Node '{}' failed after {:?}: {}", node.id, node_start.elapsed(), e);
                Err(e)
            }
        }
    }
}

/// Register a node as discovered; a second distinct node with the same id
/// would make result substitution ambiguous.
fn claim<'a>(
    node: &'a MetaNode,
    states: &mut HashMap<&'a str, NodeState>,
    owners: &mut HashMap<&'a str, &'a MetaNode>,
) -> ApiResult<()> {
    let id = node.id.as_str();
    if let Some(owner) = owners.get(id) {
        if !std::ptr::eq(*owner, node) {
            return Err(ApiError::malformed(format!("identical ID in resource: {}", id), Some(id)));
        }
        return Ok(());
    }
    owners.insert(id, node);
    states.insert(id, NodeState::Pending);
    Ok(())
}

/// Replace nested processor nodes with their (spent) results
fn substitute(value: &SlotValue, results: &mut HashMap<&str, DataContainer>) -> ApiResult<InputValue> {
    match value {
        SlotValue::Literal(literal) => Ok(InputValue::Literal(literal.clone())),
        SlotValue::Node(child) => results
            .remove(child.id.as_str())
            .map(InputValue::Container)
            .ok_or_else(|| {
                ApiError::malformed(
                    format!("invalid process definition: result of '{}' missing", child.id),
                    Some(&child.id),
                )
            }),
        SlotValue::Sequence(items) => items
            .iter()
            .map(|item| substitute(item, results))
            .collect::<ApiResult<Vec<_>>>()
            .map(InputValue::Sequence),
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
