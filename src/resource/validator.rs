/// Resource validator
///
/// Statically checks a candidate resource against the contracts of the
/// processors it references, without executing anything. Runs at
/// authoring time (create/import) and fails on the first violation.

use crate::core::{ApiError, ApiResult};
use crate::processor::contract::InputSpec;
use crate::processor::registry::ProcessorRegistry;
use crate::resource::types::{MetaNode, ResourceMeta, SlotValue};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ResourceValidator {
    registry: Arc<ProcessorRegistry>,
}

impl ResourceValidator {
    pub fn new(registry: Arc<ProcessorRegistry>) -> Self {
        Self { registry }
    }

    /// Parse and validate a raw resource mapping
    pub fn validate_value(&self, value: &Value) -> ApiResult<ResourceMeta> {
        let meta = ResourceMeta::from_value(value)?;
        self.validate(&meta)?;
        Ok(meta)
    }

    /// Validate every section of a parsed resource
    pub fn validate(&self, meta: &ResourceMeta) -> ApiResult<()> {
        tracing::info!("🔍 Validating the new resource...");
        check_identical_ids(meta)?;
        for section in meta.sections() {
            self.validate_section(section)?;
        }
        tracing::info!("✅ Resource is valid");
        Ok(())
    }

    /// Depth-first contract check of one section
    fn validate_section(&self, section: &SlotValue) -> ApiResult<()> {
        let mut stack: Vec<&SlotValue> = vec![section];

        while let Some(value) = stack.pop() {
            match value {
                SlotValue::Literal(_) => {}
                SlotValue::Sequence(items) => stack.extend(items.iter().rev()),
                SlotValue::Node(node) => {
                    tracing::debug!("Validating: {}", node.id);
                    let pending = self.validate_node(node)?;
                    // Reverse so the first slot's nodes are checked first
                    stack.extend(pending.into_iter().rev());
                }
            }
        }
        Ok(())
    }

    /// Check one node's slots against its contract; returns nested nodes
    /// still to be validated.
    fn validate_node<'a>(&self, node: &'a MetaNode) -> ApiResult<Vec<&'a SlotValue>> {
        let contract = self
            .registry
            .contract(&node.processor)
            .map_err(|e| e.with_node_id(&node.id))?;
        let mut pending = Vec::new();

        for (key, spec) in &contract.input {
            let supplied = node.slot(key).filter(|value| !is_absent(value));
            let count = match supplied {
                None => 0,
                Some(SlotValue::Node(child)) => {
                    check_processor_limit(child, spec, &node.id)?;
                    pending.extend(supplied);
                    1
                }
                Some(SlotValue::Sequence(items)) => {
                    for item in items {
                        match item {
                            SlotValue::Node(child) => {
                                check_processor_limit(child, spec, &node.id)?;
                                pending.push(item);
                            }
                            SlotValue::Literal(literal) => check_literal_type(literal, key, spec, &node.id)?,
                            // nested sequences are data, not slot values
                            SlotValue::Sequence(_) => {}
                        }
                    }
                    items.len()
                }
                Some(SlotValue::Literal(literal)) => {
                    if !spec.literal_allowed {
                        return Err(ApiError::contract(
                            format!("literals not allowed as input for '{}' in function: {}", key, node.id),
                            &node.id,
                        ));
                    }
                    if !spec.limit_values.is_empty() && !spec.limit_values.contains(literal) {
                        return Err(ApiError::contract(
                            format!("invalid value type for '{}' in function: {}", key, node.id),
                            &node.id,
                        ));
                    }
                    check_literal_type(literal, key, spec, &node.id)?;
                    1
                }
            };

            if count < spec.cardinality.min {
                return Err(ApiError::contract(
                    format!(
                        "input '{}' in function '{}' requires min {}",
                        key, node.id, spec.cardinality.min
                    ),
                    &node.id,
                ));
            }
            if let Some(max) = spec.cardinality.max {
                if count > max {
                    return Err(ApiError::contract(
                        format!("input '{}' in function '{}' requires max {}", key, node.id, max),
                        &node.id,
                    ));
                }
            }
        }

        Ok(pending)
    }
}

/// Walk every section and reject ids used by more than one node
fn check_identical_ids(meta: &ResourceMeta) -> ApiResult<()> {
    let mut seen = HashSet::new();
    for section in meta.sections() {
        for node in section.all_nodes() {
            if !seen.insert(node.id.as_str()) {
                return Err(ApiError::malformed(
                    format!("identical ID in new resource: {}", node.id),
                    Some(node.id.as_str()),
                ));
            }
        }
    }
    Ok(())
}

/// A null literal is treated as a missing slot
fn is_absent(value: &SlotValue) -> bool {
    matches!(value, SlotValue::Literal(Value::Null))
}

fn check_processor_limit(child: &MetaNode, spec: &InputSpec, owner_id: &str) -> ApiResult<()> {
    if spec.limit_processors.is_empty() || spec.limit_processors.iter().any(|name| *name == child.processor) {
        return Ok(());
    }
    Err(ApiError::contract(
        format!(
            "processor {} is an invalid function type (only \"{}\" allowed)",
            child.id,
            spec.limit_processors.join("\", \"")
        ),
        owner_id,
    ))
}

fn check_literal_type(literal: &Value, slot: &str, spec: &InputSpec, owner_id: &str) -> ApiResult<()> {
    if spec.limit_types.is_empty() || spec.limit_types.iter().any(|t| t.accepts_literal(literal)) {
        return Ok(());
    }
    Err(ApiError::contract(
        format!(
            "invalid literal in new resource ({}) for '{}' in function: {}. only '{}' accepted",
            literal,
            slot,
            owner_id,
            spec.type_names()
        ),
        owner_id,
    ))
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
