/// Processor contract ("details") and the processor trait
///
/// Every processor type declares a static contract describing its input
/// slots. The validator checks resource trees against it at authoring time
/// and `ProcessorInput::val` re-checks resolved values at run time.

use crate::core::value::{loose_bool, loose_float, loose_int};
use crate::core::{ApiError, ApiResult, DataContainer, DataType, RequestContext};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A processor type: contract plus evaluation
///
/// Instances are created per node by the registry factory, so implementations
/// may keep per-node state but never share it across requests.
pub trait Processor: Send {
    fn contract(&self) -> ProcessorContract;

    /// Evaluate the node whose resolved inputs are `input`
    fn process(&self, input: &ProcessorInput, ctx: &mut RequestContext) -> ApiResult<DataContainer>;
}

/// Type names usable in `limitTypes`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Integer,
    Float,
    Boolean,
    Array,
    Json,
    Xml,
    Html,
    Image,
    File,
    /// Any string or number
    Literal,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Integer => "integer",
            InputType::Float => "float",
            InputType::Boolean => "boolean",
            InputType::Array => "array",
            InputType::Json => "json",
            InputType::Xml => "xml",
            InputType::Html => "html",
            InputType::Image => "image",
            InputType::File => "file",
            InputType::Literal => "literal",
        }
    }

    /// Authoring-time check of a raw literal, with loose coercion
    /// ("5" is an integer, "true" a boolean, "1.5" a float).
    pub fn accepts_literal(&self, literal: &Value) -> bool {
        match self {
            InputType::File => true,
            InputType::Literal => literal.is_string() || literal.is_number(),
            InputType::Boolean => loose_bool(literal).is_some(),
            InputType::Integer => loose_int(literal).is_some(),
            InputType::Float => loose_float(literal).is_some(),
            InputType::Text | InputType::Xml | InputType::Html | InputType::Image => literal.is_string(),
            InputType::Array => literal.is_array() || literal.is_object(),
            InputType::Json => literal.is_string() || literal.is_array() || literal.is_object(),
        }
    }

    /// Run-time check of an evaluated value's type tag
    pub fn accepts_type(&self, data_type: DataType) -> bool {
        use DataType as T;
        match self {
            InputType::Literal => matches!(data_type, T::Text | T::Integer | T::Float | T::Boolean),
            InputType::Text => matches!(
                data_type,
                T::Text | T::Integer | T::Float | T::Boolean | T::Json | T::Xml | T::Html
            ),
            InputType::Integer => data_type == T::Integer,
            InputType::Float => matches!(data_type, T::Float | T::Integer),
            InputType::Boolean => data_type == T::Boolean,
            InputType::Array => data_type == T::Array,
            InputType::Json => matches!(data_type, T::Json | T::Array),
            InputType::Xml => matches!(data_type, T::Xml | T::Text),
            InputType::Html => matches!(data_type, T::Html | T::Text),
            InputType::Image => matches!(data_type, T::Image | T::File),
            InputType::File => matches!(data_type, T::File | T::Text),
        }
    }
}

/// Allowed number of values in a slot: `max: None` is unbounded ("*")
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub min: usize,
    pub max: Option<usize>,
}

impl Cardinality {
    pub fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }

    pub fn is_consistent(&self) -> bool {
        self.max.map_or(true, |max| self.min <= max)
    }
}

impl Serialize for Cardinality {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.min)?;
        match self.max {
            Some(max) => seq.serialize_element(&max)?,
            None => seq.serialize_element("*")?,
        }
        seq.end()
    }
}

/// Contract of one input slot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    pub description: String,
    pub cardinality: Cardinality,
    pub literal_allowed: bool,
    pub limit_processors: Vec<String>,
    pub limit_types: Vec<InputType>,
    pub limit_values: Vec<Value>,
    pub default: Value,
}

impl InputSpec {
    /// Optional single literal-or-processor input with no limits
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            cardinality: Cardinality::new(0, Some(1)),
            literal_allowed: true,
            limit_processors: Vec::new(),
            limit_types: Vec::new(),
            limit_values: Vec::new(),
            default: Value::Null,
        }
    }

    pub fn cardinality(mut self, min: usize, max: Option<usize>) -> Self {
        self.cardinality = Cardinality::new(min, max);
        self
    }

    /// Shorthand for cardinality (1, 1)
    pub fn required(self) -> Self {
        self.cardinality(1, Some(1))
    }

    pub fn literal_allowed(mut self, allowed: bool) -> Self {
        self.literal_allowed = allowed;
        self
    }

    pub fn limit_processors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.limit_processors = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit_types(mut self, types: impl IntoIterator<Item = InputType>) -> Self {
        self.limit_types = types.into_iter().collect();
        self
    }

    pub fn limit_values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.limit_values = values.into_iter().collect();
        self
    }

    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn type_names(&self) -> String {
        self.limit_types
            .iter()
            .map(InputType::as_str)
            .collect::<Vec<_>>()
            .join("', '")
    }
}

/// Static description of a processor type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorContract {
    pub name: String,
    pub machine_name: String,
    pub description: String,
    /// UI categorisation only
    pub menu: String,
    pub input: BTreeMap<String, InputSpec>,
}

impl ProcessorContract {
    pub fn new(
        name: impl Into<String>,
        machine_name: impl Into<String>,
        description: impl Into<String>,
        menu: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            machine_name: machine_name.into(),
            description: description.into(),
            menu: menu.into(),
            input: BTreeMap::new(),
        }
    }

    pub fn input(mut self, slot: impl Into<String>, spec: InputSpec) -> Self {
        self.input.insert(slot.into(), spec);
        self
    }

    /// Contracts are fixed at startup; reject inconsistent ones at registration
    pub fn check(&self) -> Result<(), String> {
        for (slot, spec) in &self.input {
            if !spec.cardinality.is_consistent() {
                return Err(format!(
                    "processor {} declares min > max for input '{}'",
                    self.machine_name, slot
                ));
            }
        }
        Ok(())
    }
}

/// A slot value after dependency substitution
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Literal(Value),
    Container(DataContainer),
    Sequence(Vec<InputValue>),
}

impl InputValue {
    pub fn to_container(&self) -> DataContainer {
        match self {
            InputValue::Literal(value) => DataContainer::from_literal(value.clone()),
            InputValue::Container(container) => container.clone(),
            InputValue::Sequence(items) => DataContainer::new(
                Value::Array(items.iter().map(|item| item.to_container().into_data()).collect()),
                DataType::Array,
            ),
        }
    }
}

/// Resolved inputs of one node, handed to `Processor::process`
#[derive(Debug, Clone)]
pub struct ProcessorInput {
    id: String,
    contract: Arc<ProcessorContract>,
    slots: BTreeMap<String, InputValue>,
}

impl ProcessorInput {
    pub fn new(
        id: impl Into<String>,
        contract: Arc<ProcessorContract>,
        slots: BTreeMap<String, InputValue>,
    ) -> Self {
        Self {
            id: id.into(),
            contract,
            slots,
        }
    }

    /// Id of the node being evaluated
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn contract(&self) -> &ProcessorContract {
        &self.contract
    }

    pub fn has(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
    }

    pub fn raw(&self, slot: &str) -> Option<&InputValue> {
        self.slots.get(slot)
    }

    /// Value of a slot, or the contract default when the slot was not supplied.
    /// Supplied values are checked against the slot's `limitTypes`.
    pub fn val(&self, slot: &str) -> ApiResult<DataContainer> {
        let spec = self.contract.input.get(slot);
        let Some(value) = self.slots.get(slot) else {
            let default = spec.map(|s| s.default.clone()).unwrap_or(Value::Null);
            return Ok(DataContainer::from_literal(default));
        };

        let container = value.to_container();
        if let Some(spec) = spec {
            let data_type = container.data_type();
            // literals get the same loose coercion the validator applied
            let accepted = |t: &InputType| match value {
                InputValue::Literal(literal) => t.accepts_literal(literal) || t.accepts_type(data_type),
                _ => t.accepts_type(data_type),
            };
            if data_type != DataType::Undefined
                && !spec.limit_types.is_empty()
                && !spec.limit_types.iter().any(accepted)
            {
                return Err(ApiError::processor_with(
                    format!(
                        "Invalid type ({}), only '{}' allowed in input '{}'.",
                        data_type,
                        spec.type_names(),
                        slot
                    ),
                    &self.id,
                    crate::core::error::CODE_VALIDATION,
                    400,
                ));
            }
        }
        Ok(container)
    }

    /// Raw data of a slot (`val` unwrapped)
    pub fn value(&self, slot: &str) -> ApiResult<Value> {
        self.val(slot).map(DataContainer::into_data)
    }

    pub fn text(&self, slot: &str) -> ApiResult<String> {
        self.val(slot).map(|c| c.to_text())
    }

    pub fn integer(&self, slot: &str) -> ApiResult<i64> {
        let value = self.value(slot)?;
        loose_int(&value).ok_or_else(|| {
            ApiError::processor(format!("input '{}' is not an integer: {}", slot, value), &self.id)
        })
    }

    pub fn float(&self, slot: &str) -> ApiResult<f64> {
        let value = self.value(slot)?;
        loose_float(&value).ok_or_else(|| {
            ApiError::processor(format!("input '{}' is not a number: {}", slot, value), &self.id)
        })
    }

    pub fn boolean(&self, slot: &str) -> ApiResult<bool> {
        let value = self.value(slot)?;
        if value.is_null() {
            return Ok(false);
        }
        loose_bool(&value).ok_or_else(|| {
            ApiError::processor(format!("input '{}' is not a boolean: {}", slot, value), &self.id)
        })
    }

    /// Elements of a slot individually (a single value is a one-element list)
    pub fn list(&self, slot: &str) -> ApiResult<Vec<DataContainer>> {
        match self.slots.get(slot) {
            None => Ok(Vec::new()),
            Some(InputValue::Sequence(items)) => Ok(items.iter().map(InputValue::to_container).collect()),
            Some(_) => Ok(vec![self.val(slot)?]),
        }
    }
}

#[cfg(test)]
#[path = "contract_test.rs"]
mod tests;
