/// Fragment lookup, arithmetic and data-set processors

use crate::core::error::{CODE_PROCESSING, CODE_VALIDATION};
use crate::core::{ApiError, ApiResult, DataContainer, DataType, RequestContext};
use crate::processor::contract::{InputSpec, InputType, Processor, ProcessorContract, ProcessorInput};
use regex::Regex;
use serde_json::{json, Map, Value};

/// Inserts the pre-resolved value of a named fragment
#[derive(Debug, Default)]
pub struct Fragment;

impl Processor for Fragment {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new(
            "Fragment",
            "fragment",
            "Insert the result of a fragment declaration.",
            "Logic",
        )
        .input("name", InputSpec::new("The name of the fragment.").required().default_value(""))
    }

    fn process(&self, input: &ProcessorInput, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let name = input.text("name")?;
        ctx.fragment(&name).cloned().ok_or_else(|| ApiError::FragmentResolution {
            name,
            id: input.id().to_string(),
        })
    }
}

/// Sum of two numbers; integer when both operands are integers
#[derive(Debug, Default)]
pub struct Add;

impl Processor for Add {
    fn contract(&self) -> ProcessorContract {
        let operand = |description: &str| {
            InputSpec::new(description)
                .required()
                .limit_types([InputType::Integer, InputType::Float])
        };
        ProcessorContract::new("Add", "add", "Add two numbers.", "Math")
            .input("a", operand("The first operand."))
            .input("b", operand("The second operand."))
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let a = input.val("a")?;
        let b = input.val("b")?;

        if a.data_type() == DataType::Integer && b.data_type() == DataType::Integer {
            let sum = input
                .integer("a")?
                .checked_add(input.integer("b")?)
                .ok_or_else(|| ApiError::processor("integer overflow in add", input.id()))?;
            return Ok(DataContainer::new(json!(sum), DataType::Integer));
        }

        let sum = input.float("a")? + input.float("b")?;
        Ok(DataContainer::new(json!(sum), DataType::Float))
    }
}

/// Union, intersection or symmetric difference of data-sets
#[derive(Debug, Default)]
pub struct Merge;

impl Processor for Merge {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Merge", "merge", "Merge multiple data-sets.", "Data operation")
            .input(
                "sources",
                InputSpec::new("The data-sets to merge.").cardinality(2, None),
            )
            .input(
                "merge_type",
                InputSpec::new("The merge operation to perform.")
                    .limit_types([InputType::Text])
                    .limit_values([json!("union"), json!("intersect"), json!("difference")])
                    .default_value("union"),
            )
            .input(
                "unique",
                InputSpec::new("Filter out duplicate values.")
                    .limit_types([InputType::Boolean])
                    .default_value(false),
            )
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let sources: Vec<Value> = input
            .list("sources")?
            .into_iter()
            .map(DataContainer::into_data)
            .collect();
        let merge_type = input.text("merge_type")?;
        let unique = input.boolean("unique")?;

        let merged = if sources.iter().all(Value::is_object) {
            merge_objects(&merge_type, sources)
        } else {
            merge_lists(&merge_type, sources)
        }
        .ok_or_else(|| {
            ApiError::processor_with(
                format!("invalid merge_type: {}", merge_type),
                input.id(),
                CODE_VALIDATION,
                417,
            )
        })?;

        let merged = match merged {
            Value::Array(items) if unique => {
                let mut seen = Vec::with_capacity(items.len());
                for item in items {
                    if !seen.contains(&item) {
                        seen.push(item);
                    }
                }
                Value::Array(seen)
            }
            other => other,
        };
        Ok(DataContainer::new(merged, DataType::Array))
    }
}

fn as_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn merge_lists(merge_type: &str, sources: Vec<Value>) -> Option<Value> {
    let mut sources = sources.into_iter().map(as_list);
    let mut result = sources.next().unwrap_or_default();
    for other in sources {
        result = match merge_type {
            "union" => result.into_iter().chain(other).collect(),
            "intersect" => result.into_iter().filter(|item| other.contains(item)).collect(),
            "difference" => {
                let left: Vec<Value> = result.iter().filter(|item| !other.contains(item)).cloned().collect();
                let right = other.iter().filter(|item| !result.contains(item)).cloned();
                left.into_iter().chain(right).collect()
            }
            _ => return None,
        };
    }
    Some(Value::Array(result))
}

fn merge_objects(merge_type: &str, sources: Vec<Value>) -> Option<Value> {
    let mut sources = sources.into_iter().filter_map(|value| match value {
        Value::Object(map) => Some(map),
        _ => None,
    });
    let mut result = sources.next().unwrap_or_default();
    for other in sources {
        result = match merge_type {
            "union" => {
                result.extend(other);
                result
            }
            "intersect" => result
                .into_iter()
                .filter(|(_, value)| other.values().any(|v| v == value))
                .collect(),
            "difference" => {
                let mut diff: Map<String, Value> = result
                    .iter()
                    .filter(|(_, value)| !other.values().any(|v| v == *value))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                for (key, value) in other {
                    if !result.values().any(|v| *v == value) {
                        diff.insert(key, value);
                    }
                }
                diff
            }
            _ => return None,
        };
    }
    Some(Value::Object(result))
}

/// Removes (or keeps, when inverse) keys or values matching a filter
#[derive(Debug, Default)]
pub struct Filter;

impl Processor for Filter {
    fn contract(&self) -> ProcessorContract {
        let flag = |description: &str| {
            InputSpec::new(description)
                .limit_types([InputType::Boolean])
                .default_value(false)
        };
        ProcessorContract::new("Filter", "filter", "Filter values from a data-set.", "Data operation")
            .input(
                "source",
                InputSpec::new("The data-set to filter.")
                    .cardinality(0, None)
                    .literal_allowed(false),
            )
            .input(
                "filter",
                InputSpec::new("The literal values to filter out.")
                    .cardinality(0, None)
                    .limit_types([InputType::Text, InputType::Array])
                    .default_value(""),
            )
            .input("regex", flag("Use the filter string as a regular expression."))
            .input(
                "key_or_value",
                InputSpec::new("Filter by key or value.")
                    .limit_types([InputType::Text])
                    .limit_values([json!("key"), json!("value")])
                    .default_value("key"),
            )
            .input("recursive", flag("Apply the filter to nested data-sets as well."))
            .input("inverse", flag("Keep matching data instead of removing it."))
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let source = input.value("source")?;
        let by_value = input.text("key_or_value")? == "value";
        let recursive = input.boolean("recursive")?;
        let inverse = input.boolean("inverse")?;
        let regex = input.boolean("regex")?;

        // Nothing to filter
        if is_empty(&source) {
            return Ok(DataContainer::from_literal(source));
        }

        let matcher = match input.value("filter")? {
            Value::Array(_) if regex => {
                return Err(ApiError::processor_with(
                    "cannot have an array of regexes as a filter",
                    input.id(),
                    CODE_PROCESSING,
                    417,
                ))
            }
            Value::Array(items) => Matcher::Exact(items.iter().map(scalar_text).collect()),
            pattern if regex => Matcher::Pattern(compile_pattern(&scalar_text(&pattern)).map_err(|e| {
                ApiError::processor_with(format!("invalid regex filter: {}", e), input.id(), CODE_PROCESSING, 417)
            })?),
            single => Matcher::Exact(vec![scalar_text(&single)]),
        };
        // keep = not matching, or matching when inverse
        let keep = |candidate: &str| matcher.matches(candidate) == inverse;

        let filtered = if by_value {
            filter_values(source, &keep, recursive)
        } else {
            filter_keys(source, &keep, recursive)
        };
        Ok(DataContainer::from_literal(filtered))
    }
}

enum Matcher {
    Exact(Vec<String>),
    Pattern(Regex),
}

impl Matcher {
    fn matches(&self, candidate: &str) -> bool {
        match self {
            Matcher::Exact(values) => values.iter().any(|v| v == candidate),
            Matcher::Pattern(regex) => regex.is_match(candidate),
        }
    }
}

/// Accepts bare patterns as well as delimited ones such as `/^a.*$/i`
fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    if let Some(body) = pattern.strip_prefix('/') {
        if let Some(end) = body.rfind('/') {
            let (inner, flags) = (&body[..end], &body[end + 1..]);
            if flags.chars().all(|c| "imsux".contains(c)) {
                let inline: String = flags.chars().filter(|c| "imsu".contains(*c)).collect();
                return if inline.is_empty() {
                    Regex::new(inner)
                } else {
                    Regex::new(&format!("(?{}){}", inline, inner))
                };
            }
        }
    }
    Regex::new(pattern)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn filter_keys(data: Value, keep: &dyn Fn(&str) -> bool, recursive: bool) -> Value {
    let descend = |value: Value| if recursive { filter_keys(value, keep, true) } else { value };
    match data {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| keep(key.as_str()))
                .map(|(key, value)| (key, descend(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .filter(|(index, _)| keep(index.to_string().as_str()))
                .map(|(_, value)| descend(value))
                .collect(),
        ),
        scalar => scalar,
    }
}

fn filter_values(data: Value, keep: &dyn Fn(&str) -> bool, recursive: bool) -> Value {
    let nested = |value: &Value| value.is_array() || value.is_object();
    let descend = |value: Value| if recursive { filter_values(value, keep, true) } else { value };
    match data {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, value)| nested(value) || keep(scalar_text(value).as_str()))
                .map(|(key, value)| (key, descend(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|value| nested(value) || keep(scalar_text(value).as_str()))
                .map(descend)
                .collect(),
        ),
        scalar if keep(scalar_text(&scalar).as_str()) => scalar,
        _ => Value::Null,
    }
}

/// Serialises any input into a JSON string
#[derive(Debug, Default)]
pub struct ConvertToJson;

impl Processor for ConvertToJson {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new(
            "Convert to JSON",
            "convert_to_json",
            "Convert input data (array, object or text) into a JSON string.",
            "Data operation",
        )
        .input("source", InputSpec::new("The source data.").required().default_value(""))
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let encoded = match input.value("source")? {
            Value::String(s) if serde_json::from_str::<Value>(&s).is_ok() => s,
            other => serde_json::to_string(&other)
                .map_err(|e| ApiError::processor(format!("unable to encode JSON: {}", e), input.id()))?,
        };
        Ok(DataContainer::new(Value::String(encoded), DataType::Json))
    }
}

#[cfg(test)]
#[path = "logic_test.rs"]
mod tests;
