/// Primitive and request variable processors

use crate::core::error::CODE_VALIDATION;
use crate::core::{ApiError, ApiResult, DataContainer, DataType, RequestContext};
use crate::processor::contract::{InputSpec, InputType, Processor, ProcessorContract, ProcessorInput};
use serde_json::{json, Map, Value};

#[derive(Debug, Default)]
pub struct VarInt;

impl Processor for VarInt {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Var (Integer)", "var_int", "An integer variable.", "Primitive").input(
            "value",
            InputSpec::new("The value of the variable.")
                .required()
                .limit_types([InputType::Integer]),
        )
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        Ok(DataContainer::new(json!(input.integer("value")?), DataType::Integer))
    }
}

#[derive(Debug, Default)]
pub struct VarFloat;

impl Processor for VarFloat {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Var (Float)", "var_float", "A float variable.", "Primitive").input(
            "value",
            InputSpec::new("The value of the variable.")
                .required()
                .limit_types([InputType::Float]),
        )
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        Ok(DataContainer::new(json!(input.float("value")?), DataType::Float))
    }
}

#[derive(Debug, Default)]
pub struct VarBool;

impl Processor for VarBool {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Var (Boolean)", "var_bool", "A boolean variable.", "Primitive").input(
            "value",
            InputSpec::new("The value of the variable.")
                .required()
                .limit_types([InputType::Boolean, InputType::Integer]),
        )
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        Ok(DataContainer::boolean(input.boolean("value")?))
    }
}

#[derive(Debug, Default)]
pub struct VarText;

impl Processor for VarText {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Var (Text)", "var_text", "A text variable.", "Primitive").input(
            "value",
            InputSpec::new("The value of the variable.")
                .required()
                .limit_types([InputType::Text]),
        )
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        Ok(DataContainer::text(input.text("value")?))
    }
}

#[derive(Debug, Default)]
pub struct VarMixed;

impl Processor for VarMixed {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new("Var (Mixed)", "var_mixed", "A variable of any type.", "Primitive")
            .input("value", InputSpec::new("The value of the variable.").required())
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        input.val("value")
    }
}

/// A single key/value pair, the building block of `var_object`
#[derive(Debug, Default)]
pub struct VarField;

impl Processor for VarField {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new(
            "Var (Field)",
            "var_field",
            "Create a name/value pair, primarily for use as a field in an object.",
            "Primitive",
        )
        .input(
            "key",
            InputSpec::new("The key of the field.")
                .limit_types([InputType::Text, InputType::Integer])
                .default_value(0),
        )
        .input("value", InputSpec::new("The value of the field.").default_value(""))
        .input(
            "array",
            InputSpec::new("Single-index array to be converted to a field.")
                .limit_types([InputType::Array])
                .default_value(Value::Object(Map::new())),
        )
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let single_index = || {
            ApiError::processor_with(
                "Cannot have more than one index in an input array.",
                input.id(),
                CODE_VALIDATION,
                417,
            )
        };

        match input.value("array")? {
            Value::Object(map) if !map.is_empty() => {
                if map.len() > 1 {
                    return Err(single_index());
                }
                return Ok(DataContainer::new(Value::Object(map), DataType::Array));
            }
            Value::Array(mut items) if !items.is_empty() => {
                if items.len() > 1 {
                    return Err(single_index());
                }
                let mut field = Map::new();
                field.insert("0".to_string(), items.remove(0));
                return Ok(DataContainer::new(Value::Object(field), DataType::Array));
            }
            _ => {}
        }

        let mut field = Map::new();
        field.insert(input.text("key")?, input.value("value")?);
        Ok(DataContainer::new(Value::Object(field), DataType::Array))
    }
}

/// Builds an object from fields; non-field attributes get positional keys
#[derive(Debug, Default)]
pub struct VarObject;

impl Processor for VarObject {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new(
            "Var (Object)",
            "var_object",
            "Create a custom object from fields and values.",
            "Primitive",
        )
        .input(
            "attributes",
            InputSpec::new("The fields or values of the object.").cardinality(0, None),
        )
    }

    fn process(&self, input: &ProcessorInput, _ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let attributes = input.list("attributes")?;
        let is_field = |value: &Value| matches!(value, Value::Object(map) if map.len() == 1);

        if !attributes.iter().any(|a| is_field(a.data())) {
            let values = attributes.into_iter().map(DataContainer::into_data).collect();
            return Ok(DataContainer::new(Value::Array(values), DataType::Array));
        }

        let mut object = Map::new();
        let mut position = 0usize;
        for attribute in attributes {
            match attribute.into_data() {
                Value::Object(field) if field.len() == 1 => object.extend(field),
                other => {
                    object.insert(position.to_string(), other);
                    position += 1;
                }
            }
        }
        Ok(DataContainer::new(Value::Object(object), DataType::Array))
    }
}

fn request_var_contract(name: &str, machine_name: &str, source: &str) -> ProcessorContract {
    ProcessorContract::new(
        name,
        machine_name,
        format!("A {} variable. It fetches a variable from the {} request.", source, source),
        "Request",
    )
    .input(
        "key",
        InputSpec::new(format!("The key or name of the {} variable.", source))
            .required()
            .limit_types([InputType::Text]),
    )
    .input(
        "nullable",
        InputSpec::new(format!("Allow processing to continue if the {} variable does not exist.", source))
            .limit_types([InputType::Boolean, InputType::Integer])
            .default_value(true),
    )
}

fn fetch_request_var(input: &ProcessorInput, vars: Option<&Value>, source: &str) -> ApiResult<DataContainer> {
    let key = input.text("key")?;
    match vars {
        Some(value) => Ok(DataContainer::from_literal(value.clone())),
        None if input.boolean("nullable")? => Ok(DataContainer::text("")),
        None => Err(ApiError::processor_with(
            format!("{} variable ({}) not received", source, key),
            input.id(),
            CODE_VALIDATION,
            400,
        )),
    }
}

#[derive(Debug, Default)]
pub struct VarGet;

impl Processor for VarGet {
    fn contract(&self) -> ProcessorContract {
        request_var_contract("Var (Get)", "var_get", "get")
    }

    fn process(&self, input: &ProcessorInput, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let key = input.text("key")?;
        fetch_request_var(input, ctx.get_vars.get(&key), "get")
    }
}

#[derive(Debug, Default)]
pub struct VarPost;

impl Processor for VarPost {
    fn contract(&self) -> ProcessorContract {
        request_var_contract("Var (Post)", "var_post", "post")
    }

    fn process(&self, input: &ProcessorInput, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let key = input.text("key")?;
        fetch_request_var(input, ctx.post_vars.get(&key), "post")
    }
}

/// GET or POST variable, POST winning
#[derive(Debug, Default)]
pub struct VarRequest;

impl Processor for VarRequest {
    fn contract(&self) -> ProcessorContract {
        request_var_contract("Var (Request)", "var_request", "get or post")
    }

    fn process(&self, input: &ProcessorInput, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let key = input.text("key")?;
        fetch_request_var(input, ctx.request_var(&key), "request")
    }
}

#[derive(Debug, Default)]
pub struct VarUri;

impl Processor for VarUri {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new(
            "Var (URI)",
            "var_uri",
            "A value from the request URI, by index after the resource uri.",
            "Request",
        )
        .input(
            "index",
            InputSpec::new("The index of the URI argument, starting at 0.")
                .required()
                .limit_types([InputType::Integer]),
        )
    }

    fn process(&self, input: &ProcessorInput, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let index = input.integer("index")?;
        usize::try_from(index)
            .ok()
            .and_then(|i| ctx.args.get(i))
            .map(|arg| DataContainer::from_literal(Value::String(arg.clone())))
            .ok_or_else(|| {
                ApiError::processor_with(
                    format!("URI index \"{}\" does not exist", index),
                    input.id(),
                    CODE_VALIDATION,
                    417,
                )
            })
    }
}

/// Request-scoped variable store access (save/fetch/delete)
#[derive(Debug, Default)]
pub struct VarTemporary;

impl Processor for VarTemporary {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new(
            "Var (Temporary)",
            "var_temporary",
            "A temporarily stored variable, available to every node of the current call.",
            "Primitive",
        )
        .input("name", InputSpec::new("The name of the variable.").required())
        .input("value", InputSpec::new("The value to store (save operations only)."))
        .input(
            "operation",
            InputSpec::new("The operation to perform on the variable.")
                .required()
                .limit_values([json!("save"), json!("delete"), json!("fetch")]),
        )
        .input(
            "strict",
            InputSpec::new("Fail when the variable does not exist, instead of returning null.")
                .limit_types([InputType::Boolean, InputType::Integer])
                .default_value(true),
        )
    }

    fn process(&self, input: &ProcessorInput, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let name = input.text("name")?;
        let operation = input.text("operation")?;
        let strict = input.boolean("strict")?;
        let missing = |verb: &str| {
            ApiError::processor_with(
                format!("could not {} variable, does not exist", verb),
                input.id(),
                CODE_VALIDATION,
                417,
            )
        };

        match operation.as_str() {
            "save" => {
                ctx.store_mut().set(&name, input.value("value")?);
                Ok(DataContainer::boolean(true))
            }
            "delete" => match ctx.store_mut().delete(&name) {
                Some(_) => Ok(DataContainer::boolean(true)),
                None if strict => Err(missing("delete")),
                None => Ok(DataContainer::boolean(false)),
            },
            "fetch" => match ctx.store().get(&name) {
                Some(value) => Ok(DataContainer::from_literal(value)),
                None if strict => Err(missing("fetch")),
                None => Ok(DataContainer::from_literal(Value::Null)),
            },
            other => Err(ApiError::processor_with(
                format!("invalid operation: {}", other),
                input.id(),
                CODE_VALIDATION,
                417,
            )),
        }
    }
}

/// Token from the `Authorization: Bearer` header (empty text when absent)
#[derive(Debug, Default)]
pub struct BearerToken;

impl Processor for BearerToken {
    fn contract(&self) -> ProcessorContract {
        ProcessorContract::new(
            "Bearer token",
            "bearer_token",
            "The bearer token sent in the request Authorization header.",
            "Request",
        )
    }

    fn process(&self, _input: &ProcessorInput, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        Ok(DataContainer::text(ctx.token.clone().unwrap_or_default()))
    }
}

#[cfg(test)]
#[path = "vars_test.rs"]
mod tests;
