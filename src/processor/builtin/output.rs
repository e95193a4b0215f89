/// Output renderers
///
/// Output processors turn the evaluated process result (`ctx.payload`) or an
/// explicit `data` input into the response body. The returned container holds
/// the encoded text, tagged with the format it was rendered in.

use crate::core::{ApiError, ApiResult, DataContainer, DataType, RequestContext};
use crate::processor::contract::{InputSpec, Processor, ProcessorContract, ProcessorInput};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;
use std::io::Cursor;

/// Root element wrapping every XML response
const XML_ROOT: &str = "response";

fn renderer_contract(name: &str, machine_name: &str) -> ProcessorContract {
    ProcessorContract::new(
        name,
        machine_name,
        format!("Render the result as {}.", name),
        "Output",
    )
    .input(
        "data",
        InputSpec::new("The data to render. Defaults to the result of the process section."),
    )
}

/// Explicit `data` input, or the process result
fn payload(input: &ProcessorInput, ctx: &RequestContext) -> ApiResult<DataContainer> {
    if input.has("data") {
        return input.val("data");
    }
    Ok(ctx
        .payload
        .clone()
        .unwrap_or_else(|| DataContainer::from_literal(Value::Null)))
}

#[derive(Debug, Default)]
pub struct Json;

impl Processor for Json {
    fn contract(&self) -> ProcessorContract {
        renderer_contract("JSON", "json")
    }

    fn process(&self, input: &ProcessorInput, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let payload = payload(input, ctx)?;
        let body = match (payload.data_type(), payload.data()) {
            // already encoded
            (DataType::Json, Value::String(encoded)) => encoded.clone(),
            (_, data) => serde_json::to_string(data)
                .map_err(|e| ApiError::processor(format!("unable to encode JSON: {}", e), input.id()))?,
        };
        Ok(DataContainer::new(Value::String(body), DataType::Json))
    }
}

#[derive(Debug, Default)]
pub struct Xml;

impl Processor for Xml {
    fn contract(&self) -> ProcessorContract {
        renderer_contract("XML", "xml")
    }

    fn process(&self, input: &ProcessorInput, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let payload = payload(input, ctx)?;
        let body = match (payload.data_type(), payload.data()) {
            (DataType::Xml, Value::String(document)) if document.trim_start().starts_with("<?xml") => {
                document.clone()
            }
            (_, data) => to_xml(data)
                .map_err(|e| ApiError::processor(format!("unable to encode XML: {}", e), input.id()))?,
        };
        Ok(DataContainer::new(Value::String(body), DataType::Xml))
    }
}

/// Encode a value under the response root; numeric keys become `item<n>`
pub fn to_xml(data: &Value) -> Result<String, String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| e.to_string())?;
    write_element(&mut writer, XML_ROOT, data)?;
    String::from_utf8(writer.into_inner().into_inner()).map_err(|e| e.to_string())
}

fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, data: &Value) -> Result<(), String> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| e.to_string())?;

    match data {
        Value::Object(map) => {
            for (key, value) in map {
                let tag = element_name(key);
                write_element(writer, &tag, value)?;
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                write_element(writer, &format!("item{}", index), value)?;
            }
        }
        Value::Null => {}
        scalar => {
            let text = match scalar {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(|e| e.to_string())?;
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| e.to_string())?;
    Ok(())
}

fn element_name(key: &str) -> String {
    if key.is_empty() || key.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("item{}", key);
    }
    key.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' { c } else { '_' })
        .collect()
}

#[derive(Debug, Default)]
pub struct Text;

impl Processor for Text {
    fn contract(&self) -> ProcessorContract {
        renderer_contract("Text", "text")
    }

    fn process(&self, input: &ProcessorInput, ctx: &mut RequestContext) -> ApiResult<DataContainer> {
        let payload = payload(input, ctx)?;
        Ok(DataContainer::new(Value::String(payload.to_text()), DataType::Text))
    }
}

/// Content type of a rendered body
pub fn content_type(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Json | DataType::Array => "application/json",
        DataType::Xml => "application/xml",
        DataType::Html => "text/html",
        DataType::Image | DataType::File => "application/octet-stream",
        _ => "text/plain; charset=utf-8",
    }
}

#[cfg(test)]
#[path = "output_test.rs"]
mod tests;
