/// Type-tagged value container
///
/// Every processor node evaluates to a `DataContainer`: raw JSON data plus an
/// advisory type tag. The tag drives branching in the validator, the runtime
/// input checks and the output renderers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Runtime type tag carried next to the data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
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
    Undefined,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Boolean => "boolean",
            DataType::Array => "array",
            DataType::Json => "json",
            DataType::Xml => "xml",
            DataType::Html => "html",
            DataType::Image => "image",
            DataType::File => "file",
            DataType::Undefined => "undefined",
        }
    }

    /// Infer a tag from raw literal data
    ///
    /// Numeric and boolean strings are detected the way request variables arrive
    /// (everything from a query string is text on the wire): "0" is an integer,
    /// "1.6" a float, "true" a boolean.
    pub fn detect(data: &Value) -> DataType {
        match data {
            Value::Null => DataType::Undefined,
            Value::Bool(_) => DataType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => DataType::Integer,
            Value::Number(_) => DataType::Float,
            Value::Array(_) | Value::Object(_) => DataType::Array,
            Value::String(s) => {
                if strict_int(s).is_some() {
                    DataType::Integer
                } else if strict_float(s).is_some() {
                    DataType::Float
                } else if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
                    DataType::Boolean
                } else {
                    DataType::Text
                }
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of every evaluated node and the wrapper for literal inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataContainer {
    data: Value,
    #[serde(rename = "type")]
    data_type: DataType,
}

impl DataContainer {
    pub fn new(data: Value, data_type: DataType) -> Self {
        Self { data, data_type }
    }

    /// Wrap a literal, detecting its type from the data
    pub fn from_literal(data: Value) -> Self {
        let data_type = DataType::detect(&data);
        Self { data, data_type }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::new(Value::String(s.into()), DataType::Text)
    }

    pub fn boolean(b: bool) -> Self {
        Self::new(Value::Bool(b), DataType::Boolean)
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn set_data(&mut self, data: Value) {
        self.data = data;
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn set_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    /// Render scalar data as a plain string (arrays fall back to compact JSON)
    pub fn to_text(&self) -> String {
        match &self.data {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        }
    }
}

/// Loose boolean coercion: native booleans, 1/0, and the usual
/// "true"/"false", "yes"/"no", "on"/"off", "1"/"0" strings.
pub fn loose_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Some(true),
            "0" | "false" | "off" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Loose integer coercion: native integers, integral floats and
/// integer-looking strings ("5", " -12 ").
pub fn loose_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => strict_int(s.trim()),
        _ => None,
    }
}

/// Loose float coercion: any native number or numeric string
pub fn loose_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => strict_float(s.trim()),
        _ => None,
    }
}

fn strict_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // "007" is not an integer literal
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    s.parse::<i64>().ok()
}

fn strict_float(s: &str) -> Option<f64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b)) {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;
