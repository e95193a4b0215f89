/// Resource metadata type definitions
///
/// A resource is one API endpoint described declaratively: trees of processor
/// nodes for its security, process and output sections plus named fragments.
/// Trees are parsed once from JSON/YAML into `SlotValue`s so that the evaluator
/// and the validator can pattern-match instead of probing raw JSON.

use crate::core::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Keys of a node mapping that are not input slots
const ID_KEY: &str = "id";
const PROCESSOR_KEY: &str = "processor";

/// Keys every imported resource document must carry
const REQUIRED_DOCUMENT_KEYS: [&str; 6] = ["name", "description", "uri", "method", "appid", "ttl"];

/// One node of a declarative tree
#[derive(Debug, Clone, PartialEq)]
pub struct MetaNode {
    /// Unique within the whole resource; result key and error attribution
    pub id: String,
    /// Machine name resolved through the processor registry
    pub processor: String,
    /// Named input slots, ordered by slot name
    pub slots: BTreeMap<String, SlotValue>,
}

/// Content of an input slot (or of a whole section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum SlotValue {
    Literal(Value),
    Node(Box<MetaNode>),
    Sequence(Vec<SlotValue>),
}

impl MetaNode {
    pub fn new(id: impl Into<String>, processor: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            processor: processor.into(),
            slots: BTreeMap::new(),
        }
    }

    /// Builder used by tests and programmatic resource construction
    pub fn with_slot(mut self, name: impl Into<String>, value: SlotValue) -> Self {
        self.slots.insert(name.into(), value);
        self
    }

    pub fn slot(&self, name: &str) -> Option<&SlotValue> {
        self.slots.get(name)
    }

    /// Processor nodes nested directly in this node's slots (including inside
    /// sequences), in slot order. Nodes nested deeper belong to those children.
    pub fn child_nodes(&self) -> Vec<&MetaNode> {
        let mut children = Vec::new();
        for value in self.slots.values() {
            value.collect_nodes(&mut children);
        }
        children
    }

    fn from_map(map: &Map<String, Value>) -> ApiResult<Self> {
        let processor = match map.get(PROCESSOR_KEY) {
            Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
            _ => return Err(ApiError::malformed("invalid processor definition: processor name must be text", None)),
        };
        let id = match map.get(ID_KEY) {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(ApiError::malformed(
                    format!("invalid process definition: processor '{}' has no id", processor),
                    None,
                ))
            }
        };

        let mut slots = BTreeMap::new();
        for (key, raw) in map {
            if key == ID_KEY || key == PROCESSOR_KEY {
                continue;
            }
            let value = SlotValue::try_from(raw.clone()).map_err(|e| e.with_node_id(&id))?;
            slots.insert(key.clone(), value);
        }

        Ok(Self { id, processor, slots })
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(ID_KEY.to_string(), Value::String(self.id.clone()));
        map.insert(PROCESSOR_KEY.to_string(), Value::String(self.processor.clone()));
        for (key, value) in &self.slots {
            map.insert(key.clone(), Value::from(value.clone()));
        }
        map
    }
}

impl SlotValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        SlotValue::Literal(value.into())
    }

    pub fn node(node: MetaNode) -> Self {
        SlotValue::Node(Box::new(node))
    }

    pub fn as_node(&self) -> Option<&MetaNode> {
        match self {
            SlotValue::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Number of values supplied to a slot: sequences count their elements
    pub fn count(&self) -> usize {
        match self {
            SlotValue::Sequence(items) => items.len(),
            _ => 1,
        }
    }

    /// Every processor node in this value, pre-order, descending into
    /// nested nodes' slots as well.
    pub fn all_nodes(&self) -> Vec<&MetaNode> {
        let mut found = Vec::new();
        let mut stack: Vec<&SlotValue> = vec![self];
        while let Some(value) = stack.pop() {
            match value {
                SlotValue::Literal(_) => {}
                SlotValue::Node(node) => {
                    found.push(node.as_ref());
                    stack.extend(node.slots.values().rev());
                }
                SlotValue::Sequence(items) => stack.extend(items.iter().rev()),
            }
        }
        found
    }

    fn collect_nodes<'a>(&'a self, out: &mut Vec<&'a MetaNode>) {
        let mut stack: Vec<&SlotValue> = vec![self];
        while let Some(value) = stack.pop() {
            match value {
                SlotValue::Literal(_) => {}
                SlotValue::Node(node) => out.push(node),
                SlotValue::Sequence(items) => stack.extend(items.iter().rev()),
            }
        }
    }
}

impl TryFrom<Value> for SlotValue {
    type Error = ApiError;

    fn try_from(value: Value) -> ApiResult<Self> {
        match value {
            Value::Object(map) if map.contains_key(PROCESSOR_KEY) => {
                Ok(SlotValue::Node(Box::new(MetaNode::from_map(&map)?)))
            }
            Value::Array(items) => items
                .into_iter()
                .map(SlotValue::try_from)
                .collect::<ApiResult<Vec<_>>>()
                .map(SlotValue::Sequence),
            other => Ok(SlotValue::Literal(other)),
        }
    }
}

impl From<SlotValue> for Value {
    fn from(value: SlotValue) -> Self {
        match value {
            SlotValue::Literal(v) => v,
            SlotValue::Node(node) => Value::Object(node.to_map()),
            SlotValue::Sequence(items) => Value::Array(items.into_iter().map(Value::from).collect()),
        }
    }
}

/// The four metadata sections of a resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMeta {
    pub security: Option<SlotValue>,
    pub process: SlotValue,
    pub output: Option<SlotValue>,
    /// Named reusable sub-trees, resolved once per request
    pub fragments: BTreeMap<String, SlotValue>,
}

impl ResourceMeta {
    /// Parse the metadata sections out of a resource mapping
    pub fn from_value(value: &Value) -> ApiResult<Self> {
        let map = match value {
            Value::Object(map) if !map.is_empty() => map,
            _ => return Err(ApiError::malformed("empty resource uploaded", None)),
        };

        let process = match map.get("process") {
            Some(raw) if !raw.is_null() => SlotValue::try_from(raw.clone())?,
            _ => return Err(ApiError::malformed("missing process in new resource", None)),
        };
        let security = optional_section(map, "security")?;
        let output = optional_section(map, "output")?;

        let mut fragments = BTreeMap::new();
        match map.get("fragments") {
            None | Some(Value::Null) => {}
            Some(Value::Object(entries)) => {
                for (name, raw) in entries {
                    fragments.insert(name.clone(), SlotValue::try_from(raw.clone())?);
                }
            }
            Some(Value::Array(items)) if items.is_empty() => {}
            Some(_) => {
                return Err(ApiError::malformed("invalid fragments structure in new resource", None))
            }
        }

        Ok(Self {
            security,
            process,
            output,
            fragments,
        })
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(security) = &self.security {
            map.insert("security".to_string(), Value::from(security.clone()));
        }
        map.insert("process".to_string(), Value::from(self.process.clone()));
        if let Some(output) = &self.output {
            map.insert("output".to_string(), Value::from(output.clone()));
        }
        if !self.fragments.is_empty() {
            let fragments = self
                .fragments
                .iter()
                .map(|(name, value)| (name.clone(), Value::from(value.clone())))
                .collect();
            map.insert("fragments".to_string(), Value::Object(fragments));
        }
        Value::Object(map)
    }

    /// Every section as one list, in validation order
    pub fn sections(&self) -> Vec<&SlotValue> {
        let mut sections = Vec::new();
        sections.extend(self.security.iter());
        sections.extend(self.output.iter());
        sections.extend(self.fragments.values());
        sections.push(&self.process);
        sections
    }
}

fn optional_section(map: &Map<String, Value>, key: &str) -> ApiResult<Option<SlotValue>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => SlotValue::try_from(raw.clone()).map(Some),
    }
}

/// An import document: endpoint identity plus metadata sections
#[derive(Debug, Clone)]
pub struct ResourceDocument {
    pub name: String,
    pub description: String,
    pub appid: String,
    pub method: String,
    pub uri: String,
    pub ttl: u64,
    pub meta: ResourceMeta,
}

impl ResourceDocument {
    /// Parse a JSON or YAML resource document (JSON is tried first)
    pub fn parse(text: &str) -> ApiResult<Self> {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(_) => serde_yaml::from_str(text).map_err(|e| {
                ApiError::malformed(format!("unable to parse the resource as JSON or YAML: {}", e), None)
            })?,
        };
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> ApiResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| ApiError::malformed("empty resource uploaded", None))?;

        for key in REQUIRED_DOCUMENT_KEYS {
            if !map.contains_key(key) {
                return Err(ApiError::malformed(format!("missing {} in new resource", key), None));
            }
        }

        let ttl = match map.get("ttl") {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(ttl) if ttl < 0 => {
                    return Err(ApiError::malformed("negative ttl in new resource", None))
                }
                Some(ttl) => ttl as u64,
                None => return Err(ApiError::malformed("invalid ttl in new resource", None)),
            },
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|ttl| *ttl >= 0)
                .map(|ttl| ttl as u64)
                .ok_or_else(|| ApiError::malformed("invalid ttl in new resource", None))?,
            _ => return Err(ApiError::malformed("invalid ttl in new resource", None)),
        };

        Ok(Self {
            name: text_field(map, "name")?,
            description: text_field(map, "description")?,
            appid: text_field(map, "appid")?,
            method: text_field(map, "method")?.to_lowercase(),
            uri: normalize_uri(&text_field(map, "uri")?),
            ttl,
            meta: ResourceMeta::from_value(value)?,
        })
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> ApiResult<String> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ApiError::malformed(format!("invalid {} in new resource", key), None)),
    }
}

/// Lower-case and strip surrounding slashes: "/Account/Read/" -> "account/read"
pub fn normalize_uri(uri: &str) -> String {
    uri.trim().trim_matches('/').to_lowercase()
}

/// A stored resource: endpoint identity, cache ttl and parsed metadata
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: String,
    pub appid: String,
    pub name: String,
    pub description: String,
    pub method: String,
    pub uri: String,
    pub ttl: u64,
    pub meta: ResourceMeta,
}

impl Resource {
    pub fn from_document(id: String, document: ResourceDocument) -> Self {
        Self {
            id,
            appid: document.appid,
            name: document.name,
            description: document.description,
            method: document.method,
            uri: document.uri,
            ttl: document.ttl,
            meta: document.meta,
        }
    }

    /// Export in import-document shape (round-trips through `ResourceDocument::parse`)
    pub fn to_document_value(&self) -> Value {
        let mut map = match self.meta.to_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("description".to_string(), Value::String(self.description.clone()));
        map.insert("appid".to_string(), Value::String(self.appid.clone()));
        map.insert("method".to_string(), Value::String(self.method.clone()));
        map.insert("uri".to_string(), Value::String(self.uri.clone()));
        map.insert("ttl".to_string(), Value::from(self.ttl));
        map.insert("id".to_string(), Value::String(self.id.clone()));
        Value::Object(map)
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
