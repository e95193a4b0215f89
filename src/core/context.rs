/// Per-request context
///
/// Created once per inbound call by the API layer, populated with request
/// data, then passed by mutable reference into every processor evaluation.
/// The fragment resolver is the only engine component that writes to it;
/// processors may use the request-scoped variable store.

use crate::core::value::DataContainer;
use crate::resource::types::ResourceMeta;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Key/value store for temporary variables shared between nodes of one request
pub trait VarStore: Send {
    fn get(&self, name: &str) -> Option<Value>;
    fn set(&mut self, name: &str, value: Value);
    /// Returns the removed value, if the variable existed
    fn delete(&mut self, name: &str) -> Option<Value>;
}

/// Default store: lives and dies with the request
#[derive(Debug, Default)]
pub struct MemoryVarStore {
    vars: HashMap<String, Value>,
}

impl VarStore for MemoryVarStore {
    fn get(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    fn delete(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }
}

pub struct RequestContext {
    /// Correlates log lines of one call
    pub request_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub app_id: String,
    pub method: String,
    /// Matched resource uri (e.g. "account/read")
    pub uri: String,
    /// Path segments following the resource uri
    pub args: Vec<String>,
    pub get_vars: HashMap<String, Value>,
    pub post_vars: HashMap<String, Value>,
    /// Bearer token from the Authorization header
    pub token: Option<String>,
    /// Requested output format (output processor machine name)
    pub out_format: String,
    /// Cache ttl of the matched resource, in seconds
    pub ttl: u64,
    /// Metadata sections of the matched resource
    pub meta: Option<Arc<ResourceMeta>>,
    /// Process result handed to output processors
    pub payload: Option<DataContainer>,
    fragments: HashMap<String, DataContainer>,
    fragments_resolved: bool,
    store: Box<dyn VarStore>,
}

impl RequestContext {
    pub fn new(app_id: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            started_at: Utc::now(),
            app_id: app_id.into(),
            method: method.into().to_lowercase(),
            uri: String::new(),
            args: Vec::new(),
            get_vars: HashMap::new(),
            post_vars: HashMap::new(),
            token: None,
            out_format: "json".to_string(),
            ttl: 0,
            meta: None,
            payload: None,
            fragments: HashMap::new(),
            fragments_resolved: false,
            store: Box::new(MemoryVarStore::default()),
        }
    }

    /// Swap in an external store (e.g. one backed by a session service)
    pub fn with_store(mut self, store: Box<dyn VarStore>) -> Self {
        self.store = store;
        self
    }

    pub fn fragment(&self, name: &str) -> Option<&DataContainer> {
        self.fragments.get(name)
    }

    /// True once the fragment resolver has run for this request
    pub fn fragments_resolved(&self) -> bool {
        self.fragments_resolved
    }

    pub(crate) fn insert_fragment(&mut self, name: String, value: DataContainer) {
        self.fragments.insert(name, value);
    }

    pub(crate) fn mark_fragments_resolved(&mut self) {
        self.fragments_resolved = true;
    }

    pub fn store(&self) -> &dyn VarStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn VarStore {
        self.store.as_mut()
    }

    /// GET and POST vars merged, POST winning on conflicts
    pub fn request_var(&self, key: &str) -> Option<&Value> {
        self.post_vars.get(key).or_else(|| self.get_vars.get(key))
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("app_id", &self.app_id)
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("args", &self.args)
            .field("out_format", &self.out_format)
            .field("fragments", &self.fragments.keys().collect::<Vec<_>>())
            .finish()
    }
}
