/// Processor registry
///
/// Maps machine names to processor factories across the four namespaces a
/// resource tree can draw from. Built once at startup and shared read-only
/// (behind an `Arc`) by the evaluator, the validator and every request.

use crate::core::{ApiError, ApiResult};
use crate::processor::contract::{Processor, ProcessorContract};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Logical namespace a processor is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Security,
    Output,
    Processor,
    Endpoint,
}

impl Namespace {
    /// Order in which bare machine names are resolved; first match wins
    pub const PROBE_ORDER: [Namespace; 4] = [
        Namespace::Security,
        Namespace::Output,
        Namespace::Processor,
        Namespace::Endpoint,
    ];
}

pub type ProcessorFactory = Arc<dyn Fn() -> Box<dyn Processor> + Send + Sync>;

#[derive(Clone)]
struct RegistryEntry {
    contract: Arc<ProcessorContract>,
    factory: ProcessorFactory,
}

/// A resolved registry entry
pub struct ResolvedProcessor {
    pub namespace: Namespace,
    pub contract: Arc<ProcessorContract>,
    factory: ProcessorFactory,
}

impl ResolvedProcessor {
    /// Construct a fresh processor instance for one node
    pub fn instantiate(&self) -> Box<dyn Processor> {
        (self.factory)()
    }
}

#[derive(Default)]
pub struct ProcessorRegistry {
    namespaces: HashMap<Namespace, HashMap<String, RegistryEntry>>,
}

impl ProcessorRegistry {
    /// Empty registry (tests register their own stubs)
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with every built-in processor
    pub fn with_builtins() -> ApiResult<Self> {
        let mut registry = Self::new();
        crate::processor::builtin::register_all(&mut registry)?;
        tracing::info!("🧩 Processor registry initialized with {} processors", registry.len());
        Ok(registry)
    }

    /// Register a processor factory; the contract is read from one instance
    pub fn register<F>(&mut self, namespace: Namespace, factory: F) -> ApiResult<()>
    where
        F: Fn() -> Box<dyn Processor> + Send + Sync + 'static,
    {
        let contract = factory().contract();
        contract
            .check()
            .map_err(|message| ApiError::malformed(message, None))?;

        let machine_name = contract.machine_name.clone();
        let entries = self.namespaces.entry(namespace).or_default();
        if entries.contains_key(&machine_name) {
            return Err(ApiError::malformed(
                format!("processor {} registered twice in {:?}", machine_name, namespace),
                None,
            ));
        }

        tracing::debug!("  ➕ Registered processor: '{}' ({:?})", machine_name, namespace);
        entries.insert(
            machine_name,
            RegistryEntry {
                contract: Arc::new(contract),
                factory: Arc::new(factory),
            },
        );
        Ok(())
    }

    /// Register a stateless processor type
    pub fn register_default<P>(&mut self, namespace: Namespace) -> ApiResult<()>
    where
        P: Processor + Default + 'static,
    {
        self.register(namespace, || Box::new(P::default()) as Box<dyn Processor>)
    }

    /// Resolve a machine name by probing the namespaces in order
    pub fn resolve(&self, machine_name: &str) -> ApiResult<ResolvedProcessor> {
        Namespace::PROBE_ORDER
            .iter()
            .find_map(|namespace| self.lookup(*namespace, machine_name))
            .ok_or_else(|| ApiError::UnknownProcessor {
                name: machine_name.to_string(),
                id: None,
            })
    }

    /// Resolve a machine name within one namespace only
    pub fn resolve_in(&self, namespace: Namespace, machine_name: &str) -> ApiResult<ResolvedProcessor> {
        self.lookup(namespace, machine_name)
            .ok_or_else(|| ApiError::UnknownProcessor {
                name: machine_name.to_string(),
                id: None,
            })
    }

    pub fn contract(&self, machine_name: &str) -> ApiResult<Arc<ProcessorContract>> {
        self.resolve(machine_name).map(|resolved| resolved.contract)
    }

    /// Every contract with its namespace, sorted by machine name
    pub fn contracts(&self) -> Vec<(Namespace, Arc<ProcessorContract>)> {
        let mut all: Vec<(Namespace, Arc<ProcessorContract>)> = self
            .namespaces
            .iter()
            .flat_map(|(namespace, entries)| {
                entries
                    .values()
                    .map(move |entry| (*namespace, Arc::clone(&entry.contract)))
            })
            .collect();
        all.sort_by(|a, b| a.1.machine_name.cmp(&b.1.machine_name));
        all
    }

    pub fn len(&self) -> usize {
        self.namespaces.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, namespace: Namespace, machine_name: &str) -> Option<ResolvedProcessor> {
        let entry = self.namespaces.get(&namespace)?.get(machine_name.trim())?;
        Some(ResolvedProcessor {
            namespace,
            contract: Arc::clone(&entry.contract),
            factory: Arc::clone(&entry.factory),
        })
    }
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.namespaces.values().flat_map(HashMap::keys).collect();
        names.sort();
        f.debug_struct("ProcessorRegistry").field("processors", &names).finish()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
