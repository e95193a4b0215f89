/// Hot-reload resource registry using ArcSwap
///
/// Every change swaps in a new snapshot of all resources plus the route
/// index, so lookups are lock-free and in-flight calls keep the snapshot
/// they started with.

use crate::resource::storage::ResourceStorage;
use crate::resource::types::{normalize_uri, Resource};
use anyhow::Result;
use arc_swap::ArcSwap;
use std::{collections::HashMap, sync::Arc};

/// Immutable view of all active resources
#[derive(Debug, Default, Clone)]
struct Snapshot {
    resources: HashMap<String, Arc<Resource>>,
    /// (appid, method) -> [(uri, resource id)], longest uri first
    routes: HashMap<(String, String), Vec<(String, String)>>,
}

impl Snapshot {
    fn build(resources: HashMap<String, Arc<Resource>>) -> Self {
        let mut routes: HashMap<(String, String), Vec<(String, String)>> = HashMap::new();
        for resource in resources.values() {
            routes
                .entry((resource.appid.clone(), resource.method.clone()))
                .or_default()
                .push((resource.uri.clone(), resource.id.clone()));
        }
        for candidates in routes.values_mut() {
            candidates.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        }
        Self { resources, routes }
    }
}

/// A resource matched to an inbound call
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub resource: Arc<Resource>,
    /// Path segments following the resource uri
    pub args: Vec<String>,
}

#[derive(Debug)]
pub struct ResourceRegistry {
    snapshot: ArcSwap<Snapshot>,
    storage: ResourceStorage,
}

impl ResourceRegistry {
    pub fn new(storage: ResourceStorage) -> Self {
        Self {
            snapshot: ArcSwap::new(Arc::new(Snapshot::default())),
            storage,
        }
    }

    /// Load every stored resource; called once at startup
    pub async fn init_from_storage(&self) -> Result<()> {
        let stored = self.storage.load_all_resources().await?;
        let resources = stored
            .into_iter()
            .map(|(id, resource)| (id, Arc::new(resource)))
            .collect();
        self.snapshot.store(Arc::new(Snapshot::build(resources)));

        tracing::info!("📊 Initialized resource registry with {} resources", self.len());
        Ok(())
    }

    /// Re-read one resource from storage and swap it in
    pub async fn reload_resource(&self, id: &str) -> Result<()> {
        let resource = self
            .storage
            .get_resource(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Resource not found: {}", id))?;

        let mut resources = self.snapshot.load().resources.clone();
        resources.insert(id.to_string(), Arc::new(resource));
        self.snapshot.store(Arc::new(Snapshot::build(resources)));

        tracing::info!("🔥 Hot-reloaded resource: {}", id);
        Ok(())
    }

    pub fn remove_resource(&self, id: &str) {
        let mut resources = self.snapshot.load().resources.clone();
        if resources.remove(id).is_some() {
            self.snapshot.store(Arc::new(Snapshot::build(resources)));
            tracing::info!("Removed resource from registry: {}", id);
        }
    }

    pub fn get_resource(&self, id: &str) -> Option<Arc<Resource>> {
        self.snapshot.load().resources.get(id).cloned()
    }

    /// Match a call path to the resource with the longest uri prefix
    ///
    /// The prefix must end on a segment boundary; the remaining segments
    /// become the call's URI arguments (case preserved).
    pub fn resolve(&self, appid: &str, method: &str, path: &str) -> Option<RouteMatch> {
        let snapshot = self.snapshot.load();
        let candidates = snapshot
            .routes
            .get(&(appid.to_string(), method.to_lowercase()))?;

        let trimmed = path.trim().trim_matches('/');
        let normalized = normalize_uri(trimmed);

        for (uri, id) in candidates {
            let rest = if uri.is_empty() {
                Some(trimmed)
            } else if normalized == *uri {
                Some("")
            } else if normalized.starts_with(uri.as_str())
                && normalized.get(uri.len()..).is_some_and(|rest| rest.starts_with('/'))
            {
                trimmed.get(uri.len() + 1..)
            } else {
                None
            };

            if let Some(rest) = rest {
                let resource = snapshot.resources.get(id)?;
                let args = rest
                    .split('/')
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect();
                return Some(RouteMatch {
                    resource: Arc::clone(resource),
                    args,
                });
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
