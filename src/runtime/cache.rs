/// Process result cache
///
/// Results of the process section are kept per call path for the matched
/// resource's ttl. Expired entries are evicted when read and on every insert.

use crate::core::DataContainer;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Longer ttls are clamped (ten years)
const MAX_TTL_SECS: u64 = 315_360_000;

#[derive(Debug)]
struct CacheEntry {
    value: DataContainer,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for one call: `<method>_<path>`
    pub fn key(method: &str, path: &str) -> String {
        format!("{}_{}", method.to_lowercase(), path.trim_matches('/'))
    }

    pub fn get(&self, key: &str) -> Option<DataContainer> {
        self.get_at(key, Utc::now())
    }

    pub fn put(&self, key: String, value: DataContainer, ttl: u64) {
        self.put_at(key, value, ttl, Utc::now());
    }

    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<DataContainer> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                tracing::debug!("💾 Cache hit: {}", key);
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put_at(&self, key: String, value: DataContainer, ttl: u64, now: DateTime<Utc>) {
        if ttl == 0 {
            return;
        }
        let ttl = Duration::seconds(ttl.min(MAX_TTL_SECS) as i64);
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.retain(|_, entry| entry.expires_at > now);
        tracing::debug!("💾 Caching {} for {}s", key, ttl.num_seconds());
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
