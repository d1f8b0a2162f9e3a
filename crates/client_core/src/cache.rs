//! Session-scoped resource cache.
//!
//! Entries are write-once per key and never evicted; the backing dataset is
//! immutable for the lifetime of a session, so correctness needs no
//! invalidation path. Deliberately unbounded — the dataset is small and the
//! map dies with the session.

use std::collections::HashMap;

use serde_json::Value;
use shared::domain::ModelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Keywords,
    Result,
}

/// Composite key addressing one cached JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ResourceKind,
    pub model: Option<ModelId>,
    pub base: String,
}

impl CacheKey {
    pub fn keywords(base: &str) -> Self {
        Self {
            kind: ResourceKind::Keywords,
            model: None,
            base: base.to_string(),
        }
    }

    pub fn result(model: &ModelId, base: &str) -> Self {
        Self {
            kind: ResourceKind::Result,
            model: Some(model.clone()),
            base: base.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: HashMap<CacheKey, Value>,
}

impl ResourceCache {
    pub fn get(&self, key: &CacheKey) -> Option<&Value> {
        self.entries.get(key)
    }

    /// First write wins; later inserts for the same key are ignored.
    pub fn insert(&mut self, key: CacheKey, value: Value) {
        self.entries.entry(key).or_insert(value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
