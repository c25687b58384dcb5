//! Per-session identity map.
//!
//! Each entry pairs the one in-memory instance that represents a resource
//! with the last server-confirmed snapshot of that resource. Lookups hand
//! out clones of the `Arc`, so every caller sees the same instance.

use crate::model::ModelRef;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use docgraph_schema::{Relationship, Resource, ResourceId};
use serde_json::Value;
use std::fmt;

struct CacheEntry {
    model: ModelRef,
    resource: Resource,
}

#[derive(Default)]
pub struct IdentityMap {
    entries: DashMap<ResourceId, CacheEntry>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &ResourceId) -> Option<ModelRef> {
        self.entries.get(id).map(|entry| entry.model.clone())
    }

    /// Last confirmed state of the resource.
    pub fn snapshot(&self, id: &ResourceId) -> Option<Resource> {
        self.entries.get(id).map(|entry| entry.resource.clone())
    }

    pub fn attribute(&self, id: &ResourceId, name: &str) -> Option<Value> {
        self.entries
            .get(id)
            .and_then(|entry| entry.resource.attribute(name).cloned())
    }

    pub fn relationship(&self, id: &ResourceId, name: &str) -> Option<Relationship> {
        self.entries
            .get(id)
            .and_then(|entry| entry.resource.relationship(name).cloned())
    }

    /// Insert a model unless the id is already cached.
    ///
    /// The first writer wins: when two fetches of the same id race, both
    /// callers get back the instance that was inserted first.
    pub fn insert(&self, model: ModelRef, resource: Resource) -> ModelRef {
        match self.entries.entry(resource.id.clone()) {
            Entry::Occupied(entry) => entry.get().model.clone(),
            Entry::Vacant(entry) => {
                entry.insert(CacheEntry {
                    model: model.clone(),
                    resource,
                });
                model
            }
        }
    }

    /// Apply a confirmed patch to the cached snapshot.
    pub fn merge(&self, id: &ResourceId, patch: &Resource) -> bool {
        match self.entries.get_mut(id) {
            Some(mut entry) => {
                entry.resource.merge(patch);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &ResourceId) -> Option<ModelRef> {
        self.entries.remove(id).map(|(_, entry)| entry.model)
    }

    /// Empty the map, returning the instances it held.
    pub fn drain(&self) -> Vec<ModelRef> {
        let ids: Vec<ResourceId> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    pub fn ids(&self) -> Vec<ResourceId> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl fmt::Debug for IdentityMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityMap")
            .field("len", &self.entries.len())
            .finish()
    }
}
