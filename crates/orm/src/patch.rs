//! Pending, unsaved changes to managed objects.

use dashmap::DashMap;
use docgraph_schema::{AttributeMap, Relationship, RelationshipMap, Resource, ResourceId};
use serde_json::Value;

/// Changes to one managed object that have not been sent yet. Entries here
/// shadow the cached snapshot on reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchOverlay {
    attributes: AttributeMap,
    relationships: RelationshipMap,
}

impl PatchOverlay {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.relationships.is_empty()
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn relationships(&self) -> &RelationshipMap {
        &self.relationships
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.get(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    pub fn set_relationship(&mut self, name: impl Into<String>, relationship: Relationship) {
        self.relationships.insert(name.into(), relationship);
    }

    /// The overlay as a partial resource, suitable for an update request.
    pub fn to_resource(&self, id: ResourceId, resource_type: impl Into<String>) -> Resource {
        Resource::new(id, resource_type)
            .with_attributes(self.attributes.clone())
            .with_relationships(self.relationships.clone())
    }

    /// Drop entries that were sent and have not changed since.
    fn acknowledge(&mut self, sent: &PatchOverlay) {
        self.attributes
            .retain(|name, value| sent.attributes.get(name) != Some(value));
        self.relationships
            .retain(|name, value| sent.relationships.get(name) != Some(value));
    }
}

/// Overlays of every dirty object in a session, keyed by id.
#[derive(Debug, Default)]
pub struct PatchStore {
    overlays: DashMap<ResourceId, PatchOverlay>,
}

impl PatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn get(&self, id: &ResourceId) -> Option<PatchOverlay> {
        self.overlays.get(id).map(|overlay| overlay.clone())
    }

    pub fn is_dirty(&self, id: &ResourceId) -> bool {
        self.overlays
            .get(id)
            .map(|overlay| !overlay.is_empty())
            .unwrap_or(false)
    }

    pub fn attribute(&self, id: &ResourceId, name: &str) -> Option<Value> {
        self.overlays
            .get(id)
            .and_then(|overlay| overlay.attribute(name).cloned())
    }

    pub fn relationship(&self, id: &ResourceId, name: &str) -> Option<Relationship> {
        self.overlays
            .get(id)
            .and_then(|overlay| overlay.relationship(name).cloned())
    }

    pub fn set_attribute(&self, id: &ResourceId, name: &str, value: Value) {
        self.overlays
            .entry(id.clone())
            .or_default()
            .set_attribute(name, value);
    }

    pub fn set_relationship(&self, id: &ResourceId, name: &str, relationship: Relationship) {
        self.overlays
            .entry(id.clone())
            .or_default()
            .set_relationship(name, relationship);
    }

    /// Forget the parts of an overlay that the server has confirmed. Writes
    /// made while the update was in flight stay pending.
    pub fn acknowledge(&self, id: &ResourceId, sent: &PatchOverlay) {
        self.overlays.remove_if_mut(id, |_, overlay| {
            overlay.acknowledge(sent);
            overlay.is_empty()
        });
    }

    pub fn discard(&self, id: &ResourceId) -> Option<PatchOverlay> {
        self.overlays.remove(id).map(|(_, overlay)| overlay)
    }

    pub fn clear(&self) {
        self.overlays.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_schema::ResourceIdentifier;
    use serde_json::json;

    #[test]
    fn writes_accumulate_per_id() {
        let store = PatchStore::new();
        let id = ResourceId::new("p1");
        assert!(!store.is_dirty(&id));

        store.set_attribute(&id, "name", json!("a"));
        store.set_attribute(&id, "name", json!("b"));
        store.set_relationship(&id, "employer", Relationship::null());

        let overlay = store.get(&id).unwrap();
        assert_eq!(overlay.attribute("name"), Some(&json!("b")));
        assert!(overlay.relationship("employer").unwrap().is_null());
        assert!(store.is_dirty(&id));
    }

    #[test]
    fn acknowledge_keeps_newer_writes() {
        let store = PatchStore::new();
        let id = ResourceId::new("p1");
        store.set_attribute(&id, "name", json!("a"));
        store.set_attribute(&id, "age", json!(3));
        let sent = store.get(&id).unwrap();

        store.set_attribute(&id, "name", json!("b"));
        store.acknowledge(&id, &sent);

        let left = store.get(&id).unwrap();
        assert_eq!(left.attribute("name"), Some(&json!("b")));
        assert_eq!(left.attribute("age"), None);
    }

    #[test]
    fn acknowledge_removes_settled_overlay() {
        let store = PatchStore::new();
        let id = ResourceId::new("p1");
        store.set_relationship(
            &id,
            "employer",
            Relationship::one(ResourceIdentifier::new(ResourceId::new("c1"), "company")),
        );
        let sent = store.get(&id).unwrap();
        store.acknowledge(&id, &sent);
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn overlay_to_resource() {
        let mut overlay = PatchOverlay::default();
        overlay.set_attribute("name", json!("x"));
        let resource = overlay.to_resource(ResourceId::new("p1"), "person");
        assert_eq!(resource.resource_type, "person");
        assert_eq!(resource.attribute("name"), Some(&json!("x")));
        assert!(resource.relationships.is_empty());
    }
}
