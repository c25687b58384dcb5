use crate::ResourceId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attribute values of a resource, keyed by attribute name.
pub type AttributeMap = Map<String, Value>;

/// Relationship values of a resource, keyed by relationship name.
pub type RelationshipMap = BTreeMap<String, Relationship>;

/// The `{ "id", "type" }` pair addressing a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub id: ResourceId,
    #[serde(rename = "type")]
    pub resource_type: String,
}

impl ResourceIdentifier {
    pub fn new(id: ResourceId, resource_type: impl Into<String>) -> Self {
        Self {
            id,
            resource_type: resource_type.into(),
        }
    }
}

/// Linkage carried by a non-null relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    /// To-one linkage.
    One(ResourceIdentifier),
    /// To-many linkage. An empty vector is an explicitly empty collection.
    Many(Vec<ResourceIdentifier>),
}

/// A relationship entry: `{ "data": <identifier> | [<identifier>...] | null }`.
///
/// `data: None` is sent as an explicit `null`, which instructs the backend to
/// clear the relationship. It is distinct from the relationship being absent
/// from a resource altogether.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<RelationshipData>,
}

impl Relationship {
    pub fn null() -> Self {
        Self { data: None }
    }

    pub fn one(identifier: ResourceIdentifier) -> Self {
        Self {
            data: Some(RelationshipData::One(identifier)),
        }
    }

    pub fn many(identifiers: Vec<ResourceIdentifier>) -> Self {
        Self {
            data: Some(RelationshipData::Many(identifiers)),
        }
    }

    pub fn is_null(&self) -> bool {
        self.data.is_none()
    }

    /// The to-one identifier, if this relationship carries one.
    pub fn as_one(&self) -> Option<&ResourceIdentifier> {
        match &self.data {
            Some(RelationshipData::One(identifier)) => Some(identifier),
            _ => None,
        }
    }

    /// The to-many identifiers, if this relationship carries a collection.
    pub fn as_many(&self) -> Option<&[ResourceIdentifier]> {
        match &self.data {
            Some(RelationshipData::Many(identifiers)) => Some(identifiers),
            _ => None,
        }
    }
}

/// One addressable entity on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub attributes: AttributeMap,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub relationships: RelationshipMap,
}

impl Resource {
    /// A minimal resource carrying only its identity.
    pub fn new(id: ResourceId, resource_type: impl Into<String>) -> Self {
        Self {
            id,
            resource_type: resource_type.into(),
            attributes: AttributeMap::new(),
            relationships: RelationshipMap::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: AttributeMap) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_relationships(mut self, relationships: RelationshipMap) -> Self {
        self.relationships = relationships;
        self
    }

    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(self.id.clone(), self.resource_type.clone())
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.get(name)
    }

    /// Apply a partial resource on top of this one.
    ///
    /// Attribute keys present in `patch` overwrite ours (an explicit `null`
    /// overwrites too). Relationships are replaced whole by name; a to-many
    /// entry in `patch` replaces the entire collection.
    pub fn merge(&mut self, patch: &Resource) {
        for (name, value) in &patch.attributes {
            self.attributes.insert(name.clone(), value.clone());
        }
        for (name, relationship) in &patch.relationships {
            self.relationships.insert(name.clone(), relationship.clone());
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
