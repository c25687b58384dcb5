use crate::{Resource, ResourceId};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The primary `data` member of a document.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PrimaryData {
    #[default]
    Null,
    Single(Resource),
    Collection(Vec<Resource>),
}

impl Serialize for PrimaryData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            PrimaryData::Null => serializer.serialize_none(),
            PrimaryData::Single(resource) => resource.serialize(serializer),
            PrimaryData::Collection(resources) => resources.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PrimaryData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(PrimaryData::Null),
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<Resource>, _>>()
                .map(PrimaryData::Collection)
                .map_err(D::Error::custom),
            object @ Value::Object(_) => serde_json::from_value(object)
                .map(PrimaryData::Single)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "primary data must be an object, an array or null, got {}",
                other
            ))),
        }
    }
}

/// A request or response body: `{ "data": ..., "included": [...] }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceDocument {
    #[serde(default)]
    pub data: PrimaryData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<Resource>>,
}

impl ResourceDocument {
    pub fn single(resource: Resource) -> Self {
        Self {
            data: PrimaryData::Single(resource),
            included: None,
        }
    }

    pub fn collection(resources: Vec<Resource>) -> Self {
        Self {
            data: PrimaryData::Collection(resources),
            included: None,
        }
    }

    pub fn with_included(mut self, included: Vec<Resource>) -> Self {
        self.included = Some(included);
        self
    }

    /// The primary resource when `data` is a single object.
    pub fn primary(&self) -> Option<&Resource> {
        match &self.data {
            PrimaryData::Single(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn included(&self) -> &[Resource] {
        self.included.as_deref().unwrap_or_default()
    }

    /// Find any resource in the document, primary or included, by id.
    pub fn find(&self, id: &ResourceId) -> Option<&Resource> {
        let primary: &[Resource] = match &self.data {
            PrimaryData::Null => &[],
            PrimaryData::Single(resource) => std::slice::from_ref(resource),
            PrimaryData::Collection(resources) => resources,
        };
        primary
            .iter()
            .chain(self.included())
            .find(|resource| &resource.id == id)
    }

    /// Split into primary resources followed by included ones.
    pub fn into_parts(self) -> (Vec<Resource>, Vec<Resource>) {
        let primary = match self.data {
            PrimaryData::Null => Vec::new(),
            PrimaryData::Single(resource) => vec![resource],
            PrimaryData::Collection(resources) => resources,
        };
        (primary, self.included.unwrap_or_default())
    }

    /// Every resource in the document, primary data first.
    pub fn into_resources(self) -> Vec<Resource> {
        let (mut primary, included) = self.into_parts();
        primary.extend(included);
        primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn create_body_shape() {
        let root = Resource::new(ResourceId::new("r"), "person");
        let included = Resource::new(ResourceId::new("c"), "company");
        let doc = ResourceDocument::single(root).with_included(vec![included]);

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "data": { "id": "r", "type": "person" },
                "included": [ { "id": "c", "type": "company" } ]
            })
        );
    }

    #[test]
    fn parses_collection_and_null_data() {
        let doc: ResourceDocument = serde_json::from_value(json!({
            "data": [ { "id": "a", "type": "dog" }, { "id": "b", "type": "dog" } ]
        }))
        .unwrap();
        assert_eq!(doc.clone().into_resources().len(), 2);
        assert!(doc.primary().is_none());

        let empty: ResourceDocument = serde_json::from_value(json!({ "data": null })).unwrap();
        assert_eq!(empty.data, PrimaryData::Null);
        assert!(empty.into_resources().is_empty());
    }

    #[test]
    fn rejects_scalar_primary_data() {
        let result = serde_json::from_value::<ResourceDocument>(json!({ "data": 5 }));
        assert!(result.is_err());
    }

    #[test]
    fn find_searches_included() {
        let doc = ResourceDocument::single(Resource::new(ResourceId::new("r"), "person"))
            .with_included(vec![Resource::new(ResourceId::new("c"), "company")]);
        assert_eq!(
            doc.find(&ResourceId::new("c")).map(|r| r.resource_type.as_str()),
            Some("company")
        );
        assert!(doc.find(&ResourceId::new("zzz")).is_none());
    }
}
