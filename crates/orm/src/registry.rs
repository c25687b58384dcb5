//! Model registry.
//!
//! The registry is built once from the set of [`ModelConfig`]s and is
//! read-only afterwards, so it can be shared between sessions behind an
//! `Arc`. It answers every "how does this object map to a resource"
//! question the graph builder and the session ask.

use crate::config::{ModelConfig, Related, RelationshipConfig, RelationshipTarget};
use crate::model::{model_addr, model_type, Model, ModelRef};
use crate::{OrmError, Result};
use docgraph_schema::{
    AttributeMap, Relationship, RelationshipMap, Resource, ResourceId, ResourceIdentifier,
};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
pub struct ModelRegistry {
    by_model: HashMap<TypeId, Arc<ModelConfig>>,
    by_resource_type: HashMap<String, TypeId>,
}

#[derive(Debug, Default)]
pub struct ModelRegistryBuilder {
    configs: Vec<ModelConfig>,
}

impl ModelRegistryBuilder {
    pub fn register(mut self, config: ModelConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// Validate and freeze the registry.
    ///
    /// Fails when a model or resource type is registered twice, when a model
    /// declares a field name twice, or when a typed relationship targets a
    /// model that is not registered.
    pub fn build(self) -> Result<ModelRegistry> {
        let mut by_model = HashMap::with_capacity(self.configs.len());
        let mut by_resource_type = HashMap::with_capacity(self.configs.len());

        for config in self.configs {
            if let Some(field) = config.duplicate_fields().first() {
                return Err(OrmError::DuplicateField {
                    model: config.type_name().to_string(),
                    field: field.clone(),
                });
            }
            if by_model.contains_key(&config.type_id()) {
                return Err(OrmError::DuplicateModel(config.type_name().to_string()));
            }
            if by_resource_type.contains_key(config.resource_type()) {
                return Err(OrmError::DuplicateResourceType(
                    config.resource_type().to_string(),
                ));
            }
            by_resource_type.insert(config.resource_type().to_string(), config.type_id());
            by_model.insert(config.type_id(), Arc::new(config));
        }

        for config in by_model.values() {
            for relationship in config.relationships() {
                if let RelationshipTarget::Model { type_id, type_name } =
                    relationship.target()
                {
                    if !by_model.contains_key(&type_id) {
                        return Err(OrmError::UnregisteredModel(type_name.to_string()));
                    }
                }
            }
        }

        Ok(ModelRegistry {
            by_model,
            by_resource_type,
        })
    }
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.by_model.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_model.is_empty()
    }

    pub fn is_registered<M: Model>(&self) -> bool {
        self.by_model.contains_key(&TypeId::of::<M>())
    }

    pub fn config_for<M: Model>(&self) -> Result<&ModelConfig> {
        self.by_model
            .get(&TypeId::of::<M>())
            .map(|c| c.as_ref())
            .ok_or_else(|| OrmError::UnregisteredModel(std::any::type_name::<M>().to_string()))
    }

    pub fn config_of(&self, model: &dyn Model) -> Result<&ModelConfig> {
        self.by_model
            .get(&model_type(model))
            .map(|c| c.as_ref())
            .ok_or_else(|| OrmError::UnregisteredModel(model.type_name().to_string()))
    }

    /// Configuration registered under a resource-type name.
    pub fn model_type_of(&self, resource_type: &str) -> Option<&ModelConfig> {
        self.by_resource_type
            .get(resource_type)
            .and_then(|type_id| self.by_model.get(type_id))
            .map(|c| c.as_ref())
    }

    /// Like [`Self::model_type_of`], but an unknown name is an error.
    pub fn config_for_resource_type(&self, resource_type: &str) -> Result<&ModelConfig> {
        self.model_type_of(resource_type)
            .ok_or_else(|| OrmError::UnregisteredModel(resource_type.to_string()))
    }

    pub fn resource_type_of<M: Model>(&self) -> Result<&str> {
        self.config_for::<M>().map(ModelConfig::resource_type)
    }

    pub fn resource_type_of_model(&self, model: &dyn Model) -> Result<&str> {
        self.config_of(model).map(ModelConfig::resource_type)
    }

    pub fn id_of(&self, model: &dyn Model) -> Option<ResourceId> {
        model.state().id().cloned()
    }

    /// Assign an id to a model that does not have one yet.
    pub fn set_id(&self, model: &dyn Model, id: ResourceId) -> Result<()> {
        model
            .state()
            .assign_id(id.clone())
            .map_err(|existing| OrmError::IdAlreadyAssigned {
                model: model.type_name().to_string(),
                existing,
                requested: id,
            })
    }

    /// The model's id, generating and storing a fresh one if it has none.
    /// Repeated calls return the same id.
    pub fn ensure_id(&self, model: &dyn Model) -> ResourceId {
        model.state().ensure_id().clone()
    }

    /// `{ id, type }` of a model, assigning an id if needed.
    pub fn identifier_of(&self, model: &dyn Model) -> Result<ResourceIdentifier> {
        let resource_type = self.resource_type_of_model(model)?;
        Ok(ResourceIdentifier::new(self.ensure_id(model), resource_type))
    }

    pub fn relationship_config(&self, model: &dyn Model, name: &str) -> Result<&RelationshipConfig> {
        let config = self.config_of(model)?;
        config
            .relationship(name)
            .ok_or_else(|| config.relationship_not_found(name))
    }

    pub fn attribute_bag_of(&self, model: &dyn Model) -> Result<Option<AttributeMap>> {
        self.config_of(model)?.read_attribute_bag(model)
    }

    /// Attribute values to send for a model.
    ///
    /// Starts from the attribute bag, then lays every non-null mapped
    /// attribute over it, so a mapped value wins over a bag entry of the
    /// same name.
    pub fn attributes_of(&self, model: &dyn Model) -> Result<AttributeMap> {
        let config = self.config_of(model)?;
        let mut attributes = config.read_attribute_bag(model)?.unwrap_or_default();
        for attribute in config.attributes() {
            if let Some(value) = attribute.read(model)? {
                attributes.insert(attribute.name().to_string(), value);
            }
        }
        Ok(attributes)
    }

    /// Relationship linkage for a model's current backing fields.
    ///
    /// Related objects without an id get one here. Unset relationships are
    /// omitted; an explicitly empty to-many relationship is sent as `[]`.
    pub fn relationships_of(&self, model: &dyn Model) -> Result<RelationshipMap> {
        let config = self.config_of(model)?;
        let mut relationships = RelationshipMap::new();
        for relationship in config.relationships() {
            let linkage = match relationship.read(model)? {
                Related::One(Some(related)) => Relationship::one(self.identifier_of(&*related)?),
                Related::Many(Some(items)) => Relationship::many(
                    items
                        .iter()
                        .map(|related| self.identifier_of(&**related))
                        .collect::<Result<Vec<_>>>()?,
                ),
                Related::One(None) | Related::Many(None) => continue,
            };
            relationships.insert(relationship.name().to_string(), linkage);
        }
        Ok(relationships)
    }

    /// Objects reachable from `root` through relationships that are not yet
    /// managed by a session, each listed once, in discovery order.
    ///
    /// The root itself is never part of the result. Managed objects are
    /// neither listed nor traversed. Cycles terminate through a visited set
    /// keyed by object identity.
    pub fn included_models_of(&self, root: &dyn Model) -> Result<Vec<ModelRef>> {
        let mut visited = HashSet::from([model_addr(root)]);
        let mut included = Vec::new();
        let mut pending = self.related_models(root)?;
        pending.reverse();

        while let Some(model) = pending.pop() {
            if !visited.insert(model_addr(&*model)) {
                continue;
            }
            if model.state().is_managed() {
                trace!("skipping managed {:?} while collecting includes", model.state().id());
                continue;
            }
            let mut next = self.related_models(&*model)?;
            next.reverse();
            pending.extend(next);
            included.push(model);
        }

        Ok(included)
    }

    fn related_models(&self, model: &dyn Model) -> Result<Vec<ModelRef>> {
        let config = self.config_of(model)?;
        let mut related = Vec::new();
        for relationship in config.relationships() {
            match relationship.read(model)? {
                Related::One(Some(item)) => related.push(item),
                Related::Many(Some(items)) => related.extend(items),
                Related::One(None) | Related::Many(None) => {}
            }
        }
        Ok(related)
    }

    /// Full resource representation of an object's backing fields.
    pub fn resource_of(&self, model: &dyn Model) -> Result<Resource> {
        let resource_type = self.resource_type_of_model(model)?;
        Ok(Resource::new(self.ensure_id(model), resource_type)
            .with_attributes(self.attributes_of(model)?)
            .with_relationships(self.relationships_of(model)?))
    }

    /// A fresh, unmanaged instance for `resource`, carrying its id. The
    /// backing fields stay empty; a managed instance reads through the
    /// session.
    pub(crate) fn rehydrate(&self, resource: &Resource) -> Result<ModelRef> {
        let config = self.config_for_resource_type(&resource.resource_type)?;
        let model = config.instantiate();
        self.set_id(&*model, resource.id.clone())?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attribute, AttributeBag, HasMany, HasOne, ModelState};
    use crate::ModelConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Team {
        state: ModelState,
        name: Attribute<String>,
        lead: HasOne<Member>,
        members: HasMany<Member>,
        extra: AttributeBag,
    }

    #[derive(Debug, Default)]
    struct Member {
        state: ModelState,
        name: Attribute<String>,
        team: HasOne<Team>,
    }

    impl Model for Team {
        fn state(&self) -> &ModelState {
            &self.state
        }
    }

    impl Model for Member {
        fn state(&self) -> &ModelState {
            &self.state
        }
    }

    fn team_config() -> ModelConfig {
        ModelConfig::builder::<Team>("team")
            .attribute("name", |t| &t.name)
            .has_one("lead", |t| &t.lead)
            .has_many("members", |t| &t.members)
            .attribute_bag(|t| &t.extra)
            .build()
    }

    fn member_config() -> ModelConfig {
        ModelConfig::builder::<Member>("member")
            .attribute("name", |m| &m.name)
            .has_one("team", |m| &m.team)
            .build()
    }

    fn registry() -> ModelRegistry {
        ModelRegistry::builder()
            .register(team_config())
            .register(member_config())
            .build()
            .unwrap()
    }

    #[test]
    fn lookups_by_type_and_name() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resource_type_of::<Team>().unwrap(), "team");
        assert_eq!(
            registry.model_type_of("member").unwrap().type_id(),
            TypeId::of::<Member>()
        );
        assert!(registry.model_type_of("robot").is_none());
        assert!(matches!(
            registry.config_for_resource_type("robot"),
            Err(OrmError::UnregisteredModel(_))
        ));
    }

    #[test]
    fn duplicate_registrations_fail() {
        let err = ModelRegistry::builder()
            .register(team_config())
            .register(member_config())
            .register(team_config())
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::DuplicateModel(_)));

        let err = ModelRegistry::builder()
            .register(team_config())
            .register(ModelConfig::builder::<Member>("team").build())
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::DuplicateResourceType(name) if name == "team"));
    }

    #[test]
    fn unregistered_relationship_target_fails() {
        let err = ModelRegistry::builder()
            .register(team_config())
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::UnregisteredModel(_)));
    }

    #[test]
    fn set_id_is_write_once() {
        let registry = registry();
        let team = Team::default();
        registry.set_id(&team, ResourceId::new("t1")).unwrap();
        registry.set_id(&team, ResourceId::new("t1")).unwrap();
        let err = registry.set_id(&team, ResourceId::new("t2")).unwrap_err();
        assert!(matches!(err, OrmError::IdAlreadyAssigned { .. }));
        assert_eq!(registry.id_of(&team), Some(ResourceId::new("t1")));
    }

    #[test]
    fn mapped_attributes_override_bag() {
        let registry = registry();
        let team = Team::default();
        team.name.set(Some("x".to_string()));
        let mut bag = AttributeMap::new();
        bag.insert("name".into(), json!("y"));
        bag.insert("extra".into(), json!(1));
        team.extra.set(Some(bag));

        let attributes = registry.attributes_of(&team).unwrap();
        assert_eq!(json!(attributes), json!({"name": "x", "extra": 1}));
    }

    #[test]
    fn relationships_assign_ids_lazily() {
        let registry = registry();
        let team = Team::default();
        let lead = Arc::new(Member::default());
        team.lead.set(Some(lead.clone()));
        team.members.set(Some(Vec::new()));

        let relationships = registry.relationships_of(&team).unwrap();
        let lead_id = lead.state().id().cloned().unwrap();
        assert_eq!(
            relationships["lead"].as_one().unwrap(),
            &ResourceIdentifier::new(lead_id.clone(), "member")
        );
        assert!(relationships["members"].as_many().unwrap().is_empty());

        // Second pass reuses the assigned id.
        let again = registry.relationships_of(&team).unwrap();
        assert_eq!(again["lead"].as_one().unwrap().id, lead_id);
    }

    #[test]
    fn unset_relationships_are_omitted() {
        let registry = registry();
        let relationships = registry.relationships_of(&Team::default()).unwrap();
        assert!(relationships.is_empty());
    }

    #[test]
    fn included_models_terminate_on_cycles() {
        let registry = registry();
        let team = Arc::new(Team::default());
        let member = Arc::new(Member::default());
        team.lead.set(Some(member.clone()));
        team.members.set(Some(vec![member.clone()]));
        member.team.set(Some(team.clone()));

        let included = registry.included_models_of(&*team).unwrap();
        assert_eq!(included.len(), 1);
        assert_eq!(model_addr(&*included[0]), model_addr(&*member));
    }

    #[test]
    fn rehydrate_builds_fresh_instances() {
        let registry = registry();
        let resource = Resource::new(ResourceId::new("m1"), "member");
        let model = registry.rehydrate(&resource).unwrap();
        assert_eq!(model.state().id(), Some(&ResourceId::new("m1")));
        assert!(!model.state().is_managed());

        let unknown = Resource::new(ResourceId::new("r1"), "robot");
        assert!(registry.rehydrate(&unknown).is_err());
    }
}
