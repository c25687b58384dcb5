//! Per-model mapping configuration.
//!
//! A [`ModelConfig`] tells the registry how one model type maps onto a
//! resource: its resource-type name, which fields are attributes, which are
//! relationships, and where unmapped attributes are kept. Accessors are
//! plain function pointers into the model's backing fields; the builder
//! wraps them into type-erased readers over `&dyn Model`.

use crate::model::{
    Attribute, AttributeBag, HasMany, HasOne, Model, ModelRef, PolymorphicHasOne,
};
use crate::{OrmError, Result};
use docgraph_schema::AttributeMap;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type AttributeReader = Arc<dyn Fn(&dyn Model) -> Result<Option<Value>> + Send + Sync>;
type RelationshipReader = Arc<dyn Fn(&dyn Model) -> Result<Related> + Send + Sync>;
type BagReader = Arc<dyn Fn(&dyn Model) -> Result<Option<AttributeMap>> + Send + Sync>;
type Factory = Arc<dyn Fn() -> ModelRef + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// What a relationship may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipTarget {
    Model {
        type_id: TypeId,
        type_name: &'static str,
    },
    /// Any registered model.
    Polymorphic,
}

impl RelationshipTarget {
    fn of<T: Model>() -> Self {
        Self::Model {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn accepts(&self, type_id: TypeId) -> bool {
        match self {
            Self::Model { type_id: target, .. } => *target == type_id,
            Self::Polymorphic => true,
        }
    }
}

/// Current in-memory value of a relationship backing field.
pub(crate) enum Related {
    One(Option<ModelRef>),
    /// `None` when the collection was never set.
    Many(Option<Vec<ModelRef>>),
}

pub struct AttributeConfig {
    name: String,
    read: AttributeReader,
}

impl AttributeConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serialized backing-field value; `None` when unset or null.
    pub(crate) fn read(&self, model: &dyn Model) -> Result<Option<Value>> {
        (self.read)(model)
    }
}

pub struct RelationshipConfig {
    name: String,
    cardinality: Cardinality,
    target: RelationshipTarget,
    read: RelationshipReader,
}

impl RelationshipConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn target(&self) -> RelationshipTarget {
        self.target
    }

    pub(crate) fn read(&self, model: &dyn Model) -> Result<Related> {
        (self.read)(model)
    }
}

/// Mapping of one model type onto one resource type.
pub struct ModelConfig {
    type_id: TypeId,
    type_name: &'static str,
    resource_type: String,
    attributes: IndexMap<String, AttributeConfig>,
    relationships: IndexMap<String, RelationshipConfig>,
    attribute_bag: Option<BagReader>,
    factory: Factory,
    duplicate_fields: Vec<String>,
}

impl ModelConfig {
    /// Start configuring model `M`, mapped to `resource_type`.
    pub fn builder<M: Model + Default>(resource_type: impl Into<String>) -> ModelConfigBuilder<M> {
        ModelConfigBuilder {
            config: ModelConfig {
                type_id: TypeId::of::<M>(),
                type_name: std::any::type_name::<M>(),
                resource_type: resource_type.into(),
                attributes: IndexMap::new(),
                relationships: IndexMap::new(),
                attribute_bag: None,
                factory: Arc::new(|| Arc::new(M::default()) as ModelRef),
                duplicate_fields: Vec::new(),
            },
            _model: PhantomData,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeConfig> {
        self.attributes.values()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeConfig> {
        self.attributes.get(name)
    }

    pub fn is_mapped_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn relationships(&self) -> impl Iterator<Item = &RelationshipConfig> {
        self.relationships.values()
    }

    pub fn relationship(&self, name: &str) -> Option<&RelationshipConfig> {
        self.relationships.get(name)
    }

    pub fn has_attribute_bag(&self) -> bool {
        self.attribute_bag.is_some()
    }

    pub(crate) fn read_attribute_bag(&self, model: &dyn Model) -> Result<Option<AttributeMap>> {
        match &self.attribute_bag {
            Some(read) => read(model),
            None => Ok(None),
        }
    }

    /// A fresh, unmanaged, empty instance of the model.
    pub(crate) fn instantiate(&self) -> ModelRef {
        (self.factory)()
    }

    pub(crate) fn duplicate_fields(&self) -> &[String] {
        &self.duplicate_fields
    }

    pub(crate) fn attribute_not_found(&self, name: &str) -> OrmError {
        OrmError::AttributeNotFound {
            model: self.type_name.to_string(),
            attribute: name.to_string(),
        }
    }

    pub(crate) fn relationship_not_found(&self, name: &str) -> OrmError {
        OrmError::RelationshipNotFound {
            model: self.type_name.to_string(),
            relationship: name.to_string(),
        }
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("model", &self.type_name)
            .field("resource_type", &self.resource_type)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .field(
                "relationships",
                &self
                    .relationships
                    .values()
                    .map(|r| (&r.name, r.cardinality))
                    .collect::<Vec<_>>(),
            )
            .field("attribute_bag", &self.attribute_bag.is_some())
            .finish()
    }
}

fn downcast<M: Model>(model: &dyn Model) -> Result<&M> {
    model
        .as_any()
        .downcast_ref::<M>()
        .ok_or_else(|| OrmError::TypeMismatch {
            expected: std::any::type_name::<M>().to_string(),
            found: model.type_name().to_string(),
        })
}

/// Builder for [`ModelConfig`].
///
/// ```ignore
/// let config = ModelConfig::builder::<Person>("person")
///     .attribute("name", |p| &p.name)
///     .has_one("employer", |p| &p.employer)
///     .has_many("pets", |p| &p.pets)
///     .attribute_bag(|p| &p.extra)
///     .build();
/// ```
pub struct ModelConfigBuilder<M> {
    config: ModelConfig,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model + Default> ModelConfigBuilder<M> {
    pub fn attribute<T>(mut self, name: impl Into<String>, accessor: fn(&M) -> &Attribute<T>) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        let name = name.into();
        let read: AttributeReader =
            Arc::new(move |model: &dyn Model| -> Result<Option<Value>> {
                Ok(accessor(downcast::<M>(model)?).to_json()?)
            });
        self.check_unique(&name);
        self.config
            .attributes
            .insert(name.clone(), AttributeConfig { name, read });
        self
    }

    pub fn has_one<T: Model>(self, name: impl Into<String>, accessor: fn(&M) -> &HasOne<T>) -> Self {
        let read: RelationshipReader =
            Arc::new(move |model: &dyn Model| -> Result<Related> {
            Ok(Related::One(accessor(downcast::<M>(model)?).get_dyn()))
        });
        self.relationship(name.into(), Cardinality::One, RelationshipTarget::of::<T>(), read)
    }

    pub fn has_one_polymorphic(
        self,
        name: impl Into<String>,
        accessor: fn(&M) -> &PolymorphicHasOne,
    ) -> Self {
        let read: RelationshipReader =
            Arc::new(move |model: &dyn Model| -> Result<Related> {
            Ok(Related::One(accessor(downcast::<M>(model)?).get()))
        });
        self.relationship(name.into(), Cardinality::One, RelationshipTarget::Polymorphic, read)
    }

    pub fn has_many<T: Model>(self, name: impl Into<String>, accessor: fn(&M) -> &HasMany<T>) -> Self {
        let read: RelationshipReader =
            Arc::new(move |model: &dyn Model| -> Result<Related> {
            Ok(Related::Many(accessor(downcast::<M>(model)?).get_dyn()))
        });
        self.relationship(name.into(), Cardinality::Many, RelationshipTarget::of::<T>(), read)
    }

    /// Where attributes without an explicit mapping are read from and kept.
    pub fn attribute_bag(mut self, accessor: fn(&M) -> &AttributeBag) -> Self {
        self.config.attribute_bag =
            Some(Arc::new(move |model: &dyn Model| -> Result<Option<AttributeMap>> {
                Ok(accessor(downcast::<M>(model)?).get())
            }));
        self
    }

    pub fn build(self) -> ModelConfig {
        self.config
    }

    fn relationship(
        mut self,
        name: String,
        cardinality: Cardinality,
        target: RelationshipTarget,
        read: RelationshipReader,
    ) -> Self {
        self.check_unique(&name);
        self.config.relationships.insert(
            name.clone(),
            RelationshipConfig {
                name,
                cardinality,
                target,
                read,
            },
        );
        self
    }

    fn check_unique(&mut self, name: &str) {
        if self.config.attributes.contains_key(name) || self.config.relationships.contains_key(name) {
            self.config.duplicate_fields.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelState;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Book {
        state: ModelState,
        title: Attribute<String>,
        pages: Attribute<u32>,
        author: HasOne<Author>,
        extra: AttributeBag,
    }

    #[derive(Debug, Default)]
    struct Author {
        state: ModelState,
        books: HasMany<Book>,
    }

    impl Model for Book {
        fn state(&self) -> &ModelState {
            &self.state
        }
    }

    impl Model for Author {
        fn state(&self) -> &ModelState {
            &self.state
        }
    }

    fn book_config() -> ModelConfig {
        ModelConfig::builder::<Book>("book")
            .attribute("title", |b| &b.title)
            .attribute("pages", |b| &b.pages)
            .has_one("author", |b| &b.author)
            .attribute_bag(|b| &b.extra)
            .build()
    }

    #[test]
    fn fields_keep_declaration_order() {
        let config = book_config();
        let names: Vec<_> = config.attributes().map(|a| a.name()).collect();
        assert_eq!(names, vec!["title", "pages"]);
        assert_eq!(config.resource_type(), "book");
        assert!(config.has_attribute_bag());
        assert!(config.duplicate_fields().is_empty());
    }

    #[test]
    fn attribute_reader_serializes_backing_value() {
        let config = book_config();
        let book = Book::default();
        book.title.set(Some("Dune".to_string()));

        assert_eq!(config.attribute("title").unwrap().read(&book).unwrap(), Some(json!("Dune")));
        assert_eq!(config.attribute("pages").unwrap().read(&book).unwrap(), None);
    }

    #[test]
    fn reader_rejects_foreign_model() {
        let config = book_config();
        let author = Author::default();
        assert!(matches!(
            config.attribute("title").unwrap().read(&author),
            Err(OrmError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn relationship_metadata() {
        let config = ModelConfig::builder::<Author>("author")
            .has_many("books", |a| &a.books)
            .build();
        let books = config.relationship("books").unwrap();
        assert_eq!(books.cardinality(), Cardinality::Many);
        assert!(books.target().accepts(TypeId::of::<Book>()));
        assert!(!books.target().accepts(TypeId::of::<Author>()));

        let author = Author::default();
        assert!(matches!(books.read(&author).unwrap(), Related::Many(None)));
    }

    #[test]
    fn duplicate_field_names_are_recorded() {
        let config = ModelConfig::builder::<Book>("book")
            .attribute("title", |b| &b.title)
            .has_one("title", |b| &b.author)
            .build();
        assert_eq!(config.duplicate_fields(), ["title".to_string()]);
    }

    #[test]
    fn factory_builds_empty_instances() {
        let config = book_config();
        let first = config.instantiate();
        let second = config.instantiate();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(first.state().id().is_none());
    }
}
