//! Shared fixtures: a small people/companies/pets domain and a session over
//! the in-memory backend.

#![allow(dead_code)]

use docgraph_client::testing::InMemoryTransport;
use docgraph_orm::prelude::*;
use docgraph_schema::{Relationship, Resource, ResourceIdentifier};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Person {
    state: ModelState,
    name: Attribute<String>,
    age: Attribute<u32>,
    employer: HasOne<Company>,
    best_friend: HasOne<Person>,
    pets: HasMany<Pet>,
    favorite: PolymorphicHasOne,
    extra: AttributeBag,
}

impl Model for Person {
    fn state(&self) -> &ModelState {
        &self.state
    }
}

impl Person {
    pub fn named(name: &str) -> Arc<Self> {
        let person = Self::default();
        person.name.set(Some(name.to_string()));
        Arc::new(person)
    }

    pub fn name(&self) -> Result<Option<String>> {
        self.read_attribute("name", &self.name)
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        self.write_attribute("name", &self.name, Some(name.to_string()))
    }

    pub fn age(&self) -> Result<Option<u32>> {
        self.read_attribute("age", &self.age)
    }

    pub fn set_age(&self, age: Option<u32>) -> Result<()> {
        self.write_attribute("age", &self.age, age)
    }

    pub async fn employer(&self) -> Result<Option<Arc<Company>>> {
        self.read_reference("employer", &self.employer).await
    }

    pub fn set_employer(&self, company: Option<Arc<Company>>) -> Result<()> {
        self.write_reference("employer", &self.employer, company)
    }

    pub async fn best_friend(&self) -> Result<Option<Arc<Person>>> {
        self.read_reference("best_friend", &self.best_friend).await
    }

    pub fn set_best_friend(&self, friend: Option<Arc<Person>>) -> Result<()> {
        self.write_reference("best_friend", &self.best_friend, friend)
    }

    pub async fn pets(&self) -> Result<Vec<Arc<Pet>>> {
        self.read_many("pets", &self.pets).await
    }

    pub fn set_pets(&self, pets: Vec<Arc<Pet>>) -> Result<()> {
        self.write_many("pets", &self.pets, pets)
    }

    pub async fn favorite(&self) -> Result<Option<ModelRef>> {
        self.read_polymorphic("favorite", &self.favorite).await
    }

    pub fn set_favorite(&self, favorite: Option<ModelRef>) -> Result<()> {
        self.write_polymorphic("favorite", &self.favorite, favorite)
    }

    pub fn extra(&self) -> Result<AttributeMap> {
        self.read_attribute_bag(&self.extra)
    }

    pub fn set_extra(&self, values: AttributeMap) -> Result<()> {
        self.write_attribute_bag(&self.extra, values)
    }
}

#[derive(Debug, Default)]
pub struct Company {
    state: ModelState,
    name: Attribute<String>,
    employees: HasMany<Person>,
}

impl Model for Company {
    fn state(&self) -> &ModelState {
        &self.state
    }
}

impl Company {
    pub fn named(name: &str) -> Arc<Self> {
        let company = Self::default();
        company.name.set(Some(name.to_string()));
        Arc::new(company)
    }

    pub fn name(&self) -> Result<Option<String>> {
        self.read_attribute("name", &self.name)
    }

    pub async fn employees(&self) -> Result<Vec<Arc<Person>>> {
        self.read_many("employees", &self.employees).await
    }

    pub fn set_employees(&self, employees: Vec<Arc<Person>>) -> Result<()> {
        self.write_many("employees", &self.employees, employees)
    }
}

#[derive(Debug, Default)]
pub struct Pet {
    state: ModelState,
    name: Attribute<String>,
    owner: HasOne<Person>,
}

impl Model for Pet {
    fn state(&self) -> &ModelState {
        &self.state
    }
}

impl Pet {
    pub fn named(name: &str) -> Arc<Self> {
        let pet = Self::default();
        pet.name.set(Some(name.to_string()));
        Arc::new(pet)
    }

    pub fn name(&self) -> Result<Option<String>> {
        self.read_attribute("name", &self.name)
    }

    pub async fn owner(&self) -> Result<Option<Arc<Person>>> {
        self.read_reference("owner", &self.owner).await
    }

    pub fn set_owner(&self, owner: Option<Arc<Person>>) -> Result<()> {
        self.write_reference("owner", &self.owner, owner)
    }
}

pub fn registry() -> Arc<ModelRegistry> {
    let registry = ModelRegistry::builder()
        .register(
            ModelConfig::builder::<Person>("person")
                .attribute("name", |p| &p.name)
                .attribute("age", |p| &p.age)
                .has_one("employer", |p| &p.employer)
                .has_one("best_friend", |p| &p.best_friend)
                .has_many("pets", |p| &p.pets)
                .has_one_polymorphic("favorite", |p| &p.favorite)
                .attribute_bag(|p| &p.extra)
                .build(),
        )
        .register(
            ModelConfig::builder::<Company>("company")
                .attribute("name", |c| &c.name)
                .has_many("employees", |c| &c.employees)
                .build(),
        )
        .register(
            ModelConfig::builder::<Pet>("pet")
                .attribute("name", |p| &p.name)
                .has_one("owner", |p| &p.owner)
                .build(),
        )
        .build()
        .expect("fixture registry is valid");
    Arc::new(registry)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn open(backend: &Arc<InMemoryTransport>) -> Session {
    init_tracing();
    SessionFactory::new(registry(), backend.clone()).open_session()
}

pub fn setup() -> (Arc<InMemoryTransport>, Session) {
    let backend = Arc::new(InMemoryTransport::new());
    let session = open(&backend);
    (backend, session)
}

pub fn id(id: &str) -> ResourceId {
    ResourceId::new(id)
}

pub fn ident(id: &str, resource_type: &str) -> ResourceIdentifier {
    ResourceIdentifier::new(ResourceId::new(id), resource_type)
}

pub fn person_resource(id: &str, name: &str) -> Resource {
    let mut resource = Resource::new(ResourceId::new(id), "person");
    resource.attributes.insert("name".into(), json!(name));
    resource
}

pub fn company_resource(id: &str, name: &str) -> Resource {
    let mut resource = Resource::new(ResourceId::new(id), "company");
    resource.attributes.insert("name".into(), json!(name));
    resource
}

pub fn pet_resource(id: &str, name: &str) -> Resource {
    let mut resource = Resource::new(ResourceId::new(id), "pet");
    resource.attributes.insert("name".into(), json!(name));
    resource
}

pub fn with_relationship(mut resource: Resource, name: &str, relationship: Relationship) -> Resource {
    resource.relationships.insert(name.into(), relationship);
    resource
}
