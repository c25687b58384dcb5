//! Session-based object mapper for JSON:API document services.
//!
//! Domain objects are plain structs registered in a [`ModelRegistry`].
//! A [`Session`] loads them through a transport, hands out one shared
//! instance per resource id, records property writes as pending changes
//! and sends them on [`Session::update`]. New object graphs are created in
//! a single request, with every new related object included.
//!
//! # Example
//! ```ignore
//! use docgraph_orm::prelude::*;
//!
//! let registry = ModelRegistry::builder()
//!     .register(
//!         ModelConfig::builder::<Person>("person")
//!             .attribute("name", |p| &p.name)
//!             .has_one("employer", |p| &p.employer)
//!             .build(),
//!     )
//!     .register(ModelConfig::builder::<Company>("company").build())
//!     .build()?;
//!
//! let factory = SessionFactory::from_env(Arc::new(registry))?;
//! let session = factory.open_session();
//!
//! let ada = Person::default();
//! ada.set_name("Ada")?;
//! let ada = session.create(&ada).await?;
//!
//! let same = session.get::<Person>(&ada.id().unwrap()).await?.unwrap();
//! assert!(Arc::ptr_eq(&ada, &same));
//! ```

mod cache;
mod collection;
mod config;
mod error;
mod graph;
mod model;
mod patch;
mod registry;
mod session;

pub mod prelude;

pub use cache::IdentityMap;
pub use collection::RemoteCollection;
pub use config::{
    AttributeConfig, Cardinality, ModelConfig, ModelConfigBuilder, RelationshipConfig,
    RelationshipTarget,
};
pub use error::{OrmError, Result};
pub use graph::{CreatePayload, ResourceGraphBuilder};
pub use model::{
    AsAny, Attribute, AttributeBag, HasMany, HasOne, Model, ModelExt, ModelRef, ModelState,
    PolymorphicHasOne,
};
pub use patch::{PatchOverlay, PatchStore};
pub use registry::{ModelRegistry, ModelRegistryBuilder};
pub use session::{Session, SessionFactory};

// Re-export commonly used types from dependencies
pub use docgraph_client::{ClientConfig, HttpTransport, Transport};
pub use docgraph_schema::{AttributeMap, Resource, ResourceId, ResourceIdentifier};
