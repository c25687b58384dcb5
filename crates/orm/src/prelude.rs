//! Prelude for convenient imports.
//!
//! # Example
//! ```ignore
//! use docgraph_orm::prelude::*;
//!
//! let session = SessionFactory::new(registry, transport).open_session();
//! let person: Option<Arc<Person>> = session.get(&id).await?;
//! ```

pub use crate::{
    Attribute, AttributeBag, HasMany, HasOne, Model, ModelConfig, ModelExt, ModelRef,
    ModelRegistry, ModelState, OrmError, PolymorphicHasOne, RemoteCollection, Result, Session,
    SessionFactory,
};

pub use docgraph_schema::{AttributeMap, ResourceId};
