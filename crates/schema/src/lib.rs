//! Wire types for JSON:API shaped resource documents.
//!
//! Everything in this crate is plain data: resources, their identifiers and
//! relationships, and the documents that carry them over HTTP. No transport or
//! session logic lives here.
//!
//! # Example
//! ```
//! use docgraph_schema::{Resource, ResourceDocument, ResourceId};
//!
//! let resource = Resource::new(ResourceId::generate(), "person");
//! let doc = ResourceDocument::single(resource);
//! let json = serde_json::to_value(&doc).unwrap();
//! assert_eq!(json["data"]["type"], "person");
//! ```

mod document;
mod id;
mod resource;

pub use document::{PrimaryData, ResourceDocument};
pub use id::ResourceId;
pub use resource::{
    AttributeMap, Relationship, RelationshipData, RelationshipMap, Resource, ResourceIdentifier,
};
