use docgraph_client::{Method, StatusCode, TransportError};
use docgraph_schema::ResourceId;
use thiserror::Error;

/// Errors surfaced by the registry and the session.
///
/// A resource that does not exist is not an error: reads return `Ok(None)`.
#[derive(Debug, Error)]
pub enum OrmError {
    /// A model type or resource-type name was never registered.
    #[error("model not registered: {0}")]
    UnregisteredModel(String),

    #[error("relationship '{relationship}' is not configured on {model}")]
    RelationshipNotFound { model: String, relationship: String },

    #[error("attribute '{attribute}' is not configured on {model}")]
    AttributeNotFound { model: String, attribute: String },

    #[error("resource type '{0}' is registered more than once")]
    DuplicateResourceType(String),

    #[error("model {0} is registered more than once")]
    DuplicateModel(String),

    /// Attribute and relationship names share one namespace per model.
    #[error("field '{field}' is declared more than once on {model}")]
    DuplicateField { model: String, field: String },

    #[error("session has been disposed")]
    SessionDisposed,

    /// The backend answered with a status other than success or, on reads, not-found.
    #[error("{method} {resource_type}/{} failed with status {status}", display_id(.id))]
    RemoteRequestFailed {
        method: Method,
        resource_type: String,
        id: Option<ResourceId>,
        status: StatusCode,
    },

    /// The operation needs a model tracked by this session.
    #[error("{model} {id} is not managed by this session")]
    NotManaged { model: String, id: String },

    /// The model was deleted and can no longer be mutated.
    #[error("{model} {id} has been deleted")]
    ModelDeleted { model: String, id: ResourceId },

    #[error("{0} has no id")]
    MissingId(String),

    #[error("{model} already has id {existing}; refusing to reassign it to {requested}")]
    IdAlreadyAssigned {
        model: String,
        existing: ResourceId,
        requested: ResourceId,
    },

    /// A resolved object is not of the type the caller asked for.
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("attribute (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

fn display_id(id: &Option<ResourceId>) -> &str {
    id.as_ref().map(ResourceId::as_str).unwrap_or("-")
}

pub type Result<T> = std::result::Result<T, OrmError>;
