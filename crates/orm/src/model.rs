//! Domain model surface.
//!
//! A model is a plain struct that embeds a [`ModelState`] and stores its
//! mapped properties in the field wrappers defined here. While a model is
//! unmanaged the wrappers hold its values; once a session manages it, reads
//! and writes go through [`ModelExt`], which consults the session instead.
//!
//! ```ignore
//! #[derive(Debug, Default)]
//! pub struct Person {
//!     state: ModelState,
//!     name: Attribute<String>,
//!     employer: HasOne<Company>,
//! }
//!
//! impl Model for Person {
//!     fn state(&self) -> &ModelState {
//!         &self.state
//!     }
//! }
//!
//! impl Person {
//!     pub fn name(&self) -> Result<Option<String>> {
//!         self.read_attribute("name", &self.name)
//!     }
//!
//!     pub async fn employer(&self) -> Result<Option<Arc<Company>>> {
//!         self.read_reference("employer", &self.employer).await
//!     }
//! }
//! ```

use crate::collection::RemoteCollection;
use crate::session::{Session, SessionInner};
use crate::{OrmError, Result};
use docgraph_schema::{AttributeMap, ResourceId};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

/// Type-erasure helpers, implemented for every sized `Send + Sync` type.
pub trait AsAny: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    fn type_name(&self) -> &'static str;
}

impl<T: Send + Sync + 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A domain type that can be mapped to a resource.
pub trait Model: AsAny + fmt::Debug {
    /// The model's identity and session attachment.
    fn state(&self) -> &ModelState;
}

/// A type-erased shared model instance.
pub type ModelRef = Arc<dyn Model>;

/// Concrete type of a model behind a trait object.
pub(crate) fn model_type(model: &dyn Model) -> TypeId {
    model.as_any().type_id()
}

/// Address of the model's allocation, used for visited sets.
pub(crate) fn model_addr(model: &dyn Model) -> usize {
    model as *const dyn Model as *const () as usize
}

pub(crate) fn downcast_model<M: Model>(model: ModelRef) -> Result<Arc<M>> {
    if !(*model).as_any().is::<M>() {
        return Err(OrmError::TypeMismatch {
            expected: std::any::type_name::<M>().to_string(),
            found: (*model).type_name().to_string(),
        });
    }
    model
        .into_any()
        .downcast::<M>()
        .map_err(|_| OrmError::TypeMismatch {
            expected: std::any::type_name::<M>().to_string(),
            found: "unknown".to_string(),
        })
}

// ============================================================================
// Model state
// ============================================================================

#[derive(Default)]
enum Link {
    #[default]
    Unmanaged,
    Managed(Weak<SessionInner>),
    Deleted,
}

/// Where a model currently stands with respect to a session.
pub(crate) enum Attachment {
    Unmanaged,
    Managed(Session),
    Deleted,
}

/// Identity and lifecycle of one model instance.
///
/// The id is set at most once: either explicitly, by the session when it
/// rehydrates a resource, or lazily the first time the model is referenced
/// before it has one. It never changes afterwards.
#[derive(Default)]
pub struct ModelState {
    id: OnceLock<ResourceId>,
    link: RwLock<Link>,
}

impl ModelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: ResourceId) -> Self {
        let state = Self::default();
        let _ = state.id.set(id);
        state
    }

    pub fn id(&self) -> Option<&ResourceId> {
        self.id.get()
    }

    /// The id, generating one if the model has none yet.
    pub fn ensure_id(&self) -> &ResourceId {
        self.id.get_or_init(ResourceId::generate)
    }

    /// Assign an id. Re-assigning the same id is a no-op; a different one is
    /// rejected and the existing id returned.
    pub fn assign_id(&self, id: ResourceId) -> std::result::Result<(), ResourceId> {
        let current = self.id.get_or_init(|| id.clone());
        if *current == id {
            Ok(())
        } else {
            Err(current.clone())
        }
    }

    pub fn is_managed(&self) -> bool {
        matches!(*self.link.read(), Link::Managed(_))
    }

    pub fn is_deleted(&self) -> bool {
        matches!(*self.link.read(), Link::Deleted)
    }

    pub(crate) fn attach(&self, session: Weak<SessionInner>) {
        *self.link.write() = Link::Managed(session);
    }

    pub(crate) fn detach(&self) {
        *self.link.write() = Link::Unmanaged;
    }

    pub(crate) fn mark_deleted(&self) {
        *self.link.write() = Link::Deleted;
    }

    pub(crate) fn is_attached_to(&self, session: &Arc<SessionInner>) -> bool {
        match &*self.link.read() {
            Link::Managed(weak) => std::ptr::eq(weak.as_ptr(), Arc::as_ptr(session)),
            _ => false,
        }
    }

    /// Resolve the session link. A managed model whose session is gone
    /// reports [`OrmError::SessionDisposed`].
    pub(crate) fn attachment(&self) -> Result<Attachment> {
        match &*self.link.read() {
            Link::Unmanaged => Ok(Attachment::Unmanaged),
            Link::Deleted => Ok(Attachment::Deleted),
            Link::Managed(weak) => weak
                .upgrade()
                .map(|inner| Attachment::Managed(Session::from_inner(inner)))
                .ok_or(OrmError::SessionDisposed),
        }
    }
}

impl fmt::Debug for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match &*self.link.read() {
            Link::Unmanaged => "unmanaged",
            Link::Managed(_) => "managed",
            Link::Deleted => "deleted",
        };
        f.debug_struct("ModelState")
            .field("id", &self.id.get())
            .field("status", &status)
            .finish()
    }
}

// ============================================================================
// Backing fields
// ============================================================================

/// Backing storage for a mapped attribute.
pub struct Attribute<T> {
    value: RwLock<Option<T>>,
}

impl<T> Default for Attribute<T> {
    fn default() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }
}

impl<T: Clone> Attribute<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(Some(value)),
        }
    }

    pub fn get(&self) -> Option<T> {
        self.value.read().clone()
    }

    pub fn set(&self, value: Option<T>) {
        *self.value.write() = value;
    }
}

impl<T: Serialize> Attribute<T> {
    /// Current value as JSON; `None` when unset or serializing to `null`.
    pub(crate) fn to_json(&self) -> serde_json::Result<Option<Value>> {
        match &*self.value.read() {
            Some(value) => serde_json::to_value(value).map(|v| Some(v).filter(|v| !v.is_null())),
            None => Ok(None),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Attribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value.read(), f)
    }
}

// Related models are printed by id only; graphs may be cyclic.
fn fmt_related(model: &dyn Model, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match model.state().id() {
        Some(id) => write!(f, "{}({})", model.type_name(), id),
        None => write!(f, "{}(<no id>)", model.type_name()),
    }
}

/// Backing storage for a to-one relationship.
pub struct HasOne<T: Model> {
    value: RwLock<Option<Arc<T>>>,
}

impl<T: Model> Default for HasOne<T> {
    fn default() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }
}

impl<T: Model> HasOne<T> {
    pub fn new(value: Arc<T>) -> Self {
        Self {
            value: RwLock::new(Some(value)),
        }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.value.read().clone()
    }

    pub fn set(&self, value: Option<Arc<T>>) {
        *self.value.write() = value;
    }

    pub(crate) fn get_dyn(&self) -> Option<ModelRef> {
        self.get().map(|m| m as ModelRef)
    }
}

impl<T: Model> fmt::Debug for HasOne<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.value.read() {
            Some(model) => fmt_related(&**model, f),
            None => f.write_str("None"),
        }
    }
}

/// Backing storage for a to-one relationship whose target type varies.
#[derive(Default)]
pub struct PolymorphicHasOne {
    value: RwLock<Option<ModelRef>>,
}

impl PolymorphicHasOne {
    pub fn new(value: ModelRef) -> Self {
        Self {
            value: RwLock::new(Some(value)),
        }
    }

    pub fn get(&self) -> Option<ModelRef> {
        self.value.read().clone()
    }

    pub fn set(&self, value: Option<ModelRef>) {
        *self.value.write() = value;
    }
}

impl fmt::Debug for PolymorphicHasOne {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.value.read() {
            Some(model) => fmt_related(&**model, f),
            None => f.write_str("None"),
        }
    }
}

/// Backing storage for a to-many relationship. `None` means "never set",
/// which is not the same as an empty collection.
pub struct HasMany<T: Model> {
    value: RwLock<Option<Vec<Arc<T>>>>,
}

impl<T: Model> Default for HasMany<T> {
    fn default() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }
}

impl<T: Model> HasMany<T> {
    pub fn new(items: Vec<Arc<T>>) -> Self {
        Self {
            value: RwLock::new(Some(items)),
        }
    }

    pub fn get(&self) -> Option<Vec<Arc<T>>> {
        self.value.read().clone()
    }

    pub fn set(&self, items: Option<Vec<Arc<T>>>) {
        *self.value.write() = items;
    }

    pub fn push(&self, item: Arc<T>) {
        self.value.write().get_or_insert_with(Vec::new).push(item);
    }

    pub(crate) fn get_dyn(&self) -> Option<Vec<ModelRef>> {
        self.get()
            .map(|items| items.into_iter().map(|m| m as ModelRef).collect())
    }
}

impl<T: Model> fmt::Debug for HasMany<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Related<'a>(&'a dyn Model);
        impl fmt::Debug for Related<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt_related(self.0, f)
            }
        }

        match &*self.value.read() {
            Some(items) => f
                .debug_list()
                .entries(items.iter().map(|m| Related(&**m)))
                .finish(),
            None => f.write_str("None"),
        }
    }
}

/// Backing storage for attributes the model does not map explicitly.
#[derive(Debug, Default)]
pub struct AttributeBag {
    value: RwLock<Option<AttributeMap>>,
}

impl AttributeBag {
    pub fn new(values: AttributeMap) -> Self {
        Self {
            value: RwLock::new(Some(values)),
        }
    }

    pub fn get(&self) -> Option<AttributeMap> {
        self.value.read().clone()
    }

    pub fn set(&self, values: Option<AttributeMap>) {
        *self.value.write() = values;
    }
}

// ============================================================================
// Accessor contract
// ============================================================================

/// Property access that is aware of session management.
///
/// Models implement their public getters and setters on top of these
/// methods. Unmanaged instances read and write their backing fields; managed
/// instances delegate to the owning session, so reads see pending changes
/// and writes are recorded as pending changes. Writes to a deleted instance
/// fail.
#[async_trait::async_trait]
pub trait ModelExt: Model + Sized {
    fn id(&self) -> Option<ResourceId> {
        self.state().id().cloned()
    }

    fn read_attribute<T>(&self, name: &str, field: &Attribute<T>) -> Result<Option<T>>
    where
        T: DeserializeOwned + Clone,
    {
        match self.state().attachment()? {
            Attachment::Managed(session) => session.get_attribute(self, name),
            Attachment::Unmanaged | Attachment::Deleted => Ok(field.get()),
        }
    }

    fn write_attribute<T>(&self, name: &str, field: &Attribute<T>, value: Option<T>) -> Result<()>
    where
        T: Serialize + Clone,
    {
        match self.state().attachment()? {
            Attachment::Managed(session) => session.set_attribute(self, name, value),
            Attachment::Unmanaged => {
                field.set(value);
                Ok(())
            }
            Attachment::Deleted => Err(deleted_error(self)),
        }
    }

    async fn read_reference<T: Model>(&self, name: &str, field: &HasOne<T>) -> Result<Option<Arc<T>>> {
        match self.state().attachment()? {
            Attachment::Managed(session) => session.get_reference::<T>(self, name).await,
            Attachment::Unmanaged | Attachment::Deleted => Ok(field.get()),
        }
    }

    fn write_reference<T: Model>(
        &self,
        name: &str,
        field: &HasOne<T>,
        value: Option<Arc<T>>,
    ) -> Result<()> {
        match self.state().attachment()? {
            Attachment::Managed(session) => {
                session.set_reference(self, name, value.as_deref().map(|m| m as &dyn Model))
            }
            Attachment::Unmanaged => {
                field.set(value);
                Ok(())
            }
            Attachment::Deleted => Err(deleted_error(self)),
        }
    }

    async fn read_polymorphic(&self, name: &str, field: &PolymorphicHasOne) -> Result<Option<ModelRef>> {
        match self.state().attachment()? {
            Attachment::Managed(session) => session.get_reference_dyn(self, name).await,
            Attachment::Unmanaged | Attachment::Deleted => Ok(field.get()),
        }
    }

    fn write_polymorphic(
        &self,
        name: &str,
        field: &PolymorphicHasOne,
        value: Option<ModelRef>,
    ) -> Result<()> {
        match self.state().attachment()? {
            Attachment::Managed(session) => session.set_reference(self, name, value.as_deref()),
            Attachment::Unmanaged => {
                field.set(value);
                Ok(())
            }
            Attachment::Deleted => Err(deleted_error(self)),
        }
    }

    /// All members of a to-many relationship. Managed instances resolve the
    /// collection through the session (see [`RemoteCollection::items`]).
    async fn read_many<T: Model>(&self, name: &str, field: &HasMany<T>) -> Result<Vec<Arc<T>>> {
        let session = match self.state().attachment()? {
            Attachment::Managed(session) => session,
            Attachment::Unmanaged | Attachment::Deleted => {
                return Ok(field.get().unwrap_or_default())
            }
        };
        let collection = session.get_collection::<T>(self, name)?;
        collection.items().await
    }

    /// Replace a to-many relationship wholesale.
    fn write_many<T: Model>(&self, name: &str, field: &HasMany<T>, items: Vec<Arc<T>>) -> Result<()> {
        match self.state().attachment()? {
            Attachment::Managed(session) => session.set_collection(self, name, items).map(|_| ()),
            Attachment::Unmanaged => {
                field.set(Some(items));
                Ok(())
            }
            Attachment::Deleted => Err(deleted_error(self)),
        }
    }

    /// Collection handle for a managed instance's to-many relationship.
    fn collection<T: Model>(&self, name: &str) -> Result<RemoteCollection<T>> {
        match self.state().attachment()? {
            Attachment::Managed(session) => session.get_collection::<T>(self, name),
            Attachment::Unmanaged => Err(not_managed_error(self)),
            Attachment::Deleted => Err(deleted_error(self)),
        }
    }

    fn read_attribute_bag(&self, field: &AttributeBag) -> Result<AttributeMap> {
        match self.state().attachment()? {
            Attachment::Managed(session) => session.get_attribute_bag(self),
            Attachment::Unmanaged | Attachment::Deleted => Ok(field.get().unwrap_or_default()),
        }
    }

    fn write_attribute_bag(&self, field: &AttributeBag, values: AttributeMap) -> Result<()> {
        match self.state().attachment()? {
            Attachment::Managed(session) => session.set_attribute_bag(self, values),
            Attachment::Unmanaged => {
                field.set(Some(values));
                Ok(())
            }
            Attachment::Deleted => Err(deleted_error(self)),
        }
    }
}

impl<M: Model> ModelExt for M {}

pub(crate) fn deleted_error(model: &dyn Model) -> OrmError {
    OrmError::ModelDeleted {
        model: model.type_name().to_string(),
        id: model.state().id().cloned().unwrap_or_else(|| ResourceId::new("")),
    }
}

pub(crate) fn not_managed_error(model: &dyn Model) -> OrmError {
    OrmError::NotManaged {
        model: model.type_name().to_string(),
        id: model
            .state()
            .id()
            .map(ToString::to_string)
            .unwrap_or_else(|| "<no id>".to_string()),
    }
}
