//! Sessions: the unit of work and identity scope of the mapper.
//!
//! A [`Session`] owns an identity map of the objects it manages and a patch
//! store of their unsaved changes. All network traffic goes through the
//! factory's [`Transport`]. Sessions are cheap to clone; clones share state.
//!
//! # Example
//! ```ignore
//! let factory = SessionFactory::new(Arc::new(registry), transport);
//! let session = factory.open_session();
//!
//! let person = session.get::<Person>(&id).await?.expect("exists");
//! person.set_name("Ada")?;
//! session.update(&*person).await?;
//! ```

use crate::cache::IdentityMap;
use crate::collection::RemoteCollection;
use crate::config::Cardinality;
use crate::graph::{CreatePayload, ResourceGraphBuilder};
use crate::model::{deleted_error, downcast_model, model_type, not_managed_error, Model, ModelRef};
use crate::patch::{PatchOverlay, PatchStore};
use crate::registry::ModelRegistry;
use crate::{OrmError, Result};
use docgraph_client::{
    ApiRequest, ApiResponse, HttpTransport, Method, StatusCode, Transport, TransportError,
};
use docgraph_schema::{
    AttributeMap, Relationship, RelationshipData, Resource, ResourceId, ResourceIdentifier,
};
use futures_util::future::try_join_all;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tap::TapFallible;
use tracing::{debug, error, instrument, trace, warn, Span};
use uuid::Uuid;

/// Opens sessions that share one registry and one transport.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    registry: Arc<ModelRegistry>,
    transport: Arc<dyn Transport>,
}

impl SessionFactory {
    pub fn new(registry: Arc<ModelRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Factory over an [`HttpTransport`] configured from the environment.
    pub fn from_env(registry: Arc<ModelRegistry>) -> Result<Self> {
        let transport = HttpTransport::from_env()?;
        Ok(Self::new(registry, Arc::new(transport)))
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn open_session(&self) -> Session {
        let session = Session::from_inner(Arc::new(SessionInner {
            id: Uuid::new_v4(),
            registry: self.registry.clone(),
            transport: self.transport.clone(),
            cache: IdentityMap::new(),
            patches: PatchStore::new(),
            disposed: AtomicBool::new(false),
        }));
        debug!("opened session {}", session.id());
        session
    }
}

pub(crate) struct SessionInner {
    id: Uuid,
    registry: Arc<ModelRegistry>,
    transport: Arc<dyn Transport>,
    cache: IdentityMap,
    patches: PatchStore,
    disposed: AtomicBool,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("cached", &self.inner.cache.len())
            .field("dirty", &self.inner.patches.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Session {
    pub(crate) fn from_inner(inner: Arc<SessionInner>) -> Self {
        Self { inner }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.inner.registry
    }

    pub fn identity_map(&self) -> &IdentityMap {
        &self.inner.cache
    }

    pub fn patches(&self) -> &PatchStore {
        &self.inner.patches
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Release every cached object and pending change. Every later
    /// operation on this session, or through a model it managed, fails with
    /// [`OrmError::SessionDisposed`]. Disposing twice is a no-op.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let released = self.inner.cache.drain().len();
        self.inner.patches.clear();
        debug!("disposed session {} ({} cached objects released)", self.inner.id, released);
    }

    /// Whether `model` is the instance this session tracks.
    pub fn is_managed(&self, model: &dyn Model) -> bool {
        model.state().is_attached_to(&self.inner)
    }

    /// Unsaved changes of a managed object.
    pub fn pending_changes(&self, model: &dyn Model) -> Option<PatchOverlay> {
        let id = self.managed_id(model).ok()?;
        self.inner.patches.get(&id)
    }

    /// Stop tracking an object. Its pending changes are dropped and the
    /// instance becomes unmanaged again.
    pub fn evict(&self, id: &ResourceId) -> Option<ModelRef> {
        let model = self.inner.cache.remove(id)?;
        model.state().detach();
        self.inner.patches.discard(id);
        trace!("evicted {} from session {}", id, self.inner.id);
        Some(model)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(OrmError::SessionDisposed);
        }
        Ok(())
    }

    fn managed_id(&self, model: &dyn Model) -> Result<ResourceId> {
        self.ensure_open()?;
        if model.state().is_deleted() {
            return Err(deleted_error(model));
        }
        if !self.is_managed(model) {
            return Err(not_managed_error(model));
        }
        model
            .state()
            .id()
            .cloned()
            .ok_or_else(|| OrmError::MissingId(model.type_name().to_string()))
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        trace!("[Session {}] {}", self.inner.id, request);
        let description = request.to_string();
        let response = self
            .inner
            .transport
            .send(request)
            .await
            .tap_err(|e| error!("{} failed: {}", description, e))?;
        debug!("{} -> {}", description, response.status);
        Ok(response)
    }

    /// Rehydrate resources into managed instances.
    ///
    /// Instances are built first and only then inserted, so a resource that
    /// cannot be mapped leaves the identity map untouched. Ids that are
    /// already cached keep their existing instance. Resources of
    /// unregistered types are skipped.
    fn adopt_all(&self, resources: Vec<Resource>) -> Result<Vec<ModelRef>> {
        let registry = &self.inner.registry;
        let built = resources
            .into_par_iter()
            .filter(|resource| {
                let known = registry.model_type_of(&resource.resource_type).is_some();
                if !known {
                    warn!(
                        "skipping resource {} of unregistered type '{}'",
                        resource.id, resource.resource_type
                    );
                }
                known
            })
            .map(|resource| registry.rehydrate(&resource).map(|model| (model, resource)))
            .collect::<Result<Vec<_>>>()?;

        Ok(built
            .into_par_iter()
            .map(|(model, resource)| {
                model.state().attach(Arc::downgrade(&self.inner));
                self.inner.cache.insert(model, resource)
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Create a resource of type `M` carrying nothing but a fresh id, and
    /// return its managed instance. The backend fills in any other state.
    #[instrument(
        name = "docgraph.session.create",
        skip(self),
        fields(
            session = %self.inner.id,
            resource_type = tracing::field::Empty,
            id = tracing::field::Empty
        ),
        err
    )]
    pub async fn create_empty<M: Model>(&self) -> Result<Arc<M>> {
        self.ensure_open()?;
        let resource_type = self.inner.registry.resource_type_of::<M>()?;
        let payload = CreatePayload {
            root: Resource::new(ResourceId::generate(), resource_type),
            included: Vec::new(),
        };
        downcast_model::<M>(self.submit_create(payload).await?)
    }

    /// Create `model` together with every unmanaged object reachable from
    /// it, in one request.
    ///
    /// Returns the managed instance for the root. The objects passed in
    /// stay unmanaged, though they keep the ids assigned while building the
    /// payload.
    pub async fn create<M: Model>(&self, model: &M) -> Result<Arc<M>> {
        downcast_model::<M>(self.create_dyn(model).await?)
    }

    #[instrument(
        name = "docgraph.session.create",
        skip(self, model),
        fields(
            session = %self.inner.id,
            resource_type = tracing::field::Empty,
            id = tracing::field::Empty
        ),
        err
    )]
    pub async fn create_dyn(&self, model: &dyn Model) -> Result<ModelRef> {
        self.ensure_open()?;
        if model.state().is_deleted() {
            return Err(deleted_error(model));
        }
        if self.is_managed(model) {
            if let Some(cached) = model.state().id().and_then(|id| self.inner.cache.get(id)) {
                debug!("{:?} is already managed; nothing to create", model.state().id());
                return Ok(cached);
            }
        }

        let payload = ResourceGraphBuilder::new(&self.inner.registry).build_create_payload(model)?;
        self.submit_create(payload).await
    }

    /// Send a create request and adopt every resource of the response.
    /// Nothing is cached unless the request succeeds.
    async fn submit_create(&self, payload: CreatePayload) -> Result<ModelRef> {
        let root_id = payload.root.id.clone();
        let resource_type = payload.root.resource_type.clone();
        Span::current().record("resource_type", resource_type.as_str());
        Span::current().record("id", tracing::field::display(&root_id));

        let request = ApiRequest::create_resource(payload.root.clone(), payload.included.clone());
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(remote_failure(Method::POST, &resource_type, Some(&root_id), response.status));
        }
        self.ensure_open()?;

        let returned = response
            .body
            .map(|document| document.into_resources())
            .unwrap_or_default();
        let resources = prefer_returned(payload.into_resources(), returned);
        let adopted = self.adopt_all(resources)?;
        debug!("created {} {} ({} resources)", resource_type, root_id, adopted.len());

        self.inner
            .cache
            .get(&root_id)
            .ok_or_else(|| OrmError::MissingId(resource_type))
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// The instance for `id`, fetching it unless it is already cached.
    /// A resource the backend does not know is `Ok(None)`.
    pub async fn get<M: Model>(&self, id: &ResourceId) -> Result<Option<Arc<M>>> {
        let resource_type = self.inner.registry.resource_type_of::<M>()?;
        self.get_dyn(resource_type, id)
            .await?
            .map(downcast_model::<M>)
            .transpose()
    }

    #[instrument(name = "docgraph.session.get", skip(self), fields(session = %self.inner.id), err)]
    pub async fn get_dyn(&self, resource_type: &str, id: &ResourceId) -> Result<Option<ModelRef>> {
        self.ensure_open()?;
        self.inner.registry.config_for_resource_type(resource_type)?;

        if let Some(model) = self.inner.cache.get(id) {
            trace!("identity map hit for {}", id);
            return Ok(Some(model));
        }

        let response = self.send(ApiRequest::get_resource(resource_type, id)).await?;
        if response.is_not_found() {
            debug!("{} {} not found", resource_type, id);
            return Ok(None);
        }
        if !response.is_success() {
            return Err(remote_failure(Method::GET, resource_type, Some(id), response.status));
        }
        self.ensure_open()?;

        let Some(document) = response.body else {
            return Err(empty_body(resource_type, id));
        };
        let (primary, included) = document.into_parts();
        let Some(resource) = primary.into_iter().find(|resource| &resource.id == id) else {
            return Err(empty_body(resource_type, id));
        };
        // Included resources of unknown types are skipped, the primary one is not.
        if self.inner.registry.model_type_of(&resource.resource_type).is_none() {
            return Err(OrmError::UnregisteredModel(resource.resource_type));
        }

        let mut resources = Vec::with_capacity(1 + included.len());
        resources.push(resource);
        resources.extend(included);
        self.adopt_all(resources)?;

        Ok(self.inner.cache.get(id))
    }

    // ------------------------------------------------------------------
    // Update / delete
    // ------------------------------------------------------------------

    /// Send the pending changes of a managed object. Without pending changes
    /// no request is made. On failure the changes stay pending.
    #[instrument(
        name = "docgraph.session.update",
        skip(self, model),
        fields(session = %self.inner.id, id = tracing::field::Empty),
        err
    )]
    pub async fn update(&self, model: &dyn Model) -> Result<()> {
        let id = self.managed_id(model)?;
        Span::current().record("id", tracing::field::display(&id));

        let Some(overlay) = self.inner.patches.get(&id).filter(|o| !o.is_empty()) else {
            debug!("no pending changes for {}", id);
            return Ok(());
        };

        let resource_type = self.inner.registry.resource_type_of_model(model)?.to_string();
        let patch = overlay.to_resource(id.clone(), resource_type.clone());
        let response = self.send(ApiRequest::update_resource(patch.clone())).await?;
        if !response.is_success() {
            return Err(remote_failure(Method::PATCH, &resource_type, Some(&id), response.status));
        }

        self.inner.cache.merge(&id, &patch);
        self.inner.patches.acknowledge(&id, &overlay);
        Ok(())
    }

    /// Delete a model's resource. The model, and the cached instance if it
    /// is a different object, are marked deleted.
    #[instrument(
        name = "docgraph.session.delete",
        skip(self, model),
        fields(session = %self.inner.id, id = tracing::field::Empty),
        err
    )]
    pub async fn delete(&self, model: &dyn Model) -> Result<()> {
        self.ensure_open()?;
        if model.state().is_deleted() {
            return Err(deleted_error(model));
        }
        let id = model
            .state()
            .id()
            .cloned()
            .ok_or_else(|| OrmError::MissingId(model.type_name().to_string()))?;
        Span::current().record("id", tracing::field::display(&id));

        let resource_type = self.inner.registry.resource_type_of_model(model)?.to_string();
        self.delete_remote(&resource_type, &id).await?;
        model.state().mark_deleted();
        Ok(())
    }

    pub async fn delete_by_id<M: Model>(&self, id: &ResourceId) -> Result<()> {
        let resource_type = self.inner.registry.resource_type_of::<M>()?.to_string();
        self.delete_remote(&resource_type, id).await
    }

    #[instrument(name = "docgraph.session.delete_remote", skip(self), err)]
    async fn delete_remote(&self, resource_type: &str, id: &ResourceId) -> Result<()> {
        self.ensure_open()?;
        let response = self.send(ApiRequest::delete_resource(resource_type, id)).await?;
        if !response.is_success() {
            return Err(remote_failure(Method::DELETE, resource_type, Some(id), response.status));
        }

        if let Some(model) = self.inner.cache.remove(id) {
            model.state().mark_deleted();
        }
        self.inner.patches.discard(id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Pending value if there is one, else the cached snapshot's value.
    pub fn get_attribute<T: DeserializeOwned>(&self, model: &dyn Model, name: &str) -> Result<Option<T>> {
        let id = self.managed_id(model)?;
        let config = self.inner.registry.config_of(model)?;
        if config.attribute(name).is_none() {
            return Err(config.attribute_not_found(name));
        }

        let value = self
            .inner
            .patches
            .attribute(&id, name)
            .or_else(|| self.inner.cache.attribute(&id, name));
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    pub fn set_attribute<T: Serialize>(&self, model: &dyn Model, name: &str, value: Option<T>) -> Result<()> {
        let id = self.managed_id(model)?;
        let config = self.inner.registry.config_of(model)?;
        if config.attribute(name).is_none() {
            return Err(config.attribute_not_found(name));
        }

        let value = match value {
            Some(value) => serde_json::to_value(value)?,
            None => Value::Null,
        };
        self.inner.patches.set_attribute(&id, name, value);
        Ok(())
    }

    /// Attributes of the resource that no mapped attribute covers.
    pub fn get_attribute_bag(&self, model: &dyn Model) -> Result<AttributeMap> {
        let id = self.managed_id(model)?;
        let config = self.inner.registry.config_of(model)?;

        let mut bag = self
            .inner
            .cache
            .snapshot(&id)
            .map(|resource| resource.attributes)
            .unwrap_or_default();
        if let Some(overlay) = self.inner.patches.get(&id) {
            for (name, value) in overlay.attributes() {
                bag.insert(name.clone(), value.clone());
            }
        }
        bag.retain(|name, _| !config.is_mapped_attribute(name));
        Ok(bag)
    }

    /// Record bag entries as pending changes. Keys that belong to mapped
    /// attributes are ignored.
    pub fn set_attribute_bag(&self, model: &dyn Model, values: AttributeMap) -> Result<()> {
        let id = self.managed_id(model)?;
        let config = self.inner.registry.config_of(model)?;
        for (name, value) in values {
            if config.is_mapped_attribute(&name) {
                trace!("ignoring mapped attribute '{}' in attribute bag", name);
                continue;
            }
            self.inner.patches.set_attribute(&id, &name, value);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // To-one relationships
    // ------------------------------------------------------------------

    pub async fn get_reference<T: Model>(&self, model: &dyn Model, name: &str) -> Result<Option<Arc<T>>> {
        self.get_reference_dyn(model, name)
            .await?
            .map(downcast_model::<T>)
            .transpose()
    }

    /// Resolve a to-one relationship: pending linkage first, then the cached
    /// snapshot. The target is loaded through [`Self::get_dyn`], so it comes
    /// from the identity map when possible.
    #[instrument(
        name = "docgraph.session.get_reference",
        skip(self, model),
        fields(session = %self.inner.id),
        err
    )]
    pub async fn get_reference_dyn(&self, model: &dyn Model, name: &str) -> Result<Option<ModelRef>> {
        let id = self.managed_id(model)?;
        let relationship = self.inner.registry.relationship_config(model, name)?;
        if relationship.cardinality() != Cardinality::One {
            return Err(cardinality_mismatch(name, "to-one", "to-many"));
        }

        let linkage = self
            .inner
            .patches
            .relationship(&id, name)
            .or_else(|| self.inner.cache.relationship(&id, name));
        let identifier = match linkage.and_then(|r| r.data) {
            None => return Ok(None),
            Some(RelationshipData::One(identifier)) => identifier,
            Some(RelationshipData::Many(_)) => {
                warn!("relationship '{}' of {} holds a collection; reading it as unset", name, id);
                return Ok(None);
            }
        };

        self.get_dyn(&identifier.resource_type, &identifier.id).await
    }

    /// Point a to-one relationship at `related`, or clear it with `None`.
    /// A related object without an id is assigned one.
    pub fn set_reference(&self, model: &dyn Model, name: &str, related: Option<&dyn Model>) -> Result<()> {
        let id = self.managed_id(model)?;
        let relationship = self.inner.registry.relationship_config(model, name)?;
        if relationship.cardinality() != Cardinality::One {
            return Err(cardinality_mismatch(name, "to-one", "to-many"));
        }

        let linkage = match related {
            None => Relationship::null(),
            Some(related) => {
                if !relationship.target().accepts(model_type(related)) {
                    return Err(OrmError::TypeMismatch {
                        expected: target_name(relationship.target()),
                        found: related.type_name().to_string(),
                    });
                }
                Relationship::one(self.inner.registry.identifier_of(related)?)
            }
        };
        self.inner.patches.set_relationship(&id, name, linkage);
        Ok(())
    }

    // ------------------------------------------------------------------
    // To-many relationships
    // ------------------------------------------------------------------

    /// Lazily resolved handle on a managed object's to-many relationship.
    pub fn get_collection<T: Model>(&self, model: &dyn Model, name: &str) -> Result<RemoteCollection<T>> {
        let id = self.managed_id(model)?;
        let relationship = self.inner.registry.relationship_config(model, name)?;
        if relationship.cardinality() != Cardinality::Many {
            return Err(cardinality_mismatch(name, "to-many", "to-one"));
        }
        if !relationship.target().accepts(TypeId::of::<T>()) {
            return Err(OrmError::TypeMismatch {
                expected: target_name(relationship.target()),
                found: std::any::type_name::<T>().to_string(),
            });
        }

        let owner_type = self.inner.registry.resource_type_of_model(model)?.to_string();
        Ok(RemoteCollection::new(self.clone(), owner_type, id, name.to_string()))
    }

    /// Replace a to-many relationship with `items`.
    pub fn set_collection<T: Model>(
        &self,
        model: &dyn Model,
        name: &str,
        items: Vec<Arc<T>>,
    ) -> Result<RemoteCollection<T>> {
        let collection = self.get_collection::<T>(model, name)?;
        collection.replace(items)?;
        Ok(collection)
    }

    pub(crate) fn write_collection<T: Model>(
        &self,
        owner_type: &str,
        owner_id: &ResourceId,
        name: &str,
        items: &[Arc<T>],
    ) -> Result<()> {
        self.ensure_open()?;
        if !self.inner.cache.contains(owner_id) {
            return Err(OrmError::NotManaged {
                model: owner_type.to_string(),
                id: owner_id.to_string(),
            });
        }

        let identifiers = items
            .iter()
            .map(|item| self.inner.registry.identifier_of(&**item))
            .collect::<Result<Vec<_>>>()?;
        self.inner
            .patches
            .set_relationship(owner_id, name, Relationship::many(identifiers));
        Ok(())
    }

    /// Members of a to-many relationship.
    ///
    /// Pending linkage is resolved member by member. Otherwise, when the
    /// cached snapshot lists members that are all cached already, those are
    /// returned without a request. In every other case the related set is
    /// fetched from the backend.
    pub(crate) async fn resolve_collection<T: Model>(
        &self,
        owner_type: &str,
        owner_id: &ResourceId,
        name: &str,
    ) -> Result<Vec<Arc<T>>> {
        self.ensure_open()?;

        if let Some(pending) = self.inner.patches.relationship(owner_id, name) {
            return self.resolve_identifiers::<T>(identifiers(&pending)).await;
        }

        if let Some(known) = self.inner.cache.relationship(owner_id, name) {
            let members = identifiers(&known);
            if members.iter().all(|member| self.inner.cache.contains(&member.id)) {
                return self.resolve_identifiers::<T>(members).await;
            }
        }

        self.fetch_related::<T>(owner_type, owner_id, name).await
    }

    async fn resolve_identifiers<T: Model>(&self, members: Vec<ResourceIdentifier>) -> Result<Vec<Arc<T>>> {
        let resolved = try_join_all(
            members
                .iter()
                .map(|member| self.get_dyn(&member.resource_type, &member.id)),
        )
        .await?;
        resolved
            .into_iter()
            .flatten()
            .map(downcast_model::<T>)
            .collect()
    }

    #[instrument(
        name = "docgraph.session.get_related",
        skip(self),
        fields(session = %self.inner.id),
        err
    )]
    async fn fetch_related<T: Model>(
        &self,
        owner_type: &str,
        owner_id: &ResourceId,
        name: &str,
    ) -> Result<Vec<Arc<T>>> {
        let response = self
            .send(ApiRequest::get_related(owner_type, owner_id, name))
            .await?;
        if response.is_not_found() {
            debug!("{} {} not found while loading '{}'", owner_type, owner_id, name);
            return Ok(Vec::new());
        }
        if !response.is_success() {
            return Err(remote_failure(Method::GET, owner_type, Some(owner_id), response.status));
        }
        self.ensure_open()?;

        let (primary, included) = response
            .body
            .map(|document| document.into_parts())
            .unwrap_or_default();
        let members: Vec<ResourceId> = primary.iter().map(|resource| resource.id.clone()).collect();

        let mut resources = primary;
        resources.extend(included);
        self.adopt_all(resources)?;

        members
            .iter()
            .filter_map(|id| self.inner.cache.get(id))
            .map(downcast_model::<T>)
            .collect()
    }
}

/// Sent resources, each replaced by the server's version when it returned
/// one, followed by any extra resources the server returned.
fn prefer_returned(sent: Vec<Resource>, returned: Vec<Resource>) -> Vec<Resource> {
    let mut returned: IndexMap<ResourceId, Resource> = returned
        .into_iter()
        .map(|resource| (resource.id.clone(), resource))
        .collect();
    let mut resources: Vec<Resource> = sent
        .into_iter()
        .map(|resource| returned.shift_remove(&resource.id).unwrap_or(resource))
        .collect();
    resources.extend(returned.into_values());
    resources
}

fn identifiers(relationship: &Relationship) -> Vec<ResourceIdentifier> {
    match &relationship.data {
        None => Vec::new(),
        Some(RelationshipData::One(identifier)) => vec![identifier.clone()],
        Some(RelationshipData::Many(identifiers)) => identifiers.clone(),
    }
}

fn remote_failure(
    method: Method,
    resource_type: &str,
    id: Option<&ResourceId>,
    status: StatusCode,
) -> OrmError {
    OrmError::RemoteRequestFailed {
        method,
        resource_type: resource_type.to_string(),
        id: id.cloned(),
        status,
    }
}

fn empty_body(resource_type: &str, id: &ResourceId) -> OrmError {
    OrmError::Transport(TransportError::Other(format!(
        "response for {}/{} does not contain the requested resource",
        resource_type, id
    )))
}

fn cardinality_mismatch(name: &str, expected: &str, found: &str) -> OrmError {
    OrmError::TypeMismatch {
        expected: format!("{} relationship", expected),
        found: format!("{} relationship '{}'", found, name),
    }
}

fn target_name(target: crate::RelationshipTarget) -> String {
    match target {
        crate::RelationshipTarget::Model { type_name, .. } => type_name.to_string(),
        crate::RelationshipTarget::Polymorphic => "any registered model".to_string(),
    }
}
