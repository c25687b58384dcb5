//! Create-payload construction.

use crate::model::Model;
use crate::registry::ModelRegistry;
use crate::Result;
use docgraph_schema::{Resource, ResourceId};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Primary resource plus every new related resource, ready to be sent in a
/// single create request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePayload {
    pub root: Resource,
    pub included: Vec<Resource>,
}

impl CreatePayload {
    /// Root first, then the included resources in discovery order.
    pub fn into_resources(self) -> Vec<Resource> {
        let mut resources = Vec::with_capacity(1 + self.included.len());
        resources.push(self.root);
        resources.extend(self.included);
        resources
    }
}

/// Turns an in-memory object graph into a [`CreatePayload`].
#[derive(Debug, Clone, Copy)]
pub struct ResourceGraphBuilder<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> ResourceGraphBuilder<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// Build the payload for creating `root`.
    ///
    /// Every object reachable from the root that is not yet managed is
    /// included exactly once; already-managed objects are only referenced.
    /// Objects without an id, the root included, are assigned one.
    pub fn build_create_payload(&self, root: &dyn Model) -> Result<CreatePayload> {
        let root_id = self.registry.ensure_id(root);
        let models = self.registry.included_models_of(root)?;

        // Id assignment is set-once, so concurrent serialization of objects
        // that share a related object still agrees on its id.
        let included = models
            .par_iter()
            .map(|model| self.registry.resource_of(&**model))
            .collect::<Result<Vec<_>>>()?;
        let root = self.registry.resource_of(root)?;

        let included = dedup_included(&root_id, included);
        debug!(
            "built create payload for {} {} with {} included resources",
            root.resource_type,
            root_id,
            included.len()
        );

        Ok(CreatePayload { root, included })
    }
}

/// Distinct objects claiming the same id would produce conflicting
/// resources; keep the first one seen.
fn dedup_included(root_id: &ResourceId, included: Vec<Resource>) -> Vec<Resource> {
    let mut seen = HashSet::from([root_id.clone()]);
    included
        .into_iter()
        .filter(|resource| {
            let fresh = seen.insert(resource.id.clone());
            if !fresh {
                warn!("dropping duplicate resource {} from create payload", resource.id);
            }
            fresh
        })
        .collect()
}
