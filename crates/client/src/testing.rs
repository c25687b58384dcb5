//! In-memory backend for tests.
//!
//! [`InMemoryTransport`] behaves like a small JSON:API server: it stores the
//! resources it is sent, answers reads from that store and records every
//! request so tests can assert on exactly what went over the wire.
//!
//! # Example
//! ```ignore
//! use docgraph_client::testing::InMemoryTransport;
//!
//! let backend = Arc::new(InMemoryTransport::new());
//! let factory = SessionFactory::new(registry, backend.clone());
//! // ... exercise the session ...
//! assert_eq!(backend.count(&Method::GET), 1);
//! ```

use crate::{ApiRequest, ApiResponse, Transport, TransportResult};
use docgraph_schema::{
    PrimaryData, RelationshipData, Resource, ResourceDocument, ResourceId,
};
use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemoryTransport {
    store: Mutex<HashMap<ResourceId, Resource>>,
    requests: Mutex<Vec<ApiRequest>>,
    failures: Mutex<VecDeque<StatusCode>>,
    latency: Option<Duration>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, so that concurrent requests overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seed the store directly, without recording a request.
    pub fn insert(&self, resource: Resource) {
        self.store.lock().insert(resource.id.clone(), resource);
    }

    pub fn resource(&self, id: &ResourceId) -> Option<Resource> {
        self.store.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.store.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// Answer the next request with `status` and no body, without touching the store.
    pub fn fail_next(&self, status: StatusCode) {
        self.failures.lock().push_back(status);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of recorded requests with the given method.
    pub fn count(&self, method: &Method) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| &r.method == method)
            .count()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn respond(&self, request: &ApiRequest) -> ApiResponse {
        if let Some(status) = self.failures.lock().pop_front() {
            return ApiResponse::status(status);
        }

        let Ok(decoded) = request
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(urlencoding::decode)
            .collect::<Result<Vec<_>, _>>()
        else {
            return ApiResponse::status(StatusCode::BAD_REQUEST);
        };
        let segments: Vec<&str> = decoded.iter().map(|s| s.as_ref()).collect();
        match (&request.method, segments.as_slice()) {
            (&Method::POST, [resource_type]) => self.create(resource_type, request.body.clone()),
            (&Method::GET, [resource_type, id]) => self.get(resource_type, &ResourceId::new(*id)),
            (&Method::GET, [resource_type, id, relationship]) => {
                self.get_related(resource_type, &ResourceId::new(*id), relationship)
            }
            (&Method::PATCH, [resource_type, id]) => {
                self.update(resource_type, &ResourceId::new(*id), request.body.clone())
            }
            (&Method::DELETE, [resource_type, id]) => {
                self.delete(resource_type, &ResourceId::new(*id))
            }
            _ => ApiResponse::status(StatusCode::METHOD_NOT_ALLOWED),
        }
    }

    fn create(&self, resource_type: &str, body: Option<ResourceDocument>) -> ApiResponse {
        let Some(doc) = body else {
            return ApiResponse::status(StatusCode::BAD_REQUEST);
        };
        match doc.primary() {
            Some(root) if root.resource_type == resource_type => {}
            _ => return ApiResponse::status(StatusCode::BAD_REQUEST),
        }

        let mut store = self.store.lock();
        let resources = doc.clone().into_resources();
        if resources.iter().any(|r| store.contains_key(&r.id)) {
            return ApiResponse::status(StatusCode::CONFLICT);
        }
        for resource in resources {
            store.insert(resource.id.clone(), resource);
        }

        ApiResponse::new(StatusCode::CREATED, Some(doc))
    }

    fn get(&self, resource_type: &str, id: &ResourceId) -> ApiResponse {
        match self.store.lock().get(id) {
            Some(resource) if resource.resource_type == resource_type => {
                ApiResponse::ok(ResourceDocument::single(resource.clone()))
            }
            _ => ApiResponse::status(StatusCode::NOT_FOUND),
        }
    }

    fn get_related(&self, resource_type: &str, id: &ResourceId, relationship: &str) -> ApiResponse {
        let store = self.store.lock();
        let owner = match store.get(id) {
            Some(owner) if owner.resource_type == resource_type => owner,
            _ => return ApiResponse::status(StatusCode::NOT_FOUND),
        };

        let identifiers = match owner.relationship(relationship).and_then(|r| r.data.as_ref()) {
            Some(RelationshipData::Many(ids)) => ids.clone(),
            Some(RelationshipData::One(id)) => vec![id.clone()],
            None => Vec::new(),
        };

        let related = identifiers
            .iter()
            .filter_map(|identifier| store.get(&identifier.id).cloned())
            .collect();

        ApiResponse::ok(ResourceDocument::collection(related))
    }

    fn update(
        &self,
        resource_type: &str,
        id: &ResourceId,
        body: Option<ResourceDocument>,
    ) -> ApiResponse {
        let patch = match body.map(|doc| doc.data) {
            Some(PrimaryData::Single(patch)) if &patch.id == id => patch,
            _ => return ApiResponse::status(StatusCode::BAD_REQUEST),
        };

        let mut store = self.store.lock();
        match store.get_mut(id) {
            Some(resource) if resource.resource_type == resource_type => {
                resource.merge(&patch);
                ApiResponse::ok(ResourceDocument::single(resource.clone()))
            }
            _ => ApiResponse::status(StatusCode::NOT_FOUND),
        }
    }

    fn delete(&self, resource_type: &str, id: &ResourceId) -> ApiResponse {
        let mut store = self.store.lock();
        match store.get(id) {
            Some(resource) if resource.resource_type == resource_type => {
                store.remove(id);
                ApiResponse::status(StatusCode::NO_CONTENT)
            }
            _ => ApiResponse::status(StatusCode::NOT_FOUND),
        }
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, request: ApiRequest) -> TransportResult<ApiResponse> {
        self.requests.lock().push(request.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let response = self.respond(&request);
        debug!("[InMemoryTransport] {} -> {}", request, response.status);
        Ok(response)
    }
}
