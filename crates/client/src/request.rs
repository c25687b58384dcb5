//! Request and response values exchanged with a [`Transport`](crate::Transport).

use docgraph_schema::{Resource, ResourceDocument, ResourceId};
use reqwest::{Method, StatusCode};
use std::borrow::Cow;
use std::fmt;

/// Media type of every request and response body.
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// A transport-agnostic request: method, path relative to the API root, body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<ResourceDocument>,
}

impl ApiRequest {
    /// `POST /{type}` with the root resource and everything it includes.
    pub fn create_resource(root: Resource, included: Vec<Resource>) -> Self {
        let path = segment(&root.resource_type).into_owned();
        Self {
            method: Method::POST,
            path,
            body: Some(ResourceDocument::single(root).with_included(included)),
        }
    }

    /// `GET /{type}/{id}`
    pub fn get_resource(resource_type: &str, id: &ResourceId) -> Self {
        Self {
            method: Method::GET,
            path: format!("{}/{}", segment(resource_type), segment(id.as_str())),
            body: None,
        }
    }

    /// `PATCH /{type}/{id}` carrying only what changed.
    pub fn update_resource(patch: Resource) -> Self {
        Self {
            method: Method::PATCH,
            path: format!(
                "{}/{}",
                segment(&patch.resource_type),
                segment(patch.id.as_str())
            ),
            body: Some(ResourceDocument::single(patch)),
        }
    }

    /// `DELETE /{type}/{id}`
    pub fn delete_resource(resource_type: &str, id: &ResourceId) -> Self {
        Self {
            method: Method::DELETE,
            path: format!("{}/{}", segment(resource_type), segment(id.as_str())),
            body: None,
        }
    }

    /// `GET /{type}/{id}/{relationship}`
    pub fn get_related(resource_type: &str, id: &ResourceId, relationship: &str) -> Self {
        Self {
            method: Method::GET,
            path: format!(
                "{}/{}/{}",
                segment(resource_type),
                segment(id.as_str()),
                segment(relationship)
            ),
            body: None,
        }
    }

    /// Reads never change server state; everything else counts as a write.
    pub fn is_read(&self) -> bool {
        self.method == Method::GET
    }
}

/// Percent-encode one path segment. Ids are opaque, so `/`, `?`, `#` and `%`
/// must not reach the URL parser unescaped.
fn segment(raw: &str) -> Cow<'_, str> {
    urlencoding::encode(raw)
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} /{}", self.method, self.path)
    }
}

/// The status and, for successful exchanges, the parsed body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<ResourceDocument>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Option<ResourceDocument>) -> Self {
        Self { status, body }
    }

    pub fn ok(body: ResourceDocument) -> Self {
        Self::new(StatusCode::OK, Some(body))
    }

    pub fn status(status: StatusCode) -> Self {
        Self::new(status, None)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn paths_follow_resource_layout() {
        let id = ResourceId::new("42");
        assert_eq!(ApiRequest::get_resource("person", &id).path, "person/42");
        assert_eq!(ApiRequest::delete_resource("person", &id).path, "person/42");
        assert_eq!(
            ApiRequest::get_related("person", &id, "pets").path,
            "person/42/pets"
        );

        let create = ApiRequest::create_resource(Resource::new(id.clone(), "person"), vec![]);
        assert_eq!(create.method, Method::POST);
        assert_eq!(create.path, "person");
        assert_eq!(create.body.unwrap().included, Some(vec![]));

        let update = ApiRequest::update_resource(Resource::new(id, "person"));
        assert_eq!(update.method, Method::PATCH);
        assert_eq!(update.path, "person/42");
    }

    #[test]
    fn reserved_characters_stay_inside_their_segment() {
        let path = |raw: &str| ApiRequest::get_resource("person", &ResourceId::new(raw)).path;
        assert_eq!(path("a/b"), "person/a%2Fb");
        assert_eq!(path("x?y=1"), "person/x%3Fy%3D1");
        assert_eq!(path("frag#1"), "person/frag%231");
        assert_eq!(path("50%"), "person/50%25");
        assert_eq!(path("with space"), "person/with%20space");

        let related = ApiRequest::get_related("person", &ResourceId::new("a/b"), "pets");
        assert_eq!(related.path, "person/a%2Fb/pets");
        let update = ApiRequest::update_resource(Resource::new(ResourceId::new("a/b"), "person"));
        assert_eq!(update.path, "person/a%2Fb");
    }

    #[test]
    fn classifies_reads_and_statuses() {
        assert!(ApiRequest::get_resource("a", &ResourceId::new("1")).is_read());
        assert!(!ApiRequest::delete_resource("a", &ResourceId::new("1")).is_read());

        assert!(ApiResponse::status(StatusCode::NO_CONTENT).is_success());
        assert!(ApiResponse::status(StatusCode::NOT_FOUND).is_not_found());
        assert!(!ApiResponse::status(StatusCode::INTERNAL_SERVER_ERROR).is_success());
    }
}
