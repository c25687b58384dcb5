use crate::{ApiRequest, ApiResponse, TransportResult};
use std::fmt::Debug;

/// The seam between the object mapper and the wire.
///
/// Implementations perform one request/response exchange. They do not
/// interpret statuses beyond parsing successful bodies, and they do not retry;
/// timeouts and retry policy belong to the implementation's own configuration.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn send(&self, request: ApiRequest) -> TransportResult<ApiResponse>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: ApiRequest) -> TransportResult<ApiResponse> {
        (**self).send(request).await
    }
}
