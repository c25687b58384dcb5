//! Response parsing utilities for the HTTP transport

use {
    crate::{ApiResponse, TransportResult},
    ::tracing::{instrument, trace},
    docgraph_schema::ResourceDocument,
    reqwest::Response,
    tap::TapFallible,
};

/// Turn a raw HTTP response into an [`ApiResponse`].
///
/// Only 2xx bodies are parsed as resource documents; error bodies are logged
/// at trace level and dropped so that a non-conforming error payload never
/// masks the status code.
#[instrument(
    name = "docgraph.response.parse",
    skip(res),
    fields(status = %res.status()),
    err
)]
pub(crate) async fn parse_response(res: Response) -> TransportResult<ApiResponse> {
    let status = res.status();
    let full = res.text().await?;

    if !status.is_success() {
        trace!("[HttpTransport] error response {}: {}", status, full);
        return Ok(ApiResponse::status(status));
    }

    Ok(ApiResponse::new(status, parse_document(&full)?))
}

/// Parse a body, treating an empty or whitespace-only body as absent.
pub(crate) fn parse_document(full: &str) -> TransportResult<Option<ResourceDocument>> {
    if full.trim().is_empty() {
        return Ok(None);
    }

    let doc = serde_json::from_str::<ResourceDocument>(full).tap_err(|e| {
        tracing::error!("failed to parse response text as a resource document ({:?}): {}", e, full);
    })?;

    trace!("[HttpTransport] response: {:#?}", &doc);
    Ok(Some(doc))
}
