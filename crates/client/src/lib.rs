//! Transport layer for docgraph.
//!
//! The object mapper talks to its backend exclusively through the
//! [`Transport`] trait: one [`ApiRequest`] in, one [`ApiResponse`] out. This
//! crate provides the request constructors for the five JSON:API exchanges the
//! mapper uses, an [`HttpTransport`] built on `reqwest`, and, behind the
//! `testing` feature, an in-memory backend.
//!
//! # Example
//! ```ignore
//! use docgraph_client::{ApiRequest, ClientConfig, HttpTransport, Transport};
//!
//! let transport = HttpTransport::new(ClientConfig::new("https://api.example.com/v1")?)?;
//! let res = transport.send(ApiRequest::get_resource("person", &id)).await?;
//! if res.is_not_found() { /* ... */ }
//! ```

mod config;
mod err;
pub mod http;
mod request;
mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{ClientConfig, BASE_URL_ENV, USER_AGENT_ENV};
pub use err::{TransportError, TransportResult};
pub use http::{ConcurrencyLimitConfig, HttpTransport};
pub use request::{ApiRequest, ApiResponse, JSON_API_MEDIA_TYPE};
pub use transport::Transport;

// Re-exported so callers can build and inspect requests without a direct reqwest dependency.
pub use reqwest::{Method, StatusCode};
