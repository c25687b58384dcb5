use thiserror::Error;

/// Failure to complete an exchange with the backend at all.
///
/// A response with a non-success status is *not* a transport error; it is
/// returned as an [`ApiResponse`](crate::ApiResponse) and classified by the
/// caller.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to (de)serialize resource document: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

pub type TransportResult<T> = Result<T, TransportError>;
