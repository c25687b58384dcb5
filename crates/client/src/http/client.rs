use super::concurrency_limiter::ConcurrencyLimiter;
use super::response::parse_response;
use crate::request::JSON_API_MEDIA_TYPE;
use crate::{ApiRequest, ApiResponse, ClientConfig, Transport, TransportResult};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, instrument};

/// [`Transport`] over HTTP using `reqwest`.
///
/// Cheap to clone; clones share the connection pool and concurrency budget.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    config: ClientConfig,
    limiter: ConcurrencyLimiter,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> TransportResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self::with_client(http, config))
    }

    /// Use a preconfigured `reqwest` client, e.g. one with timeouts or auth
    /// middleware already applied.
    pub fn with_client(http: reqwest::Client, config: ClientConfig) -> Self {
        let limiter = ConcurrencyLimiter::new(config.concurrency.as_ref());
        Self {
            http,
            config,
            limiter,
        }
    }

    pub fn from_env() -> TransportResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    #[instrument(
        name = "docgraph.http.send",
        skip(self, request),
        fields(
            method = %request.method,
            path = %request.path
        ),
        err
    )]
    async fn send(&self, request: ApiRequest) -> TransportResult<ApiResponse> {
        let url = self.config.url_for(&request.path)?;
        let _permit = self.limiter.acquire(request.is_read()).await;

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(ACCEPT, JSON_API_MEDIA_TYPE);

        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, JSON_API_MEDIA_TYPE)
                .body(serde_json::to_vec(body)?);
        }

        let res = builder.send().await?;
        debug!("{} -> {}", request, res.status());

        parse_response(res).await
    }
}
