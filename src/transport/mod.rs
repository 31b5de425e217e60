//! HTTP egress
//!
//! Every request the exporter makes goes through a [`Transport`]. The
//! production implementation is [`ReqwestTransport`]; the exporter always wraps
//! it in a [`RateLimitedTransport`] so that the whole run shares one quota.

mod rate_limit;

pub use rate_limit::{RateLimitedTransport, RateLimiter};

use crate::error::{Error, Result};
use url::Url;

/// A `GET` request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// Target URL, query included
    pub url: Url,
    /// Bearer credential sent in the `Authorization` header, if any
    pub bearer: Option<String>,
}

impl Request {
    /// An authenticated API request
    pub fn api(url: Url, token: &str) -> Self {
        Self {
            url,
            bearer: Some(token.to_string()),
        }
    }

    /// A request for a pre-signed asset URL, sent without credentials
    pub fn asset(url: Url) -> Self {
        Self { url, bearer: None }
    }
}

/// Abstraction over HTTP fetching, enabling testability and request shaping.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Issue the request and return the full response body.
    ///
    /// Non-success statuses are errors.
    async fn get(&self, request: Request) -> Result<Vec<u8>>;
}

/// Production [`Transport`] backed by a shared `reqwest` client.
///
/// No timeout is configured: slow responses are waited for.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the HTTP client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("screens-dl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: Request) -> Result<Vec<u8>> {
        let mut builder = self.client.get(request.url.clone());
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: request.url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
