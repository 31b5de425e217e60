//! Client for the design-asset API
//!
//! Builds endpoint URLs, sends every request through the shared transport and
//! decodes response bodies into the typed records from [`crate::types`]. A body
//! that does not match its schema fails with [`Error::Schema`] right here, so
//! the rest of the pipeline only ever sees well-formed records.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{ApiConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::pagination::Page;
use crate::retry::with_retry;
use crate::transport::{Request, Transport};
use crate::types::{Project, Screen, ScreenVersion};

/// Typed access to the three list endpoints and to image URLs
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
    access_token: String,
    workspace_id: String,
    retry: RetryConfig,
}

impl ApiClient {
    /// Create a client that sends its requests through `transport`
    pub fn new(transport: Arc<dyn Transport>, api: &ApiConfig, retry: RetryConfig) -> Self {
        Self {
            transport,
            base_url: api.base_url.clone(),
            access_token: api.access_token.clone(),
            workspace_id: api.workspace_id.clone(),
            retry,
        }
    }

    /// Workspace whose projects this client lists
    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    /// One page of the workspace's projects, every status included
    pub async fn list_projects(&self, page: Page) -> Result<Vec<Project>> {
        let url = self.endpoint(
            &["v1", "organizations", &self.workspace_id, "projects"],
            page,
        )?;
        self.get_json(url).await
    }

    /// One page of a project's screens
    pub async fn list_screens(&self, project_id: &str, page: Page) -> Result<Vec<Screen>> {
        let url = self.endpoint(&["v1", "projects", project_id, "screens"], page)?;
        self.get_json(url).await
    }

    /// One page of a screen's version history
    pub async fn list_screen_versions(
        &self,
        project_id: &str,
        screen_id: &str,
        page: Page,
    ) -> Result<Vec<ScreenVersion>> {
        let url = self.endpoint(
            &["v1", "projects", project_id, "screens", screen_id, "versions"],
            page,
        )?;
        self.get_json(url).await
    }

    /// Download an image from a URL returned by one of the list endpoints
    pub async fn fetch_image(&self, url: &Url) -> Result<Vec<u8>> {
        let request = Request::asset(url.clone());
        with_retry(&self.retry, || self.transport.get(request.clone())).await
    }

    fn endpoint(&self, segments: &[&str], page: Page) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::config(
                    format!("{} cannot be used as an API base URL", self.base_url),
                    "api.base_url",
                )
            })?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("offset", &page.offset.to_string())
            .append_pair("limit", &page.limit.to_string());
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(url = %url, "Fetching page");
        let request = Request::api(url, &self.access_token);
        let body = with_retry(&self.retry, || self.transport.get(request.clone())).await?;
        serde_json::from_slice(&body).map_err(|source| Error::Schema {
            endpoint: request.url.path().to_string(),
            source,
        })
    }
}
