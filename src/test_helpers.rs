//! Shared test helpers: an in-memory transport and client/config builders.

use crate::api::ApiClient;
use crate::config::{ApiConfig, Config, RetryConfig};
use crate::error::{Error, Result};
use crate::transport::{Request, Transport};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Canned reply for one route
#[derive(Clone)]
enum Reply {
    Body(Vec<u8>),
    Status(u16),
}

/// In-memory [`Transport`] that serves canned bodies by URL path and records every request.
///
/// A route registered as `"/path?query"` takes precedence over a plain `"/path"` route.
/// Unknown routes answer 404.
pub(crate) struct FakeTransport {
    routes: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<Request>>,
    delay: Option<Duration>,
    assets_in_flight: AtomicUsize,
    peak_assets: AtomicUsize,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
            assets_in_flight: AtomicUsize::new(0),
            peak_assets: AtomicUsize::new(0),
        }
    }

    /// Every request sleeps for `delay` before answering
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn route_json(&self, route: &str, body: serde_json::Value) {
        self.route_bytes(route, body.to_string().into_bytes());
    }

    pub(crate) fn route_bytes(&self, route: &str, body: Vec<u8>) {
        self.routes
            .lock()
            .unwrap()
            .insert(route.to_string(), Reply::Body(body));
    }

    pub(crate) fn route_status(&self, route: &str, status: u16) {
        self.routes
            .lock()
            .unwrap()
            .insert(route.to_string(), Reply::Status(status));
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose path starts with `prefix`
    pub(crate) fn requests_to(&self, prefix: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.path().starts_with(prefix))
            .collect()
    }

    /// Most image fetches (requests without credentials) seen in flight together
    pub(crate) fn peak_asset_fetches(&self) -> usize {
        self.peak_assets.load(Ordering::SeqCst)
    }

    fn reply_for(&self, url: &Url) -> Reply {
        let routes = self.routes.lock().unwrap();
        let with_query = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        routes
            .get(&with_query)
            .or_else(|| routes.get(url.path()))
            .cloned()
            .unwrap_or(Reply::Status(404))
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn get(&self, request: Request) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(request.clone());
        let asset = request.bearer.is_none();
        if asset {
            let now = self.assets_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_assets.fetch_max(now, Ordering::SeqCst);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if asset {
            self.assets_in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        match self.reply_for(&request.url) {
            Reply::Body(body) => Ok(body),
            Reply::Status(status) => Err(Error::Status {
                url: request.url.to_string(),
                status,
            }),
        }
    }
}

/// Configuration pointing at `https://api.example.com` with test credentials
pub(crate) fn test_config(output_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.api = ApiConfig {
        base_url: Url::parse("https://api.example.com").unwrap(),
        access_token: "test-token".to_string(),
        workspace_id: "ws-1".to_string(),
    };
    config.output_dir = output_dir.to_path_buf();
    config.rate_limit.max_requests = 100_000;
    config.rate_limit.window = Duration::from_secs(1);
    config
}

/// An [`ApiClient`] for workspace `ws-1` that talks to `transport` directly
pub(crate) fn api_client(transport: Arc<FakeTransport>) -> ApiClient {
    let config = test_config(std::path::Path::new("unused"));
    ApiClient::new(transport, &config.api, RetryConfig::default())
}

/// JSON for a screen whose image lives at `https://cdn.example.com/img/<id>.png`
pub(crate) fn screen_json(id: &str, name: &str, versions: u32) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "image": { "original_url": format!("https://cdn.example.com/img/{id}.png") },
        "number_of_versions": versions,
    })
}
