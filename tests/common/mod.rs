//! Shared fixtures for the screens-dl integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use screens_dl::config::ApiConfig;
use screens_dl::{Config, Error, Request, Result, Transport};
use serde_json::{Value, json};
use url::Url;

/// Config for workspace `ws-1` at `base_url`, with a quota no test will hit
pub fn config_for(base_url: &str, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.api = ApiConfig {
        base_url: Url::parse(base_url).unwrap(),
        access_token: "secret-token".to_string(),
        workspace_id: "ws-1".to_string(),
    };
    config.output_dir = output_dir.to_path_buf();
    config.rate_limit.max_requests = 100_000;
    config.rate_limit.window = Duration::from_secs(60);
    config
}

/// Every file under `root`, relative and sorted
pub fn files_under(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

/// In-memory workspace that answers paginated listings by offset and limit
/// and records how many asset downloads were in flight at once.
pub struct SyntheticWorkspace {
    projects: Vec<Value>,
    screens: HashMap<String, Vec<Value>>,
    asset_delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    assets: AtomicUsize,
    listings: Mutex<Vec<String>>,
}

impl SyntheticWorkspace {
    /// `screen_counts[i]` screens in project `p{i}`, each with a single version
    pub fn new(screen_counts: &[usize], asset_delay: Duration) -> Self {
        let mut projects = Vec::new();
        let mut screens = HashMap::new();
        for (index, &count) in screen_counts.iter().enumerate() {
            let id = format!("p{index}");
            projects.push(json!({
                "id": id,
                "name": format!("Project {index}"),
                "status": "active",
                "number_of_screens": count,
            }));
            let list = (0..count)
                .map(|n| {
                    json!({
                        "id": format!("{id}-s{n}"),
                        "name": format!("Screen {n}"),
                        "image": {
                            "original_url": format!("https://cdn.example.com/{id}/{n}.png")
                        },
                        "number_of_versions": 1,
                    })
                })
                .collect();
            screens.insert(id, list);
        }

        Self {
            projects,
            screens,
            asset_delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            assets: AtomicUsize::new(0),
            listings: Mutex::new(Vec::new()),
        }
    }

    /// Highest number of asset downloads observed in flight together
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Number of asset downloads served
    pub fn assets_served(&self) -> usize {
        self.assets.load(Ordering::SeqCst)
    }

    /// Listing requests as `path?query`, in arrival order
    pub fn listings(&self) -> Vec<String> {
        self.listings.lock().unwrap().clone()
    }

    fn page(items: &[Value], url: &Url) -> Vec<u8> {
        let mut offset = 0;
        let mut limit = items.len();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "offset" => offset = value.parse().unwrap(),
                "limit" => limit = value.parse().unwrap(),
                _ => {}
            }
        }
        let page: Vec<&Value> = items.iter().skip(offset).take(limit).collect();
        serde_json::to_vec(&page).unwrap()
    }

    async fn serve_asset(&self, url: &Url) -> Vec<u8> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.asset_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.assets.fetch_add(1, Ordering::SeqCst);
        url.path().as_bytes().to_vec()
    }
}

#[async_trait::async_trait]
impl Transport for SyntheticWorkspace {
    async fn get(&self, request: Request) -> Result<Vec<u8>> {
        if request.bearer.is_none() {
            return Ok(self.serve_asset(&request.url).await);
        }

        let url = &request.url;
        self.listings.lock().unwrap().push(format!(
            "{}?{}",
            url.path(),
            url.query().unwrap_or_default()
        ));

        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        match segments.as_slice() {
            ["v1", "organizations", _, "projects"] => Ok(Self::page(&self.projects, url)),
            ["v1", "projects", project, "screens"] => match self.screens.get(*project) {
                Some(screens) => Ok(Self::page(screens, url)),
                None => Err(Error::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            },
            _ => Err(Error::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
