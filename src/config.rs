//! Configuration types for screens-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable holding the bearer credential
pub const ACCESS_TOKEN_VAR: &str = "PERSONAL_ACCESS_TOKEN";

/// Environment variable holding the workspace (organization) identifier
pub const WORKSPACE_ID_VAR: &str = "WORKSPACE_ID";

/// Remote API connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API base URL (default: "https://api.zeplin.dev")
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Static bearer credential. Never serialized.
    #[serde(default, skip_serializing)]
    pub access_token: String,

    /// Workspace whose projects are exported
    #[serde(default)]
    pub workspace_id: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: String::new(),
            workspace_id: String::new(),
        }
    }
}

/// Request quota shared by every outbound HTTP call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed within one rolling window (default: 200)
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,

    /// Rolling window length, in milliseconds when serialized (default: 60000)
    #[serde(default = "default_window", with = "duration_millis_serde")]
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window: default_window(),
        }
    }
}

/// Sizes of the two admission gates
///
/// The gates are independent: every admitted screen may run up to
/// `max_concurrent_versions` version downloads of its own.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Screens downloading at once across the whole run (default: 20)
    #[serde(default = "default_concurrency")]
    pub max_concurrent_screens: usize,

    /// Version downloads at once within one screen (default: 20)
    #[serde(default = "default_concurrency")]
    pub max_concurrent_versions: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_screens: default_concurrency(),
            max_concurrent_versions: default_concurrency(),
        }
    }
}

/// Page sizes used when listing collections
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Projects requested per page (default: 20)
    #[serde(default = "default_project_page_size")]
    pub project_page_size: u32,

    /// Screens requested per page (default: 100)
    #[serde(default = "default_page_size")]
    pub screen_page_size: u32,

    /// Versions requested for a screen; only one page is read (default: 100)
    #[serde(default = "default_page_size")]
    pub version_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            project_page_size: default_project_page_size(),
            screen_page_size: default_page_size(),
            version_page_size: default_page_size(),
        }
    }
}

/// Retry configuration for transient request failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 0, every request is tried once)
    #[serde(default)]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_millis_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_millis_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// What happens when a screen's primary image cannot be saved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure, keep going, and list it in the final report (default)
    #[default]
    Collect,
    /// Stop the run at the first failure
    Abort,
}

/// Main configuration for a workspace export
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Output root, removed and recreated at the start of every run (default: "Output")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Shared request quota
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Admission gate sizes
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,

    /// Page sizes
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Retry behavior for transient failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Primary-download failure handling
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            output_dir: default_output_dir(),
            rate_limit: RateLimitConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            pagination: PaginationConfig::default(),
            retry: RetryConfig::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl Config {
    /// Load a configuration file in JSON format
    ///
    /// Missing fields take their defaults. Credentials are normally supplied
    /// afterwards with [`Config::apply_env`].
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("invalid config file {}: {}", path.display(), e),
            key: None,
        })
    }

    /// Default configuration with credentials taken from the process environment
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Fill the credential fields from `lookup`
    ///
    /// Both [`ACCESS_TOKEN_VAR`] and [`WORKSPACE_ID_VAR`] must resolve to a
    /// non-empty value; a missing one fails here, before any request is made.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api.access_token = required_var(&lookup, ACCESS_TOKEN_VAR, "api.access_token")?;
        self.api.workspace_id = required_var(&lookup, WORKSPACE_ID_VAR, "api.workspace_id")?;
        Ok(())
    }

    /// Check that the configuration can drive a run
    pub fn validate(&self) -> Result<()> {
        if self.api.access_token.trim().is_empty() {
            return Err(Error::config("access token is required", "api.access_token"));
        }
        if self.api.workspace_id.trim().is_empty() {
            return Err(Error::config("workspace id is required", "api.workspace_id"));
        }
        if self.api.base_url.cannot_be_a_base() {
            return Err(Error::config(
                format!("{} cannot be used as an API base URL", self.api.base_url),
                "api.base_url",
            ));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(Error::config(
                "must allow at least one request per window",
                "rate_limit.max_requests",
            ));
        }
        if self.rate_limit.window.is_zero() {
            return Err(Error::config("window must be longer than zero", "rate_limit.window"));
        }
        if self.concurrency.max_concurrent_screens == 0 {
            return Err(Error::config(
                "must be at least 1",
                "concurrency.max_concurrent_screens",
            ));
        }
        if self.concurrency.max_concurrent_versions == 0 {
            return Err(Error::config(
                "must be at least 1",
                "concurrency.max_concurrent_versions",
            ));
        }
        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "backoff multiplier must be a finite number of at least 1",
                "retry.backoff_multiplier",
            ));
        }
        for (key, size) in [
            ("pagination.project_page_size", self.pagination.project_page_size),
            ("pagination.screen_page_size", self.pagination.screen_page_size),
            ("pagination.version_page_size", self.pagination.version_page_size),
        ] {
            if size == 0 {
                return Err(Error::config("page size must be at least 1", key));
            }
        }
        Ok(())
    }
}

fn required_var<F>(lookup: &F, name: &str, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(Error::config(
            format!("environment variable {name} is not set"),
            key,
        )),
    }
}

// constant input
#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse("https://api.zeplin.dev").expect("default API URL is valid")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("Output")
}

fn default_max_requests() -> usize {
    200
}

fn default_window() -> Duration {
    Duration::from_secs(60)
}

fn default_concurrency() -> usize {
    20
}

fn default_project_page_size() -> u32 {
    20
}

fn default_page_size() -> u32 {
    100
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Durations are written as whole milliseconds
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
