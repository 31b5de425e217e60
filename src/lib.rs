//! # screens-dl
//!
//! Bulk exporter for design workspaces: lists every active project of a
//! workspace, every screen of those projects and every earlier version of each
//! screen, and downloads all of their images into a deterministic tree:
//!
//! ```text
//! <output>/<project>/<screen>.png
//! <output>/<project>/<screen>_<version-created>.png
//! ```
//!
//! ## Design
//!
//! - **One request budget** - every request, listing or image, shares a single
//!   rolling-window rate limit
//! - **Bounded fan-out** - a global gate limits concurrent screen downloads and
//!   each screen limits its own version downloads
//! - **Partial-failure tolerant** - version failures are logged and skipped;
//!   primary failures are collected into the final report (or abort the run, if configured)
//! - **Typed boundary** - API responses are decoded into explicit structs, so a
//!   malformed body fails with a schema error where it arrives
//!
//! ## Quick Start
//!
//! ```no_run
//! use screens_dl::{Config, ScreenExporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads PERSONAL_ACCESS_TOKEN and WORKSPACE_ID
//!     let config = Config::from_env()?;
//!
//!     let report = ScreenExporter::new(config)?.run().await?;
//!     println!("{} of {} screens saved", report.downloaded, report.screens);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Typed client for the remote API
pub mod api;
/// Configuration types
pub mod config;
/// Project and screen enumeration
pub mod enumerate;
/// Error types
pub mod error;
/// Run orchestration
pub mod exporter;
/// Offset/limit pagination
pub mod pagination;
/// Progress reporting
pub mod progress;
/// Retry logic with exponential backoff
pub mod retry;
/// Global admission gate for screen downloads
pub mod scheduler;
/// Output tree and path normalization
pub mod sink;
/// HTTP transport and rate limiting
pub mod transport;
/// Core types
pub mod types;
/// Version history downloads
pub mod versions;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{Config, FailurePolicy};
pub use error::{Error, Result};
pub use exporter::{ExportPlan, ScreenExporter};
pub use progress::{BarLogWriter, NoProgress, ProgressBarSink, ProgressSink};
pub use transport::{RateLimitedTransport, RateLimiter, ReqwestTransport, Request, Transport};
pub use types::{
    DownloadTask, ExportReport, Project, ProjectStatus, Screen, ScreenFailure, ScreenVersion,
};
