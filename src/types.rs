//! Core types for screens-dl
//!
//! Response records are decoded straight from the API's JSON bodies. Only the
//! fields the exporter reads are declared; unknown fields are ignored, missing
//! required ones fail decoding.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Lifecycle status of a project
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Visible and editable; the only status that is exported
    Active,
    /// Archived by its owners
    Archived,
    /// Deleted, pending removal
    Deleted,
    /// Any status this crate does not know about
    #[serde(other)]
    Unknown,
}

/// A named container of screens
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier
    pub id: String,
    /// Display name, used for the output directory
    pub name: String,
    /// Lifecycle status
    pub status: ProjectStatus,
    /// Screen count reported by the API; decides how many screen pages are fetched
    pub number_of_screens: u32,
}

impl Project {
    /// Whether the project takes part in an export
    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }
}

/// Current image of a screen
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenImage {
    /// Full-resolution image URL
    pub original_url: Url,
}

/// A single design artifact with one current image and a version history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    /// Screen identifier
    pub id: String,
    /// Display name, used for the output file name
    pub name: String,
    /// Current image
    pub image: ScreenImage,
    /// Number of versions in the screen's history, the current one included
    pub number_of_versions: u32,
    /// Name of the owning project; not part of the API response, stamped on enumeration
    #[serde(default, skip_deserializing)]
    pub project_name: String,
}

impl Screen {
    /// Whether the screen's version history has to be downloaded too
    pub fn has_history(&self) -> bool {
        self.number_of_versions > 1
    }
}

/// A point-in-time snapshot of a screen's image
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenVersion {
    /// Image URL of this version
    pub image_url: Url,
    /// Creation timestamp, used verbatim as the file name suffix
    pub created: i64,
}

/// One unit of download work: a screen and the project it belongs to
#[derive(Clone, Debug)]
pub struct DownloadTask {
    /// Owning project, shared by all of its tasks
    pub project: Arc<Project>,
    /// Screen to download
    pub screen: Screen,
}

/// Counts of version downloads for one screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VersionSummary {
    /// Version images written to disk
    pub saved: usize,
    /// Versions that could not be listed, fetched or written
    pub failed: usize,
}

/// Result of one download task
#[derive(Debug)]
pub struct ScreenOutcome {
    /// Owning project's display name
    pub project_name: String,
    /// Screen display name
    pub screen_name: String,
    /// Path of the primary image, or why it could not be saved
    pub primary: crate::error::Result<PathBuf>,
    /// Version downloads for this screen
    pub versions: VersionSummary,
}

/// A screen whose primary image could not be saved
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenFailure {
    /// Owning project's display name
    pub project_name: String,
    /// Screen display name
    pub screen_name: String,
    /// Rendered error
    pub error: String,
}

/// Summary of a finished export run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Active projects that were enumerated
    pub projects: usize,
    /// Screens planned for download
    pub screens: usize,
    /// Primary images written to disk
    pub downloaded: usize,
    /// Version images written to disk
    pub versions_saved: usize,
    /// Version downloads that failed and were skipped
    pub versions_failed: usize,
    /// Screens whose primary image failed
    pub failures: Vec<ScreenFailure>,
}

impl ExportReport {
    /// True when every planned primary image was written
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.downloaded == self.screens
    }
}
