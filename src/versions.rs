//! Version history downloads
//!
//! Best-effort: every failure is logged and counted, never returned.

use futures::stream::{self, StreamExt};

use crate::api::ApiClient;
use crate::error::Result;
use crate::pagination::Page;
use crate::sink::FileSink;
use crate::types::{DownloadTask, ScreenVersion, VersionSummary};

/// Downloads the version history of screens that have one
#[derive(Clone, Debug)]
pub struct VersionResolver {
    /// Version downloads in flight at once for one screen
    max_concurrent: usize,
    /// Versions requested; only the first page is read
    page_size: u32,
}

impl VersionResolver {
    /// Create a resolver with its own per-screen concurrency limit
    pub fn new(max_concurrent: usize, page_size: u32) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            page_size,
        }
    }

    /// Download every listed version of `task.screen`
    ///
    /// Does nothing for screens with a single version. Histories longer than
    /// one page lose their tail.
    pub async fn resolve(
        &self,
        api: &ApiClient,
        sink: &FileSink,
        task: &DownloadTask,
    ) -> VersionSummary {
        let screen = &task.screen;
        if !screen.has_history() {
            return VersionSummary::default();
        }

        let versions = match api
            .list_screen_versions(
                &task.project.id,
                &screen.id,
                Page {
                    offset: 0,
                    limit: self.page_size,
                },
            )
            .await
        {
            Ok(versions) => versions,
            Err(e) => {
                tracing::warn!(
                    project = %screen.project_name,
                    screen = %screen.name,
                    error = %e,
                    "Failed to list screen versions"
                );
                return VersionSummary {
                    saved: 0,
                    failed: 1,
                };
            }
        };

        if versions.len() < screen.number_of_versions as usize
            && versions.len() == self.page_size as usize
        {
            tracing::debug!(
                screen = %screen.name,
                listed = versions.len(),
                reported = screen.number_of_versions,
                "Version history truncated to one page"
            );
        }

        let results: Vec<Result<()>> = stream::iter(versions)
            .map(|version| self.download_version(api, sink, task, version))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        results
            .into_iter()
            .fold(VersionSummary::default(), |mut summary, result| {
                match result {
                    Ok(()) => summary.saved += 1,
                    Err(_) => summary.failed += 1,
                }
                summary
            })
    }

    async fn download_version(
        &self,
        api: &ApiClient,
        sink: &FileSink,
        task: &DownloadTask,
        version: ScreenVersion,
    ) -> Result<()> {
        let screen = &task.screen;
        let outcome = async {
            let bytes = api.fetch_image(&version.image_url).await?;
            sink.write(&screen.project_name, &screen.name, Some(version.created), &bytes)
                .await
        }
        .await;

        match outcome {
            Ok(path) => {
                tracing::trace!(path = %path.display(), "Saved screen version");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    project = %screen.project_name,
                    screen = %screen.name,
                    created = version.created,
                    error = %e,
                    "Failed to download screen version"
                );
                Err(e)
            }
        }
    }
}
