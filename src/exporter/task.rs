//! One screen's download: primary image, then progress tick, alongside its versions.

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::error::Result;
use crate::progress::ProgressSink;
use crate::sink::FileSink;
use crate::types::{DownloadTask, ScreenOutcome};
use crate::versions::VersionResolver;

/// Shared state every screen task needs
pub(crate) struct ScreenTaskContext {
    pub(crate) api: Arc<ApiClient>,
    pub(crate) sink: FileSink,
    pub(crate) versions: VersionResolver,
    pub(crate) progress: Arc<dyn ProgressSink>,
}

impl ScreenTaskContext {
    /// Download the screen's current image and, concurrently, its version history
    ///
    /// The progress tick happens as soon as the primary download finishes,
    /// whatever its outcome. Version failures only show up in the summary.
    pub(crate) async fn run(&self, task: DownloadTask) -> ScreenOutcome {
        let primary = async {
            let result = self.download_primary(&task).await;
            self.progress.tick();
            result
        };
        let versions = self.versions.resolve(&self.api, &self.sink, &task);
        let (primary, versions) = tokio::join!(primary, versions);

        ScreenOutcome {
            project_name: task.screen.project_name,
            screen_name: task.screen.name,
            primary,
            versions,
        }
    }

    async fn download_primary(&self, task: &DownloadTask) -> Result<PathBuf> {
        let screen = &task.screen;
        let bytes = self.api.fetch_image(&screen.image.original_url).await?;
        let path = self
            .sink
            .write(&screen.project_name, &screen.name, None, &bytes)
            .await?;
        tracing::trace!(path = %path.display(), "Saved screen");
        Ok(path)
    }
}
