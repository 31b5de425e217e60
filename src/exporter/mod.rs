//! Run orchestration
//!
//! A run goes through these steps in order:
//! 1. list active projects, then all of their screens (projects in parallel)
//! 2. flatten the screens into download tasks
//! 3. reset the output directory
//! 4. admit one task per screen through the [`DownloadScheduler`] and wait for all of them
//!
//! Enumeration failures end the run. Primary-download failures follow
//! [`FailurePolicy`]. Version failures never affect the outcome.

mod task;

use std::sync::Arc;

use futures::future::try_join_all;
use tokio::task::{JoinError, JoinSet};

use crate::api::ApiClient;
use crate::config::{Config, FailurePolicy};
use crate::enumerate;
use crate::error::{Error, Result};
use crate::progress::{NoProgress, ProgressSink};
use crate::scheduler::DownloadScheduler;
use crate::sink::FileSink;
use crate::transport::{RateLimitedTransport, RateLimiter, ReqwestTransport, Transport};
use crate::types::{DownloadTask, ExportReport, Project, ScreenFailure, ScreenOutcome};
use crate::versions::VersionResolver;

use task::ScreenTaskContext;

/// Everything a run will download, as enumerated from the API
#[derive(Debug, Default)]
pub struct ExportPlan {
    /// Active projects
    pub projects: Vec<Arc<Project>>,
    /// One task per screen of every active project
    pub tasks: Vec<DownloadTask>,
}

/// Exports every screen of a workspace to disk
pub struct ScreenExporter {
    config: Config,
    api: Arc<ApiClient>,
    limiter: RateLimiter,
    progress: Arc<dyn ProgressSink>,
}

impl ScreenExporter {
    /// Create an exporter talking to the configured API over HTTP
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be created
    pub fn new(config: Config) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
        Self::with_transport(config, transport)
    }

    /// Create an exporter sending its requests through `transport`
    ///
    /// The transport is wrapped in the run's rate limiter, so every request,
    /// listing or image, counts against the same quota.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let limiter = RateLimiter::from_config(&config.rate_limit);
        let limited: Arc<dyn Transport> =
            Arc::new(RateLimitedTransport::new(transport, limiter.clone()));
        let api = Arc::new(ApiClient::new(limited, &config.api, config.retry.clone()));

        Ok(Self {
            config,
            api,
            limiter,
            progress: Arc::new(NoProgress),
        })
    }

    /// Report progress to `progress` instead of discarding it
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The rate limiter shared by every request of this exporter
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Enumerate active projects and all of their screens
    pub async fn plan(&self) -> Result<ExportPlan> {
        let pagination = &self.config.pagination;
        let projects: Vec<Arc<Project>> =
            enumerate::active_projects(&self.api, pagination.project_page_size)
                .await?
                .into_iter()
                .map(Arc::new)
                .collect();

        let screen_page_size = pagination.screen_page_size;
        let per_project = try_join_all(projects.iter().map(|project| async move {
            let screens =
                enumerate::project_screens(&self.api, project, screen_page_size).await?;
            Ok::<_, Error>(
                screens
                    .into_iter()
                    .map(|screen| DownloadTask {
                        project: Arc::clone(project),
                        screen,
                    })
                    .collect::<Vec<_>>(),
            )
        }))
        .await?;
        let tasks: Vec<DownloadTask> = per_project.into_iter().flatten().collect();

        tracing::info!(
            projects = projects.len(),
            screens = tasks.len(),
            "Planned export"
        );
        Ok(ExportPlan { projects, tasks })
    }

    /// Run a full export: plan, reset the output directory, download everything
    pub async fn run(&self) -> Result<ExportReport> {
        let plan = self.plan().await?;
        let sink = FileSink::reset(&self.config.output_dir).await?;
        self.execute(plan, sink).await
    }

    /// Download every task of `plan` into `sink`
    pub async fn execute(&self, plan: ExportPlan, sink: FileSink) -> Result<ExportReport> {
        let mut report = ExportReport {
            projects: plan.projects.len(),
            screens: plan.tasks.len(),
            ..Default::default()
        };

        self.progress.start(report.screens as u64);
        let result = self.download_all(plan.tasks, sink, &mut report).await;
        self.progress.finish();
        result?;

        tracing::info!(
            screens = report.screens,
            downloaded = report.downloaded,
            failed = report.failures.len(),
            versions_saved = report.versions_saved,
            versions_failed = report.versions_failed,
            "Export finished"
        );
        Ok(report)
    }

    async fn download_all(
        &self,
        tasks: Vec<DownloadTask>,
        sink: FileSink,
        report: &mut ExportReport,
    ) -> Result<()> {
        let concurrency = &self.config.concurrency;
        let scheduler = DownloadScheduler::new(concurrency.max_concurrent_screens);
        let ctx = Arc::new(ScreenTaskContext {
            api: Arc::clone(&self.api),
            sink,
            versions: VersionResolver::new(
                concurrency.max_concurrent_versions,
                self.config.pagination.version_page_size,
            ),
            progress: Arc::clone(&self.progress),
        });

        // Dropping the set on an early return aborts whatever is still running.
        let mut running = JoinSet::new();
        for task in tasks {
            // Acquire a permit before spawning so admission follows submission order
            let permit = scheduler.admit().await?;
            let ctx = Arc::clone(&ctx);
            running.spawn(async move {
                let _permit = permit;
                ctx.run(task).await
            });

            while let Some(joined) = running.try_join_next() {
                self.record(joined, report)?;
            }
        }

        while let Some(joined) = running.join_next().await {
            self.record(joined, report)?;
        }
        Ok(())
    }

    fn record(
        &self,
        joined: std::result::Result<ScreenOutcome, JoinError>,
        report: &mut ExportReport,
    ) -> Result<()> {
        let outcome = joined.map_err(|e| Error::TaskFailed(e.to_string()))?;
        report.versions_saved += outcome.versions.saved;
        report.versions_failed += outcome.versions.failed;

        let error = match outcome.primary {
            Ok(_) => {
                report.downloaded += 1;
                return Ok(());
            }
            Err(e) => e,
        };

        tracing::error!(
            project = %outcome.project_name,
            screen = %outcome.screen_name,
            error = %error,
            "Failed to download screen"
        );
        match self.config.failure_policy {
            FailurePolicy::Abort => Err(Error::ScreenDownload {
                project: outcome.project_name,
                screen: outcome.screen_name,
                source: Box::new(error),
            }),
            FailurePolicy::Collect => {
                report.failures.push(ScreenFailure {
                    project_name: outcome.project_name,
                    screen_name: outcome.screen_name,
                    error: error.to_string(),
                });
                Ok(())
            }
        }
    }
}
