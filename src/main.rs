use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use screens_dl::{
    Config, ExportReport, FailurePolicy, NoProgress, ProgressBarSink, ProgressSink, ScreenExporter,
};
use tracing_subscriber::fmt::MakeWriter;

/// Download every screen and screen version of a workspace
#[derive(Debug, Parser)]
#[command(name = "screens-dl", version, about)]
struct Cli {
    /// JSON configuration file; credentials still come from the environment
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Output directory; removed and recreated on every run
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Screens downloaded at once
    #[arg(long, value_name = "N")]
    max_concurrent_screens: Option<usize>,

    /// Version downloads at once within one screen
    #[arg(long, value_name = "N")]
    max_concurrent_versions: Option<usize>,

    /// Stop at the first screen that cannot be downloaded
    #[arg(long)]
    fail_fast: bool,

    /// Do not draw the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(report) if report.is_complete() => {}
        Ok(_) => std::process::exit(1),
        Err(error) => {
            eprintln!("screens-dl error: {error:#}");
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<ExportReport> {
    let cli = Cli::parse();
    let bar = (!cli.no_progress).then(ProgressBarSink::new);
    match &bar {
        // Log lines are printed above the bar instead of through it
        Some(bar) => init_tracing(cli.quiet, cli.verbose, bar.log_writer())?,
        None => init_tracing(cli.quiet, cli.verbose, std::io::stderr)?,
    }

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let config = load_config(&cli)?;
    let progress: Arc<dyn ProgressSink> = match bar {
        Some(bar) => Arc::new(bar),
        None => Arc::new(NoProgress),
    };
    let exporter = ScreenExporter::new(config)
        .context("failed to set up the exporter")?
        .with_progress(progress);

    let report = exporter.run().await?;
    print_summary(&report);
    Ok(report)
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    config.apply_env(|name| std::env::var(name).ok())?;

    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if let Some(n) = cli.max_concurrent_screens {
        config.concurrency.max_concurrent_screens = n;
    }
    if let Some(n) = cli.max_concurrent_versions {
        config.concurrency.max_concurrent_versions = n;
    }
    if cli.fail_fast {
        config.failure_policy = FailurePolicy::Abort;
    }

    config.validate()?;
    Ok(config)
}

fn print_summary(report: &ExportReport) {
    println!(
        "Saved {}/{} screens from {} projects, {} versions ({} version downloads failed)",
        report.downloaded,
        report.screens,
        report.projects,
        report.versions_saved,
        report.versions_failed
    );
    for failure in &report.failures {
        println!(
            "  failed: {} / {}: {}",
            failure.project_name, failure.screen_name, failure.error
        );
    }
}

fn init_tracing<W>(quiet: bool, verbose: bool, writer: W) -> anyhow::Result<()>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_env("SCREENS_DL_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}
