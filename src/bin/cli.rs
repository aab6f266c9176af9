//! ts-updater - Main entry point for CLI binary
//!
//! Picks a branch, downloads the TS templates and merges them into the local translations.

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tsupdate_lib::engine::{
    cli::{formatter::CliFormatter, Cli},
    config::UpdaterConfig,
    error::{UpdaterError, EXIT_FATAL, EXIT_OK},
    fetch::HttpSource,
    merge::{LconvertTool, MergeOrchestrator},
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run_cli(cli) {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(e) => match e.downcast_ref::<UpdaterError>() {
            Some(err) => {
                if let Some(fetch) = err.fetch_failure() {
                    CliFormatter::network_failure(fetch);
                } else {
                    CliFormatter::error(&err.to_string());
                }
                ExitCode::from(err.exit_code())
            }
            None => {
                CliFormatter::error(&format!("{:#}", e));
                ExitCode::from(EXIT_FATAL)
            }
        },
    }
}

// Logs go to stderr so they never mix with the branch prompt.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .with(filter)
        .init();
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let started = Instant::now();
    let work_dir = cli.get_work_dir();
    let work_dir = work_dir
        .canonicalize()
        .with_context(|| format!("Working directory is not accessible: {}", work_dir.display()))?;

    let config = match &cli.config {
        Some(path) => UpdaterConfig::load(path),
        None => UpdaterConfig::discover(&work_dir),
    }
    .map_err(UpdaterError::from)?;
    tracing::debug!(?config, dir = %work_dir.display(), "starting update");

    let source = HttpSource::new();
    let tool = LconvertTool::new(config.merge_program.clone());
    let orchestrator = MergeOrchestrator::new(&config, &source, &tool, &work_dir);
    let request = cli.update_request();

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();

    let report = orchestrator
        .run(&request, &mut input, &mut output, CliFormatter::event)
        .map_err(UpdaterError::from)?;

    CliFormatter::summary(&report, started.elapsed().as_secs());
    UpdaterError::check_report(&report)?;

    Ok(())
}
