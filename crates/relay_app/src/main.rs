mod cli;
mod config;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use relay_engine::{
    DiscoveryStage, FfprobeStreamProbe, LivenessProber, LoggingSink, ReqwestLivenessCheck,
    SearchScraper, StreamClassifier, VerifyStage,
};
use relay_logging::{relay_error, relay_info, LogDestination};

use crate::cli::Cli;
use crate::config::RelayConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = match cli.log_file.clone() {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    relay_logging::initialize(destination, level);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            relay_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when a stage failed; later stages still run.
fn run(cli: &Cli) -> Result<bool> {
    let config = RelayConfig::load(cli.config.as_deref())?;
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let mut all_ok = true;

    if cli.command.discovers() {
        if let Err(err) = runtime.block_on(discover(&config)) {
            relay_error!("Discovery failed: {:#}", err);
            all_ok = false;
        }
    }

    if cli.command.verifies() {
        if let Err(err) = runtime.block_on(verify(&config)) {
            relay_error!("Verification failed: {:#}", err);
            all_ok = false;
        }
    }

    Ok(all_ok)
}

async fn discover(config: &RelayConfig) -> Result<()> {
    let channels = config.load_channel_map()?;
    let scraper =
        SearchScraper::new(config.discovery_settings()).context("building search client")?;
    let candidates = scraper.discover(&config.search_queries()).await;
    relay_info!("{} unique candidate(s) scraped", candidates.len());

    let check = ReqwestLivenessCheck::new(config.liveness_timeout())
        .context("building liveness client")?;
    let prober = LivenessProber::new(Arc::new(check), config.liveness_concurrency);
    let paths = config.stage_paths();
    let counter = config.counter_store();
    let history = config.history_dir();

    let stage = DiscoveryStage {
        paths: &paths,
        counter: &counter,
        history: &history,
        retention_limit: config.retention_limit,
        prober: &prober,
        channels: &channels,
        disclaimer_url: &config.disclaimer_url,
    };
    let report = stage.run(candidates, &LoggingSink).await?;
    relay_info!(
        "Discovery done: run {}, {} alive endpoint(s), {} link(s)",
        report.run.run_index,
        report.alive.len(),
        report.links.unwrap_or(0)
    );
    Ok(())
}

async fn verify(config: &RelayConfig) -> Result<()> {
    let probe = FfprobeStreamProbe::new(config.probe_settings());
    let classifier = StreamClassifier::new(Arc::new(probe), config.probe_concurrency);
    let paths = config.stage_paths();

    let stage = VerifyStage {
        paths: &paths,
        classifier: &classifier,
    };
    let report = stage.run(&LoggingSink).await?;
    relay_info!(
        "Verification done: {} link(s), {} smooth, {} bad",
        report.links,
        report.smooth,
        report.bad
    );
    Ok(())
}
