use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Utc};
use relay_core::{
    parse_channel_list, render_bad, render_channel_list, render_smooth, synthesize, ChannelMap,
    Endpoint, Preamble, RunState,
};
use relay_logging::{relay_info, relay_warn};

use crate::persist::{read_if_exists, AtomicFileWriter, PersistError};
use crate::retention::{CounterStore, HistoryStore, RetentionCounter};
use crate::{LivenessProber, ProgressSink, StreamClassifier};

const BEIJING_OFFSET_SECS: i32 = 8 * 3600;

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("input artifact {0} not found")]
    MissingInput(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: PersistError,
    },
    #[error("failed to record endpoint history: {0}")]
    History(#[source] PersistError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: PersistError,
    },
}

/// Where a stage reads and writes its artifacts.
#[derive(Debug, Clone)]
pub struct StagePaths {
    pub dir: PathBuf,
    pub channel_list: String,
    pub smooth_list: String,
    pub bad_list: String,
}

impl StagePaths {
    pub fn channel_list_path(&self) -> PathBuf {
        self.dir.join(&self.channel_list)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub run: RunState,
    pub candidates: usize,
    pub alive: BTreeSet<Endpoint>,
    /// `None` when nothing was alive and the channel list was left untouched.
    pub links: Option<usize>,
}

/// Run counter, liveness filtering, history snapshot and channel list synthesis.
pub struct DiscoveryStage<'a> {
    pub paths: &'a StagePaths,
    pub counter: &'a dyn CounterStore,
    pub history: &'a dyn HistoryStore,
    pub retention_limit: u32,
    pub prober: &'a LivenessProber,
    pub channels: &'a ChannelMap,
    pub disclaimer_url: &'a str,
}

impl DiscoveryStage<'_> {
    pub async fn run(
        &self,
        candidates: BTreeSet<Endpoint>,
        sink: &dyn ProgressSink,
    ) -> Result<DiscoveryReport, StageError> {
        let run = RetentionCounter::new(self.counter, self.history, self.retention_limit).advance();
        relay_info!(
            "Run {} ({:?}): checking {} candidate(s)",
            run.run_index,
            run.write_mode,
            candidates.len()
        );

        let alive = self.prober.probe_all(&candidates, sink).await;
        relay_info!("{} of {} endpoint(s) alive", alive.len(), candidates.len());

        self.history
            .record(&alive, run.write_mode)
            .map_err(StageError::History)?;

        let mut report = DiscoveryReport {
            run,
            candidates: candidates.len(),
            alive,
            links: None,
        };
        if report.alive.is_empty() {
            relay_warn!("No live endpoints; keeping the previous channel list");
            return Ok(report);
        }

        let endpoints: Vec<Endpoint> = report.alive.iter().cloned().collect();
        let preamble = Preamble {
            timestamp: beijing_timestamp(),
            disclaimer_url: self.disclaimer_url.to_string(),
        };
        let links = synthesize(self.channels, &endpoints);
        let text = render_channel_list(self.channels, &links, &preamble);
        write_artifact(&self.paths.dir, &self.paths.channel_list, &text)?;

        relay_info!("{} written with {} link(s)", self.paths.channel_list, links.len());
        report.links = Some(links.len());
        Ok(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyReport {
    pub links: usize,
    pub smooth: usize,
    pub bad: usize,
}

/// Playability classification of the channel list into smooth and bad artifacts.
pub struct VerifyStage<'a> {
    pub paths: &'a StagePaths,
    pub classifier: &'a StreamClassifier,
}

impl VerifyStage<'_> {
    pub async fn run(&self, sink: &dyn ProgressSink) -> Result<VerifyReport, StageError> {
        let input = self.paths.channel_list_path();
        let text = read_if_exists(&input)
            .map_err(|source| StageError::Read {
                path: input.clone(),
                source,
            })?
            .ok_or_else(|| StageError::MissingInput(input.clone()))?;

        let list = parse_channel_list(&text);
        let links = list.links.len();
        relay_info!("Classifying {} link(s) from {}", links, input.display());

        let partition = self.classifier.partition_list(list, sink).await;
        write_artifact(&self.paths.dir, &self.paths.smooth_list, &render_smooth(&partition))?;
        write_artifact(&self.paths.dir, &self.paths.bad_list, &render_bad(&partition))?;

        let report = VerifyReport {
            links,
            smooth: partition.smooth.len(),
            bad: partition.bad.len(),
        };
        relay_info!(
            "Smooth: {} -> {}, bad: {} -> {}",
            report.smooth,
            self.paths.smooth_list,
            report.bad,
            self.paths.bad_list
        );
        Ok(report)
    }
}

fn write_artifact(dir: &Path, name: &str, content: &str) -> Result<PathBuf, StageError> {
    AtomicFileWriter::new(dir.to_path_buf())
        .write(name, content)
        .map_err(|source| StageError::Write {
            path: dir.join(name),
            source,
        })
}

fn beijing_timestamp() -> String {
    let now = Utc::now();
    match FixedOffset::east_opt(BEIJING_OFFSET_SECS) {
        Some(offset) => now.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => now.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}
