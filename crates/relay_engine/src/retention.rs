use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use relay_core::{advance, parse_counter, Endpoint, RunState, WriteMode};
use relay_logging::{relay_info, relay_warn};

use crate::persist::{ensure_output_dir, read_if_exists, AtomicFileWriter, PersistError};

/// Persistence for the run counter.
pub trait CounterStore: Send + Sync {
    /// Raw persisted text, `None` when nothing was ever saved.
    fn load(&self) -> Result<Option<String>, PersistError>;
    fn save(&self, value: u32) -> Result<(), PersistError>;
}

/// Accumulated endpoint history.
pub trait HistoryStore: Send + Sync {
    /// Deletes every history file; returns how many were removed.
    fn purge(&self) -> Result<usize, PersistError>;
    /// Writes this run's live endpoints. `Append` merges them with the history already on
    /// disk; `Truncate` (after a purge) writes only this run's snapshot. Earlier versions of
    /// the harvester overwrote the file with the snapshot on every run.
    fn record(&self, alive: &BTreeSet<Endpoint>, mode: WriteMode) -> Result<(), PersistError>;
}

/// Counter kept as a bare ASCII integer in a single file.
#[derive(Debug, Clone)]
pub struct FileCounterStore {
    path: PathBuf,
}

impl FileCounterStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CounterStore for FileCounterStore {
    fn load(&self) -> Result<Option<String>, PersistError> {
        read_if_exists(&self.path)
    }

    fn save(&self, value: u32) -> Result<(), PersistError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PersistError::OutputDir(format!("bad counter path {:?}", self.path)))?;
        AtomicFileWriter::new(dir).write(name, &value.to_string())?;
        Ok(())
    }
}

/// Directory of `*.txt` endpoint history files; this pipeline writes one of them.
#[derive(Debug, Clone)]
pub struct HistoryDir {
    dir: PathBuf,
    file_name: String,
}

impl HistoryDir {
    pub fn new(dir: PathBuf, file_name: impl Into<String>) -> Self {
        Self {
            dir,
            file_name: file_name.into(),
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

impl HistoryStore for HistoryDir {
    fn purge(&self) -> Result<usize, PersistError> {
        ensure_output_dir(&self.dir)?;
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("txt") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn record(&self, alive: &BTreeSet<Endpoint>, mode: WriteMode) -> Result<(), PersistError> {
        let mut snapshot: BTreeSet<String> = alive.iter().map(|e| e.to_string()).collect();
        if mode == WriteMode::Append {
            if let Some(existing) = read_if_exists(&self.file_path())? {
                snapshot.extend(
                    existing
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(ToOwned::to_owned),
                );
            }
        }

        let mut content = String::new();
        for endpoint in &snapshot {
            content.push_str(endpoint);
            content.push('\n');
        }
        AtomicFileWriter::new(self.dir.clone()).write(&self.file_name, &content)?;
        Ok(())
    }
}

/// Advances the persisted run index once per run and purges history when it wraps.
///
/// Persistence failures are logged and never abort the run.
pub struct RetentionCounter<'a> {
    counter: &'a dyn CounterStore,
    history: &'a dyn HistoryStore,
    limit: u32,
}

impl<'a> RetentionCounter<'a> {
    pub fn new(counter: &'a dyn CounterStore, history: &'a dyn HistoryStore, limit: u32) -> Self {
        Self {
            counter,
            history,
            limit,
        }
    }

    pub fn advance(&self) -> RunState {
        let previous = match self.counter.load() {
            Ok(Some(text)) => parse_counter(&text, self.limit),
            Ok(None) => 0,
            Err(err) => {
                relay_warn!("Failed to read run counter, starting from 0: {}", err);
                0
            }
        };

        let state = advance(previous, self.limit);
        if state.purges_history() {
            relay_info!(
                "Run {} reached retention limit {}, purging endpoint history",
                previous + 1,
                self.limit
            );
            match self.history.purge() {
                Ok(removed) => relay_info!("Removed {} history file(s)", removed),
                Err(err) => relay_warn!("Failed to purge endpoint history: {}", err),
            }
        }

        if let Err(err) = self.counter.save(state.run_index) {
            relay_warn!(
                "Failed to persist run counter {}, continuing in memory: {}",
                state.run_index,
                err
            );
        }
        state
    }
}
