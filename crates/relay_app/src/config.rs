//! Run configuration, loaded from an optional RON file.
//!
//! Every field falls back to the reference constants, so an empty `()` file is valid.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use relay_core::{ChannelMap, RETENTION_LIMIT};
use relay_engine::{
    DiscoverySettings, FileCounterStore, HistoryDir, ProbeSettings, SearchQuery, StagePaths,
};
use serde::Deserialize;

const DEFAULT_QUERY: &str =
    "https://fofa.info/result?qbase64=aXB0di9saXZlL3poX2NuLmpzIiAmJiBjb3VudHJ5PSJDTiI=";
const DEFAULT_DISCLAIMER: &str = "https://kakaxi-1.asia/LOGO/Disclaimer.mp4";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryConfig {
    pub url: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub work_dir: PathBuf,
    pub channel_map: PathBuf,
    pub queries: Vec<QueryConfig>,
    pub user_agent: String,
    pub query_timeout_secs: u64,
    pub query_delay_secs: u64,
    pub counter_file: String,
    pub history_dir: String,
    pub history_file: String,
    pub channel_list: String,
    pub smooth_list: String,
    pub bad_list: String,
    pub retention_limit: u32,
    pub liveness_concurrency: usize,
    pub liveness_timeout_secs: u64,
    pub probe_program: String,
    pub probe_concurrency: usize,
    pub sample_secs: u64,
    pub read_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Defaults to the sample duration plus 20 seconds.
    pub wall_clock_ceiling_secs: Option<u64>,
    pub disclaimer_url: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            channel_map: PathBuf::from("config/channels.ron"),
            queries: vec![QueryConfig {
                url: DEFAULT_QUERY.to_string(),
                label: "hotel_zh_cn.txt".to_string(),
            }],
            user_agent: DiscoverySettings::default().user_agent,
            query_timeout_secs: 20,
            query_delay_secs: 3,
            counter_file: "计数.txt".to_string(),
            history_dir: "ip".to_string(),
            history_file: "hotel_alive.txt".to_string(),
            channel_list: "IPTV.txt".to_string(),
            smooth_list: "IPTV_smooth.txt".to_string(),
            bad_list: "IPTV_bad.txt".to_string(),
            retention_limit: RETENTION_LIMIT,
            liveness_concurrency: 20,
            liveness_timeout_secs: 10,
            probe_program: "ffprobe".to_string(),
            probe_concurrency: 6,
            sample_secs: 18,
            read_timeout_secs: 25,
            connect_timeout_secs: 15,
            wall_clock_ceiling_secs: None,
            disclaimer_url: DEFAULT_DISCLAIMER.to_string(),
        }
    }
}

impl RelayConfig {
    /// Reads `path` when given; otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn load_channel_map(&self) -> Result<ChannelMap> {
        let text = fs::read_to_string(&self.channel_map)
            .with_context(|| format!("reading channel map {}", self.channel_map.display()))?;
        let map: ChannelMap = ron::from_str(&text)
            .with_context(|| format!("parsing channel map {}", self.channel_map.display()))?;
        Ok(map)
    }

    pub fn stage_paths(&self) -> StagePaths {
        StagePaths {
            dir: self.work_dir.clone(),
            channel_list: self.channel_list.clone(),
            smooth_list: self.smooth_list.clone(),
            bad_list: self.bad_list.clone(),
        }
    }

    pub fn counter_store(&self) -> FileCounterStore {
        FileCounterStore::new(self.work_dir.join(&self.counter_file))
    }

    pub fn history_dir(&self) -> HistoryDir {
        HistoryDir::new(self.work_dir.join(&self.history_dir), self.history_file.clone())
    }

    pub fn search_queries(&self) -> Vec<SearchQuery> {
        self.queries
            .iter()
            .map(|q| SearchQuery {
                url: q.url.clone(),
                label: q.label.clone(),
            })
            .collect()
    }

    pub fn discovery_settings(&self) -> DiscoverySettings {
        DiscoverySettings {
            user_agent: self.user_agent.clone(),
            request_timeout: Duration::from_secs(self.query_timeout_secs),
            query_delay: Duration::from_secs(self.query_delay_secs),
        }
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        let sample_duration = Duration::from_secs(self.sample_secs);
        let wall_clock_ceiling = match self.wall_clock_ceiling_secs {
            Some(secs) => Duration::from_secs(secs),
            None => sample_duration + Duration::from_secs(20),
        };
        ProbeSettings {
            program: self.probe_program.clone(),
            sample_duration,
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            wall_clock_ceiling,
        }
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_secs(self.liveness_timeout_secs)
    }
}
