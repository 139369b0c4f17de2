//! Relay harvester engine: probing, persistence and the discovery/verification stages.
mod classify;
mod decode;
mod discover;
mod liveness;
mod persist;
mod pool;
mod probe;
mod retention;
mod stages;
mod types;

pub use classify::StreamClassifier;
pub use decode::decode_page;
pub use discover::{extract_candidates, DiscoveryError, DiscoverySettings, SearchQuery, SearchScraper};
pub use liveness::{LivenessCheck, LivenessProber, LivenessSettings, ReqwestLivenessCheck};
pub use persist::{ensure_output_dir, read_if_exists, AtomicFileWriter, PersistError};
pub use pool::run_bounded;
pub use probe::{FfprobeStreamProbe, ProbeError, ProbeSettings, StreamProbe};
pub use retention::{CounterStore, FileCounterStore, HistoryDir, HistoryStore, RetentionCounter};
pub use stages::{
    DiscoveryReport, DiscoveryStage, StageError, StagePaths, VerifyReport, VerifyStage,
};
pub use types::{EngineEvent, FailureKind, LivenessError, LoggingSink, ProgressSink};
