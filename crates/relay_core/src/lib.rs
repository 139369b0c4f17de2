//! Relay harvester core: pure domain types, run retention, link synthesis and list partitioning.
mod channel;
mod endpoint;
mod link;
mod partition;
mod retention;
mod synthesize;
mod verdict;

pub use channel::{ChannelCategory, ChannelDefinition, ChannelEntry, ChannelMap};
pub use endpoint::Endpoint;
pub use link::{parse_channel_list, ChannelLink, ChannelList, ListLine};
pub use partition::{partition, render_bad, render_smooth, Partition};
pub use retention::{advance, parse_counter, RunState, WriteMode, RETENTION_LIMIT};
pub use synthesize::{render_channel_list, synthesize, Preamble};
pub use verdict::{judge, ProbeObservation, Verdict, VerdictReason};
