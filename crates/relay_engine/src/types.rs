use std::fmt;

use relay_core::{ChannelLink, Endpoint, Verdict};
use relay_logging::relay_info;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    EndpointChecked { endpoint: Endpoint, alive: bool },
    LinkClassified { link: ChannelLink, verdict: Verdict },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Writes one log line per finished probe.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl ProgressSink for LoggingSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::EndpointChecked { endpoint, alive } => {
                relay_info!("{} {}", if alive { "ALIVE" } else { "DEAD " }, endpoint);
            }
            EngineEvent::LinkClassified { link, verdict } => {
                relay_info!(
                    "{} [{:<8}] {} {}",
                    if verdict.passed { "PASS" } else { "FAIL" },
                    link.operator_label(),
                    verdict.reason,
                    link.url
                );
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct LivenessError {
    pub kind: FailureKind,
    pub message: String,
}

impl LivenessError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
