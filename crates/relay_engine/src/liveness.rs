use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use relay_core::Endpoint;
use relay_logging::relay_debug;

use crate::pool::run_bounded;
use crate::{EngineEvent, FailureKind, LivenessError, ProgressSink};

#[derive(Debug, Clone)]
pub struct LivenessSettings {
    pub probe_timeout: Duration,
    pub concurrency: usize,
}

impl Default for LivenessSettings {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(10),
            concurrency: 20,
        }
    }
}

/// Cheap reachability check for a single endpoint.
#[async_trait::async_trait]
pub trait LivenessCheck: Send + Sync {
    async fn check(&self, endpoint: &Endpoint) -> Result<(), LivenessError>;
}

/// `HEAD http://{endpoint}/` without following redirects; any status below 400 is alive.
#[derive(Debug, Clone)]
pub struct ReqwestLivenessCheck {
    client: reqwest::Client,
}

impl ReqwestLivenessCheck {
    pub fn new(probe_timeout: Duration) -> Result<Self, LivenessError> {
        let client = reqwest::Client::builder()
            .connect_timeout(probe_timeout)
            .timeout(probe_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| LivenessError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl LivenessCheck for ReqwestLivenessCheck {
    async fn check(&self, endpoint: &Endpoint) -> Result<(), LivenessError> {
        let url = reqwest::Url::parse(&endpoint.root_url())
            .map_err(|err| LivenessError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let response = self.client.head(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(LivenessError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> LivenessError {
    if err.is_timeout() {
        return LivenessError::new(FailureKind::Timeout, err.to_string());
    }
    LivenessError::new(FailureKind::Network, err.to_string())
}

/// Fans liveness checks out over a bounded worker set.
pub struct LivenessProber {
    check: Arc<dyn LivenessCheck>,
    concurrency: usize,
}

impl LivenessProber {
    pub fn new(check: Arc<dyn LivenessCheck>, concurrency: usize) -> Self {
        Self { check, concurrency }
    }

    /// Returns the subset of `candidates` that answered the check.
    pub async fn probe_all(
        &self,
        candidates: &BTreeSet<Endpoint>,
        sink: &dyn ProgressSink,
    ) -> BTreeSet<Endpoint> {
        let check = self.check.clone();
        let results = run_bounded(
            candidates.iter().cloned().collect(),
            self.concurrency,
            move |endpoint| {
                let check = check.clone();
                async move { check.check(&endpoint).await }
            },
            |endpoint, result| {
                if let Some(Err(err)) = result {
                    relay_debug!("{} not alive: {}", endpoint, err);
                }
                sink.emit(EngineEvent::EndpointChecked {
                    endpoint: endpoint.clone(),
                    alive: matches!(result, Some(Ok(()))),
                });
            },
        )
        .await;

        results
            .into_iter()
            .filter_map(|(endpoint, result)| matches!(result, Some(Ok(()))).then_some(endpoint))
            .collect()
    }
}
