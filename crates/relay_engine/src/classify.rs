use std::sync::Arc;

use relay_core::{judge, partition, ChannelLink, ChannelList, Partition, Verdict, VerdictReason};

use crate::pool::run_bounded;
use crate::{EngineEvent, ProgressSink, StreamProbe};

/// Probes every link through the external decoder and sorts them into smooth and bad.
pub struct StreamClassifier {
    probe: Arc<dyn StreamProbe>,
    concurrency: usize,
}

impl StreamClassifier {
    pub fn new(probe: Arc<dyn StreamProbe>, concurrency: usize) -> Self {
        Self { probe, concurrency }
    }

    /// Verdicts in completion order, one per input link.
    pub async fn classify(
        &self,
        links: Vec<ChannelLink>,
        sink: &dyn ProgressSink,
    ) -> Vec<(ChannelLink, Verdict)> {
        let probe = self.probe.clone();
        let results = run_bounded(
            links,
            self.concurrency,
            move |link| {
                let probe = probe.clone();
                async move {
                    match probe.probe(&link.url).await {
                        Ok(observation) => judge(&observation),
                        Err(err) => Verdict::fail(VerdictReason::ProbeError(err.to_string())),
                    }
                }
            },
            |link, verdict| {
                sink.emit(EngineEvent::LinkClassified {
                    link: link.clone(),
                    verdict: verdict.cloned().unwrap_or_else(aborted),
                });
            },
        )
        .await;

        results
            .into_iter()
            .map(|(link, verdict)| (link, verdict.unwrap_or_else(aborted)))
            .collect()
    }

    /// Classifies the data lines of `list`; its header lines go to the smooth side.
    pub async fn partition_list(&self, list: ChannelList, sink: &dyn ProgressSink) -> Partition {
        let classified = self.classify(list.links, sink).await;
        partition(list.headers, classified)
    }
}

fn aborted() -> Verdict {
    Verdict::fail(VerdictReason::ProbeError("probe task aborted".to_string()))
}
