use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use relay_core::{ChannelLink, ProbeObservation, Verdict, VerdictReason};
use relay_engine::{
    EngineEvent, FfprobeStreamProbe, ProbeError, ProbeSettings, ProgressSink, StreamClassifier,
    StreamProbe,
};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Replays literal decoder outcomes keyed by URL.
struct ScriptedProbe {
    outcomes: HashMap<String, Scripted>,
    seen: Mutex<Vec<String>>,
}

#[derive(Clone)]
enum Scripted {
    Output(&'static str, bool),
    TimedOut,
    SpawnFailure,
}

#[async_trait::async_trait]
impl StreamProbe for ScriptedProbe {
    async fn probe(&self, url: &str) -> Result<ProbeObservation, ProbeError> {
        self.seen.lock().unwrap().push(url.to_string());
        tokio::time::sleep(Duration::from_millis(2)).await;
        match self.outcomes.get(url).cloned() {
            Some(Scripted::Output(stdout, success)) => Ok(ProbeObservation::Completed {
                stdout: stdout.to_string(),
                success,
            }),
            Some(Scripted::TimedOut) => Ok(ProbeObservation::TimedOut),
            Some(Scripted::SpawnFailure) | None => Err(ProbeError::Spawn {
                program: "ffprobe".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            }),
        }
    }
}

fn link(name: &str, n: u32, operator: Option<&str>) -> ChannelLink {
    let link = ChannelLink::new(name, format!("http://h:1/hls/{n}/index.m3u8"));
    match operator {
        Some(op) => link.with_operator(op),
        None => link,
    }
}

fn scripted(entries: Vec<(u32, Scripted)>) -> ScriptedProbe {
    ScriptedProbe {
        outcomes: entries
            .into_iter()
            .map(|(n, s)| (format!("http://h:1/hls/{n}/index.m3u8"), s))
            .collect(),
        seen: Mutex::new(Vec::new()),
    }
}

fn verdict_of(results: &[(ChannelLink, Verdict)], name: &str) -> Verdict {
    results
        .iter()
        .find(|(l, _)| l.name == name)
        .map(|(_, v)| v.clone())
        .expect("link classified")
}

#[tokio::test]
async fn rules_apply_in_priority_order() {
    let probe = Arc::new(scripted(vec![
        (1, Scripted::Output("5.2\n", true)),
        (2, Scripted::Output("", true)),
        (3, Scripted::TimedOut),
        (4, Scripted::Output("", false)),
        (5, Scripted::SpawnFailure),
    ]));
    let classifier = StreamClassifier::new(probe, 6);
    let links = vec![
        link("duration", 1, None),
        link("clean", 2, None),
        link("slow", 3, None),
        link("dead", 4, None),
        link("broken", 5, None),
    ];

    let results = classifier.classify(links, &TestSink::default()).await;
    assert_eq!(results.len(), 5);
    assert_eq!(
        verdict_of(&results, "duration"),
        Verdict::pass(VerdictReason::DurationRead(5.2))
    );
    assert_eq!(verdict_of(&results, "clean"), Verdict::pass(VerdictReason::CleanExit));
    assert_eq!(verdict_of(&results, "slow"), Verdict::pass(VerdictReason::SlowButAlive));
    assert_eq!(verdict_of(&results, "dead"), Verdict::fail(VerdictReason::Unreachable));
    let broken = verdict_of(&results, "broken");
    assert!(!broken.passed);
    assert!(matches!(broken.reason, VerdictReason::ProbeError(_)));
}

#[tokio::test]
async fn operator_tag_is_not_sent_to_the_decoder() {
    let probe = Arc::new(scripted(vec![(7, Scripted::Output("1.0", true))]));
    let classifier = StreamClassifier::new(probe.clone(), 2);
    let tagged = link("CCTV7", 7, Some("电信"));

    let results = classifier
        .classify(vec![tagged.clone()], &TestSink::default())
        .await;
    assert_eq!(results[0].0, tagged);
    assert!(results[0].1.passed);
    assert_eq!(
        probe.seen.lock().unwrap().as_slice(),
        ["http://h:1/hls/7/index.m3u8".to_string()]
    );
}

#[tokio::test]
async fn every_link_is_reported_once() {
    let entries = (1..=30)
        .map(|n| {
            let outcome = if n % 3 == 0 {
                Scripted::Output("", false)
            } else {
                Scripted::Output("3.0", false)
            };
            (n, outcome)
        })
        .collect();
    let classifier = StreamClassifier::new(Arc::new(scripted(entries)), 6);
    let links: Vec<_> = (1..=30).map(|n| link(&format!("ch{n}"), n, None)).collect();
    let sink = TestSink::default();

    let results = classifier.classify(links.clone(), &sink).await;
    assert_eq!(results.len(), links.len());
    assert_eq!(sink.events.lock().unwrap().len(), links.len());
    assert_eq!(results.iter().filter(|(_, v)| !v.passed).count(), 10);
    for l in &links {
        assert_eq!(results.iter().filter(|(r, _)| r == l).count(), 1);
    }
}

#[cfg(unix)]
#[tokio::test]
async fn wall_clock_ceiling_counts_as_slow_but_alive() {
    let dir = tempfile::TempDir::new().unwrap();
    let script = dir.path().join("stalling-probe.sh");
    std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let probe = FfprobeStreamProbe::new(ProbeSettings {
        program: script.to_string_lossy().into_owned(),
        wall_clock_ceiling: Duration::from_millis(200),
        ..ProbeSettings::default()
    });
    let observation = probe.probe("http://h:1/hls/1/index.m3u8").await.unwrap();
    assert_eq!(observation, ProbeObservation::TimedOut);
}
