use std::process::Stdio;
use std::time::Duration;

use relay_core::ProbeObservation;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub program: String,
    /// How much playback the decoder is asked to sample.
    pub sample_duration: Duration,
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    /// Hard ceiling on the whole probe process.
    pub wall_clock_ceiling: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        let sample_duration = Duration::from_secs(18);
        Self {
            program: "ffprobe".to_string(),
            sample_duration,
            read_timeout: Duration::from_secs(25),
            connect_timeout: Duration::from_secs(15),
            wall_clock_ceiling: sample_duration + Duration::from_secs(20),
        }
    }
}

/// Bounded-time decode attempt against one playback URL.
#[async_trait::async_trait]
pub trait StreamProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ProbeObservation, ProbeError>;
}

#[derive(Debug, Clone, Default)]
pub struct FfprobeStreamProbe {
    settings: ProbeSettings,
}

impl FfprobeStreamProbe {
    pub fn new(settings: ProbeSettings) -> Self {
        Self { settings }
    }

    /// Arguments asking only for the container duration, printed as a bare number.
    pub fn command_args(&self, url: &str) -> Vec<String> {
        vec![
            "-v".into(),
            "quiet".into(),
            "-rw_timeout".into(),
            self.settings.read_timeout.as_micros().to_string(),
            "-timeout".into(),
            self.settings.connect_timeout.as_micros().to_string(),
            "-i".into(),
            url.to_string(),
            "-t".into(),
            self.settings.sample_duration.as_secs().to_string(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "csv=p=0".into(),
        ]
    }
}

#[async_trait::async_trait]
impl StreamProbe for FfprobeStreamProbe {
    async fn probe(&self, url: &str) -> Result<ProbeObservation, ProbeError> {
        let mut cmd = Command::new(&self.settings.program);
        cmd.args(self.command_args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // Dropping the pending output future on timeout kills the child.
        match tokio::time::timeout(self.settings.wall_clock_ceiling, cmd.output()).await {
            Err(_elapsed) => Ok(ProbeObservation::TimedOut),
            Ok(Err(source)) => Err(ProbeError::Spawn {
                program: self.settings.program.clone(),
                source,
            }),
            Ok(Ok(output)) => Ok(ProbeObservation::Completed {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                success: output.status.success(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_arguments_use_microsecond_timeouts() {
        let probe = FfprobeStreamProbe::default();
        let args = probe.command_args("http://h:1/hls/1/index.m3u8");
        let joined = args.join(" ");
        assert_eq!(
            joined,
            "-v quiet -rw_timeout 25000000 -timeout 15000000 -i http://h:1/hls/1/index.m3u8 \
             -t 18 -show_entries format=duration -of csv=p=0"
        );
    }

    #[tokio::test]
    async fn missing_program_is_a_probe_error() {
        let probe = FfprobeStreamProbe::new(ProbeSettings {
            program: "definitely-not-an-installed-decoder".into(),
            ..ProbeSettings::default()
        });
        let err = probe.probe("http://127.0.0.1:1/").await.unwrap_err();
        assert!(matches!(err, ProbeError::Spawn { .. }));
    }
}
