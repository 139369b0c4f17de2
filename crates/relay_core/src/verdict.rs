use std::fmt;

/// What the external decode probe reported for one URL.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeObservation {
    /// The probe process finished within the wall clock ceiling.
    Completed { stdout: String, success: bool },
    /// The probe process was still running when the wall clock ceiling elapsed.
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerdictReason {
    DurationRead(f64),
    CleanExit,
    SlowButAlive,
    Unreachable,
    ProbeError(String),
}

impl fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictReason::DurationRead(secs) => write!(f, "duration read ({secs:.1}s)"),
            VerdictReason::CleanExit => write!(f, "clean exit, no duration"),
            VerdictReason::SlowButAlive => write!(f, "slow but assumed alive"),
            VerdictReason::Unreachable => write!(f, "unreachable"),
            VerdictReason::ProbeError(message) => write!(f, "probe error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    pub reason: VerdictReason,
}

impl Verdict {
    pub fn pass(reason: VerdictReason) -> Self {
        Self {
            passed: true,
            reason,
        }
    }

    pub fn fail(reason: VerdictReason) -> Self {
        Self {
            passed: false,
            reason,
        }
    }
}

/// Applies the playability rules in priority order: a positive duration, then a clean
/// exit, then a timeout all pass; everything else fails.
pub fn judge(observation: &ProbeObservation) -> Verdict {
    match observation {
        ProbeObservation::Completed { stdout, success } => {
            if let Some(secs) = parse_duration(stdout) {
                Verdict::pass(VerdictReason::DurationRead(secs))
            } else if *success {
                Verdict::pass(VerdictReason::CleanExit)
            } else {
                Verdict::fail(VerdictReason::Unreachable)
            }
        }
        ProbeObservation::TimedOut => Verdict::pass(VerdictReason::SlowButAlive),
    }
}

fn parse_duration(stdout: &str) -> Option<f64> {
    let text = stdout.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
}
