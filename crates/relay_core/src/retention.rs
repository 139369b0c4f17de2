/// Run index at which accumulated endpoint history is discarded and the counter restarts.
pub const RETENTION_LIMIT: u32 = 73;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Merge this run's endpoints into the existing history.
    Append,
    /// History was purged; start from this run's endpoints only.
    Truncate,
}

/// Outcome of advancing the persisted run counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    pub run_index: u32,
    pub write_mode: WriteMode,
}

impl RunState {
    pub fn purges_history(&self) -> bool {
        self.write_mode == WriteMode::Truncate
    }
}

/// Reads a persisted counter value. Anything outside `1..limit` counts as no history.
pub fn parse_counter(text: &str, limit: u32) -> u32 {
    match text.trim().parse::<u32>() {
        Ok(value) if (1..limit).contains(&value) => value,
        _ => 0,
    }
}

/// Computes the next run state from the previous counter value.
pub fn advance(previous: u32, limit: u32) -> RunState {
    let run_index = previous.saturating_add(1);
    if run_index >= limit {
        RunState {
            run_index: 1,
            write_mode: WriteMode::Truncate,
        }
    } else {
        RunState {
            run_index,
            write_mode: WriteMode::Append,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_index_below_limit_appends() {
        for previous in 0..RETENTION_LIMIT - 1 {
            let state = advance(previous, RETENTION_LIMIT);
            assert_eq!(state.run_index, previous + 1);
            assert_eq!(state.write_mode, WriteMode::Append);
            assert!(!state.purges_history());
        }
    }

    #[test]
    fn reaching_limit_truncates_and_restarts() {
        let state = advance(72, RETENTION_LIMIT);
        assert_eq!(
            state,
            RunState {
                run_index: 1,
                write_mode: WriteMode::Truncate
            }
        );
        assert!(state.purges_history());
    }

    #[test]
    fn corrupt_or_out_of_range_counter_reads_as_zero() {
        assert_eq!(parse_counter("12\n", RETENTION_LIMIT), 12);
        assert_eq!(parse_counter("72", RETENTION_LIMIT), 72);
        assert_eq!(parse_counter("", RETENTION_LIMIT), 0);
        assert_eq!(parse_counter("abc", RETENTION_LIMIT), 0);
        assert_eq!(parse_counter("-4", RETENTION_LIMIT), 0);
        assert_eq!(parse_counter("0", RETENTION_LIMIT), 0);
        assert_eq!(parse_counter("73", RETENTION_LIMIT), 0);
    }
}
