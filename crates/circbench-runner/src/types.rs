use std::time::Duration;

/// How a supervised execution ended.
///
/// `Idle → Running → {Completed, TimedOut, Errored}`. `SpawnFailed` never
/// reached `Running`; `Interrupted` is a cancellation that was terminated
/// cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalState {
    /// The process exited on its own. `exit_code` is `None` when it died from
    /// a signal.
    Completed { exit_code: Option<i32> },
    /// The wall-clock timeout fired and the process group was terminated.
    TimedOut,
    /// The process could not be started.
    SpawnFailed { reason: String },
    /// Waiting on or terminating the process failed; it may not have been
    /// reaped.
    Errored { reason: String },
    /// Shutdown was requested while the process was running.
    Interrupted,
}

impl TerminalState {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::TimedOut => "timed_out",
            Self::SpawnFailed { .. } => "spawn_failed",
            Self::Errored { .. } => "errored",
            Self::Interrupted => "interrupted",
        }
    }
}

/// Everything the supervisor observed about one execution.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// Tail of stdout, at most the configured capture size.
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: bool,
    /// Wall-clock time from spawn attempt to process exit or termination.
    pub elapsed: Duration,
    pub state: TerminalState,
    pub pid: Option<u32>,
}

impl ExecutionReport {
    pub(crate) fn spawn_failed(reason: String, elapsed: Duration) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            stdout_truncated: false,
            elapsed,
            state: TerminalState::SpawnFailed { reason },
            pid: None,
        }
    }

    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_state_names() {
        assert_eq!(TerminalState::Completed { exit_code: Some(0) }.as_str(), "completed");
        assert_eq!(TerminalState::TimedOut.as_str(), "timed_out");
        assert_eq!(
            TerminalState::SpawnFailed {
                reason: "x".to_string()
            }
            .as_str(),
            "spawn_failed"
        );
        assert!(TerminalState::Completed { exit_code: None }.is_completed());
        assert!(!TerminalState::Interrupted.is_completed());
    }

    #[test]
    fn test_spawn_failed_report_has_no_output() {
        let report = ExecutionReport::spawn_failed("not found".to_string(), Duration::ZERO);
        assert!(report.stdout.is_empty());
        assert!(report.pid.is_none());
        assert_eq!(report.stdout_lossy(), "");
    }

    #[test]
    fn test_lossy_output() {
        let mut report = ExecutionReport::spawn_failed(String::new(), Duration::ZERO);
        report.stdout = vec![b'o', b'k', 0xff];
        assert!(report.stdout_lossy().starts_with("ok"));
    }
}
