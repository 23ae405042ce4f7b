use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use circbench_utils::atomic_write::write_bytes_atomic;
use circbench_utils::error::RunnerError;
use circbench_utils::ring_buffer::RingBuffer;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::command_spec::CommandSpec;
use crate::platform::{self, GroupSignal};
use crate::shutdown::ShutdownSignal;
use crate::types::{ExecutionReport, TerminalState};

/// Default stdout/stderr capture: 8 MiB tail per stream.
pub const DEFAULT_OUTPUT_CAP_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Time between SIGTERM and SIGKILL.
    pub grace_period: Duration,
    /// Upper bound on waiting for the process after SIGKILL.
    pub reap_timeout: Duration,
    /// Upper bound on draining output pipes after the process is gone.
    pub drain_timeout: Duration,
    pub output_cap_bytes: usize,
    /// CPUs the solver may run on. Applied to the child only.
    pub cpu_affinity: Option<Vec<usize>>,
    /// When set, raw stdout of every labelled command is written to
    /// `debug_output_<label>.txt` in this directory.
    pub debug_dir: Option<PathBuf>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(5),
            reap_timeout: Duration::from_secs(10),
            drain_timeout: Duration::from_secs(2),
            output_cap_bytes: DEFAULT_OUTPUT_CAP_BYTES,
            cpu_affinity: None,
            debug_dir: None,
        }
    }
}

/// Runs one external process at a time under a wall-clock limit.
///
/// `execute` never returns an error: every failure mode is a
/// [`TerminalState`]. When it returns, the process group it created has been
/// sent SIGKILL and the direct child has been reaped (or the state is
/// `Errored`).
#[derive(Debug, Clone)]
pub struct Supervisor {
    config: SupervisorConfig,
}

enum Trigger {
    Exited(std::io::Result<ExitStatus>),
    Deadline,
    Shutdown,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Result<Self, RunnerError> {
        if config.output_cap_bytes == 0 {
            return Err(RunnerError::ConfigurationInvalid {
                reason: "output capture size must be greater than 0".to_string(),
            });
        }

        if let Some(cpus) = &config.cpu_affinity {
            if cpus.is_empty() {
                return Err(RunnerError::ConfigurationInvalid {
                    reason: "cpu affinity must list at least one CPU".to_string(),
                });
            }
            let Some(limit) = platform::cpu_limit() else {
                return Err(RunnerError::ConfigurationInvalid {
                    reason: "CPU pinning is only supported on Linux".to_string(),
                });
            };
            if let Some(&cpu) = cpus.iter().find(|&&cpu| cpu >= limit) {
                return Err(RunnerError::InvalidAffinity {
                    cpu,
                    reason: format!("index must be below {limit}"),
                });
            }
        }

        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Run `cmd` until it exits, `timeout` elapses or `shutdown` fires.
    pub async fn execute(
        &self,
        cmd: &CommandSpec,
        timeout: Duration,
        shutdown: &ShutdownSignal,
    ) -> ExecutionReport {
        let started = Instant::now();

        let mut command = cmd.to_tokio_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        platform::isolate(&mut command, self.config.cpu_affinity.as_deref());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                let reason = format!("failed to spawn '{}': {e}", cmd.program.to_string_lossy());
                warn!(%reason, "solver did not start");
                return ExecutionReport::spawn_failed(reason, started.elapsed());
            }
        };

        let pid = child.id();
        debug!(
            pid,
            command = %cmd,
            timeout_secs = timeout.as_secs_f64(),
            "solver started"
        );

        let stdout = OutputCollector::spawn(child.stdout.take(), self.config.output_cap_bytes);
        let stderr = OutputCollector::spawn(child.stderr.take(), self.config.output_cap_bytes);

        let trigger = tokio::select! {
            status = child.wait() => Trigger::Exited(status),
            () = tokio::time::sleep(timeout) => Trigger::Deadline,
            () = shutdown.triggered() => Trigger::Shutdown,
        };

        let state = match trigger {
            Trigger::Exited(Ok(status)) => {
                // Leader is gone; anything it left behind in the group goes too.
                if let Some(pid) = pid {
                    platform::signal_group(pid, GroupSignal::Kill);
                }
                TerminalState::Completed {
                    exit_code: status.code(),
                }
            }
            Trigger::Exited(Err(e)) => {
                let reason = format!("failed to wait for solver: {e}");
                match self.terminate(&mut child, pid).await {
                    Ok(()) => TerminalState::Errored { reason },
                    Err(more) => TerminalState::Errored {
                        reason: format!("{reason}; {more}"),
                    },
                }
            }
            Trigger::Deadline => {
                info!(
                    pid,
                    timeout_secs = timeout.as_secs_f64(),
                    "solver exceeded its time limit, terminating process group"
                );
                match self.terminate(&mut child, pid).await {
                    Ok(()) => TerminalState::TimedOut,
                    Err(reason) => TerminalState::Errored { reason },
                }
            }
            Trigger::Shutdown => {
                info!(pid, "shutdown requested, terminating solver");
                match self.terminate(&mut child, pid).await {
                    Ok(()) => TerminalState::Interrupted,
                    Err(reason) => TerminalState::Errored { reason },
                }
            }
        };
        let elapsed = started.elapsed();

        let (stdout, stdout_truncated) = stdout.finish(self.config.drain_timeout).await;
        let (stderr, _) = stderr.finish(self.config.drain_timeout).await;

        debug!(
            pid,
            state = state.as_str(),
            elapsed_secs = elapsed.as_secs_f64(),
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            "solver finished"
        );

        if let (Some(dir), Some(label)) = (&self.config.debug_dir, &cmd.label) {
            write_debug_output(dir, label, &stdout);
        }

        ExecutionReport {
            stdout,
            stderr,
            stdout_truncated,
            elapsed,
            state,
            pid,
        }
    }

    /// SIGTERM the group, wait `grace_period`, SIGKILL the group, reap.
    async fn terminate(&self, child: &mut Child, pid: Option<u32>) -> Result<(), String> {
        if let Some(pid) = pid {
            platform::signal_group(pid, GroupSignal::Terminate);
        }
        #[cfg(not(unix))]
        let _ = child.start_kill();

        match tokio::time::timeout(self.config.grace_period, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(pid, ?status, "solver exited within grace period");
                if let Some(pid) = pid {
                    platform::signal_group(pid, GroupSignal::Kill);
                }
                return Ok(());
            }
            Ok(Err(e)) => warn!(pid, error = %e, "wait failed during grace period"),
            Err(_) => debug!(pid, "grace period elapsed, sending SIGKILL"),
        }

        if let Some(pid) = pid {
            platform::signal_group(pid, GroupSignal::Kill);
        }
        let _ = child.start_kill();

        match tokio::time::timeout(self.config.reap_timeout, child.wait()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(format!("failed to reap solver process: {e}")),
            Err(_) => Err(format!(
                "solver process was not reaped within {:.1}s of SIGKILL",
                self.config.reap_timeout.as_secs_f64()
            )),
        }
    }
}

fn write_debug_output(dir: &Path, label: &str, stdout: &[u8]) {
    let path = dir.join(format!("debug_output_{label}.txt"));
    if let Err(e) = write_bytes_atomic(&path, stdout) {
        warn!(path = %path.display(), error = %e, "failed to write debug output");
    }
}

/// Reads one pipe into a shared ring buffer so a partial capture survives a
/// drain timeout.
struct OutputCollector {
    buffer: Arc<Mutex<RingBuffer>>,
    task: Option<JoinHandle<()>>,
}

impl OutputCollector {
    fn spawn<R>(stream: Option<R>, cap: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(RingBuffer::new(cap)));
        let task = stream.map(|mut stream| {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move {
                let mut chunk = vec![0u8; 8192];
                loop {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buffer
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .write(&chunk[..n]),
                    }
                }
            })
        });
        Self { buffer, task }
    }

    async fn finish(self, drain_timeout: Duration) -> (Vec<u8>, bool) {
        if let Some(mut task) = self.task {
            if tokio::time::timeout(drain_timeout, &mut task).await.is_err() {
                warn!("output pipe still open after the process ended; keeping partial capture");
                task.abort();
            }
        }
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        (buffer.to_bytes(), buffer.was_truncated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SupervisorConfig {
        SupervisorConfig {
            grace_period: Duration::from_millis(300),
            reap_timeout: Duration::from_secs(5),
            drain_timeout: Duration::from_secs(1),
            ..SupervisorConfig::default()
        }
    }

    #[test]
    fn test_rejects_zero_output_cap() {
        let config = SupervisorConfig {
            output_cap_bytes: 0,
            ..SupervisorConfig::default()
        };
        assert!(matches!(
            Supervisor::new(config),
            Err(RunnerError::ConfigurationInvalid { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_affinity() {
        let config = SupervisorConfig {
            cpu_affinity: Some(Vec::new()),
            ..SupervisorConfig::default()
        };
        assert!(Supervisor::new(config).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_rejects_out_of_range_cpu() {
        let config = SupervisorConfig {
            cpu_affinity: Some(vec![0, 1 << 20]),
            ..SupervisorConfig::default()
        };
        assert!(matches!(
            Supervisor::new(config),
            Err(RunnerError::InvalidAffinity { cpu, .. }) if cpu == 1 << 20
        ));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_a_state_not_an_error() {
        let supervisor = Supervisor::new(fast_config()).unwrap();
        let cmd = CommandSpec::new("/definitely/not/a/solver/binary");
        let report = supervisor
            .execute(&cmd, Duration::from_secs(5), &ShutdownSignal::new())
            .await;
        assert!(matches!(report.state, TerminalState::SpawnFailed { .. }));
        assert!(report.pid.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_completed_captures_both_streams_and_exit_code() {
        let supervisor = Supervisor::new(fast_config()).unwrap();
        let cmd = CommandSpec::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let report = supervisor
            .execute(&cmd, Duration::from_secs(10), &ShutdownSignal::new())
            .await;
        assert_eq!(report.state, TerminalState::Completed { exit_code: Some(3) });
        assert_eq!(report.stdout_lossy(), "out\n");
        assert_eq!(report.stderr_lossy(), "err\n");
        assert!(!report.stdout_truncated);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_terminates_within_bound() {
        let supervisor = Supervisor::new(fast_config()).unwrap();
        let cmd = CommandSpec::new("sleep").arg("30");
        let started = Instant::now();
        let report = supervisor
            .execute(&cmd, Duration::from_millis(300), &ShutdownSignal::new())
            .await;
        assert_eq!(report.state, TerminalState::TimedOut);
        assert!(report.elapsed >= Duration::from_millis(300));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_term_ignoring_process_is_killed_after_grace() {
        let supervisor = Supervisor::new(fast_config()).unwrap();
        let cmd = CommandSpec::new("sh").args(["-c", "trap '' TERM; sleep 30"]);
        let report = supervisor
            .execute(&cmd, Duration::from_millis(200), &ShutdownSignal::new())
            .await;
        assert_eq!(report.state, TerminalState::TimedOut);
        assert!(report.elapsed >= Duration::from_millis(500));
        assert!(report.elapsed < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shutdown_interrupts_running_process() {
        let supervisor = Supervisor::new(fast_config()).unwrap();
        let shutdown = ShutdownSignal::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.trigger();
        });

        let cmd = CommandSpec::new("sleep").arg("30");
        let report = supervisor
            .execute(&cmd, Duration::from_secs(30), &shutdown)
            .await;
        assert_eq!(report.state, TerminalState::Interrupted);
        assert!(report.elapsed < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_cap_keeps_tail() {
        let config = SupervisorConfig {
            output_cap_bytes: 16,
            ..fast_config()
        };
        let supervisor = Supervisor::new(config).unwrap();
        let cmd = CommandSpec::new("sh").args(["-c", "printf 'aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaTAIL'"]);
        let report = supervisor
            .execute(&cmd, Duration::from_secs(10), &ShutdownSignal::new())
            .await;
        assert_eq!(report.stdout.len(), 16);
        assert!(report.stdout_lossy().ends_with("TAIL"));
        assert!(report.stdout_truncated);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_debug_output_written_for_labelled_commands() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = SupervisorConfig {
            debug_dir: Some(dir.path().to_path_buf()),
            ..fast_config()
        };
        let supervisor = Supervisor::new(config).unwrap();
        let cmd = CommandSpec::new("sh")
            .args(["-c", "echo solver log"])
            .label("n8_k1_Teste1_r1");
        supervisor
            .execute(&cmd, Duration::from_secs(10), &ShutdownSignal::new())
            .await;
        let written =
            std::fs::read_to_string(dir.path().join("debug_output_n8_k1_Teste1_r1.txt")).unwrap();
        assert_eq!(written, "solver log\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unwritable_debug_dir_does_not_fail_execution() {
        let config = SupervisorConfig {
            debug_dir: Some(PathBuf::from("/proc/circbench-no-such-dir")),
            ..fast_config()
        };
        let supervisor = Supervisor::new(config).unwrap();
        let cmd = CommandSpec::new("sh").args(["-c", "echo ok"]).label("x");
        let report = supervisor
            .execute(&cmd, Duration::from_secs(10), &ShutdownSignal::new())
            .await;
        assert_eq!(report.state, TerminalState::Completed { exit_code: Some(0) });
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_affinity_applies_to_child_only() {
        // Pick a CPU the test process is allowed to use.
        let allowed = unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            assert_eq!(
                libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set),
                0
            );
            (0..libc::CPU_SETSIZE as usize)
                .find(|&cpu| libc::CPU_ISSET(cpu, &set))
                .unwrap()
        };
        let before = std::fs::read_to_string("/proc/self/status").unwrap();

        let config = SupervisorConfig {
            cpu_affinity: Some(vec![allowed]),
            ..fast_config()
        };
        let supervisor = Supervisor::new(config).unwrap();
        let cmd = CommandSpec::new("grep").args(["Cpus_allowed_list", "/proc/self/status"]);
        let report = supervisor
            .execute(&cmd, Duration::from_secs(10), &ShutdownSignal::new())
            .await;
        assert_eq!(report.state, TerminalState::Completed { exit_code: Some(0) });
        assert_eq!(
            report.stdout_lossy().trim(),
            format!("Cpus_allowed_list:\t{allowed}")
        );

        let after = std::fs::read_to_string("/proc/self/status").unwrap();
        let allowed_line = |s: &str| {
            s.lines()
                .find(|l| l.starts_with("Cpus_allowed_list"))
                .map(str::to_string)
        };
        assert_eq!(allowed_line(&before), allowed_line(&after));
    }
}
