use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `BenchError` is what campaign-level operations return. Per-request
/// trouble (solver timeouts, unparseable output, a solver that crashed) is
/// *not* an error: it is classified into an outcome and recorded in the
/// ledger. Only conditions that stop the campaign end up here.
///
/// # Error Categories
///
/// | Category | Description |
/// |----------|-------------|
/// | `Config` | Configuration file or CLI argument errors |
/// | `Generation` | Instance generation or reconstruction failures |
/// | `Ledger` | The durable result store could not be read or written |
/// | `Runner` | The execution supervisor was misconfigured |
/// | `SolverUnavailable` | The solver repeatedly failed to spawn |
/// | `GeneratorBroken` | Instance generation failed repeatedly |
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration errors |
/// | 9 | Ledger locked by another writer |
/// | 70 | Solver unavailable |
/// | 74 | Ledger I/O failure |
/// | 130 | Interrupted |
/// | 1 | Other errors |
///
/// # Example
///
/// ```rust
/// use circbench_utils::error::BenchError;
/// use circbench_utils::exit_codes::ExitCode;
///
/// fn handle_error(err: BenchError) {
///     eprintln!("{}", err.display_for_user());
///     let code = err.to_exit_code();
///     std::process::exit(code.as_i32());
/// }
/// ```
///
/// Library code returns `BenchError` and does NOT call `std::process::exit()`.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Instance generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "Solver '{program}' failed to start {consecutive_failures} times in a row: {last_reason}"
    )]
    SolverUnavailable {
        program: String,
        consecutive_failures: u32,
        last_reason: String,
    },

    #[error("Instance generation failed {consecutive_failures} times in a row: {last_reason}")]
    GeneratorBroken {
        consecutive_failures: u32,
        last_reason: String,
    },

    #[error("Campaign interrupted")]
    Interrupted,
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Generation,
    Execution,
    Ledger,
    FileSystem,
    Concurrency,
    Interrupted,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Generation => write!(f, "Instance Generation"),
            Self::Execution => write!(f, "Solver Execution"),
            Self::Ledger => write!(f, "Result Ledger"),
            Self::FileSystem => write!(f, "File System"),
            Self::Concurrency => write!(f, "Concurrency"),
            Self::Interrupted => write!(f, "Interrupted"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files are TOML with [solver], [limits], [campaign], [matrix], [generator] and [output] sections."
                    .to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' option is checked before any solver process is started."
            )),
            Self::NotFound { .. } | Self::DiscoveryFailed { .. } => Some(
                "circbench searches for .circbench/config.toml starting from the current directory upward."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of the configuration file".to_string(),
                "Run 'circbench config' to print the effective configuration".to_string(),
            ],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "limits.timeout_secs" | "limits.optimal_budget_secs" => vec![
                    "Use a positive number of seconds".to_string(),
                    "The optimal budget must not exceed the hard timeout".to_string(),
                ],
                "solver.variants" => vec![
                    "List at least one solver configuration name".to_string(),
                    "Or pass --variant on the command line".to_string(),
                ],
                "campaign.cpu_affinity" => vec![
                    "List CPU indices that exist on this machine".to_string(),
                    "Remove the option to let the scheduler place the solver".to_string(),
                ],
                _ => vec![
                    "Remove the option to use the default value".to_string(),
                    "Run 'circbench doctor' to validate the configuration".to_string(),
                ],
            },
            Self::NotFound { .. } => vec![
                "Create .circbench/config.toml in the benchmark directory".to_string(),
                "Pass --config <path> explicitly".to_string(),
            ],
            Self::DiscoveryFailed { .. } => vec![
                "Check read permissions on the current and parent directories".to_string(),
                "Use --config <path> to specify the configuration file".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors raised while generating or reconstructing a problem instance
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Instance size must be positive, got {n}")]
    InvalidSize { n: usize },

    #[error("Invalid generator parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Reconstructed instance {instance_id} does not match the registry: {reason}")]
    Mismatch { instance_id: String, reason: String },

    #[error("Malformed data file: {reason}")]
    DataFile { reason: String },
}

impl UserFriendlyError for GenerationError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidSize { n } => format!("Cannot generate an instance with {n} points"),
            Self::InvalidParameter { name, reason } => {
                format!("Generator parameter '{name}' is unusable: {reason}")
            }
            Self::Mismatch {
                instance_id,
                reason,
            } => format!(
                "Instance '{instance_id}' regenerated differently than it was recorded: {reason}"
            ),
            Self::DataFile { reason } => format!("Solver data file could not be read: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Mismatch { .. } => Some(
                "Resumed campaigns rebuild instances from their recorded seed; the generator settings changed since the ledger was written."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Mismatch { .. } => vec![
                "Restore the [generator] and [matrix] settings used when the ledger was created"
                    .to_string(),
                "Or point [output].ledger_dir at a fresh directory".to_string(),
            ],
            _ => vec!["Check the [generator] section of the configuration".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Generation
    }
}

/// Durable result store failures. These are never retried.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger at {path} is locked by another process")]
    Locked { path: PathBuf },

    #[error("Ledger I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger row {line} in {path} is unreadable: {reason}")]
    Corrupt {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("Instance {instance_id} is already registered with different parameters")]
    InstanceConflict { instance_id: String },
}

impl UserFriendlyError for LedgerError {
    fn user_message(&self) -> String {
        match self {
            Self::Locked { path } => format!(
                "Another circbench process is writing to the ledger in {}",
                path.display()
            ),
            Self::Io { path, source } => {
                format!("Could not write results to {}: {source}", path.display())
            }
            Self::Corrupt { path, line, reason } => format!(
                "Row {line} of {} could not be read: {reason}",
                path.display()
            ),
            Self::InstanceConflict { instance_id } => {
                format!("Instance '{instance_id}' was already recorded with other parameters")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Locked { .. } => Some(
                "Only one campaign may append to a ledger at a time; the lock is released when that process exits."
                    .to_string(),
            ),
            Self::Io { .. } => Some(
                "Results are fsynced before the next solver run starts, so a full or read-only disk stops the campaign."
                    .to_string(),
            ),
            Self::Corrupt { .. } | Self::InstanceConflict { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Locked { .. } => vec![
                "Wait for the running campaign to finish or stop it".to_string(),
                "Use a different [output].ledger_dir for a parallel campaign".to_string(),
            ],
            Self::Io { .. } => vec![
                "Check free disk space and permissions on the ledger directory".to_string(),
            ],
            Self::Corrupt { .. } => vec![
                "Inspect the reported row; rows written by circbench are never edited in place"
                    .to_string(),
            ],
            Self::InstanceConflict { .. } => vec![
                "Start a new ledger directory when changing instance generation settings"
                    .to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Locked { .. } => ErrorCategory::Concurrency,
            Self::Io { .. } => ErrorCategory::FileSystem,
            Self::Corrupt { .. } | Self::InstanceConflict { .. } => ErrorCategory::Ledger,
        }
    }
}

/// Execution supervisor construction errors
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("CPU {cpu} cannot be used for affinity: {reason}")]
    InvalidAffinity { cpu: usize, reason: String },

    #[error("Runner configuration invalid: {reason}")]
    ConfigurationInvalid { reason: String },
}

impl UserFriendlyError for RunnerError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidAffinity { cpu, reason } => {
                format!("Cannot pin the solver to CPU {cpu}: {reason}")
            }
            Self::ConfigurationInvalid { reason } => {
                format!("Solver execution is misconfigured: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        None
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["Check the [limits] and [campaign] sections of the configuration".to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Execution
    }
}

impl UserFriendlyError for BenchError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Generation(err) => err.user_message(),
            Self::Ledger(err) => err.user_message(),
            Self::Runner(err) => err.user_message(),
            Self::Io(err) => format!("File system operation failed: {err}"),
            Self::SolverUnavailable {
                program,
                consecutive_failures,
                last_reason,
            } => format!(
                "The solver '{program}' could not be started ({consecutive_failures} consecutive failures): {last_reason}"
            ),
            Self::GeneratorBroken {
                consecutive_failures,
                last_reason,
            } => format!(
                "Instance generation keeps failing ({consecutive_failures} consecutive failures): {last_reason}"
            ),
            Self::Interrupted => "The campaign was interrupted before finishing".to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Generation(err) => err.context(),
            Self::Ledger(err) => err.context(),
            Self::Runner(err) => err.context(),
            Self::Io(_) => None,
            Self::SolverUnavailable { .. } => Some(
                "The campaign stops early instead of recording every remaining request as a process error."
                    .to_string(),
            ),
            Self::GeneratorBroken { .. } => None,
            Self::Interrupted => Some(
                "Every completed request is already in the ledger; rerun the same command to resume."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Generation(err) => err.suggestions(),
            Self::Ledger(err) => err.suggestions(),
            Self::Runner(err) => err.suggestions(),
            Self::Io(_) => vec!["Check permissions and free disk space".to_string()],
            Self::SolverUnavailable { .. } => vec![
                "Run 'circbench doctor' to check the solver installation".to_string(),
                "Verify [solver].program and [solver].project_dir".to_string(),
            ],
            Self::GeneratorBroken { .. } => {
                vec!["Check the [generator] section of the configuration".to_string()]
            }
            Self::Interrupted => vec!["Rerun the same command to resume".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(err) => err.category(),
            Self::Generation(err) => err.category(),
            Self::Ledger(err) => err.category(),
            Self::Runner(err) => err.category(),
            Self::Io(_) => ErrorCategory::FileSystem,
            Self::SolverUnavailable { .. } => ErrorCategory::Execution,
            Self::GeneratorBroken { .. } => ErrorCategory::Generation,
            Self::Interrupted => ErrorCategory::Interrupted,
        }
    }
}

impl BenchError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// ```text
    /// Error: <user_message>
    ///
    /// Context: <context>
    ///
    /// Suggestions:
    ///   • <suggestion 1>
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {}\n", self.user_message());

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the appropriate CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Runner(_) => ExitCode::CLI_ARGS,
            Self::Ledger(LedgerError::Locked { .. }) => ExitCode::LOCK_HELD,
            Self::Ledger(_) => ExitCode::LEDGER_IO,
            Self::SolverUnavailable { .. } => ExitCode::SOLVER_UNAVAILABLE,
            Self::Interrupted => ExitCode::INTERRUPTED,
            Self::Generation(_) | Self::GeneratorBroken { .. } | Self::Io(_) => ExitCode::INTERNAL,
        }
    }
}
