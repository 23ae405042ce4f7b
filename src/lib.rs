//! circbench - resumable benchmark harness for a circle k-coverage solver
//!
//! circbench generates circle k-coverage instances, runs every configured
//! solver variant on them under a wall-clock limit, classifies what the solver
//! printed, and appends one row per (instance, variant, repetition) to an
//! append-only CSV ledger. Rows already present are never re-run, so a
//! campaign killed at any point resumes without losing or duplicating work.
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Preflight: solver on PATH, project directory, ledger writable
//! circbench doctor
//!
//! # Run (or resume) the closed size × coverage grid
//! circbench run --timeout 3660 --optimal-budget 3600
//!
//! # Progress per variant
//! circbench status
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use circbench::{Config, Ledger, Schedule, ShutdownSignal, CampaignDriver, NoArtifacts};
//!
//! # async fn demo() -> Result<(), circbench::BenchError> {
//! let config = Config::builder()
//!     .program("oplrun")
//!     .project_dir("/srv/coverage-model")
//!     .variants(["Teste1", "Teste2"])
//!     .build()?;
//! let ledger = Ledger::open(&config.ledger_dir())?;
//! let schedule = Schedule::from_config(&config);
//! let mut driver = CampaignDriver::new(config, ledger, NoArtifacts, ShutdownSignal::new())?;
//! let summary = driver.run(schedule).await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```
//!
//! # Stable Public API
//!
//! - [`Config`] and [`ConfigBuilder`] - configuration
//! - [`Ledger`], [`LedgerRecord`] - the durable result store
//! - [`Supervisor`], [`CommandSpec`], [`TerminalState`] - solver execution
//! - [`parse`], [`classify`], [`OutcomeKind`] - output interpretation
//! - [`CampaignDriver`], [`Schedule`], [`CampaignSummary`] - orchestration
//! - [`BenchError`] and [`ExitCode`]
//!
//! The member crates are re-exported under their short names for everything
//! else.

pub use circbench_config::{
    CampaignMode, CliArgs, Config, ConfigBuilder, GeneratorConfig, MatrixConfig,
};
pub use circbench_engine::{
    ArtifactSink, BoundingBox, CampaignDriver, CampaignSummary, InstanceGenerator, InstancePlan,
    LedgerStatus, NoArtifacts, ProblemInstance, Schedule, SolutionArtifact, SolutionDumper,
    StructuredSolution, classify, parse, parse_bytes, run_campaign,
};
pub use circbench_ledger::{AppendOutcome, InstanceRecord, Ledger, LedgerRecord};
pub use circbench_runner::{
    CommandSpec, ExecutionReport, ShutdownSignal, Supervisor, SupervisorConfig, TerminalState,
};
pub use circbench_utils::{BenchError, ExecutionRequest, ExitCode, LedgerKey, OutcomeKind};

pub use circbench_cli as cli;
pub use circbench_config as config;
pub use circbench_doctor as doctor;
pub use circbench_engine as engine;
pub use circbench_ledger as ledger;
pub use circbench_runner as runner;
pub use circbench_utils as utils;
