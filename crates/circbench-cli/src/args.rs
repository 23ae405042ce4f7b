//! CLI argument definitions and parsing structures

use circbench_config::{CampaignMode, CliArgs};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// circbench - resumable benchmark harness for a circle k-coverage solver
#[derive(Parser, Debug)]
#[command(name = "circbench")]
#[command(about = "Run solver variants over generated coverage instances and record every outcome")]
#[command(long_about = r#"
circbench generates circle k-coverage instances, runs every configured solver
variant on each of them under a wall-clock limit, and appends one row per
(instance, variant, repetition) to a CSV ledger. Rows already in the ledger
are never run again, so an interrupted campaign resumes where it stopped.

EXAMPLES:
  # Run the closed size/coverage grid with the configured variants
  circbench run

  # Open-ended random instances, two variants, pinned to CPU 2
  circbench run --mode open --variant Teste1 --variant Teste2 --cpus 2

  # Progress per variant
  circbench status

  # Preflight checks
  circbench doctor --strict

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  The config file is discovered by searching upward from CWD for .circbench/config.toml
  Use --config to specify an explicit config file path
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Solver executable (bare name looked up on PATH)
    #[arg(long, global = true)]
    pub solver: Option<String>,

    /// Solver project directory
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Directory holding the results ledger
    #[arg(long, global = true)]
    pub ledger_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run (or resume) a campaign
    ///
    /// EXAMPLES:
    ///   circbench run --timeout 600 --repetitions 3
    ///   circbench run --mode open --max-instances 50
    Run {
        /// closed (size × coverage grid) or open (random instances)
        #[arg(long)]
        mode: Option<CampaignMode>,

        /// Solver variant to run; repeat for several (replaces the configured list)
        #[arg(long = "variant")]
        variants: Vec<String>,

        /// Wall-clock limit per execution, in seconds
        #[arg(long)]
        timeout: Option<f64>,

        /// Solved runs slower than this are recorded as NOT_OPTIMAL
        #[arg(long)]
        optimal_budget: Option<f64>,

        #[arg(long)]
        repetitions: Option<u32>,

        /// Campaign seed for instance generation
        #[arg(long)]
        seed: Option<u64>,

        /// Stop an open campaign after this many instances
        #[arg(long)]
        max_instances: Option<usize>,

        /// Comma-separated CPU indices the solver is pinned to
        #[arg(long, value_delimiter = ',')]
        cpus: Vec<usize>,

        /// Write raw solver stdout of every execution into this directory
        #[arg(long)]
        debug_dir: Option<PathBuf>,
    },

    /// Show ledger progress per variant
    Status {
        /// Output status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run environment health checks
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },

    /// Show the effective configuration and where each value came from
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Configuration overrides carried by these arguments.
    #[must_use]
    pub fn to_cli_args(&self) -> CliArgs {
        let mut args = CliArgs {
            config_path: self.config.clone(),
            solver_program: self.solver.clone(),
            project_dir: self.project_dir.clone(),
            ledger_dir: self.ledger_dir.clone(),
            ..CliArgs::default()
        };

        if let Commands::Run {
            mode,
            variants,
            timeout,
            optimal_budget,
            repetitions,
            seed,
            max_instances,
            cpus,
            debug_dir,
        } = &self.command
        {
            args.mode = *mode;
            args.variants = variants.clone();
            args.timeout_secs = *timeout;
            args.optimal_budget_secs = *optimal_budget;
            args.repetitions = *repetitions;
            args.seed = *seed;
            args.max_instances = *max_instances;
            args.cpu_affinity = (!cpus.is_empty()).then(|| cpus.clone());
            args.debug_dir = debug_dir.clone();
        }
        args
    }

    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self.command {
            Commands::Run { .. } => "run",
            Commands::Status { .. } => "status",
            Commands::Doctor { .. } => "doctor",
            Commands::Config { .. } => "config",
        }
    }
}

/// Build the CLI command structure without parsing arguments
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
