use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::{Display, EnumString};

/// Effective circbench configuration.
///
/// Built from defaults, then `.circbench/config.toml`, then CLI flags. Every
/// section deserializes with defaults, so a config file only needs the keys
/// it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub solver: SolverConfig,
    pub limits: LimitsConfig,
    pub campaign: CampaignConfig,
    pub matrix: MatrixConfig,
    pub generator: GeneratorConfig,
    pub output: OutputConfig,

    /// Where each dotted key got its value.
    #[serde(skip)]
    pub source_attribution: BTreeMap<String, ConfigSource>,
    /// Config file that was loaded, if any.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
    /// Relative paths in the configuration are resolved against this
    /// directory: the one containing `.circbench/`, or the start directory.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Solver executable, looked up on `PATH` when not a path.
    pub program: String,
    /// Argument template. `{project_dir}`, `{variant}` and `{data_file}` are
    /// substituted per request.
    pub args: Vec<String>,
    /// Working directory of the solver; the data file is written here.
    pub project_dir: PathBuf,
    pub data_file: String,
    pub variants: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            program: "oplrun".to_string(),
            args: vec![
                "-p".to_string(),
                "{project_dir}".to_string(),
                "{variant}".to_string(),
            ],
            project_dir: PathBuf::from("."),
            data_file: "circle_coverage.dat".to_string(),
            variants: (1..=6).map(|i| format!("Teste{i}")).collect(),
            env: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Hard wall-clock limit per request.
    pub timeout_secs: f64,
    /// Solutions reported after this many seconds are classified
    /// `NOT_OPTIMAL`.
    pub optimal_budget_secs: f64,
    pub grace_period_secs: f64,
    pub reap_timeout_secs: f64,
    pub output_cap_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 3660.0,
            optimal_budget_secs: 3600.0,
            grace_period_secs: 5.0,
            reap_timeout_secs: 10.0,
            output_cap_bytes: 8 * 1024 * 1024,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CampaignMode {
    /// Sizes × coverages grid; terminates when exhausted.
    #[default]
    Closed,
    /// Random instances until interrupted or `max_instances` is reached.
    Open,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CampaignConfig {
    pub mode: CampaignMode,
    pub repetitions: u32,
    pub seed: u64,
    pub instance_pause_secs: f64,
    /// Abort after this many consecutive spawn failures.
    pub spawn_failure_limit: u32,
    /// Abort after this many consecutive generation failures.
    pub generation_failure_limit: u32,
    /// Open mode only: stop after this many instances.
    pub max_instances: Option<usize>,
    /// CPUs the solver is pinned to (Linux).
    pub cpu_affinity: Option<Vec<usize>>,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            mode: CampaignMode::Closed,
            repetitions: 1,
            seed: 42,
            instance_pause_secs: 0.0,
            spawn_failure_limit: 3,
            generation_failure_limit: 5,
            max_instances: None,
            cpu_affinity: None,
        }
    }
}

/// Closed-mode grid. Instance points are shared: the instance of size `n` uses
/// the first `n` points of one base draw of `max(sizes)` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatrixConfig {
    pub sizes: Vec<usize>,
    pub coverages: Vec<u32>,
    pub radius: f64,
    pub min_dist: f64,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            sizes: vec![8, 16, 32, 64, 128, 256],
            coverages: vec![1, 2, 3],
            radius: 30.0,
            min_dist: 1.5,
        }
    }
}

/// Random instance generation (open mode) and point placement (both modes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub n_min: usize,
    pub n_max: usize,
    pub center_x: f64,
    pub center_y: f64,
    pub cluster_radius: f64,
    /// Standard deviation is `cluster_radius / spread_divisor`.
    pub spread_divisor: f64,
    /// Coordinates are clipped to `[-clip, clip]`.
    pub clip: f64,
    pub decimals: u32,
    pub radius_min: f64,
    pub radius_max: f64,
    pub radius_scale: f64,
    pub coverage_min: u32,
    pub coverage_max: u32,
    pub min_dist_floor: f64,
    pub min_dist_ceiling: f64,
    pub min_dist_radius_fraction: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            n_min: 10,
            n_max: 200,
            center_x: 0.0,
            center_y: 0.0,
            cluster_radius: 150.0,
            spread_divisor: 2.5,
            clip: 300.0,
            decimals: 2,
            radius_min: 10.0,
            radius_max: 75.0,
            radius_scale: 1.5,
            coverage_min: 1,
            coverage_max: 5,
            min_dist_floor: 1.0,
            min_dist_ceiling: 3.0,
            min_dist_radius_fraction: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub ledger_dir: PathBuf,
    pub solutions_dir: PathBuf,
    /// Raw solver stdout per request is kept here when set.
    pub debug_dir: Option<PathBuf>,
    pub write_solutions: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            ledger_dir: PathBuf::from("tables"),
            solutions_dir: PathBuf::from("solutions"),
            debug_dir: None,
            write_solutions: true,
        }
    }
}

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    ConfigFile(PathBuf),
    Programmatic,
    Defaults,
}

/// CLI overrides. `None` leaves the file/default value alone.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub solver_program: Option<String>,
    pub project_dir: Option<PathBuf>,
    pub variants: Vec<String>,
    pub timeout_secs: Option<f64>,
    pub optimal_budget_secs: Option<f64>,
    pub repetitions: Option<u32>,
    pub seed: Option<u64>,
    pub mode: Option<CampaignMode>,
    pub max_instances: Option<usize>,
    pub cpu_affinity: Option<Vec<usize>>,
    pub ledger_dir: Option<PathBuf>,
    pub debug_dir: Option<PathBuf>,
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl Config {
    /// Resolve a configured path against [`base_dir`](Self::base_dir).
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Solver program: a bare name is left for `PATH` lookup, anything with a
    /// directory component is resolved like other paths.
    #[must_use]
    pub fn solver_program(&self) -> PathBuf {
        let program = Path::new(&self.solver.program);
        if program.components().count() > 1 {
            self.resolve(program)
        } else {
            program.to_path_buf()
        }
    }

    #[must_use]
    pub fn project_dir(&self) -> PathBuf {
        self.resolve(&self.solver.project_dir)
    }

    #[must_use]
    pub fn data_file_path(&self) -> PathBuf {
        self.project_dir().join(&self.solver.data_file)
    }

    #[must_use]
    pub fn ledger_dir(&self) -> PathBuf {
        self.resolve(&self.output.ledger_dir)
    }

    #[must_use]
    pub fn solutions_dir(&self) -> PathBuf {
        self.resolve(&self.output.solutions_dir)
    }

    #[must_use]
    pub fn debug_dir(&self) -> Option<PathBuf> {
        self.output.debug_dir.as_deref().map(|p| self.resolve(p))
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        secs(self.limits.timeout_secs)
    }

    #[must_use]
    pub fn optimal_budget(&self) -> Duration {
        secs(self.limits.optimal_budget_secs)
    }

    #[must_use]
    pub fn grace_period(&self) -> Duration {
        secs(self.limits.grace_period_secs)
    }

    #[must_use]
    pub fn reap_timeout(&self) -> Duration {
        secs(self.limits.reap_timeout_secs)
    }

    #[must_use]
    pub fn instance_pause(&self) -> Duration {
        secs(self.campaign.instance_pause_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults_match_benchmark_setup() {
        let config = Config::default();
        assert_eq!(config.solver.program, "oplrun");
        assert_eq!(config.solver.variants.len(), 6);
        assert_eq!(config.solver.variants[0], "Teste1");
        assert_eq!(config.limits.timeout_secs, 3660.0);
        assert_eq!(config.limits.optimal_budget_secs, 3600.0);
        assert_eq!(config.matrix.sizes, vec![8, 16, 32, 64, 128, 256]);
        assert_eq!(config.generator.cluster_radius, 150.0);
        assert_eq!(config.campaign.mode, CampaignMode::Closed);
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [limits]
            timeout_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.limits.timeout_secs, 60.0);
        assert_eq!(config.limits.optimal_budget_secs, 3600.0);
        assert_eq!(config.solver, SolverConfig::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [limits]
            timeout = 60
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(CampaignMode::from_str("open").unwrap(), CampaignMode::Open);
        assert_eq!(CampaignMode::Closed.to_string(), "closed");
        let config: Config = toml::from_str("[campaign]\nmode = \"open\"\n").unwrap();
        assert_eq!(config.campaign.mode, CampaignMode::Open);
    }

    #[test]
    fn test_paths_resolve_against_base_dir() {
        let config = Config {
            base_dir: PathBuf::from("/bench"),
            ..Config::default()
        };
        assert_eq!(config.ledger_dir(), PathBuf::from("/bench/tables"));
        assert_eq!(
            config.data_file_path(),
            PathBuf::from("/bench/./circle_coverage.dat")
        );
        assert_eq!(config.resolve(Path::new("/abs")), PathBuf::from("/abs"));
        assert_eq!(config.solver_program(), PathBuf::from("oplrun"));

        let mut local = config.clone();
        local.solver.program = "bin/solver.sh".to_string();
        assert_eq!(local.solver_program(), PathBuf::from("/bench/bin/solver.sh"));
    }

    #[test]
    fn test_durations() {
        let mut config = Config::default();
        config.limits.grace_period_secs = 0.25;
        assert_eq!(config.grace_period(), Duration::from_millis(250));
        config.limits.timeout_secs = f64::NAN;
        assert_eq!(config.timeout(), Duration::ZERO);
    }
}
