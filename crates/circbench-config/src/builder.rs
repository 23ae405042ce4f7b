use circbench_utils::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

use crate::model::{CampaignMode, Config, ConfigSource, GeneratorConfig, MatrixConfig};

impl Config {
    /// Start a programmatic configuration, independent of the working
    /// directory and any config file.
    ///
    /// ```rust
    /// use circbench_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .program("/opt/ibm/cplex/bin/oplrun")
    ///     .variants(["Teste1", "Teste4"])
    ///     .timeout(Duration::from_secs(120))
    ///     .optimal_budget(Duration::from_secs(100))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.solver.variants.len(), 2);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Fluent builder for [`Config`].
///
/// Every value set here is attributed to [`ConfigSource::Programmatic`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        let mut config = Config::default();
        config.base_dir = PathBuf::from(".");
        Self { config }
    }

    fn mark(&mut self, key: &str) {
        self.config
            .source_attribution
            .insert(key.to_string(), ConfigSource::Programmatic);
    }

    #[must_use]
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.config.solver.program = program.into();
        self.mark("solver.program");
        self
    }

    /// Replace the solver argument template.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.solver.args = args.into_iter().map(Into::into).collect();
        self.mark("solver.args");
        self
    }

    #[must_use]
    pub fn project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.solver.project_dir = dir.into();
        self.mark("solver.project_dir");
        self
    }

    #[must_use]
    pub fn data_file(mut self, name: impl Into<String>) -> Self {
        self.config.solver.data_file = name.into();
        self.mark("solver.data_file");
        self
    }

    #[must_use]
    pub fn variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.solver.variants = variants.into_iter().map(Into::into).collect();
        self.mark("solver.variants");
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.limits.timeout_secs = timeout.as_secs_f64();
        self.mark("limits.timeout_secs");
        self
    }

    #[must_use]
    pub fn optimal_budget(mut self, budget: Duration) -> Self {
        self.config.limits.optimal_budget_secs = budget.as_secs_f64();
        self.mark("limits.optimal_budget_secs");
        self
    }

    #[must_use]
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.config.limits.grace_period_secs = grace.as_secs_f64();
        self.mark("limits.grace_period_secs");
        self
    }

    #[must_use]
    pub fn output_cap_bytes(mut self, bytes: usize) -> Self {
        self.config.limits.output_cap_bytes = bytes;
        self.mark("limits.output_cap_bytes");
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: CampaignMode) -> Self {
        self.config.campaign.mode = mode;
        self.mark("campaign.mode");
        self
    }

    #[must_use]
    pub fn repetitions(mut self, repetitions: u32) -> Self {
        self.config.campaign.repetitions = repetitions;
        self.mark("campaign.repetitions");
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.campaign.seed = seed;
        self.mark("campaign.seed");
        self
    }

    #[must_use]
    pub fn instance_pause(mut self, pause: Duration) -> Self {
        self.config.campaign.instance_pause_secs = pause.as_secs_f64();
        self.mark("campaign.instance_pause_secs");
        self
    }

    #[must_use]
    pub fn spawn_failure_limit(mut self, limit: u32) -> Self {
        self.config.campaign.spawn_failure_limit = limit;
        self.mark("campaign.spawn_failure_limit");
        self
    }

    #[must_use]
    pub fn max_instances(mut self, max: usize) -> Self {
        self.config.campaign.max_instances = Some(max);
        self.mark("campaign.max_instances");
        self
    }

    #[must_use]
    pub fn cpu_affinity(mut self, cpus: Vec<usize>) -> Self {
        self.config.campaign.cpu_affinity = Some(cpus);
        self.mark("campaign.cpu_affinity");
        self
    }

    #[must_use]
    pub fn matrix(mut self, matrix: MatrixConfig) -> Self {
        self.config.matrix = matrix;
        for key in ["sizes", "coverages", "radius", "min_dist"] {
            self.mark(&format!("matrix.{key}"));
        }
        self
    }

    #[must_use]
    pub fn generator(mut self, generator: GeneratorConfig) -> Self {
        self.config.generator = generator;
        self.mark("generator");
        self
    }

    #[must_use]
    pub fn ledger_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output.ledger_dir = dir.into();
        self.mark("output.ledger_dir");
        self
    }

    #[must_use]
    pub fn solutions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output.solutions_dir = dir.into();
        self.mark("output.solutions_dir");
        self
    }

    #[must_use]
    pub fn write_solutions(mut self, enabled: bool) -> Self {
        self.config.output.write_solutions = enabled;
        self.mark("output.write_solutions");
        self
    }

    #[must_use]
    pub fn debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output.debug_dir = Some(dir.into());
        self.mark("output.debug_dir");
        self
    }

    /// Directory relative paths are resolved against.
    #[must_use]
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.base_dir = dir.into();
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_are_valid() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.solver.program, "oplrun");
        assert!(config.source_attribution.is_empty());
    }

    #[test]
    fn test_builder_marks_programmatic_source() {
        let config = Config::builder()
            .program("solver-stub")
            .repetitions(3)
            .base_dir("/bench")
            .ledger_dir("out")
            .build()
            .unwrap();
        assert_eq!(config.campaign.repetitions, 3);
        assert_eq!(config.ledger_dir(), PathBuf::from("/bench/out"));
        assert_eq!(
            config.source_attribution.get("solver.program"),
            Some(&ConfigSource::Programmatic)
        );
        assert!(!config.source_attribution.contains_key("limits.timeout_secs"));
    }

    #[test]
    fn test_builder_validates() {
        let result = Config::builder()
            .timeout(Duration::from_secs(10))
            .optimal_budget(Duration::from_secs(20))
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
