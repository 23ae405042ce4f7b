use circbench_utils::error::ConfigError;
use circbench_utils::types::file_safe;
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use crate::model::Config;

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    }
}

fn positive(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(key, format!("{value} (must be a positive number)")))
    }
}

fn non_negative(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(key, format!("{value} (must be zero or positive)")))
    }
}

/// Each entry expands into its own ledger keys, so a repeat would run twice.
fn distinct<T: Eq + Hash + Display>(key: &str, values: &[T]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    match values.iter().find(|v| !seen.insert(*v)) {
        Some(repeated) => Err(invalid(key, format!("'{repeated}' is listed more than once"))),
        None => Ok(()),
    }
}

impl Config {
    /// Reject configurations that cannot run a meaningful campaign.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let solver = &self.solver;
        if solver.program.trim().is_empty() {
            return Err(invalid("solver.program", "must not be empty"));
        }
        if solver.variants.is_empty() {
            return Err(invalid("solver.variants", "at least one variant is required"));
        }
        if let Some(variant) = solver.variants.iter().find(|v| v.trim().is_empty()) {
            return Err(invalid("solver.variants", format!("'{variant}' is blank")));
        }
        distinct("solver.variants", &solver.variants)?;
        // Solution dumps are keyed by the file-safe variant name.
        let mut dump_names = HashSet::new();
        if let Some(variant) = solver
            .variants
            .iter()
            .find(|v| !dump_names.insert(file_safe(v)))
        {
            return Err(invalid(
                "solver.variants",
                format!(
                    "'{variant}' shares the dump directory name '{}' with another variant",
                    file_safe(variant)
                ),
            ));
        }
        if solver.data_file.is_empty() || solver.data_file.contains(['/', '\\']) {
            return Err(invalid(
                "solver.data_file",
                format!("'{}' must be a plain file name", solver.data_file),
            ));
        }

        let limits = &self.limits;
        positive("limits.timeout_secs", limits.timeout_secs)?;
        non_negative("limits.optimal_budget_secs", limits.optimal_budget_secs)?;
        if limits.optimal_budget_secs > limits.timeout_secs {
            return Err(invalid(
                "limits.optimal_budget_secs",
                format!(
                    "{} exceeds timeout_secs {}",
                    limits.optimal_budget_secs, limits.timeout_secs
                ),
            ));
        }
        non_negative("limits.grace_period_secs", limits.grace_period_secs)?;
        positive("limits.reap_timeout_secs", limits.reap_timeout_secs)?;
        if limits.output_cap_bytes < 1024 {
            return Err(invalid(
                "limits.output_cap_bytes",
                "must be at least 1024 bytes (1 KiB)",
            ));
        }

        let campaign = &self.campaign;
        if campaign.repetitions == 0 {
            return Err(invalid("campaign.repetitions", "must be at least 1"));
        }
        non_negative("campaign.instance_pause_secs", campaign.instance_pause_secs)?;
        if campaign.spawn_failure_limit == 0 {
            return Err(invalid("campaign.spawn_failure_limit", "must be at least 1"));
        }
        if campaign.generation_failure_limit == 0 {
            return Err(invalid("campaign.generation_failure_limit", "must be at least 1"));
        }
        if let Some(cpus) = &campaign.cpu_affinity {
            if cpus.is_empty() {
                return Err(invalid("campaign.cpu_affinity", "must list at least one CPU"));
            }
        }

        let matrix = &self.matrix;
        if matrix.sizes.is_empty() || matrix.sizes.contains(&0) {
            return Err(invalid("matrix.sizes", "must list positive instance sizes"));
        }
        if matrix.coverages.is_empty() || matrix.coverages.contains(&0) {
            return Err(invalid("matrix.coverages", "must list positive coverage values"));
        }
        distinct("matrix.sizes", &matrix.sizes)?;
        distinct("matrix.coverages", &matrix.coverages)?;
        positive("matrix.radius", matrix.radius)?;
        non_negative("matrix.min_dist", matrix.min_dist)?;

        let generator = &self.generator;
        if generator.n_min == 0 || generator.n_min > generator.n_max {
            return Err(invalid(
                "generator.n_min",
                format!(
                    "range {}..={} must be non-empty and start at 1 or more",
                    generator.n_min, generator.n_max
                ),
            ));
        }
        for (key, value) in [
            ("generator.center_x", generator.center_x),
            ("generator.center_y", generator.center_y),
        ] {
            if !value.is_finite() {
                return Err(invalid(key, "must be finite"));
            }
        }
        non_negative("generator.cluster_radius", generator.cluster_radius)?;
        positive("generator.spread_divisor", generator.spread_divisor)?;
        positive("generator.clip", generator.clip)?;
        if generator.decimals > 9 {
            return Err(invalid("generator.decimals", "must be 9 or fewer"));
        }
        positive("generator.radius_min", generator.radius_min)?;
        positive("generator.radius_max", generator.radius_max)?;
        if generator.radius_min > generator.radius_max {
            return Err(invalid(
                "generator.radius_min",
                format!(
                    "{} exceeds radius_max {}",
                    generator.radius_min, generator.radius_max
                ),
            ));
        }
        positive("generator.radius_scale", generator.radius_scale)?;
        if generator.coverage_min == 0 || generator.coverage_min > generator.coverage_max {
            return Err(invalid(
                "generator.coverage_min",
                format!(
                    "range {}..={} must be non-empty and start at 1 or more",
                    generator.coverage_min, generator.coverage_max
                ),
            ));
        }
        non_negative("generator.min_dist_floor", generator.min_dist_floor)?;
        non_negative("generator.min_dist_ceiling", generator.min_dist_ceiling)?;
        non_negative(
            "generator.min_dist_radius_fraction",
            generator.min_dist_radius_fraction,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(err: ConfigError) -> String {
        match err {
            ConfigError::InvalidValue { key, .. } => key,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.timeout_secs = 0.0;
        assert_eq!(key_of(config.validate().unwrap_err()), "limits.timeout_secs");
    }

    #[test]
    fn test_rejects_budget_above_timeout() {
        let mut config = Config::default();
        config.limits.optimal_budget_secs = 4000.0;
        assert_eq!(
            key_of(config.validate().unwrap_err()),
            "limits.optimal_budget_secs"
        );
    }

    #[test]
    fn test_rejects_empty_variants() {
        let mut config = Config::default();
        config.solver.variants.clear();
        assert_eq!(key_of(config.validate().unwrap_err()), "solver.variants");
    }

    #[test]
    fn test_rejects_repeated_variants() {
        let mut config = Config::default();
        config.solver.variants = vec!["Teste1".to_string(), "Teste1".to_string()];
        assert_eq!(key_of(config.validate().unwrap_err()), "solver.variants");
    }

    #[test]
    fn test_rejects_variants_with_same_dump_directory() {
        let mut config = Config::default();
        config.solver.variants = vec!["run a".to_string(), "run/a".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("run_a"), "{err}");
    }

    #[test]
    fn test_rejects_repeated_grid_values() {
        let mut config = Config::default();
        config.matrix.sizes = vec![8, 16, 8];
        assert_eq!(key_of(config.validate().unwrap_err()), "matrix.sizes");

        let mut config = Config::default();
        config.matrix.coverages = vec![2, 2];
        assert_eq!(key_of(config.validate().unwrap_err()), "matrix.coverages");
    }

    #[test]
    fn test_rejects_zero_repetitions() {
        let mut config = Config::default();
        config.campaign.repetitions = 0;
        assert_eq!(key_of(config.validate().unwrap_err()), "campaign.repetitions");
    }

    #[test]
    fn test_rejects_non_positive_radius_min() {
        let mut config = Config::default();
        config.generator.radius_min = 0.0;
        assert_eq!(key_of(config.validate().unwrap_err()), "generator.radius_min");
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let mut config = Config::default();
        config.generator.n_min = 300;
        assert_eq!(key_of(config.validate().unwrap_err()), "generator.n_min");

        let mut config = Config::default();
        config.generator.coverage_min = 6;
        assert_eq!(key_of(config.validate().unwrap_err()), "generator.coverage_min");
    }

    #[test]
    fn test_rejects_data_file_with_directory() {
        let mut config = Config::default();
        config.solver.data_file = "../escape.dat".to_string();
        assert_eq!(key_of(config.validate().unwrap_err()), "solver.data_file");
    }

    #[test]
    fn test_zero_grace_period_is_allowed() {
        let mut config = Config::default();
        config.limits.grace_period_secs = 0.0;
        config.validate().unwrap();
    }
}
