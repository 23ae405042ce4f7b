use std::collections::BTreeMap;
use std::fmt;

use crate::model::{Config, ConfigSource};

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::ConfigFile(path) => write!(f, "config file ({})", path.display()),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Defaults => write!(f, "defaults"),
        }
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Config {
    /// Effective configuration as `key -> (value, source)`.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut entries = BTreeMap::new();
        let mut add = |key: &str, value: String| {
            let source = self
                .source_attribution
                .get(key)
                .map_or_else(|| "defaults".to_string(), ToString::to_string);
            entries.insert(key.to_string(), (value, source));
        };

        add("solver.program", self.solver.program.clone());
        add("solver.args", self.solver.args.join(" "));
        add(
            "solver.project_dir",
            self.project_dir().display().to_string(),
        );
        add("solver.data_file", self.solver.data_file.clone());
        add("solver.variants", join(&self.solver.variants));

        add("limits.timeout_secs", self.limits.timeout_secs.to_string());
        add(
            "limits.optimal_budget_secs",
            self.limits.optimal_budget_secs.to_string(),
        );
        add(
            "limits.grace_period_secs",
            self.limits.grace_period_secs.to_string(),
        );
        add(
            "limits.output_cap_bytes",
            self.limits.output_cap_bytes.to_string(),
        );

        add("campaign.mode", self.campaign.mode.to_string());
        add("campaign.repetitions", self.campaign.repetitions.to_string());
        add("campaign.seed", self.campaign.seed.to_string());
        if let Some(max) = self.campaign.max_instances {
            add("campaign.max_instances", max.to_string());
        }
        if let Some(cpus) = &self.campaign.cpu_affinity {
            add("campaign.cpu_affinity", join(cpus));
        }

        add("matrix.sizes", join(&self.matrix.sizes));
        add("matrix.coverages", join(&self.matrix.coverages));

        add("output.ledger_dir", self.ledger_dir().display().to_string());
        add(
            "output.solutions_dir",
            self.solutions_dir().display().to_string(),
        );
        if let Some(dir) = self.debug_dir() {
            add("output.debug_dir", dir.display().to_string());
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_effective_config_reports_sources() {
        let mut config = Config::default();
        config.campaign.repetitions = 4;
        config
            .source_attribution
            .insert("campaign.repetitions".to_string(), ConfigSource::Cli);
        config.source_attribution.insert(
            "solver.program".to_string(),
            ConfigSource::ConfigFile(PathBuf::from("/b/.circbench/config.toml")),
        );

        let effective = config.effective_config();
        assert_eq!(
            effective.get("campaign.repetitions"),
            Some(&("4".to_string(), "cli".to_string()))
        );
        assert_eq!(
            effective["solver.program"].1,
            "config file (/b/.circbench/config.toml)"
        );
        assert_eq!(effective["limits.timeout_secs"].1, "defaults");
        assert_eq!(effective["solver.variants"].0, "Teste1, Teste2, Teste3, Teste4, Teste5, Teste6");
        assert!(!effective.contains_key("output.debug_dir"));
    }
}
