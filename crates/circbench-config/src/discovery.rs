use circbench_utils::error::ConfigError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::model::{CliArgs, Config, ConfigSource};

/// Directory holding the configuration file, searched for upward.
pub const CONFIG_DIR: &str = ".circbench";
pub const CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir().map_err(|e| ConfigError::DiscoveryFailed {
            reason: format!("cannot read current directory: {e}"),
        })?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Path-driven variant of [`discover`](Self::discover), free of
    /// process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    });
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir),
        };

        let mut config = match &config_path {
            Some(path) => Self::load_file(path)?,
            None => {
                let mut config = Config::default();
                config.base_dir = start_dir.to_path_buf();
                config
            }
        };

        config.apply_cli(cli_args);
        config.validate()?;
        Ok(config)
    }

    /// Walk upward from `start_dir` looking for `.circbench/config.toml`.
    /// Stops at a repository root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        for dir in start_dir.ancestors() {
            let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
            if dir.join(".git").exists() || dir.join(".hg").exists() {
                break;
            }
        }
        None
    }

    /// Load a configuration file on top of defaults, recording which keys it
    /// set.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::InvalidFile(format!("{}: {e}", path.display()))
            }
        })?;

        let table: toml::Table = toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))?;

        let source = ConfigSource::ConfigFile(path.to_path_buf());
        config.source_attribution = BTreeMap::new();
        for (section, value) in &table {
            if let Some(keys) = value.as_table() {
                for key in keys.keys() {
                    config
                        .source_attribution
                        .insert(format!("{section}.{key}"), source.clone());
                }
            }
        }

        config.config_path = Some(path.to_path_buf());
        config.base_dir = base_dir_for(path);
        Ok(config)
    }

    /// Apply CLI overrides, attributing each one to the command line.
    pub fn apply_cli(&mut self, cli: &CliArgs) {
        fn set(attribution: &mut BTreeMap<String, ConfigSource>, key: &str) {
            attribution.insert(key.to_string(), ConfigSource::Cli);
        }
        let attribution = &mut self.source_attribution;

        if let Some(program) = &cli.solver_program {
            self.solver.program = program.clone();
            set(attribution, "solver.program");
        }
        if let Some(dir) = &cli.project_dir {
            self.solver.project_dir = dir.clone();
            set(attribution, "solver.project_dir");
        }
        if !cli.variants.is_empty() {
            self.solver.variants = cli.variants.clone();
            set(attribution, "solver.variants");
        }
        if let Some(timeout) = cli.timeout_secs {
            self.limits.timeout_secs = timeout;
            set(attribution, "limits.timeout_secs");
        }
        if let Some(budget) = cli.optimal_budget_secs {
            self.limits.optimal_budget_secs = budget;
            set(attribution, "limits.optimal_budget_secs");
        }
        if let Some(repetitions) = cli.repetitions {
            self.campaign.repetitions = repetitions;
            set(attribution, "campaign.repetitions");
        }
        if let Some(seed) = cli.seed {
            self.campaign.seed = seed;
            set(attribution, "campaign.seed");
        }
        if let Some(mode) = cli.mode {
            self.campaign.mode = mode;
            set(attribution, "campaign.mode");
        }
        if let Some(max) = cli.max_instances {
            self.campaign.max_instances = Some(max);
            set(attribution, "campaign.max_instances");
        }
        if let Some(cpus) = &cli.cpu_affinity {
            self.campaign.cpu_affinity = Some(cpus.clone());
            set(attribution, "campaign.cpu_affinity");
        }
        if let Some(dir) = &cli.ledger_dir {
            self.output.ledger_dir = dir.clone();
            set(attribution, "output.ledger_dir");
        }
        if let Some(dir) = &cli.debug_dir {
            self.output.debug_dir = Some(dir.clone());
            set(attribution, "output.debug_dir");
        }
    }
}

/// `/bench/.circbench/config.toml` resolves paths against `/bench`; a file
/// anywhere else resolves against its own directory.
fn base_dir_for(config_path: &Path) -> PathBuf {
    let parent = config_path.parent().unwrap_or_else(|| Path::new("."));
    if parent.file_name().is_some_and(|name| name == CONFIG_DIR) {
        parent.parent().unwrap_or(parent).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CampaignMode;
    use tempfile::TempDir;

    fn write_config(root: &Path, content: &str) -> PathBuf {
        let dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_discovers_config_in_parent_directory() {
        let root = TempDir::new().unwrap();
        let path = write_config(root.path(), "[campaign]\nrepetitions = 5\n");
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(Config::discover_config_file_from(&nested), Some(path.clone()));

        let config = Config::discover_from(&nested, &CliArgs::default()).unwrap();
        assert_eq!(config.campaign.repetitions, 5);
        assert_eq!(config.config_path, Some(path.clone()));
        assert_eq!(config.base_dir, root.path());
        assert_eq!(
            config.source_attribution.get("campaign.repetitions"),
            Some(&ConfigSource::ConfigFile(path))
        );
    }

    #[test]
    fn test_discovery_stops_at_repository_root() {
        let root = TempDir::new().unwrap();
        write_config(root.path(), "");
        let repo = root.path().join("repo");
        std::fs::create_dir_all(repo.join(".git")).unwrap();
        assert_eq!(Config::discover_config_file_from(&repo), None);
    }

    #[test]
    fn test_cli_overrides_file() {
        let root = TempDir::new().unwrap();
        write_config(
            root.path(),
            "[limits]\ntimeout_secs = 100\noptimal_budget_secs = 90\n[campaign]\nmode = \"closed\"\n",
        );
        let cli = CliArgs {
            timeout_secs: Some(50.0),
            optimal_budget_secs: Some(40.0),
            mode: Some(CampaignMode::Open),
            variants: vec!["Teste2".to_string()],
            ..CliArgs::default()
        };
        let config = Config::discover_from(root.path(), &cli).unwrap();
        assert_eq!(config.limits.timeout_secs, 50.0);
        assert_eq!(config.campaign.mode, CampaignMode::Open);
        assert_eq!(config.solver.variants, vec!["Teste2".to_string()]);
        assert_eq!(
            config.source_attribution.get("limits.timeout_secs"),
            Some(&ConfigSource::Cli)
        );
    }

    #[test]
    fn test_defaults_without_file() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join(".git")).unwrap();
        let config = Config::discover_from(root.path(), &CliArgs::default()).unwrap();
        assert!(config.config_path.is_none());
        assert_eq!(config.base_dir, root.path());
        assert_eq!(config.ledger_dir(), root.path().join("tables"));
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let root = TempDir::new().unwrap();
        let cli = CliArgs {
            config_path: Some(root.path().join("nope.toml")),
            ..CliArgs::default()
        };
        assert!(matches!(
            Config::discover_from(root.path(), &cli),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let root = TempDir::new().unwrap();
        write_config(root.path(), "[limits\n");
        assert!(matches!(
            Config::discover_from(root.path(), &CliArgs::default()),
            Err(ConfigError::InvalidFile(_))
        ));
    }

    #[test]
    fn test_explicit_file_outside_config_dir_uses_its_directory() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("bench.toml");
        std::fs::write(&path, "[output]\nledger_dir = \"out\"\n").unwrap();
        let cli = CliArgs {
            config_path: Some(path),
            ..CliArgs::default()
        };
        let config = Config::discover_from(Path::new("/"), &cli).unwrap();
        assert_eq!(config.ledger_dir(), root.path().join("out"));
    }
}
