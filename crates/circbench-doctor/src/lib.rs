//! Doctor command for environment health checks
//!
//! Preflight checks for solver availability, the solver project directory,
//! the data file, ledger writability and CPU pinning. Nothing here runs the
//! solver.

pub use circbench_utils::types::{CheckStatus, DoctorCheck};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use circbench_config::Config;
use circbench_engine::parse_data_file;
use circbench_ledger::{LOCK_FILE, LedgerLock, read_lock_info, read_results};
use circbench_runner::{Supervisor, SupervisorConfig};
use circbench_utils::error::LedgerError;

/// Doctor output structure for JSON emission (schema v1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorOutput {
    pub schema_version: String,
    /// RFC3339 UTC timestamp when the doctor output was emitted
    pub emitted_at: DateTime<Utc>,
    /// False if any check failed, or any warned in strict mode
    pub ok: bool,
    /// Sorted by name
    pub checks: Vec<DoctorCheck>,
}

fn check(name: &str, status: CheckStatus, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        status,
        details: details.into(),
    }
}

/// Doctor command implementation
pub struct DoctorCommand {
    config: Config,
}

impl DoctorCommand {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run all health checks. In strict mode warnings count as failures.
    #[must_use]
    pub fn run(&self, strict: bool) -> DoctorOutput {
        let mut checks = vec![
            self.check_config(),
            self.check_solver_path(),
            self.check_project_dir(),
            self.check_data_file(),
            self.check_ledger_writable(),
            self.check_ledger_readable(),
            self.check_ledger_lock(),
            self.check_cpu_affinity(),
        ];
        checks.sort_by(|a, b| a.name.cmp(&b.name));

        let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
        let has_warn = checks.iter().any(|c| c.status == CheckStatus::Warn);

        DoctorOutput {
            schema_version: "1".to_string(),
            emitted_at: Utc::now(),
            ok: !has_fail && (!strict || !has_warn),
            checks,
        }
    }

    fn check_config(&self) -> DoctorCheck {
        match self.config.validate() {
            Ok(()) => {
                let source = self
                    .config
                    .config_path
                    .as_ref()
                    .map_or_else(|| "defaults".to_string(), |p| p.display().to_string());
                check(
                    "config",
                    CheckStatus::Pass,
                    format!("Configuration valid ({source})"),
                )
            }
            Err(e) => check("config", CheckStatus::Fail, e.to_string()),
        }
    }

    /// A bare program name is looked up on PATH; anything with a directory
    /// component must exist as given.
    fn check_solver_path(&self) -> DoctorCheck {
        let program = self.config.solver_program();
        if program.components().count() > 1 {
            return if program.is_file() {
                check(
                    "solver_path",
                    CheckStatus::Pass,
                    format!("Found solver at {}", program.display()),
                )
            } else {
                check(
                    "solver_path",
                    CheckStatus::Fail,
                    format!("Solver not found at {}", program.display()),
                )
            };
        }

        match which::which(&program) {
            Ok(path) => check(
                "solver_path",
                CheckStatus::Pass,
                format!("Found {} at {}", program.display(), path.display()),
            ),
            Err(_) => check(
                "solver_path",
                CheckStatus::Fail,
                format!("{} not found in PATH", program.display()),
            ),
        }
    }

    fn check_project_dir(&self) -> DoctorCheck {
        let dir = self.config.project_dir();
        if dir.is_dir() {
            check(
                "project_dir",
                CheckStatus::Pass,
                format!("Solver project directory {}", dir.display()),
            )
        } else {
            check(
                "project_dir",
                CheckStatus::Fail,
                format!("Solver project directory {} does not exist", dir.display()),
            )
        }
    }

    /// The data file is rewritten before every instance, so a missing or
    /// foreign one only warrants a warning.
    fn check_data_file(&self) -> DoctorCheck {
        let path = self.config.data_file_path();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return check(
                    "data_file",
                    CheckStatus::Warn,
                    format!("{} does not exist yet; it is written before the first run", path.display()),
                );
            }
            Err(e) => {
                return check(
                    "data_file",
                    CheckStatus::Fail,
                    format!("Cannot read {}: {e}", path.display()),
                );
            }
        };

        match parse_data_file(&text) {
            Ok(contents) => check(
                "data_file",
                CheckStatus::Pass,
                format!(
                    "{} holds instance {} ({} points)",
                    path.display(),
                    contents.instance_id.as_deref().unwrap_or("<unnamed>"),
                    contents.n
                ),
            ),
            Err(e) => check(
                "data_file",
                CheckStatus::Warn,
                format!("{} will be overwritten; it does not parse: {e}", path.display()),
            ),
        }
    }

    fn check_ledger_writable(&self) -> DoctorCheck {
        let dir = self.config.ledger_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            return check(
                "ledger_writable",
                CheckStatus::Fail,
                format!("Cannot create ledger directory {}: {e}", dir.display()),
            );
        }

        // Same-directory temp file plus persist is exactly what atomic writes need.
        let probe = tempfile::NamedTempFile::new_in(&dir).and_then(|mut tmp| {
            tmp.write_all(b"probe")?;
            tmp.as_file().sync_all()?;
            let target = dir.join(".doctor_probe");
            tmp.persist(&target).map_err(|e| e.error)?;
            std::fs::remove_file(&target)
        });

        match probe {
            Ok(()) => check(
                "ledger_writable",
                CheckStatus::Pass,
                format!("{} is writable", dir.display()),
            ),
            Err(e) => check(
                "ledger_writable",
                CheckStatus::Fail,
                format!("Cannot write to {}: {e}", dir.display()),
            ),
        }
    }

    fn check_ledger_readable(&self) -> DoctorCheck {
        let dir = self.config.ledger_dir();
        match read_results(&dir) {
            Ok(records) => check(
                "ledger_readable",
                CheckStatus::Pass,
                format!("{} results recorded", records.len()),
            ),
            Err(e) => check("ledger_readable", CheckStatus::Fail, e.to_string()),
        }
    }

    fn check_ledger_lock(&self) -> DoctorCheck {
        let dir = self.config.ledger_dir();
        if !dir.is_dir() {
            return check("ledger_lock", CheckStatus::Pass, "No ledger yet");
        }
        match LedgerLock::acquire(&dir) {
            Ok(_lock) => check("ledger_lock", CheckStatus::Pass, "Ledger is not in use"),
            Err(LedgerError::Locked { .. }) => {
                let holder = read_lock_info(&dir.join(LOCK_FILE))
                    .map_or_else(|| "another process".to_string(), |info| format!("pid {}", info.pid));
                check(
                    "ledger_lock",
                    CheckStatus::Warn,
                    format!("Ledger is locked by {holder}; a campaign is running"),
                )
            }
            Err(e) => check("ledger_lock", CheckStatus::Fail, e.to_string()),
        }
    }

    fn check_cpu_affinity(&self) -> DoctorCheck {
        let Some(cpus) = &self.config.campaign.cpu_affinity else {
            return check("cpu_affinity", CheckStatus::Pass, "Solver is not pinned");
        };
        let config = SupervisorConfig {
            cpu_affinity: Some(cpus.clone()),
            ..SupervisorConfig::default()
        };
        match Supervisor::new(config) {
            Ok(_) => check(
                "cpu_affinity",
                CheckStatus::Pass,
                format!("Solver pinned to CPUs {cpus:?}"),
            ),
            Err(e) => check("cpu_affinity", CheckStatus::Fail, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circbench_engine::{ProblemInstance, write_data_file};
    use std::path::Path;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> Config {
        Config::builder()
            .base_dir(dir)
            .program("sh")
            .project_dir("model")
            .ledger_dir("ledger")
            .build()
            .unwrap()
    }

    fn find<'a>(output: &'a DoctorOutput, name: &str) -> &'a DoctorCheck {
        output.checks.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_checks_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        let output = DoctorCommand::new(config_in(dir.path())).run(false);
        assert_eq!(output.schema_version, "1");
        let names: Vec<&str> = output.checks.iter().map(|c| c.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_missing_project_dir_fails() {
        let dir = TempDir::new().unwrap();
        let output = DoctorCommand::new(config_in(dir.path())).run(false);
        assert_eq!(find(&output, "project_dir").status, CheckStatus::Fail);
        assert!(!output.ok);
    }

    #[test]
    fn test_healthy_environment() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("model")).unwrap();
        let config = config_in(dir.path());
        let instance =
            ProblemInstance::new("n2_k1", vec![0.0, 4.0], vec![0.0, 3.0], 5.0, 1.5, 1, 11).unwrap();
        write_data_file(&config.data_file_path(), &instance).unwrap();

        let output = DoctorCommand::new(config).run(true);
        for c in &output.checks {
            assert_eq!(c.status, CheckStatus::Pass, "{}: {}", c.name, c.details);
        }
        assert!(output.ok);
        assert!(find(&output, "data_file").details.contains("n2_k1"));
    }

    #[test]
    fn test_missing_data_file_warns() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("model")).unwrap();
        let doctor = DoctorCommand::new(config_in(dir.path()));
        let output = doctor.run(false);
        assert_eq!(find(&output, "data_file").status, CheckStatus::Warn);
        assert!(output.ok);
        assert!(!doctor.run(true).ok);
    }

    #[test]
    fn test_unknown_solver_fails() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(dir.path());
        config.solver.program = "circbench-no-such-solver".to_string();
        let output = DoctorCommand::new(config).run(false);
        assert_eq!(find(&output, "solver_path").status, CheckStatus::Fail);

        let mut config = config_in(dir.path());
        config.solver.program = "bin/oplrun".to_string();
        let output = DoctorCommand::new(config).run(false);
        let solver = find(&output, "solver_path");
        assert_eq!(solver.status, CheckStatus::Fail);
        assert!(solver.details.contains("bin/oplrun"));
    }

    #[test]
    fn test_held_lock_warns() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(config.ledger_dir()).unwrap();
        let _held = LedgerLock::acquire(&config.ledger_dir()).unwrap();

        let output = DoctorCommand::new(config).run(false);
        let lock = find(&output, "ledger_lock");
        assert_eq!(lock.status, CheckStatus::Warn);
        assert!(lock.details.contains(&format!("pid {}", std::process::id())));
    }
}
