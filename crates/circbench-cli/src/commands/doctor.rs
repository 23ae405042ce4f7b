//! `circbench doctor`

use anyhow::{Context, Result};
use circbench_config::Config;
use circbench_doctor::{CheckStatus, DoctorCommand};

/// Run the checks; `Ok(false)` when the environment is not healthy.
pub fn execute_doctor_command(json: bool, strict: bool, config: &Config) -> Result<bool> {
    let output = DoctorCommand::new(config.clone()).run(strict);

    if json {
        let out = serde_json::to_string_pretty(&output).context("Failed to emit doctor JSON")?;
        println!("{out}");
        return Ok(output.ok);
    }

    for check in &output.checks {
        let mark = match check.status {
            CheckStatus::Pass => "✓",
            CheckStatus::Warn => "!",
            CheckStatus::Fail => "✗",
        };
        println!("{mark} {:<16} {}", check.name, check.details);
    }

    if !output.ok {
        println!();
        if strict {
            println!("Some checks failed or warned (strict mode). Please address the issues above.");
        } else {
            println!("Some checks failed. Please address the issues above before running a campaign.");
        }
    }
    Ok(output.ok)
}
