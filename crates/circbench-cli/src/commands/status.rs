//! `circbench status`

use anyhow::{Context, Result};
use circbench_config::Config;
use circbench_engine::LedgerStatus;
use circbench_ledger::{LOCK_FILE, read_instances, read_lock_info, read_results};

/// Summarize the ledger without taking the writer lock.
pub fn status_of(config: &Config) -> Result<LedgerStatus> {
    let dir = config.ledger_dir();
    let records = read_results(&dir)
        .with_context(|| format!("Failed to read results in {}", dir.display()))?;
    let instances = read_instances(&dir)
        .with_context(|| format!("Failed to read instances in {}", dir.display()))?;
    Ok(LedgerStatus::from_records(&records, instances.len()))
}

pub fn execute_status_command(json: bool, config: &Config) -> Result<()> {
    let status = status_of(config)?;

    if json {
        let out = serde_json::to_string_pretty(&status).context("Failed to emit status JSON")?;
        println!("{out}");
        return Ok(());
    }

    print!("{status}");
    if let Some(holder) = read_lock_info(&config.ledger_dir().join(LOCK_FILE)) {
        println!(
            "Last writer: pid {} (since {})",
            holder.pid, holder.acquired_at
        );
    }
    Ok(())
}
