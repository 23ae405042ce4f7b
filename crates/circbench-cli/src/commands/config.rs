//! `circbench config`

use anyhow::{Context, Result};
use circbench_config::Config;
use serde_json::json;

pub fn execute_config_command(json: bool, config: &Config) -> Result<()> {
    let entries = config.effective_config();

    if json {
        let map: serde_json::Map<String, serde_json::Value> = entries
            .into_iter()
            .map(|(key, (value, source))| (key, json!({ "value": value, "source": source })))
            .collect();
        let out = serde_json::to_string_pretty(&map).context("Failed to emit config JSON")?;
        println!("{out}");
        return Ok(());
    }

    match &config.config_path {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: none (defaults)"),
    }
    let width = entries.keys().map(String::len).max().unwrap_or(0);
    for (key, (value, source)) in &entries {
        println!("  {key:<width$} = {value}  [{source}]");
    }
    Ok(())
}
