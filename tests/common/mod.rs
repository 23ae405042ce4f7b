//! Shared fixtures: a shell-script solver and configurations pointing at it.
//!
//! The stub is run as `sh <script> -p <project_dir> <variant>` so tests never
//! exec a file they just wrote.

#![allow(dead_code)]

use circbench::{Config, MatrixConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prints noise, then a two-circle solution block.
pub const SOLVING_STUB: &str = r#"
echo "OPL model loaded"
echo "<<< solve"
echo "SOLUTION_DATA = {'num_circles': 2, 'circles': [(1.5, 2.0), (7.0, 6.5)], 'coverage_per_point': [2, 2]}"
echo "<<< post process"
"#;

/// Behaviour keyed on the variant (`$3`).
pub const PER_VARIANT_STUB: &str = r#"
case "$3" in
  Solves) echo "SOLUTION_DATA = {'num_circles': 3, 'circles': [(0, 0), (1, 1), (2, 2)]}" ;;
  Garbage) echo "SOLUTION_DATA = {'num_circles': 3, 'circles': [(0, 0)"; exit 0 ;;
  Crashes) echo "segmentation fault" >&2; exit 139 ;;
  Hangs) sleep 30 ;;
esac
"#;

pub fn write_stub(root: &Path, body: &str) -> PathBuf {
    let path = root.join("solver.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    path
}

/// Small closed grid (2 sizes × 2 coverages) over `variants`, run by `sh
/// <script>`.
pub fn stub_config(root: &Path, script: &Path, variants: &[&str]) -> Config {
    std::fs::create_dir_all(root.join("model")).unwrap();
    Config::builder()
        .base_dir(root)
        .program("sh")
        .args([
            script.display().to_string(),
            "-p".to_string(),
            "{project_dir}".to_string(),
            "{variant}".to_string(),
        ])
        .project_dir("model")
        .ledger_dir("tables")
        .solutions_dir("solutions")
        .write_solutions(false)
        .variants(variants.iter().copied())
        .timeout(Duration::from_secs(10))
        .optimal_budget(Duration::from_secs(10))
        .grace_period(Duration::from_millis(200))
        .matrix(MatrixConfig {
            sizes: vec![4, 6],
            coverages: vec![1, 2],
            radius: 20.0,
            min_dist: 1.5,
        })
        .build()
        .unwrap()
}

pub fn results_bytes(config: &Config) -> Vec<u8> {
    std::fs::read(config.ledger_dir().join("results_table.csv")).unwrap_or_default()
}
