use chrono::{DateTime, Utc};
use circbench_utils::{LedgerKey, OutcomeKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const RESULTS_FILE: &str = "results_table.csv";
pub const INSTANCES_FILE: &str = "instances_table.csv";

/// Column order of `results_table.csv`. Field order of [`LedgerRecord`] must
/// match.
pub const RESULTS_HEADER: [&str; 8] = [
    "instance_id",
    "variant",
    "repetition",
    "outcome",
    "elapsed_secs",
    "num_circles",
    "artifact",
    "recorded_at",
];

/// Column order of `instances_table.csv`. Field order of [`InstanceRecord`]
/// must match.
pub const INSTANCES_HEADER: [&str; 10] = [
    "instance_id",
    "n",
    "radius",
    "min_dist_circles",
    "min_coverage",
    "min_x",
    "min_y",
    "max_x",
    "max_y",
    "seed",
];

/// One completed execution request as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub instance_id: String,
    pub variant: String,
    pub repetition: u32,
    pub outcome: OutcomeKind,
    /// Wall-clock seconds, millisecond resolution.
    pub elapsed_secs: f64,
    /// Selected circles; empty unless a solution was parsed.
    pub num_circles: Option<u32>,
    /// Solution dump directory relative to the solutions root, or empty.
    pub artifact: String,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerRecord {
    #[must_use]
    pub fn new(
        key: LedgerKey,
        outcome: OutcomeKind,
        elapsed: Duration,
        num_circles: Option<u32>,
    ) -> Self {
        Self {
            instance_id: key.instance_id,
            variant: key.variant,
            repetition: key.repetition,
            outcome,
            elapsed_secs: round_millis(elapsed),
            num_circles,
            artifact: String::new(),
            recorded_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = artifact.into();
        self
    }

    #[must_use]
    pub fn key(&self) -> LedgerKey {
        LedgerKey::new(&self.instance_id, &self.variant, self.repetition)
    }
}

fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

/// Parameters of one generated instance, enough to regenerate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub instance_id: String,
    pub n: usize,
    pub radius: f64,
    pub min_dist_circles: f64,
    pub min_coverage: u32,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub seed: u64,
}
