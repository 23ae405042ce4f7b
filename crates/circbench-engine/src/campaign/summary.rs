use circbench_ledger::LedgerRecord;
use circbench_utils::OutcomeKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use strum::IntoEnumIterator;

/// What one `run` did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CampaignSummary {
    /// Requests executed and recorded during this run, per outcome.
    pub outcomes: BTreeMap<OutcomeKind, usize>,
    /// Requests already in the ledger when the run reached them.
    pub skipped: usize,
    /// Instances that could not be generated and were passed over.
    pub generation_failures: usize,
    pub instances_visited: usize,
    pub interrupted: bool,
}

impl CampaignSummary {
    pub fn record(&mut self, outcome: OutcomeKind) {
        *self.outcomes.entry(outcome).or_default() += 1;
    }

    #[must_use]
    pub fn executed(&self) -> usize {
        self.outcomes.values().sum()
    }

    #[must_use]
    pub fn count(&self, outcome: OutcomeKind) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }
}

impl fmt::Display for CampaignSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Campaign {}: {} executed, {} already recorded, {} instances visited",
            if self.interrupted {
                "interrupted"
            } else {
                "finished"
            },
            self.executed(),
            self.skipped,
            self.instances_visited
        )?;
        for outcome in OutcomeKind::iter() {
            writeln!(f, "  {:<14} {}", outcome.as_str(), self.count(outcome))?;
        }
        if self.generation_failures > 0 {
            writeln!(f, "  generation failures: {}", self.generation_failures)?;
        }
        Ok(())
    }
}

/// Per-variant view of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariantStatus {
    pub outcomes: BTreeMap<OutcomeKind, usize>,
    pub total: usize,
    /// Mean over solved runs.
    pub mean_elapsed_secs: Option<f64>,
    /// Mean circle count over solved runs that reported one.
    pub mean_circles: Option<f64>,
}

/// Ledger progress report shown by `circbench status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerStatus {
    pub variants: BTreeMap<String, VariantStatus>,
    pub total_records: usize,
    pub instances: usize,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

impl LedgerStatus {
    #[must_use]
    pub fn from_records(records: &[LedgerRecord], instances: usize) -> Self {
        let mut grouped: BTreeMap<&str, Vec<&LedgerRecord>> = BTreeMap::new();
        for record in records {
            grouped.entry(&record.variant).or_default().push(record);
        }

        let variants = grouped
            .into_iter()
            .map(|(variant, rows)| {
                let mut outcomes = BTreeMap::new();
                for row in &rows {
                    *outcomes.entry(row.outcome).or_default() += 1;
                }
                let solved: Vec<&&LedgerRecord> =
                    rows.iter().filter(|r| r.outcome.is_solved()).collect();
                let elapsed: Vec<f64> = solved.iter().map(|r| r.elapsed_secs).collect();
                let circles: Vec<f64> = solved
                    .iter()
                    .filter_map(|r| r.num_circles.map(f64::from))
                    .collect();
                let status = VariantStatus {
                    outcomes,
                    total: rows.len(),
                    mean_elapsed_secs: mean(&elapsed),
                    mean_circles: mean(&circles),
                };
                (variant.to_string(), status)
            })
            .collect();

        Self {
            variants,
            total_records: records.len(),
            instances,
        }
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} results over {} registered instances",
            self.total_records, self.instances
        )?;
        if self.variants.is_empty() {
            return Ok(());
        }

        write!(f, "{:<12} {:>6}", "variant", "total")?;
        for outcome in OutcomeKind::iter() {
            write!(f, " {:>13}", outcome.as_str())?;
        }
        writeln!(f, " {:>10} {:>8}", "mean_secs", "circles")?;

        for (variant, status) in &self.variants {
            write!(f, "{variant:<12} {:>6}", status.total)?;
            for outcome in OutcomeKind::iter() {
                write!(
                    f,
                    " {:>13}",
                    status.outcomes.get(&outcome).copied().unwrap_or(0)
                )?;
            }
            let fmt_mean = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
            writeln!(
                f,
                " {:>10} {:>8}",
                fmt_mean(status.mean_elapsed_secs),
                fmt_mean(status.mean_circles)
            )?;
        }
        Ok(())
    }
}
