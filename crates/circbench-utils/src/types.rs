use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Classification of one completed execution request.
///
/// The string forms are persisted in the ledger `outcome` column and must not
/// change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum OutcomeKind {
    /// Solution found within the optimal-time budget.
    #[serde(rename = "SUCCESS")]
    #[strum(serialize = "SUCCESS")]
    Success,
    /// Solution found, but only after the optimal-time budget had elapsed.
    #[serde(rename = "NOT_OPTIMAL")]
    #[strum(serialize = "NOT_OPTIMAL")]
    NotOptimalWithinBudget,
    /// The hard timeout fired and the process tree was terminated.
    #[serde(rename = "TIMEOUT")]
    #[strum(serialize = "TIMEOUT")]
    Timeout,
    /// The process exited but printed no usable solution block.
    #[serde(rename = "PARSE_FAILURE")]
    #[strum(serialize = "PARSE_FAILURE")]
    ParseFailure,
    /// The process could not be spawned or could not be reaped.
    #[serde(rename = "PROCESS_ERROR")]
    #[strum(serialize = "PROCESS_ERROR")]
    ProcessError,
}

impl OutcomeKind {
    /// Whether the run produced a solution (optimal or not).
    #[must_use]
    pub const fn is_solved(self) -> bool {
        matches!(self, Self::Success | Self::NotOptimalWithinBudget)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// One unit of work: run `variant` on `instance_id`, repetition `repetition`.
///
/// Repetitions are 1-based. Requests are enumerated deterministically from the
/// campaign matrix and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub instance_id: String,
    pub variant: String,
    pub repetition: u32,
}

impl ExecutionRequest {
    #[must_use]
    pub fn new(instance_id: impl Into<String>, variant: impl Into<String>, repetition: u32) -> Self {
        Self {
            instance_id: instance_id.into(),
            variant: variant.into(),
            repetition,
        }
    }

    #[must_use]
    pub fn key(&self) -> LedgerKey {
        LedgerKey {
            instance_id: self.instance_id.clone(),
            variant: self.variant.clone(),
            repetition: self.repetition,
        }
    }

    /// File-name-safe label, used for per-request debug artifacts.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}_{}_r{}",
            file_safe(&self.instance_id),
            file_safe(&self.variant),
            self.repetition
        )
    }
}

impl fmt::Display for ExecutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / rep {}",
            self.instance_id, self.variant, self.repetition
        )
    }
}

/// Replace everything but ASCII alphanumerics, `-` and `_` with `_`.
#[must_use]
pub fn file_safe(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Uniqueness key of the result ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey {
    pub instance_id: String,
    pub variant: String,
    pub repetition: u32,
}

impl LedgerKey {
    #[must_use]
    pub fn new(instance_id: impl Into<String>, variant: impl Into<String>, repetition: u32) -> Self {
        Self {
            instance_id: instance_id.into(),
            variant: variant.into(),
            repetition,
        }
    }
}

/// Health check result emitted by `circbench doctor`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorCheck {
    pub name: String,
    pub status: CheckStatus,
    pub details: String,
}

/// Status of a health check
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}
