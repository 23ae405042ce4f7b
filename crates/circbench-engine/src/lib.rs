//! Benchmark campaign engine for circbench
//!
//! Everything between the configuration and the ledger: instance
//! generation, the solver data file, output parsing, outcome
//! classification, solution dumps, and the campaign driver that ties them
//! to the execution supervisor.

pub mod artifacts;
pub mod campaign;
pub mod classify;
pub mod data_file;
pub mod generator;
pub mod instance;
pub mod parser;

pub use artifacts::{ArtifactSink, NoArtifacts, SolutionArtifact, SolutionDumper};
pub use campaign::{
    CampaignDriver, CampaignSummary, InstancePlan, LedgerStatus, Schedule, run_campaign, sink_for,
};
pub use classify::classify;
pub use data_file::{DataFileContents, parse_data_file, render_data_file, write_data_file};
pub use generator::{InstanceGenerator, ParameterPolicy, derive_seed};
pub use instance::{BoundingBox, ProblemInstance};
pub use parser::{StructuredSolution, parse, parse_bytes};
