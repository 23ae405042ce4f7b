//! Campaign orchestration: the work matrix, the sequential driver and its
//! summaries.

mod driver;
mod matrix;
mod summary;

pub use driver::{CampaignDriver, Schedule, expand_arg};
pub use matrix::{
    InstancePlan, grid_instance_id, grid_plans, open_instance_id, open_plan, requests_for,
};
pub use summary::{CampaignSummary, LedgerStatus, VariantStatus};

use circbench_config::Config;
use circbench_ledger::Ledger;
use circbench_runner::ShutdownSignal;
use circbench_utils::error::BenchError;

use crate::artifacts::{ArtifactSink, NoArtifacts, SolutionDumper};

/// The sink the configuration asks for.
#[must_use]
pub fn sink_for(config: &Config) -> Box<dyn ArtifactSink + Send> {
    if config.output.write_solutions {
        Box::new(SolutionDumper::new(config.solutions_dir()))
    } else {
        Box::new(NoArtifacts)
    }
}

/// Open the configured ledger and run the configured schedule to completion
/// or interruption.
pub async fn run_campaign(
    config: Config,
    shutdown: ShutdownSignal,
) -> Result<CampaignSummary, BenchError> {
    let ledger = Ledger::open(&config.ledger_dir())?;
    let schedule = Schedule::from_config(&config);
    let sink = sink_for(&config);
    let mut driver = CampaignDriver::new(config, ledger, sink, shutdown)?;
    driver.run(schedule).await
}
