//! `circbench run`

use circbench_config::Config;
use circbench_engine::{CampaignSummary, run_campaign};
use circbench_runner::ShutdownSignal;
use circbench_utils::error::BenchError;
use tracing::info;

/// Run the configured campaign until it is exhausted or interrupted.
///
/// Ctrl-C and SIGTERM stop the running solver; the summary of what was
/// recorded is still printed and the command fails with
/// [`BenchError::Interrupted`]. The interrupted request is not recorded.
pub async fn execute_run_command(config: Config) -> Result<(), BenchError> {
    let shutdown = ShutdownSignal::new();
    shutdown.install_signal_handlers();

    info!(
        ledger_dir = %config.ledger_dir().display(),
        project_dir = %config.project_dir().display(),
        "Campaign configured"
    );
    let summary = run_campaign(config, shutdown).await?;
    print!("{summary}");
    finish(&summary)
}

fn finish(summary: &CampaignSummary) -> Result<(), BenchError> {
    if summary.interrupted {
        Err(BenchError::Interrupted)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circbench_utils::UserFriendlyError;
    use circbench_utils::exit_codes::ExitCode;

    #[test]
    fn test_interrupted_campaign_fails_with_resume_hint() {
        let summary = CampaignSummary {
            interrupted: true,
            ..CampaignSummary::default()
        };
        let err = finish(&summary).unwrap_err();
        assert_eq!(err.to_exit_code(), ExitCode::INTERRUPTED);
        assert!(err.suggestions().iter().any(|s| s.contains("resume")));
    }

    #[test]
    fn test_finished_campaign_succeeds() {
        assert!(finish(&CampaignSummary::default()).is_ok());
    }
}
