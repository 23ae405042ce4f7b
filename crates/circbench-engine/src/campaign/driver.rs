use circbench_config::{CampaignMode, Config};
use circbench_ledger::{AppendOutcome, Ledger, LedgerRecord};
use circbench_runner::{CommandSpec, ShutdownSignal, Supervisor, SupervisorConfig, TerminalState};
use circbench_utils::error::BenchError;
use circbench_utils::logging::{execution_span, log_request_recorded};
use circbench_utils::{ExecutionRequest, OutcomeKind};
use std::ffi::OsString;
use std::path::Path;
use tracing::{Instrument, debug, error, info, warn};

use super::matrix::{InstancePlan, grid_plans, open_plan, requests_for};
use super::summary::CampaignSummary;
use crate::artifacts::{ArtifactSink, SolutionArtifact};
use crate::classify::classify;
use crate::data_file::write_data_file;
use crate::generator::InstanceGenerator;
use crate::instance::ProblemInstance;
use crate::parser::parse_bytes;

/// Which instances a run visits, in order.
#[derive(Debug, Clone)]
pub enum Schedule {
    /// A finite list, e.g. the closed-mode grid.
    Plans(Vec<InstancePlan>),
    /// Positions `1, 2, ...` until interrupted or `max_instances` is reached.
    Open { max_instances: Option<usize> },
}

impl Schedule {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        match config.campaign.mode {
            CampaignMode::Closed => {
                Self::Plans(grid_plans(&config.matrix, config.campaign.seed))
            }
            CampaignMode::Open => Self::Open {
                max_instances: config.campaign.max_instances,
            },
        }
    }

    /// An explicit list of ready-made instances.
    #[must_use]
    pub fn instances(instances: Vec<ProblemInstance>) -> Self {
        Self::Plans(instances.into_iter().map(InstancePlan::Given).collect())
    }

    #[must_use]
    pub fn instance_count(&self) -> Option<usize> {
        match self {
            Self::Plans(plans) => Some(plans.len()),
            Self::Open { max_instances } => *max_instances,
        }
    }

    fn into_plans(self, campaign_seed: u64) -> Box<dyn Iterator<Item = InstancePlan>> {
        match self {
            Self::Plans(plans) => Box::new(plans.into_iter()),
            Self::Open { max_instances } => {
                let plans = (1u64..).map(move |position| open_plan(position, campaign_seed));
                match max_instances {
                    Some(max) => Box::new(plans.take(max)),
                    None => Box::new(plans),
                }
            }
        }
    }
}

const STDERR_LOG_CHARS: usize = 400;

enum RequestResult {
    Recorded {
        spawn_failure: Option<String>,
    },
    Interrupted,
}

/// Substitute `{project_dir}`, `{variant}` and `{data_file}` in one argument.
#[must_use]
pub fn expand_arg(template: &str, project_dir: &Path, variant: &str, data_file: &Path) -> OsString {
    match template {
        "{project_dir}" => project_dir.as_os_str().to_owned(),
        "{data_file}" => data_file.as_os_str().to_owned(),
        "{variant}" => OsString::from(variant),
        _ => OsString::from(
            template
                .replace("{project_dir}", &project_dir.to_string_lossy())
                .replace("{data_file}", &data_file.to_string_lossy())
                .replace("{variant}", variant),
        ),
    }
}

/// Runs the work matrix one request at a time, skipping what the ledger
/// already holds.
pub struct CampaignDriver<S = Box<dyn ArtifactSink + Send>> {
    config: Config,
    generator: InstanceGenerator,
    supervisor: Supervisor,
    ledger: Ledger,
    sink: S,
    shutdown: ShutdownSignal,
    /// Instance whose data file is currently on disk.
    materialized: Option<String>,
}

impl<S: ArtifactSink> CampaignDriver<S> {
    pub fn new(
        config: Config,
        ledger: Ledger,
        sink: S,
        shutdown: ShutdownSignal,
    ) -> Result<Self, BenchError> {
        config.validate()?;
        let generator = InstanceGenerator::new(config.generator.clone())?;
        let supervisor = Supervisor::new(SupervisorConfig {
            grace_period: config.grace_period(),
            reap_timeout: config.reap_timeout(),
            output_cap_bytes: config.limits.output_cap_bytes,
            cpu_affinity: config.campaign.cpu_affinity.clone(),
            debug_dir: config.debug_dir(),
            ..SupervisorConfig::default()
        })?;

        Ok(Self {
            config,
            generator,
            supervisor,
            ledger,
            sink,
            shutdown,
            materialized: None,
        })
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    /// Execute every pending request of `schedule`.
    ///
    /// Returns normally when the schedule is exhausted or shutdown was
    /// requested (`summary.interrupted`). Errors are conditions that stop the
    /// campaign: ledger failures, a solver that keeps failing to start, a
    /// generator that keeps failing.
    pub async fn run(&mut self, schedule: Schedule) -> Result<CampaignSummary, BenchError> {
        let variants = self.config.solver.variants.clone();
        let repetitions = self.config.campaign.repetitions;
        let per_instance = variants.len() * repetitions as usize;
        let total = schedule.instance_count().map(|n| n * per_instance);

        let spawn_limit = self.config.campaign.spawn_failure_limit;
        let generation_limit = self.config.campaign.generation_failure_limit;
        let mut spawn_failures = 0u32;
        let mut generation_failures = 0u32;

        let mut summary = CampaignSummary::default();
        let mut position = 0usize;

        info!(
            mode = %self.config.campaign.mode,
            variants = variants.len(),
            repetitions,
            already_recorded = self.ledger.completed().len(),
            "Starting campaign"
        );

        for plan in schedule.into_plans(self.config.campaign.seed) {
            if self.shutdown.is_triggered() {
                summary.interrupted = true;
                break;
            }

            let pending: Vec<ExecutionRequest> = requests_for(plan.id(), &variants, repetitions)
                .into_iter()
                .filter(|request| !self.ledger.contains(&request.key()))
                .collect();
            let done = per_instance - pending.len();
            summary.skipped += done;
            position += done;
            if pending.is_empty() {
                debug!(instance_id = plan.id(), "Instance already complete");
                continue;
            }

            let instance = match self.prepare_instance(&plan) {
                Ok(instance) => {
                    generation_failures = 0;
                    instance
                }
                Err(BenchError::Generation(e)) => {
                    generation_failures += 1;
                    summary.generation_failures += 1;
                    position += pending.len();
                    error!(instance_id = plan.id(), error = %e, "Skipping instance");
                    if generation_failures >= generation_limit {
                        return Err(BenchError::GeneratorBroken {
                            consecutive_failures: generation_failures,
                            last_reason: e.to_string(),
                        });
                    }
                    continue;
                }
                Err(other) => return Err(other),
            };

            if summary.instances_visited > 0 && self.pause_between_instances().await {
                summary.interrupted = true;
                break;
            }
            summary.instances_visited += 1;
            info!(
                instance_id = %instance.id,
                n = instance.n(),
                radius = instance.radius,
                min_coverage = instance.min_coverage,
                pending = pending.len(),
                "Instance ready"
            );

            for request in &pending {
                if self.shutdown.is_triggered() {
                    summary.interrupted = true;
                    return Ok(summary);
                }
                position += 1;
                if self.ledger.contains(&request.key()) {
                    summary.skipped += 1;
                    continue;
                }

                let span = execution_span(request);
                let result = self
                    .execute_request(&instance, request, position, total, &mut summary)
                    .instrument(span)
                    .await?;

                match result {
                    RequestResult::Interrupted => {
                        summary.interrupted = true;
                        return Ok(summary);
                    }
                    RequestResult::Recorded {
                        spawn_failure: Some(reason),
                    } => {
                        spawn_failures += 1;
                        if spawn_failures >= spawn_limit {
                            return Err(BenchError::SolverUnavailable {
                                program: self.config.solver.program.clone(),
                                consecutive_failures: spawn_failures,
                                last_reason: reason,
                            });
                        }
                    }
                    RequestResult::Recorded {
                        spawn_failure: None,
                    } => spawn_failures = 0,
                }
            }
        }

        Ok(summary)
    }

    /// Build the instance and reconcile it with the registry.
    fn prepare_instance(&mut self, plan: &InstancePlan) -> Result<ProblemInstance, BenchError> {
        let instance = plan.build(&self.generator)?;
        match self.ledger.instance(&instance.id) {
            Some(record) => instance.verify_against(record)?,
            None => {
                self.ledger.register_instance(&instance.to_record())?;
            }
        }
        Ok(instance)
    }

    /// Sleep `instance_pause`; `true` when shutdown cut it short.
    async fn pause_between_instances(&self) -> bool {
        let pause = self.config.instance_pause();
        if pause.is_zero() {
            return false;
        }
        debug!(pause_secs = pause.as_secs_f64(), "Pausing between instances");
        tokio::select! {
            () = tokio::time::sleep(pause) => false,
            () = self.shutdown.triggered() => true,
        }
    }

    fn materialize(&mut self, instance: &ProblemInstance) -> Result<(), BenchError> {
        if self.materialized.as_deref() == Some(instance.id.as_str()) {
            return Ok(());
        }
        let path = self.config.data_file_path();
        write_data_file(&path, instance)?;
        debug!(instance_id = %instance.id, path = %path.display(), "Data file written");
        self.materialized = Some(instance.id.clone());
        Ok(())
    }

    fn command_for(&self, request: &ExecutionRequest) -> CommandSpec {
        let project_dir = self.config.project_dir();
        let data_file = self.config.data_file_path();
        let args: Vec<OsString> = self
            .config
            .solver
            .args
            .iter()
            .map(|template| expand_arg(template, &project_dir, &request.variant, &data_file))
            .collect();

        let mut command = CommandSpec::new(self.config.solver_program())
            .args(args)
            .cwd(project_dir)
            .label(request.label());
        for (key, value) in &self.config.solver.env {
            command = command.env(key, value);
        }
        command
    }

    async fn execute_request(
        &mut self,
        instance: &ProblemInstance,
        request: &ExecutionRequest,
        position: usize,
        total: Option<usize>,
        summary: &mut CampaignSummary,
    ) -> Result<RequestResult, BenchError> {
        self.materialize(instance)?;
        let command = self.command_for(request);
        debug!(command = %command, "Executing solver");

        let report = self
            .supervisor
            .execute(&command, self.config.timeout(), &self.shutdown)
            .await;

        if report.state == TerminalState::Interrupted {
            warn!(
                elapsed_secs = report.elapsed.as_secs_f64(),
                "Request interrupted; it will run again on resume"
            );
            return Ok(RequestResult::Interrupted);
        }

        let solution = if report.state.is_completed() {
            parse_bytes(&report.stdout)
        } else {
            None
        };
        let outcome = classify(
            &report.state,
            solution.as_ref(),
            report.elapsed,
            self.config.optimal_budget(),
        );

        if matches!(outcome, OutcomeKind::ParseFailure | OutcomeKind::ProcessError) {
            let stderr = report.stderr_lossy();
            let tail = stderr
                .char_indices()
                .rev()
                .nth(STDERR_LOG_CHARS - 1)
                .map_or(stderr.as_str(), |(i, _)| &stderr[i..]);
            debug!(
                state = report.state.as_str(),
                stderr_tail = %tail.trim(),
                "Solver produced no solution"
            );
        }

        let artifact = match &solution {
            Some(solution) if outcome.is_solved() => {
                let artifact = SolutionArtifact {
                    request,
                    instance,
                    solution,
                    outcome,
                    elapsed: report.elapsed,
                };
                match self.sink.persist(&artifact) {
                    Ok(path) => path,
                    Err(e) => {
                        warn!(error = %format!("{e:#}"), "Solution dump failed; recording without it");
                        String::new()
                    }
                }
            }
            _ => String::new(),
        };

        let record = LedgerRecord::new(
            request.key(),
            outcome,
            report.elapsed,
            solution.as_ref().map(|s| s.num_circles),
        )
        .with_artifact(artifact);
        if self.ledger.append(&record)? == AppendOutcome::Appended {
            summary.record(outcome);
            log_request_recorded(position, total, outcome, report.elapsed, record.num_circles);
        }

        let spawn_failure = match report.state {
            TerminalState::SpawnFailed { reason } => Some(reason),
            _ => None,
        };
        Ok(RequestResult::Recorded { spawn_failure })
    }
}
