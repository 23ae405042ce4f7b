use circbench_config::MatrixConfig;
use circbench_utils::ExecutionRequest;
use circbench_utils::error::GenerationError;

use crate::generator::{InstanceGenerator, ParameterPolicy, derive_seed};
use crate::instance::ProblemInstance;

/// How to (re)build one instance of the schedule.
#[derive(Debug, Clone, PartialEq)]
pub enum InstancePlan {
    /// Grid cell: `n` points with fixed parameters.
    Sized {
        id: String,
        n: usize,
        policy: ParameterPolicy,
        seed: u64,
    },
    /// Size and parameters drawn from the seed.
    Random { id: String, seed: u64 },
    /// Supplied by the caller as-is.
    Given(ProblemInstance),
}

impl InstancePlan {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Sized { id, .. } | Self::Random { id, .. } => id,
            Self::Given(instance) => &instance.id,
        }
    }

    pub fn build(&self, generator: &InstanceGenerator) -> Result<ProblemInstance, GenerationError> {
        match self {
            Self::Sized {
                id,
                n,
                policy,
                seed,
            } => generator.generate(id.clone(), *n, *policy, *seed),
            Self::Random { id, seed } => generator.generate_random(id.clone(), *seed),
            Self::Given(instance) => Ok(instance.clone()),
        }
    }
}

/// Closed-mode grid id.
#[must_use]
pub fn grid_instance_id(n: usize, min_coverage: u32) -> String {
    format!("n{n}_k{min_coverage}")
}

/// Open-mode id of the instance at 1-based `position`.
#[must_use]
pub fn open_instance_id(position: u64) -> String {
    format!("inst_{position:06}")
}

/// Sizes × coverages, sizes outermost. Every cell shares one point draw, so
/// smaller instances are prefixes of larger ones.
#[must_use]
pub fn grid_plans(matrix: &MatrixConfig, campaign_seed: u64) -> Vec<InstancePlan> {
    let seed = derive_seed(campaign_seed, 0);
    matrix
        .sizes
        .iter()
        .flat_map(|&n| {
            matrix.coverages.iter().map(move |&k| InstancePlan::Sized {
                id: grid_instance_id(n, k),
                n,
                policy: ParameterPolicy::Fixed {
                    radius: matrix.radius,
                    min_dist: matrix.min_dist,
                    min_coverage: k,
                },
                seed,
            })
        })
        .collect()
}

/// Open-mode plan at 1-based `position`.
#[must_use]
pub fn open_plan(position: u64, campaign_seed: u64) -> InstancePlan {
    InstancePlan::Random {
        id: open_instance_id(position),
        seed: derive_seed(campaign_seed, position),
    }
}

/// Requests of one instance: repetition-major, then variant order.
#[must_use]
pub fn requests_for(
    instance_id: &str,
    variants: &[String],
    repetitions: u32,
) -> Vec<ExecutionRequest> {
    (1..=repetitions)
        .flat_map(|rep| {
            variants
                .iter()
                .map(move |variant| ExecutionRequest::new(instance_id, variant.as_str(), rep))
        })
        .collect()
}
