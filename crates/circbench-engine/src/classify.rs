use circbench_runner::TerminalState;
use circbench_utils::OutcomeKind;
use std::time::Duration;

use crate::parser::StructuredSolution;

/// Map what the supervisor saw and what the parser found to an outcome.
///
/// A parsed solution only counts when the process completed on its own; a
/// timed-out solver is `Timeout` regardless of what it printed. The campaign
/// driver never records `Interrupted` requests, which classify as
/// `ProcessError` here.
#[must_use]
pub fn classify(
    state: &TerminalState,
    solution: Option<&StructuredSolution>,
    elapsed: Duration,
    optimal_budget: Duration,
) -> OutcomeKind {
    match state {
        TerminalState::Completed { .. } => match solution {
            Some(_) if elapsed <= optimal_budget => OutcomeKind::Success,
            Some(_) => OutcomeKind::NotOptimalWithinBudget,
            None => OutcomeKind::ParseFailure,
        },
        TerminalState::TimedOut => OutcomeKind::Timeout,
        TerminalState::SpawnFailed { .. }
        | TerminalState::Errored { .. }
        | TerminalState::Interrupted => OutcomeKind::ProcessError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution() -> StructuredSolution {
        StructuredSolution {
            num_circles: 1,
            circles: vec![(0.0, 0.0)],
            points: vec![],
            coverage_per_point: vec![],
            radius: None,
            min_coverage: None,
            min_dist_circles: None,
            num_points: None,
        }
    }

    const BUDGET: Duration = Duration::from_secs(3600);

    #[test]
    fn test_completed_with_solution() {
        let done = TerminalState::Completed { exit_code: Some(0) };
        let s = solution();
        assert_eq!(
            classify(&done, Some(&s), Duration::from_secs(10), BUDGET),
            OutcomeKind::Success
        );
        assert_eq!(classify(&done, Some(&s), BUDGET, BUDGET), OutcomeKind::Success);
        assert_eq!(
            classify(&done, Some(&s), BUDGET + Duration::from_millis(1), BUDGET),
            OutcomeKind::NotOptimalWithinBudget
        );
    }

    #[test]
    fn test_completed_without_solution_is_parse_failure() {
        for exit_code in [Some(0), Some(1), None] {
            assert_eq!(
                classify(
                    &TerminalState::Completed { exit_code },
                    None,
                    Duration::from_secs(1),
                    BUDGET
                ),
                OutcomeKind::ParseFailure
            );
        }
    }

    #[test]
    fn test_timeout_wins_over_output() {
        let s = solution();
        assert_eq!(
            classify(&TerminalState::TimedOut, Some(&s), Duration::from_secs(1), BUDGET),
            OutcomeKind::Timeout
        );
    }

    #[test]
    fn test_process_failures() {
        for state in [
            TerminalState::SpawnFailed {
                reason: "missing".to_string(),
            },
            TerminalState::Errored {
                reason: "unreaped".to_string(),
            },
        ] {
            assert_eq!(
                classify(&state, None, Duration::ZERO, BUDGET),
                OutcomeKind::ProcessError
            );
        }
    }
}
