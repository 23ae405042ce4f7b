//! Per-request solution dumps.

use anyhow::{Context, Result};
use circbench_utils::atomic_write::write_file_atomic;
use circbench_utils::types::file_safe;
use circbench_utils::{ExecutionRequest, OutcomeKind};
use serde_json::json;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use crate::instance::ProblemInstance;
use crate::parser::StructuredSolution;

/// Everything known about a solved request.
#[derive(Debug, Clone, Copy)]
pub struct SolutionArtifact<'a> {
    pub request: &'a ExecutionRequest,
    pub instance: &'a ProblemInstance,
    pub solution: &'a StructuredSolution,
    pub outcome: OutcomeKind,
    pub elapsed: Duration,
}

/// Receives solved requests before they are recorded.
///
/// The returned string is stored in the ledger `artifact` column. Errors are
/// logged by the caller and never fail the request.
pub trait ArtifactSink {
    fn persist(&mut self, artifact: &SolutionArtifact<'_>) -> Result<String>;
}

impl<S: ArtifactSink + ?Sized> ArtifactSink for Box<S> {
    fn persist(&mut self, artifact: &SolutionArtifact<'_>) -> Result<String> {
        (**self).persist(artifact)
    }
}

/// Sink that keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArtifacts;

impl ArtifactSink for NoArtifacts {
    fn persist(&mut self, _artifact: &SolutionArtifact<'_>) -> Result<String> {
        Ok(String::new())
    }
}

/// Writes `solution.json` and `solution.txt` under
/// `<root>/<instance>/<variant>_r<repetition>/`.
#[derive(Debug, Clone)]
pub struct SolutionDumper {
    root: PathBuf,
}

impl SolutionDumper {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory of one request, relative to the root, `/`-separated.
    #[must_use]
    pub fn relative_dir(request: &ExecutionRequest) -> String {
        format!(
            "{}/{}_r{}",
            file_safe(&request.instance_id),
            file_safe(&request.variant),
            request.repetition
        )
    }
}

fn json_dump(artifact: &SolutionArtifact<'_>) -> serde_json::Value {
    let SolutionArtifact {
        request,
        instance,
        solution,
        outcome,
        elapsed,
    } = *artifact;
    json!({
        "instance_id": request.instance_id,
        "variant": request.variant,
        "repetition": request.repetition,
        "outcome": outcome,
        "execution_time": elapsed.as_secs_f64(),
        "num_circles": solution.num_circles,
        "circles": solution.circles,
        "points": solution.points,
        "coverage_per_point": solution.coverage_per_point,
        "radius": solution.radius.unwrap_or(instance.radius),
        "min_coverage": solution.min_coverage.unwrap_or(instance.min_coverage),
        "min_dist_circles": solution.min_dist_circles.unwrap_or(instance.min_dist),
        "num_points": solution.num_points.unwrap_or(instance.n()),
        "instance": {
            "n": instance.n(),
            "seed": instance.seed,
            "bbox": instance.bbox,
        },
    })
}

fn text_summary(artifact: &SolutionArtifact<'_>) -> String {
    let SolutionArtifact {
        request,
        instance,
        solution,
        outcome,
        elapsed,
    } = *artifact;
    let mut out = String::new();
    let _ = writeln!(out, "=== SOLUTION ===");
    let _ = writeln!(out, "Instance: {}", request.instance_id);
    let _ = writeln!(
        out,
        "Variant: {} (repetition {})",
        request.variant, request.repetition
    );
    let _ = writeln!(out, "Outcome: {outcome}");
    let _ = writeln!(out, "Points: {}", instance.n());
    let _ = writeln!(out, "Circles: {}", solution.num_circles);
    let _ = writeln!(out, "Radius: {}", instance.radius);
    let _ = writeln!(out, "Min coverage: {}", instance.min_coverage);
    let _ = writeln!(out, "Min circle distance: {}", instance.min_dist);
    let _ = writeln!(out, "Elapsed: {:.2} s", elapsed.as_secs_f64());

    let _ = writeln!(out, "\n=== POINTS ===");
    let points: Vec<(f64, f64)> = if solution.points.is_empty() {
        instance.points().collect()
    } else {
        solution.points.clone()
    };
    for (i, (x, y)) in points.iter().enumerate() {
        match solution.coverage_per_point.get(i) {
            Some(c) => {
                let _ = writeln!(out, "Point {}: ({x}, {y}) - coverage {c}", i + 1);
            }
            None => {
                let _ = writeln!(out, "Point {}: ({x}, {y})", i + 1);
            }
        }
    }

    let _ = writeln!(out, "\n=== CIRCLES ===");
    for (i, (x, y)) in solution.circles.iter().enumerate() {
        let _ = writeln!(out, "Circle {}: center ({x}, {y})", i + 1);
    }
    out
}

impl ArtifactSink for SolutionDumper {
    fn persist(&mut self, artifact: &SolutionArtifact<'_>) -> Result<String> {
        let relative = Self::relative_dir(artifact.request);
        let dir = self.root.join(&relative);

        let json = serde_json::to_string_pretty(&json_dump(artifact))
            .context("Failed to serialize solution dump")?;
        write_file_atomic(&dir.join("solution.json"), &json)
            .with_context(|| format!("Failed to write solution dump in {}", dir.display()))?;
        write_file_atomic(&dir.join("solution.txt"), &text_summary(artifact))
            .with_context(|| format!("Failed to write solution summary in {}", dir.display()))?;

        Ok(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (ExecutionRequest, ProblemInstance, StructuredSolution) {
        let request = ExecutionRequest::new("n2_k1", "Teste 3", 2);
        let instance =
            ProblemInstance::new("n2_k1", vec![0.0, 4.0], vec![0.0, 3.0], 5.0, 1.5, 1, 11)
                .unwrap();
        let solution = StructuredSolution {
            num_circles: 1,
            circles: vec![(2.0, 1.5)],
            points: vec![],
            coverage_per_point: vec![1, 1],
            radius: None,
            min_coverage: None,
            min_dist_circles: None,
            num_points: None,
        };
        (request, instance, solution)
    }

    #[test]
    fn test_dumper_writes_json_and_text() {
        let dir = TempDir::new().unwrap();
        let (request, instance, solution) = fixture();
        let artifact = SolutionArtifact {
            request: &request,
            instance: &instance,
            solution: &solution,
            outcome: OutcomeKind::Success,
            elapsed: Duration::from_millis(1250),
        };

        let mut dumper = SolutionDumper::new(dir.path());
        let relative = dumper.persist(&artifact).unwrap();
        assert_eq!(relative, "n2_k1/Teste_3_r2");

        let json: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(&relative).join("solution.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(json["num_circles"], 1);
        assert_eq!(json["radius"], 5.0);
        assert_eq!(json["outcome"], "SUCCESS");
        assert_eq!(json["num_points"], 2);

        let text =
            std::fs::read_to_string(dir.path().join(&relative).join("solution.txt")).unwrap();
        assert!(text.contains("Point 2: (4, 3) - coverage 1"));
        assert!(text.contains("Circle 1: center (2, 1.5)"));
    }

    #[test]
    fn test_no_artifacts_records_nothing() {
        let (request, instance, solution) = fixture();
        let artifact = SolutionArtifact {
            request: &request,
            instance: &instance,
            solution: &solution,
            outcome: OutcomeKind::NotOptimalWithinBudget,
            elapsed: Duration::ZERO,
        };
        assert_eq!(NoArtifacts.persist(&artifact).unwrap(), "");
    }
}
