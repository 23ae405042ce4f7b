use circbench_ledger::InstanceRecord;
use circbench_utils::error::GenerationError;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounds of an instance's points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Exact min/max of the coordinate lists; `None` when they are empty.
    #[must_use]
    pub fn of(xs: &[f64], ys: &[f64]) -> Option<Self> {
        if xs.is_empty() || ys.is_empty() {
            return None;
        }
        let (min_x, max_x) = min_max(xs);
        let (min_y, max_y) = min_max(ys);
        Some(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// One generated input for the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemInstance {
    pub id: String,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// Circle radius `r`.
    pub radius: f64,
    /// Minimum distance between selected circle centers (`minDistCirculos`).
    pub min_dist: f64,
    /// Every point must be covered at least this many times (`minCoverage`).
    pub min_coverage: u32,
    pub bbox: BoundingBox,
    /// Seed the points and parameters were generated from.
    pub seed: u64,
}

impl ProblemInstance {
    /// Assemble an instance, computing its bounding box.
    pub fn new(
        id: impl Into<String>,
        xs: Vec<f64>,
        ys: Vec<f64>,
        radius: f64,
        min_dist: f64,
        min_coverage: u32,
        seed: u64,
    ) -> Result<Self, GenerationError> {
        if xs.len() != ys.len() {
            return Err(GenerationError::InvalidParameter {
                name: "points".to_string(),
                reason: format!("{} x coordinates but {} y coordinates", xs.len(), ys.len()),
            });
        }
        if xs.iter().chain(&ys).any(|v| !v.is_finite()) {
            return Err(GenerationError::InvalidParameter {
                name: "points".to_string(),
                reason: "coordinates must be finite".to_string(),
            });
        }
        let bbox = BoundingBox::of(&xs, &ys).ok_or(GenerationError::InvalidSize { n: 0 })?;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(GenerationError::InvalidParameter {
                name: "radius".to_string(),
                reason: format!("{radius} is not strictly positive"),
            });
        }
        if !(min_dist.is_finite() && min_dist >= 0.0) {
            return Err(GenerationError::InvalidParameter {
                name: "min_dist".to_string(),
                reason: format!("{min_dist} is negative or not finite"),
            });
        }

        Ok(Self {
            id: id.into(),
            xs,
            ys,
            radius,
            min_dist,
            min_coverage,
            bbox,
            seed,
        })
    }

    #[must_use]
    pub fn n(&self) -> usize {
        self.xs.len()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Registry row for this instance.
    #[must_use]
    pub fn to_record(&self) -> InstanceRecord {
        InstanceRecord {
            instance_id: self.id.clone(),
            n: self.n(),
            radius: self.radius,
            min_dist_circles: self.min_dist,
            min_coverage: self.min_coverage,
            min_x: self.bbox.min_x,
            min_y: self.bbox.min_y,
            max_x: self.bbox.max_x,
            max_y: self.bbox.max_y,
            seed: self.seed,
        }
    }

    /// Check that a regenerated instance is the one the registry recorded.
    pub fn verify_against(&self, record: &InstanceRecord) -> Result<(), GenerationError> {
        let ours = self.to_record();
        if &ours == record {
            return Ok(());
        }
        let reason = if ours.n != record.n {
            format!("n is {} but {} was recorded", ours.n, record.n)
        } else if ours.seed != record.seed {
            format!("seed is {} but {} was recorded", ours.seed, record.seed)
        } else {
            "radius, distances or bounds differ".to_string()
        };
        Err(GenerationError::Mismatch {
            instance_id: self.id.clone(),
            reason,
        })
    }
}
