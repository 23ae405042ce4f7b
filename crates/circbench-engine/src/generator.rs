//! Synthetic instance generation.
//!
//! Points are drawn from a clipped 2D normal cluster with a seeded `StdRng`,
//! one `(x, y)` pair at a time, so the first `n` points of a draw of `m > n`
//! points equal a draw of `n` points from the same seed.

use circbench_config::GeneratorConfig;
use circbench_utils::error::GenerationError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

use crate::instance::{BoundingBox, ProblemInstance};

/// How an instance's radius, coverage and minimum distance are chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterPolicy {
    /// Radius from the point spread, coverage and distance drawn at random.
    Derived,
    /// Structured campaigns: everything given.
    Fixed {
        radius: f64,
        min_dist: f64,
        min_coverage: u32,
    },
}

/// Parameters derived for one point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedParameters {
    pub radius: f64,
    pub min_dist: f64,
    pub min_coverage: u32,
}

/// Seed of substream `index` of a campaign seed.
#[must_use]
pub fn derive_seed(campaign_seed: u64, index: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(campaign_seed);
    hasher.write_u64(index);
    hasher.finish()
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    params: GeneratorConfig,
    normal_x: Normal<f64>,
    normal_y: Normal<f64>,
}

impl InstanceGenerator {
    pub fn new(params: GeneratorConfig) -> Result<Self, GenerationError> {
        let invalid = |name: &str, reason: String| GenerationError::InvalidParameter {
            name: name.to_string(),
            reason,
        };

        let std_dev = params.cluster_radius / params.spread_divisor;
        if !(std_dev.is_finite() && std_dev >= 0.0) {
            return Err(invalid(
                "spread_divisor",
                format!(
                    "cluster_radius {} / spread_divisor {} is not a usable spread",
                    params.cluster_radius, params.spread_divisor
                ),
            ));
        }
        let normal = |mean: f64| {
            Normal::new(mean, std_dev)
                .map_err(|e| invalid("cluster_radius", format!("std dev {std_dev}: {e}")))
        };
        let normal_x = normal(params.center_x)?;
        let normal_y = normal(params.center_y)?;

        if !(params.radius_min.is_finite() && params.radius_min > 0.0) {
            return Err(invalid(
                "radius_min",
                format!("{} is not strictly positive", params.radius_min),
            ));
        }
        if params.radius_min > params.radius_max {
            return Err(invalid(
                "radius_max",
                format!("{} is below radius_min", params.radius_max),
            ));
        }
        if !(params.clip.is_finite() && params.clip > 0.0) {
            return Err(invalid("clip", format!("{} is not positive", params.clip)));
        }
        if params.n_min == 0 || params.n_min > params.n_max {
            return Err(invalid(
                "n_min",
                format!("empty size range {}..={}", params.n_min, params.n_max),
            ));
        }
        if params.coverage_min > params.coverage_max {
            return Err(invalid(
                "coverage_min",
                format!(
                    "empty coverage range {}..={}",
                    params.coverage_min, params.coverage_max
                ),
            ));
        }

        Ok(Self {
            params,
            normal_x,
            normal_y,
        })
    }

    #[must_use]
    pub fn params(&self) -> &GeneratorConfig {
        &self.params
    }

    /// Draw `n` clipped, rounded points.
    pub fn sample_points(
        &self,
        n: usize,
        rng: &mut StdRng,
    ) -> Result<(Vec<f64>, Vec<f64>), GenerationError> {
        if n == 0 {
            return Err(GenerationError::InvalidSize { n });
        }
        let clip = self.params.clip;
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        for _ in 0..n {
            let x = self.normal_x.sample(rng).clamp(-clip, clip);
            let y = self.normal_y.sample(rng).clamp(-clip, clip);
            xs.push(round_to(x, self.params.decimals));
            ys.push(round_to(y, self.params.decimals));
        }
        Ok((xs, ys))
    }

    /// Radius from the spread of the points, then coverage and distance.
    pub fn derive_parameters(
        &self,
        bbox: &BoundingBox,
        n: usize,
        rng: &mut StdRng,
    ) -> DerivedParameters {
        let p = &self.params;
        let raw = bbox.diagonal() / (n.max(1) as f64).sqrt() * p.radius_scale;
        let clamped = if raw.is_finite() {
            raw.clamp(p.radius_min, p.radius_max)
        } else {
            p.radius_min
        };
        let rounded = round_to(clamped, 1);
        let radius = if rounded > 0.0 { rounded } else { p.radius_min };

        let min_coverage = rng.gen_range(p.coverage_min..=p.coverage_max);

        let low = p.min_dist_floor;
        let high = p.min_dist_ceiling.min(radius * p.min_dist_radius_fraction);
        let min_dist = if high > low {
            round_to(rng.gen_range(low..=high), 2)
        } else {
            low
        };

        DerivedParameters {
            radius,
            min_dist,
            min_coverage,
        }
    }

    /// Generate an instance of `n` points from `seed`.
    pub fn generate(
        &self,
        id: impl Into<String>,
        n: usize,
        policy: ParameterPolicy,
        seed: u64,
    ) -> Result<ProblemInstance, GenerationError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.generate_with(id.into(), n, policy, seed, &mut rng)
    }

    /// Open-ended instance: the size is drawn from the configured range
    /// before the points, all from `seed`.
    pub fn generate_random(
        &self,
        id: impl Into<String>,
        seed: u64,
    ) -> Result<ProblemInstance, GenerationError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = rng.gen_range(self.params.n_min..=self.params.n_max);
        self.generate_with(id.into(), n, ParameterPolicy::Derived, seed, &mut rng)
    }

    fn generate_with(
        &self,
        id: String,
        n: usize,
        policy: ParameterPolicy,
        seed: u64,
        rng: &mut StdRng,
    ) -> Result<ProblemInstance, GenerationError> {
        let (xs, ys) = self.sample_points(n, rng)?;
        let bbox = BoundingBox::of(&xs, &ys).ok_or(GenerationError::InvalidSize { n })?;
        let DerivedParameters {
            radius,
            min_dist,
            min_coverage,
        } = match policy {
            ParameterPolicy::Derived => self.derive_parameters(&bbox, n, rng),
            ParameterPolicy::Fixed {
                radius,
                min_dist,
                min_coverage,
            } => DerivedParameters {
                radius,
                min_dist,
                min_coverage,
            },
        };
        ProblemInstance::new(id, xs, ys, radius, min_dist, min_coverage, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn generator() -> InstanceGenerator {
        InstanceGenerator::new(GeneratorConfig::default()).unwrap()
    }

    #[test]
    fn test_same_seed_same_instance() {
        let g = generator();
        let a = g.generate_random("inst_000001", 99).unwrap();
        let b = g.generate_random("inst_000001", 99).unwrap();
        assert_eq!(a, b);
        assert!((10..=200).contains(&a.n()));
    }

    #[test]
    fn test_prefix_property() {
        let g = generator();
        let policy = ParameterPolicy::Fixed {
            radius: 30.0,
            min_dist: 1.5,
            min_coverage: 2,
        };
        let big = g.generate("n256_k2", 256, policy, 7).unwrap();
        let small = g.generate("n8_k2", 8, policy, 7).unwrap();
        assert_eq!(&big.xs[..8], &small.xs[..]);
        assert_eq!(&big.ys[..8], &small.ys[..]);
        assert_eq!(small.radius, 30.0);
        assert_eq!(small.min_coverage, 2);
    }

    #[test]
    fn test_coincident_points_fall_back_to_radius_min() {
        let params = GeneratorConfig {
            cluster_radius: 0.0,
            ..GeneratorConfig::default()
        };
        let g = InstanceGenerator::new(params).unwrap();
        let instance = g.generate("flat", 5, ParameterPolicy::Derived, 1).unwrap();
        assert_eq!(instance.bbox.diagonal(), 0.0);
        assert_eq!(instance.radius, 10.0);
        assert_eq!(instance.min_dist, 1.0);
    }

    #[test]
    fn test_zero_points_rejected() {
        assert!(matches!(
            generator().generate("empty", 0, ParameterPolicy::Derived, 1),
            Err(GenerationError::InvalidSize { n: 0 })
        ));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let params = GeneratorConfig {
            radius_min: 0.0,
            ..GeneratorConfig::default()
        };
        assert!(InstanceGenerator::new(params).is_err());

        let params = GeneratorConfig {
            spread_divisor: 0.0,
            ..GeneratorConfig::default()
        };
        assert!(InstanceGenerator::new(params).is_err());
    }

    #[test]
    fn test_derive_seed_is_stable_and_distinct() {
        assert_eq!(derive_seed(42, 1), derive_seed(42, 1));
        assert_ne!(derive_seed(42, 1), derive_seed(42, 2));
        assert_ne!(derive_seed(42, 1), derive_seed(43, 1));
    }

    proptest! {
        #[test]
        fn prop_generated_instances_are_well_formed(seed in any::<u64>()) {
            let g = generator();
            let instance = g.generate_random("p", seed).unwrap();
            let p = g.params();

            prop_assert_eq!(instance.xs.len(), instance.n());
            prop_assert_eq!(BoundingBox::of(&instance.xs, &instance.ys), Some(instance.bbox));
            prop_assert!(instance.radius > 0.0);
            prop_assert!(instance.radius >= p.radius_min && instance.radius <= p.radius_max);
            prop_assert!((p.coverage_min..=p.coverage_max).contains(&instance.min_coverage));
            prop_assert!(instance.min_dist >= p.min_dist_floor);
            prop_assert!(instance.min_dist <= p.min_dist_ceiling.max(p.min_dist_floor));
            for (x, y) in instance.points() {
                prop_assert!(x.abs() <= p.clip && y.abs() <= p.clip);
            }
        }

        #[test]
        fn prop_single_point_radius_is_positive(seed in any::<u64>()) {
            let instance = generator()
                .generate("single", 1, ParameterPolicy::Derived, seed)
                .unwrap();
            prop_assert_eq!(instance.radius, 10.0);
        }
    }
}
