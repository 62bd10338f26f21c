// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cascade Dynamics Simulation Suite ("Cascade") - Monte Carlo Ensemble

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, Distribution, ParameterRange, SimError};

// ─── Parameter sampling ──────────────────────────────────────────────────────

/// Draw one value from an uncertain parameter. Normal draws use a Box-Muller
/// transform with sigma of a quarter range; the range sets sigma (read as
/// roughly ±2σ) and does not truncate the distribution, so tail draws land
/// outside [low, high].
pub fn sample(range: &ParameterRange, rng: &mut ChaCha8Rng) -> f64 {
    match range.distribution {
        Distribution::Uniform => {
            if range.high > range.low {
                rng.gen_range(range.low..range.high)
            } else {
                range.low
            }
        }
        Distribution::Normal => {
            let sigma = (range.high - range.low) / 4.0;
            let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
            let u2: f64 = rng.gen();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            range.mean + sigma * z
        }
    }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// Summary statistics over the successful members' terminal values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnsembleStats {
    pub mean: f64,
    pub median: f64,
    pub p5: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

impl EnsembleStats {
    /// `sorted` must be ascending and non-empty.
    fn from_sorted(sorted: &[f64]) -> Self {
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
        Self {
            mean,
            median: percentile(sorted, 50.0),
            p5: percentile(sorted, 5.0),
            p95: percentile(sorted, 95.0),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }
}

/// Outcome of a Monte Carlo ensemble. Aggregates are computed from the
/// sorted terminals, so they are independent of member completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleResult {
    /// Terminal values of the successful members, ascending.
    pub terminals: Vec<f64>,
    /// Indices of members that diverged. Failures never abort the ensemble.
    pub failed: Vec<usize>,
    pub stats: Option<EnsembleStats>,
    /// For each requested threshold, the fraction of successful members
    /// whose terminal value strictly exceeded it.
    pub exceedance: Vec<(f64, f64)>,
}

/// Linear-interpolation percentile over ascending samples, q in [0, 100].
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let fraction = position - lower as f64;
        sorted[lower] * (1.0 - fraction) + sorted[upper] * fraction
    }
}

// ─── Driver ──────────────────────────────────────────────────────────────────

/// Run an n-member Monte Carlo ensemble in parallel.
///
/// Member i seeds its own `ChaCha8Rng` with `seed + i`, samples one value per
/// parameter range in order, and then hands the rng on to the member closure
/// for any in-run stochasticity. Results are therefore bit-reproducible for a
/// given seed regardless of thread scheduling.
pub fn run_ensemble<F>(
    ranges: &[ParameterRange],
    n_samples: usize,
    seed: u64,
    exceedance_thresholds: &[f64],
    member: F,
) -> Result<EnsembleResult, ConfigError>
where
    F: Fn(usize, &[f64], &mut ChaCha8Rng) -> Result<f64, SimError> + Sync,
{
    for range in ranges {
        range.validate()?;
    }

    let outcomes: Vec<Result<f64, SimError>> = (0..n_samples)
        .into_par_iter()
        .map(|index| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(index as u64));
            let params: Vec<f64> = ranges.iter().map(|range| sample(range, &mut rng)).collect();
            member(index, &params, &mut rng)
        })
        .collect();

    let mut terminals = Vec::with_capacity(n_samples);
    let mut failed = Vec::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(value) => terminals.push(value),
            Err(_) => failed.push(index),
        }
    }
    terminals.sort_by(|a, b| a.total_cmp(b));

    let stats = if terminals.is_empty() {
        None
    } else {
        Some(EnsembleStats::from_sorted(&terminals))
    };
    let exceedance = exceedance_thresholds
        .iter()
        .map(|&threshold| {
            let fraction = if terminals.is_empty() {
                0.0
            } else {
                let hits = terminals.iter().filter(|&&v| v > threshold).count();
                hits as f64 / terminals.len() as f64
            };
            (threshold, fraction)
        })
        .collect();

    Ok(EnsembleResult {
        terminals,
        failed,
        stats,
        exceedance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SimError;

    fn unit_ranges() -> Vec<ParameterRange> {
        vec![
            ParameterRange::uniform("a", 0.0, 1.0),
            ParameterRange::normal("b", 0.5, 0.0, 1.0),
        ]
    }

    #[test]
    fn test_same_seed_reproduces_bitwise() {
        let run = || {
            run_ensemble(&unit_ranges(), 64, 42, &[0.5], |_, params, rng| {
                Ok(params[0] + params[1] + rng.gen::<f64>() * 0.01)
            })
            .unwrap()
        };
        let first = run();
        let second = run();
        assert_eq!(first.terminals.len(), second.terminals.len());
        for (a, b) in first.terminals.iter().zip(second.terminals.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_percentiles_ordered() {
        let result = run_ensemble(&unit_ranges(), 200, 7, &[], |_, params, _| Ok(params[0]))
            .unwrap();
        let stats = result.stats.unwrap();
        assert!(stats.min <= stats.p5);
        assert!(stats.p5 <= stats.median);
        assert!(stats.median <= stats.p95);
        assert!(stats.p95 <= stats.max);
    }

    #[test]
    fn test_failed_members_are_isolated() {
        let result = run_ensemble(&unit_ranges(), 10, 1, &[], |index, params, _| {
            if index == 3 {
                Err(SimError::NumericalDivergence {
                    step: 0,
                    value: f64::NAN,
                })
            } else {
                Ok(params[0])
            }
        })
        .unwrap();
        assert_eq!(result.failed, vec![3]);
        assert_eq!(result.terminals.len(), 9);
        assert!(result.stats.is_some());
    }

    #[test]
    fn test_normal_samples_keep_their_tails() {
        // Asymmetric range: sigma = (4.0 − 2.5)/4 = 0.375. A true normal
        // around 3.0 puts roughly 9.5% of its mass outside [2.5, 4.0]; that
        // tail must survive sampling, not pile up on the bounds.
        let range = ParameterRange::normal("sensitivity", 3.0, 2.5, 4.0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let n = 20000;
        let mut outside = 0usize;
        let mut at_bounds = 0usize;
        let mut sum = 0.0;
        for _ in 0..n {
            let value = sample(&range, &mut rng);
            sum += value;
            if value < 2.5 || value > 4.0 {
                outside += 1;
            }
            if value == 2.5 || value == 4.0 {
                at_bounds += 1;
            }
        }
        let outside_fraction = outside as f64 / n as f64;
        assert!(
            (0.05..0.15).contains(&outside_fraction),
            "tail mass {} far from the expected ~0.095",
            outside_fraction
        );
        assert_eq!(at_bounds, 0, "draws collapsed onto the range bounds");
        assert!((sum / n as f64 - 3.0).abs() < 0.02);
    }

    #[test]
    fn test_exceedance_fraction() {
        let result = run_ensemble(&[], 10, 0, &[5.0], |index, _, _| Ok(index as f64)).unwrap();
        let (threshold, fraction) = result.exceedance[0];
        assert_eq!(threshold, 5.0);
        // Terminals 0..=9; strictly above 5 are 6, 7, 8, 9.
        assert!((fraction - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let bad = ParameterRange::uniform("bad", 2.0, 1.0);
        let result = run_ensemble(&[bad], 4, 0, &[], |_, _, _| Ok(0.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [0.0, 10.0];
        assert!((percentile(&sorted, 50.0) - 5.0).abs() < 1e-12);
        assert_eq!(percentile(&sorted, 0.0), 0.0);
        assert_eq!(percentile(&sorted, 100.0), 10.0);
    }
}
