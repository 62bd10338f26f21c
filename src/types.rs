// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cascade Dynamics Simulation Suite ("Cascade") - Type Definitions

use serde::{Deserialize, Serialize};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Construction-time validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("thresholds must be strictly ascending: warning {warning} < critical {critical} < tipping {tipping}")]
    ThresholdsNotAscending {
        warning: f64,
        critical: f64,
        tipping: f64,
    },
    #[error("parameter range '{name}' has low {low} > high {high}")]
    InvertedRange { name: String, low: f64, high: f64 },
    #[error("feedback loop '{name}' has non-positive saturation threshold {threshold}")]
    NonPositiveSaturation { name: String, threshold: f64 },
    #[error("compartment model requires at least one compartment")]
    EmptyCompartments,
}

/// Runtime simulation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// An integration step produced a non-finite value. Propagates to the
    /// caller in a direct run; ensemble runs catch it per member.
    #[error("non-finite energy {value} at step {step}")]
    NumericalDivergence { step: u64, value: f64 },
}

// ─── Polarity ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

// ─── Phase ───────────────────────────────────────────────────────────────────

/// Ordered classification along the stable → tipping spectrum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Stable = 1,
    Stressed = 2,
    Critical = 3,
    Tipping = 4,
}

impl Phase {
    /// 1-based index, for consumers that want numeric phase labels.
    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Stressed => "stressed",
            Self::Critical => "critical",
            Self::Tipping => "tipping",
        }
    }
}

// ─── Thresholds ──────────────────────────────────────────────────────────────

/// Ascending energy cutoffs separating the four phases.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub warning: f64,
    pub critical: f64,
    pub tipping: f64,
}

impl Thresholds {
    /// Invariant: `warning < critical < tipping`, enforced here and nowhere else.
    pub fn new(warning: f64, critical: f64, tipping: f64) -> Result<Self, ConfigError> {
        if !(warning < critical && critical < tipping) {
            return Err(ConfigError::ThresholdsNotAscending {
                warning,
                critical,
                tipping,
            });
        }
        Ok(Self {
            warning,
            critical,
            tipping,
        })
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning: 100.0,
            critical: 200.0,
            tipping: 300.0,
        }
    }
}

// ─── SystemState ─────────────────────────────────────────────────────────────

/// Aggregate state of a single-pool system. `retention` and `dissipation`
/// are derived each step from the configured laws, never set directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SystemState {
    pub energy: f64,
    pub retention: f64,
    pub dissipation: f64,
    /// Shock absorption remaining, in [0, 1]. One-way: never refills.
    pub buffer_capacity: f64,
}

impl SystemState {
    pub fn new(energy: f64) -> Self {
        Self {
            energy,
            retention: 1.0,
            dissipation: 1.0,
            buffer_capacity: 1.0,
        }
    }

    /// Retention over dissipation. Above 1 the system is accumulating
    /// energy; zero dissipation is defined as +infinity, not an error.
    pub fn stability(&self) -> f64 {
        if self.dissipation > 0.0 {
            self.retention / self.dissipation
        } else {
            f64::INFINITY
        }
    }

    /// Normalized headroom to the tipping threshold (negative once crossed).
    pub fn distance_to_tipping(&self, tipping: f64) -> f64 {
        (tipping - self.energy) / tipping
    }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// One timestep's diagnostic record from the discrete integrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestep: u64,
    pub energy: f64,
    pub stability: f64,
    pub buffer_capacity: f64,
    pub distance_to_tipping: f64,
    pub phase: Phase,
}

// ─── CompartmentId ───────────────────────────────────────────────────────────

/// Index into the fixed, ordered compartment array of a continuous model.
/// Compartments are enumerated once at construction; iteration order is the
/// configuration order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CompartmentId(pub usize);

// ─── ExternalEvent ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventKind {
    /// Poisson-arrival external impact.
    Impact = 0,
    /// Near-periodic scheduled perturbation.
    Scheduled = 1,
    /// Stochastic release drawn inside the extended continuous integrator.
    InternalRelease = 2,
    /// Poisson-arrival internal stress discharge.
    Seismic = 3,
}

/// A discrete, time-stamped perturbation. Generated fresh per run and
/// consumed read-only by the integrators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalEvent {
    /// Model time of the hit (same unit as the integration grid).
    pub timestamp: f64,
    /// Signed energy delta.
    pub delta: f64,
    pub kind: EventKind,
    /// Target pool; `None` means system-wide.
    pub compartment: Option<CompartmentId>,
}

// ─── ParameterRange ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Distribution {
    Uniform,
    Normal,
}

/// An uncertain parameter for Monte Carlo sampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterRange {
    pub name: String,
    pub mean: f64,
    pub low: f64,
    pub high: f64,
    pub distribution: Distribution,
}

impl ParameterRange {
    pub fn uniform(name: &str, low: f64, high: f64) -> Self {
        Self {
            name: name.to_string(),
            mean: (low + high) / 2.0,
            low,
            high,
            distribution: Distribution::Uniform,
        }
    }

    pub fn normal(name: &str, mean: f64, low: f64, high: f64) -> Self {
        Self {
            name: name.to_string(),
            mean,
            low,
            high,
            distribution: Distribution::Normal,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.low > self.high {
            return Err(ConfigError::InvertedRange {
                name: self.name.clone(),
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

// ─── TrajectoryPoint ─────────────────────────────────────────────────────────

/// One grid point of a continuous-model trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub t: f64,
    /// Per-compartment energies in configuration order.
    pub compartments: Vec<f64>,
    pub total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_ascending_enforced() {
        assert!(Thresholds::new(100.0, 200.0, 300.0).is_ok());
        assert!(Thresholds::new(200.0, 100.0, 300.0).is_err());
        assert!(Thresholds::new(100.0, 100.0, 300.0).is_err());
        assert!(Thresholds::new(100.0, 200.0, 200.0).is_err());
    }

    #[test]
    fn test_stability_zero_dissipation_is_infinite() {
        let mut state = SystemState::new(0.0);
        state.retention = 1.05;
        state.dissipation = 0.0;
        assert!(state.stability().is_infinite());
    }

    #[test]
    fn test_distance_to_tipping() {
        let state = SystemState::new(150.0);
        let d = state.distance_to_tipping(300.0);
        assert!((d - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let range = ParameterRange::uniform("x", 5.0, 1.0);
        assert!(range.validate().is_err());
    }

    #[test]
    fn test_phase_ordering() {
        assert!(Phase::Stable < Phase::Stressed);
        assert!(Phase::Critical < Phase::Tipping);
        assert_eq!(Phase::Tipping.index(), 4);
    }
}
