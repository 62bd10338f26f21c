// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cascade Dynamics Simulation Suite ("Cascade") - Retention & Dissipation Laws

use serde::{Deserialize, Serialize};

// ─── RetentionLaw ────────────────────────────────────────────────────────────

/// How well a system holds incoming energy, as a function of current energy.
///
/// Retention collapses exponentially with energy squared: high-energy states
/// are harder to maintain. The base sits slightly above 1, so a near-empty
/// system mildly accumulates on its own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetentionLaw {
    pub base: f64,
    pub collapse_rate: f64,
}

impl RetentionLaw {
    pub fn new(base: f64, collapse_rate: f64) -> Self {
        Self {
            base,
            collapse_rate,
        }
    }

    pub fn at(&self, energy: f64) -> f64 {
        self.base * (-self.collapse_rate * energy * energy).exp()
    }
}

impl Default for RetentionLaw {
    fn default() -> Self {
        Self {
            base: 1.05,
            collapse_rate: 0.001,
        }
    }
}

// ─── DissipationLaw ──────────────────────────────────────────────────────────

/// Rate at which energy leaves a system: a linear term plus a superlinear
/// E^1.5 term that dominates at high energy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DissipationLaw {
    pub linear: f64,
    pub nonlinear: f64,
}

impl DissipationLaw {
    pub fn new(linear: f64, nonlinear: f64) -> Self {
        Self { linear, nonlinear }
    }

    /// The superlinear term uses |E|^1.5 with the sign of E, so transiently
    /// negative energies dissipate toward zero instead of producing NaN.
    pub fn at(&self, energy: f64) -> f64 {
        let superlinear = energy.signum() * energy.abs().powf(1.5);
        self.linear * energy + self.nonlinear * superlinear
    }
}

impl Default for DissipationLaw {
    fn default() -> Self {
        Self {
            linear: 0.05,
            nonlinear: 0.001,
        }
    }
}

// ─── SinkDissipation ─────────────────────────────────────────────────────────

/// Saturating bulk loss channel for the extended continuous model: an
/// unresolved sink whose effectiveness degrades as total energy approaches
/// the ceiling, floored at 10%.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SinkDissipation {
    pub baseline_rate: f64,
    pub saturation_ceiling: f64,
}

impl SinkDissipation {
    pub fn new(baseline_rate: f64, saturation_ceiling: f64) -> Self {
        Self {
            baseline_rate,
            saturation_ceiling,
        }
    }

    pub fn effectiveness(&self, total_energy: f64) -> f64 {
        (1.0 - total_energy / self.saturation_ceiling).max(0.1)
    }

    /// Loss rate for the whole system at the given total energy.
    pub fn loss(&self, total_energy: f64) -> f64 {
        self.baseline_rate * total_energy * self.effectiveness(total_energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_base_at_zero_energy() {
        let law = RetentionLaw::default();
        assert!((law.at(0.0) - 1.05).abs() < f64::EPSILON);
    }

    #[test]
    fn test_retention_collapses_with_energy() {
        let law = RetentionLaw::default();
        let low = law.at(10.0);
        let high = law.at(100.0);
        assert!(low < 1.05);
        assert!(high < low);
        // exp(−0.001·10000) = exp(−10)
        assert!((high - 1.05 * (-10.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_dissipation_superlinear_growth() {
        let law = DissipationLaw::default();
        let at_100 = law.at(100.0);
        // 0.05·100 + 0.001·1000 = 6.0
        assert!((at_100 - 6.0).abs() < 1e-12);
        // Doubling energy more than doubles dissipation.
        assert!(law.at(200.0) > 2.0 * at_100);
    }

    #[test]
    fn test_dissipation_negative_energy_is_finite() {
        let law = DissipationLaw::default();
        let d = law.at(-50.0);
        assert!(d.is_finite());
        assert!(d < 0.0);
    }

    #[test]
    fn test_sink_effectiveness_floor() {
        let sink = SinkDissipation::new(0.02, 500.0);
        assert!((sink.effectiveness(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((sink.effectiveness(250.0) - 0.5).abs() < 1e-12);
        // Far past the ceiling the floor holds.
        assert!((sink.effectiveness(5000.0) - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sink_loss_scales_with_total() {
        let sink = SinkDissipation::new(0.02, 500.0);
        assert!((sink.loss(100.0) - 0.02 * 100.0 * 0.8).abs() < 1e-12);
    }
}
