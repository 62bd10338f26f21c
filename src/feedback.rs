// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cascade Dynamics Simulation Suite ("Cascade") - Feedback Evaluator

use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, Polarity};

/// Fraction of nominal strength a saturated feedback can never drop below.
/// Saturation weakens a feedback under extreme input; it never removes it.
const SATURATION_FLOOR: f64 = 0.1;

// ─── FeedbackLoop ────────────────────────────────────────────────────────────

/// A single feedback mechanism: amplifying (positive) or damping (negative)
/// with an optional saturation threshold. Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackLoop {
    pub name: String,
    pub polarity: Polarity,
    /// Nominal strength, expected in [0, 1] but not hard-enforced.
    pub strength: f64,
    saturation_threshold: Option<f64>,
}

impl FeedbackLoop {
    pub fn new(
        name: &str,
        polarity: Polarity,
        strength: f64,
        saturation_threshold: Option<f64>,
    ) -> Result<Self, ConfigError> {
        if let Some(threshold) = saturation_threshold {
            if threshold <= 0.0 {
                return Err(ConfigError::NonPositiveSaturation {
                    name: name.to_string(),
                    threshold,
                });
            }
        }
        Ok(Self {
            name: name.to_string(),
            polarity,
            strength,
            saturation_threshold,
        })
    }

    pub fn saturation_threshold(&self) -> Option<f64> {
        self.saturation_threshold
    }

    /// Strength actually exerted at the given input magnitude. Beyond the
    /// saturation threshold the strength tapers linearly, floored at
    /// 10% of nominal.
    pub fn effective_strength(&self, value: f64) -> f64 {
        match self.saturation_threshold {
            Some(threshold) if value.abs() > threshold => {
                let tapered = self.strength * (1.0 - value.abs() / (threshold * 2.0));
                tapered.max(SATURATION_FLOOR * self.strength)
            }
            _ => self.strength,
        }
    }

    /// Apply this feedback to a value: amplify or damp, then add forcing.
    pub fn apply(&self, value: f64, external_forcing: f64) -> f64 {
        let effective = self.effective_strength(value);
        match self.polarity {
            Polarity::Positive => value * (1.0 + effective) + external_forcing,
            Polarity::Negative => value * (1.0 - effective) + external_forcing,
        }
    }
}

// ─── Sequential composition ──────────────────────────────────────────────────

/// Fold the configured loops over a starting value, each consuming the
/// previous loop's output. Configuration order is a semantic contract:
/// the composition is non-commutative and must run exactly as configured.
/// The same forcing term re-enters at every stage; with zero loops the
/// value passes through untouched and the forcing never enters.
pub fn apply_chain(loops: &[FeedbackLoop], start: f64, external_forcing: f64) -> f64 {
    loops
        .iter()
        .fold(start, |value, loop_| loop_.apply(value, external_forcing))
}
