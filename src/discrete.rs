// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cascade Dynamics Simulation Suite ("Cascade") - Discrete-Time Integrator

use serde::{Deserialize, Serialize};

use crate::feedback::{apply_chain, FeedbackLoop};
use crate::laws::{DissipationLaw, RetentionLaw};
use crate::phase;
use crate::types::{ConfigError, Phase, SimError, Snapshot, SystemState, Thresholds};

/// Base buffer depletion per unit time at exactly the warning threshold.
const BUFFER_DEPLETION_RATE: f64 = 0.01;

// ─── CascadeConfig ───────────────────────────────────────────────────────────

/// Configuration for a single-pool discrete-time system. Set once, read-only
/// afterwards. The feedback list is ordered and that order is contractual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    pub name: String,
    pub feedbacks: Vec<FeedbackLoop>,
    pub thresholds: Thresholds,
    pub retention: RetentionLaw,
    pub dissipation: DissipationLaw,
    pub initial_energy: f64,
    pub default_dt: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            feedbacks: Vec::new(),
            thresholds: Thresholds::default(),
            retention: RetentionLaw::default(),
            dissipation: DissipationLaw::default(),
            initial_energy: 0.0,
            default_dt: 0.1,
        }
    }
}

impl CascadeConfig {
    /// Re-validate invariants that struct-literal construction can bypass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Thresholds::new(
            self.thresholds.warning,
            self.thresholds.critical,
            self.thresholds.tipping,
        )?;
        for feedback in &self.feedbacks {
            if let Some(threshold) = feedback.saturation_threshold() {
                if threshold <= 0.0 {
                    return Err(ConfigError::NonPositiveSaturation {
                        name: feedback.name.clone(),
                        threshold,
                    });
                }
            }
        }
        Ok(())
    }
}

// ─── CascadeSystem ───────────────────────────────────────────────────────────

/// Discrete-time energy integrator. The state is mutated exclusively here,
/// one step at a time, strictly sequentially.
#[derive(Debug, Clone)]
pub struct CascadeSystem {
    config: CascadeConfig,
    state: SystemState,
    timestep: u64,
}

impl CascadeSystem {
    pub fn new(config: CascadeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = SystemState::new(config.initial_energy);
        Ok(Self {
            config,
            state,
            timestep: 0,
        })
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    /// Advance one timestep.
    ///
    /// 1. Recompute retention and dissipation from current energy.
    /// 2. Fold the feedback chain over current energy.
    /// 3. `energy += (effect · retention − dissipation) · dt`.
    /// 4. Deplete the buffer while above the warning threshold.
    ///
    /// A non-finite result surfaces as `NumericalDivergence`; nothing is
    /// clamped.
    pub fn step(&mut self, external_forcing: f64, dt: f64) -> Result<Snapshot, SimError> {
        let energy = self.state.energy;
        self.state.retention = self.config.retention.at(energy);
        self.state.dissipation = self.config.dissipation.at(energy);

        let feedback_effect = apply_chain(&self.config.feedbacks, energy, external_forcing);

        let energy_in = feedback_effect * self.state.retention;
        let energy_out = self.state.dissipation;
        self.state.energy += (energy_in - energy_out) * dt;

        if !self.state.energy.is_finite() {
            return Err(SimError::NumericalDivergence {
                step: self.timestep,
                value: self.state.energy,
            });
        }

        // One-way shock absorption: depletes above warning, never refills.
        let warning = self.config.thresholds.warning;
        if self.state.energy > warning {
            let depletion = BUFFER_DEPLETION_RATE * (self.state.energy / warning);
            self.state.buffer_capacity *= 1.0 - depletion * dt;
            self.state.buffer_capacity = self.state.buffer_capacity.clamp(0.0, 1.0);
        }

        let index = self.timestep;
        self.timestep += 1;
        Ok(self.snapshot(index))
    }

    /// Advance one timestep at the configured default dt.
    pub fn step_default(&mut self, external_forcing: f64) -> Result<Snapshot, SimError> {
        let dt = self.config.default_dt;
        self.step(external_forcing, dt)
    }

    /// Run `steps` timesteps, pulling forcing from `forcing_fn(t)`. Returns
    /// the full ordered snapshot sequence; the system keeps nothing beyond
    /// its terminal state.
    pub fn simulate<F>(&mut self, steps: u64, forcing_fn: F) -> Result<Vec<Snapshot>, SimError>
    where
        F: Fn(u64) -> f64,
    {
        let dt = self.config.default_dt;
        let mut history = Vec::with_capacity(steps as usize);
        for t in 0..steps {
            history.push(self.step(forcing_fn(t), dt)?);
        }
        Ok(history)
    }

    /// Current phase, recomputed fresh from energy. No hysteresis.
    pub fn classify(&self) -> Phase {
        phase::classify(self.state.energy, &self.config.thresholds)
    }

    /// Snapshot-shaped view of the current state.
    pub fn diagnose(&self) -> Snapshot {
        self.snapshot(self.timestep)
    }

    fn snapshot(&self, timestep: u64) -> Snapshot {
        Snapshot {
            timestep,
            energy: self.state.energy,
            stability: self.state.stability(),
            buffer_capacity: self.state.buffer_capacity,
            distance_to_tipping: self
                .state
                .distance_to_tipping(self.config.thresholds.tipping),
            phase: self.classify(),
        }
    }
}
