// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cascade Dynamics Simulation Suite ("Cascade") - Continuous-Time Integrator

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::events::{EventGenerator, ReleaseConfig};
use crate::laws::{DissipationLaw, RetentionLaw, SinkDissipation};
use crate::types::{
    CompartmentId, ConfigError, EventKind, ExternalEvent, SimError, Thresholds, TrajectoryPoint,
};

/// RK4 substeps per grid interval. Eight substeps keep the reference
/// scenarios well inside the 1e-6 relative solver tolerance.
const DEFAULT_SUBSTEPS: u32 = 8;

// ─── ForcingFn ───────────────────────────────────────────────────────────────

/// Deterministic external input rate, pure in t: identical t always yields
/// identical forcing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ForcingFn {
    Constant { rate: f64 },
    /// `base · (1 + amplitude · cos(2πt / period))`
    Periodic { base: f64, amplitude: f64, period: f64 },
    /// `base · (1 + slope · t)`
    LinearTrend { base: f64, slope: f64 },
}

impl ForcingFn {
    pub fn at(&self, t: f64) -> f64 {
        match *self {
            Self::Constant { rate } => rate,
            Self::Periodic {
                base,
                amplitude,
                period,
            } => base * (1.0 + amplitude * (2.0 * std::f64::consts::PI * t / period).cos()),
            Self::LinearTrend { base, slope } => base * (1.0 + slope * t),
        }
    }
}

// ─── CompartmentSpec ─────────────────────────────────────────────────────────

/// One energy pool of a coupled continuous model, with its own laws and
/// input forcing. Position in the configuration list is its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompartmentSpec {
    pub name: String,
    pub initial_energy: f64,
    pub retention: RetentionLaw,
    pub dissipation: DissipationLaw,
    pub input: ForcingFn,
}

// ─── ExtendedDynamics ────────────────────────────────────────────────────────

/// Optional extended dynamics: saturating bulk sink, stochastic internal
/// releases, and discrete external point events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedDynamics {
    pub sink: SinkDissipation,
    pub release: ReleaseConfig,
    pub events: EventGenerator,
}

// ─── CompartmentModel ────────────────────────────────────────────────────────

/// Continuous-time multi-compartment integrator. Per-compartment dynamics:
/// `dE/dt = input(t) + retention(E)·E − dissipation(E)`, with the extended
/// sink distributed across compartments by energy share.
#[derive(Debug, Clone)]
pub struct CompartmentModel {
    compartments: Vec<CompartmentSpec>,
    thresholds: Thresholds,
    extended: Option<ExtendedDynamics>,
    substeps: u32,
}

impl CompartmentModel {
    pub fn new(
        compartments: Vec<CompartmentSpec>,
        thresholds: Thresholds,
    ) -> Result<Self, ConfigError> {
        if compartments.is_empty() {
            return Err(ConfigError::EmptyCompartments);
        }
        Ok(Self {
            compartments,
            thresholds,
            extended: None,
            substeps: DEFAULT_SUBSTEPS,
        })
    }

    pub fn with_extended(mut self, extended: ExtendedDynamics) -> Self {
        self.extended = Some(extended);
        self
    }

    /// Override the per-interval substep count (testing and accuracy tuning).
    pub fn with_substeps(mut self, substeps: u32) -> Self {
        self.substeps = substeps.max(1);
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn compartments(&self) -> &[CompartmentSpec] {
        &self.compartments
    }

    /// Resolve a compartment name to its id. Iteration always follows the
    /// configured order; ids are stable for the life of the model.
    pub fn compartment_id(&self, name: &str) -> Option<CompartmentId> {
        self.compartments
            .iter()
            .position(|c| c.name == name)
            .map(CompartmentId)
    }

    /// Integrate over the caller's time grid. Returns the trajectory and the
    /// events generated for this run (point events plus recorded internal
    /// releases). Both are handed to the caller; the model retains nothing.
    pub fn integrate(
        &self,
        time_grid: &[f64],
        include_external_events: bool,
        rng: &mut ChaCha8Rng,
    ) -> Result<(Vec<TrajectoryPoint>, Vec<ExternalEvent>), SimError> {
        let mut trajectory = Vec::with_capacity(time_grid.len());
        if time_grid.is_empty() {
            return Ok((trajectory, Vec::new()));
        }

        // Point events are drawn up front for the whole horizon; internal
        // releases are drawn per step below.
        let point_events: Vec<ExternalEvent> = match (&self.extended, include_external_events) {
            (Some(extended), true) => {
                let horizon = *time_grid.last().unwrap_or(&0.0);
                extended.events.generate(horizon, rng)
            }
            _ => Vec::new(),
        };
        let mut events_out = point_events.clone();

        let mut state: Vec<f64> = self.compartments.iter().map(|c| c.initial_energy).collect();
        trajectory.push(self.point(time_grid[0], &state));

        let mut next_event = 0usize;
        for k in 1..time_grid.len() {
            let t0 = time_grid[k - 1];
            let t1 = time_grid[k];
            let dt = t1 - t0;

            // Stochastic internal release for this step. The recorded
            // magnitude deepens the sink loss for the step rather than
            // offsetting it.
            // TODO: confirm the release sign with the domain owners before
            // anyone calibrates against recorded release events.
            let mut step_release = 0.0;
            if let Some(extended) = &self.extended {
                if let Some(magnitude) = extended.release.draw(rng) {
                    events_out.push(ExternalEvent {
                        timestamp: t1,
                        delta: magnitude,
                        kind: EventKind::InternalRelease,
                        compartment: None,
                    });
                    step_release = magnitude;
                }
            }

            let h = dt / self.substeps as f64;
            for sub in 0..self.substeps {
                let t = t0 + h * sub as f64;
                rk4_step(&mut state, t, h, |t, y| self.derivative(t, y, step_release));
            }

            // Discrete hits: each point event lands once, at the grid point
            // nearest its timestamp (tolerance of half a grid interval).
            if include_external_events {
                let tolerance = dt / 2.0;
                while next_event < point_events.len()
                    && point_events[next_event].timestamp < t1 + tolerance
                {
                    apply_impulse(&mut state, &point_events[next_event]);
                    next_event += 1;
                }
            }

            for &energy in &state {
                if !energy.is_finite() {
                    return Err(SimError::NumericalDivergence {
                        step: k as u64,
                        value: energy,
                    });
                }
            }

            trajectory.push(self.point(t1, &state));
        }

        Ok((trajectory, events_out))
    }

    /// Per-compartment derivatives at (t, state). `step_release` is the
    /// extra sink loss drawn for the current step (zero outside the extended
    /// variant).
    fn derivative(&self, t: f64, state: &[f64], step_release: f64) -> Vec<f64> {
        let total: f64 = state.iter().sum();
        let sink_total = match &self.extended {
            Some(extended) => extended.sink.loss(total) + step_release,
            None => 0.0,
        };

        self.compartments
            .iter()
            .zip(state.iter())
            .map(|(spec, &energy)| {
                let share = if total.abs() > f64::EPSILON {
                    energy / total
                } else {
                    0.0
                };
                spec.input.at(t) + spec.retention.at(energy) * energy
                    - spec.dissipation.at(energy)
                    - sink_total * share
            })
            .collect()
    }

    fn point(&self, t: f64, state: &[f64]) -> TrajectoryPoint {
        TrajectoryPoint {
            t,
            compartments: state.to_vec(),
            total: state.iter().sum(),
        }
    }
}

/// Apply a discrete event hit to its target compartment; untargeted events
/// spread evenly across all compartments.
fn apply_impulse(state: &mut [f64], event: &ExternalEvent) {
    match event.compartment {
        Some(CompartmentId(index)) if index < state.len() => state[index] += event.delta,
        _ => {
            let share = event.delta / state.len() as f64;
            for energy in state.iter_mut() {
                *energy += share;
            }
        }
    }
}

// ─── RK4 ─────────────────────────────────────────────────────────────────────

/// Classic fourth-order Runge–Kutta step, in place.
fn rk4_step<F>(state: &mut Vec<f64>, t: f64, h: f64, f: F)
where
    F: Fn(f64, &[f64]) -> Vec<f64>,
{
    let k1 = f(t, state);
    let mid1: Vec<f64> = state
        .iter()
        .zip(k1.iter())
        .map(|(y, k)| y + 0.5 * h * k)
        .collect();
    let k2 = f(t + 0.5 * h, &mid1);
    let mid2: Vec<f64> = state
        .iter()
        .zip(k2.iter())
        .map(|(y, k)| y + 0.5 * h * k)
        .collect();
    let k3 = f(t + 0.5 * h, &mid2);
    let end: Vec<f64> = state
        .iter()
        .zip(k3.iter())
        .map(|(y, k)| y + h * k)
        .collect();
    let k4 = f(t + h, &end);

    for (((y, k1), (k2, k3)), k4) in state
        .iter_mut()
        .zip(k1.iter())
        .zip(k2.iter().zip(k3.iter()))
        .zip(k4.iter())
    {
        *y += h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4);
    }
}
