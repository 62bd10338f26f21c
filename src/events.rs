// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cascade Dynamics Simulation Suite ("Cascade") - Stochastic Event Generator

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::types::{CompartmentId, EventKind, ExternalEvent};

// ─── Arrival processes ───────────────────────────────────────────────────────

/// How a channel's events arrive over the horizon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ArrivalProcess {
    /// Memoryless arrivals at the given expected rate per year.
    Poisson { rate_per_year: f64 },
    /// Near-even spacing at the given annual rate, each occurrence shifted
    /// by a small uniform jitter (in years).
    NearPeriodic { per_year: f64, jitter: f64 },
}

// ─── EventChannel ────────────────────────────────────────────────────────────

/// One source of discrete perturbations: arrival law, magnitude range and
/// target compartment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventChannel {
    pub kind: EventKind,
    pub arrivals: ArrivalProcess,
    /// Uniform magnitude range (signed: a negative range models drains).
    pub magnitude: (f64, f64),
    pub compartment: Option<CompartmentId>,
}

// ─── EventGenerator ──────────────────────────────────────────────────────────

/// Produces the full event list for one run. Events are owned by the run
/// that generated them and never persist across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventGenerator {
    pub channels: Vec<EventChannel>,
}

impl EventGenerator {
    pub fn new(channels: Vec<EventChannel>) -> Self {
        Self { channels }
    }

    /// Generate every channel's events over `[0, horizon)`, sorted by
    /// timestamp. All randomness comes from the injected rng.
    pub fn generate(&self, horizon: f64, rng: &mut ChaCha8Rng) -> Vec<ExternalEvent> {
        let mut events = Vec::new();
        for channel in &self.channels {
            match channel.arrivals {
                ArrivalProcess::Poisson { rate_per_year } => {
                    poisson_arrivals(channel, rate_per_year, horizon, rng, &mut events);
                }
                ArrivalProcess::NearPeriodic { per_year, jitter } => {
                    periodic_arrivals(channel, per_year, jitter, horizon, rng, &mut events);
                }
            }
        }
        events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        events
    }
}

/// Poisson process via exponential inter-arrival gaps.
fn poisson_arrivals(
    channel: &EventChannel,
    rate_per_year: f64,
    horizon: f64,
    rng: &mut ChaCha8Rng,
    out: &mut Vec<ExternalEvent>,
) {
    if rate_per_year <= 0.0 {
        return;
    }
    let mut t = 0.0;
    loop {
        let u: f64 = rng.gen();
        t += -u.ln() / rate_per_year;
        if t >= horizon {
            break;
        }
        out.push(ExternalEvent {
            timestamp: t,
            delta: sample_magnitude(channel.magnitude, rng),
            kind: channel.kind,
            compartment: channel.compartment,
        });
    }
}

/// Near-even spacing with uniform jitter, clamped inside the horizon.
fn periodic_arrivals(
    channel: &EventChannel,
    per_year: f64,
    jitter: f64,
    horizon: f64,
    rng: &mut ChaCha8Rng,
    out: &mut Vec<ExternalEvent>,
) {
    if per_year <= 0.0 {
        return;
    }
    let interval = 1.0 / per_year;
    let count = (horizon * per_year).floor() as usize;
    for i in 0..count {
        let base = (i as f64 + 0.5) * interval;
        let shift = if jitter > 0.0 {
            rng.gen_range(-jitter..jitter)
        } else {
            0.0
        };
        let t = (base + shift).clamp(0.0, horizon - f64::EPSILON);
        out.push(ExternalEvent {
            timestamp: t,
            delta: sample_magnitude(channel.magnitude, rng),
            kind: channel.kind,
            compartment: channel.compartment,
        });
    }
}

fn sample_magnitude((lo, hi): (f64, f64), rng: &mut ChaCha8Rng) -> f64 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

// ─── ReleaseConfig ───────────────────────────────────────────────────────────

/// Per-step stochastic internal release for the extended continuous model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// Fixed probability of a release on any given grid step.
    pub probability: f64,
    /// Uniform magnitude range of a release.
    pub magnitude: (f64, f64),
}

impl ReleaseConfig {
    /// Draw a release for one step, or `None`.
    pub fn draw(&self, rng: &mut ChaCha8Rng) -> Option<f64> {
        if rng.gen::<f64>() < self.probability {
            Some(sample_magnitude(self.magnitude, rng))
        } else {
            None
        }
    }
}

// ─── Poisson counting sampler ────────────────────────────────────────────────

/// Poisson sample via Knuth's algorithm; normal approximation above λ = 30.
pub fn poisson_count(rng: &mut ChaCha8Rng, lambda: f64) -> u32 {
    if lambda <= 0.0 {
        return 0;
    }
    if lambda < 30.0 {
        let l = (-lambda).exp();
        let mut k: u32 = 0;
        let mut p: f64 = 1.0;
        loop {
            k += 1;
            p *= rng.gen::<f64>();
            if p <= l {
                return k - 1;
            }
        }
    } else {
        let u1: f64 = rng.gen();
        let u2: f64 = rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        let result = lambda + lambda.sqrt() * z;
        result.round().max(0.0) as u32
    }
}
