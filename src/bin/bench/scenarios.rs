// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cascade Dynamics Simulation Suite ("Cascade") - Benchmark Scenarios
//
// Zero engine changes: all scenario logic lives in preset builders and
// member functions driven by sampled parameters.

use cascade_engine::events::{ArrivalProcess, EventChannel, EventGenerator, ReleaseConfig};
use cascade_engine::{
    CascadeConfig, CascadeSystem, CompartmentModel, CompartmentSpec, DissipationLaw, EventKind,
    ExtendedDynamics, FeedbackLoop, ForcingFn, ParameterRange, Polarity, RetentionLaw, SimError,
    SinkDissipation, Thresholds,
};
use rand_chacha::ChaCha8Rng;

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub ranges: fn() -> Vec<ParameterRange>,
    /// One Monte Carlo member: sampled params in range order, plus the
    /// member's own rng stream. Returns the terminal total energy.
    pub member: fn(usize, &[f64], &mut ChaCha8Rng) -> Result<f64, SimError>,
    pub thresholds: Thresholds,
}

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "CLIMATE_RUNAWAY",
            label: "Climate runaway (discrete)",
            category: "discrete",
            ranges: climate_ranges,
            member: climate_member,
            thresholds: Thresholds::default(),
        },
        Scenario {
            name: "FINANCE_SPIRAL",
            label: "Finance deleveraging spiral (discrete)",
            category: "discrete",
            ranges: finance_ranges,
            member: finance_member,
            thresholds: Thresholds::default(),
        },
        Scenario {
            name: "CONVERGENCE_BASELINE",
            label: "Four-pool convergence, quiet (continuous)",
            category: "continuous",
            ranges: convergence_ranges,
            member: convergence_baseline_member,
            thresholds: Thresholds::default(),
        },
        Scenario {
            name: "CONVERGENCE_EXTENDED",
            label: "Four-pool convergence with events (continuous)",
            category: "continuous",
            ranges: convergence_ranges,
            member: convergence_extended_member,
            thresholds: Thresholds::default(),
        },
    ]
}

// ─── Climate Preset ─────────────────────────────────────────────────────────

fn climate_feedbacks() -> Result<Vec<FeedbackLoop>, SimError> {
    Ok(vec![
        FeedbackLoop::new("water_vapor", Polarity::Positive, 0.4, Some(5.0))?,
        FeedbackLoop::new("ice_albedo", Polarity::Positive, 0.3, Some(3.0))?,
        FeedbackLoop::new("radiative_cooling", Polarity::Negative, 0.5, None)?,
        FeedbackLoop::new("carbon_sinks", Polarity::Negative, 0.3, Some(4.0))?,
    ])
}

fn climate_ranges() -> Vec<ParameterRange> {
    vec![
        ParameterRange::uniform("forcing", 0.5, 2.0),
        ParameterRange::normal("retention_base", 1.05, 0.9, 1.2),
    ]
}

fn climate_member(_index: usize, params: &[f64], _rng: &mut ChaCha8Rng) -> Result<f64, SimError> {
    let forcing = params[0];
    let config = CascadeConfig {
        name: "climate".to_string(),
        feedbacks: climate_feedbacks()?,
        retention: RetentionLaw::new(params[1], 0.001),
        ..CascadeConfig::default()
    };
    let mut system = CascadeSystem::new(config)?;
    let snapshots = system.simulate(500, |_| forcing)?;
    Ok(snapshots.last().map(|s| s.energy).unwrap_or(0.0))
}

// ─── Finance Preset ─────────────────────────────────────────────────────────

fn finance_feedbacks() -> Result<Vec<FeedbackLoop>, SimError> {
    Ok(vec![
        FeedbackLoop::new("leverage_unwind", Polarity::Positive, 0.5, Some(10.0))?,
        FeedbackLoop::new("panic_selling", Polarity::Positive, 0.6, Some(8.0))?,
        FeedbackLoop::new("central_intervention", Polarity::Negative, 0.4, Some(15.0))?,
        FeedbackLoop::new("liquidity_provision", Polarity::Negative, 0.3, Some(12.0))?,
    ])
}

fn finance_ranges() -> Vec<ParameterRange> {
    vec![
        ParameterRange::uniform("shock", 2.0, 8.0),
        ParameterRange::uniform("ambient", 0.1, 1.0),
    ]
}

fn finance_member(_index: usize, params: &[f64], _rng: &mut ChaCha8Rng) -> Result<f64, SimError> {
    let shock = params[0];
    let ambient = params[1];
    let config = CascadeConfig {
        name: "finance".to_string(),
        feedbacks: finance_feedbacks()?,
        ..CascadeConfig::default()
    };
    let mut system = CascadeSystem::new(config)?;
    // Ten-step initial shock, ambient stress afterwards.
    let snapshots = system.simulate(500, |step| if step < 10 { shock } else { ambient })?;
    Ok(snapshots.last().map(|s| s.energy).unwrap_or(0.0))
}

// ─── Convergence Preset ─────────────────────────────────────────────────────

fn convergence_pools(solar_base: f64) -> Vec<CompartmentSpec> {
    vec![
        CompartmentSpec {
            name: "solar".to_string(),
            initial_energy: 180.0,
            retention: RetentionLaw::new(0.0, 0.0),
            dissipation: DissipationLaw::new(0.05, 0.0),
            input: ForcingFn::Periodic {
                base: solar_base,
                amplitude: 0.3,
                period: 11.0,
            },
        },
        CompartmentSpec {
            name: "magnetic".to_string(),
            initial_energy: 92.5,
            retention: RetentionLaw::new(0.0, 0.0),
            dissipation: DissipationLaw::new(0.02, 0.0),
            input: ForcingFn::LinearTrend {
                base: 2.0,
                slope: -0.01,
            },
        },
        CompartmentSpec {
            name: "atmospheric".to_string(),
            initial_energy: 118.0,
            retention: RetentionLaw::new(0.0, 0.0),
            dissipation: DissipationLaw::new(0.08, 0.0),
            input: ForcingFn::LinearTrend {
                base: 3.0,
                slope: 0.02,
            },
        },
        CompartmentSpec {
            name: "oceanic".to_string(),
            initial_energy: 110.0,
            retention: RetentionLaw::new(0.0, 0.0),
            dissipation: DissipationLaw::new(0.01, 0.0),
            input: ForcingFn::Constant { rate: 1.5 },
        },
    ]
}

fn convergence_ranges() -> Vec<ParameterRange> {
    vec![ParameterRange::normal("solar_base", 5.0, 3.5, 6.5)]
}

fn convergence_grid() -> Vec<f64> {
    // 50 years, monthly resolution.
    (0..=600).map(|i| i as f64 / 12.0).collect()
}

fn convergence_baseline_member(
    _index: usize,
    params: &[f64],
    rng: &mut ChaCha8Rng,
) -> Result<f64, SimError> {
    let model = CompartmentModel::new(convergence_pools(params[0]), Thresholds::default())?;
    let (trajectory, _) = model.integrate(&convergence_grid(), false, rng)?;
    Ok(trajectory.last().map(|p| p.total).unwrap_or(0.0))
}

fn convergence_extended_member(
    _index: usize,
    params: &[f64],
    rng: &mut ChaCha8Rng,
) -> Result<f64, SimError> {
    let extended = ExtendedDynamics {
        sink: SinkDissipation::new(0.005, 2000.0),
        release: ReleaseConfig {
            probability: 0.02,
            magnitude: (1.0, 6.0),
        },
        events: EventGenerator::new(vec![
            EventChannel {
                kind: EventKind::Impact,
                arrivals: ArrivalProcess::Poisson { rate_per_year: 0.3 },
                magnitude: (5.0, 20.0),
                compartment: None,
            },
            EventChannel {
                kind: EventKind::Scheduled,
                arrivals: ArrivalProcess::NearPeriodic {
                    per_year: 2.0,
                    jitter: 0.1,
                },
                magnitude: (1.0, 3.0),
                compartment: None,
            },
            EventChannel {
                kind: EventKind::Seismic,
                arrivals: ArrivalProcess::Poisson { rate_per_year: 1.0 },
                magnitude: (2.0, 8.0),
                compartment: None,
            },
        ]),
    };
    let model = CompartmentModel::new(convergence_pools(params[0]), Thresholds::default())?
        .with_extended(extended);
    let (trajectory, _) = model.integrate(&convergence_grid(), true, rng)?;
    Ok(trajectory.last().map(|p| p.total).unwrap_or(0.0))
}
