#[cfg(test)]
mod tests {
    use cascade_engine::ensemble::run_ensemble;
    use cascade_engine::events::ReleaseConfig;
    use cascade_engine::phase::classify;
    use cascade_engine::{
        CascadeConfig, CascadeSystem, CompartmentModel, CompartmentSpec, DissipationLaw,
        EventGenerator, ExtendedDynamics, FeedbackLoop, ForcingFn, ParameterRange, Phase,
        Polarity, RetentionLaw, SinkDissipation, Thresholds,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    // ========== Feedback Saturation ==========

    #[test]
    fn test_saturation_floor_holds_under_extreme_stress() {
        let amplifier =
            FeedbackLoop::new("amplifier", Polarity::Positive, 0.4, Some(5.0)).unwrap();
        // At twenty times the threshold the raw taper would go negative;
        // the loop must keep a tenth of its nominal strength instead.
        let effective = amplifier.effective_strength(100.0);
        assert!((effective - 0.04).abs() < 1e-12);
        assert!(amplifier.effective_strength(-100.0) == effective);
    }

    // ========== Phase Classification ==========

    #[test]
    fn test_classifier_table() {
        let thresholds = Thresholds::default();
        assert_eq!(classify(50.0, &thresholds), Phase::Stable);
        assert_eq!(classify(150.0, &thresholds), Phase::Stressed);
        assert_eq!(classify(250.0, &thresholds), Phase::Critical);
        assert_eq!(classify(350.0, &thresholds), Phase::Tipping);
        // Cutoffs belong to the phase above them.
        assert_eq!(classify(100.0, &thresholds), Phase::Stressed);
        assert_eq!(classify(300.0, &thresholds), Phase::Tipping);
    }

    // ========== Discrete Integrator ==========

    #[test]
    fn test_zero_feedback_closed_form() {
        let config = CascadeConfig {
            name: "bare".to_string(),
            feedbacks: Vec::new(),
            initial_energy: 50.0,
            ..CascadeConfig::default()
        };
        let retention = config.retention;
        let dissipation = config.dissipation;
        let dt = config.default_dt;

        let mut system = CascadeSystem::new(config).unwrap();
        let snapshots = system.simulate(100, |_| 1.0).unwrap();

        // With no feedback loops the chain is the identity, so each step is
        // E += (E·R(E) − D(E))·dt exactly.
        let mut expected = 50.0;
        for snapshot in &snapshots {
            assert!(
                (snapshot.energy - expected).abs() < 1e-9,
                "step {} drifted from the closed-form recurrence",
                snapshot.timestep
            );
            expected += (expected * retention.at(expected) - dissipation.at(expected)) * dt;
        }
    }

    #[test]
    fn test_buffer_depletes_monotonically_above_warning() {
        let config = CascadeConfig {
            name: "hot".to_string(),
            feedbacks: vec![
                FeedbackLoop::new("amplifier", Polarity::Positive, 0.3, Some(50.0)).unwrap(),
            ],
            initial_energy: 150.0,
            ..CascadeConfig::default()
        };
        let mut system = CascadeSystem::new(config).unwrap();
        let snapshots = system.simulate(200, |_| 2.0).unwrap();

        let mut previous = 1.0_f64;
        for snapshot in snapshots {
            assert!(snapshot.buffer_capacity <= previous + 1e-15);
            assert!((0.0..=1.0).contains(&snapshot.buffer_capacity));
            previous = snapshot.buffer_capacity;
        }
    }

    // ========== Continuous Integrator ==========

    fn decay_pool() -> CompartmentModel {
        let spec = CompartmentSpec {
            name: "pool".to_string(),
            initial_energy: 0.0,
            retention: RetentionLaw::new(0.0, 0.0),
            dissipation: DissipationLaw::new(0.05, 0.0),
            input: ForcingFn::Constant { rate: 5.0 },
        };
        CompartmentModel::new(vec![spec], Thresholds::default()).unwrap()
    }

    #[test]
    fn test_solver_matches_analytic_reference() {
        let model = decay_pool();
        let time_grid: Vec<f64> = (0..=12).map(|i| i as f64 / 12.0).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (trajectory, _) = model.integrate(&time_grid, false, &mut rng).unwrap();

        // dE/dt = 5 − 0.05E has E(t) = 100·(1 − e^{−0.05t}).
        for point in &trajectory[1..] {
            let analytic = 100.0 * (1.0 - (-0.05 * point.t).exp());
            let relative = ((point.total - analytic) / analytic).abs();
            assert!(
                relative < 1e-6,
                "relative error {} at t = {}",
                relative,
                point.t
            );
        }
    }

    // ========== Monte Carlo Ensemble ==========

    fn stochastic_member(
        _index: usize,
        params: &[f64],
        rng: &mut ChaCha8Rng,
    ) -> Result<f64, cascade_engine::SimError> {
        let spec = CompartmentSpec {
            name: "pool".to_string(),
            initial_energy: 50.0,
            retention: RetentionLaw::new(0.0, 0.0),
            dissipation: DissipationLaw::new(0.05, 0.0),
            input: ForcingFn::Constant { rate: params[0] },
        };
        let model = CompartmentModel::new(vec![spec], Thresholds::default())?
            .with_extended(ExtendedDynamics {
                sink: SinkDissipation::new(0.002, 500.0),
                release: ReleaseConfig {
                    probability: 0.05,
                    magnitude: (0.5, 2.0),
                },
                events: EventGenerator::default(),
            });
        let time_grid: Vec<f64> = (0..=120).map(|i| i as f64 / 12.0).collect();
        let (trajectory, _) = model.integrate(&time_grid, true, rng)?;
        Ok(trajectory.last().map(|p| p.total).unwrap_or(0.0))
    }

    #[test]
    fn test_ensemble_bit_for_bit_reproducible() {
        let ranges = vec![ParameterRange::uniform("input", 3.0, 7.0)];
        let first = run_ensemble(&ranges, 200, 42, &[100.0], stochastic_member).unwrap();
        let second = run_ensemble(&ranges, 200, 42, &[100.0], stochastic_member).unwrap();

        assert_eq!(first.terminals.len(), second.terminals.len());
        for (a, b) in first.terminals.iter().zip(second.terminals.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        assert_eq!(first.failed, second.failed);
        assert_eq!(first.exceedance, second.exceedance);
    }

    #[test]
    fn test_ensemble_percentiles_ordered() {
        let ranges = vec![ParameterRange::uniform("input", 3.0, 7.0)];
        let result = run_ensemble(&ranges, 100, 7, &[], stochastic_member).unwrap();
        let stats = result.stats.unwrap();
        assert!(stats.min <= stats.p5);
        assert!(stats.p5 <= stats.median);
        assert!(stats.median <= stats.p95);
        assert!(stats.p95 <= stats.max);
    }
}
