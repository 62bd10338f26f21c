// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cascade Dynamics Simulation Suite ("Cascade") - Phase Classifier

use crate::types::{Phase, Thresholds, TrajectoryPoint};

/// Classify a total energy against the ascending cutoffs. Pure and
/// hysteresis-free: re-evaluated independently on every call, so a system
/// reclassifies downward the instant its energy drops.
pub fn classify(energy: f64, thresholds: &Thresholds) -> Phase {
    if energy < thresholds.warning {
        Phase::Stable
    } else if energy < thresholds.critical {
        Phase::Stressed
    } else if energy < thresholds.tipping {
        Phase::Critical
    } else {
        Phase::Tipping
    }
}

/// Classify every point of a continuous trajectory by its total energy.
pub fn classify_trajectory(trajectory: &[TrajectoryPoint], thresholds: &Thresholds) -> Vec<Phase> {
    trajectory
        .iter()
        .map(|point| classify(point.total, thresholds))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        let thresholds = Thresholds::new(100.0, 200.0, 300.0).unwrap();
        assert_eq!(classify(50.0, &thresholds), Phase::Stable);
        assert_eq!(classify(150.0, &thresholds), Phase::Stressed);
        assert_eq!(classify(250.0, &thresholds), Phase::Critical);
        assert_eq!(classify(350.0, &thresholds), Phase::Tipping);
    }

    #[test]
    fn test_no_hysteresis() {
        let thresholds = Thresholds::default();
        assert_eq!(classify(350.0, &thresholds), Phase::Tipping);
        // Dropping back reclassifies immediately.
        assert_eq!(classify(50.0, &thresholds), Phase::Stable);
    }

    #[test]
    fn test_trajectory_classification() {
        let thresholds = Thresholds::default();
        let trajectory: Vec<TrajectoryPoint> = [50.0, 150.0, 350.0]
            .iter()
            .enumerate()
            .map(|(i, &total)| TrajectoryPoint {
                t: i as f64,
                compartments: vec![total],
                total,
            })
            .collect();
        let phases = classify_trajectory(&trajectory, &thresholds);
        assert_eq!(phases, vec![Phase::Stable, Phase::Stressed, Phase::Tipping]);
    }
}
