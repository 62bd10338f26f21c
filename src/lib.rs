// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cascade Dynamics Simulation Suite ("Cascade")

pub mod types;
pub mod feedback;
pub mod laws;
pub mod phase;
pub mod events;
pub mod discrete;
pub mod continuous;
pub mod ensemble;

pub use types::*;
pub use discrete::{CascadeConfig, CascadeSystem};
pub use continuous::{CompartmentModel, CompartmentSpec, ExtendedDynamics, ForcingFn};
pub use ensemble::{run_ensemble, EnsembleResult, EnsembleStats};
pub use events::EventGenerator;
pub use feedback::FeedbackLoop;
pub use laws::{DissipationLaw, RetentionLaw, SinkDissipation};
