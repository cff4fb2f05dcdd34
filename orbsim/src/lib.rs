pub mod error;
pub mod simulation;
pub mod configuration;

pub use error::SimError;

pub use simulation::states::{Body, BodyState, NVec2, FIELDS_PER_BODY};
pub use simulation::forces::{Acceleration, AccelSet, NewtonianGravity, NewtonianGravityPar, get_accelerations};
pub use simulation::derivative::{OdeSystem, NBodyDerivative, update_fn};
pub use simulation::integrator::{verlet_integrator, verlet_run, dopri45_integrate, Trajectory, IntegrationStats};
pub use simulation::orbit_table::{OrbitEntry, OrbitFamily, OrbitTable};
pub use simulation::scenario::{
    custom_init, random_binary, random_binary_seeded, special_triplet, periodic_state, periodic_triplet,
    periodic_triplet_reference, RandomBinary, Scenario,
};
pub use simulation::engine::Engine;
pub use simulation::params::Parameters;

pub use configuration::config::{IntegratorConfig, EngineConfig, ParametersConfig, BodyConfig, InitialConditionConfig, ScenarioConfig};
