pub mod states;
pub mod params;
pub mod engine;
pub mod forces;
pub mod derivative;
pub mod integrator;
pub mod orbit_table;
pub mod diagnostics;
pub mod scenario;
