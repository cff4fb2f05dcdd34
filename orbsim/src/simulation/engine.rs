//! High-level runtime engine settings
//!
//! Selects the integrator and whether the force evaluation is spread over
//! threads when building and running a `Scenario`

use crate::configuration::config::IntegratorConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    pub integrator: IntegratorConfig, // verlet or dopri45
    pub parallel: bool, // false = sequential, true = rayon over bodies
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            integrator: IntegratorConfig::Dopri45,
            parallel: false,
        }
    }
}
