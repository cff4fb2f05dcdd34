//! Numerical parameters for a simulation run
//!
//! `Parameters` holds runtime settings:
//! - integration horizon and initial/fixed step size,
//! - error tolerances for the adaptive integrator,
//! - seed for randomized initial conditions
//!
//! Units are normalized so that G = 1; there is no gravitational constant here.

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub t_end: f64,       // time end
    pub h0: f64,          // step size (sample spacing for dopri45)
    pub atol: f64,        // absolute error tolerance
    pub rtol: f64,        // relative error tolerance
    pub seed: u64,        // deterministic seed
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            t_end: 10.0,
            h0: 1.0e-3,
            atol: 1.0e-9,
            rtol: 1.0e-9,
            seed: 0,
        }
    }
}
