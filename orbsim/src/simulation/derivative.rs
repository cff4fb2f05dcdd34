//! State-derivative callback consumed by ODE integrators
//!
//! Integrators see the system as a flat vector `y` of `5 * N` scalars
//! (see [`crate::simulation::states`]). For every body row the derivative is
//!
//! ```text
//! d/dt [m, px, py, vx, vy] = [0, vx, vy, ax, ay]
//! ```
//!
//! The system is autonomous, so `t` is only forwarded to the force terms.

use crate::error::SimError;
use crate::simulation::forces::AccelSet;
use crate::simulation::states::{body_count, BodyState, NVec2, FIELDS_PER_BODY, MASS, PX, PY, VX, VY};

/// First-order system `dy/dt = f(t, y)`
pub trait OdeSystem {
    /// Length of `y`
    fn dimension(&self) -> usize;

    fn derivative(&self, t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), SimError>;
}

/// Gravitational n-body right-hand side over a flat state
pub struct NBodyDerivative {
    forces: AccelSet,
    n: usize,
}

impl NBodyDerivative {
    pub fn new(n: usize, forces: AccelSet) -> Self {
        Self { forces, n }
    }

    /// Derivative for the bodies of `state` under direct gravity
    pub fn for_state(state: &BodyState, parallel: bool) -> Self {
        Self::new(state.len(), AccelSet::gravity(parallel))
    }

    pub fn bodies(&self) -> usize {
        self.n
    }
}

impl OdeSystem for NBodyDerivative {
    fn dimension(&self) -> usize {
        self.n * FIELDS_PER_BODY
    }

    fn derivative(&self, t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), SimError> {
        let dim = self.dimension();
        if y.len() != dim {
            return Err(SimError::DimensionMismatch { expected: dim, got: y.len() });
        }
        if dydt.len() != dim {
            return Err(SimError::DimensionMismatch { expected: dim, got: dydt.len() });
        }

        let mut state = BodyState::from_flat(y)?;
        state.t = t;

        let mut acc = vec![NVec2::zeros(); self.n];
        self.forces.accumulate_accels(t, &state, &mut acc);

        for ((row, body), a) in dydt
            .chunks_exact_mut(FIELDS_PER_BODY)
            .zip(&state.bodies)
            .zip(&acc)
        {
            row[MASS] = 0.0;
            row[PX] = body.v.x;
            row[PY] = body.v.y;
            row[VX] = a.x;
            row[VY] = a.y;
        }
        Ok(())
    }
}

/// One-shot derivative of a flat state under direct gravity
pub fn update_fn(t: f64, flat_state: &[f64]) -> Result<Vec<f64>, SimError> {
    let n = body_count(flat_state.len())?;
    let ode = NBodyDerivative::new(n, AccelSet::gravity(false));
    let mut out = vec![0.0; flat_state.len()];
    ode.derivative(t, flat_state, &mut out)?;
    Ok(out)
}
