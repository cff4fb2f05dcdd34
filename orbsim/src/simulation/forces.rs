//! Force / acceleration contributors for the n-body engine
//!
//! Defines the acceleration trait and the direct Newtonian gravity term
//! (G = 1, no softening), in a sequential and a rayon-parallel flavour.
//! Both flavours accumulate each body's pairs in the same order, so they
//! produce bit-identical results.

use rayon::prelude::*;

use crate::simulation::states::{BodyState, NVec2};

/// Collection of acceleration terms
/// Each term implements [`Acceleration`] and their contributions are summed
/// into a single acceleration vector per body
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelSet {
    /// Create an empty acceleration set
    pub fn new() -> Self {
        Self {
            terms: Vec::new()
        }
    }

    /// Set holding only direct Newtonian gravity
    pub fn gravity(parallel: bool) -> Self {
        if parallel {
            Self::new().with(NewtonianGravityPar)
        } else {
            Self::new().with(NewtonianGravity)
        }
    }

    /// Add an acceleration term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: Acceleration + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    /// Compute total accelerations at time `t` for all bodies in `state`
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_accels(&self, t: f64, state: &BodyState, out: &mut [NVec2]) {
        // Zero buffer
        for a in out.iter_mut() {
            *a = NVec2::zeros();
        }
        for term in &self.terms {
            term.acceleration(t, state, out);
        }
    }
}

/// Acceleration source operating on a [`BodyState`]
/// Implementations add their contribution into `out[i]` for each body
pub trait Acceleration {
    fn acceleration(&self, t: f64, state: &BodyState, out: &mut [NVec2]);
}

/// Net acceleration on body `i` from every other body
///
/// The pair list skips `i` explicitly. Coincident bodies divide by zero and
/// the resulting inf/NaN is returned as is.
#[inline]
fn accel_on(i: usize, state: &BodyState) -> NVec2 {
    let xi = state.bodies[i].x;
    let mut acc = NVec2::zeros();
    for (j, bj) in state.bodies.iter().enumerate() {
        if j == i {
            continue;
        }
        // displacement from i towards j
        let r = bj.x - xi;
        let dist = r.norm();
        // a_i += m_j * r / |r|^3
        acc += bj.m * r / (dist * dist * dist);
    }
    acc
}

/// Direct O(n^2) Newtonian gravity, G = 1
#[derive(Debug, Clone, Copy, Default)]
pub struct NewtonianGravity;

impl Acceleration for NewtonianGravity {
    fn acceleration(&self, _t: f64, state: &BodyState, out: &mut [NVec2]) {
        for (i, a) in out.iter_mut().enumerate().take(state.len()) {
            *a += accel_on(i, state);
        }
    }
}

/// [`NewtonianGravity`] with the outer loop spread over the rayon pool
#[derive(Debug, Clone, Copy, Default)]
pub struct NewtonianGravityPar;

impl Acceleration for NewtonianGravityPar {
    fn acceleration(&self, _t: f64, state: &BodyState, out: &mut [NVec2]) {
        let n = state.len();
        out[..n]
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, a)| *a += accel_on(i, state));
    }
}

/// Accelerations of every body under direct gravity
pub fn get_accelerations(state: &BodyState) -> Vec<NVec2> {
    let mut out = vec![NVec2::zeros(); state.len()];
    NewtonianGravity.acceleration(state.t, state, &mut out);
    out
}
