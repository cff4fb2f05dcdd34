//! Conserved quantities and orbit-closure checks (G = 1)

use crate::simulation::states::{BodyState, NVec2, FIELDS_PER_BODY, MASS};

/// Σ m_i v_i
pub fn total_momentum(state: &BodyState) -> NVec2 {
    state.bodies.iter().fold(NVec2::zeros(), |p, b| p + b.momentum())
}

/// Σ ½ m_i |v_i|²
pub fn kinetic_energy(state: &BodyState) -> f64 {
    state
        .bodies
        .iter()
        .map(|b| 0.5 * b.m * b.v.norm_squared())
        .sum()
}

/// -Σ_{i<j} m_i m_j / |x_j - x_i|
pub fn potential_energy(state: &BodyState) -> f64 {
    let mut u = 0.0;
    for (i, bi) in state.bodies.iter().enumerate() {
        for bj in &state.bodies[i + 1..] {
            u -= bi.m * bj.m / (bj.x - bi.x).norm();
        }
    }
    u
}

pub fn total_energy(state: &BodyState) -> f64 {
    kinetic_energy(state) + potential_energy(state)
}

/// Mass-weighted mean position, `None` when the total mass is zero
pub fn center_of_mass(state: &BodyState) -> Option<NVec2> {
    let m: f64 = state.bodies.iter().map(|b| b.m).sum();
    if m == 0.0 {
        return None;
    }
    let weighted = state.bodies.iter().fold(NVec2::zeros(), |acc, b| acc + b.m * b.x);
    Some(weighted / m)
}

/// Magnitude of the pair's gravitational binding at the fixed separation
/// of 2 used by the random binary generator: `m1 * m2 / 2`
pub fn binary_binding_energy(m1: f64, m2: f64) -> f64 {
    m1 * m2 / 2.0
}

/// Largest absolute difference in position or velocity between two flat states
///
/// Masses are skipped. States of different length are never closed.
pub fn closure_error(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    a.iter()
        .zip(b)
        .enumerate()
        .filter(|(k, _)| k % FIELDS_PER_BODY != MASS)
        .map(|(_, (x, y))| (x - y).abs())
        .fold(0.0, f64::max)
}
