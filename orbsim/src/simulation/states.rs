//! Core state types for the 2D N-body problem
//!
//! - `Body`      a point mass with position and velocity (`NVec2`)
//! - `BodyState` the ordered list of bodies plus the current time `t`
//!
//! The integrator only understands flat numeric vectors, so every body is
//! serialized as a fixed-width row of `FIELDS_PER_BODY` scalars:
//!
//! ```text
//! [mass, px, py, vx, vy]
//! ```
//!
//! Rows are concatenated in body order. Any code that reads or writes a flat
//! state must go through [`Body::to_row`] / [`Body::from_row`] or the named
//! field offsets below.

use nalgebra::Vector2;

use crate::error::SimError;

pub type NVec2 = Vector2<f64>;

/// Number of scalars stored per body in a flat state
pub const FIELDS_PER_BODY: usize = 5;

/// Field offsets inside a body row
pub const MASS: usize = 0;
pub const PX: usize = 1;
pub const PY: usize = 2;
pub const VX: usize = 3;
pub const VY: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub m: f64,   // mass
    pub x: NVec2, // position
    pub v: NVec2, // velocity
}

impl Body {
    pub fn new(m: f64, x: [f64; 2], v: [f64; 2]) -> Self {
        Self {
            m,
            x: NVec2::new(x[0], x[1]),
            v: NVec2::new(v[0], v[1]),
        }
    }

    /// Body from one `[mass, px, py, vx, vy]` row
    pub fn from_row(row: &[f64; FIELDS_PER_BODY]) -> Self {
        Self {
            m: row[MASS],
            x: NVec2::new(row[PX], row[PY]),
            v: NVec2::new(row[VX], row[VY]),
        }
    }

    pub fn to_row(&self) -> [f64; FIELDS_PER_BODY] {
        [self.m, self.x.x, self.x.y, self.v.x, self.v.y]
    }

    pub fn momentum(&self) -> NVec2 {
        self.m * self.v
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    pub bodies: Vec<Body>, // ordered bodies, index is identity
    pub t: f64,            // time
}

impl BodyState {
    pub fn new(bodies: Vec<Body>) -> Self {
        Self { bodies, t: 0.0 }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Rebuild a state from a flat `5 * N` vector
    pub fn from_flat(flat: &[f64]) -> Result<Self, SimError> {
        let n = body_count(flat.len())?;
        let bodies = flat
            .chunks_exact(FIELDS_PER_BODY)
            .map(|row| <&[f64; FIELDS_PER_BODY]>::try_from(row).map(Body::from_row))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| SimError::FlatLength { len: flat.len() })?;
        debug_assert_eq!(bodies.len(), n);
        Ok(Self::new(bodies))
    }

    pub fn flatten(&self) -> Vec<f64> {
        let mut flat = vec![0.0; self.bodies.len() * FIELDS_PER_BODY];
        self.flatten_into(&mut flat);
        flat
    }

    /// Write rows into `out`, which must hold exactly `5 * N` scalars
    pub fn flatten_into(&self, out: &mut [f64]) {
        for (row, body) in out.chunks_exact_mut(FIELDS_PER_BODY).zip(&self.bodies) {
            row.copy_from_slice(&body.to_row());
        }
    }

    pub fn masses(&self) -> Vec<f64> {
        self.bodies.iter().map(|b| b.m).collect()
    }

    pub fn is_finite(&self) -> bool {
        self.bodies
            .iter()
            .all(|b| b.m.is_finite() && b.x.iter().chain(b.v.iter()).all(|c| c.is_finite()))
    }
}

/// Number of bodies encoded in a flat vector of `len` scalars
pub fn body_count(len: usize) -> Result<usize, SimError> {
    if len == 0 || len % FIELDS_PER_BODY != 0 {
        return Err(SimError::FlatLength { len });
    }
    Ok(len / FIELDS_PER_BODY)
}
