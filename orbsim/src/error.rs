//! Error type shared by the simulation modules
//!
//! Degenerate geometry is not an error for the force evaluator (it yields
//! non-finite accelerations); only the adaptive integrator turns it into
//! [`SimError::NonFinite`] when it has to stop.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Flat state length is zero or not a multiple of the per-body width
    FlatLength { len: usize },
    /// Derivative buffer does not match the state it is paired with
    DimensionMismatch { expected: usize, got: usize },
    /// No orbit family with this key
    UnknownFamily(String),
    /// Orbit index past the end of its family
    IndexOutOfRange { family: String, index: usize, len: usize },
    /// Derivative or state became NaN/inf at `t` (usually coincident bodies)
    NonFinite { t: f64 },
    /// The ODE solver gave up; carries its own description
    Solver(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::FlatLength { len } => write!(
                f,
                "flat state of length {len} is not a non-empty multiple of 5 fields per body"
            ),
            SimError::DimensionMismatch { expected, got } => {
                write!(f, "expected a state of length {expected}, got {got}")
            }
            SimError::UnknownFamily(key) => write!(f, "unknown orbit family '{key}'"),
            SimError::IndexOutOfRange { family, index, len } => write!(
                f,
                "orbit index {index} out of range for family '{family}' with {len} entries"
            ),
            SimError::NonFinite { t } => write!(f, "non-finite state derivative at t = {t}"),
            SimError::Solver(msg) => write!(f, "ODE solver failed: {msg}"),
        }
    }
}

impl std::error::Error for SimError {}
