//! Time integrators for the N-body system
//!
//! - `verlet_integrator`: fixed-step velocity-Verlet on a [`BodyState`],
//!   driven by an `AccelSet` and `Parameters::h0`
//! - `dopri45_integrate`: adaptive Dormand–Prince 5(4) from the `ivp`
//!   crate over any [`OdeSystem`]; the solver only ever sees the flat state
//!   and the derivative callback, never the structured bodies

use std::sync::Mutex;

use ivp::prelude::*;
use log::{info, warn};

use super::derivative::OdeSystem;
use super::forces::AccelSet;
use super::params::Parameters;
use super::states::{BodyState, NVec2};
use crate::error::SimError;

/// Advance the system by one step using velocity–Verlet
/// Uses two force evaluations per step and updates positions, velocities,
/// and `state.t` in-place based on `params.h0`. Masses are never touched.
pub fn verlet_integrator(state: &mut BodyState, forces: &AccelSet, params: &Parameters) {
    let n = state.len();
    if n == 0 { // no bodies, return
        return;
    }

    let dt = params.h0; // time step dt
    let half_dt = 0.5 * dt; // half step dt/2

    // a_n from x_n at time t_n
    let mut a_old = vec![NVec2::zeros(); n];
    forces.accumulate_accels(state.t, &*state, &mut a_old);

    // Kick: v_n+1/2 = v_n + (1/2 * dt) * a_n
    for (b, a) in state.bodies.iter_mut().zip(a_old.iter()) {
        b.v += half_dt * *a;
    }

    // Drift: x_n+1 = x_n + dt v_n+1/2
    for b in state.bodies.iter_mut() {
        b.x += dt * b.v;
    }

    state.t += dt;

    // a_n+1 from x_n+1 at time t_n+1
    let mut a_new = vec![NVec2::zeros(); n];
    forces.accumulate_accels(state.t, &*state, &mut a_new);

    // Second kick: v_n+1 = v_n+1/2 + (dt/2) * a_n+1
    for (b, a) in state.bodies.iter_mut().zip(a_new.iter()) {
        b.v += half_dt * *a;
    }
}

/// Split `[t0, t_end]` into `ceil(span / h)` equal steps
/// `None` when the span is empty or either bound is not finite.
fn uniform_steps(t0: f64, t_end: f64, h: f64) -> Option<(usize, f64)> {
    let span = t_end - t0;
    if !span.is_finite() || span <= 0.0 || !h.is_finite() || h <= 0.0 {
        return None;
    }
    // 1e-9 slack absorbs rounding in span / h
    let steps = (span / h - 1e-9).ceil().max(1.0) as usize;
    Some((steps, span / steps as f64))
}

/// Repeat [`verlet_integrator`] until `params.t_end`, recording every step
/// The span is split into equal steps no larger than `h0`, so the run ends
/// exactly on `t_end`. A non-finite `t_end` leaves the state untouched.
pub fn verlet_run(state: &mut BodyState, forces: &AccelSet, params: &Parameters) -> Trajectory {
    let mut traj = Trajectory::default();
    traj.push(state.t, state.flatten());

    let t0 = state.t;
    let Some((steps, dt)) = uniform_steps(t0, params.t_end, params.h0) else {
        return traj;
    };
    let step = Parameters { h0: dt, ..params.clone() };

    for k in 1..=steps {
        verlet_integrator(state, forces, &step);
        state.t = if k == steps { params.t_end } else { t0 + k as f64 * dt };
        traj.push(state.t, state.flatten());
    }
    traj
}

/// Sampled solution: `y[k]` is the flat state at time `t[k]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub t: Vec<f64>,
    pub y: Vec<Vec<f64>>,
}

impl Trajectory {
    pub fn push(&mut self, t: f64, y: Vec<f64>) {
        self.t.push(t);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn final_state(&self) -> Option<&[f64]> {
        self.y.last().map(Vec::as_slice)
    }
}

/// Solver counters reported by [`dopri45_integrate`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrationStats {
    pub accepted: usize,
    pub rejected: usize,
    pub nfev: usize,
}

/// Bridges an [`OdeSystem`] to the `ivp` solver
///
/// The solver callback cannot fail, so the first time a derivative errors or
/// goes non-finite is remembered here and the output is filled with NaN.
struct Guarded<'a, O: OdeSystem + Sync + ?Sized> {
    inner: &'a O,
    first_bad_t: Mutex<Option<f64>>,
}

impl<'a, O: OdeSystem + Sync + ?Sized> Guarded<'a, O> {
    fn new(inner: &'a O) -> Self {
        Self { inner, first_bad_t: Mutex::new(None) }
    }

    fn first_bad_t(&self) -> Option<f64> {
        self.first_bad_t.lock().ok().and_then(|bad| *bad)
    }
}

impl<O: OdeSystem + Sync + ?Sized> ODE for Guarded<'_, O> {
    fn ode(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        let ok = self.inner.derivative(t, y, dydt).is_ok() && dydt.iter().all(|d| d.is_finite());
        if !ok {
            if let Ok(mut bad) = self.first_bad_t.lock() {
                bad.get_or_insert(t);
            }
            dydt.fill(f64::NAN);
        }
    }
}

/// Integrate `ode` from `(t0, y0)` to `t_end` with `ivp`'s DOPRI5
///
/// Error control uses `params.atol` / `params.rtol`. The solution is sampled
/// on equal intervals no longer than `params.h0`, the last sample being
/// `t_end`. A derivative that is already non-finite at `t0` (coincident
/// bodies) fails with [`SimError::NonFinite`] before the solver starts.
pub fn dopri45_integrate<O: OdeSystem + Sync + ?Sized>(
    ode: &O,
    t0: f64,
    t_end: f64,
    y0: &[f64],
    params: &Parameters,
) -> Result<(Trajectory, IntegrationStats), SimError> {
    let dim = ode.dimension();
    if y0.len() != dim {
        return Err(SimError::DimensionMismatch { expected: dim, got: y0.len() });
    }

    let mut traj = Trajectory::default();
    let Some((steps, dt)) = uniform_steps(t0, t_end, params.h0) else {
        traj.push(t0, y0.to_vec());
        return Ok((traj, IntegrationStats::default()));
    };

    let mut dydt = vec![0.0; dim];
    ode.derivative(t0, y0, &mut dydt)?;
    if !dydt.iter().all(|d| d.is_finite()) {
        return Err(SimError::NonFinite { t: t0 });
    }

    let t_eval: Vec<f64> = (0..=steps)
        .map(|k| if k == steps { t_end } else { t0 + k as f64 * dt })
        .collect();
    let options = Options::builder()
        .method(Method::DOPRI5)
        .rtol(params.rtol)
        .atol(params.atol)
        .t_eval(t_eval)
        .build();

    let guarded = Guarded::new(ode);
    let result = solve_ivp(&guarded, t0, t_end, y0, options);
    if let Some(t) = guarded.first_bad_t() {
        warn!("dopri45 stopped: non-finite derivative at t = {t}");
        return Err(SimError::NonFinite { t });
    }
    let sol = result.map_err(|err| {
        warn!("dopri45 failed: {err:?}");
        SimError::Solver(format!("{err:?}"))
    })?;

    for (t, y) in sol.iter() {
        traj.push(t.to_owned(), y.to_vec());
    }
    if traj.y.iter().flatten().any(|v| !v.is_finite()) {
        return Err(SimError::NonFinite { t: t_end });
    }

    let stats = IntegrationStats {
        accepted: sol.naccpt as usize,
        rejected: sol.nrejct as usize,
        nfev: sol.nfev as usize,
    };
    info!(
        "dopri45: t = {t0} -> {t_end}, {} accepted, {} rejected, {} evaluations",
        stats.accepted, stats.rejected, stats.nfev
    );
    Ok((traj, stats))
}
