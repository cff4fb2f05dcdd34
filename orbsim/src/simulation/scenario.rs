//! Initial conditions and fully-initialized simulation scenarios
//!
//! Generators (all G = 1, layout `[mass, px, py, vx, vy]` per body):
//! - [`custom_init`]       canned three-body configuration
//! - [`random_binary`]     bound two-body system by rejection sampling
//! - [`special_triplet`]   two heavy bodies plus a near-massless third
//! - [`periodic_triplet`]  entry of a tabulated periodic orbit family
//!
//! [`Scenario::build_scenario`] takes a [`ScenarioConfig`] and produces the
//! runtime bundle: engine settings, parameters, initial state and forces.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::configuration::config::{InitialConditionConfig, IntegratorConfig, ScenarioConfig};
use crate::error::SimError;
use crate::simulation::derivative::NBodyDerivative;
use crate::simulation::diagnostics::{binary_binding_energy, kinetic_energy};
use crate::simulation::engine::Engine;
use crate::simulation::forces::AccelSet;
use crate::simulation::integrator::{dopri45_integrate, verlet_run, Trajectory};
use crate::simulation::orbit_table::OrbitTable;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, BodyState};

/// Mass of the central body in the tabulated three-body families
const PERIODIC_CENTER_MASS: f64 = 0.5;

/// Canned three-body configuration, no randomness
pub fn custom_init() -> BodyState {
    BodyState::new(vec![
        Body::new(1.0, [1.0, 0.3], [0.0, 0.1]),
        Body::new(2.0, [0.0, 0.3], [0.1, 0.0]),
        Body::new(3.0, [0.1, 0.3], [0.1, -0.3]),
    ])
}

/// Bound binary plus the number of rejected draws it took
#[derive(Debug, Clone)]
pub struct RandomBinary {
    pub state: BodyState,
    pub retries: usize,
}

/// Draw a bound two-body system
///
/// Masses and a velocity are uniform in [0, 1); the velocity is halved and
/// given to the body at (+1, 0), while the body at (-1, 0) gets the mirrored
/// velocity scaled by `m1 / m2`, so the total momentum is zero. A draw whose
/// kinetic energy exceeds `m1 * m2 / 2` is discarded and the whole draw is
/// repeated, as is a draw with a zero mass.
pub fn random_binary<R: Rng>(rng: &mut R, same_mass: bool) -> RandomBinary {
    let mut retries = 0;
    loop {
        let m1: f64 = rng.gen();
        let mut m2: f64 = rng.gen();
        let vx: f64 = rng.gen::<f64>() / 2.0;
        let vy: f64 = rng.gen::<f64>() / 2.0;
        if same_mass {
            m2 = m1;
        }

        if m1 > 0.0 && m2 > 0.0 {
            let ratio = m1 / m2;
            let state = BodyState::new(vec![
                Body::new(m1, [1.0, 0.0], [vx, vy]),
                Body::new(m2, [-1.0, 0.0], [-vx * ratio, -vy * ratio]),
            ]);
            let ke = kinetic_energy(&state);
            let bound = binary_binding_energy(m1, m2);
            if ke <= bound {
                return RandomBinary { state, retries };
            }
            debug!("random_binary: rejected draw {retries} (KE {ke:.4e} > {bound:.4e})");
        }
        retries += 1;
    }
}

/// [`random_binary`] from a seeded [`StdRng`]
pub fn random_binary_seeded(seed: u64, same_mass: bool) -> RandomBinary {
    random_binary(&mut StdRng::seed_from_u64(seed), same_mass)
}

/// Two mass-4 bodies with opposite vertical velocities and a near-massless
/// third body at the apex of the equilateral triangle they span
pub fn special_triplet() -> BodyState {
    let s2 = 2f64.sqrt();
    let s3 = 3f64.sqrt();
    BodyState::new(vec![
        Body::new(4.0, [0.0, 0.0], [0.0, -1.0 / s2]),
        Body::new(4.0, [1.0, 0.0], [0.0, 1.0 / s2]),
        Body::new(1e-4, [0.5, s3 / 2.0], [-(1.5f64).sqrt(), 0.0]),
    ])
}

/// Three-body state for entry `index` of `family`, with its period
///
/// Two unit masses at (-1, 0) and (1, 0) share velocity `(v1, v2)`; a mass
/// of 0.5 at the origin carries the opposite momentum.
pub fn periodic_state(
    table: &OrbitTable,
    family: &str,
    index: usize,
) -> Result<(BodyState, f64), SimError> {
    let e = table.lookup(family, index)?;
    let vc = [-2.0 * e.v1 / PERIODIC_CENTER_MASS, -2.0 * e.v2 / PERIODIC_CENTER_MASS];
    let state = BodyState::new(vec![
        Body::new(1.0, [-1.0, 0.0], [e.v1, e.v2]),
        Body::new(1.0, [1.0, 0.0], [e.v1, e.v2]),
        Body::new(PERIODIC_CENTER_MASS, [0.0, 0.0], vc),
    ]);
    Ok((state, e.period))
}

/// Flat form of [`periodic_state`]: `(flat state, period)`
pub fn periodic_triplet(
    table: &OrbitTable,
    family: &str,
    index: usize,
) -> Result<(Vec<f64>, f64), SimError> {
    let (state, period) = periodic_state(table, family, index)?;
    Ok((state.flatten(), period))
}

/// [`periodic_triplet`] against the embedded reference table
pub fn periodic_triplet_reference(family: &str, index: usize) -> Result<(Vec<f64>, f64), SimError> {
    periodic_triplet(OrbitTable::reference(), family, index)
}

/// Fully-initialized simulation run
///
/// Built from a [`ScenarioConfig`]: the engine settings, parameters,
/// current state, and the active force terms.
pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    pub system: BodyState,
    pub forces: AccelSet,
    /// Known period when the state came from an orbit table
    pub period: Option<f64>,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, SimError> {
        Self::build_scenario_with_table(cfg, OrbitTable::reference())
    }

    pub fn build_scenario_with_table(cfg: ScenarioConfig, table: &OrbitTable) -> Result<Self, SimError> {
        let p_cfg = cfg.parameters;

        let (system, period) = match &cfg.initial {
            InitialConditionConfig::Fixed => (custom_init(), None),
            InitialConditionConfig::RandomBinary { same_mass } => {
                let draw = random_binary_seeded(p_cfg.seed, *same_mass);
                debug!("random binary accepted after {} retries", draw.retries);
                (draw.state, None)
            }
            InitialConditionConfig::SpecialTriplet => (special_triplet(), None),
            InitialConditionConfig::Periodic { family, index } => {
                let (state, period) = periodic_state(table, family, *index)?;
                (state, Some(period))
            }
            InitialConditionConfig::Bodies { bodies } => {
                (BodyState::new(bodies.iter().map(Body::from).collect()), None)
            }
        };

        let parameters = Parameters {
            t_end: p_cfg.t_end.or(period).unwrap_or(Parameters::default().t_end),
            h0: p_cfg.h0,
            atol: p_cfg.atol,
            rtol: p_cfg.rtol,
            seed: p_cfg.seed,
        };

        let engine = Engine {
            integrator: cfg.engine.integrator,
            parallel: cfg.engine.parallel,
        };

        let forces = AccelSet::gravity(engine.parallel);

        info!(
            "built scenario: {} bodies, {:?} to t = {}",
            system.len(),
            engine.integrator,
            parameters.t_end
        );

        Ok(Self {
            engine,
            parameters,
            system,
            forces,
            period,
        })
    }

    /// Integrate from the current state to `parameters.t_end`
    ///
    /// On success `system` holds the final state and the sampled trajectory
    /// is returned. On failure `system` is left unchanged.
    pub fn run(&mut self) -> Result<Trajectory, SimError> {
        match self.engine.integrator {
            IntegratorConfig::Verlet => {
                Ok(verlet_run(&mut self.system, &self.forces, &self.parameters))
            }
            IntegratorConfig::Dopri45 => {
                let ode = NBodyDerivative::for_state(&self.system, self.engine.parallel);
                let (traj, _stats) = dopri45_integrate(
                    &ode,
                    self.system.t,
                    self.parameters.t_end,
                    &self.system.flatten(),
                    &self.parameters,
                )?;
                if let (Some(&t), Some(y)) = (traj.t.last(), traj.final_state()) {
                    let mut end = BodyState::from_flat(y)?;
                    end.t = t;
                    self.system = end;
                }
                Ok(traj)
            }
        }
    }
}
