//! Configuration types for describing simulation runs in YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! run. A run consists of:
//!
//! - [`EngineConfig`]           – integrator choice and force-evaluation threading
//! - [`ParametersConfig`]       – horizon, step size, tolerances and seed
//! - [`InitialConditionConfig`] – which generator builds the starting bodies
//! - [`ScenarioConfig`]         – top-level wrapper
//!
//! # YAML format
//! A periodic three-body run over exactly one period:
//!
//! ```yaml
//! engine:
//!   integrator: "dopri45"   # or "verlet"
//!   parallel: false
//!
//! parameters:
//!   h0: 0.01                # initial/fixed step size
//!   atol: 1.0e-10           # absolute error tolerance
//!   rtol: 1.0e-10           # relative error tolerance
//!   seed: 42                # seed for randomized initial conditions
//!   # t_end omitted: defaults to the orbit period
//!
//! initial:
//!   kind: periodic
//!   family: "IA"
//!   index: 0
//! ```
//!
//! Other `initial` kinds: `fixed`, `special_triplet`,
//! `random_binary` (with `same_mass`), and `bodies` with an explicit list:
//!
//! ```yaml
//! initial:
//!   kind: bodies
//!   bodies:
//!     - { m: 1.0, x: [-1.0, 0.0], v: [0.0, 0.5] }
//!     - { m: 1.0, x: [ 1.0, 0.0], v: [0.0, -0.5] }
//! ```

use serde::Deserialize;

use crate::simulation::states::Body;

/// Which integrator method used by the engine
/// `integrator: "verlet"` or `integrator: "dopri45"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorConfig {
    #[serde(rename = "verlet")] // Fixed-step velocity Verlet, symplectic
    Verlet,

    #[serde(rename = "dopri45")] // Adaptive Dormand–Prince 5(4) with atol/rtol control
    Dopri45,
}

fn default_integrator() -> IntegratorConfig {
    IntegratorConfig::Dopri45
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_integrator")]
    pub integrator: IntegratorConfig,
    #[serde(default)]
    pub parallel: bool, // spread force evaluation over the rayon pool
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            integrator: default_integrator(),
            parallel: false,
        }
    }
}

fn default_h0() -> f64 {
    1.0e-3
}

fn default_tol() -> f64 {
    1.0e-9
}

/// Global numerical parameters for a run
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ParametersConfig {
    pub t_end: Option<f64>, // time end, periodic runs default to one period
    #[serde(default = "default_h0")]
    pub h0: f64,            // time step size
    #[serde(default = "default_tol")]
    pub atol: f64,          // absolute error tolerance
    #[serde(default = "default_tol")]
    pub rtol: f64,          // relative error tolerance
    #[serde(default)]
    pub seed: u64,          // makes randomized initial conditions reproducible
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            t_end: None,
            h0: default_h0(),
            atol: default_tol(),
            rtol: default_tol(),
            seed: 0,
        }
    }
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct BodyConfig {
    pub m: f64,      // Mass of the body
    pub x: [f64; 2], // Initial position
    pub v: [f64; 2], // Initial velocity
}

impl From<&BodyConfig> for Body {
    fn from(bc: &BodyConfig) -> Self {
        Body::new(bc.m, bc.x, bc.v)
    }
}

/// Initial-condition generator selection
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitialConditionConfig {
    /// Canned three-body configuration
    Fixed,
    /// Bound two-body system drawn by rejection sampling
    RandomBinary {
        #[serde(default)]
        same_mass: bool,
    },
    /// Two heavy bodies and a near-massless third on a known periodic solution
    SpecialTriplet,
    /// Entry `index` of a tabulated periodic family
    Periodic { family: String, index: usize },
    /// Explicit list of bodies
    Bodies { bodies: Vec<BodyConfig> },
}

/// Top-level run configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub parameters: ParametersConfig,
    pub initial: InitialConditionConfig,
}

impl ScenarioConfig {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let cfg: ScenarioConfig = serde_yaml::from_str(yaml)?;
        if let InitialConditionConfig::Bodies { bodies } = &cfg.initial {
            anyhow::ensure!(!bodies.is_empty(), "initial body list is empty");
        }
        anyhow::ensure!(cfg.parameters.h0 > 0.0, "h0 must be positive, got {}", cfg.parameters.h0);
        if let Some(t_end) = cfg.parameters.t_end {
            anyhow::ensure!(t_end.is_finite(), "t_end must be finite, got {t_end}");
        }
        Ok(cfg)
    }
}
