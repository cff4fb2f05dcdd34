use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use orbsim::simulation::diagnostics::{
    binary_binding_energy, closure_error, kinetic_energy, total_energy, total_momentum,
};
use orbsim::{
    custom_init, dopri45_integrate, get_accelerations, periodic_state, periodic_triplet,
    periodic_triplet_reference, random_binary, special_triplet, update_fn, verlet_run, AccelSet,
    Body, BodyState, IntegratorConfig, NBodyDerivative, NVec2, OrbitTable, Parameters, Scenario,
    ScenarioConfig, SimError,
};

/// Build a simple 2-body state separated along x-axis
pub fn two_body_system(dist: f64, m1: f64, m2: f64) -> BodyState {
    BodyState::new(vec![
        Body::new(m1, [-dist / 2.0, 0.0], [0.0, 0.0]),
        Body::new(m2, [dist / 2.0, 0.0], [0.0, 0.0]),
    ])
}

/// Deterministic scatter of `n` bodies, no rand needed
pub fn scattered_system(n: usize) -> BodyState {
    let bodies = (0..n)
        .map(|i| {
            let i_f = i as f64;
            Body::new(
                1.0 + 0.1 * i_f,
                [(i_f * 0.37).sin() * 5.0, (i_f * 0.13).cos() * 5.0 + i_f],
                [(i_f * 0.7).cos(), (i_f * 0.3).sin()],
            )
        })
        .collect();
    BodyState::new(bodies)
}

/// Tight tolerances for closure/energy checks
pub fn test_params() -> Parameters {
    Parameters {
        t_end: 1.0,
        h0: 1e-3,
        atol: 1e-12,
        rtol: 1e-12,
        seed: 42,
    }
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_unit_masses_at_distance_two() {
    let acc = get_accelerations(&two_body_system(2.0, 1.0, 1.0));
    assert_eq!(acc, vec![NVec2::new(0.25, 0.0), NVec2::new(-0.25, 0.0)]);
}

#[test]
fn gravity_newton_third_law() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
        let sys = BodyState::new(vec![
            Body::new(rng.gen_range(0.1..10.0), [rng.gen(), rng.gen()], [0.0, 0.0]),
            Body::new(rng.gen_range(0.1..10.0), [rng.gen::<f64>() + 2.0, rng.gen()], [0.0, 0.0]),
        ]);
        let acc = get_accelerations(&sys);
        let net = acc[0] * sys.bodies[0].m + acc[1] * sys.bodies[1].m;
        let scale = (acc[0] * sys.bodies[0].m).norm();
        assert!(net.norm() <= 1e-12 * scale.max(1.0), "Net momentum not zero: {:?}", net);
    }
}

#[test]
fn gravity_points_toward_other_body() {
    let sys = two_body_system(2.0, 1.0, 1.0);
    let acc = get_accelerations(&sys);

    let dx = sys.bodies[1].x - sys.bodies[0].x;
    assert!(acc[0].dot(&dx) > 0.0, "Acceleration is not toward second body");
}

#[test]
fn gravity_inverse_square_law() {
    let acc_r = get_accelerations(&two_body_system(1.0, 1.0, 1.0));
    let acc_2r = get_accelerations(&two_body_system(2.0, 1.0, 1.0));

    let ratio = acc_r[0].norm() / acc_2r[0].norm();
    assert_abs_diff_eq!(ratio, 4.0, epsilon = 1e-12);
}

#[test]
fn gravity_coincident_bodies_are_not_finite() {
    let sys = BodyState::new(vec![
        Body::new(1.0, [0.5, 0.5], [0.0, 0.0]),
        Body::new(1.0, [0.5, 0.5], [0.0, 0.0]),
        Body::new(1.0, [2.0, 0.0], [0.0, 0.0]),
    ]);
    let acc = get_accelerations(&sys);
    assert!(!acc[0].x.is_finite() || !acc[0].y.is_finite());
    assert!(!acc[1].x.is_finite() || !acc[1].y.is_finite());
}

#[test]
fn parallel_gravity_is_bit_identical() {
    let sys = scattered_system(40);
    let mut seq = vec![NVec2::zeros(); sys.len()];
    let mut par = vec![NVec2::zeros(); sys.len()];
    AccelSet::gravity(false).accumulate_accels(0.0, &sys, &mut seq);
    AccelSet::gravity(true).accumulate_accels(0.0, &sys, &mut par);
    assert_eq!(seq, par);
}

#[test]
fn gravity_conserves_momentum_for_many_bodies() {
    let sys = scattered_system(12);
    let acc = get_accelerations(&sys);
    let net = sys
        .bodies
        .iter()
        .zip(&acc)
        .fold(NVec2::zeros(), |p, (b, a)| p + b.m * *a);
    assert!(net.norm() < 1e-12, "Net force not zero: {:?}", net);
}

// ==================================================================================
// State / derivative tests
// ==================================================================================

#[test]
fn flatten_round_trip() {
    for n in 1..=8 {
        let sys = scattered_system(n);
        let flat = sys.flatten();
        assert_eq!(flat.len(), 5 * n);
        let back = BodyState::from_flat(&flat).unwrap();
        assert_eq!(back.bodies, sys.bodies);
        assert_eq!(back.flatten(), flat);
    }
}

#[test]
fn derivative_keeps_length_and_masses() {
    let y = scattered_system(6).flatten();
    let d = update_fn(0.0, &y).unwrap();
    assert_eq!(d.len(), y.len());
    for (row, drow) in y.chunks(5).zip(d.chunks(5)) {
        assert_eq!(drow[0], 0.0);
        assert_eq!(&drow[1..3], &row[3..5]);
    }
}

#[test]
fn derivative_ignores_time() {
    let (y, _) = periodic_triplet_reference("IB", 4).unwrap();
    assert_eq!(update_fn(0.0, &y).unwrap(), update_fn(123.0, &y).unwrap());
}

// ==================================================================================
// Initial condition tests
// ==================================================================================

#[test]
fn custom_init_momentum() {
    let p = total_momentum(&custom_init());
    assert_abs_diff_eq!(p.x, 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(p.y, -0.8, epsilon = 1e-12);
}

#[test]
fn special_triplet_momentum() {
    let s = special_triplet();
    let p = total_momentum(&s);
    // heavy pair cancels exactly, the third body is near massless
    assert_eq!(s.bodies[0].momentum() + s.bodies[1].momentum(), NVec2::zeros());
    assert_abs_diff_eq!(p.x, -1e-4 * 1.5f64.sqrt(), epsilon = 1e-15);
    assert_eq!(p.y, 0.0);
}

#[test]
fn periodic_table_entries_have_zero_momentum() {
    let table = OrbitTable::reference();
    for family in table.families() {
        for index in 0..family.entries.len() {
            let (state, period) = periodic_state(table, &family.key, index).unwrap();
            assert!(period > 0.0);
            assert_eq!(state.masses(), vec![1.0, 1.0, 0.5]);
            let p = total_momentum(&state);
            assert!(p.norm() < 1e-15, "{} #{index}: {:?}", family.key, p);
        }
    }
}

#[test]
fn periodic_ia_zero() {
    let (flat, period) = periodic_triplet_reference("IA", 0).unwrap();
    assert_abs_diff_eq!(period, 4.1761292190, epsilon = 1e-12);

    let s = BodyState::from_flat(&flat).unwrap();
    assert_eq!(s.masses(), vec![1.0, 1.0, 0.5]);
    let positions: Vec<[f64; 2]> = s.bodies.iter().map(|b| [b.x.x, b.x.y]).collect();
    assert_eq!(positions, vec![[-1.0, 0.0], [1.0, 0.0], [0.0, 0.0]]);

    let expected = [
        [0.2869236336, 0.0791847624],
        [0.2869236336, 0.0791847624],
        [-1.1476945344, -0.3167390496],
    ];
    for (b, v) in s.bodies.iter().zip(expected) {
        assert_abs_diff_eq!(b.v.x, v[0], epsilon = 1e-12);
        assert_abs_diff_eq!(b.v.y, v[1], epsilon = 1e-12);
    }
    assert!(total_momentum(&s).norm() < 1e-15);
}

#[test]
fn periodic_lookup_out_of_range() {
    assert_eq!(
        periodic_triplet_reference("IA", 45),
        Err(SimError::IndexOutOfRange { family: "IA".into(), index: 45, len: 45 })
    );
    assert_eq!(
        periodic_triplet_reference("IIIA", 0),
        Err(SimError::UnknownFamily("IIIA".into()))
    );
}

#[test]
fn injected_table_from_yaml() {
    let yaml = r#"
- key: small
  entries:
    - [0.1, 0.2, 3.0]
    - [0.3, 0.4, 5.0]
"#;
    let table: OrbitTable = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(table.len(), 2);
    let (flat, period) = periodic_triplet(&table, "small", 1).unwrap();
    assert_eq!(period, 5.0);
    assert_eq!(&flat[0..5], &[1.0, -1.0, 0.0, 0.3, 0.4]);
    assert!(periodic_triplet(&table, "IA", 0).is_err());
}

#[test]
fn random_binaries_are_bound() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut max_retries = 0;
    for _ in 0..10_000 {
        let draw = random_binary(&mut rng, false);
        let s = &draw.state;
        let (m1, m2) = (s.bodies[0].m, s.bodies[1].m);
        assert!(m1 > 0.0 && m2 > 0.0);
        assert!(kinetic_energy(s) <= binary_binding_energy(m1, m2));
        assert_eq!(s.bodies[0].x, NVec2::new(1.0, 0.0));
        assert_eq!(s.bodies[1].x, NVec2::new(-1.0, 0.0));
        assert!(total_momentum(s).norm() < 1e-12);
        max_retries = max_retries.max(draw.retries);
    }
    assert!(max_retries < 10_000, "pathological retry count {max_retries}");
}

/// Replays a fixed script of uniform draws: `unbound` unbound binaries
/// (tiny masses, fast velocities) followed by bound ones forever
struct ScriptedRng {
    calls: usize,
    unbound: usize,
}

impl ScriptedRng {
    const UNBOUND: [f64; 4] = [1e-3, 1e-3, 0.9, 0.9];
    const BOUND: [f64; 4] = [0.9, 0.9, 0.02, 0.02];

    fn new(unbound: usize) -> Self {
        Self { calls: 0, unbound }
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let (draw, slot) = (self.calls / 4, self.calls % 4);
        self.calls += 1;
        let u = if draw < self.unbound { Self::UNBOUND[slot] } else { Self::BOUND[slot] };
        // `Standard` maps the top 53 bits to [0, 1)
        ((u * (1u64 << 53) as f64) as u64) << 11
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[test]
fn random_binary_retries_without_growing_the_stack() {
    const UNBOUND: usize = 1_000_000;
    let handle = std::thread::Builder::new()
        .stack_size(256 * 1024)
        .spawn(|| random_binary(&mut ScriptedRng::new(UNBOUND), false))
        .unwrap();
    let draw = handle.join().expect("generator overflowed its stack");

    assert_eq!(draw.retries, UNBOUND);
    assert_abs_diff_eq!(draw.state.bodies[0].m, 0.9, epsilon = 1e-12);
    assert_abs_diff_eq!(draw.state.bodies[1].m, 0.9, epsilon = 1e-12);
    assert_abs_diff_eq!(draw.state.bodies[0].v.x, 0.01, epsilon = 1e-12);
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn dopri45_closes_periodic_orbit() {
    let (y0, period) = periodic_triplet_reference("IA", 0).unwrap();
    let ode = NBodyDerivative::new(3, AccelSet::gravity(false));
    let params = Parameters { atol: 1e-11, rtol: 1e-11, ..test_params() };
    let (traj, stats) = dopri45_integrate(&ode, 0.0, period, &y0, &params).unwrap();

    assert_abs_diff_eq!(*traj.t.last().unwrap(), period, epsilon = 1e-12);
    assert!(stats.accepted > 10);
    let end = traj.final_state().unwrap();
    let err = closure_error(&y0, end);
    assert!(err < 1e-2, "orbit did not close: {err}");

    let e0 = total_energy(&BodyState::from_flat(&y0).unwrap());
    let e1 = total_energy(&BodyState::from_flat(end).unwrap());
    assert!((e1 - e0).abs() < 1e-7 * e0.abs(), "energy drift {}", e1 - e0);
}

#[test]
fn dopri45_reports_collision() {
    let sys = BodyState::new(vec![
        Body::new(1.0, [0.0, 0.0], [0.0, 0.0]),
        Body::new(1.0, [0.0, 0.0], [0.0, 0.0]),
    ]);
    let ode = NBodyDerivative::for_state(&sys, false);
    let res = dopri45_integrate(&ode, 0.0, 1.0, &sys.flatten(), &test_params());
    assert_eq!(res.unwrap_err(), SimError::NonFinite { t: 0.0 });
}

#[test]
fn verlet_conserves_energy_of_circular_binary() {
    // unit masses at distance 2 circle with speed 0.5
    let mut sys = BodyState::new(vec![
        Body::new(1.0, [-1.0, 0.0], [0.0, -0.5]),
        Body::new(1.0, [1.0, 0.0], [0.0, 0.5]),
    ]);
    let e0 = total_energy(&sys);
    let params = Parameters { t_end: 10.0, h0: 1e-3, ..test_params() };
    let traj = verlet_run(&mut sys, &AccelSet::gravity(false), &params);

    assert_abs_diff_eq!(sys.t, 10.0, epsilon = 1e-9);
    assert_eq!(traj.len(), 10_001);
    assert_eq!(sys.masses(), vec![1.0, 1.0]);
    assert!((total_energy(&sys) - e0).abs() < 1e-6);
    assert_abs_diff_eq!((sys.bodies[1].x - sys.bodies[0].x).norm(), 2.0, epsilon = 1e-5);
}

#[test]
fn verlet_with_unbounded_horizon_returns_immediately() {
    let mut sys = two_body_system(2.0, 1.0, 1.0);
    let start = sys.clone();
    let params = Parameters { t_end: f64::INFINITY, ..test_params() };
    let traj = verlet_run(&mut sys, &AccelSet::gravity(false), &params);

    assert_eq!(traj.len(), 1);
    assert_eq!(sys, start);
}

// ==================================================================================
// Scenario tests
// ==================================================================================

#[test]
fn scenario_periodic_defaults_to_one_period() {
    let yaml = r#"
parameters:
  h0: 0.01
  atol: 1.0e-11
  rtol: 1.0e-11
initial:
  kind: periodic
  family: IIC
  index: 1
"#;
    let cfg = ScenarioConfig::from_yaml_str(yaml).unwrap();
    let mut scenario = Scenario::build_scenario(cfg).unwrap();
    let period = scenario.period.unwrap();
    assert_abs_diff_eq!(period, 6.2854133740, epsilon = 1e-12);
    assert_eq!(scenario.parameters.t_end, period);
    assert_eq!(scenario.engine.integrator, IntegratorConfig::Dopri45);

    let start = scenario.system.flatten();
    let traj = scenario.run().unwrap();
    assert_abs_diff_eq!(scenario.system.t, period, epsilon = 1e-12);
    assert_eq!(traj.final_state().unwrap(), scenario.system.flatten().as_slice());
    assert_eq!(scenario.system.masses(), vec![1.0, 1.0, 0.5]);
    assert!(closure_error(&start, &scenario.system.flatten()).is_finite());
}

#[test]
fn scenario_random_binary_uses_seed() {
    let yaml = "parameters: { seed: 17 }\ninitial: { kind: random_binary }";
    let a = Scenario::build_scenario(ScenarioConfig::from_yaml_str(yaml).unwrap()).unwrap();
    let b = Scenario::build_scenario(ScenarioConfig::from_yaml_str(yaml).unwrap()).unwrap();
    assert_eq!(a.system, b.system);
    assert_eq!(a.period, None);
}

#[test]
fn scenario_verlet_with_explicit_bodies() {
    let yaml = r#"
engine:
  integrator: "verlet"
  parallel: true
parameters:
  t_end: 0.5
  h0: 0.01
initial:
  kind: bodies
  bodies:
    - { m: 1.0, x: [-1.0, 0.0], v: [0.0, -0.5] }
    - { m: 1.0, x: [ 1.0, 0.0], v: [0.0,  0.5] }
"#;
    let mut scenario = Scenario::build_scenario(ScenarioConfig::from_yaml_str(yaml).unwrap()).unwrap();
    let traj = scenario.run().unwrap();
    assert_eq!(traj.len(), 51);
    assert_abs_diff_eq!(scenario.system.t, 0.5, epsilon = 1e-12);
    assert!(total_momentum(&scenario.system).norm() < 1e-12);
}

#[test]
fn scenario_unknown_family_fails() {
    let cfg = ScenarioConfig::from_yaml_str("initial: { kind: periodic, family: IA, index: 100 }").unwrap();
    assert!(matches!(
        Scenario::build_scenario(cfg),
        Err(SimError::IndexOutOfRange { index: 100, .. })
    ));
}
