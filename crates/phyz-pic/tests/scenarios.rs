//! End-to-end deposition scenarios for phyz-pic.

use approx::assert_abs_diff_eq;
use phyz_gauge::{Group, LieAlgebra, SU2, SU3, Su2Algebra, Su3Algebra, U1};
use phyz_pic::{
    CgcInterpolator, CgcParticle, ChargeConservingCic, ConservationMonitor, ConservationState, GridConfig,
    GroupKind, Grid, LightConeConfig, LinkSlot, LightConeCurrent, LightConeGenerator, Particle, PicError, SimulationConfig,
    conservation, deposit_charge_density, deposit_current, gather,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

fn cartesian_step(from: [f64; 2], to: [f64; 2]) -> Grid<U1, 2> {
    let mut grid = Grid::<U1, 2>::new([10, 10], [1.0, 1.0]).unwrap();
    let p = Particle::moving(from, to, 1.0, 1.0, 1.0);
    deposit_current(&mut grid, &ChargeConservingCic, &[p], 1.0, false).unwrap();
    grid
}

fn random_su2_particles(rng: &mut StdRng, count: usize, dt: f64) -> Vec<CgcParticle<SU2, 2>> {
    (0..count)
        .map(|_| {
            let pos = [rng.gen_range(0.0..8.0), rng.gen_range(0.0..6.0)];
            let direction = rng.gen_range(0..2);
            let speed = if rng.r#gen::<bool>() { 1.0 } else { -1.0 };
            let q = Su2Algebra::from_fn(|_| rng.sample(StandardNormal));
            CgcParticle::new(pos, direction, speed, dt, q).unwrap()
        })
        .collect()
}

/// Advance every particle one step, transport its charge and redeposit rho and J.
fn cgc_step<G: Group>(grid: &mut Grid<G, 2>, particles: &mut [CgcParticle<G, 2>], dt: f64, parallel: bool) {
    let interp = CgcInterpolator::new();
    for p in particles.iter_mut() {
        p.advance(dt);
    }
    gather(grid, &interp, particles, parallel).unwrap();
    for p in particles.iter_mut() {
        p.update_charge();
    }
    deposit_charge_density(grid, &interp, particles, parallel).unwrap();
    deposit_current(grid, &interp, particles, dt, parallel).unwrap();
}

#[test]
fn test_scenario_a_area_weighting() {
    let grid = cartesian_step([4.8, 4.8], [4.8, 5.2]);
    let mut total_x = 0.0;
    let mut total_y = 0.0;
    let mut columns = Vec::new();
    for x in grid.indices() {
        let [cx, cy] = grid.coordinates(x);
        total_x += grid.j(x, 0).abs();
        total_y += grid.j(x, 1);
        if grid.j(x, 1) != 0.0 {
            assert!(cy == 4 || cy == 5, "Jy in row {cy}");
            columns.push(cx);
        }
    }
    assert_abs_diff_eq!(total_y, 0.4, epsilon = 1e-14);
    assert_eq!(total_x, 0.0);

    // the charge straddles x = 5, so both columns carry current
    columns.sort_unstable();
    columns.dedup();
    assert_eq!(columns, vec![4, 5]);
    assert_abs_diff_eq!(grid.j(grid.cell_index([4, 4]), 1), 0.2 * 0.2, epsilon = 1e-14);
    assert_abs_diff_eq!(grid.j(grid.cell_index([5, 5]), 1), 0.8 * 0.2, epsilon = 1e-14);
}

#[test]
fn test_scenario_b_diagonal_move() {
    let grid = cartesian_step([5.0, 5.0], [5.7, 5.7]);
    let total_x: f64 = grid.indices().map(|x| grid.j(x, 0)).sum();
    let total_y: f64 = grid.indices().map(|x| grid.j(x, 1)).sum();
    assert_abs_diff_eq!(total_x, 0.7, epsilon = 1e-14);
    assert_abs_diff_eq!(total_y, 0.7, epsilon = 1e-14);

    let touched = grid
        .indices()
        .filter(|&x| grid.j(x, 0) != 0.0 || grid.j(x, 1) != 0.0)
        .count();
    assert_eq!(touched, 3);
    assert_abs_diff_eq!(grid.j(grid.cell_index([5, 5]), 0), 0.455, epsilon = 1e-14);
    assert_abs_diff_eq!(grid.j(grid.cell_index([5, 6]), 0), 0.245, epsilon = 1e-14);
}

#[test]
fn test_scenario_c_gauge_covariance() {
    let mut rng = StdRng::seed_from_u64(2024);
    let dt = 0.3;
    let mut grid = Grid::<SU2, 2>::new([8, 6], [1.0, 1.0]).unwrap();
    grid.randomize_links(&mut rng);
    let particles = random_su2_particles(&mut rng, 20, dt);

    // rotate everything by a global Ω
    let omega = SU2::random(&mut rng);
    let mut rotated_grid = grid.clone();
    for x in grid.indices() {
        for axis in 0..2 {
            let u = omega.mul(&grid.u(x, axis)).mul(&omega.adj());
            rotated_grid.set_link(x, axis, LinkSlot::Current, u);
            rotated_grid.set_link(x, axis, LinkSlot::Next, u);
        }
    }
    let mut rotated: Vec<_> = particles
        .iter()
        .map(|p| CgcParticle {
            q0: omega.act(&p.q0),
            q1: omega.act(&p.q1),
            ..p.clone()
        })
        .collect();
    let mut particles = particles;

    cgc_step(&mut grid, &mut particles, dt, false);
    cgc_step(&mut rotated_grid, &mut rotated, dt, false);

    for x in grid.indices() {
        for axis in 0..2 {
            let expected = omega.act(&grid.j(x, axis));
            assert!((rotated_grid.j(x, axis) - expected).square_norm() < 1e-22);
        }
        let expected = omega.act(&grid.rho(x));
        assert!((rotated_grid.rho(x) - expected).square_norm() < 1e-22);
    }
}

#[test]
fn test_parallel_matches_serial_bitwise() {
    let mut rng = StdRng::seed_from_u64(77);
    let dt = 0.2;
    let mut grid = Grid::<SU3, 2>::new([8, 6], [1.0, 0.5]).unwrap();
    grid.randomize_links(&mut rng);
    let particles: Vec<CgcParticle<SU3, 2>> = (0..500)
        .map(|_| {
            let pos = [rng.gen_range(0.0..8.0), rng.gen_range(0.0..3.0)];
            let q = Su3Algebra::from_fn(|_| rng.sample(StandardNormal));
            CgcParticle::new(pos, 0, 1.0, dt, q).unwrap()
        })
        .collect();

    let mut serial_grid = grid.clone();
    let mut serial = particles.clone();
    cgc_step(&mut serial_grid, &mut serial, dt, false);

    let mut parallel_grid = grid;
    let mut parallel = particles;
    cgc_step(&mut parallel_grid, &mut parallel, dt, true);

    for x in serial_grid.indices() {
        assert_eq!(serial_grid.rho(x), parallel_grid.rho(x));
        for axis in 0..2 {
            assert_eq!(serial_grid.j(x, axis), parallel_grid.j(x, axis));
        }
    }
    for (a, b) in serial.iter().zip(&parallel) {
        assert_eq!(a.q1, b.q1);
    }
}

#[test]
fn test_failed_pass_leaves_grid_untouched() {
    let mut grid = Grid::<U1, 2>::new([6, 6], [1.0, 1.0]).unwrap();
    let good = Particle::moving([1.2, 1.2], [1.6, 1.9], 0.5, 1.0, 1.0);
    deposit_current(&mut grid, &ChargeConservingCic, &[good.clone()], 0.5, false).unwrap();
    deposit_charge_density(&mut grid, &ChargeConservingCic, &[good.clone()], false).unwrap();
    let before = grid.clone();

    let fast = Particle::moving([3.0, 3.0], [4.5, 3.0], 0.5, 1.0, 1.0);
    for parallel in [false, true] {
        let err = deposit_current(&mut grid, &ChargeConservingCic, &[good.clone(), fast.clone()], 0.5, parallel);
        assert!(matches!(err, Err(PicError::ParticleTooFast { axis: 0, .. })));
    }
    for x in grid.indices() {
        assert_eq!(grid.rho(x), before.rho(x));
        assert_eq!(grid.j(x, 0), before.j(x, 0));
        assert_eq!(grid.j(x, 1), before.j(x, 1));
    }
}

#[test]
fn test_reset_idempotence() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut grid = Grid::<SU2, 2>::new([8, 6], [1.0, 1.0]).unwrap();
    grid.randomize_links(&mut rng);
    let mut particles = random_su2_particles(&mut rng, 10, 0.25);
    cgc_step(&mut grid, &mut particles, 0.25, false);
    let once = grid.clone();

    // depositing the same particles again replaces, not accumulates
    let interp = CgcInterpolator::new();
    deposit_current(&mut grid, &interp, &particles, 0.25, false).unwrap();
    for x in grid.indices() {
        assert_eq!(grid.j(x, 0), once.j(x, 0));
    }

    deposit_current(&mut grid, &interp, &[], 0.25, false).unwrap();
    deposit_charge_density(&mut grid, &interp, &[], false).unwrap();
    for x in grid.indices() {
        assert_eq!(grid.rho(x), Su2Algebra::zero());
        assert_eq!(grid.j(x, 0), Su2Algebra::zero());
        assert_eq!(grid.j(x, 1), Su2Algebra::zero());
    }
}

#[test]
fn test_gauss_law_preserved_over_steps() {
    let mut rng = StdRng::seed_from_u64(8);
    let dt = 0.25;
    let mut grid = Grid::<SU2, 2>::new([8, 6], [1.0, 1.0]).unwrap();
    grid.randomize_links(&mut rng);
    let mut particles = random_su2_particles(&mut rng, 30, dt);
    let interp = CgcInterpolator::new();
    deposit_charge_density(&mut grid, &interp, &particles, false).unwrap();
    let baseline = ConservationState::new(&grid);

    for _ in 0..10 {
        let rho_old = grid.charge_density_snapshot();
        cgc_step(&mut grid, &mut particles, dt, false);
        grid.subtract_current_from_field(dt);
        let monitor = ConservationMonitor::check(&baseline, &rho_old, &grid, dt).unwrap();
        assert!(!monitor.is_violated(1e-12, 1e-11), "{monitor:?}");
        grid.swap_links();
    }
}

#[test]
fn test_light_cone_from_config() {
    let config = SimulationConfig {
        group: GroupKind::Su3,
        grid: GridConfig {
            num_cells: vec![12, 4],
            spacing: vec![1.0, 1.0],
        },
        dt: 0.5,
        coupling: 2.0,
        parallel: true,
        light_cone: Some(LightConeConfig {
            direction: 0,
            orientation: 1,
            refinement_iterations: 20,
            cutoff_factor: 1e-21,
        }),
    };
    config.validate().unwrap();

    let mut rng = StdRng::seed_from_u64(12);
    let mut grid = Grid::<SU3, 2>::from_config(&config.grid).unwrap();
    let density: Vec<Su3Algebra> = grid
        .indices()
        .map(|_| Su3Algebra::from_fn(|_| rng.gen_range(-1.0..1.0)))
        .collect();
    let expected = density.iter().fold(Su3Algebra::zero(), |acc, q| acc + *q);

    let lc = config.light_cone.as_ref().unwrap();
    let generator = LightConeGenerator::from_config(lc, config.coupling).unwrap();
    let particles = generator.generate(&grid, &density, config.dt).unwrap();
    assert_eq!(particles.len(), grid.len() * 2);
    let sampled = particles.iter().fold(Su3Algebra::zero(), |acc, p| acc + p.q0);
    assert!((sampled - expected).square_norm() < 1e-24);

    // identity links: the deposit keeps every charge unrotated
    let mut current = LightConeCurrent::new(particles, config.parallel);
    current.initialize(&mut grid, config.dt).unwrap();
    let total = conservation::total_charge(&grid);
    assert!((total - expected).square_norm() < 1e-20);
}
