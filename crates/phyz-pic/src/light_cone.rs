//! Color current of a charge sheet moving at the speed of light.
//!
//! A charge density is sampled onto `ppc` particles per cell that move along
//! one axis with `|v| = 1`, so every particle crosses exactly one cell in
//! `ppc` steps. Sampling a smooth density with equal charges per cell leaves
//! a staircase; the refinement passes redistribute charge between
//! neighbouring particles of the same cell to remove it without changing the
//! charge carried by each cell.

use phyz_gauge::{Group, LieAlgebra};
use tracing::info;

use crate::cgc::CgcInterpolator;
use crate::config::{LightConeConfig, default_cutoff_factor, default_refinement_iterations};
use crate::deposit::{deposit_charge_density, deposit_current, gather};
use crate::error::{PicError, Result};
use crate::grid::Grid;
use crate::particle::CgcParticle;

/// Offset from the cell origin that keeps particles off cell boundaries.
const ROUND_OFF: f64 = 1e-11;

/// `i mod n` for possibly negative `i`.
#[inline]
fn periodic(i: isize, n: usize) -> usize {
    i.rem_euclid(n as isize) as usize
}

/// Number of particles per cell, `floor(spacing/dt)`.
pub fn particles_per_cell(spacing: f64, dt: f64) -> Result<usize> {
    if !(dt > 0.0) || !dt.is_finite() {
        return Err(PicError::InvalidParameter(format!("dt must be positive, got {dt}")));
    }
    if dt > spacing {
        return Err(PicError::InvalidParameter(format!(
            "light-cone particles cross more than one cell per step: dt = {dt} > spacing = {spacing}"
        )));
    }
    Ok((spacing / dt).floor() as usize)
}

/// Second-order smoothing of the charges on one line.
///
/// Moves `(−Q[i−1] + 3Q[i] − 3Q[i+1] + Q[i+2])/4` from `i` to `i+1`. The last
/// particle of each cell is skipped so charge never crosses a cell.
fn refine2<A: LieAlgebra>(charges: &mut [A], ppc: usize) {
    let n = charges.len();
    for i in 0..n {
        if i % ppc == ppc - 1 {
            continue;
        }
        let at = |k: isize| periodic(i as isize + k, n);
        let (q0, q1, q2, q3) = (charges[at(-1)], charges[at(0)], charges[at(1)], charges[at(2)]);
        let dq = (-q0 + q1 * 3.0 - q2 * 3.0 + q3) * 0.25;
        charges[at(0)] -= dq;
        charges[at(1)] += dq;
    }
}

/// Fourth-order smoothing, moving
/// `(Q[i−2] − 5Q[i−1] + 10Q[i] − 10Q[i+1] + 5Q[i+2] − Q[i+3])/12` from `i`
/// to `i+1`.
fn refine4<A: LieAlgebra>(charges: &mut [A], ppc: usize) {
    let n = charges.len();
    for i in 0..n {
        if i % ppc == ppc - 1 {
            continue;
        }
        let at = |k: isize| periodic(i as isize + k, n);
        let dq = (charges[at(-2)] - charges[at(-1)] * 5.0 + charges[at(0)] * 10.0
            - charges[at(1)] * 10.0
            + charges[at(2)] * 5.0
            - charges[at(3)])
            * (1.0 / 12.0);
        charges[at(0)] -= dq;
        charges[at(1)] += dq;
    }
}

/// Samples a charge density onto light-like [`CgcParticle`]s.
#[derive(Debug, Clone)]
pub struct LightConeGenerator {
    /// Axis of motion.
    pub direction: usize,
    /// +1 or −1.
    pub orientation: i32,
    /// Coupling g, only used to scale the cutoff.
    pub coupling: f64,
    /// Passes of each refinement order.
    pub refinement_iterations: usize,
    /// Particles with `|Q|² ≤ cutoff_factor·(g·a)²/(a³·ppc)` are dropped.
    pub cutoff_factor: f64,
}

impl LightConeGenerator {
    pub fn new(direction: usize, orientation: i32, coupling: f64) -> Result<Self> {
        if orientation != 1 && orientation != -1 {
            return Err(PicError::InvalidParameter(format!(
                "orientation must be +1 or -1, got {orientation}"
            )));
        }
        Ok(Self {
            direction,
            orientation,
            coupling,
            refinement_iterations: default_refinement_iterations(),
            cutoff_factor: default_cutoff_factor(),
        })
    }

    pub fn from_config(config: &LightConeConfig, coupling: f64) -> Result<Self> {
        let mut generator = Self::new(config.direction, config.orientation, coupling)?;
        generator.refinement_iterations = config.refinement_iterations;
        generator.cutoff_factor = config.cutoff_factor;
        Ok(generator)
    }

    /// Particles reproducing `density` (one entry per cell, storage order).
    ///
    /// Particles start at `t = 0` and have `pos1` one step of `dt` ahead.
    /// Both charges are equal and in the frame of the starting cell.
    pub fn generate<G: Group, const D: usize>(
        &self,
        grid: &Grid<G, D>,
        density: &[G::Algebra],
        dt: f64,
    ) -> Result<Vec<CgcParticle<G, D>>> {
        let dir = self.direction;
        if dir >= D {
            return Err(PicError::InvalidParameter(format!(
                "direction {dir} out of range for {D} dimensions"
            )));
        }
        if density.len() != grid.len() {
            return Err(PicError::InvalidParameter(format!(
                "density has {} cells, grid has {}",
                density.len(),
                grid.len()
            )));
        }
        let a = grid.spacing(dir);
        let ppc = particles_per_cell(a, dt)?;
        let volume = grid.cell_volume();
        let length = grid.num_cells()[dir];
        let speed = f64::from(self.orientation);

        // Lines along `dir`, each stored contiguously in longitudinal order.
        let mut particles: Vec<CgcParticle<G, D>> = Vec::with_capacity(grid.len() * ppc);
        for root in grid.indices().filter(|&x| grid.coordinates(x)[dir] == 0) {
            let line_start = particles.len();
            for n in 0..length {
                let cell = grid.shift(root, dir, n as isize);
                let coords = grid.coordinates(cell);
                let charge = density[cell.as_usize()] * (volume / ppc as f64);
                for j in 0..ppc {
                    let dz = (j as f64 - (ppc / 2) as f64) / ppc as f64 * a;
                    let mut pos0 = grid.spacings();
                    for (x, &c) in pos0.iter_mut().zip(&coords) {
                        *x = *x * c as f64 + ROUND_OFF * a;
                    }
                    pos0[dir] += dz;
                    particles.push(CgcParticle::new(pos0, dir, speed, dt, charge)?);
                }
            }
            self.refine(&mut particles[line_start..], ppc);
        }

        let created = particles.len();
        let cutoff = self.cutoff_factor * (self.coupling * a).powi(2) / (a.powi(3) * ppc as f64);
        particles.retain(|p| p.q0.square_norm() > cutoff);
        info!(
            ppc,
            created,
            dropped = created - particles.len(),
            "light-cone particles generated"
        );
        Ok(particles)
    }

    fn refine<G: Group, const D: usize>(&self, line: &mut [CgcParticle<G, D>], ppc: usize) {
        let mut charges: Vec<G::Algebra> = line.iter().map(|p| p.q0).collect();
        for _ in 0..self.refinement_iterations {
            refine2(&mut charges, ppc);
        }
        for _ in 0..self.refinement_iterations {
            refine4(&mut charges, ppc);
        }
        for (p, q) in line.iter_mut().zip(charges) {
            p.q0 = q;
            p.q1 = q;
        }
    }
}

/// Light-cone particles driven through the CGC interpolator.
#[derive(Debug, Clone)]
pub struct LightConeCurrent<G: Group, const D: usize> {
    pub particles: Vec<CgcParticle<G, D>>,
    pub interpolator: CgcInterpolator,
    pub parallel: bool,
}

impl<G: Group, const D: usize> LightConeCurrent<G, D> {
    pub fn new(particles: Vec<CgcParticle<G, D>>, parallel: bool) -> Self {
        Self {
            particles,
            interpolator: CgcInterpolator::new(),
            parallel,
        }
    }

    /// Transport the charges for the first step and deposit rho and J.
    pub fn initialize(&mut self, grid: &mut Grid<G, D>, dt: f64) -> Result<()> {
        gather(grid, &self.interpolator, &mut self.particles, self.parallel)?;
        for p in &mut self.particles {
            p.update_charge();
        }
        self.deposit(grid, dt)
    }

    /// Advance one step and replace rho and J with the new deposit.
    ///
    /// Particles that left the simulation volume are removed first.
    pub fn apply_current(&mut self, grid: &mut Grid<G, D>, dt: f64) -> Result<()> {
        for p in &mut self.particles {
            p.advance(dt);
        }
        gather(grid, &self.interpolator, &mut self.particles, self.parallel)?;
        for p in &mut self.particles {
            p.update_charge();
        }
        let mut extent = [0.0; D];
        for (i, e) in extent.iter_mut().enumerate() {
            *e = grid.extent(i);
        }
        self.particles.retain(|p| !p.is_outside(&extent));
        self.deposit(grid, dt)
    }

    fn deposit(&self, grid: &mut Grid<G, D>, dt: f64) -> Result<()> {
        deposit_charge_density(grid, &self.interpolator, &self.particles, self.parallel)?;
        deposit_current(grid, &self.interpolator, &self.particles, dt, self.parallel)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
