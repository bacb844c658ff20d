//! Deterministic deposition passes.
//!
//! Each particle produces its own [`DepositBuffer`] from a read-only view of
//! the grid. Buffers are computed serially or with rayon, then applied on one
//! thread in particle order, so the summation order never depends on
//! scheduling. A pass that fails for any particle leaves the grid untouched.

use phyz_gauge::{Group, LieAlgebra};
use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::grid::{CellIndex, Grid};
use crate::interpolator::Interpolator;

/// Field a contribution is added to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositTarget {
    /// Current along the given axis.
    Current(usize),
    ChargeDensity,
}

/// One additive contribution to a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deposit<A> {
    pub cell: CellIndex,
    pub target: DepositTarget,
    pub value: A,
}

/// Ordered list of contributions from a single particle.
#[derive(Debug, Clone, Default)]
pub struct DepositBuffer<A> {
    deposits: Vec<Deposit<A>>,
}

impl<A: LieAlgebra> DepositBuffer<A> {
    pub fn new() -> Self {
        Self {
            deposits: Vec::new(),
        }
    }

    pub fn add_j(&mut self, cell: CellIndex, axis: usize, value: A) {
        self.deposits.push(Deposit {
            cell,
            target: DepositTarget::Current(axis),
            value,
        });
    }

    pub fn add_rho(&mut self, cell: CellIndex, value: A) {
        self.deposits.push(Deposit {
            cell,
            target: DepositTarget::ChargeDensity,
            value,
        });
    }

    pub fn len(&self) -> usize {
        self.deposits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deposits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Deposit<A>> {
        self.deposits.iter()
    }

    /// Sum of all current contributions along `axis`.
    pub fn total_current(&self, axis: usize) -> A {
        self.sum_where(|target| target == DepositTarget::Current(axis))
    }

    /// Sum of all charge density contributions.
    pub fn total_charge_density(&self) -> A {
        self.sum_where(|target| target == DepositTarget::ChargeDensity)
    }

    fn sum_where(&self, keep: impl Fn(DepositTarget) -> bool) -> A {
        let mut total = A::zero();
        for deposit in self.deposits.iter().filter(|d| keep(d.target)) {
            total += deposit.value;
        }
        total
    }
}

/// Run `f` for every particle, each into a fresh buffer, preserving order.
fn collect_buffers<P, A, F>(particles: &[P], parallel: bool, f: F) -> Result<Vec<DepositBuffer<A>>>
where
    P: Sync,
    A: LieAlgebra,
    F: Fn(&P, &mut DepositBuffer<A>) -> Result<()> + Sync,
{
    let run = |particle: &P| -> Result<DepositBuffer<A>> {
        let mut buffer = DepositBuffer::new();
        f(particle, &mut buffer)?;
        Ok(buffer)
    };
    if parallel {
        particles.par_iter().map(run).collect()
    } else {
        particles.iter().map(run).collect()
    }
}

/// Replace J on the whole grid with the deposit of `particles`.
pub fn deposit_current<G, const D: usize, I>(
    grid: &mut Grid<G, D>,
    interpolator: &I,
    particles: &[I::Particle],
    dt: f64,
    parallel: bool,
) -> Result<()>
where
    G: Group,
    I: Interpolator<G, D>,
{
    let view = &*grid;
    let buffers = collect_buffers(particles, parallel, |p, buffer| {
        interpolator.interpolate_to_grid(p, view, dt, buffer)
    })?;

    grid.reset_current();
    for buffer in &buffers {
        grid.apply_deposits(buffer);
    }
    debug!(
        particles = particles.len(),
        deposits = buffers.iter().map(DepositBuffer::len).sum::<usize>(),
        parallel,
        "current deposition"
    );
    Ok(())
}

/// Replace rho on the whole grid with the deposit of `particles`.
pub fn deposit_charge_density<G, const D: usize, I>(
    grid: &mut Grid<G, D>,
    interpolator: &I,
    particles: &[I::Particle],
    parallel: bool,
) -> Result<()>
where
    G: Group,
    I: Interpolator<G, D>,
{
    let view = &*grid;
    let buffers = collect_buffers(particles, parallel, |p, buffer| {
        interpolator.interpolate_charge_density(p, view, buffer)
    })?;

    grid.reset_charge_density();
    for buffer in &buffers {
        grid.apply_deposits(buffer);
    }
    debug!(
        particles = particles.len(),
        deposits = buffers.iter().map(DepositBuffer::len).sum::<usize>(),
        parallel,
        "charge density deposition"
    );
    Ok(())
}

/// Sample grid fields into every particle.
pub fn gather<G, const D: usize, I>(
    grid: &Grid<G, D>,
    interpolator: &I,
    particles: &mut [I::Particle],
    parallel: bool,
) -> Result<()>
where
    G: Group,
    I: Interpolator<G, D>,
{
    if parallel {
        particles
            .par_iter_mut()
            .try_for_each(|p| interpolator.interpolate_to_particle(p, grid))?;
    } else {
        for p in particles.iter_mut() {
            interpolator.interpolate_to_particle(p, grid)?;
        }
    }
    debug!(particles = particles.len(), parallel, "field gather");
    Ok(())
}
