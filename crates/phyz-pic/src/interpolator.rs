//! Particle ↔ grid coupling.

use phyz_gauge::Group;

use crate::deposit::DepositBuffer;
use crate::error::Result;
use crate::grid::Grid;

/// Couples one particle species to a grid.
///
/// Deposits go into a per-particle buffer instead of the grid itself, so
/// implementations only ever see the grid read-only and can run in parallel.
pub trait Interpolator<G: Group, const D: usize>: Sync {
    type Particle: Send + Sync;

    /// Current produced by the move from the pre-step to the post-step position.
    fn interpolate_to_grid(
        &self,
        particle: &Self::Particle,
        grid: &Grid<G, D>,
        dt: f64,
        buffer: &mut DepositBuffer<G::Algebra>,
    ) -> Result<()>;

    /// Charge density at the post-step position.
    fn interpolate_charge_density(
        &self,
        particle: &Self::Particle,
        grid: &Grid<G, D>,
        buffer: &mut DepositBuffer<G::Algebra>,
    ) -> Result<()>;

    /// Sample fields (or transport links) back into the particle.
    fn interpolate_to_particle(&self, particle: &mut Self::Particle, grid: &Grid<G, D>) -> Result<()>;
}
