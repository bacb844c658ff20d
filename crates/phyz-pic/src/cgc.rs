//! Parallel-transported current deposition for color charges on fixed
//! light-like trajectories.
//!
//! A particle moves along one lattice axis and sits on the nearest grid
//! point (NGP) of every transverse axis. Its charge is stored in the color
//! frame of its longitudinal NGP. Moving a charge from site `n` to `n + 1`
//! conjugates it with the link between them, `Q ↦ U† Q U`, and the reverse
//! move uses `Q ↦ U Q U†`. Currents are expressed in the frame of the site
//! the link starts from, which keeps the covariant continuity equation exact.

use phyz_gauge::Group;
use tracing::warn;

use crate::deposit::DepositBuffer;
use crate::error::{PicError, Result};
use crate::grid::{CellIndex, Grid};
use crate::interpolator::Interpolator;
use crate::particle::CgcParticle;

/// Interpolator for [`CgcParticle`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct CgcInterpolator;

/// Nearest grid point of a position in cells.
#[inline]
fn nearest(u: f64) -> isize {
    (u + 0.5).floor() as isize
}

/// Floor index and fraction of a position in cells.
#[inline]
fn split(u: f64) -> (isize, f64) {
    let n = u.floor();
    (n as isize, u - n)
}

/// `exp((log U + log Unext)/2)`.
fn averaged_link<G: Group>(u: G, u_next: G) -> G {
    if u == u_next {
        u
    } else {
        G::exp(&((u.log() + u_next.log()) * 0.5))
    }
}

/// Longitudinal line of cells a particle moves along.
struct Line<'a, G: Group, const D: usize> {
    grid: &'a Grid<G, D>,
    coords: [isize; D],
    direction: usize,
}

impl<'a, G: Group, const D: usize> Line<'a, G, D> {
    fn new(grid: &'a Grid<G, D>, particle: &CgcParticle<G, D>) -> Self {
        let mut coords = [0; D];
        for (i, c) in coords.iter_mut().enumerate() {
            *c = nearest(particle.pos0[i] / grid.spacing(i));
        }
        Self {
            grid,
            coords,
            direction: particle.direction,
        }
    }

    fn cell(&self, n: isize) -> CellIndex {
        let mut coords = self.coords;
        coords[self.direction] = n;
        self.grid.cell_index(coords)
    }

    /// Express `q`, stored at its NGP `ngp`, in the frame of floor site `n`.
    fn to_floor_frame(&self, q: G::Algebra, ngp: isize, n: isize) -> G::Algebra {
        if ngp == n {
            q
        } else {
            self.grid.u_next(self.cell(n), self.direction).act(&q)
        }
    }
}

impl CgcInterpolator {
    pub fn new() -> Self {
        Self
    }

    /// Longitudinal positions in cells, rejecting moves longer than a cell.
    fn longitudinal<G: Group, const D: usize>(particle: &CgcParticle<G, D>, grid: &Grid<G, D>) -> Result<(f64, f64)> {
        let a = grid.spacing(particle.direction);
        let u0 = particle.pos0[particle.direction] / a;
        let u1 = particle.pos1[particle.direction] / a;
        let displacement = u1 - u0;
        if !u0.is_finite() || !u1.is_finite() || displacement.abs() > 1.0 {
            warn!(axis = particle.direction, displacement, "particle moved more than one cell");
            return Err(PicError::ParticleTooFast {
                axis: particle.direction,
                displacement,
            });
        }
        Ok((u0, u1))
    }
}

impl<G: Group, const D: usize> Interpolator<G, D> for CgcInterpolator {
    type Particle = CgcParticle<G, D>;

    fn interpolate_to_grid(
        &self,
        particle: &CgcParticle<G, D>,
        grid: &Grid<G, D>,
        dt: f64,
        buffer: &mut DepositBuffer<G::Algebra>,
    ) -> Result<()> {
        let (u0, u1) = Self::longitudinal(particle, grid)?;
        let (n0, d0) = split(u0);
        let (n1, d1) = split(u1);
        let line = Line::new(grid, particle);
        let dir = particle.direction;
        let factor = grid.spacing(dir) / (grid.cell_volume() * dt);

        let old = line.to_floor_frame(particle.q0, nearest(u0), n0);
        match n1 - n0 {
            0 => buffer.add_j(line.cell(n0), dir, old * ((d1 - d0) * factor)),
            1 => {
                let new = line.to_floor_frame(particle.q1, nearest(u1), n1);
                buffer.add_j(line.cell(n0), dir, old * ((1.0 - d0) * factor));
                buffer.add_j(line.cell(n1), dir, new * (d1 * factor));
            }
            -1 => {
                let new = line.to_floor_frame(particle.q1, nearest(u1), n1);
                buffer.add_j(line.cell(n0), dir, old * (-d0 * factor));
                buffer.add_j(line.cell(n1), dir, new * (-(1.0 - d1) * factor));
            }
            steps => {
                return Err(PicError::ParticleTooFast {
                    axis: dir,
                    displacement: steps as f64,
                });
            }
        }
        Ok(())
    }

    fn interpolate_charge_density(
        &self,
        particle: &CgcParticle<G, D>,
        grid: &Grid<G, D>,
        buffer: &mut DepositBuffer<G::Algebra>,
    ) -> Result<()> {
        let dir = particle.direction;
        let u = particle.pos1[dir] / grid.spacing(dir);
        if !u.is_finite() {
            return Err(PicError::InvalidParameter(format!("non-finite position {u}")));
        }
        let (n, d) = split(u);
        let line = Line::new(grid, particle);
        let here = line.cell(n);
        let link = averaged_link(grid.u(here, dir), grid.u_next(here, dir));

        let charge = if nearest(u) == n {
            particle.q1
        } else {
            link.act(&particle.q1)
        };
        let volume = grid.cell_volume();
        buffer.add_rho(here, charge * ((1.0 - d) / volume));
        buffer.add_rho(line.cell(n + 1), link.adj().act(&charge) * (d / volume));
        Ok(())
    }

    /// Caches the link that carries the charge to its new NGP.
    fn interpolate_to_particle(&self, particle: &mut CgcParticle<G, D>, grid: &Grid<G, D>) -> Result<()> {
        let (u0, u1) = Self::longitudinal(particle, grid)?;
        let (g0, g1) = (nearest(u0), nearest(u1));
        let line = Line::new(grid, particle);
        let dir = particle.direction;

        let (transport, moved) = match g1 - g0 {
            0 => (G::identity(), false),
            1 => (grid.u_next(line.cell(g0), dir), true),
            -1 => (grid.u_next(line.cell(g1), dir).adj(), true),
            steps => {
                return Err(PicError::ParticleTooFast {
                    axis: dir,
                    displacement: steps as f64,
                });
            }
        };
        particle.transport = transport;
        particle.update_charge = moved;
        Ok(())
    }
}
