//! Charge-conserving cloud-in-cell deposition for scalar charge.
//!
//! The straight path from `pos0` to `pos1` is split at every cell boundary
//! it crosses. Within each piece the CIC weights are linear in time, so the
//! flux through each face is the exact time integral of the product of the
//! transverse weights. In 2D this is the area-weighting scheme (4-, 7- and
//! 10-boundary moves); in 3D it is Esirkepov's scheme with the 1/12 term.
//! The discrete continuity equation then holds in every cell.

use phyz_gauge::{Group, U1};
use tracing::warn;

use crate::deposit::DepositBuffer;
use crate::error::{PicError, Result};
use crate::grid::{CellIndex, Grid, LinkSlot};
use crate::interpolator::Interpolator;
use crate::particle::Particle;

/// Cartesian charge-conserving interpolator on a U(1) grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChargeConservingCic;

/// Boundary crossing: path parameter, axis, cell step.
type Crossing = (f64, usize, isize);

impl ChargeConservingCic {
    pub fn new() -> Self {
        Self
    }

    /// Current of a straight piece of path inside cell `base`, starting at
    /// local coordinates `s` and moving `d` (both in cells).
    fn deposit_segment<const D: usize>(
        grid: &Grid<U1, D>,
        base: [isize; D],
        s: &[f64; D],
        d: &[f64; D],
        factor: f64,
        buffer: &mut DepositBuffer<f64>,
    ) {
        for axis in 0..D {
            if d[axis] == 0.0 {
                continue;
            }
            let flux = factor * d[axis] * grid.spacing(axis);
            for corner in (0..1usize << D).filter(|c| (c >> axis) & 1 == 0) {
                let w = transverse_weight(axis, corner, s, d);
                buffer.add_j(grid.cell_index(offset(base, corner)), axis, flux * w);
            }
        }
    }
}

/// `∫₀¹ Π_{j≠axis} w_j(t) dt` with `w_j` the linear CIC weight of the node
/// selected by bit `j` of `corner`.
fn transverse_weight<const D: usize>(axis: usize, corner: usize, s: &[f64; D], d: &[f64; D]) -> f64 {
    // coefficients of a polynomial in t, degree < D
    let mut poly = [0.0; D];
    poly[0] = 1.0;
    let mut degree = 0;
    for j in (0..D).filter(|&j| j != axis) {
        let (c0, c1) = if (corner >> j) & 1 == 1 {
            (s[j], d[j])
        } else {
            (1.0 - s[j], -d[j])
        };
        for k in (0..=degree).rev() {
            let v = poly[k];
            poly[k + 1] += v * c1;
            poly[k] = v * c0;
        }
        degree += 1;
    }
    poly.iter()
        .enumerate()
        .map(|(k, c)| c / (k + 1) as f64)
        .sum()
}

/// Multilinear weight of node `corner` for local coordinates `frac`.
fn corner_weight<const D: usize>(corner: usize, frac: &[f64; D]) -> f64 {
    (0..D)
        .map(|j| {
            if (corner >> j) & 1 == 1 {
                frac[j]
            } else {
                1.0 - frac[j]
            }
        })
        .product()
}

fn offset<const D: usize>(base: [isize; D], corner: usize) -> [isize; D] {
    let mut coords = base;
    for (j, c) in coords.iter_mut().enumerate() {
        *c += ((corner >> j) & 1) as isize;
    }
    coords
}

/// Split position `u` (in cells) into floor and fraction.
fn split<const D: usize>(u: &[f64; D]) -> ([isize; D], [f64; D]) {
    let mut base = [0; D];
    let mut frac = [0.0; D];
    for i in 0..D {
        let fl = u[i].floor();
        base[i] = fl as isize;
        frac[i] = u[i] - fl;
    }
    (base, frac)
}

/// Multilinear interpolation of a nodal quantity at `u` (in cells).
fn sample<const D: usize>(grid: &Grid<U1, D>, u: &[f64; D], value: impl Fn(CellIndex) -> f64) -> f64 {
    let (base, frac) = split(u);
    (0..1usize << D)
        .map(|corner| corner_weight(corner, &frac) * value(grid.cell_index(offset(base, corner))))
        .sum()
}

impl<const D: usize> Interpolator<U1, D> for ChargeConservingCic {
    type Particle = Particle<D>;

    fn interpolate_to_grid(
        &self,
        particle: &Particle<D>,
        grid: &Grid<U1, D>,
        dt: f64,
        buffer: &mut DepositBuffer<f64>,
    ) -> Result<()> {
        let spacings = grid.spacings();
        let moved = particle.displacement();
        let mut start = [0.0; D];
        let mut delta = [0.0; D];
        for i in 0..D {
            start[i] = particle.pos0[i] / spacings[i];
            delta[i] = moved[i] / spacings[i];
            if !start[i].is_finite() || !delta[i].is_finite() || delta[i].abs() > 1.0 {
                warn!(axis = i, displacement = delta[i], "particle moved more than one cell");
                return Err(PicError::ParticleTooFast {
                    axis: i,
                    displacement: delta[i],
                });
            }
        }
        let (base, frac) = split(&start);

        // at most one crossing per axis
        let mut crossings: Vec<Crossing> = Vec::with_capacity(D);
        for i in 0..D {
            let end = frac[i] + delta[i];
            if end >= 1.0 {
                crossings.push(((1.0 - frac[i]) / delta[i], i, 1));
            } else if end < 0.0 {
                crossings.push((-frac[i] / delta[i], i, -1));
            }
        }
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let factor = particle.charge / (grid.cell_volume() * dt);
        let mut cell = base;
        let mut t0 = 0.0;
        let ends = crossings.iter().copied().chain(std::iter::once((1.0, 0, 0)));
        for (t1, axis, step) in ends {
            if t1 > t0 {
                let mut s = [0.0; D];
                let mut d = [0.0; D];
                for i in 0..D {
                    s[i] = frac[i] + delta[i] * t0 - (cell[i] - base[i]) as f64;
                    d[i] = delta[i] * (t1 - t0);
                }
                Self::deposit_segment(grid, cell, &s, &d, factor, buffer);
            }
            cell[axis] += step;
            t0 = t1;
        }
        Ok(())
    }

    fn interpolate_charge_density(
        &self,
        particle: &Particle<D>,
        grid: &Grid<U1, D>,
        buffer: &mut DepositBuffer<f64>,
    ) -> Result<()> {
        let mut u = [0.0; D];
        for i in 0..D {
            u[i] = particle.pos1[i] / grid.spacing(i);
        }
        let (base, frac) = split(&u);
        let q = particle.charge / grid.cell_volume();
        for corner in 0..1usize << D {
            buffer.add_rho(grid.cell_index(offset(base, corner)), q * corner_weight(corner, &frac));
        }
        Ok(())
    }

    /// Samples `E` and the time-averaged `F_ij` at `pos1`.
    fn interpolate_to_particle(&self, particle: &mut Particle<D>, grid: &Grid<U1, D>) -> Result<()> {
        let mut u = [0.0; D];
        for i in 0..D {
            u[i] = particle.pos1[i] / grid.spacing(i);
        }

        // E_i lives at x + a_i/2
        for i in 0..D {
            let mut shifted = u;
            shifted[i] -= 0.5;
            particle.e[i] = sample(grid, &shifted, |x| grid.e(x, i));
        }

        // F_ij lives at the plaquette center x + (a_i + a_j)/2
        for i in 0..D {
            particle.f[i][i] = 0.0;
            for j in i + 1..D {
                let mut shifted = u;
                shifted[i] -= 0.5;
                shifted[j] -= 0.5;
                let area = grid.spacing(i) * grid.spacing(j);
                let fij = sample(grid, &shifted, |x| {
                    let now = grid.plaquette(x, i, j, LinkSlot::Current).log();
                    let next = grid.plaquette(x, i, j, LinkSlot::Next).log();
                    0.5 * (now + next) / area
                });
                particle.f[i][j] = fij;
                particle.f[j][i] = -fij;
            }
        }
        Ok(())
    }
}
