//! Charge conservation diagnostics.
//!
//! Tracks the discrete continuity equation and the Gauss-law constraint to
//! detect deposition errors and drift.

use phyz_gauge::{Group, LieAlgebra};
use tracing::warn;

use crate::error::{PicError, Result};
use crate::grid::{CellIndex, Grid};

/// Covariant backward difference `X(x) − U†(x−î) X(x−î) U(x−î)`, summed over
/// axes and divided by the spacing.
fn covariant_divergence<G: Group, const D: usize>(
    grid: &Grid<G, D>,
    x: CellIndex,
    field: impl Fn(CellIndex, usize) -> G::Algebra,
    link: impl Fn(CellIndex, usize) -> G,
) -> G::Algebra {
    let mut div = <G::Algebra as LieAlgebra>::zero();
    for axis in 0..D {
        let back = grid.shift(x, axis, -1);
        let transported = link(back, axis).adj().act(&field(back, axis));
        div += (field(x, axis) - transported) * (1.0 / grid.spacing(axis));
    }
    div
}

/// `rho(t+dt) − rho(t) + dt·div J` per cell, with the current transported
/// by `Unext`.
///
/// `rho_old` is a snapshot taken before the step (see
/// [`Grid::charge_density_snapshot`]).
pub fn continuity_residual<G: Group, const D: usize>(
    rho_old: &[G::Algebra],
    grid: &Grid<G, D>,
    dt: f64,
) -> Result<Vec<G::Algebra>> {
    if rho_old.len() != grid.len() {
        return Err(PicError::InvalidParameter(format!(
            "charge density snapshot has {} cells, grid has {}",
            rho_old.len(),
            grid.len()
        )));
    }
    Ok(grid
        .indices()
        .map(|x| {
            let div = covariant_divergence(grid, x, |y, i| grid.j(y, i), |y, i| grid.u_next(y, i));
            grid.rho(x) - rho_old[x.as_usize()] + div * dt
        })
        .collect())
}

/// Gauss-law violation `div E − rho` per cell, with `E` transported by `U`.
///
/// For fields without charges this is the charge density the fields require.
pub fn gauss_violation<G: Group, const D: usize>(grid: &Grid<G, D>) -> Vec<G::Algebra> {
    grid.indices()
        .map(|x| covariant_divergence(grid, x, |y, i| grid.e(y, i), |y, i| grid.u(y, i)) - grid.rho(x))
        .collect()
}

/// Total charge `Σ rho·V`, summed without parallel transport.
pub fn total_charge<G: Group, const D: usize>(grid: &Grid<G, D>) -> G::Algebra {
    let mut total = <G::Algebra as LieAlgebra>::zero();
    for x in grid.indices() {
        total += grid.rho(x);
    }
    total * grid.cell_volume()
}

fn max_norm<A: LieAlgebra>(values: impl Iterator<Item = A>) -> f64 {
    values.map(|v| v.square_norm().sqrt()).fold(0.0, f64::max)
}

/// Baseline Gauss-law violation to track drift.
#[derive(Debug, Clone)]
pub struct ConservationState<A> {
    pub baseline_gauss: Vec<A>,
}

impl<A: LieAlgebra> ConservationState<A> {
    /// Record the current Gauss-law violation of `grid`.
    pub fn new<G: Group<Algebra = A>, const D: usize>(grid: &Grid<G, D>) -> Self {
        Self {
            baseline_gauss: gauss_violation(grid),
        }
    }
}

/// Conservation errors after one step.
#[derive(Debug, Clone)]
pub struct ConservationMonitor {
    /// Largest per-cell continuity residual |rho' − rho + dt div J|.
    pub continuity_error: f64,
    /// Largest per-cell change of the Gauss-law violation since the baseline.
    pub gauss_drift: f64,
}

impl ConservationMonitor {
    /// Measure the step that turned `rho_old` into the current grid state.
    pub fn check<G: Group, const D: usize>(
        baseline: &ConservationState<G::Algebra>,
        rho_old: &[G::Algebra],
        grid: &Grid<G, D>,
        dt: f64,
    ) -> Result<Self> {
        let residual = continuity_residual(rho_old, grid, dt)?;
        let gauss = gauss_violation(grid);
        if baseline.baseline_gauss.len() != gauss.len() {
            return Err(PicError::InvalidParameter(format!(
                "baseline has {} cells, grid has {}",
                baseline.baseline_gauss.len(),
                gauss.len()
            )));
        }

        Ok(Self {
            continuity_error: max_norm(residual.into_iter()),
            gauss_drift: max_norm(
                gauss
                    .into_iter()
                    .zip(baseline.baseline_gauss.iter())
                    .map(|(g, g0)| g - *g0),
            ),
        })
    }

    /// Check whether either error exceeds its tolerance; logs a warning if so.
    pub fn is_violated(&self, continuity_tol: f64, gauss_tol: f64) -> bool {
        let violated = self.continuity_error > continuity_tol || self.gauss_drift > gauss_tol;
        if violated {
            warn!(
                continuity_error = self.continuity_error,
                gauss_drift = self.gauss_drift,
                "charge conservation violated"
            );
        }
        violated
    }

    pub fn max_error(&self) -> f64 {
        self.continuity_error.max(self.gauss_drift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::LinkSlot;
    use approx::assert_abs_diff_eq;
    use phyz_gauge::{SU2, Su2Algebra, U1};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_empty_grid_conserves() {
        let grid = Grid::<SU2, 2>::new([3, 3], [1.0; 2]).unwrap();
        let rho_old = grid.charge_density_snapshot();
        let residual = continuity_residual(&rho_old, &grid, 0.1).unwrap();
        assert!(residual.iter().all(|r| r.square_norm() == 0.0));
        assert!(gauss_violation(&grid).iter().all(|g| g.square_norm() == 0.0));
    }

    #[test]
    fn test_snapshot_length_mismatch() {
        let grid = Grid::<U1, 2>::new([3, 3], [1.0; 2]).unwrap();
        assert!(matches!(
            continuity_residual(&[0.0; 4], &grid, 0.1),
            Err(PicError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_u1_gauss_is_divergence() {
        let mut grid = Grid::<U1, 1>::new([4], [0.5]).unwrap();
        let x = grid.cell_index([1]);
        grid.set_e(x, 0, 1.0);
        let g = gauss_violation(&grid);
        assert_abs_diff_eq!(g[x.as_usize()], 2.0);
        assert_abs_diff_eq!(g[grid.shift(x, 0, 1).as_usize()], -2.0);
        assert_abs_diff_eq!(g.iter().sum::<f64>(), 0.0);
    }

    #[test]
    fn test_covariant_divergence_uses_links() {
        // a flux on a link with nontrivial U arrives rotated into the next frame
        let mut rng = StdRng::seed_from_u64(1);
        let mut grid = Grid::<SU2, 1>::new([3], [1.0]).unwrap();
        let x = grid.cell_index([0]);
        let link = SU2::random(&mut rng);
        grid.set_link(x, 0, LinkSlot::Next, link);
        let q = Su2Algebra::new([0.0, 0.0, 1.0]);
        grid.set_j(x, 0, q);

        // rho moves with the current: -dt·q at x, +dt·U†qU at x+1
        let rho_old = grid.charge_density_snapshot();
        let dt = 0.1;
        grid.set_rho(x, q * -dt);
        grid.set_rho(grid.shift(x, 0, 1), link.adj().act(&q) * dt);

        let residual = continuity_residual(&rho_old, &grid, dt).unwrap();
        assert!(residual.iter().all(|r| r.square_norm() < 1e-28));
    }

    #[test]
    fn test_monitor_detects_drift() {
        let mut grid = Grid::<U1, 2>::new([3, 3], [1.0; 2]).unwrap();
        let baseline = ConservationState::new(&grid);
        let rho_old = grid.charge_density_snapshot();

        let monitor = ConservationMonitor::check(&baseline, &rho_old, &grid, 0.1).unwrap();
        assert!(!monitor.is_violated(1e-12, 1e-12));

        // charge appearing from nowhere breaks both laws
        grid.add_rho(grid.cell_index([1, 1]), 0.5);
        let monitor = ConservationMonitor::check(&baseline, &rho_old, &grid, 0.1).unwrap();
        assert_abs_diff_eq!(monitor.continuity_error, 0.5);
        assert_abs_diff_eq!(monitor.gauss_drift, 0.5);
        assert!(monitor.is_violated(1e-12, 1e-12));
        assert_abs_diff_eq!(monitor.max_error(), 0.5);
    }
}
