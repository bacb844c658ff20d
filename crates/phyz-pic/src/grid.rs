//! Periodic D-dimensional grid carrying currents, charge densities,
//! electric fields and gauge links.
//!
//! Cells are stored flat with axis 0 fastest. Link `U_i(x)` connects cell
//! `x` to `x + e_i`; `J_i(x)` and `E_i(x)` live on the same link and are
//! expressed in the color frame of `x`.

use phyz_gauge::{Group, LieAlgebra};
use rand::Rng;

use crate::config::GridConfig;
use crate::deposit::{DepositBuffer, DepositTarget};
use crate::error::{PicError, Result};

/// Opaque handle to a grid cell.
///
/// Only a [`Grid`] hands these out, so every index is in range for the
/// grid that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellIndex(usize);

impl CellIndex {
    /// Flat position, usable to index per-cell slices of length `grid.len()`.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// Which of the two link time levels to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSlot {
    /// Links at t − dt/2.
    Current,
    /// Links at t + dt/2.
    Next,
}

/// Field content of one cell.
#[derive(Debug, Clone)]
pub struct Cell<G: Group, const D: usize> {
    /// Current through the face towards `x + e_i`.
    pub j: [G::Algebra; D],
    /// Charge density.
    pub rho: G::Algebra,
    /// Electric field on the link towards `x + e_i`.
    pub e: [G::Algebra; D],
    /// Links at t − dt/2.
    pub u: [G; D],
    /// Links at t + dt/2.
    pub u_next: [G; D],
}

impl<G: Group, const D: usize> Cell<G, D> {
    fn new() -> Self {
        let zero = <G::Algebra as LieAlgebra>::zero();
        Self {
            j: [zero; D],
            rho: zero,
            e: [zero; D],
            u: [G::identity(); D],
            u_next: [G::identity(); D],
        }
    }
}

/// Periodic grid of `D` dimensions over gauge group `G`.
#[derive(Debug, Clone)]
pub struct Grid<G: Group, const D: usize> {
    num_cells: [usize; D],
    spacing: [f64; D],
    cells: Vec<Cell<G, D>>,
}

impl<G: Group, const D: usize> Grid<G, D> {
    /// Create a grid with zero fields and identity links.
    pub fn new(num_cells: [usize; D], spacing: [f64; D]) -> Result<Self> {
        if D == 0 {
            return Err(PicError::InvalidGrid("grid needs at least one axis".to_string()));
        }
        for axis in 0..D {
            if num_cells[axis] == 0 {
                return Err(PicError::InvalidGrid(format!("axis {axis} has no cells")));
            }
            if !(spacing[axis].is_finite() && spacing[axis] > 0.0) {
                return Err(PicError::InvalidGrid(format!(
                    "axis {axis} spacing {} must be positive",
                    spacing[axis]
                )));
            }
        }
        let len = num_cells
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| PicError::InvalidGrid("cell count overflows usize".to_string()))?;

        Ok(Self {
            num_cells,
            spacing,
            cells: vec![Cell::new(); len],
        })
    }

    /// Build from a configuration whose axis count must equal `D`.
    pub fn from_config(config: &GridConfig) -> Result<Self> {
        let num_cells: [usize; D] = config.num_cells.as_slice().try_into().map_err(|_| {
            PicError::InvalidGrid(format!(
                "expected {D} cell counts, got {}",
                config.num_cells.len()
            ))
        })?;
        let spacing: [f64; D] = config.spacing.as_slice().try_into().map_err(|_| {
            PicError::InvalidGrid(format!("expected {D} spacings, got {}", config.spacing.len()))
        })?;
        Self::new(num_cells, spacing)
    }

    // ========================================================================
    // Topology
    // ========================================================================

    pub fn num_cells(&self) -> [usize; D] {
        self.num_cells
    }

    pub fn spacing(&self, axis: usize) -> f64 {
        self.spacing[axis]
    }

    pub fn spacings(&self) -> [f64; D] {
        self.spacing
    }

    /// Physical length of the box along `axis`.
    pub fn extent(&self, axis: usize) -> f64 {
        self.num_cells[axis] as f64 * self.spacing[axis]
    }

    pub fn cell_volume(&self) -> f64 {
        self.spacing.iter().product()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at integer coordinates, wrapped periodically on every axis.
    pub fn cell_index(&self, coords: [isize; D]) -> CellIndex {
        let mut flat = 0;
        let mut stride = 1;
        for axis in 0..D {
            let n = self.num_cells[axis];
            flat += coords[axis].rem_euclid(n as isize) as usize * stride;
            stride *= n;
        }
        CellIndex(flat)
    }

    /// Integer coordinates of a cell.
    pub fn coordinates(&self, index: CellIndex) -> [usize; D] {
        let mut rest = index.0;
        let mut coords = [0; D];
        for axis in 0..D {
            coords[axis] = rest % self.num_cells[axis];
            rest /= self.num_cells[axis];
        }
        coords
    }

    /// Neighbor `steps` cells away along `axis` (negative steps go back).
    pub fn shift(&self, index: CellIndex, axis: usize, steps: isize) -> CellIndex {
        let mut coords = self.coordinates(index).map(|c| c as isize);
        coords[axis] += steps;
        self.cell_index(coords)
    }

    /// All cells in storage order.
    pub fn indices(&self) -> impl Iterator<Item = CellIndex> + use<G, D> {
        (0..self.cells.len()).map(CellIndex)
    }

    #[inline]
    pub fn cell(&self, index: CellIndex) -> &Cell<G, D> {
        &self.cells[index.0]
    }

    // ========================================================================
    // Field access
    // ========================================================================

    #[inline]
    pub fn j(&self, index: CellIndex, axis: usize) -> G::Algebra {
        self.cells[index.0].j[axis]
    }

    #[inline]
    pub fn add_j(&mut self, index: CellIndex, axis: usize, value: G::Algebra) {
        self.cells[index.0].j[axis] += value;
    }

    #[inline]
    pub fn set_j(&mut self, index: CellIndex, axis: usize, value: G::Algebra) {
        self.cells[index.0].j[axis] = value;
    }

    #[inline]
    pub fn rho(&self, index: CellIndex) -> G::Algebra {
        self.cells[index.0].rho
    }

    #[inline]
    pub fn add_rho(&mut self, index: CellIndex, value: G::Algebra) {
        self.cells[index.0].rho += value;
    }

    #[inline]
    pub fn set_rho(&mut self, index: CellIndex, value: G::Algebra) {
        self.cells[index.0].rho = value;
    }

    #[inline]
    pub fn e(&self, index: CellIndex, axis: usize) -> G::Algebra {
        self.cells[index.0].e[axis]
    }

    #[inline]
    pub fn add_e(&mut self, index: CellIndex, axis: usize, value: G::Algebra) {
        self.cells[index.0].e[axis] += value;
    }

    #[inline]
    pub fn set_e(&mut self, index: CellIndex, axis: usize, value: G::Algebra) {
        self.cells[index.0].e[axis] = value;
    }

    /// Link `U_axis(x)` at the requested time level.
    #[inline]
    pub fn link(&self, index: CellIndex, axis: usize, slot: LinkSlot) -> G {
        let cell = &self.cells[index.0];
        match slot {
            LinkSlot::Current => cell.u[axis],
            LinkSlot::Next => cell.u_next[axis],
        }
    }

    #[inline]
    pub fn set_link(&mut self, index: CellIndex, axis: usize, slot: LinkSlot, value: G) {
        let cell = &mut self.cells[index.0];
        match slot {
            LinkSlot::Current => cell.u[axis] = value,
            LinkSlot::Next => cell.u_next[axis] = value,
        }
    }

    #[inline]
    pub fn u(&self, index: CellIndex, axis: usize) -> G {
        self.link(index, axis, LinkSlot::Current)
    }

    #[inline]
    pub fn u_next(&self, index: CellIndex, axis: usize) -> G {
        self.link(index, axis, LinkSlot::Next)
    }

    /// Plaquette `U_i(x) U_j(x+i) U_i†(x+j) U_j†(x)`.
    pub fn plaquette(&self, index: CellIndex, i: usize, j: usize, slot: LinkSlot) -> G {
        let x_i = self.shift(index, i, 1);
        let x_j = self.shift(index, j, 1);

        let u1 = self.link(index, i, slot);
        let u2 = self.link(x_i, j, slot);
        let u3 = self.link(x_j, i, slot).adj();
        let u4 = self.link(index, j, slot).adj();

        u1.mul(&u2).mul(&u3).mul(&u4)
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Zero the current on every axis of every cell.
    pub fn reset_current(&mut self) {
        let zero = <G::Algebra as LieAlgebra>::zero();
        for cell in &mut self.cells {
            cell.j = [zero; D];
        }
    }

    /// Zero the charge density of every cell.
    pub fn reset_charge_density(&mut self) {
        let zero = <G::Algebra as LieAlgebra>::zero();
        for cell in &mut self.cells {
            cell.rho = zero;
        }
    }

    /// Accumulate buffered contributions in buffer order.
    pub fn apply_deposits(&mut self, buffer: &DepositBuffer<G::Algebra>) {
        for deposit in buffer.iter() {
            let cell = &mut self.cells[deposit.cell.0];
            match deposit.target {
                DepositTarget::Current(axis) => cell.j[axis] += deposit.value,
                DepositTarget::ChargeDensity => cell.rho += deposit.value,
            }
        }
    }

    /// Copy of rho for every cell, in storage order.
    pub fn charge_density_snapshot(&self) -> Vec<G::Algebra> {
        self.cells.iter().map(|cell| cell.rho).collect()
    }

    /// Exchange `U` and `Unext` in every cell.
    pub fn swap_links(&mut self) {
        for cell in &mut self.cells {
            std::mem::swap(&mut cell.u, &mut cell.u_next);
        }
    }

    /// Random links, identical in both time levels (static background).
    pub fn randomize_links<R: Rng>(&mut self, rng: &mut R) {
        for cell in &mut self.cells {
            for axis in 0..D {
                let link = G::random(rng);
                cell.u[axis] = link;
                cell.u_next[axis] = link;
            }
        }
    }

    /// `E_i ← E_i − dt·J_i` on every link.
    pub fn subtract_current_from_field(&mut self, dt: f64) {
        for cell in &mut self.cells {
            for axis in 0..D {
                cell.e[axis] -= cell.j[axis] * dt;
            }
        }
    }
}
