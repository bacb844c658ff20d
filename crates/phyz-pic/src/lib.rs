//! Charge-conserving particle-in-cell deposition on periodic lattices.
//!
//! Two particle schemes share one [`Grid`] and one [`Interpolator`] seam:
//! - [`ChargeConservingCic`]: Abelian point charges with area-weighted
//!   current deposition that satisfies the discrete continuity equation
//! - [`CgcInterpolator`]: color charges on light-like trajectories, parallel
//!   transported along the gauge links they cross
//!
//! Deposition passes compute per-particle contributions first (optionally on
//! the rayon pool) and apply them in particle order, so results do not depend
//! on thread count. [`LightConeGenerator`] samples a charge density onto
//! particles moving at the speed of light.
//!
//! # Example
//!
//! ```
//! use phyz_gauge::{LieAlgebra, Su2Algebra, SU2};
//! use phyz_pic::{CgcInterpolator, CgcParticle, Grid, conservation, deposit};
//!
//! let mut grid = Grid::<SU2, 2>::new([8, 8], [1.0, 1.0]).unwrap();
//! let q = Su2Algebra::new([0.0, 0.0, 1.0]);
//! let mut particles = vec![CgcParticle::new([2.4, 3.0], 0, 1.0, 0.5, q).unwrap()];
//! let interp = CgcInterpolator::new();
//! deposit::deposit_charge_density(&mut grid, &interp, &particles, false).unwrap();
//!
//! // one step: move, transport the charge, deposit
//! let rho_old = grid.charge_density_snapshot();
//! particles[0].advance(0.5);
//! deposit::gather(&grid, &interp, &mut particles, false).unwrap();
//! particles[0].update_charge();
//! deposit::deposit_charge_density(&mut grid, &interp, &particles, false).unwrap();
//! deposit::deposit_current(&mut grid, &interp, &particles, 0.5, false).unwrap();
//!
//! let residual = conservation::continuity_residual(&rho_old, &grid, 0.5).unwrap();
//! assert!(residual.iter().all(|r| r.square_norm() < 1e-24));
//! ```

pub mod cartesian;
pub mod cgc;
pub mod config;
pub mod conservation;
pub mod deposit;
pub mod error;
pub mod grid;
pub mod interpolator;
pub mod light_cone;
pub mod particle;

pub use cartesian::ChargeConservingCic;
pub use cgc::CgcInterpolator;
pub use config::{GridConfig, GroupKind, LightConeConfig, SimulationConfig, load_config, save_config};
pub use conservation::{ConservationMonitor, ConservationState};
pub use deposit::{DepositBuffer, deposit_charge_density, deposit_current, gather};
pub use error::{PicError, Result};
pub use grid::{CellIndex, Grid, LinkSlot};
pub use interpolator::Interpolator;
pub use light_cone::{LightConeCurrent, LightConeGenerator};
pub use particle::{CgcParticle, Particle};
