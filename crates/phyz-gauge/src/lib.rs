//! Gauge group arithmetic for colored particle-in-cell simulations.
//!
//! Provides:
//! - U(1), SU(2) and SU(3) group elements behind one [`Group`] trait
//! - Lie algebra vectors (charges, currents, fields) in the generator basis
//! - Exact exponential and logarithm maps, plus the linearized variants
//! - Adjoint action `U X U†` used to parallel transport color charges
//!
//! # Example
//!
//! ```
//! use phyz_gauge::{Group, LieAlgebra, Su2Algebra, SU2};
//!
//! let x = Su2Algebra::new([0.3, -0.2, 0.1]);
//! let u = SU2::exp(&x);
//!
//! // log inverts exp on the principal branch
//! let back = u.log();
//! assert!((back - x).square_norm() < 1e-24);
//!
//! // transporting a charge keeps its magnitude
//! let q = Su2Algebra::new([1.0, 0.0, 0.0]);
//! assert!((u.act(&q).square_norm() - 1.0).abs() < 1e-12);
//! ```

pub mod algebra;
pub mod error;
pub mod group;
pub mod su3;

pub use algebra::{AlgebraVector, LieAlgebra, Su2Algebra, Su3Algebra};
pub use error::{GaugeError, Result};
pub use group::{Group, SU2, U1};
pub use su3::SU3;
