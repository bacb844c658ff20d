//! Gauge group implementations.
//!
//! U(1) and SU(2) have closed forms; SU(3) lives in [`crate::su3`].

use std::f64::consts::PI;
use std::fmt::Debug;

use rand::Rng;

use crate::algebra::{LieAlgebra, Su2Algebra};
use crate::error::{GaugeError, Result};

/// Trait for gauge groups acting on lattice links and color charges.
///
/// Implementations are chosen once, through the type parameter of whatever
/// holds the links; elements of different groups never mix.
pub trait Group: Copy + Debug + PartialEq + Send + Sync + 'static {
    /// Associated Lie algebra (charges, currents, fields).
    type Algebra: LieAlgebra;

    /// Number of colors N of the fundamental representation.
    const N_COLORS: usize;

    /// Identity element.
    fn identity() -> Self;

    /// Group multiplication.
    fn mul(&self, other: &Self) -> Self;

    /// Adjoint (inverse for unitary elements).
    fn adj(&self) -> Self;

    /// Real part of trace.
    fn re_tr(&self) -> f64;

    /// Random group element.
    fn random<R: Rng>(rng: &mut R) -> Self;

    /// Exact exponential map from the algebra.
    fn exp(a: &Self::Algebra) -> Self;

    /// Small-angle exponential, valid only for `|a|²/4 < 1`.
    fn exp_linearized(a: &Self::Algebra) -> Result<Self>;

    /// Exact logarithm, inverse of [`Group::exp`].
    fn log(&self) -> Self::Algebra;

    /// Linearized logarithm `Im tr(T_a U)`; agrees with `log` to first order.
    fn proj(&self) -> Self::Algebra;

    /// Adjoint action `U X U†`.
    fn act(&self, x: &Self::Algebra) -> Self::Algebra;

    /// Distance from the group manifold (0 for an exact element).
    fn unitarity_defect(&self) -> f64;

    /// Fractional power `exp(t·log U)`.
    fn pow(&self, t: f64) -> Self {
        Self::exp(&(self.log() * t))
    }
}

pub(crate) fn check_linearized_domain(quarter_square_norm: f64) -> Result<()> {
    if quarter_square_norm >= 1.0 || !quarter_square_norm.is_finite() {
        return Err(GaugeError::LinearizedExpOutOfRange {
            quarter_square_norm,
        });
    }
    Ok(())
}

// ============================================================================
// U(1) Group
// ============================================================================

/// U(1) group element: e^(iθ).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct U1 {
    /// Angle θ ∈ [0, 2π).
    pub theta: f64,
}

impl U1 {
    /// Create new U(1) element.
    pub fn new(theta: f64) -> Self {
        Self {
            theta: theta.rem_euclid(2.0 * PI),
        }
    }
}

impl Group for U1 {
    type Algebra = f64;

    const N_COLORS: usize = 1;

    fn identity() -> Self {
        Self { theta: 0.0 }
    }

    fn mul(&self, other: &Self) -> Self {
        Self::new(self.theta + other.theta)
    }

    fn adj(&self) -> Self {
        Self::new(-self.theta)
    }

    fn re_tr(&self) -> f64 {
        self.theta.cos()
    }

    fn random<R: Rng>(rng: &mut R) -> Self {
        Self::new(rng.gen_range(0.0..2.0 * PI))
    }

    fn exp(a: &f64) -> Self {
        Self::new(*a)
    }

    fn exp_linearized(a: &f64) -> Result<Self> {
        // Unit generator: the link is (sqrt(1 - a²), a), so the bound is a² < 1.
        check_linearized_domain(a * a)?;
        Ok(Self::new(a.asin()))
    }

    fn log(&self) -> f64 {
        if self.theta > PI {
            self.theta - 2.0 * PI
        } else {
            self.theta
        }
    }

    fn proj(&self) -> f64 {
        self.theta.sin()
    }

    fn act(&self, x: &f64) -> f64 {
        *x
    }

    fn unitarity_defect(&self) -> f64 {
        if self.theta.is_finite() { 0.0 } else { f64::INFINITY }
    }
}

// ============================================================================
// SU(2) Group
// ============================================================================

/// SU(2) group element as unit quaternion.
///
/// Represented as `U = a0 + i (a1 σ1 + a2 σ2 + a3 σ3)` with Σ aᵢ² = 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SU2 {
    /// Quaternion components [a0, a1, a2, a3].
    pub q: [f64; 4],
}

impl SU2 {
    /// Create new SU(2) element from quaternion components, normalized.
    pub fn new(a0: f64, a1: f64, a2: f64, a3: f64) -> Self {
        let mut u = Self {
            q: [a0, a1, a2, a3],
        };
        u.normalize();
        u
    }

    /// Normalize to unit quaternion.
    pub fn normalize(&mut self) {
        let norm = self.square_norm().sqrt();
        if norm > 1e-12 {
            for a in &mut self.q {
                *a /= norm;
            }
        }
    }

    /// Σ aᵢ², equal to det U.
    pub fn square_norm(&self) -> f64 {
        self.q.iter().map(|a| a * a).sum()
    }

    #[inline]
    fn vector(&self) -> [f64; 3] {
        [self.q[1], self.q[2], self.q[3]]
    }
}

impl Group for SU2 {
    type Algebra = Su2Algebra;

    const N_COLORS: usize = 2;

    fn identity() -> Self {
        Self {
            q: [1.0, 0.0, 0.0, 0.0],
        }
    }

    fn mul(&self, other: &Self) -> Self {
        // (a0 + i a·σ)(b0 + i b·σ) = a0 b0 - a·b + i (a0 b + b0 a - a×b)·σ
        let [a0, a1, a2, a3] = self.q;
        let [b0, b1, b2, b3] = other.q;
        Self {
            q: [
                a0 * b0 - a1 * b1 - a2 * b2 - a3 * b3,
                a0 * b1 + b0 * a1 - (a2 * b3 - a3 * b2),
                a0 * b2 + b0 * a2 - (a3 * b1 - a1 * b3),
                a0 * b3 + b0 * a3 - (a1 * b2 - a2 * b1),
            ],
        }
    }

    fn adj(&self) -> Self {
        Self {
            q: [self.q[0], -self.q[1], -self.q[2], -self.q[3]],
        }
    }

    fn re_tr(&self) -> f64 {
        // Tr(U) = 2 a0 for SU(2)
        2.0 * self.q[0]
    }

    fn random<R: Rng>(rng: &mut R) -> Self {
        // Uniform on the 3-sphere
        let u1: f64 = rng.gen_range(0.0..1.0);
        let u2: f64 = rng.gen_range(0.0..1.0);
        let u3: f64 = rng.gen_range(0.0..1.0);

        let s = (1.0 - u1).sqrt();
        let t = u1.sqrt();

        Self::new(
            s * (2.0 * PI * u2).sin(),
            s * (2.0 * PI * u2).cos(),
            t * (2.0 * PI * u3).sin(),
            t * (2.0 * PI * u3).cos(),
        )
    }

    fn exp(v: &Su2Algebra) -> Self {
        let norm = v.square_norm().sqrt();
        if norm < 1e-20 {
            return Self::identity();
        }

        let theta = 0.5 * norm;
        let s = theta.sin() / norm;
        Self {
            q: [theta.cos(), s * v[0], s * v[1], s * v[2]],
        }
    }

    fn exp_linearized(v: &Su2Algebra) -> Result<Self> {
        let quarter = 0.25 * v.square_norm();
        check_linearized_domain(quarter)?;
        Ok(Self {
            q: [(1.0 - quarter).sqrt(), 0.5 * v[0], 0.5 * v[1], 0.5 * v[2]],
        })
    }

    fn log(&self) -> Su2Algebra {
        let a = self.vector();
        let norm = (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt();
        if norm < 1e-20 {
            // ±1: the identity maps to zero, -1 to any vector of length 2π.
            return if self.q[0] >= 0.0 {
                Su2Algebra::zero()
            } else {
                Su2Algebra::new([2.0 * PI, 0.0, 0.0])
            };
        }
        let factor = 2.0 * norm.atan2(self.q[0]) / norm;
        Su2Algebra::new([factor * a[0], factor * a[1], factor * a[2]])
    }

    fn proj(&self) -> Su2Algebra {
        Su2Algebra::new([2.0 * self.q[1], 2.0 * self.q[2], 2.0 * self.q[3]])
    }

    fn act(&self, x: &Su2Algebra) -> Su2Algebra {
        // v' = (a0² - |a|²) v + 2 (a·v) a - 2 a0 (a × v)
        let a0 = self.q[0];
        let a = self.vector();
        let v = x.0;
        let a_sq = a[0] * a[0] + a[1] * a[1] + a[2] * a[2];
        let a_dot_v = a[0] * v[0] + a[1] * v[1] + a[2] * v[2];
        let cross = [
            a[1] * v[2] - a[2] * v[1],
            a[2] * v[0] - a[0] * v[2],
            a[0] * v[1] - a[1] * v[0],
        ];
        let c = a0 * a0 - a_sq;
        Su2Algebra::from_fn(|i| c * v[i] + 2.0 * a_dot_v * a[i] - 2.0 * a0 * cross[i])
    }

    fn unitarity_defect(&self) -> f64 {
        (self.square_norm() - 1.0).abs()
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-12;

    fn arb_su2_algebra() -> impl Strategy<Value = Su2Algebra> {
        (-0.5..0.5_f64, -0.5..0.5_f64, -0.5..0.5_f64)
            .prop_map(|(x, y, z)| Su2Algebra::new([x, y, z]))
    }

    proptest! {
        #[test]
        fn log_exp_is_identity(v in arb_su2_algebra()) {
            let back = SU2::exp(&v).log();
            for i in 0..3 {
                prop_assert!((back[i] - v[i]).abs() < EPS, "{}: {} vs {}", i, back[i], v[i]);
            }
        }

        #[test]
        fn exp_log_is_identity(seed in 0u64..10_000) {
            let mut rng = StdRng::seed_from_u64(seed);
            let u = SU2::random(&mut rng);
            let back = SU2::exp(&u.log());
            for i in 0..4 {
                prop_assert!((back.q[i] - u.q[i]).abs() < EPS);
            }
            prop_assert!(back.unitarity_defect() < EPS);
        }

        #[test]
        fn act_preserves_norm(seed in 0u64..10_000, v in arb_su2_algebra()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let u = SU2::random(&mut rng);
            prop_assert!((u.act(&v).square_norm() - v.square_norm()).abs() < EPS);
        }
    }
}
