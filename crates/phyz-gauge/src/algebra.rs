//! Lie-algebra elements.
//!
//! An algebra element is a real coefficient vector in the adjoint basis of
//! the group's generators. The abelian case is a plain `f64`; su(2) and su(3)
//! use [`AlgebraVector`] with 3 and 8 components.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

/// Operations shared by every Lie-algebra element.
///
/// Arithmetic comes from the std operator traits; the remaining methods give
/// component access in the generator basis.
pub trait LieAlgebra:
    Copy
    + Debug
    + PartialEq
    + Default
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + Mul<f64, Output = Self>
    + AddAssign
    + SubAssign
    + 'static
{
    /// Number of generators.
    const DIM: usize;

    /// Zero element.
    fn zero() -> Self {
        Self::default()
    }

    /// Coefficient of generator `a`.
    fn component(&self, a: usize) -> f64;

    /// Mutable coefficient of generator `a`.
    fn component_mut(&mut self, a: usize) -> &mut f64;

    /// Sum of squared coefficients.
    fn square_norm(&self) -> f64 {
        (0..Self::DIM).map(|a| self.component(a).powi(2)).sum()
    }

    /// Build from a coefficient function.
    fn from_fn(mut f: impl FnMut(usize) -> f64) -> Self {
        let mut x = Self::zero();
        for a in 0..Self::DIM {
            *x.component_mut(a) = f(a);
        }
        x
    }
}

impl LieAlgebra for f64 {
    const DIM: usize = 1;

    fn component(&self, _a: usize) -> f64 {
        *self
    }

    fn component_mut(&mut self, _a: usize) -> &mut f64 {
        self
    }

    fn square_norm(&self) -> f64 {
        self * self
    }
}

/// Coefficient vector for su(N), `N² - 1` components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlgebraVector<const N: usize>(pub [f64; N]);

/// su(2) element: `X = v·σ/2`.
pub type Su2Algebra = AlgebraVector<3>;

/// su(3) element: `A = Σ a_b λ_b/2` with Gell-Mann matrices λ.
pub type Su3Algebra = AlgebraVector<8>;

impl<const N: usize> AlgebraVector<N> {
    pub const fn new(data: [f64; N]) -> Self {
        Self(data)
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }

    /// Euclidean dot product of coefficient vectors.
    pub fn dot(&self, other: &Self) -> f64 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }
}

impl<const N: usize> Default for AlgebraVector<N> {
    fn default() -> Self {
        Self([0.0; N])
    }
}

impl<const N: usize> LieAlgebra for AlgebraVector<N> {
    const DIM: usize = N;

    fn component(&self, a: usize) -> f64 {
        self.0[a]
    }

    fn component_mut(&mut self, a: usize) -> &mut f64 {
        &mut self.0[a]
    }

    fn square_norm(&self) -> f64 {
        self.dot(self)
    }
}

impl<const N: usize> From<[f64; N]> for AlgebraVector<N> {
    fn from(data: [f64; N]) -> Self {
        Self(data)
    }
}

impl<const N: usize> Index<usize> for AlgebraVector<N> {
    type Output = f64;

    fn index(&self, a: usize) -> &f64 {
        &self.0[a]
    }
}

impl<const N: usize> IndexMut<usize> for AlgebraVector<N> {
    fn index_mut(&mut self, a: usize) -> &mut f64 {
        &mut self.0[a]
    }
}

impl<const N: usize> Add for AlgebraVector<N> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl<const N: usize> AddAssign for AlgebraVector<N> {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
    }
}

impl<const N: usize> Sub for AlgebraVector<N> {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl<const N: usize> SubAssign for AlgebraVector<N> {
    fn sub_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a -= b;
        }
    }
}

impl<const N: usize> Mul<f64> for AlgebraVector<N> {
    type Output = Self;

    fn mul(mut self, rhs: f64) -> Self {
        self *= rhs;
        self
    }
}

impl<const N: usize> Mul<AlgebraVector<N>> for f64 {
    type Output = AlgebraVector<N>;

    fn mul(self, rhs: AlgebraVector<N>) -> AlgebraVector<N> {
        rhs * self
    }
}

impl<const N: usize> MulAssign<f64> for AlgebraVector<N> {
    fn mul_assign(&mut self, rhs: f64) {
        for a in self.0.iter_mut() {
            *a *= rhs;
        }
    }
}

impl<const N: usize> Neg for AlgebraVector<N> {
    type Output = Self;

    fn neg(self) -> Self {
        self * -1.0
    }
}
