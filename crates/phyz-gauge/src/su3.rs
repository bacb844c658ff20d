//! SU(3) group elements and the su(3) exponential and logarithm.
//!
//! Algebra elements are Gell-Mann coefficients: `A = Σ a_b λ_b/2` is a
//! traceless Hermitian matrix, `U = exp(iA)` and `a_b = tr(A λ_b)`.
//!
//! Both maps diagonalize without an external eigensolver. Eigenvalues come
//! from the characteristic cubic (trace, trace of the square, determinant)
//! and eigenvectors from the `(M - λi)(M - λj)` column shortcut. Near a
//! degenerate spectrum that guess mixes eigenvectors, so it is polished by
//! Jacobi sweeps on a Hermitian matrix sharing the eigenvectors: `H` itself
//! for `exp`, and for `log` the Cayley transform of `U` about the widest gap
//! between its eigenphases.

use std::f64::consts::PI;

use nalgebra::{Complex, Matrix3, Vector3};
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::{trace, warn};

use crate::algebra::{LieAlgebra, Su3Algebra};
use crate::error::Result;
use crate::group::{Group, check_linearized_domain};

/// Complex scalar.
pub type C64 = Complex<f64>;
/// 3×3 complex matrix.
pub type CMatrix3 = Matrix3<C64>;
/// Complex 3-vector.
pub type CVector3 = Vector3<C64>;

const SQRT3: f64 = 1.732_050_807_568_877_2;

/// `Re tr U` above `3 - NEAR_IDENTITY` uses the log(1+X) series.
const NEAR_IDENTITY: f64 = 1e-2;
/// `|a|²` below this uses the exp Taylor series.
const SMALL_ARGUMENT: f64 = 1e-2;
const LOG_SERIES_TERMS: usize = 25;
const EXP_SERIES_TERMS: usize = 20;
/// Columns shorter than this are treated as a degenerate eigenspace.
const DEGENERATE: f64 = 1e-14;
const JACOBI_SWEEPS: usize = 8;

#[inline]
fn c(re: f64, im: f64) -> C64 {
    Complex::new(re, im)
}

/// Hermitian matrix `Σ a_b λ_b / 2`.
pub fn algebra_to_matrix(a: &Su3Algebra) -> CMatrix3 {
    let d8 = a[7] / (2.0 * SQRT3);
    let m01 = c(0.5 * a[0], -0.5 * a[1]);
    let m02 = c(0.5 * a[3], -0.5 * a[4]);
    let m12 = c(0.5 * a[5], -0.5 * a[6]);
    CMatrix3::new(
        c(0.5 * a[2] + d8, 0.0),
        m01,
        m02,
        m01.conj(),
        c(-0.5 * a[2] + d8, 0.0),
        m12,
        m02.conj(),
        m12.conj(),
        c(-2.0 * d8, 0.0),
    )
}

/// Coefficients `Re tr(H λ_b)`; only the Hermitian part of `h` contributes.
pub fn hermitian_to_algebra(h: &CMatrix3) -> Su3Algebra {
    Su3Algebra::new([
        (h[(0, 1)] + h[(1, 0)]).re,
        h[(1, 0)].im - h[(0, 1)].im,
        (h[(0, 0)] - h[(1, 1)]).re,
        (h[(0, 2)] + h[(2, 0)]).re,
        h[(2, 0)].im - h[(0, 2)].im,
        (h[(1, 2)] + h[(2, 1)]).re,
        h[(2, 1)].im - h[(1, 2)].im,
        (h[(0, 0)] + h[(1, 1)] - h[(2, 2)] * 2.0).re / SQRT3,
    ])
}

/// `(H + H†)/2`.
pub fn hermitize(h: &CMatrix3) -> CMatrix3 {
    (h + h.adjoint()) * c(0.5, 0.0)
}

/// Project an arbitrary matrix back onto SU(3).
///
/// Gram-Schmidt on the first two columns; the third is `conj(c0 × c1)`,
/// which fixes det = 1.
pub fn reunitarize(m: &CMatrix3) -> CMatrix3 {
    let c0 = m.column(0).normalize();
    let c1 = (m.column(1) - c0 * c0.dotc(&m.column(1))).normalize();
    let c2 = c0.cross(&c1).map(|z| z.conj());
    CMatrix3::from_columns(&[c0, c1, c2])
}

// ============================================================================
// Spectral helpers
// ============================================================================

/// Real eigenvalues of a traceless Hermitian matrix (trigonometric Cardano).
fn hermitian_eigenvalues(h: &CMatrix3) -> [C64; 3] {
    // λ³ + pλ + q = 0 with p = -tr(H²)/2, q = -det H
    let p = -0.5 * (h * h).trace().re;
    let q = -h.determinant().re;
    if p > -1e-30 {
        return [c(0.0, 0.0); 3];
    }
    let r = (-p / 3.0).sqrt();
    let cos3 = (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0);
    let phi = cos3.acos() / 3.0;
    [0, 1, 2].map(|k| c(2.0 * r * (phi - 2.0 * PI * k as f64 / 3.0).cos(), 0.0))
}

/// Complex eigenvalues of a unitary matrix from trace, trace of the square
/// and determinant, via the depressed cubic.
///
/// Near a double or triple root these still carry `√ε` to `∛ε` error; the
/// eigenbasis is refined afterwards by [`jacobi_refine`].
fn unitary_eigenvalues(u: &CMatrix3) -> [C64; 3] {
    // λ³ - c2 λ² + c1 λ - c0 = 0
    let c2 = u.trace();
    let c1 = (c2 * c2 - (u * u).trace()) * 0.5;
    let c0 = u.determinant();

    // λ = y + c2/3 gives y³ + p y + q = 0
    let shift = c2 / 3.0;
    let p = c1 - c2 * c2 / 3.0;
    let q = c2 * c1 / 3.0 - c2 * c2 * c2 * (2.0 / 27.0) - c0;

    let disc = (q * q * 0.25 + p * p * p / 27.0).sqrt();
    let plus = -q * 0.5 + disc;
    let minus = -q * 0.5 - disc;
    let s = if plus.norm() >= minus.norm() { plus } else { minus };
    let (radius, angle) = s.to_polar();
    let cbrt = C64::from_polar(radius.cbrt(), angle / 3.0);

    let omega = C64::from_polar(1.0, 2.0 * PI / 3.0);
    let mut roots = [shift; 3];
    if cbrt.norm() > 1e-300 {
        let mut w = cbrt;
        for root in roots.iter_mut() {
            *root = shift + w - p / (w * 3.0);
            w *= omega;
        }
    }

    // Newton polish on the full cubic, then back to the unit circle.
    for root in roots.iter_mut() {
        for _ in 0..2 {
            let f = ((*root - c2) * *root + c1) * *root - c0;
            let df = (*root * 3.0 - c2 * 2.0) * *root + c1;
            if df.norm() > 1e-12 {
                *root -= f / df;
            }
        }
        let n = root.norm();
        if n > 0.0 {
            *root /= n;
        }
    }
    roots
}

/// Normalized column of `a·b` with the largest norm, optionally after
/// projecting out `against`. `None` when every column vanishes.
///
/// Each column is `a·(column of b)`, so the full product is never formed.
fn dominant_column(a: &CMatrix3, b: &CMatrix3, against: Option<&CVector3>) -> Option<CVector3> {
    let mut best: Option<(f64, CVector3)> = None;
    for col in 0..3 {
        let mut v = a * b.column(col);
        if let Some(w) = against {
            v -= w * w.dotc(&v);
        }
        let norm = v.norm();
        if best.as_ref().is_none_or(|(n, _)| norm > *n) {
            best = Some((norm, v));
        }
    }
    match best {
        Some((norm, v)) if norm > DEGENERATE => Some(v.unscale(norm)),
        _ => None,
    }
}

/// Unit vector orthogonal to `v`, built from the canonical axis least
/// aligned with it.
fn orthogonal_completion(v: &CVector3) -> CVector3 {
    let axis = (0..3)
        .min_by(|&i, &j| v[i].norm().total_cmp(&v[j].norm()))
        .unwrap_or(0);
    let mut e = CVector3::zeros();
    e[axis] = c(1.0, 0.0);
    let w = e - v * v.dotc(&e);
    w.unscale(w.norm())
}

/// Orthonormal eigenvector guess (as columns) for a normal matrix with
/// known eigenvalues.
///
/// The most isolated eigenvalue goes first; its eigenvector is well
/// conditioned even when the other two are (nearly) equal. Within a
/// near-degenerate pair the columns can still be mixed.
fn eigenbasis(m: &CMatrix3, lambda: &[C64; 3]) -> CMatrix3 {
    let gap = |k: usize| {
        (0..3)
            .filter(|&j| j != k)
            .map(|j| (lambda[k] - lambda[j]).norm())
            .fold(f64::INFINITY, f64::min)
    };
    let k = (0..3).max_by(|&x, &y| gap(x).total_cmp(&gap(y))).unwrap_or(0);
    let i = (k + 1) % 3;
    let j = (k + 2) % 3;

    let id = CMatrix3::identity();
    let shifted = |l: C64| m - id * l;

    let Some(vk) = dominant_column(&shifted(lambda[i]), &shifted(lambda[j]), None) else {
        // Fully degenerate: every vector is an eigenvector.
        return id;
    };
    let vi = dominant_column(&shifted(lambda[j]), &shifted(lambda[k]), Some(&vk))
        .unwrap_or_else(|| orthogonal_completion(&vk));
    let vj = vk.cross(&vi).map(|z| z.conj());

    let mut basis = CMatrix3::zeros();
    basis.set_column(k, &vk);
    basis.set_column(i, &vi);
    basis.set_column(j, &vj);
    basis
}

/// Cyclic Jacobi sweeps on `V† H V` for a Hermitian `h`.
///
/// Returns the refined unitary basis and the diagonal of the rotated matrix.
/// From a good guess one or two sweeps reach rounding level; from a poor one
/// (a clustered spectrum) a few more.
fn jacobi_refine(h: &CMatrix3, basis: CMatrix3) -> (CMatrix3, [f64; 3]) {
    let mut v = basis;
    let mut b = hermitize(&(v.adjoint() * h * v));
    let scale = b.norm().max(f64::MIN_POSITIVE);
    for _ in 0..JACOBI_SWEEPS {
        let off = (b[(0, 1)].norm_sqr() + b[(0, 2)].norm_sqr() + b[(1, 2)].norm_sqr()).sqrt();
        if off <= f64::EPSILON * scale {
            break;
        }
        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            let (r, alpha) = b[(p, q)].to_polar();
            if r == 0.0 {
                continue;
            }
            // phase to make b_pq real, then a real symmetric rotation
            let tau = (b[(q, q)].re - b[(p, p)].re) / (2.0 * r);
            let t = tau.signum() / (tau.abs() + (1.0 + tau * tau).sqrt());
            let cos = 1.0 / (1.0 + t * t).sqrt();
            let sin = t * cos;
            let phase = C64::from_polar(1.0, -alpha);

            let mut g = CMatrix3::identity();
            g[(p, p)] = c(cos, 0.0);
            g[(p, q)] = c(sin, 0.0);
            g[(q, p)] = phase * -sin;
            g[(q, q)] = phase * cos;
            b = hermitize(&(g.adjoint() * b * g));
            v *= g;
        }
    }
    (v, [0, 1, 2].map(|k| b[(k, k)].re))
}

/// Phase in the middle of the widest arc between the eigenphases.
///
/// Every eigenphase is at least `π/3` away from the result.
fn branch_cut(lambda: &[C64; 3]) -> f64 {
    let mut phases = lambda.map(|l| l.arg());
    phases.sort_by(f64::total_cmp);
    let (mut gap, mut start) = (phases[0] + 2.0 * PI - phases[2], phases[2]);
    for k in 0..2 {
        if phases[k + 1] - phases[k] > gap {
            gap = phases[k + 1] - phases[k];
            start = phases[k];
        }
    }
    let cut = start + 0.5 * gap;
    if cut.is_finite() { cut } else { PI }
}

/// Hermitian `i(1 - W)(1 + W)⁻¹` with `W = e^{-iθ}U` and `-e^{iθ}` on the
/// branch cut. It shares `U`'s eigenvectors and maps the eigenphases
/// injectively to `tan((φ - θ)/2)`, bounded by √3.
fn cayley(u: &CMatrix3, lambda: &[C64; 3]) -> Option<CMatrix3> {
    let id = CMatrix3::identity();
    let w = *u * C64::from_polar(1.0, PI - branch_cut(lambda));
    let inv = (id + w).try_inverse()?;
    Some(hermitize(&((id - w) * inv * c(0.0, 1.0))))
}

/// Remove the 2π winding from the eigenphases so they sum to zero.
///
/// The winding goes to the phase whose shift gives the smallest norm; the
/// rounding residual is then spread evenly.
fn normalize_phases(phases: &mut [f64; 3]) {
    let winding = (phases.iter().sum::<f64>() / (2.0 * PI)).round();
    if winding != 0.0 {
        let shift = 2.0 * PI * winding;
        let k = (0..3)
            .max_by(|&a, &b| (phases[a] * shift).total_cmp(&(phases[b] * shift)))
            .unwrap_or(2);
        phases[k] -= shift;
    }
    let residual = phases.iter().sum::<f64>() / 3.0;
    for phase in phases.iter_mut() {
        *phase -= residual;
    }
}

/// `V diag(values) V†`.
fn spectral_sum(basis: &CMatrix3, values: [C64; 3]) -> CMatrix3 {
    basis * CMatrix3::from_diagonal(&CVector3::from(values)) * basis.adjoint()
}

/// `exp(X)` by Taylor series.
fn exp_series(x: &CMatrix3) -> CMatrix3 {
    let mut term = CMatrix3::identity();
    let mut sum = term;
    for k in 1..=EXP_SERIES_TERMS {
        term = term * x * c(1.0 / k as f64, 0.0);
        sum += term;
    }
    sum
}

/// `log(1 + X)` by Taylor series.
fn log_series(x: &CMatrix3) -> CMatrix3 {
    let mut power = *x;
    let mut sum = CMatrix3::zeros();
    for k in 1..=LOG_SERIES_TERMS {
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        sum += power * c(sign / k as f64, 0.0);
        power *= x;
    }
    sum
}

// ============================================================================
// SU(3) Group
// ============================================================================

/// SU(3) group element as 3×3 complex matrix.
///
/// Must satisfy U† U = I and det(U) = 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SU3 {
    pub m: CMatrix3,
}

impl SU3 {
    /// Create new SU(3) element, projected onto the group.
    pub fn new(m: CMatrix3) -> Self {
        Self { m: reunitarize(&m) }
    }

    /// Wrap a matrix that is already in SU(3).
    pub fn from_matrix_unchecked(m: CMatrix3) -> Self {
        Self { m }
    }

    /// Complex determinant.
    pub fn det(&self) -> C64 {
        self.m.determinant()
    }
}

impl Group for SU3 {
    type Algebra = Su3Algebra;

    const N_COLORS: usize = 3;

    fn identity() -> Self {
        Self {
            m: CMatrix3::identity(),
        }
    }

    fn mul(&self, other: &Self) -> Self {
        Self {
            m: self.m * other.m,
        }
    }

    fn adj(&self) -> Self {
        Self {
            m: self.m.adjoint(),
        }
    }

    fn re_tr(&self) -> f64 {
        self.m.trace().re
    }

    fn random<R: Rng>(rng: &mut R) -> Self {
        // Gaussian entries + Gram-Schmidt
        let mut m = CMatrix3::zeros();
        for z in m.iter_mut() {
            *z = c(rng.sample(StandardNormal), rng.sample(StandardNormal));
        }
        Self::new(m)
    }

    fn exp(a: &Su3Algebra) -> Self {
        let h = algebra_to_matrix(a);
        if a.square_norm() < SMALL_ARGUMENT {
            return Self::new(exp_series(&(h * c(0.0, 1.0))));
        }
        let (basis, lambda) = jacobi_refine(&h, eigenbasis(&h, &hermitian_eigenvalues(&h)));
        Self::new(spectral_sum(&basis, lambda.map(|phi| C64::from_polar(1.0, phi))))
    }

    fn exp_linearized(a: &Su3Algebra) -> Result<Self> {
        check_linearized_domain(0.25 * a.square_norm())?;
        Ok(Self::new(
            CMatrix3::identity() + algebra_to_matrix(a) * c(0.0, 1.0),
        ))
    }

    fn log(&self) -> Su3Algebra {
        let u = &self.m;
        if self.re_tr() >= 3.0 - NEAR_IDENTITY {
            trace!(re_tr = self.re_tr(), "su3 log via series");
            let l = log_series(&(u - CMatrix3::identity()));
            return hermitian_to_algebra(&hermitize(&(l * c(0.0, -1.0))));
        }

        let lambda = unitary_eigenvalues(u);
        let guess = eigenbasis(u, &lambda);
        let Some(transformed) = cayley(u, &lambda) else {
            warn!(re_tr = self.re_tr(), "su3 log: singular Cayley transform, falling back to proj");
            return self.proj();
        };
        let (basis, _) = jacobi_refine(&transformed, guess);

        let mut phases = [0, 1, 2].map(|m| {
            let v = basis.column(m);
            v.dotc(&(u * &v)).arg()
        });
        normalize_phases(&mut phases);
        trace!(?phases, "su3 log via eigen-decomposition");

        let a = spectral_sum(&basis, phases.map(C64::from));
        hermitian_to_algebra(&hermitize(&a))
    }

    fn proj(&self) -> Su3Algebra {
        // (U - U†)/(2i) has coefficients Im tr(λ_b U)
        hermitian_to_algebra(&((self.m - self.m.adjoint()) * c(0.0, -0.5)))
    }

    fn act(&self, x: &Su3Algebra) -> Su3Algebra {
        hermitian_to_algebra(&(self.m * algebra_to_matrix(x) * self.m.adjoint()))
    }

    fn unitarity_defect(&self) -> f64 {
        (self.m * self.m.adjoint() - CMatrix3::identity()).norm() + (self.det() - c(1.0, 0.0)).norm()
    }
}
