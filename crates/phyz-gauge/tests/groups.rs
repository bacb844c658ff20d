//! Group-generic properties shared by U(1), SU(2) and SU(3).

use approx::assert_abs_diff_eq;
use phyz_gauge::{Group, LieAlgebra, SU2, SU3, U1};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn small_algebra<G: Group>(scale: f64) -> G::Algebra {
    G::Algebra::from_fn(|a| scale * (0.7 - 0.3 * a as f64))
}

fn assert_close<G: Group>(a: &G, b: &G, eps: f64) {
    let diff = a.mul(&b.adj()).log();
    assert!(
        diff.square_norm().sqrt() < eps,
        "{a:?} vs {b:?}: |log(a b†)| = {:e}",
        diff.square_norm().sqrt()
    );
}

fn check_group_laws<G: Group>() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..20 {
        let u = G::random(&mut rng);
        let v = G::random(&mut rng);
        let w = G::random(&mut rng);

        // associativity and inverse
        assert_close(&u.mul(&v).mul(&w), &u.mul(&v.mul(&w)), 1e-10);
        assert_close(&u.mul(&u.adj()), &G::identity(), 1e-10);
        assert!(u.unitarity_defect() < 1e-12);
        assert!(u.mul(&v).unitarity_defect() < 1e-12);

        // exp ∘ log
        assert_close(&G::exp(&u.log()), &u, 1e-10);

        // Re tr(U) is conjugation invariant
        assert_abs_diff_eq!(v.mul(&u).mul(&v.adj()).re_tr(), u.re_tr(), epsilon = 1e-12);
    }
}

fn check_transport<G: Group>() {
    let mut rng = StdRng::seed_from_u64(11);
    let u = G::random(&mut rng);
    let v = G::random(&mut rng);
    let q = small_algebra::<G>(0.5);

    // act is a homomorphism: (UV)·q = U·(V·q)
    let lhs = u.mul(&v).act(&q);
    let rhs = u.act(&v.act(&q));
    assert_abs_diff_eq!((lhs - rhs).square_norm(), 0.0, epsilon = 1e-20);

    // transport there and back
    let back = u.adj().act(&u.act(&q));
    assert_abs_diff_eq!((back - q).square_norm(), 0.0, epsilon = 1e-20);
}

fn check_linearized<G: Group>() {
    let a = small_algebra::<G>(1e-3);
    let lin = G::exp_linearized(&a).expect("small argument is in range");
    assert_close(&lin, &G::exp(&a), 1e-4);
    assert!(G::exp_linearized(&small_algebra::<G>(1e3)).is_err());

    let u = G::exp(&small_algebra::<G>(1e-4));
    let p = u.proj();
    let l = u.log();
    assert_abs_diff_eq!((p - l).square_norm(), 0.0, epsilon = 1e-20);
}

#[test]
fn u1_group_laws() {
    check_group_laws::<U1>();
    check_transport::<U1>();
    check_linearized::<U1>();
}

#[test]
fn su2_group_laws() {
    check_group_laws::<SU2>();
    check_transport::<SU2>();
    check_linearized::<SU2>();
}

#[test]
fn su3_group_laws() {
    check_group_laws::<SU3>();
    check_transport::<SU3>();
    check_linearized::<SU3>();
}

#[test]
fn dimensions_and_colors() {
    assert_eq!(<<U1 as Group>::Algebra as LieAlgebra>::DIM, 1);
    assert_eq!(<<SU2 as Group>::Algebra as LieAlgebra>::DIM, 3);
    assert_eq!(<<SU3 as Group>::Algebra as LieAlgebra>::DIM, 8);
    assert_eq!(U1::N_COLORS, 1);
    assert_eq!(SU2::N_COLORS, 2);
    assert_eq!(SU3::N_COLORS, 3);
}

#[test]
fn pow_interpolates_between_identity_and_element() {
    let u = SU3::exp(&small_algebra::<SU3>(0.4));
    assert_close(&u.pow(0.0), &SU3::identity(), 1e-12);
    assert_close(&u.pow(1.0), &u, 1e-12);
    assert_close(&u.pow(0.5).mul(&u.pow(0.5)), &u, 1e-12);
}
