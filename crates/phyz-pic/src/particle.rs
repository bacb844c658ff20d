//! Particle state for the Cartesian and the parallel-transported schemes.

use phyz_gauge::{Group, LieAlgebra};

use crate::error::{PicError, Result};

/// Point charge for the Cartesian charge-conserving scheme.
///
/// Positions are absolute, in the same units as the grid spacing.
#[derive(Debug, Clone)]
pub struct Particle<const D: usize> {
    /// Position at t.
    pub pos0: [f64; D],
    /// Position at t + dt.
    pub pos1: [f64; D],
    pub vel: [f64; D],
    pub charge: f64,
    pub mass: f64,
    /// Electric field sampled at `pos1`.
    pub e: [f64; D],
    /// Time-averaged field strength `F_ij`, antisymmetric.
    pub f: [[f64; D]; D],
}

impl<const D: usize> Particle<D> {
    /// Create a particle at rest at `pos`.
    pub fn new(pos: [f64; D], charge: f64, mass: f64) -> Self {
        Self {
            pos0: pos,
            pos1: pos,
            vel: [0.0; D],
            charge,
            mass,
            e: [0.0; D],
            f: [[0.0; D]; D],
        }
    }

    /// Particle whose step goes from `pos0` to `pos1` in `dt`.
    pub fn moving(pos0: [f64; D], pos1: [f64; D], dt: f64, charge: f64, mass: f64) -> Self {
        let mut vel = [0.0; D];
        for i in 0..D {
            vel[i] = (pos1[i] - pos0[i]) / dt;
        }
        Self {
            pos0,
            pos1,
            vel,
            ..Self::new(pos0, charge, mass)
        }
    }

    /// `pos1 - pos0`.
    pub fn displacement(&self) -> [f64; D] {
        let mut d = [0.0; D];
        for i in 0..D {
            d[i] = self.pos1[i] - self.pos0[i];
        }
        d
    }

    /// Start the next step from the current end point.
    pub fn advance(&mut self, dt: f64) {
        self.pos0 = self.pos1;
        for i in 0..D {
            self.pos1[i] = self.pos0[i] + self.vel[i] * dt;
        }
    }
}

/// Colored point charge moving along one lattice axis.
///
/// Both charges are stored in the color frame of the nearest grid point
/// along `direction` at their respective time.
#[derive(Debug, Clone)]
pub struct CgcParticle<G: Group, const D: usize> {
    pub pos0: [f64; D],
    pub pos1: [f64; D],
    pub vel: [f64; D],
    /// Axis of motion.
    pub direction: usize,
    /// Charge at t.
    pub q0: G::Algebra,
    /// Charge at t + dt.
    pub q1: G::Algebra,
    /// Link taking `q0` into the frame of the new nearest grid point.
    pub transport: G,
    /// Whether the last step changed the nearest grid point.
    pub update_charge: bool,
}

impl<G: Group, const D: usize> CgcParticle<G, D> {
    /// Particle at `pos0` moving with `speed` (signed) along `direction`,
    /// with `pos1` one step of `dt` ahead.
    pub fn new(pos0: [f64; D], direction: usize, speed: f64, dt: f64, charge: G::Algebra) -> Result<Self> {
        if direction >= D {
            return Err(PicError::InvalidParameter(format!(
                "direction {direction} out of range for {D} dimensions"
            )));
        }
        let mut vel = [0.0; D];
        vel[direction] = speed;
        let mut pos1 = pos0;
        pos1[direction] += speed * dt;
        Ok(Self {
            pos0,
            pos1,
            vel,
            direction,
            q0: charge,
            q1: charge,
            transport: G::identity(),
            update_charge: false,
        })
    }

    /// Shift the state one step: old ← new, then `pos1 = pos0 + v·dt`.
    pub fn advance(&mut self, dt: f64) {
        self.pos0 = self.pos1;
        self.q0 = self.q1;
        for i in 0..D {
            self.pos1[i] = self.pos0[i] + self.vel[i] * dt;
        }
    }

    /// Parallel transport of the charge into the new NGP frame.
    pub fn update_charge(&mut self) {
        self.q1 = if self.update_charge {
            self.transport.adj().act(&self.q0)
        } else {
            self.q0
        };
    }

    /// True once `pos1` has left `[0, extent]` on any axis.
    pub fn is_outside(&self, extent: &[f64; D]) -> bool {
        (0..D).any(|i| self.pos1[i] < 0.0 || self.pos1[i] > extent[i])
    }

    /// `|q1|²`.
    pub fn charge_square_norm(&self) -> f64 {
        self.q1.square_norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use phyz_gauge::{SU2, Su2Algebra};

    #[test]
    fn test_cartesian_particle_advance() {
        let mut p = Particle::<2>::moving([1.0, 2.0], [1.5, 1.75], 0.5, 1.0, 1.0);
        assert_relative_eq!(p.vel[0], 1.0);
        assert_relative_eq!(p.vel[1], -0.5);
        assert_eq!(p.displacement(), [0.5, -0.25]);

        p.advance(0.5);
        assert_eq!(p.pos0, [1.5, 1.75]);
        assert_eq!(p.pos1, [2.0, 1.5]);
    }

    #[test]
    fn test_cgc_particle_bad_direction() {
        let q = Su2Algebra::new([1.0, 0.0, 0.0]);
        assert!(CgcParticle::<SU2, 2>::new([0.5, 0.5], 2, 1.0, 0.1, q).is_err());
    }

    #[test]
    fn test_cgc_update_charge() {
        let q = Su2Algebra::new([1.0, 0.0, 0.0]);
        let mut p = CgcParticle::<SU2, 2>::new([0.5, 0.5], 0, 1.0, 0.25, q).unwrap();
        assert_eq!(p.pos1, [0.75, 0.5]);

        // unflagged: charge carried over untouched
        p.transport = SU2::exp(&Su2Algebra::new([0.0, 0.0, 1.0]));
        p.update_charge();
        assert_eq!(p.q1, q);

        p.update_charge = true;
        p.update_charge();
        let expected = p.transport.adj().act(&q);
        assert_eq!(p.q1, expected);
        assert_relative_eq!(p.q1.square_norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cgc_advance_and_removal() {
        let q = Su2Algebra::new([0.0, 1.0, 0.0]);
        let mut p = CgcParticle::<SU2, 2>::new([3.9, 0.5], 0, 1.0, 0.25, q).unwrap();
        let extent = [4.0, 4.0];
        assert!(p.is_outside(&extent));

        p.q1 = q * 2.0;
        p.advance(0.25);
        assert_relative_eq!(p.pos0[0], 4.15, epsilon = 1e-12);
        assert_eq!(p.pos0[1], 0.5);
        assert_eq!(p.q0, q * 2.0);
        assert!(p.is_outside(&extent));

        let inside = CgcParticle::<SU2, 2>::new([1.0, 0.5], 0, -1.0, 0.25, q).unwrap();
        assert!(!inside.is_outside(&extent));
    }
}
