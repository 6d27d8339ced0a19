//! Conversions of polynomials to arbitrary precision integers.

use super::{Poly, Representation};
use num_bigint::{BigInt, BigUint};
use num_traits::Zero;

impl From<&Poly> for Vec<BigUint> {
    /// Coefficients in [0, q) of the polynomial in power basis.
    fn from(p: &Poly) -> Self {
        let power_basis;
        let p = if p.representation == Representation::PowerBasis {
            p
        } else {
            let mut q = p.clone();
            q.change_representation(Representation::PowerBasis);
            power_basis = q;
            &power_basis
        };
        p.coefficients
            .columns()
            .into_iter()
            .map(|column| p.ctx.rns.lift(column))
            .collect()
    }
}

impl Poly {
    /// Coefficients of the polynomial in power basis, centered in (-q/2, q/2].
    pub fn centered_coefficients(&self) -> Vec<BigInt> {
        let modulus = BigInt::from(self.ctx.modulus().clone());
        let half: BigInt = &modulus >> 1usize;
        Vec::<BigUint>::from(self)
            .into_iter()
            .map(|c| {
                let c = BigInt::from(c);
                if c > half {
                    c - &modulus
                } else {
                    c
                }
            })
            .collect()
    }

    /// Largest absolute value of the centered coefficients.
    pub fn infinity_norm(&self) -> BigUint {
        self.centered_coefficients()
            .into_iter()
            .map(|c| c.magnitude().clone())
            .fold(BigUint::zero(), |acc, c| acc.max(c))
    }
}

#[cfg(test)]
mod tests {
    use crate::rq::{Context, Poly, Representation};
    use num_bigint::{BigInt, BigUint};
    use std::{error::Error, sync::Arc};

    const MODULI: &[u64; 2] = &[4611686018326724609, 4611686018309947393];

    #[test]
    fn centered() -> Result<(), Box<dyn Error>> {
        let ctx = Arc::new(Context::new(MODULI, 16)?);
        let p = Poly::from_i64(&[-3, 0, 7, -1], &ctx, Representation::Ntt)?;
        let mut expected = vec![BigInt::from(0); 16];
        expected[0] = BigInt::from(-3);
        expected[2] = BigInt::from(7);
        expected[3] = BigInt::from(-1);
        assert_eq!(p.centered_coefficients(), expected);
        assert_eq!(p.infinity_norm(), BigUint::from(7u64));

        let q = Vec::<BigUint>::from(&p);
        assert_eq!(q[0], ctx.modulus() - BigUint::from(3u64));
        assert_eq!(q[2], BigUint::from(7u64));
        Ok(())
    }
}
