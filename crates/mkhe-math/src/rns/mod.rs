//! Residue-Number System operations.

mod extender;

pub use extender::BasisExtender;

use crate::{Error, Result};
use itertools::{izip, Itertools};
use ndarray::ArrayView1;
use num_bigint::BigUint;
use num_bigint_dig::{BigUint as BigUintDig, ModInverse};
use num_traits::{One, ToPrimitive, Zero};
use std::fmt::Debug;

/// Context for a Residue Number System.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct RnsContext {
    moduli_u64: Vec<u64>,
    garner: Vec<BigUint>,
    product: BigUint,
}

impl Debug for RnsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RnsContext")
            .field("moduli_u64", &self.moduli_u64)
            .field("product", &self.product)
            .finish()
    }
}

impl RnsContext {
    /// Create a RNS context from a list of moduli.
    ///
    /// Returns an error if the list is empty, or if the moduli are not coprime.
    pub fn new(moduli_u64: &[u64]) -> Result<Self> {
        if moduli_u64.is_empty() {
            return Err(Error::Default("The list of moduli is empty".to_string()));
        }

        let product = moduli_u64
            .iter()
            .fold(BigUint::one(), |acc, qi| acc * BigUint::from(*qi));
        let product_dig = moduli_u64
            .iter()
            .fold(BigUintDig::one(), |acc, qi| acc * BigUintDig::from(*qi));

        // q_star_i = product / q_i is invertible modulo q_i iff q_i is coprime
        // with every other modulus.
        let garner = moduli_u64
            .iter()
            .map(|qi| {
                let q_tilde_i = (&product_dig / qi)
                    .mod_inverse(BigUintDig::from(*qi))
                    .and_then(|inv| inv.to_u64())
                    .ok_or_else(|| Error::Default("The moduli are not coprime".to_string()))?;
                Ok((&product / BigUint::from(*qi)) * BigUint::from(q_tilde_i))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            moduli_u64: moduli_u64.to_vec(),
            garner,
            product,
        })
    }

    /// Returns the product of the moduli used when creating the RNS context.
    pub const fn modulus(&self) -> &BigUint {
        &self.product
    }

    /// Returns the moduli of the RNS context.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli_u64
    }

    /// Project a BigUint into its rests.
    pub fn project(&self, a: &BigUint) -> Vec<u64> {
        self.moduli_u64
            .iter()
            .map(|qi| (a % qi).to_u64().unwrap_or_default())
            .collect_vec()
    }

    /// Lift rests into a BigUint in [0, product).
    ///
    /// Aborts if the number of rests is different than the number of moduli in
    /// debug mode.
    pub fn lift(&self, rests: ArrayView1<u64>) -> BigUint {
        debug_assert_eq!(rests.len(), self.moduli_u64.len());
        let mut result = BigUint::zero();
        izip!(rests.iter(), self.garner.iter())
            .for_each(|(r_i, garner_i)| result += garner_i * BigUint::from(*r_i));
        result % &self.product
    }

    /// Getter for the i-th garner coefficient.
    pub fn get_garner(&self, i: usize) -> Option<&BigUint> {
        self.garner.get(i)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::RnsContext;
    use ndarray::ArrayView1;
    use num_bigint::BigUint;
    use rand::{thread_rng, RngCore};

    #[test]
    fn constructor() {
        assert!(RnsContext::new(&[2]).is_ok());
        assert!(RnsContext::new(&[2, 3]).is_ok());
        assert!(RnsContext::new(&[4, 15, 1153]).is_ok());

        let e = RnsContext::new(&[]);
        assert_eq!(e.unwrap_err().to_string(), "The list of moduli is empty");
        let e = RnsContext::new(&[2, 4]);
        assert_eq!(e.unwrap_err().to_string(), "The moduli are not coprime");
        let e = RnsContext::new(&[2, 3, 5, 30]);
        assert_eq!(e.unwrap_err().to_string(), "The moduli are not coprime");
    }

    #[test]
    fn garner() -> Result<(), Box<dyn Error>> {
        let rns = RnsContext::new(&[4, 15, 1153])?;
        let product = BigUint::from(4u64 * 15 * 1153);
        for (i, qi) in [4u64, 15, 1153].iter().enumerate() {
            let gi = rns.get_garner(i).ok_or("missing garner coefficient")?;
            // g_i = 1 mod q_i and 0 mod q_j for j != i.
            let qi = BigUint::from(*qi);
            assert_eq!(gi % &qi, BigUint::from(1u64) % &qi);
            assert_eq!((gi * &qi) % &product, BigUint::from(0u64));
        }
        assert!(rns.get_garner(3).is_none());
        Ok(())
    }

    #[test]
    fn project_lift() -> Result<(), Box<dyn Error>> {
        let rns = RnsContext::new(&[4, 15, 1153])?;
        let product = 4u64 * 15 * 1153;
        assert_eq!(rns.modulus(), &BigUint::from(product));

        let mut rests = rns.project(&BigUint::from(1153u64));
        assert_eq!(&rests, &[1u64, 13, 0]);
        assert_eq!(rns.lift(ArrayView1::from(&rests)), BigUint::from(1153u64));

        rests = rns.project(&BigUint::from(product - 1));
        assert_eq!(&rests, &[3u64, 14, 1152]);
        assert_eq!(rns.lift(ArrayView1::from(&rests)), BigUint::from(product - 1));

        let mut rng = thread_rng();
        for _ in 0..100 {
            let b = BigUint::from(rng.next_u64() % product);
            rests = rns.project(&b);
            assert_eq!(rns.lift(ArrayView1::from(&rests)), b);
        }
        Ok(())
    }
}
