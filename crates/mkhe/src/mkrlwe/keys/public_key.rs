//! Public keys of the multi-key scheme

use crate::mkrlwe::{CrsSlot, Parameters, PartyId, SecretKey};
use crate::Result;
use mkhe_math::rq::{Poly, Representation};
use mkhe_traits::FheParametrized;
use mkhe_util::sample_vec_gaussian;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Public key of one party: the pair (-s·a + e, a) over the full Q chain,
/// where a is the first entry of the relinearization reference string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub(crate) par: Arc<Parameters>,
    pub(crate) id: PartyId,
    pub(crate) b: Poly,
    pub(crate) a: Poly,
}

impl FheParametrized for PublicKey {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        &self.par
    }
}

impl PublicKey {
    /// Generate a new [`PublicKey`] from a [`SecretKey`].
    pub fn new<R: RngCore + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<Self> {
        let par = &sk.par;
        let ctx = par.ctx_at_level(par.max_level())?;
        let a = par.crs().get(CrsSlot::Relin)?[0].q.clone();

        let e = Zeroizing::new(sample_vec_gaussian(par.degree(), par.sigma(), rng)?);
        let mut b = Poly::from_i64(&e, ctx, Representation::Ntt)?;
        b -= &(&a * &sk.value.q);

        Ok(Self {
            par: par.clone(),
            id: sk.id,
            b,
            a,
        })
    }

    /// The party owning this key.
    pub fn id(&self) -> PartyId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::PublicKey;
    use crate::mkrlwe::{Parameters, PartyId, SecretKey};
    use mkhe_math::rq::Representation;
    use num_bigint::BigInt;
    use num_traits::Signed;
    use rand::thread_rng;
    use std::error::Error;

    #[test]
    fn is_an_encryption_of_zero() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let par = Parameters::default_arc(2, 2, 16);
        let sk = SecretKey::random(&par, PartyId::new(4), &mut rng)?;
        let pk = PublicKey::new(&sk, &mut rng)?;
        assert_eq!(pk.id(), PartyId::new(4));

        let mut e = &pk.b + &(&pk.a * &sk.value.q);
        e.change_representation(Representation::PowerBasis);
        for c in e.centered_coefficients() {
            assert!(c.abs() <= BigInt::from(20));
        }
        Ok(())
    }
}
