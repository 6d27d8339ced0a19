//! Secret keys of the multi-key scheme

use crate::mkrlwe::{Parameters, PartyId, QpPoly, SecretDistribution};
use crate::{Error, Result};
use mkhe_math::rq::Poly;
use mkhe_traits::FheParametrized;
use mkhe_util::{sample_vec_gaussian, sample_vec_sparse_ternary, sample_vec_ternary};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

/// Secret key of one party.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    #[zeroize(skip)]
    pub(crate) par: Arc<Parameters>,
    #[zeroize(skip)]
    pub(crate) id: PartyId,
    /// The secret key coefficients
    pub(crate) coeffs: Box<[i64]>,
    /// The secret key over the full Q chain and P, in Ntt representation.
    pub(crate) value: QpPoly,
}

impl FheParametrized for SecretKey {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        &self.par
    }
}

impl SecretKey {
    /// Generate a random [`SecretKey`] following the secret distribution of
    /// the parameters.
    pub fn random<R: RngCore + CryptoRng>(
        par: &Arc<Parameters>,
        id: PartyId,
        rng: &mut R,
    ) -> Result<Self> {
        let coeffs = match par.secret_distribution() {
            SecretDistribution::Ternary => sample_vec_ternary(par.degree(), rng),
            SecretDistribution::SparseTernary(h) => {
                sample_vec_sparse_ternary(par.degree(), h, rng)?
            }
            SecretDistribution::Gaussian => sample_vec_gaussian(par.degree(), par.sigma(), rng)?,
        };
        Self::new(coeffs, id, par)
    }

    /// Generate a [`SecretKey`] from its coefficients.
    pub fn new(coeffs: Vec<i64>, id: PartyId, par: &Arc<Parameters>) -> Result<Self> {
        if coeffs.len() != par.degree() {
            return Err(Error::DefaultError(format!(
                "Expected {} secret key coefficients, found {}",
                par.degree(),
                coeffs.len()
            )));
        }
        let full = par.ctx_at_level(par.max_level())?;
        let value = QpPoly::from_i64(&coeffs, full, par.ctx_p())?;
        Ok(Self {
            par: par.clone(),
            id,
            coeffs: coeffs.into_boxed_slice(),
            value,
        })
    }

    /// The party owning this key.
    pub fn id(&self) -> PartyId {
        self.id
    }

    /// The secret restricted to the Q primes of a level, in Ntt representation.
    pub(crate) fn poly_at_level(&self, level: usize) -> Result<Poly> {
        let ctx = self.par.ctx_at_level(level)?;
        Ok(self.value.q.truncate(ctx)?)
    }
}
