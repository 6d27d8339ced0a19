//! Relinearization keys of the multi-key scheme

use crate::mkrlwe::{CrsSlot, Parameters, PartyId, QpPoly, SecretKey};
use crate::{Error, Result};
use mkhe_math::rq::{Poly, Representation};
use mkhe_traits::FheParametrized;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Relinearization key of one party, made of three gadget vectors:
/// - b = -s·a + e, an encryption of zero;
/// - d = -r·a + s·g + e, an encryption of s under the ephemeral secret r;
/// - v = -s·u - r·g + e, an encryption of -r under s;
///
/// where a and u are the relinearization and universal reference strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelinearizationKey {
    pub(crate) par: Arc<Parameters>,
    pub(crate) id: PartyId,
    pub(crate) b: Vec<QpPoly>,
    pub(crate) d: Vec<QpPoly>,
    pub(crate) v: Vec<QpPoly>,
}

impl FheParametrized for RelinearizationKey {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        &self.par
    }
}

impl RelinearizationKey {
    /// Generate a [`RelinearizationKey`] from a [`SecretKey`] and the
    /// ephemeral secret `r`, which must belong to the same party.
    pub fn new<R: RngCore + CryptoRng>(
        sk: &SecretKey,
        r: &SecretKey,
        rng: &mut R,
    ) -> Result<Self> {
        if sk.id != r.id || !sk.par.same_as(&r.par) {
            return Err(Error::ConfigError(
                "The ephemeral secret must belong to the same party and parameters".to_string(),
            ));
        }
        let par = &sk.par;
        let gadget = par.gadget();
        let a = par.crs().get(CrsSlot::Relin)?;
        let u = par.crs().get(CrsSlot::Universal)?;
        let zero = Poly::zero(sk.value.q.ctx(), Representation::Ntt);
        let minus_r = Zeroizing::new(-&r.value.q);

        let mut b = gadget.switching_key(&sk.value, &zero, a, par.sigma(), rng)?;
        let mut d = gadget.switching_key(&r.value, &sk.value.q, a, par.sigma(), rng)?;
        let mut v = gadget.switching_key(&sk.value, &minus_r, u, par.sigma(), rng)?;
        b.iter_mut()
            .chain(d.iter_mut())
            .chain(v.iter_mut())
            .for_each(|k| k.change_representation(Representation::NttShoup));

        Ok(Self {
            par: par.clone(),
            id: sk.id,
            b,
            d,
            v,
        })
    }

    /// The party owning this key.
    pub fn id(&self) -> PartyId {
        self.id
    }
}
