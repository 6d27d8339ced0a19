//! Rotation and conjugation keys

use crate::mkrlwe::{CrsSlot, Parameters, PartyId, QpPoly, SecretKey};
use crate::Result;
use mkhe_math::rq::{Representation, SubstitutionExponent};
use mkhe_traits::FheParametrized;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Gadget encryption of σ(s) under s with the masks of `slot`.
fn galois_key<R: RngCore + CryptoRng>(
    sk: &SecretKey,
    exponent: &SubstitutionExponent,
    slot: CrsSlot,
    rng: &mut R,
) -> Result<Vec<QpPoly>> {
    let par = &sk.par;
    let mask = par.crs().get(slot)?;
    let target = Zeroizing::new(sk.value.q.substitute(exponent)?);
    let mut key = par
        .gadget()
        .switching_key(&sk.value, &target, mask, par.sigma(), rng)?;
    key.iter_mut()
        .for_each(|k| k.change_representation(Representation::NttShoup));
    Ok(key)
}

/// Key switching from σ_k(s) to s, where σ_k maps x to x^(5^k) and rotates
/// the slots by k positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationKey {
    pub(crate) par: Arc<Parameters>,
    pub(crate) id: PartyId,
    pub(crate) amount: usize,
    pub(crate) value: Vec<QpPoly>,
}

impl FheParametrized for RotationKey {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        &self.par
    }
}

impl RotationKey {
    /// Generate the [`RotationKey`] of a rotation amount. Fails with
    /// [`crate::Error::MissingCrs`] if the amount was not registered in the
    /// parameters.
    pub fn new<R: RngCore + CryptoRng>(sk: &SecretKey, amount: usize, rng: &mut R) -> Result<Self> {
        let amount = sk.par.normalize_rotation(amount);
        let exponent = sk.par.rotation_exponent(amount)?;
        let value = galois_key(sk, &exponent, CrsSlot::Rotation(amount), rng)?;
        Ok(Self {
            par: sk.par.clone(),
            id: sk.id,
            amount,
            value,
        })
    }

    /// The party owning this key.
    pub fn id(&self) -> PartyId {
        self.id
    }

    /// The rotation amount, reduced modulo degree / 2.
    pub fn amount(&self) -> usize {
        self.amount
    }
}

/// Key switching from σ(s) to s, where σ maps x to x^(2N - 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConjugationKey {
    pub(crate) par: Arc<Parameters>,
    pub(crate) id: PartyId,
    pub(crate) value: Vec<QpPoly>,
}

impl FheParametrized for ConjugationKey {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        &self.par
    }
}

impl ConjugationKey {
    /// Generate a [`ConjugationKey`]. Fails with [`crate::Error::MissingCrs`]
    /// if conjugation was not enabled in the parameters.
    pub fn new<R: RngCore + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<Self> {
        let exponent = sk.par.conjugation_exponent()?;
        let value = galois_key(sk, &exponent, CrsSlot::Conjugation, rng)?;
        Ok(Self {
            par: sk.par.clone(),
            id: sk.id,
            value,
        })
    }

    /// The party owning this key.
    pub fn id(&self) -> PartyId {
        self.id
    }
}
