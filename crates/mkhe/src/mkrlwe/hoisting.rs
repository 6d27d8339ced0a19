//! Ciphertexts with precomputed gadget decompositions.

use crate::mkrlwe::{Ciphertext, IdentitySet, Parameters, PartyId, QpPoly};
use crate::{Error, Result};
use mkhe_traits::FheParametrized;
use rayon::prelude::*;
use std::borrow::Cow;
use std::sync::Arc;

/// A ciphertext together with the gadget decomposition of each of its party
/// components. Key switching against any number of keys reuses the same
/// digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoistedCiphertext {
    pub(crate) ct: Ciphertext,
    /// Digits of the party components, in the order of `ct.parties`.
    pub(crate) digits: Vec<Vec<QpPoly>>,
}

impl FheParametrized for HoistedCiphertext {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        &self.ct.par
    }
}

impl HoistedCiphertext {
    /// Decomposes every party component of `ct`.
    pub fn new(ct: &Ciphertext) -> Result<Self> {
        ct.check_consistency()?;
        let gadget = ct.par.gadget();
        let digits = ct
            .parties
            .par_iter()
            .map(|(_, c)| gadget.decompose(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            ct: ct.clone(),
            digits,
        })
    }

    /// The level of the hoisted ciphertext.
    pub fn level(&self) -> usize {
        self.ct.level
    }

    /// The ciphertext that was hoisted.
    pub fn ciphertext(&self) -> &Ciphertext {
        &self.ct
    }

    /// The parties whose secret keys are needed to decrypt.
    pub fn identity_set(&self) -> IdentitySet {
        self.ct.identity_set()
    }

    /// The digits of the component of a party.
    pub fn digits(&self, id: PartyId) -> Option<&[QpPoly]> {
        self.ct
            .parties
            .iter()
            .position(|(i, _)| *i == id)
            .map(|k| self.digits[k].as_slice())
    }

    /// Party components with their digits, in increasing [`PartyId`] order.
    pub(crate) fn components(&self) -> impl Iterator<Item = (PartyId, &[QpPoly])> {
        self.ct
            .parties
            .iter()
            .zip(self.digits.iter())
            .map(|((id, _), d)| (*id, d.as_slice()))
    }

    /// This hoisted ciphertext if it is at `level`, or the hoisting of the
    /// ciphertext dropped to `level`.
    pub(crate) fn at_level(&self, level: usize) -> Result<Cow<'_, HoistedCiphertext>> {
        if level > self.level() {
            return Err(Error::LevelMismatch {
                expected: level,
                found: self.level(),
            });
        }
        if level == self.level() {
            Ok(Cow::Borrowed(self))
        } else {
            let mut ct = self.ct.clone();
            ct.drop_to_level(level)?;
            Ok(Cow::Owned(HoistedCiphertext::new(&ct)?))
        }
    }
}
