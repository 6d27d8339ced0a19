//! Multi-key ciphertexts.

use crate::mkrlwe::{IdentitySet, Parameters, PartyId};
use crate::{Error, Result};
use mkhe_math::rq::{Poly, Representation};
use mkhe_traits::FheParametrized;
use std::sync::Arc;

/// A ciphertext carrying contributions from several parties.
///
/// It decrypts to `common + Σ s_id · c_id`, where the sum ranges over its
/// identity set. Every polynomial is in Ntt representation over the Q primes
/// of the ciphertext level, and the party components are sorted by
/// [`PartyId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext {
    pub(crate) par: Arc<Parameters>,
    pub(crate) level: usize,
    pub(crate) common: Poly,
    pub(crate) parties: Vec<(PartyId, Poly)>,
}

impl FheParametrized for Ciphertext {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        &self.par
    }
}

impl Ciphertext {
    /// A ciphertext of zero without any party, at a level.
    pub fn zero(par: &Arc<Parameters>, level: usize) -> Result<Self> {
        let ctx = par.ctx_at_level(level)?;
        Ok(Self {
            par: par.clone(),
            level,
            common: Poly::zero(ctx, Representation::Ntt),
            parties: vec![],
        })
    }

    /// Create a ciphertext from its common component and party components.
    ///
    /// The level is read from the context of the common component; every
    /// polynomial must be in Ntt representation over that context and the
    /// parties must be distinct.
    pub fn new(
        par: &Arc<Parameters>,
        common: Poly,
        mut parties: Vec<(PartyId, Poly)>,
    ) -> Result<Self> {
        let level = par.level_of_ctx(common.ctx())?;
        parties.sort_by_key(|(id, _)| *id);
        let ct = Self {
            par: par.clone(),
            level,
            common,
            parties,
        };
        ct.check_consistency()?;
        Ok(ct)
    }

    /// The level of the ciphertext.
    pub fn level(&self) -> usize {
        self.level
    }

    /// The parties whose secret keys are needed to decrypt.
    pub fn identity_set(&self) -> IdentitySet {
        self.parties.iter().map(|(id, _)| *id).collect()
    }

    /// The common component.
    pub fn common(&self) -> &Poly {
        &self.common
    }

    /// The component of a party, if the party contributes to the ciphertext.
    pub fn get(&self, id: PartyId) -> Option<&Poly> {
        self.position(id).ok().map(|i| &self.parties[i].1)
    }

    /// Party components in increasing [`PartyId`] order.
    pub fn parties(&self) -> impl Iterator<Item = (PartyId, &Poly)> {
        self.parties.iter().map(|(id, p)| (*id, p))
    }

    /// Number of contributing parties.
    pub fn party_count(&self) -> usize {
        self.parties.len()
    }

    /// Drops the Q primes above `level`. This is a modulus truncation: the
    /// ciphertext still decrypts to the same value modulo the smaller Q.
    pub fn drop_to_level(&mut self, level: usize) -> Result<()> {
        if level > self.level {
            return Err(Error::LevelMismatch {
                expected: level,
                found: self.level,
            });
        }
        if level == self.level {
            return Ok(());
        }
        let ctx = self.par.ctx_at_level(level)?;
        self.common = self.common.truncate(ctx)?;
        for (_, p) in self.parties.iter_mut() {
            *p = p.truncate(ctx)?;
        }
        self.level = level;
        Ok(())
    }

    /// Whether the shape of the ciphertext matches its parameters.
    pub fn is_consistent(&self) -> bool {
        self.check_consistency().is_ok()
    }

    pub(crate) fn check_consistency(&self) -> Result<()> {
        let ctx = self
            .par
            .ctx_at_level(self.level)
            .map_err(|_| Error::MalformedCiphertext(format!("invalid level {}", self.level)))?;
        for p in std::iter::once(&self.common).chain(self.parties.iter().map(|(_, p)| p)) {
            if p.ctx().moduli() != ctx.moduli() || p.ctx().degree() != ctx.degree() {
                return Err(Error::MalformedCiphertext(
                    "a component does not match the ciphertext level".to_string(),
                ));
            }
            if p.representation() != &Representation::Ntt {
                return Err(Error::MalformedCiphertext(format!(
                    "a component is in {:?} representation",
                    p.representation()
                )));
            }
        }
        if self.parties.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(Error::MalformedCiphertext(
                "party components are not sorted and distinct".to_string(),
            ));
        }
        Ok(())
    }

    fn position(&self, id: PartyId) -> std::result::Result<usize, usize> {
        self.parties.binary_search_by_key(&id, |(i, _)| *i)
    }

    /// The component of a party, inserted as zero if absent.
    pub(crate) fn entry(&mut self, id: PartyId) -> &mut Poly {
        let i = match self.position(id) {
            Ok(i) => i,
            Err(i) => {
                let zero = Poly::zero(self.common.ctx(), Representation::Ntt);
                self.parties.insert(i, (id, zero));
                i
            }
        };
        &mut self.parties[i].1
    }

    /// Removes and returns the component of a party.
    pub(crate) fn remove(&mut self, id: PartyId) -> Option<Poly> {
        self.position(id).ok().map(|i| self.parties.remove(i).1)
    }
}
