//! Common reference strings shared by every party.

use crate::mkrlwe::ring_qp::QpPoly;
use crate::{Error, Result};
use mkhe_math::rq::Context;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Slot of the common reference string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CrsSlot {
    /// Masks of the relinearization keys and of the public keys.
    Relin,
    /// Universal masks closing the relinearization protocol.
    Universal,
    /// Masks of the rotation keys for a rotation amount.
    Rotation(usize),
    /// Masks of the conjugation keys.
    Conjugation,
}

impl CrsSlot {
    fn domain(&self) -> Vec<u8> {
        let mut out = b"mkhe-crs/".to_vec();
        match self {
            CrsSlot::Relin => out.extend_from_slice(b"relin"),
            CrsSlot::Universal => out.extend_from_slice(b"universal"),
            CrsSlot::Rotation(k) => {
                out.extend_from_slice(b"rotation/");
                out.extend_from_slice(&(*k as u64).to_le_bytes());
            }
            CrsSlot::Conjugation => out.extend_from_slice(b"conjugation"),
        }
        out
    }
}

impl Display for CrsSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CrsSlot::Relin => write!(f, "relinearization"),
            CrsSlot::Universal => write!(f, "universal"),
            CrsSlot::Rotation(k) => write!(f, "rotation {k}"),
            CrsSlot::Conjugation => write!(f, "conjugation"),
        }
    }
}

/// Uniformly random gadget vectors over Q·P, one per registered slot,
/// expanded deterministically from a seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crs {
    seed: [u8; 32],
    slots: BTreeMap<CrsSlot, Vec<QpPoly>>,
}

impl Crs {
    /// Expands the gadget vectors of dimension `dimension` for every slot.
    pub(crate) fn new(
        seed: [u8; 32],
        slots: &[CrsSlot],
        dimension: usize,
        ctx_q: &Arc<Context>,
        ctx_p: &Arc<Context>,
    ) -> Self {
        let slots = slots
            .iter()
            .map(|slot| {
                let mut hasher = Sha256::new();
                hasher.update(seed);
                hasher.update(slot.domain());
                let mut prng = ChaCha8Rng::from_seed(hasher.finalize().into());
                let vector = (0..dimension)
                    .map(|_| QpPoly::random(ctx_q, ctx_p, &mut prng))
                    .collect();
                (*slot, vector)
            })
            .collect();
        Self { seed, slots }
    }

    /// The seed the strings were expanded from.
    pub fn seed(&self) -> &[u8; 32] {
        &self.seed
    }

    /// The gadget vector of a slot.
    pub fn get(&self, slot: CrsSlot) -> Result<&[QpPoly]> {
        self.slots
            .get(&slot)
            .map(Vec::as_slice)
            .ok_or(Error::MissingCrs(slot))
    }

    /// Registered slots, in increasing order.
    pub fn slots(&self) -> impl Iterator<Item = &CrsSlot> {
        self.slots.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::{Crs, CrsSlot};
    use crate::Error;
    use mkhe_math::rq::Context;
    use std::error::Error as StdError;

    #[test]
    fn deterministic_and_separated() -> Result<(), Box<dyn StdError>> {
        let ctx_q = Context::new_arc(&[4611686018326724609], 16)?;
        let ctx_p = Context::new_arc(&[4611686018309947393], 16)?;
        let slots = [CrsSlot::Relin, CrsSlot::Universal, CrsSlot::Rotation(1)];

        let crs = Crs::new([7u8; 32], &slots, 2, &ctx_q, &ctx_p);
        let again = Crs::new([7u8; 32], &slots, 2, &ctx_q, &ctx_p);
        let other = Crs::new([8u8; 32], &slots, 2, &ctx_q, &ctx_p);
        assert_eq!(crs, again);
        assert_ne!(crs.get(CrsSlot::Relin)?, other.get(CrsSlot::Relin)?);
        assert_ne!(crs.get(CrsSlot::Relin)?, crs.get(CrsSlot::Universal)?);
        assert_eq!(crs.get(CrsSlot::Rotation(1))?.len(), 2);
        assert_eq!(
            crs.get(CrsSlot::Rotation(2)).err(),
            Some(Error::MissingCrs(CrsSlot::Rotation(2)))
        );
        assert_eq!(crs.get(CrsSlot::Conjugation).err(), Some(Error::MissingCrs(CrsSlot::Conjugation)));
        assert_eq!(crs.slots().count(), 3);
        assert_eq!(crs.seed(), &[7u8; 32]);
        Ok(())
    }
}
