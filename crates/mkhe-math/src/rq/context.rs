use num_bigint::BigUint;
use std::{fmt::Debug, sync::Arc};

use crate::{ntt::NttOperator, rns::RnsContext, zq::Modulus, Error, Result};

/// RNS context of the polynomials at one level of a modulus chain.
///
/// A context over the moduli q_0, ..., q_ℓ is at level ℓ and links to the
/// context over q_0, ..., q_{ℓ-1}, down to level 0.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Context {
    pub(crate) moduli: Box<[u64]>,
    pub(crate) q: Box<[Modulus]>,
    pub(crate) rns: Arc<RnsContext>,
    pub(crate) ops: Box<[NttOperator]>,
    pub(crate) degree: usize,
    pub(crate) bitrev: Box<[usize]>,
    pub(crate) lower: Option<Arc<Context>>,
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("level", &self.level())
            .field("moduli", &self.moduli)
            .field("degree", &self.degree)
            .finish()
    }
}

impl Context {
    /// Creates the context of the moduli `moduli` together with the contexts
    /// of its lower levels.
    ///
    /// Fails unless `degree` is a power of two of at least 8 and every modulus
    /// is a prime supporting the NTT of size `degree`.
    pub fn new(moduli: &[u64], degree: usize) -> Result<Self> {
        if !degree.is_power_of_two() || degree < 8 {
            return Err(Error::Default(format!(
                "Invalid degree {degree}: expected a power of two of at least 8"
            )));
        }
        if moduli.is_empty() {
            return Err(Error::Default("A context needs at least one modulus".to_string()));
        }

        let (q, ops): (Vec<_>, Vec<_>) = moduli
            .iter()
            .map(|modulus| -> Result<(Modulus, NttOperator)> {
                let qi = Modulus::new(*modulus)?;
                let op = NttOperator::new(&qi, degree).ok_or_else(|| {
                    Error::Default(format!("No NTT of size {degree} modulo {modulus}"))
                })?;
                Ok((qi, op))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .unzip();

        let lower = match moduli.len() {
            1 => None,
            n => Some(Arc::new(Context::new(&moduli[..n - 1], degree)?)),
        };

        Ok(Self {
            moduli: moduli.into(),
            q: q.into_boxed_slice(),
            rns: Arc::new(RnsContext::new(moduli)?),
            ops: ops.into_boxed_slice(),
            degree,
            bitrev: (0..degree)
                .map(|j| j.reverse_bits() >> (degree.leading_zeros() + 1))
                .collect(),
            lower,
        })
    }

    /// Creates a context in an `Arc`.
    pub fn new_arc(moduli: &[u64], degree: usize) -> Result<Arc<Self>> {
        Self::new(moduli, degree).map(Arc::new)
    }

    /// The product of the moduli.
    pub fn modulus(&self) -> &BigUint {
        self.rns.modulus()
    }

    /// The moduli of this context.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// The moduli of this context as [`Modulus`] operators.
    pub fn moduli_operators(&self) -> &[Modulus] {
        &self.q
    }

    /// The degree of the polynomials.
    pub const fn degree(&self) -> usize {
        self.degree
    }

    /// The level, one less than the number of moduli.
    pub fn level(&self) -> usize {
        self.moduli.len() - 1
    }

    /// The RNS context.
    pub fn rns(&self) -> &Arc<RnsContext> {
        &self.rns
    }

    /// The context one level below, if any.
    pub fn lower(&self) -> Option<&Arc<Context>> {
        self.lower.as_ref()
    }

    /// Whether the moduli of this context are a prefix of the moduli of
    /// `other`, with the same degree.
    pub fn is_prefix_of(&self, other: &Context) -> bool {
        self.degree == other.degree && other.moduli.starts_with(&self.moduli)
    }

    /// The context of the chain at `level`, which cannot exceed the level of
    /// this context.
    pub fn at_level(self: &Arc<Self>, level: usize) -> Result<Arc<Self>> {
        let mut current = self;
        while current.level() > level {
            current = current.lower.as_ref().ok_or(Error::NoSuchLevel(level))?;
        }
        if current.level() == level {
            Ok(current.clone())
        } else {
            Err(Error::NoSuchLevel(level))
        }
    }

    /// Every context of the chain, indexed by level.
    pub fn chain(self: &Arc<Self>) -> Vec<Arc<Self>> {
        let mut chain = vec![self.clone()];
        while let Some(lower) = chain.last().and_then(|c| c.lower.clone()) {
            chain.push(lower);
        }
        chain.reverse();
        chain
    }
}

#[cfg(test)]
mod tests {
    use std::{error::Error, sync::Arc};

    use crate::ntt::supports_ntt;
    use crate::rq::Context;

    const MODULI: &[u64; 5] = &[
        1153,
        4611686018326724609,
        4611686018309947393,
        4611686018232352769,
        4611686018171535361,
    ];

    #[test]
    fn constructor() {
        for modulus in MODULI {
            assert!(Context::new(&[*modulus], 8).is_ok());
            assert_eq!(
                Context::new(&[*modulus], 128).is_ok(),
                supports_ntt(*modulus, 128)
            );
        }
        assert!(Context::new(MODULI, 8).is_ok());

        // 1153 is not 1 modulo 256.
        assert!(Context::new(MODULI, 128).is_err());
        assert!(Context::new(MODULI, 4).is_err());
        assert!(Context::new(MODULI, 12).is_err());
        assert!(Context::new(&[], 8).is_err());
    }

    #[test]
    fn chain() -> Result<(), Box<dyn Error>> {
        let top = Context::new_arc(MODULI, 8)?;
        assert_eq!(top.level(), MODULI.len() - 1);
        assert_eq!(
            top.lower(),
            Some(&Context::new_arc(&MODULI[..MODULI.len() - 1], 8)?)
        );

        let chain = top.chain();
        assert_eq!(chain.len(), MODULI.len());
        for (level, ctx) in chain.iter().enumerate() {
            assert_eq!(ctx.level(), level);
            assert_eq!(ctx.moduli(), &MODULI[..=level]);
            assert!(ctx.is_prefix_of(&top));
            assert_eq!(&top.at_level(level)?, ctx);
        }
        assert!(chain[0].lower().is_none());
        assert!(Arc::ptr_eq(&top.at_level(top.level())?, &top));

        assert_eq!(
            top.at_level(MODULI.len()).err(),
            Some(crate::Error::NoSuchLevel(MODULI.len()))
        );
        let other = Context::new_arc(&MODULI[1..], 8)?;
        assert!(!other.is_prefix_of(&top));
        Ok(())
    }
}
