//! Polynomials over the extended modulus Q·P, stored as a pair of RNS
//! polynomials over the Q chain and over the auxiliary P chain.

use crate::Result;
use mkhe_math::rq::{Context, Poly, Representation, SubstitutionExponent};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::Zeroize;

/// A polynomial modulo Q·P.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QpPoly {
    /// Residues modulo the Q primes.
    pub q: Poly,
    /// Residues modulo the P primes.
    pub p: Poly,
}

impl Zeroize for QpPoly {
    fn zeroize(&mut self) {
        self.q.zeroize();
        self.p.zeroize();
    }
}

impl QpPoly {
    /// The zero polynomial in Ntt representation.
    pub fn zero(ctx_q: &Arc<Context>, ctx_p: &Arc<Context>) -> Self {
        Self {
            q: Poly::zero(ctx_q, Representation::Ntt),
            p: Poly::zero(ctx_p, Representation::Ntt),
        }
    }

    /// A polynomial with small signed coefficients, in Ntt representation.
    pub fn from_i64(coefficients: &[i64], ctx_q: &Arc<Context>, ctx_p: &Arc<Context>) -> Result<Self> {
        Ok(Self {
            q: Poly::from_i64(coefficients, ctx_q, Representation::Ntt)?,
            p: Poly::from_i64(coefficients, ctx_p, Representation::Ntt)?,
        })
    }

    /// A uniformly random polynomial in Ntt representation.
    pub fn random<R: RngCore + CryptoRng>(
        ctx_q: &Arc<Context>,
        ctx_p: &Arc<Context>,
        rng: &mut R,
    ) -> Self {
        Self {
            q: Poly::random(ctx_q, Representation::Ntt, rng),
            p: Poly::random(ctx_p, Representation::Ntt, rng),
        }
    }

    /// Computes `self += a * b`, where `b` may carry more Q primes than `self`.
    pub fn mul_add_assign(&mut self, a: &QpPoly, b: &QpPoly) -> Result<()> {
        self.q.mul_add_assign(&a.q, &b.q)?;
        self.p.mul_add_assign(&a.p, &b.p)?;
        Ok(())
    }

    /// Applies x -> x^exponent to both parts.
    pub fn substitute(&self, exponent: &SubstitutionExponent) -> Result<Self> {
        Ok(Self {
            q: self.q.substitute(exponent)?,
            p: self.p.substitute(exponent)?,
        })
    }

    /// Restricts the Q part to a prefix context of its chain.
    pub fn truncate(&self, ctx_q: &Arc<Context>) -> Result<Self> {
        Ok(Self {
            q: self.q.truncate(ctx_q)?,
            p: self.p.clone(),
        })
    }

    /// Moves both parts to the given representation.
    pub fn change_representation(&mut self, to: Representation) {
        self.q.change_representation(to);
        self.p.change_representation(to);
    }
}

impl std::ops::AddAssign<&QpPoly> for QpPoly {
    fn add_assign(&mut self, rhs: &QpPoly) {
        self.q += &rhs.q;
        self.p += &rhs.p;
    }
}

impl std::ops::SubAssign<&QpPoly> for QpPoly {
    fn sub_assign(&mut self, rhs: &QpPoly) {
        self.q -= &rhs.q;
        self.p -= &rhs.p;
    }
}

impl std::ops::Neg for &QpPoly {
    type Output = QpPoly;

    fn neg(self) -> QpPoly {
        QpPoly {
            q: -&self.q,
            p: -&self.p,
        }
    }
}
