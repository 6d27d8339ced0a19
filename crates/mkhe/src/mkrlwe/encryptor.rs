//! Public key encryption.

use crate::mkrlwe::{Ciphertext, Parameters, PublicKey};
use crate::{Error, Result};
use mkhe_math::rq::{Poly, Representation};
use mkhe_traits::{FheEncrypter, FheParametrized};
use mkhe_util::{sample_vec_gaussian, sample_vec_ternary};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use tracing::warn;
use zeroize::Zeroizing;

/// Encrypts plaintext polynomials under the public key of one party.
#[derive(Debug, Clone)]
pub struct Encryptor<'a> {
    pk: &'a PublicKey,
}

impl FheParametrized for Encryptor<'_> {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        &self.pk.par
    }
}

impl<'a> Encryptor<'a> {
    /// Creates an encryptor for a public key.
    pub fn new(pk: &'a PublicKey) -> Self {
        Self { pk }
    }

    /// Encrypts `pt` at `level`, which cannot exceed the level of `pt`.
    ///
    /// The ciphertext is {common: u·b + e0 + pt, id: u·a + e1} with u ternary
    /// and e0, e1 Gaussian.
    pub fn encrypt_at_level<R: RngCore + CryptoRng>(
        &self,
        pt: &Poly,
        level: usize,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        let par = &self.pk.par;
        let pt_level = par.level_of_ctx(pt.ctx())?;
        if level > pt_level {
            warn!(level, pt_level, "encryption above the plaintext level");
            return Err(Error::LevelMismatch {
                expected: level,
                found: pt_level,
            });
        }
        let ctx = par.ctx_at_level(level)?;

        let mut m = pt.truncate(ctx)?;
        m.change_representation(Representation::Ntt);

        let u = Zeroizing::new(sample_vec_ternary(par.degree(), rng));
        let u = Zeroizing::new(Poly::from_i64(&u, ctx, Representation::Ntt)?);
        let e0 = Zeroizing::new(sample_vec_gaussian(par.degree(), par.sigma(), rng)?);
        let e1 = Zeroizing::new(sample_vec_gaussian(par.degree(), par.sigma(), rng)?);

        let mut common = Poly::from_i64(&e0, ctx, Representation::Ntt)?;
        common.mul_add_assign(&u, &self.pk.b)?;
        common += &m;
        let mut c = Poly::from_i64(&e1, ctx, Representation::Ntt)?;
        c.mul_add_assign(&u, &self.pk.a)?;

        Ciphertext::new(par, common, vec![(self.pk.id, c)])
    }
}

impl FheEncrypter<Poly, Ciphertext> for Encryptor<'_> {
    type Error = Error;

    /// Encrypts `pt` at its own level.
    fn try_encrypt<R: RngCore + CryptoRng>(&self, pt: &Poly, rng: &mut R) -> Result<Ciphertext> {
        let level = self.pk.par.level_of_ctx(pt.ctx())?;
        self.encrypt_at_level(pt, level, rng)
    }
}
