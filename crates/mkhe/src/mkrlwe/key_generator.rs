//! Key generation for the parties of the multi-key scheme.

use crate::mkrlwe::{
    ConjugationKey, Parameters, PartyId, PublicKey, RelinearizationKey, RotationKey, SecretKey,
};
use crate::{Error, Result};
use mkhe_traits::FheParametrized;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Every key of one party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyKeys {
    /// The secret key, which never leaves the party.
    pub secret: SecretKey,
    /// The public key.
    pub public: PublicKey,
    /// The relinearization key.
    pub relinearization: RelinearizationKey,
    /// One rotation key per registered rotation amount.
    pub rotations: Vec<RotationKey>,
    /// The conjugation key, when conjugation is enabled.
    pub conjugation: Option<ConjugationKey>,
}

/// Generates the keys of parties for fixed parameters.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    par: Arc<Parameters>,
}

impl FheParametrized for KeyGenerator {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        &self.par
    }
}

impl KeyGenerator {
    /// Creates a key generator.
    pub fn new(par: &Arc<Parameters>) -> Self {
        Self { par: par.clone() }
    }

    fn check(&self, sk: &SecretKey) -> Result<()> {
        if self.par.same_as(&sk.par) {
            Ok(())
        } else {
            warn!(party = %sk.id, "secret key generated for other parameters");
            Err(Error::ConfigError(
                "The secret key was generated for other parameters".to_string(),
            ))
        }
    }

    /// Samples the secret key of a party.
    pub fn gen_secret_key<R: RngCore + CryptoRng>(
        &self,
        id: PartyId,
        rng: &mut R,
    ) -> Result<SecretKey> {
        SecretKey::random(&self.par, id, rng)
    }

    /// Samples the secret key of a party and derives its public key.
    #[instrument(skip_all, fields(party = %id))]
    pub fn gen_key_pair<R: RngCore + CryptoRng>(
        &self,
        id: PartyId,
        rng: &mut R,
    ) -> Result<(SecretKey, PublicKey)> {
        let sk = self.gen_secret_key(id, rng)?;
        let pk = PublicKey::new(&sk, rng)?;
        Ok((sk, pk))
    }

    /// Generates a relinearization key with a fresh ephemeral secret, which is
    /// erased once the key is generated.
    #[instrument(skip_all, fields(party = %sk.id))]
    pub fn gen_relinearization_key<R: RngCore + CryptoRng>(
        &self,
        sk: &SecretKey,
        rng: &mut R,
    ) -> Result<RelinearizationKey> {
        self.check(sk)?;
        let r = SecretKey::random(&self.par, sk.id, rng)?;
        RelinearizationKey::new(sk, &r, rng)
    }

    /// Generates the rotation key of an amount.
    #[instrument(skip_all, fields(party = %sk.id, amount = amount))]
    pub fn gen_rotation_key<R: RngCore + CryptoRng>(
        &self,
        sk: &SecretKey,
        amount: usize,
        rng: &mut R,
    ) -> Result<RotationKey> {
        self.check(sk)?;
        RotationKey::new(sk, amount, rng)
    }

    /// Generates the conjugation key.
    #[instrument(skip_all, fields(party = %sk.id))]
    pub fn gen_conjugation_key<R: RngCore + CryptoRng>(
        &self,
        sk: &SecretKey,
        rng: &mut R,
    ) -> Result<ConjugationKey> {
        self.check(sk)?;
        ConjugationKey::new(sk, rng)
    }

    /// Generates every key of a party: secret, public, relinearization, one
    /// rotation key per registered amount and the conjugation key when
    /// enabled.
    #[instrument(skip_all, fields(party = %id))]
    pub fn gen_party_keys<R: RngCore + CryptoRng>(
        &self,
        id: PartyId,
        rng: &mut R,
    ) -> Result<PartyKeys> {
        let (secret, public) = self.gen_key_pair(id, rng)?;
        let relinearization = self.gen_relinearization_key(&secret, rng)?;
        let rotations = self
            .par
            .rotations()
            .iter()
            .map(|k| self.gen_rotation_key(&secret, *k, rng))
            .collect::<Result<Vec<_>>>()?;
        let conjugation = if self.par.conjugation() {
            Some(self.gen_conjugation_key(&secret, rng)?)
        } else {
            None
        };
        debug!(
            rotations = rotations.len(),
            conjugation = conjugation.is_some(),
            "generated party keys"
        );
        Ok(PartyKeys {
            secret,
            public,
            relinearization,
            rotations,
            conjugation,
        })
    }
}
