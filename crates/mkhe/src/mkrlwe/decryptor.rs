//! Partial and full decryption of multi-key ciphertexts.

use crate::mkrlwe::{Ciphertext, Parameters, SecretKey, SecretKeySet};
use crate::{Error, Result};
use mkhe_math::rq::{Poly, Representation};
use mkhe_traits::{FheDecrypter, FheParametrized};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

/// Folds the component of the owner of `sk` into the common component:
/// `common += s · c_id`, then removes `c_id` from the ciphertext.
///
/// Fails with [`Error::UnknownParty`] if the party does not contribute to the
/// ciphertext.
pub fn partial_decrypt(ct: &mut Ciphertext, sk: &SecretKey) -> Result<()> {
    if !ct.par.same_as(&sk.par) {
        return Err(Error::ConfigError(
            "The secret key and the ciphertext have different parameters".to_string(),
        ));
    }
    let s = Zeroizing::new(sk.poly_at_level(ct.level)?);
    let c = ct
        .remove(sk.id)
        .ok_or_else(|| Error::UnknownParty(format!("{} does not contribute", sk.id)))?;
    ct.common.mul_add_assign(&c, &s)?;
    Ok(())
}

/// Decrypts ciphertexts with the secret keys of every contributing party.
#[derive(Debug, Clone)]
pub struct Decryptor<'a> {
    keys: &'a SecretKeySet,
}

impl FheParametrized for Decryptor<'_> {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        self.keys.parameters()
    }
}

impl<'a> Decryptor<'a> {
    /// Creates a decryptor from a set of secret keys.
    pub fn new(keys: &'a SecretKeySet) -> Self {
        Self { keys }
    }

    /// Decrypts `ct` into a polynomial in PowerBasis representation over the Q
    /// primes of the ciphertext level.
    ///
    /// Fails with [`Error::MissingKey`] if the key of a contributing party is
    /// absent, and with [`Error::MalformedCiphertext`] if the ciphertext does
    /// not match its parameters.
    #[instrument(skip_all)]
    pub fn decrypt(&self, ct: &Ciphertext) -> Result<Poly> {
        if !self.keys.parameters().same_as(&ct.par) {
            return Err(Error::ConfigError(
                "The secret keys and the ciphertext have different parameters".to_string(),
            ));
        }
        ct.check_consistency()?;
        debug!(level = ct.level, parties = ct.party_count(), "decrypting");

        let mut ct = ct.clone();
        for id in ct.identity_set().iter() {
            let sk = self.keys.get(id).map_err(|e| {
                warn!(party = %id, "missing secret key");
                e
            })?;
            partial_decrypt(&mut ct, sk)?;
        }
        if ct.party_count() != 0 {
            return Err(Error::MalformedCiphertext(
                "components remain after every partial decryption".to_string(),
            ));
        }

        let mut m = ct.common;
        m.change_representation(Representation::PowerBasis);
        Ok(m)
    }
}

impl FheDecrypter<Poly, Ciphertext> for Decryptor<'_> {
    type Error = Error;

    fn try_decrypt(&self, ct: &Ciphertext) -> Result<Poly> {
        self.decrypt(ct)
    }
}
