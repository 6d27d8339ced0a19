#![crate_name = "mkhe_traits"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Traits for multi-key homomorphic encryption.

use rand::{CryptoRng, RngCore};
use std::sync::Arc;

/// The homomorphic encryption parameters.
pub trait FheParameters {}

/// Indicates that an object is parametrized.
pub trait FheParametrized {
    /// The type of the FHE parameters.
    type Parameters: FheParameters;

    /// Access the parameters of the object.
    fn parameters(&self) -> &Arc<Self::Parameters>;
}

/// Encrypt a plaintext into a ciphertext.
pub trait FheEncrypter<P, C>
where
    Self: FheParametrized,
{
    /// The type of error returned.
    type Error;

    /// Try to encrypt a plaintext `pt` into a ciphertext.
    fn try_encrypt<R: RngCore + CryptoRng>(&self, pt: &P, rng: &mut R) -> Result<C, Self::Error>;
}

/// Decrypt a ciphertext into a plaintext.
pub trait FheDecrypter<P, C>
where
    Self: FheParametrized,
{
    /// The type of error returned.
    type Error;

    /// Try to decrypt a ciphertext `ct` into a plaintext.
    fn try_decrypt(&self, ct: &C) -> Result<P, Self::Error>;
}
