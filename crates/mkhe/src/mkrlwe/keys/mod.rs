//! Keys of the multi-key scheme and their containers.

mod key_set;
mod public_key;
mod relinearization_key;
mod rotation_key;
mod secret_key;

pub use key_set::{
    ConjugationKeySet, KeyKind, KeySet, PartyKey, PublicKeySet, RelinearizationKeySet,
    RotationKeySet, SecretKeySet,
};
pub use public_key::PublicKey;
pub use relinearization_key::RelinearizationKey;
pub use rotation_key::{ConjugationKey, RotationKey};
pub use secret_key::SecretKey;
