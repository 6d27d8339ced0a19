//! The multi-key RLWE engine.
//!
//! Each party holds its own secret key; ciphertexts carry one component per
//! contributing party plus a common component. Multiplication relinearizes
//! with the relinearization key of each party only, at a cost linear in the
//! number of parties.

mod ciphertext;
mod crs;
mod decryptor;
mod encryptor;
mod evaluator;
mod gadget;
mod hoisting;
mod identity;
mod key_generator;
mod key_switcher;
mod keys;
mod parameters;
mod ring_qp;

pub use ciphertext::Ciphertext;
pub use crs::{Crs, CrsSlot};
pub use decryptor::{partial_decrypt, Decryptor};
pub use encryptor::Encryptor;
pub use evaluator::Evaluator;
pub use gadget::Gadget;
pub use hoisting::HoistedCiphertext;
pub use identity::{IdentitySet, PartyId, PartyRegistry, COMMON_IDENTIFIER, MAX_PARTIES};
pub use key_generator::{KeyGenerator, PartyKeys};
pub use key_switcher::KeySwitcher;
pub use keys::{
    ConjugationKey, ConjugationKeySet, KeyKind, KeySet, PartyKey, PublicKey, PublicKeySet,
    RelinearizationKey, RelinearizationKeySet, RotationKey, RotationKeySet, SecretKey,
    SecretKeySet,
};
pub use parameters::{Parameters, ParametersBuilder, SecretDistribution};
pub use ring_qp::QpPoly;
