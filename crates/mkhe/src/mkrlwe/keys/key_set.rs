//! Containers of keys indexed by party.

use crate::mkrlwe::{
    ConjugationKey, IdentitySet, Parameters, PartyId, PublicKey, RelinearizationKey, RotationKey,
    SecretKey,
};
use crate::{Error, Result};
use mkhe_traits::FheParametrized;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Kinds of keys, as reported by [`Error::MissingKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// A [`SecretKey`].
    Secret,
    /// A [`PublicKey`].
    Public,
    /// A [`RelinearizationKey`].
    Relinearization,
    /// A [`RotationKey`].
    Rotation,
    /// A [`ConjugationKey`].
    Conjugation,
}

impl Display for KeyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            KeyKind::Secret => "secret",
            KeyKind::Public => "public",
            KeyKind::Relinearization => "relinearization",
            KeyKind::Rotation => "rotation",
            KeyKind::Conjugation => "conjugation",
        };
        write!(f, "{name}")
    }
}

/// A key owned by a party.
pub trait PartyKey: FheParametrized<Parameters = Parameters> {
    /// Kind of the key.
    const KIND: KeyKind;

    /// Index of the key in a set.
    type Index: Ord + Copy + Debug;

    /// Index of this key.
    fn index(&self) -> Self::Index;

    /// Party designated by an index.
    fn party(index: Self::Index) -> PartyId;
}

macro_rules! impl_party_key {
    ($key:ty, $kind:expr) => {
        impl PartyKey for $key {
            const KIND: KeyKind = $kind;
            type Index = PartyId;

            fn index(&self) -> PartyId {
                self.id
            }

            fn party(index: PartyId) -> PartyId {
                index
            }
        }
    };
}

impl_party_key!(SecretKey, KeyKind::Secret);
impl_party_key!(PublicKey, KeyKind::Public);
impl_party_key!(RelinearizationKey, KeyKind::Relinearization);
impl_party_key!(ConjugationKey, KeyKind::Conjugation);

impl PartyKey for RotationKey {
    const KIND: KeyKind = KeyKind::Rotation;
    type Index = (PartyId, usize);

    fn index(&self) -> (PartyId, usize) {
        (self.id, self.amount)
    }

    fn party(index: (PartyId, usize)) -> PartyId {
        index.0
    }
}

/// Keys of several parties sharing the same parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySet<K: PartyKey> {
    par: Arc<Parameters>,
    keys: BTreeMap<K::Index, K>,
}

/// Secret keys indexed by party.
pub type SecretKeySet = KeySet<SecretKey>;
/// Public keys indexed by party.
pub type PublicKeySet = KeySet<PublicKey>;
/// Relinearization keys indexed by party.
pub type RelinearizationKeySet = KeySet<RelinearizationKey>;
/// Rotation keys indexed by party and rotation amount.
pub type RotationKeySet = KeySet<RotationKey>;
/// Conjugation keys indexed by party.
pub type ConjugationKeySet = KeySet<ConjugationKey>;

impl<K: PartyKey> FheParametrized for KeySet<K> {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        &self.par
    }
}

impl<K: PartyKey> KeySet<K> {
    /// Creates an empty set.
    pub fn new(par: &Arc<Parameters>) -> Self {
        Self {
            par: par.clone(),
            keys: BTreeMap::new(),
        }
    }

    /// Inserts a key, replacing the key with the same index if any.
    ///
    /// Fails if the key was generated for other parameters.
    pub fn insert(&mut self, key: K) -> Result<()> {
        if !self.par.same_as(key.parameters()) {
            return Err(Error::ConfigError(format!(
                "Cannot insert a {} key generated for other parameters",
                K::KIND
            )));
        }
        self.keys.insert(key.index(), key);
        Ok(())
    }

    /// The key at an index, or [`Error::MissingKey`].
    pub fn get(&self, index: K::Index) -> Result<&K> {
        self.keys.get(&index).ok_or(Error::MissingKey {
            party: K::party(index),
            kind: K::KIND,
        })
    }

    /// Whether a key is present at an index.
    pub fn contains(&self, index: K::Index) -> bool {
        self.keys.contains_key(&index)
    }

    /// Parties with at least one key in the set.
    pub fn parties(&self) -> IdentitySet {
        self.keys.keys().map(|index| K::party(*index)).collect()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in increasing index order.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.keys.values()
    }
}

impl RotationKeySet {
    /// The rotation key of a party for an amount, reduced modulo degree / 2.
    pub fn get_rotation(&self, party: PartyId, amount: usize) -> Result<&RotationKey> {
        self.get((party, self.par.normalize_rotation(amount)))
    }
}
