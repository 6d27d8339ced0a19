//! Party identifiers and identity sets.

use crate::{Error, Result};
use bitvec::prelude::*;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Identifier reserved for the common component of a ciphertext. It never
/// names a party.
pub const COMMON_IDENTIFIER: &str = "0";

/// Maximum number of parties. Party indices fit in 16 bits, so an
/// [`IdentitySet`] never holds more than `MAX_PARTIES` bits.
pub const MAX_PARTIES: usize = 1 << 16;

/// Dense index of an enrolled party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartyId(u16);

impl PartyId {
    /// Creates a party identifier from its index.
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Index of the party.
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for PartyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resolves party names to dense [`PartyId`]s at enrollment.
#[derive(Debug, Default, Clone)]
pub struct PartyRegistry {
    names: Vec<String>,
    ids: HashMap<String, PartyId>,
}

impl PartyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enrolls a party under `name` and returns its identifier.
    ///
    /// Fails with [`Error::ReservedIdentifier`] for the common identifier and
    /// with [`Error::ConfigError`] if the name is already enrolled or if
    /// [`MAX_PARTIES`] parties already are.
    pub fn enroll(&mut self, name: &str) -> Result<PartyId> {
        if name == COMMON_IDENTIFIER {
            return Err(Error::ReservedIdentifier(name.to_string()));
        }
        if self.ids.contains_key(name) {
            return Err(Error::ConfigError(format!(
                "Party {name:?} is already enrolled"
            )));
        }
        let index = u16::try_from(self.names.len()).map_err(|_| {
            Error::ConfigError(format!("At most {MAX_PARTIES} parties can be enrolled"))
        })?;
        let id = PartyId(index);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        Ok(id)
    }

    /// Returns the identifier of an enrolled party.
    pub fn resolve(&self, name: &str) -> Result<PartyId> {
        if name == COMMON_IDENTIFIER {
            return Err(Error::ReservedIdentifier(name.to_string()));
        }
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownParty(name.to_string()))
    }

    /// Returns the name under which a party was enrolled.
    pub fn name(&self, id: PartyId) -> Result<&str> {
        self.names
            .get(id.index())
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownParty(id.to_string()))
    }

    /// Builds the identity set of the named parties.
    pub fn identity_set<S: AsRef<str>>(&self, names: &[S]) -> Result<IdentitySet> {
        names
            .iter()
            .map(|name| self.resolve(name.as_ref()))
            .collect()
    }

    /// Number of enrolled parties.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no party is enrolled.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A set of parties, stored as a bitset indexed by [`PartyId`].
#[derive(Debug, Clone, Default)]
pub struct IdentitySet {
    bits: BitVec,
}

impl PartialEq for IdentitySet {
    fn eq(&self, other: &Self) -> bool {
        self.bits.iter_ones().eq(other.bits.iter_ones())
    }
}

impl Eq for IdentitySet {}

impl FromIterator<PartyId> for IdentitySet {
    fn from_iter<T: IntoIterator<Item = PartyId>>(iter: T) -> Self {
        let mut set = IdentitySet::new();
        iter.into_iter().for_each(|id| {
            set.insert(id);
        });
        set
    }
}

impl IdentitySet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a party; returns whether it was absent. The bitset grows to the
    /// index of the party, which is below [`MAX_PARTIES`].
    pub fn insert(&mut self, id: PartyId) -> bool {
        if self.bits.len() <= id.index() {
            self.bits.resize(id.index() + 1, false);
        }
        !self.bits.replace(id.index(), true)
    }

    /// Whether the party belongs to the set.
    pub fn contains(&self, id: PartyId) -> bool {
        self.bits.get(id.index()).map(|b| *b).unwrap_or(false)
    }

    /// Union of two sets.
    pub fn union(&self, other: &IdentitySet) -> IdentitySet {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    /// Adds every party of `other` to this set.
    pub fn union_with(&mut self, other: &IdentitySet) {
        if self.bits.len() < other.bits.len() {
            self.bits.resize(other.bits.len(), false);
        }
        other.bits.iter_ones().for_each(|i| self.bits.set(i, true));
    }

    /// Whether every party of this set belongs to `other`.
    pub fn is_subset(&self, other: &IdentitySet) -> bool {
        self.iter().all(|id| other.contains(id))
    }

    /// Number of parties in the set.
    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Parties of the set in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = PartyId> + '_ {
        self.bits.iter_ones().map(|i| PartyId(i as u16))
    }
}
