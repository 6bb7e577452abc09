use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::fingerprint::Fingerprint;

/// Fingerprints of the operations already applied under one root key.
///
/// Serialized as a JSON array of strings. Output is sorted so stored payloads are
/// stable; input order is irrelevant and duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedSet {
    hashes: HashSet<Fingerprint>,
}

impl AppliedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.hashes.contains(fingerprint)
    }

    /// Returns `true` if the fingerprint was not present before.
    pub fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        self.hashes.insert(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.hashes.iter()
    }

    pub fn clear(&mut self) {
        self.hashes.clear();
    }

    /// Members in sorted order.
    pub fn sorted(&self) -> Vec<&Fingerprint> {
        let mut members: Vec<_> = self.hashes.iter().collect();
        members.sort();
        members
    }
}

impl FromIterator<Fingerprint> for AppliedSet {
    fn from_iter<I: IntoIterator<Item = Fingerprint>>(iter: I) -> Self {
        Self {
            hashes: iter.into_iter().collect(),
        }
    }
}

impl Extend<Fingerprint> for AppliedSet {
    fn extend<I: IntoIterator<Item = Fingerprint>>(&mut self, iter: I) {
        self.hashes.extend(iter);
    }
}

impl Serialize for AppliedSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sorted().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AppliedSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let members = Vec::<Fingerprint>::deserialize(deserializer)?;
        Ok(members.into_iter().collect())
    }
}
