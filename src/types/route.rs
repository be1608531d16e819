use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::ExplorerError;

//------------ Origin -----------------------------------------------------------

/// An origin AS number. Stored as a bare 32-bit integer; RPSL text such as
/// `AS8935` is accepted on the way in and reconstructed on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Origin(pub u32);

impl Origin {
    pub fn parse(s: &str) -> Result<Self, ExplorerError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("AS")
            .or_else(|| trimmed.strip_prefix("as"))
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .map(Origin)
            .map_err(|_| ExplorerError::BadInput(format!("not a valid ASN: '{s}'")))
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AS{}", self.0)
    }
}

//------------ OriginSet ----------------------------------------------------

/// The `data.origins` carried by a radix node (§3 invariant 3: a set, no
/// duplicates; ADDing an already-present origin is a no-op union).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginSet(HashSet<Origin>);

impl OriginSet {
    pub fn insert(&mut self, origin: Origin) -> bool {
        self.0.insert(origin)
    }

    pub fn remove(&mut self, origin: Origin) -> bool {
        self.0.remove(&origin)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, origin: &Origin) -> bool {
        self.0.contains(origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Origin> {
        self.0.iter()
    }

    pub fn to_sorted_vec(&self) -> Vec<Origin> {
        let mut v: Vec<Origin> = self.0.iter().copied().collect();
        v.sort_unstable();
        v
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_subset(&self, other: &OriginSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn union(&self, other: &OriginSet) -> OriginSet {
        OriginSet(self.0.union(&other.0).copied().collect())
    }
}

impl FromIterator<Origin> for OriginSet {
    fn from_iter<I: IntoIterator<Item = Origin>>(iter: I) -> Self {
        OriginSet(iter.into_iter().collect())
    }
}

//------------ RPSL objects, as carried by an NRTM event ------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Route,
    Route6,
    AsSet,
    /// Anything else NRTM might emit (`person`, `mntner`, ...); carried
    /// through so the ingest loop can drop it explicitly rather than fail
    /// to match, but never acted on.
    Other,
}

impl ObjectKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "route" => ObjectKind::Route,
            "route6" => ObjectKind::Route6,
            "as-set" => ObjectKind::AsSet,
            _ => ObjectKind::Other,
        }
    }
}

/// A single RPSL object as delivered by the NRTM parser (an external
/// collaborator; see §6). Only the fields this system acts on are kept.
#[derive(Debug, Clone)]
pub struct RpslObject {
    pub source: String,
    pub kind: ObjectKind,
    /// A prefix (`route`/`route6`) or an as-set name.
    pub name: String,
    pub origin: Option<Origin>,
    pub members: Option<Vec<String>>,
}
