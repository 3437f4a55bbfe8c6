/*!
Cluster kinds and cluster membership sets.
*/

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The five kinds of contact cluster a person can belong to
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClusterKind {
    Household,
    School,
    Work,
    PrimaryCommunity,
    SecondaryCommunity,
}

impl ClusterKind {
    pub const ALL: [ClusterKind; 5] = [
        ClusterKind::Household,
        ClusterKind::School,
        ClusterKind::Work,
        ClusterKind::PrimaryCommunity,
        ClusterKind::SecondaryCommunity,
    ];

    /// Name used for the relation table of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterKind::Household => "Household",
            ClusterKind::School => "School",
            ClusterKind::Work => "Work",
            ClusterKind::PrimaryCommunity => "PrimaryCommunity",
            ClusterKind::SecondaryCommunity => "SecondaryCommunity",
        }
    }

    /// Numeric id stored in atlas rows
    pub fn id(&self) -> u32 {
        *self as u32
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ClusterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cluster and the ids of its members, in insertion order
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: u32,
    pub kind: ClusterKind,
    pub members: Vec<u32>,
}

impl Cluster {
    pub fn new(id: u32, kind: ClusterKind) -> Self {
        Self {
            id,
            kind,
            members: Vec::new(),
        }
    }

    pub fn add_member(&mut self, person_id: u32) {
        self.members.push(person_id);
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Clusters of every kind, grouped by kind
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ClusterSet {
    by_kind: BTreeMap<ClusterKind, Vec<Cluster>>,
}

impl ClusterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cluster to the list of its kind
    pub fn push(&mut self, cluster: Cluster) {
        self.by_kind.entry(cluster.kind).or_default().push(cluster);
    }

    /// Replace all clusters of one kind
    pub fn set_kind(&mut self, kind: ClusterKind, clusters: Vec<Cluster>) {
        self.by_kind.insert(kind, clusters);
    }

    /// Clusters of one kind; empty if the kind is not present
    pub fn of_kind(&self, kind: ClusterKind) -> &[Cluster] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether clusters of this kind were recorded at all (possibly zero of them)
    pub fn has_kind(&self, kind: ClusterKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    /// Kinds present, in [`ClusterKind::ALL`] order
    pub fn kinds(&self) -> impl Iterator<Item = ClusterKind> + '_ {
        self.by_kind.keys().copied()
    }

    /// Total number of clusters over all kinds
    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
