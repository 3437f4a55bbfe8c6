/*!
Geospatial reference data: cluster locations and a town gazetteer.
*/

use super::ClusterKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Town {
    pub name: String,
    pub id: u32,
    pub size: u32,
    pub position: GeoPosition,
}

/// Cluster locations plus the towns of the region
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Atlas {
    clusters: BTreeMap<(ClusterKind, u32), GeoPosition>,
    towns: Vec<Town>,
}

impl Atlas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emplace_cluster(&mut self, kind: ClusterKind, cluster_id: u32, position: GeoPosition) {
        self.clusters.insert((kind, cluster_id), position);
    }

    pub fn cluster_position(&self, kind: ClusterKind, cluster_id: u32) -> Option<GeoPosition> {
        self.clusters.get(&(kind, cluster_id)).copied()
    }

    /// Located clusters, ordered by kind then id
    pub fn clusters(&self) -> impl Iterator<Item = (ClusterKind, u32, GeoPosition)> + '_ {
        self.clusters
            .iter()
            .map(|(&(kind, id), &position)| (kind, id, position))
    }

    pub fn add_town(&mut self, town: Town) {
        self.towns.push(town);
    }

    pub fn towns(&self) -> &[Town] {
        &self.towns
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.towns.is_empty()
    }
}
