/*!
Individuals of the simulated population.
*/

use super::{ClusterKind, Fate, Health};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn as_byte(&self) -> u8 {
        match self {
            Gender::Male => b'M',
            Gender::Female => b'F',
            Gender::Unknown => b'U',
        }
    }

    /// Unrecognized bytes map to `Unknown`
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'M' => Gender::Male,
            b'F' => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

/// Cluster id per kind; 0 means no membership
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClusterMemberships([u32; 5]);

impl ClusterMemberships {
    pub fn new(
        household: u32,
        school: u32,
        work: u32,
        primary_community: u32,
        secondary_community: u32,
    ) -> Self {
        Self([
            household,
            school,
            work,
            primary_community,
            secondary_community,
        ])
    }

    pub fn get(&self, kind: ClusterKind) -> u32 {
        self.0[kind.index()]
    }

    pub fn set(&mut self, kind: ClusterKind, cluster_id: u32) {
        self.0[kind.index()] = cluster_id;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Person {
    id: u32,
    age: f64,
    gender: Gender,
    memberships: ClusterMemberships,
    health: Health,
    participating_in_survey: bool,
}

impl Person {
    pub fn new(
        id: u32,
        age: f64,
        gender: Gender,
        memberships: ClusterMemberships,
        fate: Fate,
    ) -> Self {
        Self {
            id,
            age,
            gender,
            memberships,
            health: Health::new(fate),
            participating_in_survey: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn memberships(&self) -> ClusterMemberships {
        self.memberships
    }

    pub fn cluster_id(&self, kind: ClusterKind) -> u32 {
        self.memberships.get(kind)
    }

    pub fn set_cluster_id(&mut self, kind: ClusterKind, cluster_id: u32) {
        self.memberships.set(kind, cluster_id);
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    pub fn is_participating_in_survey(&self) -> bool {
        self.participating_in_survey
    }

    pub fn participate_in_survey(&mut self) {
        self.participating_in_survey = true;
    }
}
