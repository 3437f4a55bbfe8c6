/*!
Simulation objects the checkpoint engine reads from and rebuilds.

These types carry the state the simulator hands to the engine. The engine
copies their fields into records and back; apart from replaying an infection
on restore it does not interpret them.
*/

mod cluster;
mod geo;
mod health;
mod journal;
mod person;
mod population;
mod run_config;

pub use cluster::{Cluster, ClusterKind, ClusterSet};
pub use geo::{Atlas, GeoPosition, Town};
pub use health::{Fate, Health, HealthStatus};
pub use journal::{ExpatriateJournal, VisitorEntry, VisitorId, VisitorJournal};
pub use person::{ClusterMemberships, Gender, Person};
pub use population::Population;
pub use run_config::{CommonConfig, LogConfig, RegionTravel, RunConfig};
