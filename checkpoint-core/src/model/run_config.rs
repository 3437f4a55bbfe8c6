/*!
Run-level configuration values persisted in a container's config block.
*/

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings shared by every part of a simulation run
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CommonConfig {
    pub track_index_case: bool,
    pub use_checkpoint: bool,
    pub rng_seed: u32,
    pub number_of_days: u32,
    pub number_of_survey_participants: u32,
    pub checkpoint_interval: u32,
    pub r0: f64,
    pub seeding_rate: f64,
    pub immunity_rate: f64,
    pub disease_config_file: PathBuf,
    pub contact_matrix_file: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LogConfig {
    pub generate_person_file: bool,
    /// Log mode as a raw number; interpreted by the simulator
    pub log_level: u32,
    pub output_prefix: String,
}

/// Region of a run and the files describing its population
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RegionTravel {
    pub region_id: u32,
    pub population_file: PathBuf,
    pub geo_profile_file: Option<PathBuf>,
    pub reference_households_file: Option<PathBuf>,
}

/// Complete configuration of one simulation run
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RunConfig {
    pub common: CommonConfig,
    pub log: LogConfig,
    pub travel: RegionTravel,
}

impl RunConfig {
    pub fn run_id(&self) -> u32 {
        self.travel.region_id
    }
}
