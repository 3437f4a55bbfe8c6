/*!
Run configuration inside a container.

Each run keeps a `Config` group with the run's scalar settings as attributes
and its input files as blobs. A blob remembers the extension of the file it
was read from, so when it is written back out the downstream XML/CSV/JSON
reader gets a file with a usable name.
*/

use crate::container::{AttrValue, Attributes, Container, NodePath};
use crate::layout::{ContainerLayout, RunScope};
use crate::model::{CommonConfig, LogConfig, RegionTravel, RunConfig};
use crate::{CheckpointError, EngineConfig, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TRACK_INDEX_CASE: &str = "track_index_case";
const GENERATE_PERSON_FILE: &str = "generate_person_file";
const USE_CHECKPOINT: &str = "use_checkpoint";
const RNG_SEED: &str = "rng_seed";
const NUMBER_OF_DAYS: &str = "number_of_days";
const NUMBER_OF_SURVEY_PARTICIPANTS: &str = "number_of_survey_participants";
const LOG_LEVEL: &str = "log_level";
const RUN_ID: &str = "run_id";
const CHECKPOINT_INTERVAL: &str = "checkpoint_interval";
const R0: &str = "r0";
const SEEDING_RATE: &str = "seeding_rate";
const IMMUNITY_RATE: &str = "immunity_rate";
const OUTPUT_PREFIX: &str = "output_prefix";

/// Input files embedded in a run's config group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigBlob {
    Disease,
    ContactMatrix,
    Population,
    GeoProfile,
    ReferenceHouseholds,
    Holidays,
}

impl ConfigBlob {
    /// Blob name inside the config group
    pub fn name(&self) -> &'static str {
        match self {
            ConfigBlob::Disease => "disease",
            ConfigBlob::ContactMatrix => "contact",
            ConfigBlob::Population => "popconfig",
            ConfigBlob::GeoProfile => "geoconfig",
            ConfigBlob::ReferenceHouseholds => "household",
            ConfigBlob::Holidays => "holidays",
        }
    }
}

/// The user-editable subset of a run's settings, as exchanged in JSON
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct EditableConfig {
    pub track_index_case: bool,
    #[serde(rename = "R0")]
    pub r0: f64,
    pub rng_seed: u32,
    pub days: u32,
    pub log_mode: u32,
    pub prefix: String,
}

/// Extension of `path` with its leading dot, or empty
fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|extension| format!(".{}", extension.to_string_lossy()))
        .unwrap_or_default()
}

/// Embed the file at `source` as blob `name` of `group`
pub fn store_file(container: &mut Container, group: &str, name: &str, source: &Path) -> Result<()> {
    let data = fs::read(source).map_err(|e| {
        CheckpointError::storage(format!("Failed to read {}: {}", source.display(), e))
    })?;
    container.write_blob(group, name, &data, &dotted_extension(source))?;
    debug!(file = %source.display(), blob = name, size = data.len(), "Embedded file");
    Ok(())
}

/// Write blob `name` of `group` to `destination`, with its extension replaced
/// by the recorded one
///
/// # Returns
/// The path actually written
pub fn materialize_blob(
    container: &Container,
    group: &str,
    name: &str,
    destination: &Path,
) -> Result<PathBuf> {
    let (data, extension) = container.read_blob(group, name)?;
    let target = destination.with_extension(extension.trim_start_matches('.'));
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&target, &data)?;
    debug!(blob = name, file = %target.display(), "Materialized blob");
    Ok(target)
}

fn read_bool(attributes: &Attributes, path: &str, name: &str) -> Result<bool> {
    let value = required(attributes, path, name)?;
    value
        .as_bool()
        .ok_or_else(|| mismatch(path, name, "bool", value))
}

fn read_u32(attributes: &Attributes, path: &str, name: &str) -> Result<u32> {
    let value = required(attributes, path, name)?;
    value
        .as_uint()
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| mismatch(path, name, "u32", value))
}

fn read_f64(attributes: &Attributes, path: &str, name: &str) -> Result<f64> {
    let value = required(attributes, path, name)?;
    value
        .as_double()
        .ok_or_else(|| mismatch(path, name, "double", value))
}

fn read_text(attributes: &Attributes, path: &str, name: &str) -> Result<String> {
    let value = required(attributes, path, name)?;
    value
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| mismatch(path, name, "text", value))
}

fn required<'a>(attributes: &'a Attributes, path: &str, name: &str) -> Result<&'a AttrValue> {
    attributes
        .get(name)
        .ok_or_else(|| CheckpointError::missing_node(format!("attribute '{name}' of {path}")))
}

fn mismatch(path: &str, name: &str, expected: &str, found: &AttrValue) -> CheckpointError {
    CheckpointError::schema_mismatch(format!("{path}@{name}"), expected, found.kind_name())
}

/// Reads and writes run configuration
///
/// Embedded files are materialized below `data_dir`.
#[derive(Debug, Clone)]
pub struct ConfigBlock {
    data_dir: PathBuf,
}

impl ConfigBlock {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.data_dir())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Write `run` into the config group of `scope`
    pub fn write_config(&self, container: &mut Container, scope: &RunScope, run: &RunConfig) -> Result<()> {
        let group = scope.config_path();
        container.create_group_if_missing(&group)?;

        store_file(container, &group, ConfigBlob::Disease.name(), &run.common.disease_config_file)?;
        store_file(container, &group, ConfigBlob::ContactMatrix.name(), &run.common.contact_matrix_file)?;
        store_file(container, &group, ConfigBlob::Population.name(), &run.travel.population_file)?;
        if let Some(geo) = &run.travel.geo_profile_file {
            store_file(container, &group, ConfigBlob::GeoProfile.name(), geo)?;
        }
        if let Some(households) = &run.travel.reference_households_file {
            store_file(container, &group, ConfigBlob::ReferenceHouseholds.name(), households)?;
        }

        let common = &run.common;
        let log = &run.log;
        container.write_attributes(
            &group,
            [
                (TRACK_INDEX_CASE, AttrValue::from(common.track_index_case)),
                (GENERATE_PERSON_FILE, AttrValue::from(log.generate_person_file)),
                (USE_CHECKPOINT, AttrValue::from(common.use_checkpoint)),
                (RNG_SEED, AttrValue::from(common.rng_seed)),
                (NUMBER_OF_DAYS, AttrValue::from(common.number_of_days)),
                (
                    NUMBER_OF_SURVEY_PARTICIPANTS,
                    AttrValue::from(common.number_of_survey_participants),
                ),
                (LOG_LEVEL, AttrValue::from(log.log_level)),
                (RUN_ID, AttrValue::from(run.run_id())),
                (CHECKPOINT_INTERVAL, AttrValue::from(common.checkpoint_interval)),
                (R0, AttrValue::from(common.r0)),
                (SEEDING_RATE, AttrValue::from(common.seeding_rate)),
                (IMMUNITY_RATE, AttrValue::from(common.immunity_rate)),
                (OUTPUT_PREFIX, AttrValue::from(log.output_prefix.as_str())),
            ],
        )?;

        info!(group = %group, run_id = run.run_id(), "Wrote run configuration");
        Ok(())
    }

    /// Read the run configuration of `scope`
    ///
    /// Embedded files are materialized into the data directory and the
    /// returned config points at them. Absent optional files come back as `None`.
    ///
    /// # Errors
    /// * `MissingNode` - no config group, or a required blob or attribute is absent
    /// * `SchemaMismatch` - an attribute has the wrong type
    pub fn read_config(&self, container: &Container, scope: &RunScope) -> Result<RunConfig> {
        let group = scope.config_path();
        let attributes = container.read_attributes(&group)?;

        let disease_config_file = self.materialize(container, scope, ConfigBlob::Disease)?;
        let contact_matrix_file = self.materialize(container, scope, ConfigBlob::ContactMatrix)?;
        let population_file = self.materialize(container, scope, ConfigBlob::Population)?;
        let geo_profile_file = self.materialize_optional(container, scope, ConfigBlob::GeoProfile)?;
        let reference_households_file =
            self.materialize_optional(container, scope, ConfigBlob::ReferenceHouseholds)?;

        let common = CommonConfig {
            track_index_case: read_bool(&attributes, &group, TRACK_INDEX_CASE)?,
            use_checkpoint: read_bool(&attributes, &group, USE_CHECKPOINT)?,
            rng_seed: read_u32(&attributes, &group, RNG_SEED)?,
            number_of_days: read_u32(&attributes, &group, NUMBER_OF_DAYS)?,
            number_of_survey_participants: read_u32(
                &attributes,
                &group,
                NUMBER_OF_SURVEY_PARTICIPANTS,
            )?,
            checkpoint_interval: read_u32(&attributes, &group, CHECKPOINT_INTERVAL)?,
            r0: read_f64(&attributes, &group, R0)?,
            seeding_rate: read_f64(&attributes, &group, SEEDING_RATE)?,
            immunity_rate: read_f64(&attributes, &group, IMMUNITY_RATE)?,
            disease_config_file,
            contact_matrix_file,
        };
        let log = LogConfig {
            generate_person_file: read_bool(&attributes, &group, GENERATE_PERSON_FILE)?,
            log_level: read_u32(&attributes, &group, LOG_LEVEL)?,
            output_prefix: read_text(&attributes, &group, OUTPUT_PREFIX)?,
        };
        let travel = RegionTravel {
            region_id: read_u32(&attributes, &group, RUN_ID)?,
            population_file,
            geo_profile_file,
            reference_households_file,
        };

        Ok(RunConfig {
            common,
            log,
            travel,
        })
    }

    /// Write the configuration of every run
    ///
    /// A single run is written in the single-run shape; several runs get one
    /// `Simulation N` group each, in order.
    pub fn write_multi_config(&self, container: &mut Container, runs: &[RunConfig]) -> Result<()> {
        match runs {
            [] => Err(CheckpointError::validation(
                "At least one run configuration is required",
            )),
            [run] => {
                self.write_config(container, &RunScope::single(), run)?;
                ContainerLayout::Single.mark(container)
            }
            _ => {
                for (index, run) in (0u32..).zip(runs) {
                    self.write_config(container, &RunScope::run(index), run)?;
                }
                ContainerLayout::Multi.mark(container)
            }
        }
    }

    /// Read the configuration of every run
    ///
    /// Runs are read from `Simulation 0` upwards until the first missing index.
    pub fn read_multi_config(&self, container: &Container) -> Result<Vec<RunConfig>> {
        RunScope::all(container)?
            .iter()
            .map(|scope| self.read_config(container, scope))
            .collect()
    }

    /// Embed the holiday calendar file
    pub fn write_holidays(&self, container: &mut Container, scope: &RunScope, file: &Path) -> Result<()> {
        store_file(container, &scope.config_path(), ConfigBlob::Holidays.name(), file)
    }

    /// Materialize the holiday calendar, if the run has one
    pub fn materialize_holidays(&self, container: &Container, scope: &RunScope) -> Result<Option<PathBuf>> {
        self.materialize_optional(container, scope, ConfigBlob::Holidays)
    }

    /// Replace one embedded file in every run
    pub fn store_profile(&self, container: &mut Container, blob: ConfigBlob, file: &Path) -> Result<()> {
        let scopes = RunScope::all(container)?;
        for scope in &scopes {
            let group = scope.config_path();
            if !container.group_exists(&group) {
                return Err(CheckpointError::missing_node(group));
            }
            store_file(container, &group, blob.name(), file)?;
        }
        info!(blob = blob.name(), runs = scopes.len(), "Stored profile");
        Ok(())
    }

    /// Materialize one embedded file of the first run to `destination`
    pub fn load_profile(&self, container: &Container, blob: ConfigBlob, destination: &Path) -> Result<PathBuf> {
        let scope = RunScope::first(container)?;
        materialize_blob(container, &scope.config_path(), blob.name(), destination)
    }

    /// Write the editable settings of the first run as JSON to `destination`
    pub fn export_editable_config(&self, container: &Container, destination: &Path) -> Result<EditableConfig> {
        let group = RunScope::first(container)?.config_path();
        let attributes = container.read_attributes(&group)?;
        let editable = EditableConfig {
            track_index_case: read_bool(&attributes, &group, TRACK_INDEX_CASE)?,
            r0: read_f64(&attributes, &group, R0)?,
            rng_seed: read_u32(&attributes, &group, RNG_SEED)?,
            days: read_u32(&attributes, &group, NUMBER_OF_DAYS)?,
            log_mode: read_u32(&attributes, &group, LOG_LEVEL)?,
            prefix: read_text(&attributes, &group, OUTPUT_PREFIX)?,
        };
        fs::write(destination, serde_json::to_string_pretty(&editable)?)?;
        Ok(editable)
    }

    /// Apply editable settings from the JSON file at `source` to every run
    ///
    /// Settings outside [`EditableConfig`] are left untouched.
    pub fn import_editable_config(&self, container: &mut Container, source: &Path) -> Result<EditableConfig> {
        let editable: EditableConfig = serde_json::from_str(&fs::read_to_string(source)?)?;
        for scope in RunScope::all(container)? {
            let group = scope.config_path();
            if !container.group_exists(&group) {
                return Err(CheckpointError::missing_node(group));
            }
            container.write_attributes(
                &group,
                [
                    (TRACK_INDEX_CASE, AttrValue::from(editable.track_index_case)),
                    (R0, AttrValue::from(editable.r0)),
                    (RNG_SEED, AttrValue::from(editable.rng_seed)),
                    (NUMBER_OF_DAYS, AttrValue::from(editable.days)),
                    (LOG_LEVEL, AttrValue::from(editable.log_mode)),
                    (OUTPUT_PREFIX, AttrValue::from(editable.prefix.as_str())),
                ],
            )?;
        }
        Ok(editable)
    }

    fn materialize(&self, container: &Container, scope: &RunScope, blob: ConfigBlob) -> Result<PathBuf> {
        let destination = self.data_dir.join(scope.file_stem(blob.name()));
        materialize_blob(container, &scope.config_path(), blob.name(), &destination)
    }

    fn materialize_optional(
        &self,
        container: &Container,
        scope: &RunScope,
        blob: ConfigBlob,
    ) -> Result<Option<PathBuf>> {
        let path = NodePath::parse(&scope.config_path()).child(blob.name());
        if !container.exists(&path.to_string()) {
            return Ok(None);
        }
        self.materialize(container, scope, blob).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Group;
    use crate::header::ContainerHeader;
    use tempfile::TempDir;

    fn container() -> Container {
        Container::from_parts(
            "config.ckpt".to_string(),
            ContainerHeader::new("none"),
            Group::default(),
        )
    }

    fn run_config(dir: &Path, region_id: u32) -> RunConfig {
        let disease = dir.join("disease_influenza.xml");
        let contact = dir.join("contact_matrix.xml");
        let population = dir.join("pop_oklahoma.csv");
        fs::write(&disease, "<disease><transmission/></disease>").unwrap();
        fs::write(&contact, "<matrix/>").unwrap();
        fs::write(&population, "age,household_id\n42,1\n").unwrap();

        RunConfig {
            common: CommonConfig {
                track_index_case: false,
                use_checkpoint: true,
                rng_seed: 1_000 + region_id,
                number_of_days: 30,
                number_of_survey_participants: 10,
                checkpoint_interval: 5,
                r0: 11.0,
                seeding_rate: 0.002,
                immunity_rate: 0.8,
                disease_config_file: disease,
                contact_matrix_file: contact,
            },
            log: LogConfig {
                generate_person_file: true,
                log_level: 2,
                output_prefix: format!("region{region_id}"),
            },
            travel: RegionTravel {
                region_id,
                population_file: population,
                geo_profile_file: None,
                reference_households_file: None,
            },
        }
    }

    #[test]
    fn test_config_roundtrip_materializes_files() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let block = ConfigBlock::new(output.path());
        let mut container = container();

        let run = run_config(input.path(), 0);
        block
            .write_config(&mut container, &RunScope::single(), &run)
            .unwrap();
        let read = block.read_config(&container, &RunScope::single()).unwrap();

        assert_eq!(read.common.rng_seed, 1_000);
        assert_eq!(read.log, run.log);
        assert_eq!(read.travel.geo_profile_file, None);
        assert_eq!(read.travel.reference_households_file, None);
        assert_eq!(read.common.disease_config_file, output.path().join("disease.xml"));
        assert_eq!(read.travel.population_file, output.path().join("popconfig.csv"));
        assert_eq!(
            fs::read(&read.common.contact_matrix_file).unwrap(),
            b"<matrix/>"
        );
    }

    #[test]
    fn test_materialize_blob_replaces_extension() {
        let output = TempDir::new().unwrap();
        let mut container = container();
        container
            .write_blob("Config", "household", b"<households/>", ".xml")
            .unwrap();
        container
            .write_blob("Config", "notes", b"plain", "")
            .unwrap();

        let path = materialize_blob(
            &container,
            "Config",
            "household",
            &output.path().join("tmp_household.json"),
        )
        .unwrap();
        assert_eq!(path, output.path().join("tmp_household.xml"));
        assert_eq!(fs::read(&path).unwrap(), b"<households/>");

        let path = materialize_blob(&container, "Config", "notes", &output.path().join("notes.txt"))
            .unwrap();
        assert_eq!(path, output.path().join("notes"));
    }

    #[test]
    fn test_missing_required_blob() {
        let block = ConfigBlock::new(".");
        let mut container = container();
        container
            .write_attributes("Config", [(RNG_SEED, AttrValue::from(1u32))])
            .unwrap();

        assert!(matches!(
            block.read_config(&container, &RunScope::single()),
            Err(CheckpointError::MissingNode(_))
        ));
    }

    #[test]
    fn test_attribute_type_mismatch() {
        let mut attributes = Attributes::new();
        attributes.insert(RNG_SEED.to_string(), AttrValue::from("seed"));
        assert!(matches!(
            read_u32(&attributes, "Config", RNG_SEED),
            Err(CheckpointError::SchemaMismatch { .. })
        ));

        attributes.insert(RNG_SEED.to_string(), AttrValue::from(u64::MAX));
        assert!(read_u32(&attributes, "Config", RNG_SEED).is_err());
    }

    #[test]
    fn test_holidays_are_optional() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let block = ConfigBlock::new(output.path());
        let mut container = container();
        let scope = RunScope::single();

        assert_eq!(block.materialize_holidays(&container, &scope).unwrap(), None);

        let holidays = input.path().join("holidays_flanders_2017.json");
        fs::write(&holidays, r#"{"2017": {"general": ["2017-12-25"]}}"#).unwrap();
        block.write_holidays(&mut container, &scope, &holidays).unwrap();

        let path = block
            .materialize_holidays(&container, &scope)
            .unwrap()
            .unwrap();
        assert_eq!(path, output.path().join("holidays.json"));
    }

    #[test]
    fn test_editable_config_applies_to_all_runs() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let block = ConfigBlock::new(output.path());
        let mut container = container();
        let runs = vec![run_config(input.path(), 0), run_config(input.path(), 1)];
        block.write_multi_config(&mut container, &runs).unwrap();

        let exported = output.path().join("config.json");
        let editable = block
            .export_editable_config(&container, &exported)
            .unwrap();
        assert_eq!(editable.rng_seed, 1_000);
        assert_eq!(editable.prefix, "region0");

        let text = fs::read_to_string(&exported).unwrap();
        assert!(text.contains("\"TrackIndexCase\""));
        assert!(text.contains("\"R0\""));
        assert!(text.contains("\"LogMode\""));

        let edited = EditableConfig {
            r0: 3.5,
            days: 120,
            prefix: "edited".to_string(),
            ..editable
        };
        fs::write(&exported, serde_json::to_string(&edited).unwrap()).unwrap();
        block.import_editable_config(&mut container, &exported).unwrap();

        let reread = block.read_multi_config(&container).unwrap();
        assert_eq!(reread.len(), 2);
        for run in &reread {
            assert_eq!(run.common.r0, 3.5);
            assert_eq!(run.common.number_of_days, 120);
            assert_eq!(run.log.output_prefix, "edited");
            assert_eq!(run.common.checkpoint_interval, 5);
        }
        assert_eq!(reread[1].travel.region_id, 1);
    }

    #[test]
    fn test_store_and_load_profile() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let block = ConfigBlock::new(output.path());
        let mut container = container();
        let runs = vec![run_config(input.path(), 0), run_config(input.path(), 1)];
        block.write_multi_config(&mut container, &runs).unwrap();

        let measles = input.path().join("disease_measles.xml");
        fs::write(&measles, "<disease>measles</disease>").unwrap();
        block
            .store_profile(&mut container, ConfigBlob::Disease, &measles)
            .unwrap();

        for scope in [RunScope::run(0), RunScope::run(1)] {
            let (data, _) = container.read_blob(&scope.config_path(), "disease").unwrap();
            assert_eq!(data, b"<disease>measles</disease>");
        }

        let loaded = block
            .load_profile(&container, ConfigBlob::Disease, &output.path().join("out.tmp"))
            .unwrap();
        assert_eq!(loaded, output.path().join("out.xml"));
    }

    #[test]
    fn test_write_multi_config_requires_runs() {
        let block = ConfigBlock::new(".");
        let mut container = container();
        assert!(matches!(
            block.write_multi_config(&mut container, &[]),
            Err(CheckpointError::Validation(_))
        ));
    }
}
