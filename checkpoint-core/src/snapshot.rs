/*!
Dated population snapshots.

A snapshot of one simulation day lives in a date group (`YYYYMMDD`) of its run
scope and holds:

- `Population`: one [`PersonRecord`] per person, in population order,
- one relation table per cluster kind present (`Household`, `School`, ...),
- `Visitors`: the visitor journal, return days relative to the snapshot day,
- `Expatriates`: residents abroad, in the person layout.

The day index the snapshot was taken on is kept in the group's `day`
attribute. Geography is not per date; it lives in the scope's `Config` group
and is attached to the population on load.
*/

use crate::container::{AttrValue, Container, Node, Table};
use crate::layout::{
    parse_date_group, RunScope, ATLAS_TABLE, DATE_FORMAT, DAY_ATTRIBUTE, EXPATRIATES_TABLE,
    POPULATION_TABLE, TOWNS_TABLE, VISITORS_TABLE,
};
use crate::model::{
    Atlas, Cluster, ClusterKind, ClusterSet, ExpatriateJournal, GeoPosition, Population, Town,
    VisitorId, VisitorJournal,
};
use crate::observability::OperationTimer;
use crate::records::{
    AtlasRecord, ClusterMembershipRecord, ExpatriateRecord, PersonRecord, TownRecord,
    VisitorRecord,
};
use crate::relation::{decode_groups, encode_groups};
use crate::{CheckpointError, Result};
use chrono::NaiveDate;
use tracing::{debug, info};

/// Everything stored for one simulation day
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub population: Population,
    pub clusters: ClusterSet,
    pub visitors: VisitorJournal,
    pub expatriates: ExpatriateJournal,
}

/// Saves and restores snapshots within one run scope
///
/// # Example
/// ```rust
/// use checkpoint_core::snapshot::{Snapshot, SnapshotManager};
/// use checkpoint_core::{create_memory_engine, RunScope};
/// use chrono::NaiveDate;
///
/// let engine = create_memory_engine();
/// let mut container = engine.create("flanders.ckpt")?;
/// let manager = SnapshotManager::new(RunScope::single());
/// let date = NaiveDate::from_ymd_opt(2020, 1, 15).unwrap();
///
/// manager.save_snapshot(&mut container, date, 14, &Snapshot::default())?;
/// assert_eq!(manager.last_snapshot_date(&container)?, Some(date));
/// # Ok::<(), checkpoint_core::CheckpointError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    scope: RunScope,
}

impl SnapshotManager {
    pub fn new(scope: RunScope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> &RunScope {
        &self.scope
    }

    /// Store `snapshot` as the state on `date`, simulation day `day`
    ///
    /// Any earlier snapshot for the same date is replaced as a whole; when
    /// the new one is rejected the earlier one stays untouched.
    ///
    /// # Errors
    /// * `Validation` - a person has the reserved id 0, a cluster lists member
    ///   0, two clusters of one kind share an id, or a visitor returns before
    ///   `day`
    pub fn save_snapshot(
        &self,
        container: &mut Container,
        date: NaiveDate,
        day: u32,
        snapshot: &Snapshot,
    ) -> Result<()> {
        let group = self.scope.date_path(date);
        let timer = OperationTimer::start("save_snapshot", group.as_str());
        match self.write_date_group(container, &group, date, day, snapshot) {
            Ok(()) => {
                timer.finish();
                info!(
                    group = %group,
                    day,
                    persons = snapshot.population.len(),
                    clusters = snapshot.clusters.len(),
                    visitors = snapshot.visitors.len(),
                    expatriates = snapshot.expatriates.len(),
                    "Saved snapshot"
                );
                Ok(())
            }
            Err(e) => {
                timer.finish_with_error(&e);
                Err(e)
            }
        }
    }

    fn write_date_group(
        &self,
        container: &mut Container,
        group: &str,
        date: NaiveDate,
        day: u32,
        snapshot: &Snapshot,
    ) -> Result<()> {
        let persons: Vec<PersonRecord> = snapshot
            .population
            .iter()
            .map(PersonRecord::from_person)
            .collect();

        // Every table is encoded before the old date group is dropped, so a
        // rejected snapshot leaves the stored one in place.
        let mut tables = vec![(POPULATION_TABLE.to_string(), Table::from_records(&persons)?)];

        for kind in snapshot.clusters.kinds() {
            let rows: Vec<ClusterMembershipRecord> = encode_groups(
                kind.as_str(),
                snapshot
                    .clusters
                    .of_kind(kind)
                    .iter()
                    .map(|cluster| (cluster.id, cluster.members.as_slice())),
            )?;
            tables.push((kind.as_str().to_string(), Table::from_records(&rows)?));
        }

        let visitors = snapshot
            .visitors
            .entries()
            .map(|entry| -> Result<VisitorRecord> {
                let days_left = entry.return_day.checked_sub(day).ok_or_else(|| {
                    CheckpointError::validation(format!(
                        "Visitor {} returns on day {}, before snapshot day {}",
                        entry.visitor.visitor_person_id, entry.return_day, day
                    ))
                })?;
                Ok(VisitorRecord {
                    days_left,
                    region_id: entry.region_id,
                    home_person_id: entry.visitor.home_person_id,
                    visitor_person_id: entry.visitor.visitor_person_id,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        tables.push((VISITORS_TABLE.to_string(), Table::from_records(&visitors)?));

        let expatriates: Vec<ExpatriateRecord> = snapshot
            .expatriates
            .iter()
            .map(|person| ExpatriateRecord(PersonRecord::from_person(person)))
            .collect();
        tables.push((
            EXPATRIATES_TABLE.to_string(),
            Table::from_records(&expatriates)?,
        ));

        if container.group_exists(group) {
            let name = date.format(DATE_FORMAT).to_string();
            container.remove_node(&self.scope.base(), &name)?;
        }
        container.write_attributes(group, [(DAY_ATTRIBUTE, AttrValue::from(day))])?;
        for (name, table) in tables {
            container.insert_node(group, &name, Node::Table(table))?;
        }
        Ok(())
    }

    /// Restore the snapshot stored for `date`
    ///
    /// Persons are rebuilt in stored order with their infections replayed,
    /// geography from the scope's config is attached, and relation members
    /// are resolved against the restored population.
    ///
    /// # Errors
    /// * `InvalidDate` - no snapshot (or no `Population` table) for `date`
    /// * `DanglingReference` - a relation names a person not in the population
    /// * `SchemaMismatch` - a table holds another record layout
    pub fn load_snapshot(&self, container: &Container, date: NaiveDate) -> Result<Snapshot> {
        let group = self.scope.date_path(date);
        let timer = OperationTimer::start("load_snapshot", group.as_str());
        match self.read_date_group(container, &group) {
            Ok(snapshot) => {
                timer.finish();
                info!(
                    group = %group,
                    persons = snapshot.population.len(),
                    clusters = snapshot.clusters.len(),
                    visitors = snapshot.visitors.len(),
                    expatriates = snapshot.expatriates.len(),
                    "Loaded snapshot"
                );
                Ok(snapshot)
            }
            Err(e) => {
                timer.finish_with_error(&e);
                Err(e)
            }
        }
    }

    fn read_date_group(&self, container: &Container, group: &str) -> Result<Snapshot> {
        if !container.group_exists(group) {
            return Err(CheckpointError::invalid_date(format!("No snapshot group {group}")));
        }
        let persons = match container.read_table::<PersonRecord>(group, POPULATION_TABLE) {
            Ok(persons) => persons,
            Err(e) if e.is_missing() => {
                return Err(CheckpointError::invalid_date(format!(
                    "Snapshot group {group} has no {POPULATION_TABLE} table"
                )))
            }
            Err(e) => return Err(e),
        };

        let mut population = Population::new();
        for record in persons {
            population.emplace(record.into_person())?;
        }
        self.load_atlas(container, &mut population)?;

        let mut clusters = ClusterSet::new();
        for kind in ClusterKind::ALL {
            if !container.exists(&format!("{group}/{kind}")) {
                continue;
            }
            let rows = container.read_table::<ClusterMembershipRecord>(group, kind.as_str())?;
            let groups = decode_groups(&rows, |person_id| {
                if population.contains(person_id) {
                    Ok(person_id)
                } else {
                    Err(CheckpointError::DanglingReference {
                        relation: kind.to_string(),
                        person_id,
                    })
                }
            })?;
            let restored = groups
                .into_iter()
                .map(|decoded| Cluster {
                    id: decoded.key,
                    kind,
                    members: decoded.members,
                })
                .collect();
            clusters.set_kind(kind, restored);
        }

        let day = self.stored_day(container, group)?;
        let mut visitors = VisitorJournal::new();
        if container.exists(&format!("{group}/{VISITORS_TABLE}")) {
            for record in container.read_table::<VisitorRecord>(group, VISITORS_TABLE)? {
                let return_day = day.checked_add(record.days_left).ok_or_else(|| {
                    CheckpointError::invalid_format(format!(
                        "Visitor {} return day overflows",
                        record.visitor_person_id
                    ))
                })?;
                visitors.add(
                    return_day,
                    record.region_id,
                    VisitorId::new(record.home_person_id, record.visitor_person_id),
                );
            }
        }

        let mut expatriates = ExpatriateJournal::new();
        if container.exists(&format!("{group}/{EXPATRIATES_TABLE}")) {
            for record in container.read_table::<ExpatriateRecord>(group, EXPATRIATES_TABLE)? {
                expatriates.add(record.0.into_person());
            }
        }

        Ok(Snapshot {
            population,
            clusters,
            visitors,
            expatriates,
        })
    }

    /// Simulation day recorded for a date group; 0 when not recorded
    fn stored_day(&self, container: &Container, group: &str) -> Result<u32> {
        match container.attribute(group, DAY_ATTRIBUTE) {
            Ok(value) => value
                .as_uint()
                .and_then(|day| u32::try_from(day).ok())
                .ok_or_else(|| {
                    CheckpointError::schema_mismatch(
                        format!("{group}@{DAY_ATTRIBUTE}"),
                        "u32",
                        value.kind_name(),
                    )
                }),
            Err(e) if e.is_missing() => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Store cluster locations and towns in the scope's config group
    pub fn write_atlas(&self, container: &mut Container, atlas: &Atlas) -> Result<()> {
        let group = self.scope.config_path();
        let clusters: Vec<AtlasRecord> = atlas
            .clusters()
            .map(|(kind, cluster_id, position)| AtlasRecord {
                cluster_id,
                cluster_kind: kind.id(),
                latitude: position.latitude,
                longitude: position.longitude,
            })
            .collect();
        let towns: Vec<TownRecord> = atlas
            .towns()
            .iter()
            .map(|town| TownRecord {
                latitude: town.position.latitude,
                longitude: town.position.longitude,
                size: town.size,
                id: town.id,
                name: town.name.clone(),
            })
            .collect();

        container.write_table(&group, ATLAS_TABLE, &clusters)?;
        container.write_table(&group, TOWNS_TABLE, &towns)?;
        debug!(group = %group, clusters = clusters.len(), towns = towns.len(), "Wrote atlas");
        Ok(())
    }

    /// Attach the scope's stored geography to `population`
    ///
    /// A population counts as having geography when at least one cluster
    /// location was stored. Missing tables leave the atlas empty.
    pub fn load_atlas(&self, container: &Container, population: &mut Population) -> Result<()> {
        let group = self.scope.config_path();
        let mut atlas = Atlas::new();

        let mut located = 0;
        if container.exists(&format!("{group}/{ATLAS_TABLE}")) {
            for record in container.read_table::<AtlasRecord>(&group, ATLAS_TABLE)? {
                let kind = ClusterKind::from_id(record.cluster_kind).ok_or_else(|| {
                    CheckpointError::invalid_format(format!(
                        "Unknown cluster kind {} in {group}/{ATLAS_TABLE}",
                        record.cluster_kind
                    ))
                })?;
                atlas.emplace_cluster(
                    kind,
                    record.cluster_id,
                    GeoPosition::new(record.latitude, record.longitude),
                );
                located += 1;
            }
        }
        if container.exists(&format!("{group}/{TOWNS_TABLE}")) {
            for record in container.read_table::<TownRecord>(&group, TOWNS_TABLE)? {
                atlas.add_town(Town {
                    name: record.name,
                    id: record.id,
                    size: record.size,
                    position: GeoPosition::new(record.latitude, record.longitude),
                });
            }
        }

        *population.atlas_mut() = atlas;
        population.set_has_atlas(located > 0);
        Ok(())
    }

    /// Dates with a stored snapshot, ascending
    pub fn snapshot_dates(&self, container: &Container) -> Result<Vec<NaiveDate>> {
        let base = self.scope.base();
        if !container.group_exists(&base) {
            return Ok(Vec::new());
        }
        let mut dates: Vec<NaiveDate> = container
            .child_groups(&base)?
            .iter()
            .filter_map(|name| parse_date_group(name))
            .collect();
        dates.sort();
        Ok(dates)
    }

    /// Latest date with a stored snapshot
    pub fn last_snapshot_date(&self, container: &Container) -> Result<Option<NaiveDate>> {
        Ok(self.snapshot_dates(container)?.last().copied())
    }
}

/// Latest snapshot date of the first run, whichever shape the container has
pub fn last_snapshot_date_in(container: &Container) -> Result<Option<NaiveDate>> {
    SnapshotManager::new(RunScope::first(container)?).last_snapshot_date(container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Group;
    use crate::header::ContainerHeader;
    use crate::model::{ClusterMemberships, Fate, Gender, Person};

    fn container() -> Container {
        Container::from_parts(
            "snapshot.ckpt".to_string(),
            ContainerHeader::new("none"),
            Group::default(),
        )
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn person(id: u32, household: u32) -> Person {
        Person::new(
            id,
            20.0 + f64::from(id),
            Gender::Female,
            ClusterMemberships::new(household, 0, 0, 1, 0),
            Fate::new(1, 5, 2, 6),
        )
    }

    fn sample_snapshot() -> Snapshot {
        let mut population = Population::new();
        for id in 1..=4 {
            population.emplace(person(id, 1 + id / 3)).unwrap();
        }
        if let Some(infected) = population.get_mut(3) {
            infected.health_mut().start_infection();
            infected.health_mut().update();
            infected.health_mut().update();
        }

        let mut clusters = ClusterSet::new();
        let mut first = Cluster::new(1, ClusterKind::Household);
        first.add_member(1);
        first.add_member(2);
        let mut second = Cluster::new(2, ClusterKind::Household);
        second.add_member(3);
        second.add_member(4);
        clusters.push(first);
        clusters.push(second);
        clusters.push(Cluster::new(7, ClusterKind::Household));
        let mut community = Cluster::new(1, ClusterKind::PrimaryCommunity);
        for id in 1..=4 {
            community.add_member(id);
        }
        clusters.push(community);

        let mut visitors = VisitorJournal::new();
        visitors.add(12, 2, VisitorId::new(55, 4));
        visitors.add(10, 3, VisitorId::new(56, 2));

        let mut expatriates = ExpatriateJournal::new();
        expatriates.add(person(90, 0));

        Snapshot {
            population,
            clusters,
            visitors,
            expatriates,
        }
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut container = container();
        let manager = SnapshotManager::new(RunScope::single());
        let snapshot = sample_snapshot();

        manager
            .save_snapshot(&mut container, date(8), 7, &snapshot)
            .unwrap();
        let restored = manager.load_snapshot(&container, date(8)).unwrap();

        assert_eq!(restored, snapshot);
        assert_eq!(restored.clusters.of_kind(ClusterKind::Household)[2].size(), 0);
        assert!(!restored.population.has_atlas());
    }

    #[test]
    fn test_visitor_days_are_relative() {
        let mut container = container();
        let manager = SnapshotManager::new(RunScope::single());
        manager
            .save_snapshot(&mut container, date(8), 7, &sample_snapshot())
            .unwrap();

        let rows: Vec<VisitorRecord> = container.read_table("20200108", VISITORS_TABLE).unwrap();
        let days_left: Vec<u32> = rows.iter().map(|row| row.days_left).collect();
        assert_eq!(days_left, vec![3, 5]);

        let mut early = sample_snapshot();
        early.visitors.add(3, 1, VisitorId::new(1, 1));
        assert!(matches!(
            manager.save_snapshot(&mut container, date(9), 7, &early),
            Err(CheckpointError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_date() {
        let mut container = container();
        let manager = SnapshotManager::new(RunScope::single());
        assert!(matches!(
            manager.load_snapshot(&container, date(1)),
            Err(CheckpointError::InvalidDate(_))
        ));

        container.create_group_if_missing("20200101").unwrap();
        assert!(matches!(
            manager.load_snapshot(&container, date(1)),
            Err(CheckpointError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_dangling_relation_member() {
        let mut container = container();
        let manager = SnapshotManager::new(RunScope::single());
        manager
            .save_snapshot(&mut container, date(2), 1, &sample_snapshot())
            .unwrap();
        container
            .write_table(
                "20200102",
                "School",
                &[
                    ClusterMembershipRecord {
                        cluster_id: 4,
                        person_id: 0,
                    },
                    ClusterMembershipRecord {
                        cluster_id: 4,
                        person_id: 77,
                    },
                ],
            )
            .unwrap();

        match manager.load_snapshot(&container, date(2)) {
            Err(CheckpointError::DanglingReference { relation, person_id }) => {
                assert_eq!(relation, "School");
                assert_eq!(person_id, 77);
            }
            other => panic!("Expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn test_resave_replaces_date_group() {
        let mut container = container();
        let manager = SnapshotManager::new(RunScope::single());
        manager
            .save_snapshot(&mut container, date(3), 2, &sample_snapshot())
            .unwrap();

        let mut smaller = sample_snapshot();
        smaller.clusters = ClusterSet::new();
        manager
            .save_snapshot(&mut container, date(3), 2, &smaller)
            .unwrap();

        assert!(!container.exists("20200103/Household"));
        let restored = manager.load_snapshot(&container, date(3)).unwrap();
        assert!(restored.clusters.is_empty());
    }

    #[test]
    fn test_failed_resave_keeps_previous_snapshot() {
        let mut container = container();
        let manager = SnapshotManager::new(RunScope::single());
        let snapshot = sample_snapshot();
        manager
            .save_snapshot(&mut container, date(15), 14, &snapshot)
            .unwrap();

        let mut reserved_person = sample_snapshot();
        reserved_person.population.emplace(person(0, 1)).unwrap();
        assert!(matches!(
            manager.save_snapshot(&mut container, date(15), 20, &reserved_person),
            Err(CheckpointError::Validation(_))
        ));

        let mut reserved_expatriate = sample_snapshot();
        reserved_expatriate.expatriates.add(person(0, 0));
        assert!(matches!(
            manager.save_snapshot(&mut container, date(15), 20, &reserved_expatriate),
            Err(CheckpointError::Validation(_))
        ));

        let restored = manager.load_snapshot(&container, date(15)).unwrap();
        assert_eq!(restored, snapshot);
        assert_eq!(
            container.attribute("20200115", DAY_ATTRIBUTE).unwrap(),
            &AttrValue::from(14u32)
        );
    }

    #[test]
    fn test_repeated_cluster_id_rejected() {
        let mut container = container();
        let manager = SnapshotManager::new(RunScope::single());

        let mut snapshot = sample_snapshot();
        let mut first = Cluster::new(5, ClusterKind::Work);
        first.add_member(1);
        let mut second = Cluster::new(5, ClusterKind::Work);
        second.add_member(2);
        snapshot.clusters.push(first);
        snapshot.clusters.push(second);

        assert!(matches!(
            manager.save_snapshot(&mut container, date(6), 5, &snapshot),
            Err(CheckpointError::Validation(_))
        ));
        assert!(!container.group_exists("20200106"));
    }

    #[test]
    fn test_atlas_attached_on_load() {
        let mut container = container();
        let manager = SnapshotManager::new(RunScope::run(0));

        let mut atlas = Atlas::new();
        atlas.emplace_cluster(ClusterKind::Household, 1, GeoPosition::new(51.05, 3.72));
        atlas.emplace_cluster(ClusterKind::School, 4, GeoPosition::new(51.2, 4.4));
        atlas.add_town(Town {
            name: "Gent".to_string(),
            id: 1,
            size: 262_219,
            position: GeoPosition::new(51.05, 3.72),
        });
        manager.write_atlas(&mut container, &atlas).unwrap();
        manager
            .save_snapshot(&mut container, date(5), 4, &sample_snapshot())
            .unwrap();

        let restored = manager.load_snapshot(&container, date(5)).unwrap();
        assert!(restored.population.has_atlas());
        assert_eq!(restored.population.atlas(), &atlas);
        assert!(container.exists("Simulation 0/Config/Atlas"));
    }

    #[test]
    fn test_snapshot_dates_skip_other_groups() {
        let mut container = container();
        let manager = SnapshotManager::new(RunScope::single());
        assert_eq!(manager.last_snapshot_date(&container).unwrap(), None);

        for day in [15, 1, 9] {
            manager
                .save_snapshot(&mut container, date(day), day, &Snapshot::default())
                .unwrap();
        }
        container.create_group_if_missing("Config").unwrap();
        container.create_group_if_missing("Simulation 0").unwrap();
        container.create_group_if_missing("scratch").unwrap();

        assert_eq!(
            manager.snapshot_dates(&container).unwrap(),
            vec![date(1), date(9), date(15)]
        );
        assert_eq!(
            manager.last_snapshot_date(&container).unwrap(),
            Some(date(15))
        );
    }

    #[test]
    fn test_last_snapshot_date_in_multi_run() {
        let mut container = container();
        SnapshotManager::new(RunScope::run(0))
            .save_snapshot(&mut container, date(15), 14, &Snapshot::default())
            .unwrap();
        SnapshotManager::new(RunScope::run(1))
            .save_snapshot(&mut container, date(20), 19, &Snapshot::default())
            .unwrap();

        assert_eq!(last_snapshot_date_in(&container).unwrap(), Some(date(15)));
    }
}
