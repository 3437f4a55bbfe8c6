/*!
Reserved names and the two container shapes.

A **single-run** container keeps `Config` and the date groups at its root. A
**multi-run** container keeps one `Simulation N` group per run, each shaped
like a single-run root. The root records which shape it has in its `layout`
attribute; containers written without the marker are recognized by probing
for `Simulation 0`.
*/

use crate::container::{AttrValue, Container, NodePath};
use crate::{CheckpointError, Result};
use chrono::NaiveDate;
use std::fmt;

pub const CONFIG_GROUP: &str = "Config";
pub const RUN_GROUP_PREFIX: &str = "Simulation ";
pub const LAYOUT_ATTRIBUTE: &str = "layout";
pub const DAY_ATTRIBUTE: &str = "day";

pub const POPULATION_TABLE: &str = "Population";
pub const VISITORS_TABLE: &str = "Visitors";
pub const EXPATRIATES_TABLE: &str = "Expatriates";
pub const ATLAS_TABLE: &str = "Atlas";
pub const TOWNS_TABLE: &str = "Towns";

/// Date group names, e.g. `20200315`
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Name of the group holding run `index` in a multi-run container
pub fn run_group_name(index: u32) -> String {
    format!("{RUN_GROUP_PREFIX}{index}")
}

/// Run index of a `Simulation N` group name
pub fn parse_run_index(name: &str) -> Option<u32> {
    name.strip_prefix(RUN_GROUP_PREFIX)?.parse().ok()
}

/// Date of a date group name
pub fn parse_date_group(name: &str) -> Option<NaiveDate> {
    if name.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(name, DATE_FORMAT).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerLayout {
    Single,
    Multi,
}

impl ContainerLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerLayout::Single => "single",
            ContainerLayout::Multi => "multi",
        }
    }

    /// Shape of `container`: the root marker if present, otherwise a probe
    pub fn detect(container: &Container) -> Result<Self> {
        match container.attribute("", LAYOUT_ATTRIBUTE) {
            Ok(value) => match value.as_text() {
                Some("single") => Ok(ContainerLayout::Single),
                Some("multi") => Ok(ContainerLayout::Multi),
                _ => Err(CheckpointError::schema_mismatch(
                    LAYOUT_ATTRIBUTE,
                    "\"single\" or \"multi\"",
                    format!("{value:?}"),
                )),
            },
            Err(e) if e.is_missing() => {
                if container.group_exists(&run_group_name(0)) {
                    Ok(ContainerLayout::Multi)
                } else {
                    Ok(ContainerLayout::Single)
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the root carries an explicit marker
    pub fn is_marked(container: &Container) -> bool {
        container.attribute("", LAYOUT_ATTRIBUTE).is_ok()
    }

    /// Record this shape on the container root
    pub fn mark(&self, container: &mut Container) -> Result<()> {
        container.write_attributes("", [(LAYOUT_ATTRIBUTE, AttrValue::from(self.as_str()))])
    }
}

impl fmt::Display for ContainerLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part of a container one run lives in
///
/// Passed explicitly to every config and snapshot operation; a scope never
/// changes once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunScope {
    run: Option<u32>,
    base: NodePath,
}

impl RunScope {
    /// The root of a single-run container
    pub fn single() -> Self {
        Self {
            run: None,
            base: NodePath::root(),
        }
    }

    /// Run `index` of a multi-run container
    pub fn run(index: u32) -> Self {
        Self {
            run: Some(index),
            base: NodePath::root().child(&run_group_name(index)),
        }
    }

    /// The scope of the first run, whichever shape the container has
    pub fn first(container: &Container) -> Result<Self> {
        Ok(match ContainerLayout::detect(container)? {
            ContainerLayout::Single => Self::single(),
            ContainerLayout::Multi => Self::run(0),
        })
    }

    /// Scopes of all runs: the root for a single-run container, otherwise
    /// `Simulation 0`, `Simulation 1`, ... up to the first missing index
    pub fn all(container: &Container) -> Result<Vec<Self>> {
        match ContainerLayout::detect(container)? {
            ContainerLayout::Single => Ok(vec![Self::single()]),
            ContainerLayout::Multi => Ok((0..)
                .take_while(|&index| container.group_exists(&run_group_name(index)))
                .map(Self::run)
                .collect()),
        }
    }

    pub fn run_index(&self) -> Option<u32> {
        self.run
    }

    /// Path of the scope's root group
    pub fn base(&self) -> String {
        self.base.to_string()
    }

    pub fn config_path(&self) -> String {
        self.base.child(CONFIG_GROUP).to_string()
    }

    pub fn date_path(&self, date: NaiveDate) -> String {
        self.base
            .child(&date.format(DATE_FORMAT).to_string())
            .to_string()
    }

    /// File stem for a blob materialized from this scope
    pub fn file_stem(&self, blob_name: &str) -> String {
        match self.run {
            Some(index) => format!("run{index}_{blob_name}"),
            None => blob_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Group;
    use crate::header::ContainerHeader;

    fn container() -> Container {
        Container::from_parts(
            "layout.ckpt".to_string(),
            ContainerHeader::new("none"),
            Group::default(),
        )
    }

    #[test]
    fn test_names() {
        assert_eq!(run_group_name(3), "Simulation 3");
        assert_eq!(parse_run_index("Simulation 12"), Some(12));
        assert_eq!(parse_run_index("Config"), None);
        assert_eq!(
            parse_date_group("20200115"),
            NaiveDate::from_ymd_opt(2020, 1, 15)
        );
        assert_eq!(parse_date_group("2020115"), None);
        assert_eq!(parse_date_group("Config"), None);
    }

    #[test]
    fn test_scope_paths() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 15).unwrap();

        let single = RunScope::single();
        assert_eq!(single.config_path(), "Config");
        assert_eq!(single.date_path(date), "20200315");
        assert_eq!(single.file_stem("disease"), "disease");

        let run = RunScope::run(2);
        assert_eq!(run.base(), "Simulation 2");
        assert_eq!(run.config_path(), "Simulation 2/Config");
        assert_eq!(run.date_path(date), "Simulation 2/20200315");
        assert_eq!(run.file_stem("disease"), "run2_disease");
    }

    #[test]
    fn test_detect_by_probe_and_marker() {
        let mut container = container();
        assert_eq!(
            ContainerLayout::detect(&container).unwrap(),
            ContainerLayout::Single
        );
        assert!(!ContainerLayout::is_marked(&container));

        container.create_group_if_missing("Simulation 0").unwrap();
        assert_eq!(
            ContainerLayout::detect(&container).unwrap(),
            ContainerLayout::Multi
        );

        ContainerLayout::Single.mark(&mut container).unwrap();
        assert_eq!(
            ContainerLayout::detect(&container).unwrap(),
            ContainerLayout::Single
        );
        assert_eq!(RunScope::first(&container).unwrap(), RunScope::single());
    }

    #[test]
    fn test_all_scopes_stop_at_gap() {
        let mut container = container();
        assert_eq!(RunScope::all(&container).unwrap(), vec![RunScope::single()]);

        container.create_group_if_missing("Simulation 0").unwrap();
        container.create_group_if_missing("Simulation 1").unwrap();
        container.create_group_if_missing("Simulation 3").unwrap();
        assert_eq!(
            RunScope::all(&container).unwrap(),
            vec![RunScope::run(0), RunScope::run(1)]
        );
    }

    #[test]
    fn test_bad_marker() {
        let mut container = container();
        container
            .write_attributes("", [(LAYOUT_ATTRIBUTE, AttrValue::from(2u32))])
            .unwrap();
        assert!(matches!(
            ContainerLayout::detect(&container),
            Err(CheckpointError::SchemaMismatch { .. })
        ));
    }
}
