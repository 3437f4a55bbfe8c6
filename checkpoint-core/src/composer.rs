/*!
Multi-run composition.

Runs of a multi-run simulation checkpoint into their own single-run
containers. [`combine_run_into`] folds such a container into a `Simulation N`
group of a shared multi-run container; [`split_run_out`] does the reverse so a
run can be resumed from its own file.
*/

use crate::container::{copy_subtree, Container};
use crate::engine::ContainerStore;
use crate::header::ContainerHeader;
use crate::layout::{run_group_name, ContainerLayout, RunScope};
use crate::{CheckpointError, Result};
use tracing::info;

/// Conventional location of run `run_index`'s own container, e.g. `2_flanders.ckpt`
pub fn run_file_name(run_index: u32, base_name: &str) -> String {
    format!("{run_index}_{base_name}")
}

/// Copy the single-run container at `external_path` into run `run_index` of
/// `container`
///
/// An existing run with that index is replaced. `container` is marked
/// multi-run; the external container is only read.
///
/// # Errors
/// * `Validation` - `container` already holds a single run at its root, or
///   the external container is itself multi-run
/// * `MissingNode` - nothing exists at `external_path`
pub fn combine_run_into(
    store: &dyn ContainerStore,
    container: &mut Container,
    run_index: u32,
    external_path: &str,
) -> Result<()> {
    let has_content = !container.root().children.is_empty();
    if has_content && ContainerLayout::detect(container)? == ContainerLayout::Single {
        return Err(CheckpointError::validation(format!(
            "{} holds a single run and cannot take run {}",
            container.location(),
            run_index
        )));
    }

    let external = store.open(external_path)?;
    if ContainerLayout::detect(&external)? == ContainerLayout::Multi {
        return Err(CheckpointError::validation(format!(
            "{external_path} is a multi-run container"
        )));
    }

    let run_group = run_group_name(run_index);
    if container.group_exists(&run_group) {
        container.remove_node("", &run_group)?;
    }
    container.create_group_if_missing(&run_group)?;
    copy_subtree(&external, "", container, &run_group)?;
    drop(external);

    ContainerLayout::Multi.mark(container)?;
    info!(
        target = %container.location(),
        source = %external_path,
        run = run_index,
        "Combined run"
    );
    Ok(())
}

/// Write run `run_index` of `container` to a new single-run container at
/// `destination_path`
///
/// # Errors
/// * `MissingNode` - `container` has no such run
pub fn split_run_out(
    store: &dyn ContainerStore,
    container: &Container,
    run_index: u32,
    destination_path: &str,
) -> Result<ContainerHeader> {
    let run_group = run_group_name(run_index);
    if !container.group_exists(&run_group) {
        return Err(CheckpointError::missing_node(format!(
            "{} in {}",
            run_group,
            container.location()
        )));
    }

    let mut destination = store.create(destination_path)?;
    copy_subtree(container, &run_group, &mut destination, "")?;
    ContainerLayout::Single.mark(&mut destination)?;
    let header = store.close(destination)?;

    info!(
        source = %container.location(),
        target = %destination_path,
        run = run_index,
        "Split run"
    );
    Ok(header)
}

/// Split every run of `container` into `{index}_{base_name}`
///
/// # Returns
/// The written locations, in run order
pub fn split_all(store: &dyn ContainerStore, container: &Container, base_name: &str) -> Result<Vec<String>> {
    let mut written = Vec::new();
    for scope in RunScope::all(container)? {
        let Some(run_index) = scope.run_index() else {
            return Err(CheckpointError::validation(format!(
                "{} is a single-run container",
                container.location()
            )));
        };
        let destination = run_file_name(run_index, base_name);
        split_run_out(store, container, run_index, &destination)?;
        written.push(destination);
    }
    Ok(written)
}

/// Combine the containers at `sources` into runs 0, 1, ... of the container at
/// `target_path`, creating it if needed
pub fn combine_files(store: &dyn ContainerStore, target_path: &str, sources: &[&str]) -> Result<ContainerHeader> {
    let mut target = store.open_or_create(target_path)?;
    for (run_index, source) in (0u32..).zip(sources) {
        combine_run_into(store, &mut target, run_index, source)?;
    }
    store.close(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::AttrValue;
    use crate::engine::create_memory_engine;
    use crate::records::ClusterMembershipRecord;

    fn single_run(store: &dyn ContainerStore, path: &str, seed: u32) {
        let mut container = store.create(path).unwrap();
        container
            .write_attributes("Config", [("rng_seed", AttrValue::from(seed))])
            .unwrap();
        container
            .write_blob("Config", "disease", b"<disease/>", ".xml")
            .unwrap();
        container
            .write_table(
                "20200101",
                "Household",
                &[ClusterMembershipRecord {
                    cluster_id: 1,
                    person_id: 0,
                }],
            )
            .unwrap();
        ContainerLayout::Single.mark(&mut container).unwrap();
        store.close(container).unwrap();
    }

    #[test]
    fn test_combine_then_split_is_symmetric() {
        let engine = create_memory_engine();
        single_run(&engine, "0_run.ckpt", 10);
        single_run(&engine, "1_run.ckpt", 11);

        combine_files(&engine, "all.ckpt", &["0_run.ckpt", "1_run.ckpt"]).unwrap();
        let combined = engine.open("all.ckpt").unwrap();
        assert_eq!(
            ContainerLayout::detect(&combined).unwrap(),
            ContainerLayout::Multi
        );
        assert_eq!(
            combined
                .attribute("Simulation 1/Config", "rng_seed")
                .unwrap()
                .as_uint(),
            Some(11)
        );

        split_run_out(&engine, &combined, 1, "split.ckpt").unwrap();
        let split = engine.open("split.ckpt").unwrap();
        let original = engine.open("1_run.ckpt").unwrap();
        assert_eq!(split.root(), original.root());
    }

    #[test]
    fn test_combine_refuses_single_run_target() {
        let engine = create_memory_engine();
        single_run(&engine, "single.ckpt", 1);
        single_run(&engine, "other.ckpt", 2);

        let mut target = engine.open("single.ckpt").unwrap();
        assert!(matches!(
            combine_run_into(&engine, &mut target, 0, "other.ckpt"),
            Err(CheckpointError::Validation(_))
        ));
    }

    #[test]
    fn test_combine_replaces_existing_run() {
        let engine = create_memory_engine();
        single_run(&engine, "a.ckpt", 1);
        let mut b = engine.create("b.ckpt").unwrap();
        b.write_attributes("Config", [("rng_seed", AttrValue::from(2u32))])
            .unwrap();
        engine.close(b).unwrap();

        let mut target = engine.create("multi.ckpt").unwrap();
        combine_run_into(&engine, &mut target, 0, "a.ckpt").unwrap();
        combine_run_into(&engine, &mut target, 0, "b.ckpt").unwrap();

        assert!(!target.exists("Simulation 0/20200101"));
        assert!(!target.exists("Simulation 0/Config/disease"));
    }

    #[test]
    fn test_split_missing_run() {
        let engine = create_memory_engine();
        let container = engine.create("empty.ckpt").unwrap();
        assert!(matches!(
            split_run_out(&engine, &container, 3, "out.ckpt"),
            Err(CheckpointError::MissingNode(_))
        ));
        assert!(!engine.exists("out.ckpt"));
    }

    #[test]
    fn test_split_all_uses_run_file_names() {
        let engine = create_memory_engine();
        single_run(&engine, "x.ckpt", 5);
        single_run(&engine, "y.ckpt", 6);
        combine_files(&engine, "multi.ckpt", &["x.ckpt", "y.ckpt"]).unwrap();

        let combined = engine.open("multi.ckpt").unwrap();
        let written = split_all(&engine, &combined, "flanders.ckpt").unwrap();
        assert_eq!(written, vec!["0_flanders.ckpt", "1_flanders.ckpt"]);

        let second = engine.open("1_flanders.ckpt").unwrap();
        assert_eq!(
            second.attribute("Config", "rng_seed").unwrap().as_uint(),
            Some(6)
        );
    }
}
