/*!
Grouped one-to-many relations stored as flat rows.

A relation maps a group key to an ordered list of members. It is stored as a
run of rows per group: first a sentinel row `(key, 0)` that carries the
group's identity, then one `(key, member)` row per member. Groups are
recognized purely by contiguity, so a group with no members still survives as
its lone sentinel.
*/

use crate::{CheckpointError, Result};
use std::collections::HashSet;

/// Member id reserved for the sentinel row of each group
pub const SENTINEL_MEMBER: u32 = 0;

/// A row type that can carry one relation entry
pub trait RelationRow: Sized {
    fn new(key: u32, member: u32) -> Self;
    fn key(&self) -> u32;
    fn member(&self) -> u32;

    fn is_sentinel(&self) -> bool {
        self.member() == SENTINEL_MEMBER
    }
}

/// One decoded group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationGroup<M> {
    pub key: u32,
    pub members: Vec<M>,
}

/// Flatten groups into rows, one sentinel plus one row per member each
///
/// # Arguments
/// * `relation` - Name used in error messages
/// * `groups` - `(key, member ids)` pairs in output order
///
/// # Errors
/// * `Validation` - a key occurs twice, or a member has the reserved id 0
pub fn encode_groups<'a, R, I>(relation: &str, groups: I) -> Result<Vec<R>>
where
    R: RelationRow,
    I: IntoIterator<Item = (u32, &'a [u32])>,
{
    let mut rows = Vec::new();
    let mut seen = HashSet::new();
    for (key, members) in groups {
        if !seen.insert(key) {
            return Err(CheckpointError::validation(format!(
                "Relation '{relation}' has more than one group with key {key}"
            )));
        }
        rows.push(R::new(key, SENTINEL_MEMBER));
        for &member in members {
            if member == SENTINEL_MEMBER {
                return Err(CheckpointError::validation(format!(
                    "Relation '{relation}' group {key} contains reserved member id 0"
                )));
            }
            rows.push(R::new(key, member));
        }
    }
    Ok(rows)
}

/// Rebuild groups from rows
///
/// A new group starts on the first row and whenever the key changes. Sentinel
/// rows only open groups; every other row is passed to `resolve`, whose result
/// is appended to the current group. `resolve` is expected to fail with
/// [`CheckpointError::DanglingReference`] for unknown members.
pub fn decode_groups<R, M, F>(rows: &[R], mut resolve: F) -> Result<Vec<RelationGroup<M>>>
where
    R: RelationRow,
    F: FnMut(u32) -> Result<M>,
{
    let mut groups: Vec<RelationGroup<M>> = Vec::new();
    let mut current: Option<RelationGroup<M>> = None;

    for row in rows {
        let starts_group = match &current {
            Some(group) => group.key != row.key(),
            None => true,
        };
        if starts_group {
            if let Some(done) = current.take() {
                groups.push(done);
            }
            current = Some(RelationGroup {
                key: row.key(),
                members: Vec::new(),
            });
        }
        if row.is_sentinel() {
            continue;
        }
        let member = resolve(row.member())?;
        if let Some(group) = current.as_mut() {
            group.members.push(member);
        }
    }

    if let Some(done) = current {
        groups.push(done);
    }
    Ok(groups)
}
