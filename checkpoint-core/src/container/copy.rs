/*!
Recursive traversal and subtree copy.
*/

use super::{Blob, Container, Group, Node, NodePath, Table};
use crate::layout::LAYOUT_ATTRIBUTE;
use crate::Result;
use tracing::debug;

/// Callbacks for a depth-first walk over a group
///
/// Children are visited in name order. Paths are absolute within the walked
/// container.
pub trait NodeVisitor {
    fn enter_group(&mut self, _path: &NodePath, _group: &Group) -> Result<()> {
        Ok(())
    }

    fn leave_group(&mut self, _path: &NodePath, _group: &Group) -> Result<()> {
        Ok(())
    }

    fn visit_table(&mut self, path: &NodePath, table: &Table) -> Result<()>;

    fn visit_blob(&mut self, path: &NodePath, blob: &Blob) -> Result<()>;
}

/// Walk `group`, located at `path`, and everything below it
pub fn walk(group: &Group, path: &NodePath, visitor: &mut dyn NodeVisitor) -> Result<()> {
    visitor.enter_group(path, group)?;
    for (name, child) in &group.children {
        let child_path = path.child(name);
        match child {
            Node::Group(inner) => walk(inner, &child_path, visitor)?,
            Node::Table(table) => visitor.visit_table(&child_path, table)?,
            Node::Blob(blob) => visitor.visit_blob(&child_path, blob)?,
        }
    }
    visitor.leave_group(path, group)
}

/// Node counts and payload sizes of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerStats {
    pub groups: usize,
    pub tables: usize,
    pub blobs: usize,
    pub rows: u64,
    pub payload_bytes: usize,
}

impl NodeVisitor for ContainerStats {
    fn enter_group(&mut self, _path: &NodePath, _group: &Group) -> Result<()> {
        self.groups += 1;
        Ok(())
    }

    fn visit_table(&mut self, _path: &NodePath, table: &Table) -> Result<()> {
        self.tables += 1;
        self.rows += table.row_count;
        self.payload_bytes += table.rows.len();
        Ok(())
    }

    fn visit_blob(&mut self, _path: &NodePath, blob: &Blob) -> Result<()> {
        self.blobs += 1;
        self.payload_bytes += blob.data.len();
        Ok(())
    }
}

/// Replays a walk of one container into another
struct CopyVisitor<'a> {
    source_root: NodePath,
    target_root: NodePath,
    target: &'a mut Container,
}

impl CopyVisitor<'_> {
    fn target_path(&self, path: &NodePath) -> NodePath {
        let relative = path.strip_prefix(&self.source_root).unwrap_or_default();
        self.target_root.join(&relative)
    }

    fn insert(&mut self, path: &NodePath, node: Node) -> Result<()> {
        let target = self.target_path(path);
        let parent = target.parent().unwrap_or_default();
        let name = target.name().unwrap_or_default();
        self.target.insert_node(&parent.to_string(), name, node)
    }
}

impl NodeVisitor for CopyVisitor<'_> {
    fn enter_group(&mut self, path: &NodePath, group: &Group) -> Result<()> {
        let target = self.target_path(path).to_string();
        self.target.create_group_if_missing(&target)?;
        let is_source_root = *path == self.source_root;
        let attributes = group
            .attributes
            .iter()
            .filter(|(name, _)| !is_source_root || name.as_str() != LAYOUT_ATTRIBUTE)
            .map(|(name, value)| (name.clone(), value.clone()));
        self.target.write_attributes(&target, attributes)
    }

    fn visit_table(&mut self, path: &NodePath, table: &Table) -> Result<()> {
        self.insert(path, Node::Table(table.clone()))
    }

    fn visit_blob(&mut self, path: &NodePath, blob: &Blob) -> Result<()> {
        self.insert(path, Node::Blob(blob.clone()))
    }
}

/// Deep-copy the group at `source_path` in `source` to `target_path` in `target`
///
/// Children, their kinds, attributes and table rows are preserved; existing
/// nodes with the same names are replaced. A layout marker on the copied
/// group itself is dropped, since it describes the container the group came
/// from; nested groups keep theirs.
pub fn copy_subtree(
    source: &Container,
    source_path: &str,
    target: &mut Container,
    target_path: &str,
) -> Result<()> {
    let source_root = NodePath::parse(source_path);
    let target_root = NodePath::parse(target_path);
    debug!(
        from = %source.location(),
        source_path = %source_root,
        to = %target.location(),
        target_path = %target_root,
        "Copying subtree"
    );

    let mut visitor = CopyVisitor {
        source_root,
        target_root,
        target,
    };
    source.walk(source_path, &mut visitor)
}
