/*!
Hierarchical checkpoint container.

A container is a tree of named nodes held in memory while open:

- **groups** hold child nodes and typed attributes,
- **tables** hold fixed-layout rows of a single [`Record`] type,
- **blobs** hold opaque bytes plus attributes (used for embedded input files).

Nodes are addressed with `/`-separated paths from the root, for example
`Config/disease` or `Simulation 1/20200315/Population`. The tree is read from
and written to storage as a whole by the [`ContainerEngine`](crate::ContainerEngine).
*/

mod copy;
pub mod format;
mod node;
mod path;

pub use copy::{copy_subtree, walk, ContainerStats, NodeVisitor};
pub use node::{AttrValue, Attributes, Blob, Group, Node, NodeKind, Table};
pub use path::NodePath;

use crate::header::ContainerHeader;
use crate::records::{decode_rows, Record};
use crate::{CheckpointError, Result};

/// Name of the blob attribute recording the original file extension
pub const EXTENSION_ATTRIBUTE: &str = "extension";

/// An open container
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    location: String,
    header: ContainerHeader,
    root: Group,
}

impl Container {
    pub(crate) fn from_parts(location: String, header: ContainerHeader, root: Group) -> Self {
        Self {
            location,
            header,
            root,
        }
    }

    /// Storage location the container was opened from
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub(crate) fn set_header(&mut self, header: ContainerHeader) {
        self.header = header;
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Node at `path`, if any
    pub fn node(&self, path: &str) -> Option<&Node> {
        let path = NodePath::parse(path);
        let (name, parent) = match (path.name(), path.parent()) {
            (Some(name), Some(parent)) => (name, parent),
            _ => return None,
        };
        let mut group = &self.root;
        for segment in parent.segments() {
            match group.children.get(segment) {
                Some(Node::Group(child)) => group = child,
                _ => return None,
            }
        }
        group.children.get(name)
    }

    /// Whether any node exists at `path`; the root always exists
    pub fn exists(&self, path: &str) -> bool {
        NodePath::parse(path).is_root() || self.node(path).is_some()
    }

    /// Whether a group exists at `path`
    pub fn group_exists(&self, path: &str) -> bool {
        NodePath::parse(path).is_root() || matches!(self.node(path), Some(Node::Group(_)))
    }

    /// Group at `path`
    ///
    /// # Errors
    /// * `MissingNode` - nothing at `path`
    /// * `SchemaMismatch` - a table or blob at `path` or one of its ancestors
    pub fn group(&self, path: &str) -> Result<&Group> {
        let path = NodePath::parse(path);
        let mut group = &self.root;
        let mut walked = NodePath::root();
        for segment in path.segments() {
            walked = walked.child(segment);
            group = match group.children.get(segment) {
                Some(Node::Group(child)) => child,
                Some(other) => {
                    return Err(CheckpointError::schema_mismatch(
                        walked.to_string(),
                        NodeKind::Group.to_string(),
                        other.kind().to_string(),
                    ))
                }
                None => return Err(CheckpointError::missing_node(walked.to_string())),
            };
        }
        Ok(group)
    }

    fn group_mut(&mut self, path: &str, create: bool) -> Result<&mut Group> {
        let path = NodePath::parse(path);
        let mut group = &mut self.root;
        let mut walked = NodePath::root();
        for segment in path.segments() {
            walked = walked.child(segment);
            if create && !group.children.contains_key(segment) {
                group
                    .children
                    .insert(segment.clone(), Node::Group(Group::default()));
            }
            group = match group.children.get_mut(segment) {
                Some(Node::Group(child)) => child,
                Some(other) => {
                    return Err(CheckpointError::schema_mismatch(
                        walked.to_string(),
                        NodeKind::Group.to_string(),
                        other.kind().to_string(),
                    ))
                }
                None => return Err(CheckpointError::missing_node(walked.to_string())),
            };
        }
        Ok(group)
    }

    /// Create the group at `path` and any missing ancestors
    pub fn create_group_if_missing(&mut self, path: &str) -> Result<()> {
        self.group_mut(path, true).map(|_| ())
    }

    /// Insert or replace a child node, creating the parent group if needed
    pub fn insert_node(&mut self, group: &str, name: &str, node: Node) -> Result<()> {
        if name.is_empty() || name.contains('/') {
            return Err(CheckpointError::validation(format!(
                "Invalid node name '{name}'"
            )));
        }
        self.group_mut(group, true)?
            .children
            .insert(name.to_string(), node);
        Ok(())
    }

    /// Remove a node; returns it if it existed
    pub fn remove_node(&mut self, group: &str, name: &str) -> Result<Option<Node>> {
        Ok(self.group_mut(group, false)?.children.remove(name))
    }

    /// Write `rows` as table `name` under `group`, replacing any previous node
    pub fn write_table<R: Record>(&mut self, group: &str, name: &str, rows: &[R]) -> Result<()> {
        let table = Table::from_records(rows)?;
        self.insert_node(group, name, Node::Table(table))
    }

    /// Read table `name` under `group` as records of type `R`
    ///
    /// # Errors
    /// * `MissingNode` - the table does not exist
    /// * `SchemaMismatch` - the node is not a table or stores another record layout
    pub fn read_table<R: Record>(&self, group: &str, name: &str) -> Result<Vec<R>> {
        let table = self.table(group, name)?;
        let expected = R::layout();
        if table.layout != expected {
            return Err(CheckpointError::schema_mismatch(
                NodePath::parse(group).child(name).to_string(),
                expected.to_string(),
                table.layout.to_string(),
            ));
        }
        decode_rows(&table.rows, table.row_count)
    }

    /// Raw table node
    pub fn table(&self, group: &str, name: &str) -> Result<&Table> {
        let path = NodePath::parse(group).child(name);
        match self.group(group)?.children.get(name) {
            Some(Node::Table(table)) => Ok(table),
            Some(other) => Err(CheckpointError::schema_mismatch(
                path.to_string(),
                NodeKind::Table.to_string(),
                other.kind().to_string(),
            )),
            None => Err(CheckpointError::missing_node(path.to_string())),
        }
    }

    /// Store `data` as blob `name`, recording `extension` (leading dot included, may be empty)
    pub fn write_blob(&mut self, group: &str, name: &str, data: &[u8], extension: &str) -> Result<()> {
        let mut blob = Blob {
            data: data.to_vec(),
            ..Blob::default()
        };
        blob.attributes
            .insert(EXTENSION_ATTRIBUTE.to_string(), AttrValue::from(extension));
        self.insert_node(group, name, Node::Blob(blob))
    }

    /// Read blob `name` and its recorded extension
    ///
    /// # Errors
    /// * `MissingNode` - the blob does not exist
    /// * `InvalidBlob` - the extension attribute is absent or not text
    pub fn read_blob(&self, group: &str, name: &str) -> Result<(Vec<u8>, String)> {
        let path = NodePath::parse(group).child(name);
        let blob = match self.group(group)?.children.get(name) {
            Some(Node::Blob(blob)) => blob,
            Some(other) => {
                return Err(CheckpointError::schema_mismatch(
                    path.to_string(),
                    NodeKind::Blob.to_string(),
                    other.kind().to_string(),
                ))
            }
            None => return Err(CheckpointError::missing_node(path.to_string())),
        };
        let extension = blob
            .attributes
            .get(EXTENSION_ATTRIBUTE)
            .and_then(AttrValue::as_text)
            .ok_or_else(|| {
                CheckpointError::invalid_blob(format!("{path} has no readable extension attribute"))
            })?;
        Ok((blob.data.clone(), extension.to_string()))
    }

    /// Merge `attributes` into the group at `path`, creating it if needed
    pub fn write_attributes<I, K>(&mut self, path: &str, attributes: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, AttrValue)>,
        K: Into<String>,
    {
        let group = self.group_mut(path, true)?;
        for (name, value) in attributes {
            group.attributes.insert(name.into(), value);
        }
        Ok(())
    }

    /// All attributes of the group at `path`
    pub fn read_attributes(&self, path: &str) -> Result<Attributes> {
        Ok(self.group(path)?.attributes.clone())
    }

    /// A single attribute of the group at `path`
    pub fn attribute(&self, path: &str, name: &str) -> Result<&AttrValue> {
        self.group(path)?.attributes.get(name).ok_or_else(|| {
            CheckpointError::missing_node(format!("attribute '{name}' of {}", NodePath::parse(path)))
        })
    }

    /// Child names of the group at `path`, in name order
    pub fn child_names(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.group(path)?.children.keys().cloned().collect())
    }

    /// Names of the child groups of the group at `path`, in name order
    pub fn child_groups(&self, path: &str) -> Result<Vec<String>> {
        Ok(self
            .group(path)?
            .children
            .iter()
            .filter(|(_, node)| matches!(node, Node::Group(_)))
            .map(|(name, _)| name.clone())
            .collect())
    }

    /// Visit the subtree rooted at group `path`
    pub fn walk(&self, path: &str, visitor: &mut dyn NodeVisitor) -> Result<()> {
        walk(self.group(path)?, &NodePath::parse(path), visitor)
    }

    /// Node counts and sizes of the whole tree
    pub fn stats(&self) -> Result<ContainerStats> {
        let mut stats = ContainerStats::default();
        self.walk("", &mut stats)?;
        Ok(stats)
    }
}
