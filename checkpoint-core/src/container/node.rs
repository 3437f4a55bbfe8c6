/*!
Node tree of a container.
*/

use crate::records::{encode_rows, Record, RecordLayout};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Typed scalar attached to a group or blob
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    UInt(u64),
    Double(f64),
    Text(String),
}

impl AttrValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::UInt(_) => "uint",
            AttrValue::Double(_) => "double",
            AttrValue::Text(_) => "text",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            AttrValue::UInt(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            AttrValue::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::UInt(u64::from(value))
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        AttrValue::UInt(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Double(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

/// Named scalars, ordered by name
pub type Attributes = BTreeMap<String, AttrValue>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Group {
    pub attributes: Attributes,
    pub children: BTreeMap<String, Node>,
}

/// Rows of one record type, stored with their layout
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Table {
    pub layout: RecordLayout,
    pub row_count: u64,
    pub rows: Vec<u8>,
}

impl Table {
    /// Encode `rows` into a table node without touching any container
    pub fn from_records<R: Record>(rows: &[R]) -> Result<Self> {
        Ok(Self {
            layout: R::layout(),
            row_count: rows.len() as u64,
            rows: encode_rows(rows)?,
        })
    }
}

/// Opaque bytes, typically an embedded input file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Blob {
    pub data: Vec<u8>,
    pub attributes: Attributes,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Node {
    Group(Group),
    Table(Table),
    Blob(Blob),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Table,
    Blob,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Group => "group",
            NodeKind::Table => "table",
            NodeKind::Blob => "blob",
        };
        f.write_str(name)
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Group(_) => NodeKind::Group,
            Node::Table(_) => NodeKind::Table,
            Node::Blob(_) => NodeKind::Blob,
        }
    }
}
