/*!
Fixed-layout record codecs.

Every table in a container stores rows of one record type. A record type is
described by its name and an ordered list of typed fields; that description is
stored next to the rows so a reader can detect when a table holds something
other than what it asks for. Rows are little-endian, packed in field order,
strings are a `u32` byte length followed by UTF-8.
*/

mod atlas;
mod membership;
mod person;
mod visitor;

pub use atlas::{AtlasRecord, TownRecord};
pub use membership::ClusterMembershipRecord;
pub use person::{ExpatriateRecord, PersonRecord};
pub use visitor::VisitorRecord;

use crate::{CheckpointError, Result};
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive type of a record field
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    U8,
    Bool,
    U32,
    F64,
    Str,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::U8 => "u8",
            FieldType::Bool => "bool",
            FieldType::U32 => "u32",
            FieldType::F64 => "f64",
            FieldType::Str => "string",
        }
    }
}

/// A named, typed field of a record layout
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
}

/// Stored description of a table's rows
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl RecordLayout {
    pub fn new(name: &str, fields: &[(&str, FieldType)]) -> Self {
        Self {
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|(name, ty)| FieldDef {
                    name: (*name).to_string(),
                    ty: *ty,
                })
                .collect(),
        }
    }
}

impl fmt::Display for RecordLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (index, field) in self.fields.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name, field.ty.as_str())?;
        }
        write!(f, ")")
    }
}

/// A row type that can be stored in a container table
pub trait Record: Sized {
    /// Record name stored with the table
    const NAME: &'static str;

    /// Ordered field list
    const FIELDS: &'static [(&'static str, FieldType)];

    /// Layout stored with, and checked against, a table
    fn layout() -> RecordLayout {
        RecordLayout::new(Self::NAME, Self::FIELDS)
    }

    /// Append one encoded row
    fn encode(&self, buf: &mut BytesMut) -> Result<()>;

    /// Decode one row
    fn decode(reader: &mut RowReader<'_>) -> Result<Self>;
}

/// Bounds-checked cursor over encoded rows
#[derive(Debug)]
pub struct RowReader<'a> {
    data: &'a [u8],
}

impl<'a> RowReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Bytes left unread
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }

    fn require(&self, needed: usize) -> Result<()> {
        if self.data.remaining() < needed {
            return Err(CheckpointError::invalid_format(format!(
                "Truncated row: need {} bytes, {} left",
                needed,
                self.data.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.require(1)?;
        Ok(self.data.get_u8())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CheckpointError::invalid_format(format!(
                "Invalid boolean byte {other}"
            ))),
        }
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.require(4)?;
        Ok(self.data.get_u32_le())
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.require(8)?;
        Ok(self.data.get_f64_le())
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        self.require(len)?;
        let bytes = self.data[..len].to_vec();
        self.data.advance(len);
        String::from_utf8(bytes)
            .map_err(|e| CheckpointError::invalid_format(format!("Invalid UTF-8 in row: {e}")))
    }
}

pub(crate) fn put_bool(buf: &mut BytesMut, value: bool) {
    buf.put_u8(u8::from(value));
}

pub(crate) fn put_string(buf: &mut BytesMut, value: &str) -> Result<()> {
    let len = u32::try_from(value.len()).map_err(|_| {
        CheckpointError::validation(format!("String field of {} bytes is too long", value.len()))
    })?;
    buf.put_u32_le(len);
    buf.put_slice(value.as_bytes());
    Ok(())
}

/// Encode a slice of records into one contiguous row buffer
pub fn encode_rows<R: Record>(rows: &[R]) -> Result<Vec<u8>> {
    let mut buf = BytesMut::new();
    for row in rows {
        row.encode(&mut buf)?;
    }
    Ok(buf.to_vec())
}

/// Decode exactly `row_count` records; trailing bytes are a format error
pub fn decode_rows<R: Record>(data: &[u8], row_count: u64) -> Result<Vec<R>> {
    let mut reader = RowReader::new(data);
    // Every row takes at least one byte.
    let capacity = usize::try_from(row_count).map_or(data.len(), |count| count.min(data.len()));
    let mut rows = Vec::with_capacity(capacity);
    for _ in 0..row_count {
        rows.push(R::decode(&mut reader)?);
    }
    if reader.remaining() != 0 {
        return Err(CheckpointError::invalid_format(format!(
            "{} trailing bytes after {} {} rows",
            reader.remaining(),
            row_count,
            R::NAME
        )));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_display() {
        let layout = ClusterMembershipRecord::layout();
        assert_eq!(
            layout.to_string(),
            "ClusterMembership(cluster_id: u32, person_id: u32)"
        );
    }

    #[test]
    fn test_layouts_are_distinct() {
        assert_ne!(PersonRecord::layout(), ExpatriateRecord::layout());
        assert_eq!(PersonRecord::layout().fields, ExpatriateRecord::layout().fields);
        assert_ne!(AtlasRecord::layout(), TownRecord::layout());
    }

    #[test]
    fn test_row_reader_bounds() {
        let mut reader = RowReader::new(&[1, 0, 0]);
        assert!(reader.read_bool().unwrap());
        assert!(matches!(
            reader.read_u32(),
            Err(CheckpointError::InvalidFormat(_))
        ));

        let mut reader = RowReader::new(&[7]);
        assert!(reader.read_bool().is_err());
    }

    #[test]
    fn test_string_fields() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "Antwerpen").unwrap();
        put_string(&mut buf, "").unwrap();

        let mut reader = RowReader::new(&buf);
        assert_eq!(reader.read_string().unwrap(), "Antwerpen");
        assert_eq!(reader.read_string().unwrap(), "");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_decode_rows_rejects_trailing_bytes() {
        let mut data = encode_rows(&[ClusterMembershipRecord {
            cluster_id: 3,
            person_id: 9,
        }])
        .unwrap();
        data.push(0);

        let result = decode_rows::<ClusterMembershipRecord>(&data, 1);
        assert!(matches!(result, Err(CheckpointError::InvalidFormat(_))));
    }

    #[test]
    fn test_decode_rows_rejects_inflated_row_count() {
        let data = encode_rows(&[ClusterMembershipRecord {
            cluster_id: 3,
            person_id: 9,
        }])
        .unwrap();

        for row_count in [2, 1 << 40, u64::MAX] {
            let result = decode_rows::<ClusterMembershipRecord>(&data, row_count);
            assert!(matches!(result, Err(CheckpointError::InvalidFormat(_))));
        }
    }
}
