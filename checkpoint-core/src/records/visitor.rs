use super::{FieldType, Record, RowReader};
use crate::Result;
use bytes::{BufMut, BytesMut};

/// A person visiting from another region, relative to the snapshot day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitorRecord {
    /// Days until the visitor returns home
    pub days_left: u32,
    pub region_id: u32,
    pub home_person_id: u32,
    pub visitor_person_id: u32,
}

impl Record for VisitorRecord {
    const NAME: &'static str = "Visitor";
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("days_left", FieldType::U32),
        ("region_id", FieldType::U32),
        ("home_person_id", FieldType::U32),
        ("visitor_person_id", FieldType::U32),
    ];

    fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.days_left);
        buf.put_u32_le(self.region_id);
        buf.put_u32_le(self.home_person_id);
        buf.put_u32_le(self.visitor_person_id);
        Ok(())
    }

    fn decode(reader: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            days_left: reader.read_u32()?,
            region_id: reader.read_u32()?,
            home_person_id: reader.read_u32()?,
            visitor_person_id: reader.read_u32()?,
        })
    }
}
