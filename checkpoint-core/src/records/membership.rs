use super::{FieldType, Record, RowReader};
use crate::relation::RelationRow;
use crate::Result;
use bytes::{BufMut, BytesMut};

/// One row of a cluster relation table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterMembershipRecord {
    pub cluster_id: u32,
    pub person_id: u32,
}

impl Record for ClusterMembershipRecord {
    const NAME: &'static str = "ClusterMembership";
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("cluster_id", FieldType::U32),
        ("person_id", FieldType::U32),
    ];

    fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.cluster_id);
        buf.put_u32_le(self.person_id);
        Ok(())
    }

    fn decode(reader: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            cluster_id: reader.read_u32()?,
            person_id: reader.read_u32()?,
        })
    }
}

impl RelationRow for ClusterMembershipRecord {
    fn new(key: u32, member: u32) -> Self {
        Self {
            cluster_id: key,
            person_id: member,
        }
    }

    fn key(&self) -> u32 {
        self.cluster_id
    }

    fn member(&self) -> u32 {
        self.person_id
    }
}
