use super::{put_string, FieldType, Record, RowReader};
use crate::Result;
use bytes::{BufMut, BytesMut};

/// Location of one cluster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasRecord {
    pub cluster_id: u32,
    pub cluster_kind: u32,
    pub latitude: f64,
    pub longitude: f64,
}

impl Record for AtlasRecord {
    const NAME: &'static str = "Atlas";
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("cluster_id", FieldType::U32),
        ("cluster_kind", FieldType::U32),
        ("latitude", FieldType::F64),
        ("longitude", FieldType::F64),
    ];

    fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.cluster_id);
        buf.put_u32_le(self.cluster_kind);
        buf.put_f64_le(self.latitude);
        buf.put_f64_le(self.longitude);
        Ok(())
    }

    fn decode(reader: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            cluster_id: reader.read_u32()?,
            cluster_kind: reader.read_u32()?,
            latitude: reader.read_f64()?,
            longitude: reader.read_f64()?,
        })
    }
}

/// Gazetteer entry
#[derive(Debug, Clone, PartialEq)]
pub struct TownRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub size: u32,
    pub id: u32,
    pub name: String,
}

impl Record for TownRecord {
    const NAME: &'static str = "Town";
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        ("latitude", FieldType::F64),
        ("longitude", FieldType::F64),
        ("size", FieldType::U32),
        ("id", FieldType::U32),
        ("name", FieldType::Str),
    ];

    fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_f64_le(self.latitude);
        buf.put_f64_le(self.longitude);
        buf.put_u32_le(self.size);
        buf.put_u32_le(self.id);
        put_string(buf, &self.name)
    }

    fn decode(reader: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            latitude: reader.read_f64()?,
            longitude: reader.read_f64()?,
            size: reader.read_u32()?,
            id: reader.read_u32()?,
            name: reader.read_string()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{decode_rows, encode_rows};

    #[test]
    fn test_town_rows_with_names() {
        let towns = vec![
            TownRecord {
                latitude: 51.2194,
                longitude: 4.4025,
                size: 523_248,
                id: 1,
                name: "Antwerpen".to_string(),
            },
            TownRecord {
                latitude: 50.8503,
                longitude: 4.3517,
                size: 1_208_542,
                id: 2,
                name: "Brussel".to_string(),
            },
        ];

        let data = encode_rows(&towns).unwrap();
        assert_eq!(decode_rows::<TownRecord>(&data, 2).unwrap(), towns);
    }
}
