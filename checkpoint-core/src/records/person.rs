/*!
Person and expatriate rows.
*/

use super::{put_bool, FieldType, Record, RowReader};
use crate::model::{ClusterKind, ClusterMemberships, Fate, Gender, Person};
use crate::{CheckpointError, Result};
use bytes::{BufMut, BytesMut};

const PERSON_FIELDS: &[(&str, FieldType)] = &[
    ("id", FieldType::U32),
    ("age", FieldType::F64),
    ("gender", FieldType::U8),
    ("participating", FieldType::Bool),
    ("immune", FieldType::Bool),
    ("infected", FieldType::Bool),
    ("start_infectiousness", FieldType::U32),
    ("end_infectiousness", FieldType::U32),
    ("start_symptomatic", FieldType::U32),
    ("end_symptomatic", FieldType::U32),
    ("days_infected", FieldType::U32),
    ("household", FieldType::U32),
    ("school", FieldType::U32),
    ("work", FieldType::U32),
    ("primary_community", FieldType::U32),
    ("secondary_community", FieldType::U32),
];

/// Full state of one person as stored in a `Population` table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonRecord {
    pub id: u32,
    pub age: f64,
    pub gender: u8,
    pub participating: bool,
    pub immune: bool,
    pub infected: bool,
    pub start_infectiousness: u32,
    pub end_infectiousness: u32,
    pub start_symptomatic: u32,
    pub end_symptomatic: u32,
    pub days_infected: u32,
    pub household: u32,
    pub school: u32,
    pub work: u32,
    pub primary_community: u32,
    pub secondary_community: u32,
}

impl PersonRecord {
    pub fn from_person(person: &Person) -> Self {
        let health = person.health();
        Self {
            id: person.id(),
            age: person.age(),
            gender: person.gender().as_byte(),
            participating: person.is_participating_in_survey(),
            immune: health.is_immune(),
            infected: health.is_infected(),
            start_infectiousness: health.start_infectiousness(),
            end_infectiousness: health.end_infectiousness(),
            start_symptomatic: health.start_symptomatic(),
            end_symptomatic: health.end_symptomatic(),
            days_infected: health.days_infected(),
            household: person.cluster_id(ClusterKind::Household),
            school: person.cluster_id(ClusterKind::School),
            work: person.cluster_id(ClusterKind::Work),
            primary_community: person.cluster_id(ClusterKind::PrimaryCommunity),
            secondary_community: person.cluster_id(ClusterKind::SecondaryCommunity),
        }
    }

    /// Rebuild the person from its fate.
    ///
    /// Health is never restored field by field: a fresh person is built from
    /// the stored fate, and an infection (current or past) is started again
    /// and stepped `days_infected` times, so the result matches a person that
    /// reached this state by simulation. Cost is O(days_infected).
    pub fn into_person(self) -> Person {
        let fate = Fate::new(
            self.start_infectiousness,
            self.end_infectiousness,
            self.start_symptomatic,
            self.end_symptomatic,
        );
        let memberships = ClusterMemberships::new(
            self.household,
            self.school,
            self.work,
            self.primary_community,
            self.secondary_community,
        );
        let mut person = Person::new(
            self.id,
            self.age,
            Gender::from_byte(self.gender),
            memberships,
            fate,
        );

        if self.participating {
            person.participate_in_survey();
        }
        if self.immune {
            person.health_mut().set_immune();
        }
        if self.infected || self.days_infected > 0 {
            let health = person.health_mut();
            health.start_infection();
            for _ in 0..self.days_infected {
                health.update();
            }
        }
        person
    }
}

impl Record for PersonRecord {
    const NAME: &'static str = "Person";
    const FIELDS: &'static [(&'static str, FieldType)] = PERSON_FIELDS;

    fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        if self.id == 0 {
            return Err(CheckpointError::validation(
                "Person id 0 is reserved for relation sentinels",
            ));
        }
        buf.put_u32_le(self.id);
        buf.put_f64_le(self.age);
        buf.put_u8(self.gender);
        put_bool(buf, self.participating);
        put_bool(buf, self.immune);
        put_bool(buf, self.infected);
        buf.put_u32_le(self.start_infectiousness);
        buf.put_u32_le(self.end_infectiousness);
        buf.put_u32_le(self.start_symptomatic);
        buf.put_u32_le(self.end_symptomatic);
        buf.put_u32_le(self.days_infected);
        buf.put_u32_le(self.household);
        buf.put_u32_le(self.school);
        buf.put_u32_le(self.work);
        buf.put_u32_le(self.primary_community);
        buf.put_u32_le(self.secondary_community);
        Ok(())
    }

    fn decode(reader: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            id: reader.read_u32()?,
            age: reader.read_f64()?,
            gender: reader.read_u8()?,
            participating: reader.read_bool()?,
            immune: reader.read_bool()?,
            infected: reader.read_bool()?,
            start_infectiousness: reader.read_u32()?,
            end_infectiousness: reader.read_u32()?,
            start_symptomatic: reader.read_u32()?,
            end_symptomatic: reader.read_u32()?,
            days_infected: reader.read_u32()?,
            household: reader.read_u32()?,
            school: reader.read_u32()?,
            work: reader.read_u32()?,
            primary_community: reader.read_u32()?,
            secondary_community: reader.read_u32()?,
        })
    }
}

/// A resident currently abroad; same shape as a person row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpatriateRecord(pub PersonRecord);

impl Record for ExpatriateRecord {
    const NAME: &'static str = "Expatriate";
    const FIELDS: &'static [(&'static str, FieldType)] = PERSON_FIELDS;

    fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        self.0.encode(buf)
    }

    fn decode(reader: &mut RowReader<'_>) -> Result<Self> {
        PersonRecord::decode(reader).map(Self)
    }
}
