/*!
Travel journals: visitors hosted by a region and residents away from it.
*/

use super::Person;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A traveller: their id at home and the id of their stand-in at the destination
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VisitorId {
    pub home_person_id: u32,
    pub visitor_person_id: u32,
}

impl VisitorId {
    pub fn new(home_person_id: u32, visitor_person_id: u32) -> Self {
        Self {
            home_person_id,
            visitor_person_id,
        }
    }
}

/// One journal entry, flattened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitorEntry {
    pub return_day: u32,
    pub region_id: u32,
    pub visitor: VisitorId,
}

/// Visitors keyed by the simulation day they return home, then by home region
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct VisitorJournal {
    by_return_day: BTreeMap<u32, BTreeMap<u32, Vec<VisitorId>>>,
}

impl VisitorJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, return_day: u32, region_id: u32, visitor: VisitorId) {
        self.by_return_day
            .entry(return_day)
            .or_default()
            .entry(region_id)
            .or_default()
            .push(visitor);
    }

    /// Entries ordered by return day, then region, then insertion
    pub fn entries(&self) -> impl Iterator<Item = VisitorEntry> + '_ {
        self.by_return_day.iter().flat_map(|(&return_day, regions)| {
            regions.iter().flat_map(move |(&region_id, visitors)| {
                visitors.iter().map(move |&visitor| VisitorEntry {
                    return_day,
                    region_id,
                    visitor,
                })
            })
        })
    }

    /// Visitors returning on a given day, by region
    pub fn returning_on(&self, day: u32) -> Option<&BTreeMap<u32, Vec<VisitorId>>> {
        self.by_return_day.get(&day)
    }

    pub fn len(&self) -> usize {
        self.by_return_day
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Residents currently abroad, with their full state
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ExpatriateJournal {
    persons: Vec<Person>,
}

impl ExpatriateJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, person: Person) {
        self.persons.push(person);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Person> {
        self.persons.iter()
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visitor_journal_ordering() {
        let mut journal = VisitorJournal::new();
        journal.add(12, 2, VisitorId::new(5, 105));
        journal.add(10, 3, VisitorId::new(6, 106));
        journal.add(10, 1, VisitorId::new(7, 107));

        let days: Vec<(u32, u32)> = journal
            .entries()
            .map(|entry| (entry.return_day, entry.region_id))
            .collect();
        assert_eq!(days, vec![(10, 1), (10, 3), (12, 2)]);
        assert_eq!(journal.len(), 3);
        assert_eq!(journal.returning_on(10).map(BTreeMap::len), Some(2));
        assert!(journal.returning_on(11).is_none());
    }
}
