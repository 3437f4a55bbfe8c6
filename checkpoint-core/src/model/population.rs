/*!
Ordered population with an id index.
*/

use super::{Atlas, Person};
use crate::{CheckpointError, Result};
use std::collections::HashMap;

/// Persons in insertion order, addressable by id
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Population {
    persons: Vec<Person>,
    index: HashMap<u32, usize>,
    atlas: Atlas,
    has_atlas: bool,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a person; ids must be unique
    pub fn emplace(&mut self, person: Person) -> Result<()> {
        if self.index.contains_key(&person.id()) {
            return Err(CheckpointError::validation(format!(
                "Duplicate person id {}",
                person.id()
            )));
        }
        self.index.insert(person.id(), self.persons.len());
        self.persons.push(person);
        Ok(())
    }

    pub fn get(&self, id: u32) -> Option<&Person> {
        self.index.get(&id).map(|&position| &self.persons[position])
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Person> {
        match self.index.get(&id) {
            Some(&position) => self.persons.get_mut(position),
            None => None,
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
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

    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    pub fn atlas_mut(&mut self) -> &mut Atlas {
        &mut self.atlas
    }

    /// Whether geospatial data was available for this population
    pub fn has_atlas(&self) -> bool {
        self.has_atlas
    }

    pub fn set_has_atlas(&mut self, has_atlas: bool) {
        self.has_atlas = has_atlas;
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Person;
    type IntoIter = std::slice::Iter<'a, Person>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
