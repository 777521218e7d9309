//! People directory: seed dataset, local extension and search.
//!
//! # Responsibility
//! - Load the bundled profile dataset, or its locally extended copy.
//! - Append new people and persist the full list to local storage.
//! - Filter people by case-insensitive substring search.
//!
//! # Invariants
//! - Search never reorders people; results keep dataset order.
//! - A blank query matches everyone.

use crate::model::person::{NewPerson, Person, PersonValidationError};
use crate::storage::local::{LocalStorage, StorageError};
use crate::storage::PEOPLE_KEY;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const SEED_DATASET: &str = include_str!("seed.json");

/// Errors from people directory writes.
#[derive(Debug)]
pub enum PeopleError {
    Validation(PersonValidationError),
    Storage(StorageError),
}

impl Display for PeopleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PeopleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<PersonValidationError> for PeopleError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for PeopleError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Outcome of the dataset self-check shown in the wall footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetCheck {
    Ok,
    Empty,
}

/// Where the loaded people list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSource {
    Seed,
    LocalStorage,
}

/// In-memory people list for one session.
pub struct PeopleDirectory<'conn> {
    storage: LocalStorage<'conn>,
    people: Vec<Person>,
    source: DatasetSource,
}

impl<'conn> PeopleDirectory<'conn> {
    /// Loads the locally extended list, falling back to the bundled seed.
    pub fn load(storage: LocalStorage<'conn>) -> Self {
        match storage.get_json::<Vec<Person>>(PEOPLE_KEY) {
            Ok(Some(people)) if !people.is_empty() => {
                return Self {
                    storage,
                    people,
                    source: DatasetSource::LocalStorage,
                }
            }
            Ok(_) => {}
            Err(err) => warn!(
                "event=people_load module=people status=degraded source=local_storage error={}",
                err
            ),
        }

        Self {
            storage,
            people: seed_people(),
            source: DatasetSource::Seed,
        }
    }

    /// Builds a directory over an explicit list without touching storage.
    pub fn with_people(storage: LocalStorage<'conn>, people: Vec<Person>) -> Self {
        Self {
            storage,
            people,
            source: DatasetSource::Seed,
        }
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn source(&self) -> DatasetSource {
        self.source
    }

    pub fn get(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }

    /// People whose searchable text contains `query`, case-insensitively.
    pub fn search(&self, query: &str) -> Vec<&Person> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.people.iter().collect();
        }
        self.people
            .iter()
            .filter(|person| person.search_haystack().contains(&needle))
            .collect()
    }

    /// Appends a person and writes the whole list to local storage.
    pub fn add_person(&mut self, input: NewPerson) -> Result<&Person, PeopleError> {
        let person = input.into_person()?;
        self.people.push(person);
        if let Err(err) = self.storage.set_json(PEOPLE_KEY, &self.people) {
            self.people.pop();
            return Err(err.into());
        }
        self.source = DatasetSource::LocalStorage;

        let added = &self.people[self.people.len() - 1];
        info!(
            "event=person_add module=people status=ok person_id={} total={}",
            added.id,
            self.people.len()
        );
        Ok(added)
    }

    /// Non-empty list whose first record has an id.
    pub fn dataset_check(&self) -> DatasetCheck {
        match self.people.first() {
            Some(first) if !first.id.trim().is_empty() => DatasetCheck::Ok,
            _ => DatasetCheck::Empty,
        }
    }
}

/// Parses the bundled dataset. A broken seed yields an empty list.
pub fn seed_people() -> Vec<Person> {
    match serde_json::from_str(SEED_DATASET) {
        Ok(people) => people,
        Err(err) => {
            warn!(
                "event=people_load module=people status=error source=seed error={}",
                err
            );
            Vec::new()
        }
    }
}
