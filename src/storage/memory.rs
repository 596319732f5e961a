use std::{collections::BTreeMap, convert::Infallible};

use crate::{
    domain::{RecordKey, RecordType},
    storage::{IndexField, Record, RecordStore},
};

/// A [`RecordStore`] held in memory.
///
/// Useful for tests, and as the staging area for JSON snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    records: BTreeMap<RecordKey, Record>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record, in key order.
    pub fn records(&self) -> impl Iterator<Item = (RecordKey, &Record)> {
        self.records.iter().map(|(key, record)| (*key, record))
    }
}

impl RecordStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: RecordKey) -> Result<Option<Record>, Infallible> {
        Ok(self.records.get(&key).cloned())
    }

    fn put(&mut self, key: RecordKey, record: Record) -> Result<(), Infallible> {
        self.records.insert(key, record);
        Ok(())
    }

    fn delete(&mut self, key: RecordKey) -> Result<(), Infallible> {
        self.records.remove(&key);
        Ok(())
    }

    fn scan_index(
        &self,
        record_type: RecordType,
        field: IndexField,
    ) -> Result<Vec<(String, u64)>, Infallible> {
        let start = RecordKey::new(record_type, 0);
        let end = RecordKey::new(record_type, u64::MAX);
        Ok(self
            .records
            .range(start..=end)
            .filter_map(|(key, record)| {
                let value = match field {
                    IndexField::Id => Some(key.id.to_string()),
                    _ => index_value(record, field),
                };
                value.map(|value| (value, key.id))
            })
            .collect())
    }
}

fn index_value(record: &Record, field: IndexField) -> Option<String> {
    match (field, record) {
        (IndexField::GlobalId, Record::Entity(entity)) => Some(entity.global_id().to_string()),
        (IndexField::Identifier, Record::Person(person)) => {
            person.identifier.as_ref().map(ToString::to_string)
        }
        (IndexField::Identifier, Record::Organization(organization)) => {
            organization.identifier.as_ref().map(ToString::to_string)
        }
        (IndexField::Identifier, Record::Application(application)) => {
            application.identifier.as_ref().map(ToString::to_string)
        }
        (IndexField::PlacementId, Record::Placement(placement)) => {
            Some(placement.placement_id.to_string())
        }
        (IndexField::PersonOrganization, Record::PersonAndOrganization(pair)) => Some(format!(
            "{}:{}",
            pair.person.get(),
            pair.organization.get()
        )),
        _ => None,
    }
}
