//! Saving to and loading from a [`RecordStore`].

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{Table, Universe};
use crate::{
    domain::{
        actor::{
            ActorRole, Address, Application, Organization, Person, PersonAndOrganization,
        },
        change::{Change, Effect},
        config::Config,
        entity::Entity,
        handle::{RecordKey, RecordType},
        owner_history::OwnerHistory,
        placement::ObjectPlacement,
        representation::{
            GridAxis, ProductRepresentation, Representation, RepresentationContext,
            RepresentationItem,
        },
        unit::{Unit, UnitAssignment},
    },
    storage::{IndexField, LoadError, MemoryStore, Record, RecordStore},
};

/// One record of a JSON snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    id: u64,
    record: Record,
}

impl Universe {
    /// Writes every record to `store`.
    ///
    /// Records already in the store under other keys are left alone. Use
    /// [`Universe::persist`] to keep a store in step with individual
    /// mutations.
    ///
    /// # Errors
    ///
    /// Returns the first error from the store.
    #[instrument(skip_all)]
    pub fn save<S: RecordStore>(&self, store: &mut S) -> Result<(), S::Error> {
        for record_type in RecordType::ALL {
            with_record_type!(record_type, R => {
                for (id, record) in self.records::<R>() {
                    store.put(id.into(), Record::from(record.clone()))?;
                }
            });
        }
        debug!(records = self.len(), "saved");
        Ok(())
    }

    /// Applies the effects of one mutation to `store`: deleted records are
    /// removed, inserted and updated ones are written.
    ///
    /// # Errors
    ///
    /// Returns the first error from the store.
    #[instrument(skip_all)]
    pub fn persist<S: RecordStore>(&self, change: &Change, store: &mut S) -> Result<(), S::Error> {
        for effect in change.effects() {
            match *effect {
                Effect::Deleted(key) => store.delete(key)?,
                Effect::Inserted(key) | Effect::Updated(key) => {
                    if let Some(record) = self.record(key) {
                        store.put(key, record)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Rebuilds a universe from `store`.
    ///
    /// Every record is checked as if it were being saved unchanged, so the
    /// same errors are returned for a corrupt store as for a bad mutation.
    ///
    /// # Errors
    ///
    /// - [`LoadError::Store`] if the store fails.
    /// - [`LoadError::Missing`] or [`LoadError::Mismatch`] if the store is
    ///   not self-consistent.
    /// - [`LoadError::Invalid`] if the records break a rule of the universe.
    #[instrument(skip_all)]
    pub fn load<S: RecordStore>(store: &S, config: Config) -> Result<Self, LoadError<S::Error>> {
        let mut universe = Self::new(config);
        for &record_type in RecordType::ALL {
            let ids = store
                .scan_index(record_type, IndexField::Id)
                .map_err(LoadError::Store)?;
            for (_, id) in ids {
                let key = RecordKey::new(record_type, id);
                let record = store
                    .get(key)
                    .map_err(LoadError::Store)?
                    .ok_or(LoadError::Missing(key))?;
                if record.record_type() != record_type {
                    return Err(LoadError::Mismatch {
                        key,
                        found: record.record_type(),
                    });
                }
                record.restore(id, &mut universe);
            }
        }
        universe
            .verify()
            .inspect_err(|err| debug!(%err, "load rejected"))?;
        debug!(records = universe.len(), "loaded");
        Ok(universe)
    }

    /// Serializes every record as a JSON array of `{ "id", "record" }`
    /// objects.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be encoded, for example a
    /// coordinate that is not a finite number.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut store = MemoryStore::new();
        let Ok(()) = self.save(&mut store);
        let entries: Vec<Entry> = store
            .records()
            .map(|(key, record)| Entry {
                id: key.id,
                record: record.clone(),
            })
            .collect();
        serde_json::to_string_pretty(&entries)
    }

    /// Rebuilds a universe from the output of [`Universe::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Json`] if the input is not a snapshot, or any
    /// error from [`Universe::load`].
    pub fn from_json(json: &str, config: Config) -> Result<Self, LoadError> {
        let entries: Vec<Entry> = serde_json::from_str(json).map_err(LoadError::Json)?;
        let mut store = MemoryStore::new();
        for Entry { id, record } in entries {
            let Ok(()) = store.put(RecordKey::new(record.record_type(), id), record);
        }
        Self::load(&store, config)
    }

    /// A copy of any record, by key.
    #[must_use]
    pub fn record(&self, key: RecordKey) -> Option<Record> {
        with_record_type!(key.record_type, R => {
            R::table(self).get(&R::wrap(key.id)).cloned().map(Record::from)
        })
    }
}
