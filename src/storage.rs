//! Persistence of a [`Universe`](crate::Universe).
//!
//! The universe does not own a storage engine. Hosts implement
//! [`RecordStore`] over their own key-value or relational store, and the
//! universe writes to it with [`Universe::save`](crate::Universe::save) and
//! rebuilds from it with [`Universe::load`](crate::Universe::load). Loading
//! re-runs every uniqueness and reference check, so a corrupt store is
//! rejected with the same errors as a bad live mutation.

mod memory;
mod record;

pub use memory::MemoryStore;
pub use record::Record;

use crate::domain::{Error, RecordKey, RecordType};

/// A field a store can be scanned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexField {
    /// The numeric id. Every record has one.
    Id,
    /// `GlobalId` of Root-derived entities.
    GlobalId,
    /// `Identification` of people, organizations and applications.
    Identifier,
    /// `placement_id` of object placements.
    PlacementId,
    /// The `(person, organization)` pair of a person and organization,
    /// rendered as `"{person}:{organization}"`.
    PersonOrganization,
}

/// A record store.
///
/// Records are addressed by [`RecordKey`]. The store is not expected to
/// enforce any of the universe's rules.
pub trait RecordStore {
    /// The error returned by the store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, key: RecordKey) -> Result<Option<Record>, Self::Error>;

    /// Writes a record, replacing any record under the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn put(&mut self, key: RecordKey, record: Record) -> Result<(), Self::Error>;

    /// Removes a record. Removing a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn delete(&mut self, key: RecordKey) -> Result<(), Self::Error>;

    /// Lists `(value, id)` for every record of `record_type` that has a value
    /// for `field`, in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn scan_index(
        &self,
        record_type: RecordType,
        field: IndexField,
    ) -> Result<Vec<(String, u64)>, Self::Error>;
}

/// Errors rebuilding a universe from a store or a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum LoadError<E: std::error::Error + 'static = std::convert::Infallible> {
    /// The store failed.
    #[error("failed to read record store: {0}")]
    Store(#[source] E),

    /// The store listed a key it then could not find.
    #[error("{0} is listed but missing from the store")]
    Missing(RecordKey),

    /// A record is stored under the key of a different type.
    #[error("{key} holds a record of type {found}")]
    Mismatch {
        /// Where the record was found.
        key: RecordKey,
        /// The type of the record found.
        found: RecordType,
    },

    /// The records break a rule of the universe.
    #[error("stored records are inconsistent: {0}")]
    Invalid(#[from] Error),

    /// The snapshot is not valid JSON.
    #[error("failed to parse snapshot: {0}")]
    Json(#[source] serde_json::Error),
}
