//! Reports describing what a successful mutation did.
//!
//! A host that wraps the universe in its own transaction can use the report to
//! decide which persisted rows and secondary indices need rewriting, or to
//! undo the mutation if the surrounding transaction aborts.

use std::{collections::BTreeSet, fmt};

use crate::domain::handle::{EntityId, RecordKey, RecordType};

/// A uniqueness index maintained by the universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKind {
    /// `IfcRoot.GlobalId` across every Root-derived entity.
    GlobalId,
    /// `(person, organization)` pairs of `IfcPersonAndOrganization`.
    PersonOrganizationPair,
    /// `IfcPerson.Identification`.
    PersonIdentifier,
    /// `IfcOrganization.Identification`.
    OrganizationIdentifier,
    /// `IfcApplication.ApplicationIdentifier`.
    ApplicationIdentifier,
    /// `placement_id` of every object placement.
    PlacementId,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::GlobalId => "global id",
            Self::PersonOrganizationPair => "person and organization pair",
            Self::PersonIdentifier => "person identifier",
            Self::OrganizationIdentifier => "organization identifier",
            Self::ApplicationIdentifier => "application identifier",
            Self::PlacementId => "placement id",
        })
    }
}

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// The record was created.
    Inserted(RecordKey),
    /// One or more fields of the record changed, including references cleared
    /// by a cascade.
    Updated(RecordKey),
    /// The record was removed.
    Deleted(RecordKey),
}

impl Effect {
    /// The record affected.
    #[must_use]
    pub const fn key(self) -> RecordKey {
        match self {
            Self::Inserted(key) | Self::Updated(key) | Self::Deleted(key) => key,
        }
    }
}

/// The outcome of a successful mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct Change {
    effects: Vec<Effect>,
    indices: BTreeSet<IndexKind>,
}

impl Change {
    pub(crate) fn inserted(&mut self, key: impl Into<RecordKey>) {
        self.effects.push(Effect::Inserted(key.into()));
    }

    pub(crate) fn updated(&mut self, key: impl Into<RecordKey>) {
        let key = key.into();
        // a record cleared twice by one cascade is reported once
        if !self.effects.contains(&Effect::Updated(key)) {
            self.effects.push(Effect::Updated(key));
        }
    }

    pub(crate) fn deleted(&mut self, key: impl Into<RecordKey>) {
        self.effects.push(Effect::Deleted(key.into()));
    }

    pub(crate) fn touched(&mut self, index: IndexKind) {
        self.indices.insert(index);
    }

    /// Every record effect, in the order it was applied.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// The uniqueness indices that were written.
    pub fn touched_indices(&self) -> impl Iterator<Item = IndexKind> + '_ {
        self.indices.iter().copied()
    }

    /// Whether the given index was written.
    #[must_use]
    pub fn touches(&self, index: IndexKind) -> bool {
        self.indices.contains(&index)
    }

    /// Keys of every record deleted, including by cascade.
    pub fn deleted_keys(&self) -> impl Iterator<Item = RecordKey> + '_ {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Deleted(key) => Some(*key),
            _ => None,
        })
    }

    /// Root-derived entities whose fields changed, for example a product whose
    /// placement was cleared. Hosts use this to drive owner-history updates.
    pub fn modified_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Updated(key) if key.record_type == RecordType::Entity => {
                Some(EntityId::from_raw(key.id))
            }
            _ => None,
        })
    }

    /// Whether nothing was changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
