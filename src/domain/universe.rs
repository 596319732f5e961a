//! The entity universe.
//!
//! A [`Universe`] owns every record, addressed by stable numeric handles, and
//! maintains the uniqueness indices and reference rules between them. Records
//! are stored in one ordered arena per record type:
//!
//! - Records: `BTreeMap<Id, Record>` per type
//! - Uniqueness indices: `HashMap<Key, Id>` for GUIDs, identifiers, placement
//!   ids and person/organization pairs
//! - Placement tree: `DiGraphMap<PlacementId, ()>` (edges are child→parent)
//!
//! Every mutation checks everything it needs to before the first write, so a
//! rejected mutation leaves the universe exactly as it was.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    hash::Hash,
};

use petgraph::{Direction, graphmap::DiGraphMap};
use tracing::{debug, instrument, warn};

use crate::domain::{
    actor::{
        ActorRef, ActorRole, ActorSelect, Address, Application, Organization, Person,
        PersonAndOrganization,
    },
    change::{Change, IndexKind},
    config::Config,
    entity::{Entity, RootDraft, Specialization, specialize},
    error::{Error, IntegrityError, ValidationError},
    handle::{
        AddressId, ApplicationId, ContextId, EntityId, GridAxisId, ItemId, OrganizationId,
        OwnerHistoryId, PersonAndOrganizationId, PersonId, PlacementId, ProductRepresentationId,
        RecordKey, RecordType, RepresentationId, RoleId, UnitAssignmentId, UnitId,
    },
    measure::{Guid, Identifier},
    owner_history::{Modification, OwnerHistory},
    placement::{LocalPlacement, ObjectPlacement, PlacementKind},
    representation::{
        GridAxis, ProductRepresentation, Representation, RepresentationContext,
        RepresentationItem,
    },
    unit::{Unit, UnitAssignment},
};

/// Runs `$body` with `$record` bound to the record type named by
/// `$record_type`.
macro_rules! with_record_type {
    ($record_type:expr, $record:ident => $body:expr) => {
        match $record_type {
            RecordType::Entity => {
                type $record = Entity;
                $body
            }
            RecordType::Person => {
                type $record = Person;
                $body
            }
            RecordType::Organization => {
                type $record = Organization;
                $body
            }
            RecordType::PersonAndOrganization => {
                type $record = PersonAndOrganization;
                $body
            }
            RecordType::ActorRole => {
                type $record = ActorRole;
                $body
            }
            RecordType::Address => {
                type $record = Address;
                $body
            }
            RecordType::Application => {
                type $record = Application;
                $body
            }
            RecordType::OwnerHistory => {
                type $record = OwnerHistory;
                $body
            }
            RecordType::Placement => {
                type $record = ObjectPlacement;
                $body
            }
            RecordType::ProductRepresentation => {
                type $record = ProductRepresentation;
                $body
            }
            RecordType::Representation => {
                type $record = Representation;
                $body
            }
            RecordType::RepresentationContext => {
                type $record = RepresentationContext;
                $body
            }
            RecordType::RepresentationItem => {
                type $record = RepresentationItem;
                $body
            }
            RecordType::GridAxis => {
                type $record = GridAxis;
                $body
            }
            RecordType::Unit => {
                type $record = Unit;
                $body
            }
            RecordType::UnitAssignment => {
                type $record = UnitAssignment;
                $body
            }
        }
    };
}

mod cascade;
mod render;
mod snapshot;
mod stored;

use stored::Table;

/// A record type that can be held by a [`Universe`].
///
/// Implemented for every record type in this crate. The trait is sealed.
pub trait Stored: Table {}

impl<T: Table> Stored for T {}

/// The set of every record and the integrity rules between them.
///
/// Mutations take `&mut self` and reads take `&self`, so a host that shares a
/// universe between threads wraps it in its own lock (e.g.
/// `RwLock<Universe>`).
#[derive(Debug, Clone, Default)]
pub struct Universe {
    config: Config,

    /// The last id handed out. Ids are unique across all record types.
    last_id: u64,

    /// Incremented by every successful mutation.
    revision: u64,

    entities: BTreeMap<EntityId, Entity>,
    people: BTreeMap<PersonId, Person>,
    organizations: BTreeMap<OrganizationId, Organization>,
    pairs: BTreeMap<PersonAndOrganizationId, PersonAndOrganization>,
    roles: BTreeMap<RoleId, ActorRole>,
    addresses: BTreeMap<AddressId, Address>,
    applications: BTreeMap<ApplicationId, Application>,
    histories: BTreeMap<OwnerHistoryId, OwnerHistory>,
    placements: BTreeMap<PlacementId, ObjectPlacement>,
    product_representations: BTreeMap<ProductRepresentationId, ProductRepresentation>,
    representations: BTreeMap<RepresentationId, Representation>,
    contexts: BTreeMap<ContextId, RepresentationContext>,
    items: BTreeMap<ItemId, RepresentationItem>,
    grid_axes: BTreeMap<GridAxisId, GridAxis>,
    units: BTreeMap<UnitId, Unit>,
    unit_assignments: BTreeMap<UnitAssignmentId, UnitAssignment>,

    global_ids: HashMap<Guid, EntityId>,
    pair_index: HashMap<(PersonId, OrganizationId), PersonAndOrganizationId>,
    person_identifiers: HashMap<Identifier, PersonId>,
    organization_identifiers: HashMap<Identifier, OrganizationId>,
    application_identifiers: HashMap<Identifier, ApplicationId>,
    placement_ids: HashMap<Identifier, PlacementId>,

    /// The local placement tree. Nodes are placements, edges point from child
    /// to parent. Grid placements appear as isolated nodes.
    placement_graph: DiGraphMap<PlacementId, ()>,
}

impl Universe {
    /// An empty universe.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// A counter incremented by every successful mutation.
    ///
    /// Hosts can compare revisions to detect that a view they hold is stale.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// The total number of records of every type.
    #[must_use]
    pub fn len(&self) -> usize {
        RecordType::ALL
            .iter()
            .map(|record_type| with_record_type!(record_type, R => R::table(self).len()))
            .sum()
    }

    /// Whether the universe holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a record exists.
    #[must_use]
    pub fn contains(&self, key: RecordKey) -> bool {
        with_record_type!(key.record_type, R => R::table(self).contains_key(&R::wrap(key.id)))
    }

    /// Retrieves a record by handle.
    #[must_use]
    pub fn get<R: Stored>(&self, id: R::Id) -> Option<&R> {
        R::table(self).get(&id)
    }

    /// Iterates over every record of one type, in handle order.
    pub fn records<R: Stored>(&self) -> impl Iterator<Item = (R::Id, &R)> + '_ {
        R::table(self).iter().map(|(id, record)| (*id, record))
    }

    /// Finds the entity with the given GUID.
    #[must_use]
    pub fn entity_by_global_id(&self, global_id: &Guid) -> Option<EntityId> {
        self.global_ids.get(global_id).copied()
    }

    /// Finds the pairing of a person with an organization.
    #[must_use]
    pub fn person_and_organization(
        &self,
        person: PersonId,
        organization: OrganizationId,
    ) -> Option<PersonAndOrganizationId> {
        self.pair_index.get(&(person, organization)).copied()
    }

    /// Finds a person by identifier.
    #[must_use]
    pub fn person_by_identifier(&self, identifier: &str) -> Option<PersonId> {
        self.person_identifiers.get(identifier).copied()
    }

    /// Finds an organization by identifier.
    #[must_use]
    pub fn organization_by_identifier(&self, identifier: &str) -> Option<OrganizationId> {
        self.organization_identifiers.get(identifier).copied()
    }

    /// Finds an application by identifier.
    #[must_use]
    pub fn application_by_identifier(&self, identifier: &str) -> Option<ApplicationId> {
        self.application_identifiers.get(identifier).copied()
    }

    /// Finds a placement by its `placement_id`.
    #[must_use]
    pub fn placement_by_id(&self, placement_id: &str) -> Option<PlacementId> {
        self.placement_ids.get(placement_id).copied()
    }

    /// The chain of placements above `placement`, nearest first.
    ///
    /// The walk stops after [`Config::max_placement_depth`] steps.
    #[must_use]
    pub fn placement_ancestors(&self, placement: PlacementId) -> Vec<PlacementId> {
        let mut ancestors = Vec::new();
        let mut cursor = self
            .placements
            .get(&placement)
            .and_then(ObjectPlacement::relative_placement);
        while let Some(current) = cursor {
            if ancestors.len() >= self.config.max_placement_depth() {
                break;
            }
            ancestors.push(current);
            cursor = self
                .placements
                .get(&current)
                .and_then(ObjectPlacement::relative_placement);
        }
        ancestors
    }

    /// The placements directly relative to `placement`.
    #[must_use]
    pub fn placement_children(&self, placement: PlacementId) -> Vec<PlacementId> {
        if !self.placement_graph.contains_node(placement) {
            return Vec::new();
        }
        let mut children: Vec<_> = self
            .placement_graph
            .neighbors_directed(placement, Direction::Incoming)
            .collect();
        children.sort_unstable();
        children
    }

    /// Dereferences an actor select.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::DanglingReference`] if the selected actor does
    /// not exist, for example because it was deleted after the select was
    /// assigned.
    pub fn resolve_actor(&self, select: ActorSelect) -> Result<ActorRef<'_>, IntegrityError> {
        Ok(match select {
            ActorSelect::Person(id) => ActorRef::Person(self.require::<Person>(id)?),
            ActorSelect::Organization(id) => {
                ActorRef::Organization(self.require::<Organization>(id)?)
            }
            ActorSelect::PersonAndOrganization(id) => {
                ActorRef::PersonAndOrganization(self.require::<PersonAndOrganization>(id)?)
            }
        })
    }

    /// Inserts a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record collides with a uniqueness index,
    /// references a record that does not exist or of the wrong kind, or breaks
    /// a rule of its own type. The universe is unchanged on error.
    #[instrument(skip_all)]
    pub fn insert<R: Stored>(&mut self, record: R) -> Result<(R::Id, Change), Error> {
        record
            .check(self, None)
            .inspect_err(|err| debug!(%err, "insert rejected"))?;

        self.last_id += 1;
        let id = R::wrap(self.last_id);
        let mut change = Change::default();
        record.index(id, self, &mut change);
        R::table_mut(self).insert(id, record);
        change.inserted(id);
        self.revision += 1;

        let key: RecordKey = id.into();
        debug!(%key, "inserted");
        Ok((id, change))
    }

    /// Builds a concrete entity with [`specialize`] and inserts it.
    ///
    /// # Errors
    ///
    /// Returns any error from [`specialize`] or [`Universe::insert`].
    pub fn create_entity(
        &mut self,
        base: RootDraft,
        extra: Specialization,
    ) -> Result<(EntityId, Change), Error> {
        let entity = specialize(base, extra)?;
        self.insert(entity)
    }

    /// Edits a record in place.
    ///
    /// `edit` works on a copy. The copy is checked with the same rules as an
    /// insert and only then replaces the stored record, so a rejected edit
    /// changes nothing. The GUID and concrete type of an entity cannot be
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::DanglingReference`] if the record does not
    /// exist, or any error an insert of the edited record would return.
    #[instrument(skip_all)]
    pub fn update<R: Stored>(
        &mut self,
        id: R::Id,
        edit: impl FnOnce(&mut R),
    ) -> Result<Change, Error> {
        let current = self.require::<R>(id)?;
        let mut next = current.clone();
        edit(&mut next);
        next.check(self, Some((id, current)))
            .inspect_err(|err| debug!(%err, "update rejected"))?;

        let mut change = Change::default();
        if let Some(previous) = R::table_mut(self).remove(&id) {
            previous.unindex(id, self, &mut change);
        }
        next.index(id, self, &mut change);
        R::table_mut(self).insert(id, next);
        change.updated(id);
        self.revision += 1;

        let key: RecordKey = id.into();
        debug!(%key, "updated");
        Ok(change)
    }

    /// Moves a local placement under a new parent, or makes it a root.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::WrongKind`] if either placement is not local.
    /// - [`IntegrityError::PlacementCycleDetected`] if `parent` is
    ///   `placement` or one of its descendants.
    /// - [`IntegrityError::PlacementTooDeep`] if the new chain, counting the
    ///   placements already hanging below `placement`, is longer than the
    ///   configured limit.
    pub fn set_relative_placement(
        &mut self,
        placement: PlacementId,
        parent: Option<PlacementId>,
    ) -> Result<Change, Error> {
        if !self.require::<ObjectPlacement>(placement)?.is_local() {
            return Err(IntegrityError::WrongKind {
                key: placement.key(),
                expected: "IfcLocalPlacement",
            }
            .into());
        }
        self.update(placement, |record: &mut ObjectPlacement| {
            record.kind = PlacementKind::Local(LocalPlacement {
                relative_placement: parent,
            });
        })
    }

    /// Records a modification in an owner history.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::DanglingReference`] if the history or the acting
    ///   user does not exist.
    /// - [`StateError::EntityLocked`](crate::StateError::EntityLocked) if
    ///   the history is locked by another user.
    /// - [`StateError::HistoryClosed`](crate::StateError::HistoryClosed) if
    ///   the history has recorded a deletion.
    #[instrument(skip(self))]
    pub fn record_modification(
        &mut self,
        history: OwnerHistoryId,
        modification: Modification,
    ) -> Result<Change, Error> {
        self.require::<PersonAndOrganization>(modification.actor)?;
        let mut next = self.require::<OwnerHistory>(history)?.clone();
        next.apply(history, &modification)
            .inspect_err(|err| debug!(%err, "modification rejected"))?;

        self.histories.insert(history, next);
        let mut change = Change::default();
        change.updated(history);
        self.revision += 1;
        debug!(%history, action = %modification.action, "modification recorded");
        Ok(change)
    }

    /// Records a modification in the owner history of an entity.
    ///
    /// This is the hook a host calls after changing an entity. An entity
    /// without an owner history has nothing to record, and an empty change is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::DanglingReference`] if the entity does not
    /// exist, or any error from [`Universe::record_modification`].
    pub fn touch(&mut self, entity: EntityId, modification: Modification) -> Result<Change, Error> {
        match self.require::<Entity>(entity)?.root().owner_history {
            Some(history) => self.record_modification(history, modification),
            None => Ok(Change::default()),
        }
    }

    pub(crate) fn require<R: Stored>(&self, id: R::Id) -> Result<&R, IntegrityError> {
        R::table(self)
            .get(&id)
            .ok_or_else(|| IntegrityError::DanglingReference(id.into()))
    }

    pub(crate) fn require_all<R: Stored>(
        &self,
        ids: impl IntoIterator<Item = R::Id>,
    ) -> Result<(), IntegrityError> {
        ids.into_iter()
            .try_for_each(|id| self.require::<R>(id).map(|_| ()))
    }

    /// Applies the "user-defined field only with USERDEFINED" convention.
    fn check_user_defined(
        &self,
        record_type: RecordType,
        misplaced: Option<&'static str>,
    ) -> Result<(), ValidationError> {
        let Some(field) = misplaced else {
            return Ok(());
        };
        if self.config.strict_user_defined {
            return Err(ValidationError::UserDefinedMismatch { field });
        }
        warn!(
            %record_type,
            field, "user-defined field set without the USERDEFINED classification"
        );
        Ok(())
    }

    /// Checks that `parent` may become the parent of `placement`.
    ///
    /// Walks up from `parent`; meeting `placement` on the way means a cycle.
    /// The chain above `parent` plus the height of the subtree hanging from
    /// `placement` must fit within the depth limit.
    fn check_parent(
        &self,
        placement: Option<PlacementId>,
        parent: PlacementId,
    ) -> Result<(), IntegrityError> {
        if !self.require::<ObjectPlacement>(parent)?.is_local() {
            return Err(IntegrityError::WrongKind {
                key: parent.key(),
                expected: "IfcLocalPlacement",
            });
        }

        let max_depth = self.config.max_placement_depth();
        let mut chain = 0;
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if let Some(placement) = placement {
                if current == placement {
                    return Err(IntegrityError::PlacementCycleDetected { placement, parent });
                }
            }
            chain += 1;
            if chain > max_depth {
                return Err(IntegrityError::PlacementTooDeep(parent, max_depth));
            }
            cursor = self
                .placements
                .get(&current)
                .and_then(ObjectPlacement::relative_placement);
        }

        let height = placement.map_or(0, |placement| self.subtree_height(placement, max_depth));
        if chain + height > max_depth {
            return Err(IntegrityError::PlacementTooDeep(parent, max_depth));
        }
        Ok(())
    }

    /// The number of levels of placements below `placement`, counting no
    /// further than `limit`.
    fn subtree_height(&self, placement: PlacementId, limit: usize) -> usize {
        let mut height = 0;
        let mut level = self.placement_children(placement);
        while !level.is_empty() && height < limit {
            height += 1;
            level = level
                .into_iter()
                .flat_map(|child| self.placement_children(child))
                .collect();
        }
        height
    }

    /// Inserts a record under a known id, without any checks. Used when
    /// rebuilding a universe from a store; [`Universe::verify`] must follow.
    pub(crate) fn restore<R: Stored>(&mut self, id: R::Id, record: R) {
        let key: RecordKey = id.into();
        self.last_id = self.last_id.max(key.id);
        R::table_mut(self).insert(id, record);
    }

    /// Checks every restored record as if it were being re-saved unchanged,
    /// and builds the indices.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub(crate) fn verify(&mut self) -> Result<(), Error> {
        for record_type in RecordType::ALL {
            with_record_type!(record_type, R => self.verify_table::<R>()?);
        }
        Ok(())
    }

    fn verify_table<R: Stored>(&mut self) -> Result<(), Error> {
        let ids: Vec<R::Id> = R::table(self).keys().copied().collect();
        let mut change = Change::default();
        for id in ids {
            let Some(record) = R::table(self).get(&id).cloned() else {
                continue;
            };
            record.check(self, Some((id, &record)))?;
            record.index(id, self, &mut change);
        }
        Ok(())
    }
}

/// Fails if `key` is already indexed to a record other than `this`.
fn ensure_unique<K, V>(
    index: &HashMap<K, V>,
    key: &K,
    this: Option<V>,
    kind: IndexKind,
) -> Result<(), IntegrityError>
where
    K: Hash + Eq + fmt::Display,
    V: Copy + PartialEq,
{
    match index.get(key) {
        Some(owner) if Some(*owner) != this => Err(IntegrityError::DuplicateKey {
            index: kind,
            key: key.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests;
