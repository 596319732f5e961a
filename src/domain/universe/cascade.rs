//! Deletion.
//!
//! Deleting a record applies the policy of every relationship that points at
//! it:
//!
//! | Relationship                                  | On target delete        |
//! |-----------------------------------------------|-------------------------|
//! | product → placement, product representation   | set to none             |
//! | root → owner history                          | set to none             |
//! | owner history → pairing, application          | set to none             |
//! | application → developer                       | set to none             |
//! | grid axis → curve                             | set to none             |
//! | local placement → parent                      | reject, or re-root      |
//! | pairing → person, organization                | cascade                 |
//! | representation → context                      | cascade                 |
//! | grid placement → grid                         | cascade                 |
//! | project → unit assignment                     | reject                  |
//! | roles, addresses, items, axes, units, ...     | remove association only |
//! | actor → actor select target                   | left dangling           |
//!
//! The full set of deletions is planned and every rejection is checked before
//! anything is written.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use super::{Table, Universe};
use crate::domain::{
    actor::{
        ActorRole, ActorSelect, Address, Application, Organization, Person,
        PersonAndOrganization,
    },
    change::Change,
    config::PlacementDeletePolicy,
    entity::Entity,
    error::{Error, IntegrityError},
    handle::{
        AddressId, ApplicationId, ContextId, EntityId, GridAxisId, ItemId, OrganizationId,
        OwnerHistoryId, PersonAndOrganizationId, PersonId, PlacementId, ProductRepresentationId,
        RecordKey, RecordType, RepresentationId, RoleId, UnitAssignmentId, UnitId,
    },
    owner_history::OwnerHistory,
    placement::ObjectPlacement,
    representation::{
        GridAxis, ProductRepresentation, Representation, RepresentationContext,
        RepresentationItem,
    },
    unit::{Unit, UnitAssignment},
};

impl Universe {
    /// Deletes a record, applying the deletion policy of every relationship
    /// that refers to it.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::DanglingReference`] if the record does not exist.
    /// - [`IntegrityError::Referenced`] if a restricting relationship still
    ///   refers to the record or to a record that would be cascade-deleted.
    ///   Local placements with children restrict deletion unless the
    ///   configured policy is [`PlacementDeletePolicy::Reroot`].
    ///
    /// The universe is unchanged on error.
    pub fn delete(&mut self, key: impl Into<RecordKey>) -> Result<Change, Error> {
        self.delete_key(key.into())
    }

    #[instrument(skip(self))]
    fn delete_key(&mut self, key: RecordKey) -> Result<Change, Error> {
        if !self.contains(key) {
            return Err(IntegrityError::DanglingReference(key).into());
        }
        let doomed = self
            .plan_deletion(key)
            .inspect_err(|err| debug!(%err, "delete rejected"))?;
        let doomed_set: BTreeSet<RecordKey> = doomed.iter().copied().collect();

        let mut change = Change::default();
        for &target in &doomed {
            self.detach_dependents(target, &doomed_set, &mut change);
        }
        for &target in &doomed {
            with_record_type!(target.record_type, R => self.remove::<R>(target.id, &mut change));
            if target == key {
                debug!(%target, "deleted");
            } else {
                debug!(%target, "cascade deleted");
            }
        }
        self.revision += 1;
        Ok(change)
    }

    /// Works out every record that goes with `key`, and checks that nothing
    /// restricts the deletion.
    fn plan_deletion(&self, key: RecordKey) -> Result<Vec<RecordKey>, IntegrityError> {
        let mut doomed = vec![key];
        let mut seen = BTreeSet::from([key]);
        let mut next = 0;
        while let Some(&current) = doomed.get(next) {
            for cascaded in self.cascades_of(current) {
                if seen.insert(cascaded) {
                    doomed.push(cascaded);
                }
            }
            next += 1;
        }

        for &target in &doomed {
            let by: Vec<RecordKey> = self
                .restrictors_of(target)
                .into_iter()
                .filter(|restrictor| !seen.contains(restrictor))
                .collect();
            if !by.is_empty() {
                return Err(IntegrityError::Referenced { target, by });
            }
        }
        Ok(doomed)
    }

    /// Records deleted along with `key`.
    fn cascades_of(&self, key: RecordKey) -> Vec<RecordKey> {
        match key.record_type {
            RecordType::Person => {
                let person = PersonId::from_raw(key.id);
                keys_where(&self.pairs, |pair| pair.person == person)
            }
            RecordType::Organization => {
                let organization = OrganizationId::from_raw(key.id);
                keys_where(&self.pairs, |pair| pair.organization == organization)
            }
            RecordType::RepresentationContext => {
                let context = ContextId::from_raw(key.id);
                keys_where(&self.representations, |representation| {
                    representation.context == context
                })
            }
            RecordType::Entity => {
                let grid = EntityId::from_raw(key.id);
                keys_where(&self.placements, |placement| {
                    placement.grid_entity() == Some(grid)
                })
            }
            _ => Vec::new(),
        }
    }

    /// Records whose existence forbids deleting `key`.
    fn restrictors_of(&self, key: RecordKey) -> Vec<RecordKey> {
        match key.record_type {
            RecordType::Placement
                if self.config.placement_delete_policy == PlacementDeletePolicy::Reject =>
            {
                self.placement_children(PlacementId::from_raw(key.id))
                    .into_iter()
                    .map(PlacementId::key)
                    .collect()
            }
            RecordType::UnitAssignment => {
                let assignment = UnitAssignmentId::from_raw(key.id);
                keys_where(&self.entities, |entity| {
                    entity
                        .project()
                        .is_some_and(|project| project.units_in_context == Some(assignment))
                })
            }
            _ => Vec::new(),
        }
    }

    /// Clears references to `key` held by records that survive the deletion.
    fn detach_dependents(
        &mut self,
        key: RecordKey,
        doomed: &BTreeSet<RecordKey>,
        change: &mut Change,
    ) {
        match key.record_type {
            RecordType::Entity => {}
            RecordType::Person => {
                self.log_dangling_actors(ActorSelect::Person(PersonId::from_raw(key.id)));
            }
            RecordType::Organization => {
                let organization = OrganizationId::from_raw(key.id);
                self.log_dangling_actors(ActorSelect::Organization(organization));
                detach::<Application>(self, doomed, change, |application| {
                    clear_if(&mut application.developer, organization)
                });
            }
            RecordType::PersonAndOrganization => {
                let pair = PersonAndOrganizationId::from_raw(key.id);
                self.log_dangling_actors(ActorSelect::PersonAndOrganization(pair));
                detach::<OwnerHistory>(self, doomed, change, |history| history.forget_user(pair));
            }
            RecordType::ActorRole => {
                let role = RoleId::from_raw(key.id);
                detach::<Person>(self, doomed, change, |person| person.roles.remove(&role));
                detach::<Organization>(self, doomed, change, |organization| {
                    organization.roles.remove(&role)
                });
                detach::<PersonAndOrganization>(self, doomed, change, |pair| {
                    pair.roles.remove(&role)
                });
            }
            RecordType::Address => {
                let address = AddressId::from_raw(key.id);
                detach::<Person>(self, doomed, change, |person| {
                    person.addresses.remove(&address)
                });
                detach::<Organization>(self, doomed, change, |organization| {
                    organization.addresses.remove(&address)
                });
            }
            RecordType::Application => {
                let application = ApplicationId::from_raw(key.id);
                detach::<OwnerHistory>(self, doomed, change, |history| {
                    history.forget_application(application)
                });
            }
            RecordType::OwnerHistory => {
                let history = OwnerHistoryId::from_raw(key.id);
                detach::<Entity>(self, doomed, change, |entity| {
                    clear_if(&mut entity.root_mut().owner_history, history)
                });
            }
            RecordType::Placement => {
                let placement = PlacementId::from_raw(key.id);
                detach::<Entity>(self, doomed, change, |entity| {
                    entity
                        .product_mut()
                        .is_some_and(|product| clear_if(&mut product.object_placement, placement))
                });
                self.reroot_children(placement, doomed, change);
            }
            RecordType::ProductRepresentation => {
                let representation = ProductRepresentationId::from_raw(key.id);
                detach::<Entity>(self, doomed, change, |entity| {
                    entity.product_mut().is_some_and(|product| {
                        clear_if(&mut product.representation, representation)
                    })
                });
            }
            RecordType::Representation => {
                let representation = RepresentationId::from_raw(key.id);
                detach::<ProductRepresentation>(self, doomed, change, |product_representation| {
                    let before = product_representation.representations.len();
                    product_representation
                        .representations
                        .retain(|existing| *existing != representation);
                    product_representation.representations.len() != before
                });
            }
            RecordType::RepresentationContext => {
                let context = ContextId::from_raw(key.id);
                detach::<Entity>(self, doomed, change, |entity| match entity {
                    Entity::Project(project) => project.representation_contexts.remove(&context),
                    _ => false,
                });
            }
            RecordType::RepresentationItem => {
                let item = ItemId::from_raw(key.id);
                detach::<Representation>(self, doomed, change, |representation| {
                    representation.items.remove(&item)
                });
                detach::<GridAxis>(self, doomed, change, |axis| {
                    clear_if(&mut axis.axis_curve, item)
                });
            }
            RecordType::GridAxis => {
                let axis = GridAxisId::from_raw(key.id);
                detach::<Entity>(self, doomed, change, |entity| match entity {
                    Entity::Grid(grid) => grid.remove_axis(axis),
                    _ => false,
                });
            }
            RecordType::Unit => {
                let unit = UnitId::from_raw(key.id);
                detach::<UnitAssignment>(self, doomed, change, |assignment| {
                    assignment.remove_unit(unit)
                });
            }
            RecordType::UnitAssignment => {}
        }
    }

    /// Makes the surviving children of a deleted placement into roots.
    fn reroot_children(
        &mut self,
        placement: PlacementId,
        doomed: &BTreeSet<RecordKey>,
        change: &mut Change,
    ) {
        for child in self.placement_children(placement) {
            if doomed.contains(&child.key()) {
                continue;
            }
            self.placement_graph.remove_edge(child, placement);
            if let Some(record) = self.placements.get_mut(&child) {
                record.clear_relative_placement();
                change.updated(child);
                debug!(%child, "placement re-rooted");
            }
        }
    }

    fn log_dangling_actors(&self, target: ActorSelect) {
        for (id, entity) in &self.entities {
            if entity
                .actor()
                .is_some_and(|actor| actor.the_actor == target)
            {
                debug!(actor = %id.key(), target = %target.key(), "actor select left dangling");
            }
        }
    }

    fn remove<R: Table>(&mut self, raw: u64, change: &mut Change) {
        let id = R::wrap(raw);
        if let Some(record) = R::table_mut(self).remove(&id) {
            record.unindex(id, self, change);
            change.deleted(id);
        }
    }
}

/// Applies `edit` to every surviving record of one type, reporting those it
/// changed.
fn detach<R: Table>(
    universe: &mut Universe,
    doomed: &BTreeSet<RecordKey>,
    change: &mut Change,
    mut edit: impl FnMut(&mut R) -> bool,
) {
    for (id, record) in R::table_mut(universe) {
        let key: RecordKey = (*id).into();
        if doomed.contains(&key) {
            continue;
        }
        if edit(record) {
            change.updated(key);
            debug!(%key, "reference cleared");
        }
    }
}

/// Clears `slot` if it holds `target`.
fn clear_if<T: PartialEq>(slot: &mut Option<T>, target: T) -> bool {
    if slot.as_ref() == Some(&target) {
        *slot = None;
        return true;
    }
    false
}

fn keys_where<K: Copy + Into<RecordKey>, R>(
    table: &BTreeMap<K, R>,
    predicate: impl Fn(&R) -> bool,
) -> Vec<RecordKey> {
    table
        .iter()
        .filter(|(_, record)| predicate(record))
        .map(|(id, _)| (*id).into())
        .collect()
}
