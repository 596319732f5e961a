//! Per record type storage plumbing and insert/update rules.

use std::{collections::BTreeMap, fmt, hash::Hash};

use super::{Universe, ensure_unique};
use crate::domain::{
    actor::{
        ActorRole, Address, Application, Organization, Person, PersonAndOrganization,
    },
    change::{Change, IndexKind},
    entity::Entity,
    error::{Error, IntegrityError, StateError},
    handle::{
        AddressId, ApplicationId, ContextId, EntityId, GridAxisId, ItemId, OrganizationId,
        OwnerHistoryId, PersonAndOrganizationId, PersonId, PlacementId, ProductRepresentationId,
        RecordKey, RepresentationId, RoleId, UnitAssignmentId, UnitId,
    },
    owner_history::OwnerHistory,
    placement::{ObjectPlacement, PlacementKind},
    representation::{
        GridAxis, ProductRepresentation, Representation, RepresentationContext,
        RepresentationItem,
    },
    unit::{Unit, UnitAssignment},
};

/// Storage and rules for one record type.
pub trait Table: Clone + fmt::Debug + Sized + 'static {
    /// The handle type.
    type Id: Copy + Ord + Hash + fmt::Debug + fmt::Display + Into<RecordKey> + 'static;

    /// Wraps a raw id.
    fn wrap(raw: u64) -> Self::Id;

    /// The arena holding records of this type.
    fn table(universe: &Universe) -> &BTreeMap<Self::Id, Self>;

    /// The arena holding records of this type, mutably.
    fn table_mut(universe: &mut Universe) -> &mut BTreeMap<Self::Id, Self>;

    /// Checks the record against the universe.
    ///
    /// `existing` is the stored record being replaced, for updates.
    fn check(
        &self,
        universe: &Universe,
        existing: Option<(Self::Id, &Self)>,
    ) -> Result<(), Error>;

    /// Adds the record to the uniqueness indices.
    fn index(&self, _id: Self::Id, _universe: &mut Universe, _change: &mut Change) {}

    /// Removes the record from the uniqueness indices.
    fn unindex(&self, _id: Self::Id, _universe: &mut Universe, _change: &mut Change) {}
}

macro_rules! table {
    ($record:ty, $id:ty, $field:ident { $($rules:tt)* }) => {
        impl Table for $record {
            type Id = $id;

            fn wrap(raw: u64) -> $id {
                <$id>::from_raw(raw)
            }

            fn table(universe: &Universe) -> &BTreeMap<$id, Self> {
                &universe.$field
            }

            fn table_mut(universe: &mut Universe) -> &mut BTreeMap<$id, Self> {
                &mut universe.$field
            }

            $($rules)*
        }
    };
}

table!(Entity, EntityId, entities {
    fn check(&self, universe: &Universe, existing: Option<(EntityId, &Self)>) -> Result<(), Error> {
        self.check_layers()?;
        if let Some((id, previous)) = existing {
            if previous.global_id() != self.global_id() {
                return Err(StateError::Immutable { key: id.key(), field: "GlobalId" }.into());
            }
            if previous.entity_type() != self.entity_type() {
                return Err(StateError::Immutable { key: id.key(), field: "entity type" }.into());
            }
        }
        ensure_unique(
            &universe.global_ids,
            self.global_id(),
            existing.map(|(id, _)| id),
            IndexKind::GlobalId,
        )?;
        if let Some(history) = self.root().owner_history {
            universe.require::<OwnerHistory>(history)?;
        }

        match self {
            Self::Object(_) => {}
            Self::Actor(actor) => {
                // a target deleted after assignment may stay dangling until the
                // select itself is changed
                let unchanged = existing
                    .and_then(|(_, previous)| previous.actor())
                    .is_some_and(|previous| previous.the_actor == actor.the_actor);
                if !unchanged {
                    universe.resolve_actor(actor.the_actor)?;
                }
            }
            Self::Product(_) | Self::Grid(_) => {
                if let Some(product) = self.product() {
                    if let Some(placement) = product.object_placement {
                        universe.require::<ObjectPlacement>(placement)?;
                    }
                    if let Some(representation) = product.representation {
                        universe.require::<ProductRepresentation>(representation)?;
                    }
                }
                if let Some(grid) = self.grid() {
                    universe.require_all::<GridAxis>(grid.axes())?;
                }
            }
            Self::Project(project) => {
                if let Some(assignment) = project.units_in_context {
                    universe.require::<UnitAssignment>(assignment)?;
                }
                universe.require_all::<RepresentationContext>(
                    project.representation_contexts.iter().copied(),
                )?;
            }
        }
        Ok(())
    }

    fn index(&self, id: EntityId, universe: &mut Universe, change: &mut Change) {
        universe.global_ids.insert(self.global_id().clone(), id);
        change.touched(IndexKind::GlobalId);
    }

    fn unindex(&self, _id: EntityId, universe: &mut Universe, change: &mut Change) {
        universe.global_ids.remove(self.global_id());
        change.touched(IndexKind::GlobalId);
    }
});

table!(Person, PersonId, people {
    fn check(&self, universe: &Universe, existing: Option<(PersonId, &Self)>) -> Result<(), Error> {
        if let Some(identifier) = &self.identifier {
            ensure_unique(
                &universe.person_identifiers,
                identifier,
                existing.map(|(id, _)| id),
                IndexKind::PersonIdentifier,
            )?;
        }
        universe.require_all::<ActorRole>(self.roles.iter().copied())?;
        universe.require_all::<Address>(self.addresses.iter().copied())?;
        Ok(())
    }

    fn index(&self, id: PersonId, universe: &mut Universe, change: &mut Change) {
        if let Some(identifier) = &self.identifier {
            universe.person_identifiers.insert(identifier.clone(), id);
            change.touched(IndexKind::PersonIdentifier);
        }
    }

    fn unindex(&self, _id: PersonId, universe: &mut Universe, change: &mut Change) {
        if let Some(identifier) = &self.identifier {
            universe.person_identifiers.remove(identifier);
            change.touched(IndexKind::PersonIdentifier);
        }
    }
});

table!(Organization, OrganizationId, organizations {
    fn check(
        &self,
        universe: &Universe,
        existing: Option<(OrganizationId, &Self)>,
    ) -> Result<(), Error> {
        if let Some(identifier) = &self.identifier {
            ensure_unique(
                &universe.organization_identifiers,
                identifier,
                existing.map(|(id, _)| id),
                IndexKind::OrganizationIdentifier,
            )?;
        }
        universe.require_all::<ActorRole>(self.roles.iter().copied())?;
        universe.require_all::<Address>(self.addresses.iter().copied())?;
        Ok(())
    }

    fn index(&self, id: OrganizationId, universe: &mut Universe, change: &mut Change) {
        if let Some(identifier) = &self.identifier {
            universe.organization_identifiers.insert(identifier.clone(), id);
            change.touched(IndexKind::OrganizationIdentifier);
        }
    }

    fn unindex(&self, _id: OrganizationId, universe: &mut Universe, change: &mut Change) {
        if let Some(identifier) = &self.identifier {
            universe.organization_identifiers.remove(identifier);
            change.touched(IndexKind::OrganizationIdentifier);
        }
    }
});

table!(PersonAndOrganization, PersonAndOrganizationId, pairs {
    fn check(
        &self,
        universe: &Universe,
        existing: Option<(PersonAndOrganizationId, &Self)>,
    ) -> Result<(), Error> {
        universe.require::<Person>(self.person)?;
        universe.require::<Organization>(self.organization)?;
        match universe.pair_index.get(&self.pair()) {
            Some(owner) if Some(*owner) != existing.map(|(id, _)| id) => {
                return Err(IntegrityError::DuplicateKey {
                    index: IndexKind::PersonOrganizationPair,
                    key: format!("{} at {}", self.person.key(), self.organization.key()),
                }
                .into());
            }
            _ => {}
        }
        universe.require_all::<ActorRole>(self.roles.iter().copied())?;
        Ok(())
    }

    fn index(&self, id: PersonAndOrganizationId, universe: &mut Universe, change: &mut Change) {
        universe.pair_index.insert(self.pair(), id);
        change.touched(IndexKind::PersonOrganizationPair);
    }

    fn unindex(&self, _id: PersonAndOrganizationId, universe: &mut Universe, change: &mut Change) {
        universe.pair_index.remove(&self.pair());
        change.touched(IndexKind::PersonOrganizationPair);
    }
});

table!(ActorRole, RoleId, roles {
    fn check(&self, universe: &Universe, _existing: Option<(RoleId, &Self)>) -> Result<(), Error> {
        universe.check_user_defined(RoleId::RECORD_TYPE, self.misplaced_user_defined_field())?;
        Ok(())
    }
});

table!(Address, AddressId, addresses {
    fn check(&self, universe: &Universe, _existing: Option<(AddressId, &Self)>) -> Result<(), Error> {
        universe.check_user_defined(AddressId::RECORD_TYPE, self.misplaced_user_defined_field())?;
        Ok(())
    }
});

table!(Application, ApplicationId, applications {
    fn check(
        &self,
        universe: &Universe,
        existing: Option<(ApplicationId, &Self)>,
    ) -> Result<(), Error> {
        if let Some(identifier) = &self.identifier {
            ensure_unique(
                &universe.application_identifiers,
                identifier,
                existing.map(|(id, _)| id),
                IndexKind::ApplicationIdentifier,
            )?;
        }
        if let Some(developer) = self.developer {
            universe.require::<Organization>(developer)?;
        }
        Ok(())
    }

    fn index(&self, id: ApplicationId, universe: &mut Universe, change: &mut Change) {
        if let Some(identifier) = &self.identifier {
            universe.application_identifiers.insert(identifier.clone(), id);
            change.touched(IndexKind::ApplicationIdentifier);
        }
    }

    fn unindex(&self, _id: ApplicationId, universe: &mut Universe, change: &mut Change) {
        if let Some(identifier) = &self.identifier {
            universe.application_identifiers.remove(identifier);
            change.touched(IndexKind::ApplicationIdentifier);
        }
    }
});

table!(OwnerHistory, OwnerHistoryId, histories {
    fn check(
        &self,
        universe: &Universe,
        _existing: Option<(OwnerHistoryId, &Self)>,
    ) -> Result<(), Error> {
        universe.require_all::<PersonAndOrganization>(self.users())?;
        if let Some(application) = self.application() {
            universe.require::<Application>(application)?;
        }
        Ok(())
    }
});

table!(ObjectPlacement, PlacementId, placements {
    fn check(
        &self,
        universe: &Universe,
        existing: Option<(PlacementId, &Self)>,
    ) -> Result<(), Error> {
        let this = existing.map(|(id, _)| id);
        ensure_unique(
            &universe.placement_ids,
            &self.placement_id,
            this,
            IndexKind::PlacementId,
        )?;
        match &self.kind {
            PlacementKind::Local(local) => {
                if let Some(parent) = local.relative_placement {
                    universe.check_parent(this, parent)?;
                }
            }
            PlacementKind::Grid(grid) => {
                let entity = universe.require::<Entity>(grid.grid)?;
                if entity.grid().is_none() {
                    return Err(IntegrityError::WrongKind {
                        key: grid.grid.key(),
                        expected: "IfcGrid",
                    }
                    .into());
                }
                // only local placements may have children
                if let Some(id) = this {
                    let children = universe.placement_children(id);
                    if !children.is_empty() {
                        return Err(IntegrityError::Referenced {
                            target: id.key(),
                            by: children.into_iter().map(PlacementId::key).collect(),
                        }
                        .into());
                    }
                }
            }
        }
        Ok(())
    }

    fn index(&self, id: PlacementId, universe: &mut Universe, change: &mut Change) {
        universe.placement_ids.insert(self.placement_id.clone(), id);
        universe.placement_graph.add_node(id);
        if let Some(parent) = self.relative_placement() {
            universe.placement_graph.add_edge(id, parent, ());
        }
        change.touched(IndexKind::PlacementId);
    }

    fn unindex(&self, id: PlacementId, universe: &mut Universe, change: &mut Change) {
        universe.placement_ids.remove(&self.placement_id);
        if let Some(parent) = self.relative_placement() {
            universe.placement_graph.remove_edge(id, parent);
        }
        // keep the node while children still point at it
        if universe.placement_children(id).is_empty() {
            universe.placement_graph.remove_node(id);
        }
        change.touched(IndexKind::PlacementId);
    }
});

table!(ProductRepresentation, ProductRepresentationId, product_representations {
    fn check(
        &self,
        universe: &Universe,
        _existing: Option<(ProductRepresentationId, &Self)>,
    ) -> Result<(), Error> {
        universe.require_all::<Representation>(self.representations.iter().copied())?;
        Ok(())
    }
});

table!(Representation, RepresentationId, representations {
    fn check(
        &self,
        universe: &Universe,
        _existing: Option<(RepresentationId, &Self)>,
    ) -> Result<(), Error> {
        universe.require::<RepresentationContext>(self.context)?;
        universe.require_all::<RepresentationItem>(self.items.iter().copied())?;
        Ok(())
    }
});

table!(RepresentationContext, ContextId, contexts {
    fn check(
        &self,
        _universe: &Universe,
        _existing: Option<(ContextId, &Self)>,
    ) -> Result<(), Error> {
        Ok(())
    }
});

table!(RepresentationItem, ItemId, items {
    fn check(&self, universe: &Universe, existing: Option<(ItemId, &Self)>) -> Result<(), Error> {
        // an axis curve must stay a curve
        if let Some((id, _)) = existing {
            if !self.geometry.is_curve() {
                let axes: Vec<RecordKey> = universe
                    .grid_axes
                    .iter()
                    .filter(|(_, axis)| axis.axis_curve == Some(id))
                    .map(|(axis, _)| axis.key())
                    .collect();
                if !axes.is_empty() {
                    return Err(IntegrityError::Referenced { target: id.key(), by: axes }.into());
                }
            }
        }
        Ok(())
    }
});

table!(GridAxis, GridAxisId, grid_axes {
    fn check(&self, universe: &Universe, _existing: Option<(GridAxisId, &Self)>) -> Result<(), Error> {
        if let Some(curve) = self.axis_curve {
            if !universe.require::<RepresentationItem>(curve)?.geometry.is_curve() {
                return Err(IntegrityError::WrongKind {
                    key: curve.key(),
                    expected: "IfcCurve",
                }
                .into());
            }
        }
        Ok(())
    }
});

table!(Unit, UnitId, units {
    fn check(&self, universe: &Universe, existing: Option<(UnitId, &Self)>) -> Result<(), Error> {
        // assignments select a unit by kind, so the kind must not change under them
        if let Some((id, _)) = existing {
            let mismatched: Vec<RecordKey> = universe
                .unit_assignments
                .iter()
                .filter(|(_, assignment)| {
                    assignment
                        .units
                        .iter()
                        .any(|select| select.unit() == id && !select.matches(self))
                })
                .map(|(assignment, _)| assignment.key())
                .collect();
            if !mismatched.is_empty() {
                return Err(IntegrityError::Referenced { target: id.key(), by: mismatched }.into());
            }
        }
        Ok(())
    }
});

table!(UnitAssignment, UnitAssignmentId, unit_assignments {
    fn check(
        &self,
        universe: &Universe,
        _existing: Option<(UnitAssignmentId, &Self)>,
    ) -> Result<(), Error> {
        for select in &self.units {
            let unit = universe.require::<Unit>(select.unit())?;
            if !select.matches(unit) {
                return Err(IntegrityError::WrongKind {
                    key: select.unit().key(),
                    expected: select.expected(),
                }
                .into());
            }
        }
        Ok(())
    }
});
