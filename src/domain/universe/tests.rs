use std::collections::BTreeSet;

use super::*;
use crate::{
    domain::{
        change::Effect,
        config::PlacementDeletePolicy,
        entity::ProductDraft,
        enums::{ChangeAction, Role, State, UnitType},
        error::StateError,
        measure::{Label, Timestamp},
        representation::{CartesianPoint, CoordinateSpaceDimension, Geometry},
        unit::UnitSelect,
    },
    storage::{LoadError, MemoryStore, Record, RecordStore},
};

fn label(s: &str) -> Label {
    Label::new(s).unwrap()
}

fn ident(s: &str) -> Identifier {
    Identifier::new(s).unwrap()
}

fn add<R: Stored>(universe: &mut Universe, record: R) -> R::Id {
    universe.insert(record).unwrap().0
}

fn local(universe: &mut Universe, placement_id: &str, parent: Option<PlacementId>) -> PlacementId {
    add(universe, ObjectPlacement::local(ident(placement_id), parent))
}

fn product(universe: &mut Universe, name: &str, draft: ProductDraft) -> EntityId {
    universe
        .create_entity(RootDraft::new().with_name(name), Specialization::Product(draft))
        .unwrap()
        .0
}

fn project(universe: &mut Universe, draft: Specialization) -> EntityId {
    universe
        .create_entity(RootDraft::new().with_name("Tower"), draft)
        .unwrap()
        .0
}

fn person(first: &str, family: &str) -> Person {
    Person {
        first_name: Some(label(first)),
        family_name: Some(label(family)),
        ..Person::default()
    }
}

/// A person working for an organization.
fn staff(
    universe: &mut Universe,
    first: &str,
) -> (PersonId, OrganizationId, PersonAndOrganizationId) {
    let person = add(universe, person(first, "Smith"));
    let organization = add(universe, Organization::named(label(&format!("{first} Ltd"))));
    let pair = add(universe, PersonAndOrganization::new(person, organization));
    (person, organization, pair)
}

fn contexts(ids: impl IntoIterator<Item = ContextId>) -> Specialization {
    Specialization::Project {
        long_name: None,
        phase: None,
        units_in_context: None,
        representation_contexts: ids.into_iter().collect(),
    }
}

fn context() -> RepresentationContext {
    RepresentationContext {
        identifier: Some(label("Body")),
        context_type: Some(label("Model")),
        coordinate_space_dimension: CoordinateSpaceDimension::Three,
    }
}

fn line() -> RepresentationItem {
    RepresentationItem::new(Geometry::Line {
        start: CartesianPoint::planar(0.0, 0.0),
        end: CartesianPoint::planar(10.0, 0.0),
    })
}

fn point() -> RepresentationItem {
    RepresentationItem::new(Geometry::Point(CartesianPoint::planar(1.0, 1.0)))
}

fn entity(universe: &Universe, id: EntityId) -> &Entity {
    universe.get::<Entity>(id).unwrap()
}

#[test]
fn universe_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Universe>();
}

#[test]
fn duplicate_global_id_leaves_universe_unchanged() {
    let mut universe = Universe::default();
    let guid = Guid::generate();
    let draft = || RootDraft {
        global_id: Some(guid.to_string()),
        name: Some("Wall".to_string()),
        ..RootDraft::default()
    };

    let (first, change) = universe
        .create_entity(draft(), Specialization::Object { object_type: None })
        .unwrap();
    assert!(change.touches(IndexKind::GlobalId));
    assert_eq!(universe.entity_by_global_id(&guid), Some(first));

    let snapshot = universe.to_json().unwrap();
    let revision = universe.revision();

    let err = universe
        .create_entity(draft(), Specialization::Product(ProductDraft::default()))
        .unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::DuplicateKey {
            index: IndexKind::GlobalId,
            key: guid.to_string(),
        })
    );
    assert_eq!(universe.to_json().unwrap(), snapshot);
    assert_eq!(universe.revision(), revision);
    assert_eq!(universe.len(), 1);
    assert_eq!(universe.entity_by_global_id(&guid), Some(first));
}

#[test]
fn references_must_exist() {
    let mut universe = Universe::default();
    let missing = PlacementId::from_raw(42);

    let err = universe
        .create_entity(
            RootDraft::new(),
            Specialization::Product(ProductDraft {
                object_placement: Some(missing),
                representation: None,
            }),
        )
        .unwrap_err();

    assert_eq!(
        err,
        Error::Integrity(IntegrityError::DanglingReference(missing.key()))
    );
    assert!(universe.is_empty());
}

#[test]
fn placement_cycle_is_rejected() {
    let mut universe = Universe::default();
    let a = local(&mut universe, "A", None);
    let b = local(&mut universe, "B", Some(a));

    let err = universe.set_relative_placement(a, Some(b)).unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::PlacementCycleDetected {
            placement: a,
            parent: b
        })
    );

    let err = universe.set_relative_placement(a, Some(a)).unwrap_err();
    assert!(matches!(
        err,
        Error::Integrity(IntegrityError::PlacementCycleDetected { .. })
    ));

    assert_eq!(universe.placement_ancestors(b), [a]);
    assert_eq!(universe.placement_children(a), [b]);
    assert!(universe.placement_ancestors(a).is_empty());
}

#[test]
fn moving_a_placement_updates_the_tree() {
    let mut universe = Universe::default();
    let a = local(&mut universe, "A", None);
    let b = local(&mut universe, "B", None);
    let c = local(&mut universe, "C", Some(a));

    let change = universe.set_relative_placement(c, Some(b)).unwrap();
    assert_eq!(change.effects(), [Effect::Updated(c.key())]);

    assert!(universe.placement_children(a).is_empty());
    assert_eq!(universe.placement_children(b), [c]);
    assert_eq!(universe.placement_ancestors(c), [b]);

    // a is now free to move under c
    universe.set_relative_placement(a, Some(c)).unwrap();
    assert_eq!(universe.placement_ancestors(a), [c, b]);
}

#[test]
fn placement_depth_is_bounded() {
    let mut config = Config::default();
    config.set_max_placement_depth(2);
    let mut universe = Universe::new(config);

    let root = local(&mut universe, "root", None);
    let first = local(&mut universe, "first", Some(root));
    let second = local(&mut universe, "second", Some(first));

    let err = universe
        .insert(ObjectPlacement::local(ident("third"), Some(second)))
        .unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::PlacementTooDeep(second, 2))
    );
}

#[test]
fn moving_a_subtree_counts_its_descendants() {
    let mut config = Config::default();
    config.set_max_placement_depth(2);
    let mut universe = Universe::new(config);

    let a = local(&mut universe, "A", None);
    let b = local(&mut universe, "B", Some(a));
    let c = local(&mut universe, "C", Some(b));
    let d = local(&mut universe, "D", None);
    let e = local(&mut universe, "E", Some(d));
    let before = universe.to_json().unwrap();

    // e is one level down and a carries two more below it
    let err = universe.set_relative_placement(a, Some(e)).unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::PlacementTooDeep(e, 2))
    );
    let err = universe.set_relative_placement(b, Some(e)).unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::PlacementTooDeep(e, 2))
    );
    assert_eq!(universe.to_json().unwrap(), before);

    // a leaf fits under e, and b with its one child fits under d
    universe.set_relative_placement(c, Some(e)).unwrap();
    assert_eq!(universe.placement_ancestors(c), [e, d]);
    universe.set_relative_placement(c, Some(b)).unwrap();
    universe.set_relative_placement(b, Some(d)).unwrap();
    assert_eq!(universe.placement_ancestors(c), [b, d]);
    assert_eq!(universe.placement_children(d), [b, e]);
}

#[test]
fn universe_built_by_mutation_reloads() {
    let mut config = Config::default();
    config.set_max_placement_depth(3);
    config.placement_delete_policy = PlacementDeletePolicy::Reroot;
    let mut universe = Universe::new(config.clone());

    let a = local(&mut universe, "A", None);
    let b = local(&mut universe, "B", Some(a));
    let c = local(&mut universe, "C", Some(b));
    let d = local(&mut universe, "D", None);
    let e = local(&mut universe, "E", Some(d));
    let wall = product(
        &mut universe,
        "Wall",
        ProductDraft {
            object_placement: Some(c),
            representation: None,
        },
    );

    universe.set_relative_placement(b, Some(d)).unwrap();
    universe.set_relative_placement(e, Some(b)).unwrap();
    universe.delete(a).unwrap();
    // d goes away and b becomes a root carrying c and e
    universe.delete(d).unwrap();
    assert!(universe.placement_ancestors(b).is_empty());
    let f = local(&mut universe, "F", None);
    universe.set_relative_placement(b, Some(f)).unwrap();

    let mut store = MemoryStore::new();
    universe.save(&mut store).unwrap();
    let loaded = Universe::load(&store, config).unwrap();

    assert_eq!(loaded.to_json().unwrap(), universe.to_json().unwrap());
    assert_eq!(loaded.placement_ancestors(c), [b, f]);
    assert_eq!(loaded.placement_children(b), [c, e]);
    assert_eq!(
        entity(&loaded, wall).product().unwrap().object_placement,
        Some(c)
    );
}

#[test]
fn placements_are_relative_to_local_placements_only() {
    let mut universe = Universe::default();
    let grid = project_grid(&mut universe);
    let on_grid = add(
        &mut universe,
        ObjectPlacement::grid(ident("G1"), grid, label("A/1")),
    );

    let err = universe
        .insert(ObjectPlacement::local(ident("L1"), Some(on_grid)))
        .unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::WrongKind {
            key: on_grid.key(),
            expected: "IfcLocalPlacement",
        })
    );

    let err = universe.set_relative_placement(on_grid, None).unwrap_err();
    assert!(matches!(
        err,
        Error::Integrity(IntegrityError::WrongKind { .. })
    ));
}

fn project_grid(universe: &mut Universe) -> EntityId {
    let axis = add(universe, GridAxis::new(label("A")));
    universe
        .create_entity(
            RootDraft::new().with_name("Grid 1"),
            Specialization::Grid {
                product: ProductDraft::default(),
                u_axes: BTreeSet::from([axis]),
                v_axes: BTreeSet::new(),
                w_axes: None,
            },
        )
        .unwrap()
        .0
}

#[test]
fn grid_placements_need_a_grid() {
    let mut universe = Universe::default();
    let column = product(&mut universe, "Column", ProductDraft::default());

    let err = universe
        .insert(ObjectPlacement::grid(ident("G1"), column, label("A/1")))
        .unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::WrongKind {
            key: column.key(),
            expected: "IfcGrid",
        })
    );
}

#[test]
fn placement_ids_are_unique() {
    let mut universe = Universe::default();
    let first = local(&mut universe, "P1", None);
    assert_eq!(universe.placement_by_id("P1"), Some(first));

    let err = universe
        .insert(ObjectPlacement::local(ident("P1"), None))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Integrity(IntegrityError::DuplicateKey {
            index: IndexKind::PlacementId,
            ..
        })
    ));

    // renaming frees the old id
    universe
        .update(first, |placement: &mut ObjectPlacement| {
            placement.placement_id = ident("P2");
        })
        .unwrap();
    assert_eq!(universe.placement_by_id("P1"), None);
    assert_eq!(universe.placement_by_id("P2"), Some(first));
    local(&mut universe, "P1", None);
}

#[test]
fn person_and_organization_pair_is_unique() {
    let mut universe = Universe::default();
    let (person, organization, pair) = staff(&mut universe, "John");
    assert_eq!(
        universe.person_and_organization(person, organization),
        Some(pair)
    );

    let err = universe
        .insert(PersonAndOrganization::new(person, organization))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Integrity(IntegrityError::DuplicateKey {
            index: IndexKind::PersonOrganizationPair,
            ..
        })
    ));
    assert_eq!(universe.records::<PersonAndOrganization>().count(), 1);
}

#[test]
fn identifiers_are_unique_per_record_type() {
    let mut universe = Universe::default();
    let alice = add(
        &mut universe,
        Person {
            identifier: Some(ident("A-1")),
            ..Person::default()
        },
    );
    // the same identifier on an organization is fine
    add(
        &mut universe,
        Organization {
            identifier: Some(ident("A-1")),
            ..Organization::default()
        },
    );

    let err = universe
        .insert(Person {
            identifier: Some(ident("A-1")),
            ..Person::default()
        })
        .unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::DuplicateKey {
            index: IndexKind::PersonIdentifier,
            key: "A-1".to_string(),
        })
    );

    // re-saving a record with its own identifier is not a collision
    universe
        .update(alice, |person: &mut Person| {
            person.first_name = Some(label("Alice"));
        })
        .unwrap();
    assert_eq!(universe.person_by_identifier("A-1"), Some(alice));
}

#[test]
fn deleting_product_representation_clears_product() {
    let mut universe = Universe::default();
    let representation = add(&mut universe, ProductRepresentation::default());
    let column = product(
        &mut universe,
        "Column",
        ProductDraft {
            object_placement: None,
            representation: Some(representation),
        },
    );

    let change = universe.delete(representation).unwrap();

    assert_eq!(entity(&universe, column).product().unwrap().representation, None);
    assert_eq!(
        change.effects(),
        [
            Effect::Updated(column.key()),
            Effect::Deleted(representation.key())
        ]
    );
    assert_eq!(change.modified_entities().collect::<Vec<_>>(), [column]);
}

#[test]
fn deleting_a_person_cascades_to_pairs() {
    let mut universe = Universe::default();
    let (person, organization, pair) = staff(&mut universe, "John");
    let history = add(
        &mut universe,
        OwnerHistory::created(
            Some(pair),
            None,
            State::ReadWrite,
            Timestamp::from_seconds(0),
        ),
    );

    let change = universe.delete(person).unwrap();

    assert_eq!(
        change.deleted_keys().collect::<Vec<_>>(),
        [person.key(), pair.key()]
    );
    assert!(change.touches(IndexKind::PersonOrganizationPair));
    assert!(universe.get::<PersonAndOrganization>(pair).is_none());
    assert!(universe.get::<Organization>(organization).is_some());
    assert_eq!(
        universe.get::<OwnerHistory>(history).unwrap().creation_user(),
        None
    );
    assert_eq!(universe.person_and_organization(person, organization), None);
}

#[test]
fn deleting_an_organization_clears_application_developer() {
    let mut universe = Universe::default();
    let organization = add(&mut universe, Organization::named(label("Acme")));
    let application = add(
        &mut universe,
        Application {
            developer: Some(organization),
            identifier: Some(ident("acme-cad")),
            ..Application::default()
        },
    );

    universe.delete(organization).unwrap();

    let application = universe.get::<Application>(application).unwrap();
    assert_eq!(application.developer, None);
    assert!(universe.application_by_identifier("acme-cad").is_some());
}

#[test]
fn deleting_a_context_cascades_to_representations() {
    let mut universe = Universe::default();
    let context = add(&mut universe, context());
    let item = add(&mut universe, point());
    let representation = add(
        &mut universe,
        Representation {
            items: BTreeSet::from([item]),
            ..Representation::new(context)
        },
    );
    let product_representation = add(
        &mut universe,
        ProductRepresentation {
            representations: vec![representation],
            ..ProductRepresentation::default()
        },
    );
    let tower = project(&mut universe, contexts([context]));

    let change = universe.delete(context).unwrap();

    assert_eq!(
        change.deleted_keys().collect::<Vec<_>>(),
        [context.key(), representation.key()]
    );
    assert!(
        universe
            .get::<ProductRepresentation>(product_representation)
            .unwrap()
            .representations
            .is_empty()
    );
    assert!(
        entity(&universe, tower)
            .project()
            .unwrap()
            .representation_contexts
            .is_empty()
    );
    assert!(universe.get::<RepresentationItem>(item).is_some());
}

#[test]
fn deleting_a_grid_cascades_to_grid_placements() {
    let mut universe = Universe::default();
    let grid = project_grid(&mut universe);
    let on_grid = add(
        &mut universe,
        ObjectPlacement::grid(ident("G1"), grid, label("A/1")),
    );
    let column = product(
        &mut universe,
        "Column",
        ProductDraft {
            object_placement: Some(on_grid),
            representation: None,
        },
    );

    let change = universe.delete(grid).unwrap();

    assert_eq!(
        change.deleted_keys().collect::<Vec<_>>(),
        [grid.key(), on_grid.key()]
    );
    assert_eq!(
        entity(&universe, column).product().unwrap().object_placement,
        None
    );
    assert_eq!(universe.placement_by_id("G1"), None);
    assert_eq!(universe.records::<GridAxis>().count(), 1);
}

#[test]
fn deleting_a_parent_placement_is_rejected_by_default() {
    let mut universe = Universe::default();
    let parent = local(&mut universe, "P", None);
    let child = local(&mut universe, "C", Some(parent));
    let revision = universe.revision();

    let err = universe.delete(parent).unwrap_err();

    assert_eq!(
        err,
        Error::Integrity(IntegrityError::Referenced {
            target: parent.key(),
            by: vec![child.key()],
        })
    );
    assert_eq!(universe.revision(), revision);
    assert_eq!(universe.placement_ancestors(child), [parent]);
}

#[test]
fn deleting_a_parent_placement_can_reroot_children() {
    let mut config = Config::default();
    config.placement_delete_policy = PlacementDeletePolicy::Reroot;
    let mut universe = Universe::new(config);

    let parent = local(&mut universe, "P", None);
    let child = local(&mut universe, "C", Some(parent));
    let grandchild = local(&mut universe, "GC", Some(child));
    let column = product(
        &mut universe,
        "Column",
        ProductDraft {
            object_placement: Some(parent),
            representation: None,
        },
    );

    let change = universe.delete(parent).unwrap();

    assert!(change.effects().contains(&Effect::Updated(child.key())));
    assert!(change.effects().contains(&Effect::Updated(column.key())));
    let child_record = universe.get::<ObjectPlacement>(child).unwrap();
    assert_eq!(child_record.relative_placement(), None);
    assert_eq!(universe.placement_ancestors(grandchild), [child]);
    assert_eq!(universe.placement_children(child), [grandchild]);
    assert_eq!(
        entity(&universe, column).product().unwrap().object_placement,
        None
    );

    // the rerooted child can take a new parent
    let new_parent = local(&mut universe, "N", None);
    universe.set_relative_placement(child, Some(new_parent)).unwrap();
    assert_eq!(universe.placement_ancestors(grandchild), [child, new_parent]);
}

#[test]
fn unit_assignment_in_use_cannot_be_deleted() {
    let mut universe = Universe::default();
    let millimetre = add(
        &mut universe,
        Unit::Length {
            unit_name: label("millimetre"),
        },
    );
    let second = add(
        &mut universe,
        Unit::Named {
            unit_type: UnitType::TimeUnit,
            name: Some(label("second")),
        },
    );
    let assignment = add(
        &mut universe,
        UnitAssignment {
            units: BTreeSet::from([
                UnitSelect::LengthUnit(millimetre),
                UnitSelect::NamedUnit(second),
            ]),
        },
    );
    let tower = project(
        &mut universe,
        Specialization::Project {
            long_name: Some("Tower A".to_string()),
            phase: None,
            units_in_context: Some(assignment),
            representation_contexts: BTreeSet::new(),
        },
    );

    let err = universe.delete(assignment).unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::Referenced {
            target: assignment.key(),
            by: vec![tower.key()],
        })
    );

    // deleting a unit only removes it from the assignment
    universe.delete(second).unwrap();
    assert_eq!(
        universe.get::<UnitAssignment>(assignment).unwrap().units,
        BTreeSet::from([UnitSelect::LengthUnit(millimetre)])
    );

    universe.delete(tower).unwrap();
    universe.delete(assignment).unwrap();
}

#[test]
fn unit_selects_match_the_unit_kind() {
    let mut universe = Universe::default();
    let millimetre = add(
        &mut universe,
        Unit::Length {
            unit_name: label("millimetre"),
        },
    );

    let err = universe
        .insert(UnitAssignment {
            units: BTreeSet::from([UnitSelect::NamedUnit(millimetre)]),
        })
        .unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::WrongKind {
            key: millimetre.key(),
            expected: "IfcNamedUnit",
        })
    );

    add(
        &mut universe,
        UnitAssignment {
            units: BTreeSet::from([UnitSelect::LengthUnit(millimetre)]),
        },
    );
    let err = universe
        .update(millimetre, |unit: &mut Unit| {
            *unit = Unit::Named {
                unit_type: UnitType::LengthUnit,
                name: None,
            };
        })
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Integrity(IntegrityError::Referenced { .. })
    ));
}

#[test]
fn grid_axis_curve_must_be_a_curve() {
    let mut universe = Universe::default();
    let dot = add(&mut universe, point());
    let err = universe
        .insert(GridAxis {
            axis_curve: Some(dot),
            ..GridAxis::new(label("A"))
        })
        .unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::WrongKind {
            key: dot.key(),
            expected: "IfcCurve",
        })
    );

    let curve = add(&mut universe, line());
    let axis = add(
        &mut universe,
        GridAxis {
            axis_curve: Some(curve),
            ..GridAxis::new(label("A"))
        },
    );

    let err = universe
        .update(curve, |item: &mut RepresentationItem| *item = point())
        .unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::Referenced {
            target: curve.key(),
            by: vec![axis.key()],
        })
    );

    universe.delete(curve).unwrap();
    assert_eq!(universe.get::<GridAxis>(axis).unwrap().axis_curve, None);
}

#[test]
fn deleting_an_axis_removes_it_from_the_grid() {
    let mut universe = Universe::default();
    let grid = project_grid(&mut universe);
    let axis = entity(&universe, grid).grid().unwrap().axes().next().unwrap();

    let change = universe.delete(axis).unwrap();

    assert!(change.effects().contains(&Effect::Updated(grid.key())));
    assert_eq!(entity(&universe, grid).grid().unwrap().axes().count(), 0);
}

#[test]
fn roles_and_addresses_are_association_rows() {
    let mut universe = Universe::default();
    let role = add(&mut universe, ActorRole::new(Role::Architect));
    let address = add(&mut universe, Address::default());
    let john = add(
        &mut universe,
        Person {
            roles: BTreeSet::from([role]),
            addresses: BTreeSet::from([address]),
            ..person("John", "Smith")
        },
    );

    universe.delete(role).unwrap();
    universe.delete(address).unwrap();

    let john = universe.get::<Person>(john).unwrap();
    assert!(john.roles.is_empty());
    assert!(john.addresses.is_empty());
}

#[test]
fn user_defined_convention_is_soft_by_default() {
    let misplaced = ActorRole {
        role: Role::Architect,
        user_defined_role: Some(label("Lighting designer")),
        description: None,
    };

    let mut lenient = Universe::default();
    assert!(lenient.insert(misplaced.clone()).is_ok());

    let mut config = Config::default();
    config.strict_user_defined = true;
    let mut strict = Universe::new(config);
    let err = strict.insert(misplaced).unwrap_err();
    assert_eq!(
        err,
        Error::Validation(ValidationError::UserDefinedMismatch {
            field: "UserDefinedRole"
        })
    );
    assert_eq!(err.kind(), crate::domain::ErrorKind::Validation);

    assert!(
        strict
            .insert(ActorRole::user_defined(label("Lighting designer")))
            .is_ok()
    );
}

#[test]
fn locked_history_rejects_other_users() {
    let mut universe = Universe::default();
    let (_, _, alice) = staff(&mut universe, "Alice");
    let (_, _, bob) = staff(&mut universe, "Bob");
    let history = add(
        &mut universe,
        OwnerHistory::created(
            Some(alice),
            None,
            State::ReadWriteLocked,
            Timestamp::from_seconds(0),
        ),
    );
    let wall = universe
        .create_entity(
            RootDraft::new().with_name("Wall").with_owner_history(history),
            Specialization::Object { object_type: None },
        )
        .unwrap()
        .0;
    let revision = universe.revision();

    let err = universe
        .touch(wall, Modification::modified(bob, Timestamp::from_seconds(10)))
        .unwrap_err();
    assert_eq!(
        err,
        Error::State(StateError::EntityLocked {
            history,
            state: State::ReadWriteLocked,
        })
    );
    assert_eq!(universe.revision(), revision);

    let change = universe
        .touch(wall, Modification::modified(alice, Timestamp::from_seconds(10)))
        .unwrap();
    assert_eq!(change.effects(), [Effect::Updated(history.key())]);
    let record = universe.get::<OwnerHistory>(history).unwrap();
    assert_eq!(record.modification_user(), Some(alice));
    assert_eq!(record.last_modified_date(), Timestamp::from_seconds(10));
    assert_eq!(record.change_action(), ChangeAction::Modified);
}

#[test]
fn touching_an_entity_without_history_does_nothing() {
    let mut universe = Universe::default();
    let (_, _, alice) = staff(&mut universe, "Alice");
    let wall = product(&mut universe, "Wall", ProductDraft::default());
    let revision = universe.revision();

    let change = universe
        .touch(wall, Modification::modified(alice, Timestamp::from_seconds(1)))
        .unwrap();

    assert!(change.is_empty());
    assert_eq!(universe.revision(), revision);
}

#[test]
fn modifications_need_a_known_actor() {
    let mut universe = Universe::default();
    let history = add(
        &mut universe,
        OwnerHistory::created(None, None, State::ReadWrite, Timestamp::from_seconds(0)),
    );
    let stranger = PersonAndOrganizationId::from_raw(99);

    let err = universe
        .record_modification(
            history,
            Modification::modified(stranger, Timestamp::from_seconds(1)),
        )
        .unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::DanglingReference(stranger.key()))
    );
}

#[test]
fn actor_select_may_dangle_after_delete() {
    let mut universe = Universe::default();
    let john = add(&mut universe, person("John", "Smith"));
    let actor = universe
        .create_entity(
            RootDraft::new().with_name("Site manager"),
            Specialization::Actor {
                object_type: None,
                the_actor: ActorSelect::Person(john),
            },
        )
        .unwrap()
        .0;
    assert!(matches!(
        universe.resolve_actor(ActorSelect::Person(john)),
        Ok(ActorRef::Person(_))
    ));

    universe.delete(john).unwrap();
    assert!(universe.get::<Entity>(actor).is_some());
    assert_eq!(
        universe
            .resolve_actor(ActorSelect::Person(john))
            .unwrap_err(),
        IntegrityError::DanglingReference(john.key())
    );

    // other fields can still be edited
    universe
        .update(actor, |entity: &mut Entity| {
            entity.root_mut().name = Some(label("Foreman"));
        })
        .unwrap();

    // but a new select must resolve
    let missing = OrganizationId::from_raw(1000);
    let err = universe
        .update(actor, |entity: &mut Entity| {
            if let Entity::Actor(actor) = entity {
                actor.the_actor = ActorSelect::Organization(missing);
            }
        })
        .unwrap_err();
    assert_eq!(
        err,
        Error::Integrity(IntegrityError::DanglingReference(missing.key()))
    );
}

#[test]
fn entity_identity_is_immutable() {
    let mut universe = Universe::default();
    let wall = product(&mut universe, "Wall", ProductDraft::default());
    let other = specialize(
        RootDraft::new().with_name("Wall"),
        Specialization::Product(ProductDraft::default()),
    )
    .unwrap();

    let err = universe
        .update(wall, |entity: &mut Entity| *entity = other)
        .unwrap_err();
    assert_eq!(
        err,
        Error::State(StateError::Immutable {
            key: wall.key(),
            field: "GlobalId",
        })
    );

    let guid = entity(&universe, wall).global_id().to_string();
    let retyped = specialize(
        RootDraft {
            global_id: Some(guid),
            name: Some("Wall".to_string()),
            ..RootDraft::default()
        },
        Specialization::Object { object_type: None },
    )
    .unwrap();
    let err = universe
        .update(wall, |entity: &mut Entity| *entity = retyped)
        .unwrap_err();
    assert_eq!(
        err,
        Error::State(StateError::Immutable {
            key: wall.key(),
            field: "entity type",
        })
    );
}

#[test]
fn deleting_a_missing_record_fails() {
    let mut universe = Universe::default();
    let missing = EntityId::from_raw(7);
    assert_eq!(
        universe.delete(missing).unwrap_err(),
        Error::Integrity(IntegrityError::DanglingReference(missing.key()))
    );
}

#[test]
fn ids_are_unique_across_record_types() {
    let mut universe = Universe::default();
    let person = add(&mut universe, Person::default());
    let organization = add(&mut universe, Organization::default());
    assert_ne!(person.get(), organization.get());
    assert!(universe.contains(person.key()));
    assert!(!universe.contains(RecordKey::new(RecordType::Person, organization.get())));
}

#[test]
fn describes_records() {
    let mut universe = Universe::default();
    let (_, organization, pair) = staff(&mut universe, "John");
    universe
        .update(organization, |organization: &mut Organization| {
            organization.name = Some(label("Acme"));
        })
        .unwrap();
    let application = add(
        &mut universe,
        Application {
            developer: Some(organization),
            full_name: Some(label("Revit")),
            version: Some(label("2024")),
            ..Application::default()
        },
    );
    let history = add(
        &mut universe,
        OwnerHistory::created(
            Some(pair),
            Some(application),
            State::ReadWrite,
            Timestamp::from_seconds(1_704_164_645),
        ),
    );
    let anonymous = add(&mut universe, Application::default());
    let root = local(&mut universe, "P1", None);
    let child = local(&mut universe, "P2", Some(root));
    let grid = project_grid(&mut universe);
    let on_grid = add(
        &mut universe,
        ObjectPlacement::grid(ident("G1"), grid, label("A/1")),
    );
    let column = product(
        &mut universe,
        "Column",
        ProductDraft {
            object_placement: Some(root),
            representation: None,
        },
    );
    let assignment = add(&mut universe, UnitAssignment::default());

    let describe = |key: RecordKey| universe.describe(key).unwrap();
    assert_eq!(describe(pair.key()), "John Smith at Acme");
    assert_eq!(describe(application.key()), "Revit 2024 by Acme");
    assert_eq!(
        describe(anonymous.key()),
        "Unnamed Application v. Unknown by Unknown Developer"
    );
    assert_eq!(
        describe(history.key()),
        "John Smith at Acme on 2024-01-02 03:04:05"
    );
    assert_eq!(
        describe(root.key()),
        "Local Placement ID P1 (with no relative placement)"
    );
    assert_eq!(
        describe(child.key()),
        "Local Placement ID P2 (relative to: P1)"
    );
    assert_eq!(describe(on_grid.key()), "Grid 1 at A/1");
    assert_eq!(
        describe(column.key()),
        "Column - Placement: Local Placement ID P1 (with no relative placement), Representation: None"
    );
    assert_eq!(
        describe(assignment.key()),
        format!("Unit Assignment {}", assignment.get())
    );

    assert_eq!(
        universe.describe(RecordKey::new(RecordType::Unit, 999)),
        Err(IntegrityError::DanglingReference(RecordKey::new(
            RecordType::Unit,
            999
        )))
    );
}

#[test]
fn save_and_load_round_trip() {
    let mut universe = Universe::default();
    let (_, _, pair) = staff(&mut universe, "John");
    let history = add(
        &mut universe,
        OwnerHistory::created(Some(pair), None, State::ReadWrite, Timestamp::from_seconds(5)),
    );
    let root = local(&mut universe, "P1", None);
    let child = local(&mut universe, "P2", Some(root));
    let wall = universe
        .create_entity(
            RootDraft::new().with_name("Wall").with_owner_history(history),
            Specialization::Product(ProductDraft {
                object_placement: Some(child),
                representation: None,
            }),
        )
        .unwrap()
        .0;

    let mut store = MemoryStore::new();
    universe.save(&mut store).unwrap();
    assert_eq!(store.len(), universe.len());

    let mut loaded = Universe::load(&store, Config::default()).unwrap();
    assert_eq!(loaded.to_json().unwrap(), universe.to_json().unwrap());
    assert_eq!(loaded.placement_ancestors(child), [root]);
    assert_eq!(
        loaded.entity_by_global_id(entity(&universe, wall).global_id()),
        Some(wall)
    );

    // indices were rebuilt, so duplicates are still caught
    assert!(loaded.insert(ObjectPlacement::local(ident("P1"), None)).is_err());
    // and new ids do not collide with loaded ones
    let fresh = local(&mut loaded, "P3", None);
    assert!(fresh.get() > wall.get());
}

#[test]
fn persist_follows_changes() {
    let mut universe = Universe::default();
    let mut store = MemoryStore::new();

    let representation = add(&mut universe, ProductRepresentation::default());
    universe.save(&mut store).unwrap();

    let (column, change) = universe
        .create_entity(
            RootDraft::new().with_name("Column"),
            Specialization::Product(ProductDraft {
                object_placement: None,
                representation: Some(representation),
            }),
        )
        .unwrap();
    universe.persist(&change, &mut store).unwrap();

    let change = universe.delete(representation).unwrap();
    universe.persist(&change, &mut store).unwrap();

    assert_eq!(store.get(representation.key()).unwrap(), None);
    let Some(Record::Entity(stored)) = store.get(column.key()).unwrap() else {
        panic!("column should be stored");
    };
    assert_eq!(stored.product().unwrap().representation, None);
}

#[test]
fn corrupt_store_is_rejected() {
    let guid = Guid::generate();
    let wall = |name: &str| {
        specialize(
            RootDraft {
                global_id: Some(guid.to_string()),
                name: Some(name.to_string()),
                ..RootDraft::default()
            },
            Specialization::Object { object_type: None },
        )
        .unwrap()
    };

    let mut store = MemoryStore::new();
    store
        .put(RecordKey::new(RecordType::Entity, 1), wall("A").into())
        .unwrap();
    store
        .put(RecordKey::new(RecordType::Entity, 2), wall("B").into())
        .unwrap();

    let err = Universe::load(&store, Config::default()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid(Error::Integrity(IntegrityError::DuplicateKey {
            index: IndexKind::GlobalId,
            ..
        }))
    ));
}

#[test]
fn stored_placement_cycle_is_rejected() {
    let a = PlacementId::from_raw(1);
    let b = PlacementId::from_raw(2);
    let mut store = MemoryStore::new();
    store
        .put(a.key(), ObjectPlacement::local(ident("A"), Some(b)).into())
        .unwrap();
    store
        .put(b.key(), ObjectPlacement::local(ident("B"), Some(a)).into())
        .unwrap();

    let err = Universe::load(&store, Config::default()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid(Error::Integrity(
            IntegrityError::PlacementCycleDetected { .. }
        ))
    ));
}

#[test]
fn mismatched_store_key_is_rejected() {
    let mut store = MemoryStore::new();
    let key = RecordKey::new(RecordType::Person, 1);
    store.put(key, Organization::default().into()).unwrap();

    let err = Universe::load(&store, Config::default()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Mismatch {
            found: RecordType::Organization,
            ..
        }
    ));
}
