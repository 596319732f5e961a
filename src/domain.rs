//! Domain model of the IFC kernel.
//!
//! This module contains the value types, the enumerations, the records of
//! the entity universe, and the [`Universe`] that holds them and enforces the
//! integrity rules between them.

/// Validated primitive IFC measures (GUID, label, identifier, timestamp,
/// tri-state boolean).
pub mod measure;
pub use measure::{
    GUID_LENGTH, Guid, Identifier, Label, MAX_LABEL_LENGTH, Text, Timestamp, TriBoolean,
    validate_guid,
};

/// Closed IFC enumerations with their codes and display names.
pub mod enums;
pub use enums::{AddressType, ChangeAction, Role, State, UnitType, UnknownEnumCode};

mod error;
pub use error::{Error, ErrorKind, IntegrityError, StateError, ValidationError};

mod handle;
pub use handle::{
    AddressId, ApplicationId, ContextId, EntityId, GridAxisId, ItemId, OrganizationId,
    OwnerHistoryId, PersonAndOrganizationId, PersonId, PlacementId, ProductRepresentationId,
    RecordKey, RecordType, RepresentationId, RoleId, UnitAssignmentId, UnitId,
};

mod change;
pub use change::{Change, Effect, IndexKind};

mod config;
pub use config::{Config, ConfigError, PlacementDeletePolicy};

mod actor;
pub use actor::{
    ActorRef, ActorRole, ActorSelect, Address, Application, Organization, Person,
    PersonAndOrganization,
};

/// The Root-derived entity hierarchy.
pub mod entity;
pub use entity::{
    Entity, EntityType, ProductDraft, Root, RootDraft, Specialization, specialize,
};

mod owner_history;
pub use owner_history::{Lifecycle, Modification, OwnerHistory};

mod placement;
pub use placement::{GridPlacement, LocalPlacement, ObjectPlacement, PlacementKind};

mod representation;
pub use representation::{
    CartesianPoint, CoordinateSpaceDimension, Geometry, GridAxis, ProductRepresentation,
    Representation, RepresentationContext, RepresentationItem,
};

mod unit;
pub use unit::{Unit, UnitAssignment, UnitSelect};

mod universe;
pub use universe::{Stored, Universe};
