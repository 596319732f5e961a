//! IFC kernel: validated entities and relationship integrity
//!
//! A strongly typed model of a subset of the Industry Foundation Classes
//! schema. Records live in a [`Universe`], which enforces uniqueness,
//! referential integrity, placement tree shape, deletion policies and owner
//! history locking. Every rejected mutation leaves the universe unchanged.

pub mod domain;
pub use domain::{
    ActorRole, ActorSelect, Address, Application, Change, Config, Entity, EntityId, Error,
    GridAxis, Guid, IntegrityError, ObjectPlacement, Organization, OwnerHistory, Person,
    PersonAndOrganization, ProductRepresentation, RecordKey, RecordType, Representation,
    RepresentationContext, RepresentationItem, StateError, Unit, UnitAssignment, Universe,
    ValidationError,
};

/// Persistence of a universe to an external record store.
pub mod storage;
pub use storage::{LoadError, MemoryStore, Record, RecordStore};
