//! Stable numeric handles for the records held in a [`Universe`](crate::Universe).

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of record a handle points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A Root-derived entity (`IfcObject`, `IfcProduct`, `IfcGrid`, ...).
    Entity,
    /// `IfcPerson`.
    Person,
    /// `IfcOrganization`.
    Organization,
    /// `IfcPersonAndOrganization`.
    PersonAndOrganization,
    /// `IfcActorRole`.
    ActorRole,
    /// `IfcAddress`.
    Address,
    /// `IfcApplication`.
    Application,
    /// `IfcOwnerHistory`.
    OwnerHistory,
    /// `IfcObjectPlacement` (local or grid).
    Placement,
    /// `IfcProductRepresentation`.
    ProductRepresentation,
    /// `IfcRepresentation`.
    Representation,
    /// `IfcRepresentationContext`.
    RepresentationContext,
    /// `IfcRepresentationItem`.
    RepresentationItem,
    /// `IfcGridAxis`.
    GridAxis,
    /// `IfcNamedUnit`.
    Unit,
    /// `IfcUnitAssignment`.
    UnitAssignment,
}

impl RecordType {
    /// Every record type, ordered so that referenced records precede the
    /// records that reference them where such an order exists.
    pub const ALL: &'static [Self] = &[
        Self::ActorRole,
        Self::Address,
        Self::Person,
        Self::Organization,
        Self::PersonAndOrganization,
        Self::Application,
        Self::OwnerHistory,
        Self::RepresentationContext,
        Self::RepresentationItem,
        Self::Representation,
        Self::ProductRepresentation,
        Self::GridAxis,
        Self::Unit,
        Self::UnitAssignment,
        Self::Entity,
        Self::Placement,
    ];

    /// The IFC name of the record's (super)type.
    #[must_use]
    pub const fn ifc_name(self) -> &'static str {
        match self {
            Self::Entity => "IfcRoot",
            Self::Person => "IfcPerson",
            Self::Organization => "IfcOrganization",
            Self::PersonAndOrganization => "IfcPersonAndOrganization",
            Self::ActorRole => "IfcActorRole",
            Self::Address => "IfcAddress",
            Self::Application => "IfcApplication",
            Self::OwnerHistory => "IfcOwnerHistory",
            Self::Placement => "IfcObjectPlacement",
            Self::ProductRepresentation => "IfcProductRepresentation",
            Self::Representation => "IfcRepresentation",
            Self::RepresentationContext => "IfcRepresentationContext",
            Self::RepresentationItem => "IfcRepresentationItem",
            Self::GridAxis => "IfcGridAxis",
            Self::Unit => "IfcNamedUnit",
            Self::UnitAssignment => "IfcUnitAssignment",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.ifc_name())
    }
}

/// A type-erased handle: record type plus numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// The kind of record.
    pub record_type: RecordType,
    /// The numeric id, unique within the universe.
    pub id: u64,
}

impl RecordKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(record_type: RecordType, id: u64) -> Self {
        Self { record_type, id }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} #{}", self.record_type, self.id)
    }
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident => $record:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// The record type this handle addresses.
            pub const RECORD_TYPE: RecordType = RecordType::$record;

            /// Wraps a raw id, e.g. one read back from a persistence store.
            #[must_use]
            pub const fn from_raw(id: u64) -> Self {
                Self(id)
            }

            /// The raw numeric id.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            /// The type-erased key.
            #[must_use]
            pub const fn key(self) -> RecordKey {
                RecordKey::new(RecordType::$record, self.0)
            }
        }

        impl From<$name> for RecordKey {
            fn from(id: $name) -> Self {
                id.key()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

handle!(
    /// Handle to a Root-derived [`Entity`](crate::Entity).
    EntityId => Entity
);
handle!(
    /// Handle to a [`Person`](crate::Person).
    PersonId => Person
);
handle!(
    /// Handle to an [`Organization`](crate::Organization).
    OrganizationId => Organization
);
handle!(
    /// Handle to a [`PersonAndOrganization`](crate::PersonAndOrganization).
    PersonAndOrganizationId => PersonAndOrganization
);
handle!(
    /// Handle to an [`ActorRole`](crate::ActorRole).
    RoleId => ActorRole
);
handle!(
    /// Handle to an [`Address`](crate::Address).
    AddressId => Address
);
handle!(
    /// Handle to an [`Application`](crate::Application).
    ApplicationId => Application
);
handle!(
    /// Handle to an [`OwnerHistory`](crate::OwnerHistory).
    OwnerHistoryId => OwnerHistory
);
handle!(
    /// Handle to an [`ObjectPlacement`](crate::ObjectPlacement).
    PlacementId => Placement
);
handle!(
    /// Handle to a [`ProductRepresentation`](crate::ProductRepresentation).
    ProductRepresentationId => ProductRepresentation
);
handle!(
    /// Handle to a [`Representation`](crate::Representation).
    RepresentationId => Representation
);
handle!(
    /// Handle to a [`RepresentationContext`](crate::RepresentationContext).
    ContextId => RepresentationContext
);
handle!(
    /// Handle to a [`RepresentationItem`](crate::RepresentationItem).
    ItemId => RepresentationItem
);
handle!(
    /// Handle to a [`GridAxis`](crate::GridAxis).
    GridAxisId => GridAxis
);
handle!(
    /// Handle to a [`Unit`](crate::Unit).
    UnitId => Unit
);
handle!(
    /// Handle to a [`UnitAssignment`](crate::UnitAssignment).
    UnitAssignmentId => UnitAssignment
);
