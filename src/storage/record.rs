use serde::{Deserialize, Serialize};

use crate::domain::{
    ActorRole, Address, AddressId, Application, ApplicationId, ContextId, Entity, EntityId,
    GridAxis, GridAxisId, ItemId, ObjectPlacement, Organization, OrganizationId, OwnerHistory,
    OwnerHistoryId, Person, PersonAndOrganization, PersonAndOrganizationId, PersonId, PlacementId,
    ProductRepresentation, ProductRepresentationId, RecordType, Representation,
    RepresentationContext, RepresentationId, RepresentationItem, RoleId, Unit, UnitAssignment,
    UnitAssignmentId, UnitId, Universe,
};

macro_rules! records {
    ($($variant:ident($record:ident, $id:ident)),+ $(,)?) => {
        /// Any record, tagged with its type.
        ///
        /// This is the unit of persistence exchanged with a
        /// [`RecordStore`](crate::storage::RecordStore).
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "record", rename_all = "snake_case")]
        pub enum Record {
            $(
                #[doc = concat!("A [`", stringify!($record), "`].")]
                $variant($record),
            )+
        }

        impl Record {
            /// The type of the record.
            #[must_use]
            pub const fn record_type(&self) -> RecordType {
                match self {
                    $(Self::$variant(_) => RecordType::$variant,)+
                }
            }

            /// Puts the record into `universe` under `id`, without checks.
            pub(crate) fn restore(self, id: u64, universe: &mut Universe) {
                match self {
                    $(Self::$variant(record) => universe.restore($id::from_raw(id), record),)+
                }
            }
        }

        $(
            impl From<$record> for Record {
                fn from(record: $record) -> Self {
                    Self::$variant(record)
                }
            }
        )+
    };
}

records! {
    Entity(Entity, EntityId),
    Person(Person, PersonId),
    Organization(Organization, OrganizationId),
    PersonAndOrganization(PersonAndOrganization, PersonAndOrganizationId),
    ActorRole(ActorRole, RoleId),
    Address(Address, AddressId),
    Application(Application, ApplicationId),
    OwnerHistory(OwnerHistory, OwnerHistoryId),
    Placement(ObjectPlacement, PlacementId),
    ProductRepresentation(ProductRepresentation, ProductRepresentationId),
    Representation(Representation, RepresentationId),
    RepresentationContext(RepresentationContext, ContextId),
    RepresentationItem(RepresentationItem, ItemId),
    GridAxis(GridAxis, GridAxisId),
    Unit(Unit, UnitId),
    UnitAssignment(UnitAssignment, UnitAssignmentId),
}
