//! Human-readable descriptions of records.
//!
//! Most records render through their own [`Display`](std::fmt::Display).
//! The ones below read referenced records, so they are rendered here.
//! Descriptions are for people only, never an identity.

use super::Universe;
use crate::domain::{
    actor::{ActorRole, Address, Application, Organization, Person, PersonAndOrganization},
    entity::Entity,
    error::IntegrityError,
    handle::{
        AddressId, ApplicationId, ContextId, EntityId, GridAxisId, ItemId, OrganizationId,
        OwnerHistoryId, PersonAndOrganizationId, PersonId, PlacementId, ProductRepresentationId,
        RecordKey, RecordType, RepresentationId, RoleId, UnitAssignmentId, UnitId,
    },
    measure::Label,
    owner_history::OwnerHistory,
    placement::{ObjectPlacement, PlacementKind},
    representation::{
        GridAxis, ProductRepresentation, Representation, RepresentationContext,
        RepresentationItem,
    },
    unit::{Unit, UnitAssignment},
};

impl Universe {
    /// Describes a record for display.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::DanglingReference`] if the record does not
    /// exist. References from the record to missing records are rendered
    /// with a placeholder instead.
    pub fn describe(&self, key: RecordKey) -> Result<String, IntegrityError> {
        let id = key.id;
        Ok(match key.record_type {
            RecordType::Entity => self.describe_entity(EntityId::from_raw(id))?,
            RecordType::Person => self.require::<Person>(PersonId::from_raw(id))?.to_string(),
            RecordType::Organization => self
                .require::<Organization>(OrganizationId::from_raw(id))?
                .to_string(),
            RecordType::PersonAndOrganization => {
                self.describe_pair(PersonAndOrganizationId::from_raw(id))?
            }
            RecordType::ActorRole => self.require::<ActorRole>(RoleId::from_raw(id))?.to_string(),
            RecordType::Address => self.require::<Address>(AddressId::from_raw(id))?.to_string(),
            RecordType::Application => {
                self.describe_application(self.require::<Application>(ApplicationId::from_raw(id))?)
            }
            RecordType::OwnerHistory => {
                self.describe_history(self.require::<OwnerHistory>(OwnerHistoryId::from_raw(id))?)
            }
            RecordType::Placement => self.describe_placement(PlacementId::from_raw(id))?,
            RecordType::ProductRepresentation => self
                .require::<ProductRepresentation>(ProductRepresentationId::from_raw(id))?
                .to_string(),
            RecordType::Representation => {
                self.require::<Representation>(RepresentationId::from_raw(id))?.to_string()
            }
            RecordType::RepresentationContext => {
                self.require::<RepresentationContext>(ContextId::from_raw(id))?.to_string()
            }
            RecordType::RepresentationItem => {
                self.require::<RepresentationItem>(ItemId::from_raw(id))?.to_string()
            }
            RecordType::GridAxis => self.require::<GridAxis>(GridAxisId::from_raw(id))?.to_string(),
            RecordType::Unit => self.require::<Unit>(UnitId::from_raw(id))?.to_string(),
            RecordType::UnitAssignment => {
                let id = UnitAssignmentId::from_raw(id);
                self.require::<UnitAssignment>(id)?;
                format!("Unit Assignment {}", id.get())
            }
        })
    }

    fn describe_entity(&self, id: EntityId) -> Result<String, IntegrityError> {
        let entity = self.require::<Entity>(id)?;
        let Some(product) = entity.product() else {
            return Ok(entity.to_string());
        };
        let placement = product
            .object_placement
            .and_then(|placement| self.describe_placement(placement).ok())
            .unwrap_or_else(|| "None".to_string());
        let representation = product
            .representation
            .and_then(|representation| self.get::<ProductRepresentation>(representation))
            .map_or_else(|| "None".to_string(), ToString::to_string);
        Ok(format!(
            "{entity} - Placement: {placement}, Representation: {representation}"
        ))
    }

    fn describe_pair(&self, id: PersonAndOrganizationId) -> Result<String, IntegrityError> {
        let pair = self.require::<PersonAndOrganization>(id)?;
        let person = self
            .get::<Person>(pair.person)
            .map_or_else(|| "Unknown Person".to_string(), ToString::to_string);
        let organization = self
            .get::<Organization>(pair.organization)
            .map_or_else(|| "Unnamed Organization".to_string(), ToString::to_string);
        Ok(format!("{person} at {organization}"))
    }

    fn describe_application(&self, application: &Application) -> String {
        let name = application
            .full_name
            .as_ref()
            .map_or("Unnamed Application", Label::as_str);
        let version = application
            .version
            .as_ref()
            .map_or("v. Unknown", Label::as_str);
        let developer = application
            .developer
            .and_then(|developer| self.get::<Organization>(developer))
            .map_or_else(|| "Unknown Developer".to_string(), ToString::to_string);
        format!("{name} {version} by {developer}")
    }

    fn describe_history(&self, history: &OwnerHistory) -> String {
        let user = history
            .creation_user()
            .and_then(|user| self.describe_pair(user).ok())
            .unwrap_or_else(|| "Unknown User".to_string());
        format!("{user} on {}", history.creation_date())
    }

    fn describe_placement(&self, id: PlacementId) -> Result<String, IntegrityError> {
        let placement = self.require::<ObjectPlacement>(id)?;
        Ok(match &placement.kind {
            PlacementKind::Local(local) => {
                let parent = local
                    .relative_placement
                    .and_then(|parent| self.get::<ObjectPlacement>(parent));
                match parent {
                    Some(parent) => format!(
                        "Local Placement ID {} (relative to: {})",
                        placement.placement_id, parent.placement_id
                    ),
                    None => format!(
                        "Local Placement ID {} (with no relative placement)",
                        placement.placement_id
                    ),
                }
            }
            PlacementKind::Grid(grid) => {
                let grid_name = self
                    .get::<Entity>(grid.grid)
                    .and_then(|entity| entity.root().name.as_ref())
                    .map_or("Unnamed Grid", Label::as_str);
                format!("{grid_name} at {}", grid.placement_location)
            }
        })
    }
}
