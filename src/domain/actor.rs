//! Actors: people, organizations, the roles they play and their addresses.
//!
//! These records are not Root-derived. They carry no GUID or owner history
//! and are identified within the universe by their handle alone.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::domain::{
    enums::{AddressType, Role},
    error::IntegrityError,
    handle::{AddressId, OrganizationId, PersonAndOrganizationId, PersonId, RecordKey, RoleId},
    measure::{Identifier, Label, Text},
};

/// `IfcActorRole`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRole {
    /// The classified role.
    pub role: Role,
    /// Free-form role name. Only meaningful when `role` is
    /// [`Role::UserDefined`].
    pub user_defined_role: Option<Label>,
    /// Further description of the role.
    pub description: Option<Text>,
}

impl ActorRole {
    /// A role with no user-defined name or description.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }

    /// A `USERDEFINED` role with the given name.
    #[must_use]
    pub fn user_defined(name: Label) -> Self {
        Self {
            role: Role::UserDefined,
            user_defined_role: Some(name),
            description: None,
        }
    }

    /// The name of the user-defined field, if it is set without the
    /// `USERDEFINED` classification.
    pub(crate) fn misplaced_user_defined_field(&self) -> Option<&'static str> {
        (self.user_defined_role.is_some() && self.role != Role::UserDefined)
            .then_some("UserDefinedRole")
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.user_defined_role {
            Some(name) => write!(f, "{name} ({})", self.role),
            None => write!(f, "{}", self.role),
        }
    }
}

/// `IfcAddress`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// What the address is used for.
    pub purpose: AddressType,
    /// Free text, typically the postal or telecom details.
    pub description: Option<Text>,
    /// Free-form purpose. Only meaningful when `purpose` is
    /// [`AddressType::UserDefined`].
    pub user_defined_purpose: Option<Label>,
}

impl Address {
    /// An address with the given purpose and description.
    #[must_use]
    pub fn new(purpose: AddressType, description: Option<Text>) -> Self {
        Self {
            purpose,
            description,
            user_defined_purpose: None,
        }
    }

    pub(crate) fn misplaced_user_defined_field(&self) -> Option<&'static str> {
        (self.user_defined_purpose.is_some() && self.purpose != AddressType::UserDefined)
            .then_some("UserDefinedPurpose")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.description {
            Some(description) if description.chars().count() > 50 => {
                let head: String = description.chars().take(50).collect();
                write!(f, "{}: {head}...", self.purpose)
            }
            Some(description) => write!(f, "{}: {description}", self.purpose),
            None => write!(f, "{}", self.purpose),
        }
    }
}

/// `IfcPerson`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Identification of the person. Unique across people when present.
    pub identifier: Option<Identifier>,
    /// Family name.
    pub family_name: Option<Label>,
    /// Given name.
    pub first_name: Option<Label>,
    /// Middle names, space separated.
    pub middle_names: Option<Label>,
    /// Titles preceding the name, e.g. "Dr.".
    pub prefix_titles: Option<Label>,
    /// Titles following the name, e.g. "PhD".
    pub suffix_titles: Option<Label>,
    /// Roles played by the person.
    pub roles: BTreeSet<RoleId>,
    /// Postal and telecom addresses.
    pub addresses: BTreeSet<AddressId>,
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts = [
            &self.prefix_titles,
            &self.first_name,
            &self.middle_names,
            &self.family_name,
            &self.suffix_titles,
        ];
        let name = parts
            .into_iter()
            .flatten()
            .map(Label::as_str)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&name)
    }
}

/// `IfcOrganization`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Identification of the organization. Unique across organizations when
    /// present.
    pub identifier: Option<Identifier>,
    /// The organization's name.
    pub name: Option<Label>,
    /// Free text.
    pub description: Option<Text>,
    /// Roles played by the organization.
    pub roles: BTreeSet<RoleId>,
    /// Postal and telecom addresses.
    pub addresses: BTreeSet<AddressId>,
}

impl Organization {
    /// An organization with just a name.
    #[must_use]
    pub fn named(name: Label) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.name {
            Some(name) if !name.is_empty() => f.write_str(name),
            _ => f.write_str("Unnamed Organization"),
        }
    }
}

/// `IfcPersonAndOrganization`: a person acting on behalf of an organization.
///
/// The `(person, organization)` pair is unique within the universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonAndOrganization {
    /// The person.
    pub person: PersonId,
    /// The organization.
    pub organization: OrganizationId,
    /// Roles played by the person in the context of the organization.
    pub roles: BTreeSet<RoleId>,
}

impl PersonAndOrganization {
    /// Pairs a person with an organization, with no roles.
    #[must_use]
    pub const fn new(person: PersonId, organization: OrganizationId) -> Self {
        Self {
            person,
            organization,
            roles: BTreeSet::new(),
        }
    }

    /// The uniqueness key.
    #[must_use]
    pub const fn pair(&self) -> (PersonId, OrganizationId) {
        (self.person, self.organization)
    }
}

/// `IfcApplication`: the software that last touched an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// The organization that develops the application. Cleared if the
    /// organization is deleted.
    pub developer: Option<OrganizationId>,
    /// The full name of the application.
    pub full_name: Option<Label>,
    /// Short identifier. Unique across applications when present.
    pub identifier: Option<Identifier>,
    /// The version string.
    pub version: Option<Label>,
}

/// `IfcActorSelect`: a reference to exactly one kind of actor.
///
/// Serialized as an adjacently tagged `{ "type": ..., "id": ... }` pair, with
/// the lowercase IFC entity name as the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum ActorSelect {
    /// An `IfcOrganization`.
    #[serde(rename = "ifcorganization")]
    Organization(OrganizationId),
    /// An `IfcPerson`.
    #[serde(rename = "ifcperson")]
    Person(PersonId),
    /// An `IfcPersonAndOrganization`.
    #[serde(rename = "ifcpersonandorganization")]
    PersonAndOrganization(PersonAndOrganizationId),
}

impl ActorSelect {
    /// The IFC name of the select type.
    pub const IFC_NAME: &'static str = "IfcActorSelect";

    /// The type tags accepted by [`ActorSelect::from_tagged`].
    pub const TAGS: &'static [&'static str] =
        &["ifcorganization", "ifcperson", "ifcpersonandorganization"];

    /// Resolves an untyped `(type tag, id)` pair, as produced by importers.
    ///
    /// Tags are matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::InvalidSelectTarget`] if the tag does not
    /// name one of the three actor kinds.
    pub fn from_tagged(tag: &str, id: u64) -> Result<Self, IntegrityError> {
        match tag.to_ascii_lowercase().as_str() {
            "ifcorganization" => Ok(Self::Organization(OrganizationId::from_raw(id))),
            "ifcperson" => Ok(Self::Person(PersonId::from_raw(id))),
            "ifcpersonandorganization" => Ok(Self::PersonAndOrganization(
                PersonAndOrganizationId::from_raw(id),
            )),
            _ => Err(IntegrityError::InvalidSelectTarget {
                select: Self::IFC_NAME,
                tag: tag.to_string(),
            }),
        }
    }

    /// The type tag of the selected kind.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Organization(_) => "ifcorganization",
            Self::Person(_) => "ifcperson",
            Self::PersonAndOrganization(_) => "ifcpersonandorganization",
        }
    }

    /// The selected record.
    #[must_use]
    pub const fn key(self) -> RecordKey {
        match self {
            Self::Organization(id) => id.key(),
            Self::Person(id) => id.key(),
            Self::PersonAndOrganization(id) => id.key(),
        }
    }
}

impl From<PersonId> for ActorSelect {
    fn from(id: PersonId) -> Self {
        Self::Person(id)
    }
}

impl From<OrganizationId> for ActorSelect {
    fn from(id: OrganizationId) -> Self {
        Self::Organization(id)
    }
}

impl From<PersonAndOrganizationId> for ActorSelect {
    fn from(id: PersonAndOrganizationId) -> Self {
        Self::PersonAndOrganization(id)
    }
}

/// An actor resolved through an [`ActorSelect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRef<'a> {
    /// A person.
    Person(&'a Person),
    /// An organization.
    Organization(&'a Organization),
    /// A person acting for an organization.
    PersonAndOrganization(&'a PersonAndOrganization),
}
