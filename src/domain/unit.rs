//! Units and unit assignments.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::domain::{enums::UnitType, error::IntegrityError, handle::UnitId, measure::Label};

/// `IfcNamedUnit` and its length specialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Unit {
    /// A length unit such as "millimetre".
    Length {
        /// The unit's name.
        unit_name: Label,
    },
    /// Any other unit.
    Named {
        /// The quantity measured.
        unit_type: UnitType,
        /// The unit's name, if any.
        name: Option<Label>,
    },
}

impl Unit {
    /// The quantity this unit measures.
    #[must_use]
    pub const fn unit_type(&self) -> UnitType {
        match self {
            Self::Length { .. } => UnitType::LengthUnit,
            Self::Named { unit_type, .. } => *unit_type,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Length { unit_name } => f.write_str(unit_name),
            Self::Named {
                name: Some(name), ..
            } => f.write_str(name),
            Self::Named {
                unit_type,
                name: None,
            } => write!(f, "{unit_type}"),
        }
    }
}

/// A reference to a unit from a unit assignment.
///
/// The variant must match the kind of unit stored under the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum UnitSelect {
    /// A [`Unit::Length`].
    LengthUnit(UnitId),
    /// A [`Unit::Named`].
    NamedUnit(UnitId),
}

impl UnitSelect {
    /// The IFC name of the select type.
    pub const IFC_NAME: &'static str = "IfcUnit";

    /// The type tags accepted by [`UnitSelect::from_tagged`].
    pub const TAGS: &'static [&'static str] = &["ifclengthunit", "ifcnamedunit"];

    /// Resolves an untyped `(type tag, id)` pair. Tags are matched
    /// case-insensitively against [`UnitSelect::TAGS`].
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::InvalidSelectTarget`] for any other tag.
    pub fn from_tagged(tag: &str, id: u64) -> Result<Self, IntegrityError> {
        match tag.to_ascii_lowercase().as_str() {
            "ifclengthunit" => Ok(Self::LengthUnit(UnitId::from_raw(id))),
            "ifcnamedunit" => Ok(Self::NamedUnit(UnitId::from_raw(id))),
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
            Self::LengthUnit(_) => "ifclengthunit",
            Self::NamedUnit(_) => "ifcnamedunit",
        }
    }

    /// The unit referenced.
    #[must_use]
    pub const fn unit(self) -> UnitId {
        match self {
            Self::LengthUnit(id) | Self::NamedUnit(id) => id,
        }
    }

    /// Whether the variant agrees with the kind of `unit`.
    #[must_use]
    pub const fn matches(self, unit: &Unit) -> bool {
        matches!(
            (self, unit),
            (Self::LengthUnit(_), Unit::Length { .. }) | (Self::NamedUnit(_), Unit::Named { .. })
        )
    }

    /// The kind of unit the variant expects.
    #[must_use]
    pub const fn expected(self) -> &'static str {
        match self {
            Self::LengthUnit(_) => "IfcLengthUnit",
            Self::NamedUnit(_) => "IfcNamedUnit",
        }
    }
}

/// `IfcUnitAssignment`: the set of units in use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitAssignment {
    /// The assigned units. Deleting a unit removes it from the set.
    pub units: BTreeSet<UnitSelect>,
}

impl UnitAssignment {
    pub(crate) fn remove_unit(&mut self, unit: UnitId) -> bool {
        let before = self.units.len();
        self.units.retain(|select| select.unit() != unit);
        self.units.len() != before
    }
}
