//! Closed IFC enumerations.
//!
//! Every enumeration is a fixed, ordered set of variants. Each variant has a
//! canonical machine code (the IFC tag, e.g. `DISTRIBUTIONPOINT`) and a
//! human-readable display string. The `(code, display)` table is a `'static`
//! constant; there is no runtime registry.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Error returned when decoding a code that is not part of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{code}' is not a valid {enumeration} code")]
pub struct UnknownEnumCode {
    /// The IFC name of the enumeration, e.g. `IfcRoleEnum`.
    pub enumeration: &'static str,
    /// The rejected code.
    pub code: String,
}

macro_rules! ifc_enum {
    (
        $(#[$meta:meta])*
        $name:ident = $ifc_name:literal, default = $default:ident {
            $( $variant:ident => ($code:literal, $display:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $(
                #[doc = concat!("`", $code, "`: ", $display)]
                $variant,
            )+
        }

        impl $name {
            /// The IFC name of this enumeration.
            pub const IFC_NAME: &'static str = $ifc_name;

            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            const TABLE: &'static [(&'static str, &'static str)] = &[$(($code, $display)),+];

            /// The `(code, display)` pairs, in declaration order.
            #[must_use]
            pub const fn choices() -> &'static [(&'static str, &'static str)] {
                Self::TABLE
            }

            /// The canonical machine code of this variant.
            #[must_use]
            pub const fn code(self) -> &'static str {
                Self::TABLE[self as usize].0
            }

            /// The human-readable display string of this variant.
            #[must_use]
            pub const fn display_name(self) -> &'static str {
                Self::TABLE[self as usize].1
            }

            /// Decodes a machine code.
            ///
            /// # Errors
            ///
            /// Returns [`UnknownEnumCode`] if the code is not recognised.
            /// Matching is exact; there is no fallback variant.
            pub fn from_code(code: &str) -> Result<Self, UnknownEnumCode> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.code() == code)
                    .ok_or_else(|| UnknownEnumCode {
                        enumeration: $ifc_name,
                        code: code.to_string(),
                    })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl FromStr for $name {
            type Err = UnknownEnumCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_code(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownEnumCode;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_code(&value)
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.code()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.display_name())
            }
        }
    };
}

ifc_enum! {
    /// The purpose of an address (`IfcAddressTypeEnum`).
    AddressType = "IfcAddressTypeEnum", default = NotDefined {
        Office => ("OFFICE", "Office"),
        Site => ("SITE", "Site"),
        Home => ("HOME", "Home"),
        DistributionPoint => ("DISTRIBUTIONPOINT", "Distribution Point"),
        UserDefined => ("USERDEFINED", "User Defined"),
        NotDefined => ("NOTDEFINED", "Not Defined"),
    }
}

ifc_enum! {
    /// The role played by an actor (`IfcRoleEnum`).
    ///
    /// IFC defines no `NOTDEFINED` role; unclassified roles default to
    /// `USERDEFINED`.
    Role = "IfcRoleEnum", default = UserDefined {
        Supplier => ("SUPPLIER", "Supplier"),
        Manufacturer => ("MANUFACTURER", "Manufacturer"),
        Contractor => ("CONTRACTOR", "Contractor"),
        Subcontractor => ("SUBCONTRACTOR", "Subcontractor"),
        Architect => ("ARCHITECT", "Architect"),
        StructuralEngineer => ("STRUCTURALENGINEER", "Structural Engineer"),
        CostEngineer => ("COSTENGINEER", "Cost Engineer"),
        Client => ("CLIENT", "Client"),
        BuildingOwner => ("BUILDINGOWNER", "Building Owner"),
        BuildingOperator => ("BUILDINGOPERATOR", "Building Operator"),
        MechanicalEngineer => ("MECHANICALENGINEER", "Mechanical Engineer"),
        ElectricalEngineer => ("ELECTRICALENGINEER", "Electrical Engineer"),
        ProjectManager => ("PROJECTMANAGER", "Project Manager"),
        FacilitiesManager => ("FACILITIESMANAGER", "Facilities Manager"),
        CivilEngineer => ("CIVILENGINEER", "Civil Engineer"),
        CommissioningEngineer => ("COMMISSIONINGENGINEER", "Commissioning Engineer"),
        Engineer => ("ENGINEER", "Engineer"),
        Owner => ("OWNER", "Owner"),
        Consultant => ("CONSULTANT", "Consultant"),
        ConstructionManager => ("CONSTRUCTIONMANAGER", "Construction Manager"),
        FieldConstructionManager => ("FIELDCONSTRUCTIONMANAGER", "Field Construction Manager"),
        Reseller => ("RESELLER", "Reseller"),
        UserDefined => ("USERDEFINED", "User Defined"),
    }
}

ifc_enum! {
    /// The procedural change applied to an object (`IfcChangeActionEnum`).
    ChangeAction = "IfcChangeActionEnum", default = NotDefined {
        NoChange => ("NOCHANGE", "No Change"),
        Modified => ("MODIFIED", "Modified"),
        Added => ("ADDED", "Added"),
        Deleted => ("DELETED", "Deleted"),
        NotDefined => ("NOTDEFINED", "Not Defined"),
    }
}

impl ChangeAction {
    /// Whether the action writes to the object.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Modified | Self::Added | Self::Deleted)
    }
}

ifc_enum! {
    /// The access state of an object (`IfcStateEnum`).
    State = "IfcStateEnum", default = ReadWrite {
        ReadWrite => ("READWRITE", "Read-Write"),
        ReadOnly => ("READONLY", "Read-Only"),
        Locked => ("LOCKED", "Locked"),
        ReadWriteLocked => ("READWRITELOCKED", "Read-Write Locked"),
        ReadOnlyLocked => ("READONLYLOCKED", "Read-Only Locked"),
    }
}

impl State {
    /// Whether the state holds a lock.
    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(
            self,
            Self::Locked | Self::ReadWriteLocked | Self::ReadOnlyLocked
        )
    }
}

ifc_enum! {
    /// The physical quantity measured by a unit (`IfcUnitEnum` subset).
    UnitType = "IfcUnitEnum", default = LengthUnit {
        LengthUnit => ("LENGTHUNIT", "Length Unit"),
        AreaUnit => ("AREAUNIT", "Area Unit"),
        VolumeUnit => ("VOLUMEUNIT", "Volume Unit"),
        CountUnit => ("COUNTUNIT", "Count Unit"),
        WeightUnit => ("WEIGHTUNIT", "Weight Unit"),
        TimeUnit => ("TIMEUNIT", "Time Unit"),
    }
}
