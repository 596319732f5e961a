use std::{borrow::Borrow, fmt, ops::Deref, str::FromStr, sync::LazyLock};

use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::ValidationError;

/// Number of characters in an [`IfcGloballyUniqueId`](Guid).
pub const GUID_LENGTH: usize = 22;

/// Maximum number of code points in a [`Label`] or [`Identifier`].
pub const MAX_LABEL_LENGTH: usize = 255;

static GUID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/]{22}$").expect("GUID pattern is a valid regex"));

/// Validates a string as an `IfcGloballyUniqueId`.
///
/// The string must be exactly 22 characters drawn from `[A-Za-z0-9+/]`.
/// Padding (`=`) is not accepted.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidGuid`] if the string has the wrong
/// length or contains a character outside the alphabet.
pub fn validate_guid(s: &str) -> Result<Guid, ValidationError> {
    if GUID_PATTERN.is_match(s) {
        Ok(Guid(s.to_string()))
    } else {
        Err(ValidationError::InvalidGuid(s.to_string()))
    }
}

/// An `IfcGloballyUniqueId`.
///
/// A 22 character string over the alphabet `[A-Za-z0-9+/]`. Uniqueness across
/// the entity universe is enforced by the [`Universe`](crate::Universe), not by
/// this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Guid(String);

impl Guid {
    /// Generates a fresh GUID from a random UUID.
    ///
    /// The 128 UUID bits are encoded without padding, which always yields
    /// exactly 22 characters.
    #[must_use]
    pub fn generate() -> Self {
        Self(STANDARD_NO_PAD.encode(Uuid::new_v4().as_bytes()))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Guid {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if GUID_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidGuid(value))
        }
    }
}

impl TryFrom<&str> for Guid {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_guid(value)
    }
}

impl FromStr for Guid {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_guid(s)
    }
}

impl From<Guid> for String {
    fn from(guid: Guid) -> Self {
        guid.0
    }
}

impl AsRef<str> for Guid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates a bounded string measure type.
///
/// Empty strings are valid and are kept distinct from absence, which callers
/// express with `Option`. Nothing is trimmed.
macro_rules! bounded_string {
    ($(#[$meta:meta])* $name:ident, $variant:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new value, checking the length limit.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is longer than
            /// [`MAX_LABEL_LENGTH`] code points.
            pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
                let s = s.into();
                let length = s.chars().count();
                if length > MAX_LABEL_LENGTH {
                    return Err(ValidationError::$variant { length });
                }
                Ok(Self(s))
            }

            /// Validates an optional string, preserving absence.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is present and too long.
            pub fn optional(s: Option<String>) -> Result<Option<Self>, ValidationError> {
                s.map(Self::new).transpose()
            }

            /// Returns the string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValidationError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

bounded_string!(
    /// An `IfcLabel`: a short name or title of at most 255 code points.
    Label,
    LabelTooLong
);

bounded_string!(
    /// An `IfcIdentifier`: an identification string of at most 255 code
    /// points.
    Identifier,
    IdentifierTooLong
);

/// An `IfcText`: free text of unlimited length.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Text(String);

impl Text {
    /// Wraps a string. Text has no length limit, so this cannot fail.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An `IfcTimestamp`: signed seconds since the Unix epoch, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from raw seconds. Any integer is storable; range
    /// is only checked when converting to a calendar datetime.
    #[must_use]
    pub const fn from_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// The current time, truncated to whole seconds.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    /// Raw seconds since the epoch.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        self.0
    }

    /// Converts to a calendar datetime.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] if the value cannot be
    /// represented as a calendar date.
    pub fn to_datetime(self) -> Result<DateTime<Utc>, ValidationError> {
        DateTime::from_timestamp(self.0, 0).ok_or(ValidationError::OutOfRange(self.0))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp())
    }
}

impl TryFrom<Timestamp> for DateTime<Utc> {
    type Error = ValidationError;

    fn try_from(value: Timestamp) -> Result<Self, Self::Error> {
        value.to_datetime()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_datetime() {
            Ok(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
            Err(_) => write!(f, "@{}", self.0),
        }
    }
}

/// An `IfcLogical`: true, false or unknown.
///
/// Encoded on the wire as `1`, `0` and `-1` respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TriBoolean {
    /// Encoded as `1`.
    True,
    /// Encoded as `0`.
    False,
    /// Encoded as `-1`.
    Unknown,
}

impl TriBoolean {
    /// Encodes the value as its wire integer.
    #[must_use]
    pub const fn encode(self) -> i64 {
        match self {
            Self::True => 1,
            Self::False => 0,
            Self::Unknown => -1,
        }
    }

    /// Decodes a wire integer.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTriBoolean`] for anything other than
    /// `1`, `0` or `-1`.
    pub const fn decode(value: i64) -> Result<Self, ValidationError> {
        match value {
            1 => Ok(Self::True),
            0 => Ok(Self::False),
            -1 => Ok(Self::Unknown),
            other => Err(ValidationError::InvalidTriBoolean(other)),
        }
    }

    /// The value as an optional boolean, with `Unknown` mapping to `None`.
    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Unknown => None,
        }
    }
}

impl Default for TriBoolean {
    fn default() -> Self {
        Self::True
    }
}

impl From<Option<bool>> for TriBoolean {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::True,
            Some(false) => Self::False,
            None => Self::Unknown,
        }
    }
}

impl From<bool> for TriBoolean {
    fn from(value: bool) -> Self {
        Some(value).into()
    }
}

impl TryFrom<i64> for TriBoolean {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::decode(value)
    }
}

impl From<TriBoolean> for i64 {
    fn from(value: TriBoolean) -> Self {
        value.encode()
    }
}

impl fmt::Display for TriBoolean {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        })
    }
}
