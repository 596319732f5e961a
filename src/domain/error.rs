//! Error taxonomy.
//!
//! Errors come in three kinds:
//!
//! - [`ValidationError`]: a malformed value. The caller must correct the
//!   input.
//! - [`IntegrityError`]: the mutation would break a cross-record invariant.
//!   The mutation is rejected and the universe is left untouched.
//! - [`StateError`]: the requested transition is not allowed in the record's
//!   current state.
//!
//! None of these are transient, so nothing is retried.

use thiserror::Error;

use crate::domain::{
    change::IndexKind,
    enums::{State, UnknownEnumCode},
    handle::{OwnerHistoryId, PlacementId, RecordKey},
    measure::MAX_LABEL_LENGTH,
};

/// A malformed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Not a 22 character string over `[A-Za-z0-9+/]`.
    #[error("invalid IFC GUID '{0}': expected 22 characters from [A-Za-z0-9+/]")]
    InvalidGuid(String),

    /// A label longer than the limit.
    #[error("label is {length} characters long, the limit is {MAX_LABEL_LENGTH}")]
    LabelTooLong {
        /// The offending length, in code points.
        length: usize,
    },

    /// An identifier longer than the limit.
    #[error("identifier is {length} characters long, the limit is {MAX_LABEL_LENGTH}")]
    IdentifierTooLong {
        /// The offending length, in code points.
        length: usize,
    },

    /// A timestamp outside the calendar range.
    #[error("timestamp {0} is outside the representable calendar range")]
    OutOfRange(i64),

    /// An integer that is not a logical value.
    #[error("{0} is not a valid IFC logical value (expected 1, 0 or -1)")]
    InvalidTriBoolean(i64),

    /// A coordinate space dimension other than 2 or 3.
    #[error("coordinate space dimension must be 2 or 3, got {0}")]
    InvalidDimension(i64),

    /// A user-defined field set on a record that is not classified as
    /// `USERDEFINED`.
    #[error("{field} is only meaningful when the classification is USERDEFINED")]
    UserDefinedMismatch {
        /// The name of the user-defined field.
        field: &'static str,
    },

    /// An unknown enumeration code.
    #[error(transparent)]
    UnknownEnumCode(#[from] UnknownEnumCode),
}

/// A violation of a cross-record invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// A unique key is already in use.
    #[error("duplicate {index}: '{key}' is already in use")]
    DuplicateKey {
        /// The uniqueness index that rejected the key.
        index: IndexKind,
        /// The colliding key, rendered as text.
        key: String,
    },

    /// A reference to a record that does not exist.
    #[error("{0} does not exist")]
    DanglingReference(RecordKey),

    /// The placement would become its own ancestor.
    #[error("placing {placement} relative to {parent} would create a cycle")]
    PlacementCycleDetected {
        /// The placement being assigned a parent.
        placement: PlacementId,
        /// The proposed parent.
        parent: PlacementId,
    },

    /// A placement chain longer than the configured guard.
    #[error("the placement chain above {0} is deeper than the limit of {1}")]
    PlacementTooDeep(PlacementId, usize),

    /// A polymorphic reference tag outside the whitelist.
    #[error("'{tag}' is not a valid target for {select}")]
    InvalidSelectTarget {
        /// The select type, e.g. `IfcActorSelect`.
        select: &'static str,
        /// The rejected tag.
        tag: String,
    },

    /// A reference to a record of the wrong kind, such as a grid placement on
    /// an entity that is not a grid.
    #[error("{key} is not a valid {expected}")]
    WrongKind {
        /// The referenced record.
        key: RecordKey,
        /// What the reference requires.
        expected: &'static str,
    },

    /// The record cannot be deleted while other records reference it.
    #[error("{target} is still referenced by {}", display_keys(.by))]
    Referenced {
        /// The record that was to be deleted.
        target: RecordKey,
        /// The records that reference it.
        by: Vec<RecordKey>,
    },
}

fn display_keys(keys: &[RecordKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A transition that is not allowed in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The owner history is locked by another actor.
    #[error("{history} is {state} and the actor does not hold the lock")]
    EntityLocked {
        /// The locked owner history.
        history: OwnerHistoryId,
        /// The current lock state.
        state: State,
    },

    /// An ancestor layer's required field is absent.
    #[error("{entity} requires {layer}.{field}")]
    MissingRequiredAncestorField {
        /// The concrete entity being built.
        entity: &'static str,
        /// The ancestor layer that owns the field.
        layer: &'static str,
        /// The missing field.
        field: &'static str,
    },

    /// An attempt to change a field that is fixed once assigned.
    #[error("{field} of {key} cannot be changed once assigned")]
    Immutable {
        /// The record being updated.
        key: RecordKey,
        /// The immutable field.
        field: &'static str,
    },

    /// The owner history has recorded a deletion and accepts no further
    /// transitions.
    #[error("{0} has recorded a deletion and is closed")]
    HistoryClosed(OwnerHistoryId),
}

/// The three error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`ValidationError`].
    Validation,
    /// See [`IntegrityError`].
    Integrity,
    /// See [`StateError`].
    State,
}

/// Any error returned by a [`Universe`](crate::Universe) operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A malformed value.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A cross-record invariant violation.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    /// A disallowed transition.
    #[error(transparent)]
    State(#[from] StateError),
}

impl Error {
    /// The kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Integrity(_) => ErrorKind::Integrity,
            Self::State(_) => ErrorKind::State,
        }
    }
}

impl From<UnknownEnumCode> for Error {
    fn from(err: UnknownEnumCode) -> Self {
        Self::Validation(err.into())
    }
}
