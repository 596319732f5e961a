//! Audit metadata attached to Root-derived entities.
//!
//! An owner history moves through `Created → Modified* → Deleted`. The
//! creation fields are fixed when the history is created. Every later
//! transition is a [`Modification`] that records who acted and when, and may
//! change the access [`State`]. While the state is locked, only the actor
//! that took the lock may write or change the state.

use serde::{Deserialize, Serialize};

use crate::domain::{
    enums::{ChangeAction, State},
    error::StateError,
    handle::{ApplicationId, OwnerHistoryId, PersonAndOrganizationId},
    measure::Timestamp,
};

/// Where an owner history is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// No modification has been recorded yet.
    #[default]
    Created,
    /// At least one modification has been recorded.
    Modified,
    /// A deletion has been recorded. No further transitions are accepted.
    Deleted,
}

/// `IfcOwnerHistory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerHistory {
    creation_user: Option<PersonAndOrganizationId>,
    modification_user: Option<PersonAndOrganizationId>,
    creation_date: Timestamp,
    last_modified_date: Timestamp,
    change_action: ChangeAction,
    state: State,
    application: Option<ApplicationId>,
    lifecycle: Lifecycle,
    lock_holder: Option<PersonAndOrganizationId>,
}

impl OwnerHistory {
    /// A new history recording the creation of an object.
    ///
    /// The change action is `ADDED`. If the initial state is locked, the
    /// creating user holds the lock.
    #[must_use]
    pub fn created(
        user: Option<PersonAndOrganizationId>,
        application: Option<ApplicationId>,
        state: State,
        at: Timestamp,
    ) -> Self {
        Self {
            creation_user: user,
            modification_user: None,
            creation_date: at,
            last_modified_date: at,
            change_action: ChangeAction::Added,
            state,
            application,
            lifecycle: Lifecycle::Created,
            lock_holder: if state.is_locked() { user } else { None },
        }
    }

    /// The user who created the object.
    #[must_use]
    pub const fn creation_user(&self) -> Option<PersonAndOrganizationId> {
        self.creation_user
    }

    /// The user who last modified the object.
    #[must_use]
    pub const fn modification_user(&self) -> Option<PersonAndOrganizationId> {
        self.modification_user
    }

    /// When the object was created.
    #[must_use]
    pub const fn creation_date(&self) -> Timestamp {
        self.creation_date
    }

    /// When the object was last modified. Equal to the creation date until
    /// the first modification.
    #[must_use]
    pub const fn last_modified_date(&self) -> Timestamp {
        self.last_modified_date
    }

    /// The most recent change action.
    #[must_use]
    pub const fn change_action(&self) -> ChangeAction {
        self.change_action
    }

    /// The access state.
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// The application used.
    #[must_use]
    pub const fn application(&self) -> Option<ApplicationId> {
        self.application
    }

    /// The lifecycle stage.
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The actor holding the lock, if the state is locked and the holder is
    /// known.
    #[must_use]
    pub const fn lock_holder(&self) -> Option<PersonAndOrganizationId> {
        self.lock_holder
    }

    /// Checks whether `modification` would be accepted, without applying it.
    ///
    /// A lock with no known holder does not restrict anyone.
    ///
    /// # Errors
    ///
    /// - [`StateError::HistoryClosed`] once a deletion has been recorded.
    /// - [`StateError::EntityLocked`] if the state is locked, the actor does
    ///   not hold the lock, and the modification writes or changes the state.
    pub fn check(&self, id: OwnerHistoryId, modification: &Modification) -> Result<(), StateError> {
        if self.lifecycle == Lifecycle::Deleted {
            return Err(StateError::HistoryClosed(id));
        }
        let holds_lock = self
            .lock_holder
            .is_none_or(|holder| holder == modification.actor);
        let changes_state = modification.state.is_some_and(|state| state != self.state);
        if self.state.is_locked()
            && !holds_lock
            && (modification.action.is_write() || changes_state)
        {
            return Err(StateError::EntityLocked {
                history: id,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Applies a modification.
    pub(crate) fn apply(
        &mut self,
        id: OwnerHistoryId,
        modification: &Modification,
    ) -> Result<(), StateError> {
        self.check(id, modification)?;

        self.modification_user = Some(modification.actor);
        self.last_modified_date = modification.at;
        self.change_action = modification.action;
        if let Some(state) = modification.state {
            if !state.is_locked() {
                self.lock_holder = None;
            } else if !self.state.is_locked() {
                self.lock_holder = Some(modification.actor);
            }
            self.state = state;
        }
        self.lifecycle = if modification.action == ChangeAction::Deleted {
            Lifecycle::Deleted
        } else {
            Lifecycle::Modified
        };
        Ok(())
    }

    /// Clears every reference to a deleted person and organization pairing.
    pub(crate) fn forget_user(&mut self, user: PersonAndOrganizationId) -> bool {
        let mut changed = false;
        for slot in [
            &mut self.creation_user,
            &mut self.modification_user,
            &mut self.lock_holder,
        ] {
            if *slot == Some(user) {
                *slot = None;
                changed = true;
            }
        }
        changed
    }

    pub(crate) fn forget_application(&mut self, application: ApplicationId) -> bool {
        if self.application == Some(application) {
            self.application = None;
            return true;
        }
        false
    }

    /// Every pairing referenced by the history.
    pub(crate) fn users(&self) -> impl Iterator<Item = PersonAndOrganizationId> {
        [self.creation_user, self.modification_user, self.lock_holder]
            .into_iter()
            .flatten()
    }
}

/// A transition of an owner history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modification {
    /// Who is acting.
    pub actor: PersonAndOrganizationId,
    /// What they did.
    pub action: ChangeAction,
    /// The new access state, if it changes.
    pub state: Option<State>,
    /// When it happened.
    pub at: Timestamp,
}

impl Modification {
    /// A `MODIFIED` transition that leaves the state unchanged.
    #[must_use]
    pub const fn modified(actor: PersonAndOrganizationId, at: Timestamp) -> Self {
        Self {
            actor,
            action: ChangeAction::Modified,
            state: None,
            at,
        }
    }

    /// Sets the new state.
    #[must_use]
    pub const fn with_state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the action.
    #[must_use]
    pub const fn with_action(mut self, action: ChangeAction) -> Self {
        self.action = action;
        self
    }
}
