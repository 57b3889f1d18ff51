//! State owned by one (workout, exercise) session.
//!
//! Everything the session needs lives here instead of in module globals, so
//! several sessions can coexist and tests need no global reset.

use crate::edit_session::EditSession;
use crate::error::SessionError;
use crate::models::{Set, SetId};
use crate::set_cache::SetCache;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// What a mutation is aimed at.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SetTarget {
    /// The "log new set" row, which has no id yet.
    PendingRow,
    Set(SetId),
}

impl fmt::Display for SetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetTarget::PendingRow => write!(f, "the new set"),
            SetTarget::Set(id) => write!(f, "set {}", id),
        }
    }
}

/// Identifies whose sets the session manages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionScope {
    pub user_id: String,
    pub workout_id: String,
    pub exercise_id: String,
}

#[derive(Debug)]
pub struct SetSession {
    scope: SessionScope,
    cache: SetCache,
    edit: EditSession,
    in_flight: HashSet<SetTarget>,
}

impl SetSession {
    pub fn new(scope: SessionScope) -> Self {
        Self {
            scope,
            cache: SetCache::new(),
            edit: EditSession::default(),
            in_flight: HashSet::new(),
        }
    }

    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }

    pub fn cache(&self) -> &SetCache {
        &self.cache
    }

    pub fn edit(&self) -> &EditSession {
        &self.edit
    }

    pub fn begin_edit(&mut self, id: &SetId) -> Result<Option<Set>, SessionError> {
        self.edit.begin_edit(id, &self.cache)
    }

    pub fn cancel_edit(&mut self) -> Option<Set> {
        self.edit.cancel_edit()
    }

    pub fn edit_mut(&mut self) -> &mut EditSession {
        &mut self.edit
    }

    pub fn is_in_flight(&self, target: &SetTarget) -> bool {
        self.in_flight.contains(target)
    }

    pub(crate) fn cache_mut(&mut self) -> &mut SetCache {
        &mut self.cache
    }

    /// Mark `target` as having a call in flight.
    pub(crate) fn claim(&mut self, target: SetTarget) -> Result<(), SessionError> {
        if self.in_flight.contains(&target) {
            warn!("{} already has a request in flight", target);
            return Err(SessionError::Conflict(target));
        }
        self.in_flight.insert(target);
        Ok(())
    }

    pub(crate) fn release(&mut self, target: &SetTarget) {
        self.in_flight.remove(target);
    }
}

#[cfg(test)]
pub(crate) fn test_scope() -> SessionScope {
    SessionScope {
        user_id: "u1".into(),
        workout_id: "w1".into(),
        exercise_id: "e1".into(),
    }
}
