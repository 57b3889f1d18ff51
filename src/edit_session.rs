//! Single-editor state machine.
//!
//! At most one set is open for editing. Edits are staged in a draft; the
//! cache is only written once a save has been confirmed by the server.

use crate::error::SessionError;
use crate::models::{Set, SetDraft, SetId};
use crate::set_cache::SetCache;
use log::debug;

#[derive(Clone, Debug, PartialEq)]
pub struct EditState {
    pub set_id: SetId,
    /// Cached values when editing began.
    pub snapshot: Set,
    pub draft: SetDraft,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum EditSession {
    #[default]
    Idle,
    Editing(EditState),
}

impl EditSession {
    /// Open `id` for editing.
    ///
    /// An edit already open on another set is cancelled first; its snapshot
    /// is returned so the caller can revert that row.
    pub fn begin_edit(&mut self, id: &SetId, cache: &SetCache) -> Result<Option<Set>, SessionError> {
        let set = cache
            .get(id)
            .ok_or_else(|| SessionError::UnknownSet(id.clone()))?;

        if self.editing_id() == Some(id) {
            return Ok(None);
        }
        let cancelled = self.cancel_edit();
        debug!("Editing set {}", id);
        *self = EditSession::Editing(EditState {
            set_id: id.clone(),
            snapshot: set.clone(),
            draft: set.to_draft(),
        });
        Ok(cancelled)
    }

    /// Discard the draft. Returns the snapshot of the set that was open.
    pub fn cancel_edit(&mut self) -> Option<Set> {
        match std::mem::take(self) {
            EditSession::Idle => None,
            EditSession::Editing(state) => {
                debug!("Cancelled edit of set {}", state.set_id);
                Some(state.snapshot)
            }
        }
    }

    /// Cancel only if `id` is the set under edit.
    pub fn cancel_if_editing(&mut self, id: &SetId) -> Option<Set> {
        if self.is_editing(id) {
            self.cancel_edit()
        } else {
            None
        }
    }

    /// Close the edit of `id` after a confirmed save.
    ///
    /// Leaves the session untouched if another set has been opened meanwhile.
    pub fn finish(&mut self, id: &SetId) -> bool {
        if self.is_editing(id) {
            *self = EditSession::Idle;
            true
        } else {
            false
        }
    }

    pub fn editing_id(&self) -> Option<&SetId> {
        match self {
            EditSession::Idle => None,
            EditSession::Editing(state) => Some(&state.set_id),
        }
    }

    pub fn is_editing(&self, id: &SetId) -> bool {
        self.editing_id() == Some(id)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, EditSession::Idle)
    }

    pub fn draft(&self) -> Option<&SetDraft> {
        match self {
            EditSession::Idle => None,
            EditSession::Editing(state) => Some(&state.draft),
        }
    }

    /// Mutate the staged draft of the open edit.
    pub fn update_draft(&mut self, f: impl FnOnce(&mut SetDraft)) -> Result<(), SessionError> {
        match self {
            EditSession::Idle => Err(SessionError::NotEditing),
            EditSession::Editing(state) => {
                f(&mut state.draft);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set_cache::test_set;

    fn cache() -> SetCache {
        let mut cache = SetCache::new();
        cache.load(Some(vec![test_set("a", 1, 60.0, 8), test_set("b", 2, 62.5, 6)]));
        cache
    }

    #[test]
    fn begin_edit_requires_cached_set() {
        let mut session = EditSession::default();
        let err = session.begin_edit(&SetId::new("z"), &cache()).unwrap_err();
        assert_eq!(err, SessionError::UnknownSet(SetId::new("z")));
        assert!(session.is_idle());
    }

    #[test]
    fn second_edit_cancels_first() {
        let cache = cache();
        let mut session = EditSession::default();
        let a = SetId::new("a");
        let b = SetId::new("b");

        assert_eq!(session.begin_edit(&a, &cache).unwrap(), None);
        session.update_draft(|d| d.actual_weight = 100.0).unwrap();

        let reverted = session.begin_edit(&b, &cache).unwrap().unwrap();
        assert_eq!(reverted.id, Some(a.clone()));
        assert_eq!(reverted.actual_weight, 60.0);
        assert_eq!(session.editing_id(), Some(&b));
        assert!(!session.is_editing(&a));
        assert_eq!(session.draft().unwrap().actual_weight, 62.5);
    }

    #[test]
    fn reopening_same_set_keeps_draft() {
        let cache = cache();
        let mut session = EditSession::default();
        let a = SetId::new("a");
        session.begin_edit(&a, &cache).unwrap();
        session.update_draft(|d| d.actual_reps = 10).unwrap();
        assert_eq!(session.begin_edit(&a, &cache).unwrap(), None);
        assert_eq!(session.draft().unwrap().actual_reps, 10);
    }

    #[test]
    fn cancel_never_touches_cache() {
        let cache = cache();
        let before = cache.clone();
        let mut session = EditSession::default();
        session.begin_edit(&SetId::new("a"), &cache).unwrap();
        session.update_draft(|d| d.actual_weight = 1.0).unwrap();
        session.cancel_edit();
        assert!(session.is_idle());
        assert_eq!(cache, before);
    }

    #[test]
    fn draft_update_without_edit_fails() {
        let mut session = EditSession::default();
        assert_eq!(
            session.update_draft(|d| d.actual_reps = 1),
            Err(SessionError::NotEditing)
        );
    }

    #[test]
    fn finish_ignores_other_set() {
        let cache = cache();
        let mut session = EditSession::default();
        session.begin_edit(&SetId::new("b"), &cache).unwrap();
        assert!(!session.finish(&SetId::new("a")));
        assert!(session.finish(&SetId::new("b")));
        assert!(session.is_idle());
    }
}
