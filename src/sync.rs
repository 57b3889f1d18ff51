//! Bridges user mutations to the remote API.
//!
//! The cache is only written after the server has confirmed a call: creates
//! append the returned set, saves merge the confirmed values, deletes remove
//! the row. A failed call therefore never needs to be rolled back. Each set
//! (and the pending "new set" row) allows one call in flight at a time.

use crate::api::SetApi;
use crate::error::{ApiError, SessionError};
use crate::events::{EventBus, SessionEvent};
use crate::metrics::best_set;
use crate::models::{NewSetBody, Set, SetDraft, SetId, SetPatch};
use crate::refresher::{CoachingBoard, RecommendationRefresher};
use crate::session::{SessionScope, SetSession, SetTarget};
use futures::task::{LocalSpawn, LocalSpawnExt};
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

/// Outcome of a delete request.
#[derive(Clone, Debug, PartialEq)]
pub enum DeleteOutcome {
    Deleted(Set),
    /// The confirmation gate said no; nothing happened.
    Declined,
}

/// Releases an in-flight claim when the call settles or is dropped.
struct InFlight {
    session: Rc<RefCell<SetSession>>,
    target: SetTarget,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.session.borrow_mut().release(&self.target);
    }
}

/// Runs futures on the browser's event loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(
        &self,
        future: futures::task::LocalFutureObj<'static, ()>,
    ) -> Result<(), futures::task::SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

pub struct SyncController<A> {
    api: Rc<A>,
    session: Rc<RefCell<SetSession>>,
    refresher: RecommendationRefresher<A>,
    spawner: Rc<dyn LocalSpawn>,
    events: EventBus,
}

impl<A> Clone for SyncController<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            session: self.session.clone(),
            refresher: self.refresher.clone(),
            spawner: self.spawner.clone(),
            events: self.events.clone(),
        }
    }
}

fn report(what: &str, e: ApiError) -> SessionError {
    let e = SessionError::from(e);
    if e.is_fatal() {
        error!("{} refused: {}", what, e);
    } else {
        warn!("{} failed: {}", what, e);
    }
    e
}

impl<A: SetApi + 'static> SyncController<A> {
    pub fn new(api: Rc<A>, scope: SessionScope, spawner: Rc<dyn LocalSpawn>) -> Self {
        let events = EventBus::new();
        Self {
            refresher: RecommendationRefresher::new(api.clone(), events.clone()),
            api,
            session: Rc::new(RefCell::new(SetSession::new(scope))),
            spawner,
            events,
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&SessionEvent) + 'static) {
        self.events.subscribe(listener);
    }

    /// Read access to the session state.
    pub fn with_session<R>(&self, f: impl FnOnce(&SetSession) -> R) -> R {
        f(&self.session.borrow())
    }

    pub fn sets(&self) -> Vec<Set> {
        self.session.borrow().cache().sets().to_vec()
    }

    pub fn coaching(&self) -> CoachingBoard {
        self.refresher.board()
    }

    /// Fetch the sets of this (workout, exercise) and replace the cache.
    ///
    /// A failed fetch leaves the cache empty and reports the error.
    pub async fn load_sets(&self) -> Result<usize, SessionError> {
        let scope = self.session.borrow().scope().clone();
        let result = self
            .api
            .list_sets(&scope.workout_id, &scope.exercise_id)
            .await;

        let loaded = {
            let mut session = self.session.borrow_mut();
            session.cancel_edit();
            let cache = session.cache_mut();
            match result {
                Ok(sets) => {
                    cache.load(sets);
                    cache.renumber();
                    Ok(cache.len())
                }
                Err(e) => {
                    cache.load(None);
                    Err(e)
                }
            }
        };

        match loaded {
            Ok(count) => {
                info!("Session holds {} sets", count);
                self.events.emit(SessionEvent::Loaded { count });
                self.refresh_coaching();
                Ok(count)
            }
            Err(e) => {
                self.events.emit(SessionEvent::Loaded { count: 0 });
                Err(report("Loading sets", e))
            }
        }
    }

    /// Log a new set from the pending row.
    ///
    /// Nothing is added locally until the server returns the stored set; on
    /// failure the pending row can simply be submitted again.
    pub async fn create_set(&self, draft: SetDraft) -> Result<Set, SessionError> {
        let fields = draft.validate().map_err(|e| {
            debug!("Rejected new set: {}", e);
            e
        })?;
        let target = SetTarget::PendingRow;
        let _claim = self.claim(target.clone())?;

        let (workout_id, body) = {
            let session = self.session.borrow();
            let body = NewSetBody {
                exercise_id: session.scope().exercise_id.clone(),
                set_number: session.cache().next_set_number(),
                actual_weight: fields.actual_weight,
                actual_reps: fields.actual_reps,
                actual_rir: fields.actual_rir,
                notes: fields.notes,
            };
            (session.scope().workout_id.clone(), body)
        };
        info!("Creating set #{}", body.set_number);

        let created = self
            .api
            .create_set(&workout_id, body)
            .await
            .map_err(|e| report(&format!("Creating {}", target), e))?;
        let id = created
            .id
            .clone()
            .ok_or_else(|| {
                report(
                    &format!("Creating {}", target),
                    ApiError::Decode("set without id".into()),
                )
            })?;

        let stored = {
            let mut session = self.session.borrow_mut();
            let cache = session.cache_mut();
            cache.append(created);
            cache.renumber();
            cache
                .get(&id)
                .cloned()
                .ok_or_else(|| SessionError::UnknownSet(id.clone()))?
        };

        self.events.emit(SessionEvent::SetCreated(stored.clone()));
        self.refresh_coaching();
        Ok(stored)
    }

    /// Open a set for editing, cancelling any other open edit.
    pub fn begin_edit(&self, id: &SetId) -> Result<(), SessionError> {
        let cancelled = self.session.borrow_mut().begin_edit(id)?;
        if let Some(snapshot) = cancelled {
            self.events.emit(SessionEvent::EditCancelled(snapshot));
        }
        self.events.emit(SessionEvent::EditOpened(id.clone()));
        Ok(())
    }

    pub fn cancel_edit(&self) {
        let cancelled = self.session.borrow_mut().cancel_edit();
        if let Some(snapshot) = cancelled {
            self.events.emit(SessionEvent::EditCancelled(snapshot));
        }
    }

    /// Change the staged draft of the open edit.
    pub fn update_draft(&self, f: impl FnOnce(&mut SetDraft)) -> Result<(), SessionError> {
        self.session.borrow_mut().edit_mut().update_draft(f)
    }

    /// Save the staged draft of the set currently under edit.
    pub async fn save_edit(&self) -> Result<Set, SessionError> {
        let (id, draft) = {
            let session = self.session.borrow();
            let id = session.edit().editing_id().cloned();
            let draft = session.edit().draft().cloned();
            id.zip(draft).ok_or(SessionError::NotEditing)?
        };
        self.save_set(&id, draft).await
    }

    /// Persist new values for a set.
    ///
    /// The cache is updated only after the server confirms; on failure the
    /// edit stays open so the user can retry or cancel.
    pub async fn save_set(&self, id: &SetId, draft: SetDraft) -> Result<Set, SessionError> {
        let fields = draft.validate().map_err(|e| {
            debug!("Rejected edit of set {}: {}", id, e);
            e
        })?;
        if !self.session.borrow().cache().contains(id) {
            return Err(SessionError::UnknownSet(id.clone()));
        }
        let target = SetTarget::Set(id.clone());
        let _claim = self.claim(target.clone())?;
        info!("Saving set {}", id);

        let confirmed = self
            .api
            .update_set(id, fields.clone())
            .await
            .map_err(|e| report(&format!("Saving {}", target), e))?;
        let patch = match &confirmed {
            Some(set) => SetPatch::from(set),
            None => SetPatch::from(&fields),
        };

        let (before, after) = {
            let mut session = self.session.borrow_mut();
            let before = session
                .cache()
                .get(id)
                .cloned()
                .ok_or_else(|| SessionError::UnknownSet(id.clone()))?;
            let after = session.cache_mut().update(id, &patch)?.clone();
            session.edit_mut().finish(id);
            (before, after)
        };

        self.events.emit(SessionEvent::SetUpdated(after.clone()));
        if before.performance_differs(&after) {
            self.refresh_coaching();
        }
        Ok(after)
    }

    /// Delete a set once `confirm` approves it.
    ///
    /// An edit open on the set is cancelled before the call goes out, and
    /// again on success if one was reopened meanwhile. On failure the set
    /// stays in the cache.
    pub async fn delete_set(
        &self,
        id: &SetId,
        confirm: impl FnOnce(&Set) -> bool,
    ) -> Result<DeleteOutcome, SessionError> {
        let target = SetTarget::Set(id.clone());
        let set = {
            let session = self.session.borrow();
            if session.is_in_flight(&target) {
                warn!("{} already has a request in flight", target);
                return Err(SessionError::Conflict(target));
            }
            session
                .cache()
                .get(id)
                .cloned()
                .ok_or_else(|| SessionError::UnknownSet(id.clone()))?
        };
        if !confirm(&set) {
            debug!("Delete of set {} declined", id);
            return Ok(DeleteOutcome::Declined);
        }

        let _claim = self.claim(target.clone())?;
        let cancelled = self.session.borrow_mut().edit_mut().cancel_if_editing(id);
        if let Some(snapshot) = cancelled {
            self.events.emit(SessionEvent::EditCancelled(snapshot));
        }
        info!("Deleting set {}", id);

        self.api
            .delete_set(id)
            .await
            .map_err(|e| report(&format!("Deleting {}", target), e))?;

        // An edit may have been reopened on the set while the call was out.
        let (removed, cancelled) = {
            let mut session = self.session.borrow_mut();
            let cancelled = session.edit_mut().cancel_if_editing(id);
            let cache = session.cache_mut();
            let removed = cache.remove(id);
            cache.renumber();
            (removed.unwrap_or(set), cancelled)
        };

        if let Some(snapshot) = cancelled {
            self.events.emit(SessionEvent::EditCancelled(snapshot));
        }
        self.events.emit(SessionEvent::SetDeleted(id.clone()));
        self.refresh_coaching();
        Ok(DeleteOutcome::Deleted(removed))
    }

    /// Re-fetch coaching data in the background, superseding older fetches.
    pub fn refresh_coaching(&self) {
        let (scope, best) = {
            let session = self.session.borrow();
            (
                session.scope().clone(),
                best_set(session.cache()).cloned(),
            )
        };
        let refresh = self
            .refresher
            .refresh(&scope.user_id, &scope.exercise_id, best);
        if let Err(e) = self.spawner.spawn_local(refresh) {
            warn!("Could not schedule coaching refresh: {}", e);
        }
    }

    fn claim(&self, target: SetTarget) -> Result<InFlight, SessionError> {
        self.session.borrow_mut().claim(target.clone())?;
        Ok(InFlight {
            session: self.session.clone(),
            target,
        })
    }
}
