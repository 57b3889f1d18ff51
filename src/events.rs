//! Notifications published by the session so the UI can re-render.

use crate::models::{Set, SetId};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Loaded { count: usize },
    SetCreated(Set),
    SetUpdated(Set),
    SetDeleted(SetId),
    EditOpened(SetId),
    /// Carries the cached values the edited row should revert to.
    EditCancelled(Set),
    CoachingUpdated,
}

type Listener = Rc<dyn Fn(&SessionEvent)>;

/// Shared list of listeners. Cloning shares the list.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Rc<RefCell<Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&SessionEvent) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn emit(&self, event: SessionEvent) {
        // Snapshot first so a listener may subscribe while being notified.
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
pub(crate) fn recorder(bus: &EventBus) -> Rc<RefCell<Vec<SessionEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    bus.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    seen
}
