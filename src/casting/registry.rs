//! Registry of active casting sessions
//!
//! An actor is in casting mode iff the registry holds a session for it.
//! Session values are shared as `Arc<Mutex<_>>` so timer and flush tasks can
//! hold on to the exact session they were scheduled for. Never lock a
//! session while holding a map guard: clone the `Arc` out first.

use crate::casting::session::ComboSession;
use crate::core::error::{CastError, Result};
use crate::core::types::{ActorId, ClassId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::time::Instant;

pub type SessionRef = Arc<Mutex<ComboSession>>;
/// Handle held by timer and flush tasks; does not keep the session alive
pub type WeakSessionRef = Weak<Mutex<ComboSession>>;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<ActorId, SessionRef>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, actor: ActorId) -> bool {
        self.sessions.contains_key(&actor)
    }

    /// Create a session for `actor`
    pub fn activate(&self, actor: ActorId, class_id: ClassId, now: Instant) -> Result<SessionRef> {
        match self.sessions.entry(actor) {
            Entry::Occupied(_) => Err(CastError::AlreadyActive(actor)),
            Entry::Vacant(slot) => {
                let session = Arc::new(Mutex::new(ComboSession::new(actor, class_id, now)));
                slot.insert(session.clone());
                Ok(session)
            }
        }
    }

    pub fn get(&self, actor: ActorId) -> Option<SessionRef> {
        self.sessions.get(&actor).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, actor: ActorId) -> Option<SessionRef> {
        self.sessions.remove(&actor).map(|(_, session)| session)
    }

    /// Remove `actor` only if its entry is still `session`
    ///
    /// Guards timeout expiry against removing a newer session that replaced
    /// the one the timer was armed for.
    pub fn remove_if_same(&self, actor: ActorId, session: &SessionRef) -> bool {
        self.sessions
            .remove_if(&actor, |_, current| Arc::ptr_eq(current, session))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activate_then_get() {
        let registry = SessionRegistry::new();
        let actor = ActorId::new();

        assert!(!registry.is_active(actor));
        let session = registry.activate(actor, "mage".into(), Instant::now()).unwrap();
        assert!(registry.is_active(actor));

        let fetched = registry.get(actor).unwrap();
        assert!(Arc::ptr_eq(&session, &fetched));
        assert_eq!(fetched.lock().class_id(), "mage");
    }

    #[test]
    fn test_double_activate_is_rejected() {
        let registry = SessionRegistry::new();
        let actor = ActorId::new();

        registry.activate(actor, "mage".into(), Instant::now()).unwrap();
        let second = registry.activate(actor, "mage".into(), Instant::now());
        assert!(matches!(second, Err(CastError::AlreadyActive(a)) if a == actor));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_if_same_ignores_replaced_session() {
        let registry = SessionRegistry::new();
        let actor = ActorId::new();

        let old = registry.activate(actor, "mage".into(), Instant::now()).unwrap();
        registry.remove(actor);
        let fresh = registry.activate(actor, "mage".into(), Instant::now()).unwrap();

        assert!(!registry.remove_if_same(actor, &old));
        assert!(registry.is_active(actor));
        assert!(registry.remove_if_same(actor, &fresh));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_missing_actor() {
        let registry = SessionRegistry::new();
        assert!(registry.remove(ActorId::new()).is_none());
    }
}
