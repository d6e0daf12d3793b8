//! Casting mode toggle with re-activation cooldown

use crate::casting::registry::{SessionRegistry, SessionRef};
use crate::core::config::CastingConfig;
use crate::core::error::CastError;
use crate::core::types::{ActorId, ClassId};
use dashmap::DashMap;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of a toggle request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ToggleResult {
    Activated,
    Deactivated,
    RejectedCooldown { remaining: Duration },
    RejectedNoClass,
    RejectedNoAbilities,
}

/// Per-actor "may not toggle before" markers, installed on deactivation
#[derive(Debug, Default)]
pub struct ToggleCooldowns {
    until: DashMap<ActorId, Instant>,
}

impl ToggleCooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, actor: ActorId, until: Instant) {
        self.until.insert(actor, until);
    }

    /// Time left on the actor's cooldown; an expired marker is discarded
    pub fn remaining(&self, actor: ActorId, now: Instant) -> Option<Duration> {
        let until = *self.until.get(&actor)?;
        if now < until {
            return Some(until - now);
        }
        self.until.remove_if(&actor, |_, current| *current == until);
        None
    }

    pub fn clear(&self, actor: ActorId) {
        self.until.remove(&actor);
    }

    pub fn len(&self) -> usize {
        self.until.len()
    }

    pub fn is_empty(&self) -> bool {
        self.until.is_empty()
    }
}

/// Decides activation vs deactivation and owns the cooldown markers
#[derive(Debug, Default)]
pub struct ToggleController {
    cooldowns: ToggleCooldowns,
}

impl ToggleController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cooldowns(&self) -> &ToggleCooldowns {
        &self.cooldowns
    }

    /// Flip casting mode for `actor`
    ///
    /// `class_of` is only consulted when activating. `on_activate` receives
    /// the freshly registered session, typically to arm its first timeout.
    pub fn toggle<C, A>(
        &self,
        actor: ActorId,
        now: Instant,
        registry: &SessionRegistry,
        config: &CastingConfig,
        class_of: C,
        on_activate: A,
    ) -> ToggleResult
    where
        C: FnOnce() -> Option<ClassId>,
        A: FnOnce(&SessionRef),
    {
        if let Some(remaining) = self.cooldowns.remaining(actor, now) {
            return ToggleResult::RejectedCooldown { remaining };
        }

        if let Some(session) = registry.remove(actor) {
            if session.lock().deactivate() {
                self.cooldowns.install(actor, now + config.cooldown);
                return ToggleResult::Deactivated;
            }
            // Lost the race against its own timeout; treat as inactive
        }

        let Some(class_id) = class_of() else {
            return ToggleResult::RejectedNoClass;
        };

        if config.profile(&class_id).map_or(true, |p| p.is_empty()) {
            return ToggleResult::RejectedNoAbilities;
        }

        match registry.activate(actor, class_id, now) {
            Ok(session) => {
                on_activate(&session);
                ToggleResult::Activated
            }
            Err(CastError::AlreadyActive(_)) => {
                tracing::debug!("Concurrent activation for {}, keeping existing session", actor);
                ToggleResult::Activated
            }
            Err(e) => {
                tracing::warn!("Activation failed for {}: {}", actor, e);
                ToggleResult::RejectedNoClass
            }
        }
    }

    /// Deactivate without feedback or cooldown (actor left the host)
    pub fn force_off(&self, actor: ActorId, registry: &SessionRegistry) -> Option<SessionRef> {
        self.cooldowns.clear(actor);
        let session = registry.remove(actor)?;
        session.lock().deactivate();
        Some(session)
    }
}
