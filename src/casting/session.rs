//! Per-actor combo session state machine
//!
//! ```text
//! INACTIVE --activate--> ACTIVE_EMPTY --click--> ACTIVE_PARTIAL(1..2)
//!                             ^                        |
//!                             +---- RESOLVING (n=3) <--+
//! any ACTIVE state --timeout / toggle-off / removal--> INACTIVE
//! ```
//!
//! INACTIVE is represented by the absence of a session in the registry plus
//! `valid == false` on any session object still referenced by in-flight
//! tasks. Every mutating method is a no-op on an invalid session.

use crate::casting::debounce::DebounceBuffer;
use crate::casting::timer::TimerHandle;
use crate::core::types::{ActorId, ClassId, ClickType, ComboPattern, COMBO_LEN};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Observable state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Inactive,
    ActiveEmpty,
    ActivePartial(usize),
}

/// Result of applying one click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickApplied {
    /// Combo still in progress; holds the clicks so far
    Partial(Vec<ClickType>),
    /// Third click landed; the session is already reset to empty
    Complete {
        pattern: ComboPattern,
        /// From the first click of the combo to the last
        elapsed: Duration,
    },
}

#[derive(Debug)]
pub struct ComboSession {
    actor: ActorId,
    class_id: ClassId,
    clicks: Vec<ClickType>,
    created_at: Instant,
    last_click_at: Option<Instant>,
    combo_started_at: Option<Instant>,
    timeout: Option<TimerHandle>,
    generation: u64,
    valid: bool,
    pub debounce: DebounceBuffer,
}

impl ComboSession {
    pub fn new(actor: ActorId, class_id: ClassId, now: Instant) -> Self {
        Self {
            actor,
            class_id,
            clicks: Vec::with_capacity(COMBO_LEN),
            created_at: now,
            last_click_at: None,
            combo_started_at: None,
            timeout: None,
            generation: 0,
            valid: true,
            debounce: DebounceBuffer::new(),
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn class_id(&self) -> &ClassId {
        &self.class_id
    }

    pub fn clicks(&self) -> &[ClickType] {
        &self.clicks
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_click_at(&self) -> Option<Instant> {
        self.last_click_at
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn state(&self) -> SessionState {
        match (self.valid, self.clicks.len()) {
            (false, _) => SessionState::Inactive,
            (true, 0) => SessionState::ActiveEmpty,
            (true, n) => SessionState::ActivePartial(n),
        }
    }

    /// Replace the outstanding timeout
    ///
    /// The previous handle is cancelled before `schedule` runs, and the
    /// generation is bumped so a previous timer that already woke up is
    /// recognised as stale.
    pub fn install_timeout<F>(&mut self, schedule: F) -> u64
    where
        F: FnOnce(u64) -> TimerHandle,
    {
        self.cancel_timeout();
        self.generation += 1;
        self.timeout = Some(schedule(self.generation));
        self.generation
    }

    pub fn cancel_timeout(&mut self) {
        if let Some(handle) = self.timeout.take() {
            handle.cancel();
        }
    }

    /// True if a timer carrying `generation` is the one currently installed
    pub fn is_current_timeout(&self, generation: u64) -> bool {
        self.valid
            && self
                .timeout
                .as_ref()
                .is_some_and(|handle| handle.generation() == generation)
    }

    pub fn timeout_generation(&self) -> Option<u64> {
        self.timeout.as_ref().map(TimerHandle::generation)
    }

    /// Apply one logical click and re-arm the timeout
    ///
    /// Reaching three clicks resets the combo in the same step, so the
    /// session is never left holding a full combo.
    pub fn append_click<F>(&mut self, click: ClickType, now: Instant, schedule: F) -> Option<ClickApplied>
    where
        F: FnOnce(u64) -> TimerHandle,
    {
        if !self.valid {
            return None;
        }

        self.install_timeout(schedule);

        if self.clicks.is_empty() {
            self.combo_started_at = Some(now);
        }
        self.clicks.push(click);
        self.last_click_at = Some(now);

        if self.clicks.len() < COMBO_LEN {
            return Some(ClickApplied::Partial(self.clicks.clone()));
        }

        let pattern = ComboPattern::from_slice(&self.clicks)?;
        let elapsed = self
            .combo_started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default();
        self.reset_clicks();
        Some(ClickApplied::Complete { pattern, elapsed })
    }

    /// Drop the partial combo, keeping casting mode active
    pub fn reset_clicks(&mut self) {
        self.clicks.clear();
        self.combo_started_at = None;
    }

    /// Transition to INACTIVE
    ///
    /// Returns false if the session was already inactive. Pending debounce
    /// flushes are left alone; they find the session invalid and do nothing.
    pub fn deactivate(&mut self) -> bool {
        if !self.valid {
            return false;
        }
        self.valid = false;
        self.cancel_timeout();
        self.reset_clicks();
        true
    }
}
