//! The casting engine: routes input events and drives session transitions
//!
//! Three contexts touch a session: the dispatch path (toggle, click
//! enqueue, removal), debounce flush tasks and timeout tasks. All of them
//! lock the session before touching it, and the registry shard lock is only
//! ever taken after the session lock, never before. Feedback and skill
//! casts run after the session lock is released.
//!
//! Spawned tasks hold `Weak` references to the engine and the session, so
//! dropping the engine or removing a session never leaks a task that
//! keeps state alive.

use crate::casting::debounce::Enqueued;
use crate::casting::registry::{SessionRef, SessionRegistry, WeakSessionRef};
use crate::casting::resolver::{ComboResolver, ResolveOutcome};
use crate::casting::session::{ClickApplied, SessionState};
use crate::casting::timer::{Scheduler, TimerHandle};
use crate::casting::toggle::{ToggleController, ToggleResult};
use crate::core::config::{CastingConfig, DEFAULT_SOUND};
use crate::core::error::{CastError, Result};
use crate::core::types::{render_clicks, ActorId, ClickType, ComboPattern};
use crate::engine::events::{EventReceiver, InputEvent};
use crate::host::{AbilityInvoker, ActorProfile, Feedback};
use crate::loader::ConfigCache;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;

/// Host collaborators the engine calls out to
#[derive(Clone)]
pub struct Collaborators {
    pub feedback: Arc<dyn Feedback>,
    pub invoker: Arc<dyn AbilityInvoker>,
    pub profiles: Arc<dyn ActorProfile>,
}

/// Lifetime counters
///
/// Every session ends exactly one way, so at any quiet point
/// `activations == deactivations + expirations + removals + active sessions`.
#[derive(Debug, Default)]
pub struct EngineStats {
    activations: AtomicU64,
    deactivations: AtomicU64,
    expirations: AtomicU64,
    removals: AtomicU64,
    resolutions: AtomicU64,
    coalesced_clicks: AtomicU64,
    stale_timeouts: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub activations: u64,
    pub deactivations: u64,
    pub expirations: u64,
    pub removals: u64,
    pub resolutions: u64,
    pub coalesced_clicks: u64,
    pub stale_timeouts: u64,
}

impl EngineStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            activations: self.activations.load(Ordering::Relaxed),
            deactivations: self.deactivations.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            coalesced_clicks: self.coalesced_clicks.load(Ordering::Relaxed),
            stale_timeouts: self.stale_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Debug view of one actor's casting state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub active: bool,
    pub state: SessionState,
    pub class_id: Option<String>,
    pub clicks: Vec<ClickType>,
    /// Raw clicks waiting for the debounce flush
    pub pending_raw: usize,
    /// Time since the session was activated
    pub active_for: Option<Duration>,
    /// Time since the last applied click
    pub idle_for: Option<Duration>,
    pub remaining_cooldown: Option<Duration>,
}

/// One effect of a flush, replayed after the session lock is released
enum FlushStep {
    Progress(Vec<ClickType>),
    Rejected(Vec<ClickType>),
    Complete { pattern: ComboPattern, elapsed: Duration },
}

struct EngineInner {
    config: ConfigCache,
    registry: SessionRegistry,
    toggles: ToggleController,
    scheduler: Scheduler,
    hosts: Collaborators,
    stats: EngineStats,
}

/// Cheaply cloneable handle to the engine
#[derive(Clone)]
pub struct CastingEngine {
    inner: Arc<EngineInner>,
}

impl CastingEngine {
    /// Build an engine on the runtime of the calling context
    pub fn new(config: ConfigCache, hosts: Collaborators) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| CastError::NoRuntime)?;
        Ok(Self::with_runtime(runtime, config, hosts))
    }

    pub fn with_runtime(runtime: Handle, config: ConfigCache, hosts: Collaborators) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config,
                registry: SessionRegistry::new(),
                toggles: ToggleController::new(),
                scheduler: Scheduler::new(runtime),
                hosts,
                stats: EngineStats::default(),
            }),
        }
    }

    fn from_weak(weak: &Weak<EngineInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn config(&self) -> Arc<CastingConfig> {
        self.inner.config.current()
    }

    pub fn config_cache(&self) -> &ConfigCache {
        &self.inner.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn is_active(&self, actor: ActorId) -> bool {
        self.inner.registry.is_active(actor)
    }

    /// Drain the event channel until every sender is dropped
    pub async fn run(self, mut events: EventReceiver) {
        tracing::info!("Casting engine started");
        while let Some(event) = events.recv().await {
            self.dispatch(event);
        }
        tracing::info!("Casting engine stopped, {} sessions open", self.inner.registry.len());
    }

    /// Handle one input event synchronously
    pub fn dispatch(&self, event: InputEvent) {
        match event {
            InputEvent::Toggle { actor } => {
                self.toggle(actor);
            }
            InputEvent::Click { actor, click, at } => {
                self.enqueue_click_at(actor, click, at);
            }
            InputEvent::Attack { actor } => {
                self.attack(actor);
            }
            InputEvent::ActorRemoved { actor } => {
                self.remove_actor(actor);
            }
            InputEvent::Reload => {
                // Failures are logged and leave the previous config in place
                let _ = self.reload();
            }
        }
    }

    /// Switch casting mode for `actor`
    pub fn toggle(&self, actor: ActorId) -> ToggleResult {
        let inner = &self.inner;
        let config = self.config();
        let result = inner.toggles.toggle(
            actor,
            Instant::now(),
            &inner.registry,
            &config,
            || inner.hosts.profiles.class_of(actor),
            |session| {
                EngineStats::bump(&inner.stats.activations);
                let weak = Arc::downgrade(session);
                session
                    .lock()
                    .install_timeout(|generation| self.arm_timeout(&weak, generation, config.timeout));
            },
        );

        let (messages, sounds) = (&config.messages, &config.sounds);
        match &result {
            ToggleResult::Activated => {
                tracing::info!("Casting mode on for {}", actor);
                self.notify(actor, &messages.activation, Some(&sounds.activation));
            }
            ToggleResult::Deactivated => {
                EngineStats::bump(&inner.stats.deactivations);
                tracing::info!("Casting mode off for {}", actor);
                self.notify(actor, &messages.deactivation, Some(&sounds.cancel));
            }
            ToggleResult::RejectedCooldown { remaining } => {
                tracing::debug!("Toggle by {} rejected, {:?} cooldown left", actor, remaining);
                self.notify(actor, &messages.cooldown, None);
            }
            ToggleResult::RejectedNoClass => {
                tracing::debug!("Toggle by {} rejected, no class", actor);
                self.notify(actor, &messages.no_class, None);
            }
            ToggleResult::RejectedNoAbilities => {
                tracing::debug!("Toggle by {} rejected, class has no combos", actor);
                self.notify(actor, &messages.no_abilities, None);
            }
        }
        result
    }

    /// Queue a raw click received now
    pub fn enqueue_click(&self, actor: ActorId, click: ClickType) -> bool {
        self.enqueue_click_at(actor, click, Instant::now())
    }

    /// Queue a raw click received at `at`
    ///
    /// Returns false if the actor is not casting.
    pub fn enqueue_click_at(&self, actor: ActorId, click: ClickType, at: Instant) -> bool {
        let Some(session) = self.inner.registry.get(actor) else {
            return false;
        };
        let window = self.config().click_debounce;

        let mut guard = session.lock();
        if !guard.is_valid() {
            return false;
        }

        match guard.debounce.enqueue(click, at, window) {
            Enqueued::Coalesced => {
                EngineStats::bump(&self.inner.stats.coalesced_clicks);
                tracing::trace!("Coalesced repeat {} click from {}", click, actor);
            }
            Enqueued::Buffered { schedule_flush } => {
                // The flush handle is not kept; a late flush finds the
                // session invalid or gone
                if schedule_flush {
                    let engine = Arc::downgrade(&self.inner);
                    let target = Arc::downgrade(&session);
                    self.inner.scheduler.after(window, move || {
                        if let (Some(engine), Some(session)) =
                            (CastingEngine::from_weak(&engine), target.upgrade())
                        {
                            engine.flush(&session);
                        }
                    });
                }
            }
        }
        true
    }

    /// Entity attack; counts as a primary click when configured to
    pub fn attack(&self, actor: ActorId) -> bool {
        if !self.config().attack_counts_as_primary {
            return false;
        }
        self.enqueue_click(actor, ClickType::Primary)
    }

    /// Drop the actor's session without feedback or cooldown
    pub fn remove_actor(&self, actor: ActorId) -> bool {
        let removed = self
            .inner
            .toggles
            .force_off(actor, &self.inner.registry)
            .is_some();
        if removed {
            EngineStats::bump(&self.inner.stats.removals);
            tracing::info!("Removed casting session of departed actor {}", actor);
        }
        removed
    }

    /// Reparse the configuration source
    pub fn reload(&self) -> Result<Arc<CastingConfig>> {
        self.inner.config.force_reload().map_err(|e| {
            tracing::warn!("Casting config reload rejected: {}", e);
            e
        })
    }

    /// Load `path` into the cache, skipping the parse if unchanged
    pub fn load_config(&self, path: &Path) -> Result<Arc<CastingConfig>> {
        self.inner.config.load(path)
    }

    pub fn snapshot(&self, actor: ActorId) -> SessionSnapshot {
        let now = Instant::now();
        let remaining_cooldown = self.inner.toggles.cooldowns().remaining(actor, now);

        match self.inner.registry.get(actor) {
            Some(session) => {
                let session = session.lock();
                SessionSnapshot {
                    active: session.is_valid(),
                    state: session.state(),
                    class_id: Some(session.class_id().clone()),
                    clicks: session.clicks().to_vec(),
                    pending_raw: session.debounce.pending(),
                    active_for: Some(now.saturating_duration_since(session.created_at())),
                    idle_for: session
                        .last_click_at()
                        .map(|at| now.saturating_duration_since(at)),
                    remaining_cooldown,
                }
            }
            None => SessionSnapshot {
                active: false,
                state: SessionState::Inactive,
                class_id: None,
                clicks: Vec::new(),
                pending_raw: 0,
                active_for: None,
                idle_for: None,
                remaining_cooldown,
            },
        }
    }

    /// True if any combo of `class_id` casts `skill_id`
    pub fn is_skill_unlocked(&self, class_id: &str, skill_id: &str) -> bool {
        let config = self.config();
        let hosts = &self.inner.hosts;
        ComboResolver::new(&config, hosts.invoker.as_ref(), hosts.profiles.as_ref())
            .is_skill_unlocked(class_id, skill_id)
    }

    fn arm_timeout(
        &self,
        session: &WeakSessionRef,
        generation: u64,
        delay: Duration,
    ) -> TimerHandle {
        let engine = Arc::downgrade(&self.inner);
        let target = session.clone();
        self.inner.scheduler.timeout(generation, delay, move |generation| {
            if let (Some(engine), Some(session)) =
                (CastingEngine::from_weak(&engine), target.upgrade())
            {
                engine.expire(&session, generation);
            }
        })
    }

    /// Timeout callback: end the session if `generation` is still current
    fn expire(&self, session: &SessionRef, generation: u64) {
        let actor = {
            let mut guard = session.lock();
            if !guard.is_current_timeout(generation) {
                EngineStats::bump(&self.inner.stats.stale_timeouts);
                tracing::trace!("Ignoring stale timeout generation {}", generation);
                return;
            }
            let actor = guard.actor();
            if !self.inner.registry.remove_if_same(actor, session) {
                EngineStats::bump(&self.inner.stats.stale_timeouts);
                tracing::trace!("Timeout for {} fired after its session was replaced", actor);
                return;
            }
            guard.deactivate();
            actor
        };

        EngineStats::bump(&self.inner.stats.expirations);
        tracing::info!("Casting timed out for {}", actor);
        let config = self.config();
        self.notify(actor, &config.messages.cancel, Some(&config.sounds.cancel));
    }

    /// Debounce callback: apply every buffered click in receipt order
    fn flush(&self, session: &SessionRef) {
        let config = self.config();
        let weak = Arc::downgrade(session);

        let (actor, class_id, steps) = {
            let mut guard = session.lock();
            if !guard.is_valid() {
                return;
            }
            let actor = guard.actor();
            let class_id = guard.class_id().clone();
            let trie = config.profile(&class_id).map(|profile| &profile.trie);

            let mut steps = Vec::new();
            for click in guard.debounce.drain() {
                let applied = guard.append_click(click, Instant::now(), |generation| {
                    self.arm_timeout(&weak, generation, config.timeout)
                });
                match applied {
                    None => break,
                    Some(ClickApplied::Partial(clicks)) => {
                        let doomed = config.early_reject
                            && !trie.is_some_and(|trie| trie.is_potential_prefix(&clicks));
                        if doomed {
                            guard.reset_clicks();
                            steps.push(FlushStep::Rejected(clicks));
                        } else {
                            steps.push(FlushStep::Progress(clicks));
                        }
                    }
                    Some(ClickApplied::Complete { pattern, elapsed }) => {
                        steps.push(FlushStep::Complete { pattern, elapsed });
                    }
                }
            }
            (actor, class_id, steps)
        };

        let (messages, sounds) = (&config.messages, &config.sounds);
        for step in steps {
            match step {
                FlushStep::Progress(clicks) => {
                    let combo = render_clicks(&clicks);
                    tracing::debug!("{} combo progress {}", actor, combo);
                    self.notify(actor, &messages.render_progress(&combo), sounds.click.as_deref());
                }
                FlushStep::Rejected(clicks) => {
                    tracing::debug!(
                        "{} combo {} cannot complete for class '{}'",
                        actor,
                        render_clicks(&clicks),
                        class_id
                    );
                    self.notify(actor, &messages.cancel, Some(&sounds.cancel));
                }
                FlushStep::Complete { pattern, elapsed } => {
                    self.resolve(&config, actor, &class_id, &pattern, elapsed);
                }
            }
        }
    }

    fn resolve(
        &self,
        config: &CastingConfig,
        actor: ActorId,
        class_id: &str,
        pattern: &ComboPattern,
        elapsed: Duration,
    ) {
        EngineStats::bump(&self.inner.stats.resolutions);
        let hosts = &self.inner.hosts;
        let resolver = ComboResolver::new(config, hosts.invoker.as_ref(), hosts.profiles.as_ref());
        let outcome = resolver.resolve(actor, class_id, pattern);

        let (messages, sounds) = (&config.messages, &config.sounds);
        match outcome {
            ResolveOutcome::Cast {
                skill_id,
                success: true,
            } => {
                tracing::info!("{} cast {} with {} in {:?}", actor, skill_id, pattern, elapsed);
                self.notify(
                    actor,
                    &messages.render_success(&skill_id, elapsed),
                    Some(&sounds.success),
                );
            }
            ResolveOutcome::Cast {
                skill_id,
                success: false,
            } => {
                tracing::debug!("{} failed to cast {}", actor, skill_id);
                self.notify(actor, &messages.cancel, Some(&sounds.cancel));
            }
            ResolveOutcome::InvalidCombo => {
                tracing::debug!("{} entered unbound combo {} as '{}'", actor, pattern, class_id);
                self.notify(actor, &messages.cancel, Some(&sounds.cancel));
            }
            ResolveOutcome::InsufficientLevel {
                min_level,
                skill_id,
            } => {
                tracing::debug!("{} is below level {} for {}", actor, min_level, skill_id);
                self.notify(
                    actor,
                    &messages.render_insufficient_level(min_level, &skill_id),
                    Some(&sounds.cancel),
                );
            }
        }
    }

    fn notify(&self, actor: ActorId, message: &str, sound: Option<&str>) {
        if message.is_empty() && sound.is_none() {
            return;
        }
        let feedback = &self.inner.hosts.feedback;
        let sound = sound.map(|id| {
            if feedback.is_known_sound(id) {
                id
            } else {
                tracing::warn!("Unknown sound '{}', playing {}", id, DEFAULT_SOUND);
                DEFAULT_SOUND
            }
        });
        feedback.notify(actor, message, sound);
    }
}
