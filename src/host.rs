//! Boundary to the host system
//!
//! The engine never renders, levels or executes skills itself. It talks to
//! the host through these three traits. The in-memory implementations back
//! the demo binary and the tests.

use crate::core::types::{ActorId, ClassId};
use ahash::{AHashMap, AHashSet};
use parking_lot::{Mutex, RwLock};

/// Best-effort, fire-and-forget actor feedback
pub trait Feedback: Send + Sync {
    fn notify(&self, actor: ActorId, message: &str, sound: Option<&str>);

    /// Whether the host can play `sound`; unknown ids are replaced before `notify`
    fn is_known_sound(&self, _sound: &str) -> bool {
        true
    }
}

/// Opaque skill execution; the engine never retries a call
pub trait AbilityInvoker: Send + Sync {
    fn cast(&self, actor: ActorId, skill_id: &str) -> bool;

    fn knows_skill(&self, _skill_id: &str) -> bool {
        true
    }
}

/// Read-only view of the class and leveling subsystems
pub trait ActorProfile: Send + Sync {
    fn class_of(&self, actor: ActorId) -> Option<ClassId>;
    fn level_of(&self, actor: ActorId) -> u32;
}

/// Class and level table kept in memory
#[derive(Debug, Default)]
pub struct MemoryProfiles {
    actors: RwLock<AHashMap<ActorId, (ClassId, u32)>>,
}

impl MemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, actor: ActorId, class_id: impl Into<ClassId>, level: u32) {
        self.actors.write().insert(actor, (class_id.into(), level));
    }

    pub fn set_level(&self, actor: ActorId, level: u32) {
        if let Some(entry) = self.actors.write().get_mut(&actor) {
            entry.1 = level;
        }
    }

    pub fn clear(&self, actor: ActorId) {
        self.actors.write().remove(&actor);
    }
}

impl ActorProfile for MemoryProfiles {
    fn class_of(&self, actor: ActorId) -> Option<ClassId> {
        self.actors.read().get(&actor).map(|(class, _)| class.clone())
    }

    fn level_of(&self, actor: ActorId) -> u32 {
        self.actors.read().get(&actor).map_or(0, |(_, level)| *level)
    }
}

/// One delivered feedback call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub actor: ActorId,
    pub message: String,
    pub sound: Option<String>,
}

/// Feedback sink that keeps everything it receives
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    log: Mutex<Vec<Notification>>,
    known_sounds: Option<AHashSet<String>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept the listed sound ids
    pub fn with_known_sounds<I, S>(sounds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            log: Mutex::new(Vec::new()),
            known_sounds: Some(sounds.into_iter().map(Into::into).collect()),
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.log.lock().clone()
    }

    pub fn messages_for(&self, actor: ActorId) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .filter(|n| n.actor == actor)
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn last_for(&self, actor: ActorId) -> Option<Notification> {
        self.log.lock().iter().rev().find(|n| n.actor == actor).cloned()
    }
}

impl Feedback for RecordingFeedback {
    fn notify(&self, actor: ActorId, message: &str, sound: Option<&str>) {
        self.log.lock().push(Notification {
            actor,
            message: message.to_string(),
            sound: sound.map(str::to_string),
        });
    }

    fn is_known_sound(&self, sound: &str) -> bool {
        self.known_sounds
            .as_ref()
            .map_or(true, |known| known.contains(sound))
    }
}

/// Skill executor that records every call
#[derive(Debug)]
pub struct RecordingInvoker {
    casts: Mutex<Vec<(ActorId, String)>>,
    succeed: bool,
    known_skills: Option<AHashSet<String>>,
}

impl Default for RecordingInvoker {
    fn default() -> Self {
        Self {
            casts: Mutex::new(Vec::new()),
            succeed: true,
            known_skills: None,
        }
    }
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every cast reports failure
    pub fn failing() -> Self {
        Self {
            succeed: false,
            ..Self::default()
        }
    }

    pub fn with_known_skills<I, S>(skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_skills: Some(skills.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn casts(&self) -> Vec<(ActorId, String)> {
        self.casts.lock().clone()
    }

    pub fn cast_count(&self) -> usize {
        self.casts.lock().len()
    }
}

impl AbilityInvoker for RecordingInvoker {
    fn cast(&self, actor: ActorId, skill_id: &str) -> bool {
        self.casts.lock().push((actor, skill_id.to_string()));
        self.succeed
    }

    fn knows_skill(&self, skill_id: &str) -> bool {
        self.known_skills
            .as_ref()
            .map_or(true, |known| known.contains(skill_id))
    }
}
