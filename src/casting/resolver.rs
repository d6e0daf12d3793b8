//! Resolves a completed combo to an ability and casts it
//!
//! The resolver borrows the config snapshot and the host collaborators for
//! the duration of one resolution. It must be called without any session
//! lock held, since `AbilityInvoker::cast` is an external call.

use crate::core::config::CastingConfig;
use crate::core::types::{ActorId, ComboPattern};
use crate::host::{AbilityInvoker, ActorProfile};
use serde::Serialize;

/// Result of resolving one complete combo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResolveOutcome {
    /// The skill was handed to the invoker (or rejected as unknown when `success` is false)
    Cast { skill_id: String, success: bool },
    /// No binding for this pattern in the class profile
    InvalidCombo,
    /// Bound, but the actor's level is below `min_level`
    InsufficientLevel { min_level: u32, skill_id: String },
}

impl ResolveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ResolveOutcome::Cast { success: true, .. })
    }
}

pub struct ComboResolver<'a> {
    config: &'a CastingConfig,
    invoker: &'a dyn AbilityInvoker,
    profiles: &'a dyn ActorProfile,
}

impl<'a> ComboResolver<'a> {
    pub fn new(
        config: &'a CastingConfig,
        invoker: &'a dyn AbilityInvoker,
        profiles: &'a dyn ActorProfile,
    ) -> Self {
        Self {
            config,
            invoker,
            profiles,
        }
    }

    /// Look up `pattern` for `class_id` and cast the bound skill if allowed
    pub fn resolve(&self, actor: ActorId, class_id: &str, pattern: &ComboPattern) -> ResolveOutcome {
        let Some(binding) = self
            .config
            .profile(class_id)
            .and_then(|profile| profile.binding(pattern))
        else {
            return ResolveOutcome::InvalidCombo;
        };

        let level = self.profiles.level_of(actor);
        if level < binding.min_level {
            return ResolveOutcome::InsufficientLevel {
                min_level: binding.min_level,
                skill_id: binding.skill_id.clone(),
            };
        }

        if !self.invoker.knows_skill(&binding.skill_id) {
            tracing::warn!(
                "Combo {} for class '{}' is bound to unknown skill '{}'",
                pattern,
                class_id,
                binding.skill_id
            );
            return ResolveOutcome::Cast {
                skill_id: binding.skill_id.clone(),
                success: false,
            };
        }

        let success = self.invoker.cast(actor, &binding.skill_id);
        if !success {
            tracing::debug!("Cast of '{}' by {} failed", binding.skill_id, actor);
        }
        ResolveOutcome::Cast {
            skill_id: binding.skill_id.clone(),
            success,
        }
    }

    /// True if any combo of the class is bound to `skill_id`
    pub fn is_skill_unlocked(&self, class_id: &str, skill_id: &str) -> bool {
        self.config.profile(class_id).is_some_and(|profile| {
            profile
                .abilities
                .values()
                .any(|binding| binding.skill_id.eq_ignore_ascii_case(skill_id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{AbilityBinding, ClassCastingProfile};
    use crate::host::{MemoryProfiles, RecordingInvoker};

    fn mage_config() -> CastingConfig {
        let mut profile = ClassCastingProfile::new("mage");
        profile.insert(AbilityBinding {
            combo_pattern: "LRL".parse().unwrap(),
            skill_id: "fireball".into(),
            min_level: 5,
        });
        let mut config = CastingConfig::default();
        config.profiles.insert("mage".into(), profile);
        config
    }

    #[test]
    fn test_resolve_outcomes_by_level() {
        let config = mage_config();
        let invoker = RecordingInvoker::new();
        let profiles = MemoryProfiles::new();
        let actor = ActorId::new();
        let resolver = ComboResolver::new(&config, &invoker, &profiles);
        let lrl: ComboPattern = "LRL".parse().unwrap();

        profiles.set(actor, "mage", 10);
        assert_eq!(
            resolver.resolve(actor, "mage", &lrl),
            ResolveOutcome::Cast {
                skill_id: "fireball".into(),
                success: true
            }
        );

        profiles.set_level(actor, 3);
        assert_eq!(
            resolver.resolve(actor, "mage", &lrl),
            ResolveOutcome::InsufficientLevel {
                min_level: 5,
                skill_id: "fireball".into()
            }
        );

        assert_eq!(
            resolver.resolve(actor, "mage", &"RRR".parse().unwrap()),
            ResolveOutcome::InvalidCombo
        );
        assert_eq!(invoker.cast_count(), 1);
    }

    #[test]
    fn test_unknown_class_is_invalid_combo() {
        let config = mage_config();
        let invoker = RecordingInvoker::new();
        let profiles = MemoryProfiles::new();
        let resolver = ComboResolver::new(&config, &invoker, &profiles);

        let outcome = resolver.resolve(ActorId::new(), "warrior", &"LRL".parse().unwrap());
        assert_eq!(outcome, ResolveOutcome::InvalidCombo);
    }

    #[test]
    fn test_failed_cast_is_still_cast() {
        let config = mage_config();
        let invoker = RecordingInvoker::failing();
        let profiles = MemoryProfiles::new();
        let actor = ActorId::new();
        profiles.set(actor, "mage", 10);

        let resolver = ComboResolver::new(&config, &invoker, &profiles);
        let outcome = resolver.resolve(actor, "mage", &"LRL".parse().unwrap());
        assert_eq!(
            outcome,
            ResolveOutcome::Cast {
                skill_id: "fireball".into(),
                success: false
            }
        );
        assert!(!outcome.is_success());
        assert_eq!(invoker.cast_count(), 1);
    }

    #[test]
    fn test_unknown_skill_is_never_cast() {
        let config = mage_config();
        let invoker = RecordingInvoker::with_known_skills(["heal"]);
        let profiles = MemoryProfiles::new();
        let actor = ActorId::new();
        profiles.set(actor, "mage", 10);

        let resolver = ComboResolver::new(&config, &invoker, &profiles);
        let outcome = resolver.resolve(actor, "mage", &"LRL".parse().unwrap());
        assert!(matches!(outcome, ResolveOutcome::Cast { success: false, .. }));
        assert_eq!(invoker.cast_count(), 0);
    }

    #[test]
    fn test_skill_unlock_query() {
        let config = mage_config();
        let invoker = RecordingInvoker::new();
        let profiles = MemoryProfiles::new();
        let resolver = ComboResolver::new(&config, &invoker, &profiles);

        assert!(resolver.is_skill_unlocked("mage", "FireBall"));
        assert!(!resolver.is_skill_unlocked("mage", "heal"));
        assert!(!resolver.is_skill_unlocked("warrior", "fireball"));
    }
}
