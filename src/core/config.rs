//! Casting configuration with documented defaults
//!
//! A `CastingConfig` is an immutable snapshot. It is built once per load by
//! the loader and replaced wholesale on reload, never mutated in place.

use crate::casting::trie::ComboTrie;
use crate::core::types::{ClassId, ComboPattern};
use ahash::AHashMap;
use std::time::Duration;

/// Sound substituted whenever a configured sound id is empty or unknown
pub const DEFAULT_SOUND: &str = "block.note_block.harp";

/// Sound ids played on casting transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundSet {
    /// Played when casting mode is switched on
    pub activation: String,
    /// Played on timeout, invalid combo, failed cast and deactivation
    pub cancel: String,
    /// Played after a successful cast
    pub success: String,
    /// Played for every applied click (None = silent clicks)
    pub click: Option<String>,
}

impl Default for SoundSet {
    fn default() -> Self {
        Self {
            activation: "entity.experience_orb.pickup".into(),
            cancel: "entity.blaze.hurt".into(),
            success: "entity.player.levelup".into(),
            click: Some("ui.button.click".into()),
        }
    }
}

/// User-facing message templates
///
/// Placeholders: `{minLevel}`, `{skill}`, `{combo}`, `{elapsed}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSet {
    pub activation: String,
    pub deactivation: String,
    pub cancel: String,
    pub insufficient_level: String,
    pub success: String,
    pub cooldown: String,
    pub no_class: String,
    pub no_abilities: String,
    pub progress: String,
}

impl Default for MessageSet {
    fn default() -> Self {
        Self {
            activation: "Casting mode activated!".into(),
            deactivation: "Casting mode deactivated!".into(),
            cancel: "Casting cancelled!".into(),
            insufficient_level: "You need level {minLevel} to cast {skill}.".into(),
            success: "Cast {skill}!".into(),
            cooldown: "You must wait before toggling casting mode again!".into(),
            no_class: "No class selected!".into(),
            no_abilities: "Your class does not support any key combos.".into(),
            progress: "Combo: {combo}".into(),
        }
    }
}

impl MessageSet {
    pub fn render_insufficient_level(&self, min_level: u32, skill: &str) -> String {
        self.insufficient_level
            .replace("{minLevel}", &min_level.to_string())
            .replace("{skill}", skill)
    }

    pub fn render_success(&self, skill: &str, elapsed: Duration) -> String {
        self.success
            .replace("{skill}", skill)
            .replace("{elapsed}", &elapsed.as_millis().to_string())
    }

    pub fn render_progress(&self, combo: &str) -> String {
        self.progress.replace("{combo}", combo)
    }
}

/// A combo bound to a castable skill with a level gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbilityBinding {
    pub combo_pattern: ComboPattern,
    pub skill_id: String,
    pub min_level: u32,
}

/// All ability bindings of one class
#[derive(Debug, Clone, Default)]
pub struct ClassCastingProfile {
    pub class_id: ClassId,
    pub abilities: AHashMap<ComboPattern, AbilityBinding>,
    /// Prefix tree over `abilities` keys, rebuilt with the profile
    pub trie: ComboTrie,
}

impl ClassCastingProfile {
    pub fn new(class_id: impl Into<ClassId>) -> Self {
        Self {
            class_id: class_id.into(),
            ..Self::default()
        }
    }

    /// Add a binding, keeping the trie in sync
    pub fn insert(&mut self, binding: AbilityBinding) {
        self.trie.insert(&binding.combo_pattern);
        self.abilities.insert(binding.combo_pattern, binding);
    }

    pub fn binding(&self, pattern: &ComboPattern) -> Option<&AbilityBinding> {
        self.abilities.get(pattern)
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

/// Immutable casting configuration snapshot
#[derive(Debug, Clone)]
pub struct CastingConfig {
    /// Combo abandon window
    ///
    /// Measured from the last applied click, or from activation if the
    /// actor has not clicked yet. Expiry removes the session.
    pub timeout: Duration,

    /// Toggle re-activation cooldown, installed on deactivation
    pub cooldown: Duration,

    /// Debounce aggregation window
    ///
    /// Raw clicks are held this long before being applied. Same-type raw
    /// clicks closer together than this are one logical click.
    pub click_debounce: Duration,

    /// Treat entity-attack events as PRIMARY clicks
    pub attack_counts_as_primary: bool,

    /// Reset a partial combo as soon as no binding can complete it
    pub early_reject: bool,

    pub sounds: SoundSet,
    pub messages: MessageSet,

    /// Class id (lower case) to profile
    pub profiles: AHashMap<ClassId, ClassCastingProfile>,

    /// Hex BLAKE3 digest of the source the snapshot was parsed from
    pub source_hash: String,
}

impl Default for CastingConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5_000),
            cooldown: Duration::from_millis(1_000),
            click_debounce: Duration::from_millis(10),
            attack_counts_as_primary: true,
            early_reject: false,
            sounds: SoundSet::default(),
            messages: MessageSet::default(),
            profiles: AHashMap::new(),
            source_hash: String::new(),
        }
    }
}

impl CastingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a class profile, case-insensitively
    pub fn profile(&self, class_id: &str) -> Option<&ClassCastingProfile> {
        self.profiles
            .get(class_id)
            .or_else(|| self.profiles.get(&class_id.to_lowercase()))
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout.is_zero() {
            return Err("timeout_ms must be positive".into());
        }

        if self.click_debounce.is_zero() {
            return Err("click_debounce_ms must be positive".into());
        }

        // A debounce window as long as the timeout would expire every combo
        if self.click_debounce >= self.timeout {
            return Err(format!(
                "click_debounce_ms ({}) should be < timeout_ms ({})",
                self.click_debounce.as_millis(),
                self.timeout.as_millis()
            ));
        }

        for (class_id, profile) in &self.profiles {
            for binding in profile.abilities.values() {
                if binding.skill_id.trim().is_empty() {
                    return Err(format!(
                        "class '{}' combo {} has an empty skill id",
                        class_id, binding.combo_pattern
                    ));
                }
            }
        }

        Ok(())
    }
}
