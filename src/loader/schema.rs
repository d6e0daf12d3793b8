//! TOML representation of the casting configuration file
//!
//! Every field is optional; anything missing falls back to
//! `CastingConfig::default()`. Keys are snake_case, with camelCase aliases
//! for files written against the older layout. Unknown keys are rejected
//! so a misspelled setting never silently falls back to its default.

use crate::core::config::{
    AbilityBinding, CastingConfig, ClassCastingProfile, MessageSet, SoundSet, DEFAULT_SOUND,
};
use crate::core::types::ComboPattern;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Whole configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlCastingFile {
    #[serde(default)]
    pub casting: TomlCasting,
    /// class id -> combo key -> binding
    #[serde(default)]
    pub profiles: BTreeMap<String, BTreeMap<String, TomlBinding>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlCasting {
    #[serde(default, alias = "timeoutMs")]
    pub timeout_ms: Option<u64>,
    #[serde(default, alias = "cooldownMs")]
    pub cooldown_ms: Option<u64>,
    #[serde(default, alias = "clickDebounceMs")]
    pub click_debounce_ms: Option<u64>,
    #[serde(default, alias = "attackCountsAsPrimary")]
    pub attack_counts_as_primary: Option<bool>,
    #[serde(default, alias = "earlyReject")]
    pub early_reject: Option<bool>,
    #[serde(default)]
    pub sounds: TomlSounds,
    #[serde(default)]
    pub messages: TomlMessages,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlSounds {
    pub activation: Option<String>,
    pub cancel: Option<String>,
    pub success: Option<String>,
    pub click: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlMessages {
    pub activation: Option<String>,
    pub deactivation: Option<String>,
    pub cancel: Option<String>,
    #[serde(default, alias = "insufficientLevel")]
    pub insufficient_level: Option<String>,
    pub success: Option<String>,
    pub cooldown: Option<String>,
    #[serde(default, alias = "noClass")]
    pub no_class: Option<String>,
    #[serde(default, alias = "noAbilities")]
    pub no_abilities: Option<String>,
    pub progress: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlBinding {
    #[serde(alias = "skillId", alias = "skill_id")]
    pub skill: String,
    #[serde(default, alias = "minLevel")]
    pub min_level: u32,
}

impl TomlCastingFile {
    /// Build a config snapshot; `Err` carries a validation message
    pub fn into_config(self, source_hash: String) -> Result<CastingConfig, String> {
        let defaults = CastingConfig::default();
        let casting = self.casting;

        let mut config = CastingConfig {
            timeout: casting
                .timeout_ms
                .map_or(defaults.timeout, Duration::from_millis),
            cooldown: casting
                .cooldown_ms
                .map_or(defaults.cooldown, Duration::from_millis),
            click_debounce: casting
                .click_debounce_ms
                .map_or(defaults.click_debounce, Duration::from_millis),
            attack_counts_as_primary: casting
                .attack_counts_as_primary
                .unwrap_or(defaults.attack_counts_as_primary),
            early_reject: casting.early_reject.unwrap_or(defaults.early_reject),
            sounds: casting.sounds.into_sounds(defaults.sounds),
            messages: casting.messages.into_messages(defaults.messages),
            profiles: Default::default(),
            source_hash,
        };

        for (class, combos) in self.profiles {
            let class_id = class.trim().to_lowercase();
            if class_id.is_empty() {
                return Err("profile with an empty class id".into());
            }
            if config.profiles.contains_key(&class_id) {
                return Err(format!("class '{}' is defined more than once", class_id));
            }

            let mut profile = ClassCastingProfile::new(class_id.clone());
            for (key, binding) in combos {
                let pattern: ComboPattern = key
                    .parse()
                    .map_err(|e| format!("class '{}': {}", class_id, e))?;
                if profile.binding(&pattern).is_some() {
                    return Err(format!(
                        "class '{}': combo {} is bound more than once",
                        class_id, pattern
                    ));
                }
                profile.insert(AbilityBinding {
                    combo_pattern: pattern,
                    skill_id: binding.skill.trim().to_string(),
                    min_level: binding.min_level,
                });
            }
            config.profiles.insert(class_id, profile);
        }

        config.validate()?;
        Ok(config)
    }
}

impl TomlSounds {
    fn into_sounds(self, defaults: SoundSet) -> SoundSet {
        SoundSet {
            activation: sound_or_default("activation", self.activation, defaults.activation),
            cancel: sound_or_default("cancel", self.cancel, defaults.cancel),
            success: sound_or_default("success", self.success, defaults.success),
            // An empty click sound silences clicks
            click: match self.click {
                Some(id) if id.trim().is_empty() => None,
                Some(id) => Some(id.trim().to_string()),
                None => defaults.click,
            },
        }
    }
}

fn sound_or_default(key: &str, value: Option<String>, default: String) -> String {
    match value {
        None => default,
        Some(id) if id.trim().is_empty() => {
            tracing::warn!("Empty sound id for '{}', using {}", key, DEFAULT_SOUND);
            DEFAULT_SOUND.to_string()
        }
        Some(id) => id.trim().to_string(),
    }
}

impl TomlMessages {
    fn into_messages(self, defaults: MessageSet) -> MessageSet {
        MessageSet {
            activation: self.activation.unwrap_or(defaults.activation),
            deactivation: self.deactivation.unwrap_or(defaults.deactivation),
            cancel: self.cancel.unwrap_or(defaults.cancel),
            insufficient_level: self
                .insufficient_level
                .unwrap_or(defaults.insufficient_level),
            success: self.success.unwrap_or(defaults.success),
            cooldown: self.cooldown.unwrap_or(defaults.cooldown),
            no_class: self.no_class.unwrap_or(defaults.no_class),
            no_abilities: self.no_abilities.unwrap_or(defaults.no_abilities),
            progress: self.progress.unwrap_or(defaults.progress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<CastingConfig, String> {
        let file: TomlCastingFile = toml::from_str(content).map_err(|e| e.to_string())?;
        file.into_config(String::new())
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("").unwrap();
        let defaults = CastingConfig::default();
        assert_eq!(config.timeout, defaults.timeout);
        assert_eq!(config.sounds, defaults.sounds);
        assert_eq!(config.messages, defaults.messages);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_profiles_and_combo_key_forms() {
        let config = parse(
            r#"
            [casting]
            timeoutMs = 3000
            early_reject = true

            [profiles.Mage.LRL]
            skill = "fireball"
            minLevel = 5

            [profiles.Mage."r,r,l"]
            skill = "frost_nova"
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout, Duration::from_millis(3000));
        assert!(config.early_reject);

        let mage = config.profile("mage").unwrap();
        let fireball = mage.binding(&"LRL".parse().unwrap()).unwrap();
        assert_eq!(fireball.skill_id, "fireball");
        assert_eq!(fireball.min_level, 5);

        let nova = mage.binding(&"RRL".parse().unwrap()).unwrap();
        assert_eq!(nova.min_level, 0);
        assert!(mage.trie.is_potential_prefix(&nova.combo_pattern.clicks()[..1]));
    }

    #[test]
    fn test_bad_combo_key_is_rejected() {
        let err = parse(
            r#"
            [profiles.mage.LXL]
            skill = "fireball"
            "#,
        )
        .unwrap_err();
        assert!(err.contains("mage"));
    }

    #[test]
    fn test_duplicate_combo_is_rejected() {
        let result = parse(
            r#"
            [profiles.mage.LRL]
            skill = "fireball"
            [profiles.mage."L-R-L"]
            skill = "heal"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_sounds_are_substituted() {
        let config = parse(
            r#"
            [casting.sounds]
            cancel = ""
            click = ""
            "#,
        )
        .unwrap();
        assert_eq!(config.sounds.cancel, DEFAULT_SOUND);
        assert_eq!(config.sounds.click, None);
        assert_eq!(config.sounds.success, SoundSet::default().success);
    }

    #[test]
    fn test_invalid_timing_fails_validation() {
        assert!(parse("[casting]\ntimeout_ms = 0").is_err());
        assert!(parse("[casting]\ntimeout_ms = 10\nclick_debounce_ms = 20").is_err());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        // A misspelled level requirement must not load as level 0
        let binding = parse("[profiles.mage.LRL]\nskill = \"meteor\"\nminlevel = 50");
        assert!(binding.unwrap_err().contains("minlevel"));

        assert!(parse("[casting]\ntimout_ms = 200").is_err());
        assert!(parse("[casting.sounds]\nsucess = \"x\"").is_err());
        assert!(parse("[casting.messages]\nactivated = \"On\"").is_err());
    }

    #[test]
    fn test_aliases_still_accepted_with_strict_keys() {
        let config = parse(
            r#"
            [casting]
            clickDebounceMs = 5

            [casting.messages]
            noClass = "Pick a class"

            [profiles.mage.LRL]
            skillId = "fireball"
            minLevel = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.click_debounce, Duration::from_millis(5));
        assert_eq!(config.messages.no_class, "Pick a class");
        let fireball = config.profile("mage").unwrap().binding(&"LRL".parse().unwrap()).unwrap();
        assert_eq!(fireball.min_level, 7);
    }
}
