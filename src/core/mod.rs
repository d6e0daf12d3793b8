//! Shared types, errors and configuration

pub mod config;
pub mod error;
pub mod types;

pub use config::{AbilityBinding, CastingConfig, ClassCastingProfile, MessageSet, SoundSet};
pub use error::{CastError, Result};
pub use types::{ActorId, ClassId, ClickType, ComboPattern, COMBO_LEN};
