//! Combo Cast - click-combo casting engine
//!
//! Turns a stream of primary/secondary clicks into ability casts. An actor
//! toggles casting mode, enters a three-click combo within the timeout, and
//! the combo is looked up in the class profile from the hot-reloadable
//! configuration.

pub mod casting;
pub mod core;
pub mod engine;
pub mod host;
pub mod loader;

pub use crate::core::{CastError, CastingConfig, ClickType, ComboPattern, Result};
pub use crate::engine::{CastingEngine, Collaborators, EventBus, InputEvent};
