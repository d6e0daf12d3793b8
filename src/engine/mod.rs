//! Event routing and the casting engine

pub mod dispatcher;
pub mod events;

pub use dispatcher::{CastingEngine, Collaborators, EngineStats, SessionSnapshot, StatsSnapshot};
pub use events::{EventBus, EventReceiver, InputEvent};
