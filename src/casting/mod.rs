//! Combo casting: sessions, debounce, timers, toggling and resolution

pub mod debounce;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod timer;
pub mod toggle;
pub mod trie;

pub use registry::{SessionRef, SessionRegistry, WeakSessionRef};
pub use resolver::{ComboResolver, ResolveOutcome};
pub use session::{ClickApplied, ComboSession, SessionState};
pub use toggle::{ToggleController, ToggleCooldowns, ToggleResult};
pub use trie::ComboTrie;
