//! Typed input events and the channel that carries them to the engine
//!
//! Host adapters translate their own callbacks into `InputEvent`s and push
//! them onto an `EventBus`; `CastingEngine::run` drains the other end.

use crate::core::types::{ActorId, ClickType};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InputEvent {
    /// Switch casting mode on or off
    Toggle { actor: ActorId },
    /// Raw click; ignored unless the actor is casting
    Click {
        actor: ActorId,
        click: ClickType,
        #[serde(skip)]
        at: Instant,
    },
    /// Actor attacked an entity (may alias to a primary click)
    Attack { actor: ActorId },
    /// Actor left the host; drop any session silently
    ActorRemoved { actor: ActorId },
    /// Administrative config reload
    Reload,
}

impl InputEvent {
    pub fn click(actor: ActorId, click: ClickType) -> Self {
        InputEvent::Click {
            actor,
            click,
            at: Instant::now(),
        }
    }

    pub fn actor(&self) -> Option<ActorId> {
        match self {
            InputEvent::Toggle { actor }
            | InputEvent::Click { actor, .. }
            | InputEvent::Attack { actor }
            | InputEvent::ActorRemoved { actor } => Some(*actor),
            InputEvent::Reload => None,
        }
    }
}

pub type EventReceiver = mpsc::UnboundedReceiver<InputEvent>;

/// Sending half of the engine's input channel
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: mpsc::UnboundedSender<InputEvent>,
}

impl EventBus {
    pub fn new() -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queue an event; returns false once the engine loop has stopped
    pub fn publish(&self, event: InputEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    pub fn toggle(&self, actor: ActorId) -> bool {
        self.publish(InputEvent::Toggle { actor })
    }

    pub fn click(&self, actor: ActorId, click: ClickType) -> bool {
        self.publish(InputEvent::click(actor, click))
    }

    pub fn attack(&self, actor: ActorId) -> bool {
        self.publish(InputEvent::Attack { actor })
    }

    pub fn remove_actor(&self, actor: ActorId) -> bool {
        self.publish(InputEvent::ActorRemoved { actor })
    }

    pub fn reload(&self) -> bool {
        self.publish(InputEvent::Reload)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
