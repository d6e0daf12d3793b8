//! Cancellable, generation-fenced delayed callbacks on the tokio runtime
//!
//! Both the combo timeout and the debounce flush are one-shot tasks: sleep,
//! then run a synchronous callback. A `TimerHandle` aborts its task when
//! cancelled or dropped. Aborting cannot stop a callback that has already
//! woken up, so every timeout carries a generation that the receiver checks
//! against the one currently installed on the session.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Spawns delayed callbacks on a runtime
#[derive(Debug, Clone)]
pub struct Scheduler {
    runtime: Handle,
}

impl Scheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler bound to the runtime of the calling context, if any
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// Run `callback` once after `delay` unless the returned handle is cancelled first
    pub fn after<F>(&self, delay: Duration, callback: F) -> AbortHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.runtime
            .spawn(async move {
                tokio::time::sleep(delay).await;
                callback();
            })
            .abort_handle()
    }

    /// Schedule a fenced timeout; the callback receives `generation` back
    pub fn timeout<F>(&self, generation: u64, delay: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let abort = self.after(delay, move || callback(generation));
        TimerHandle { generation, abort }
    }
}

/// Owned reference to one outstanding timeout
#[derive(Debug)]
pub struct TimerHandle {
    generation: u64,
    abort: AbortHandle,
}

impl TimerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(self) {
        // Drop does the abort
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}
