//! Per-session debounce buffer
//!
//! Raw click events are queued and applied together once the aggregation
//! window has passed. A raw click of the same type arriving less than one
//! window after the previous raw click is part of the same physical action
//! (a held button firing repeat events) and is folded into it. The window
//! slides with every raw event, so a held button never produces a second
//! click no matter how long it is held. Distinct types are never folded.

use crate::core::types::ClickType;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// What happened to an enqueued raw click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Queued; `schedule_flush` is true when no flush is pending yet
    Buffered { schedule_flush: bool },
    /// Folded into the previous raw click of the same type
    Coalesced,
}

#[derive(Debug, Clone, Default)]
pub struct DebounceBuffer {
    pending: VecDeque<ClickType>,
    last_raw: Option<(ClickType, Instant)>,
    flush_scheduled: bool,
    coalesced: u64,
}

impl DebounceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept one raw click received at `at`
    pub fn enqueue(&mut self, click: ClickType, at: Instant, window: Duration) -> Enqueued {
        let repeat = matches!(
            self.last_raw,
            Some((prev, prev_at)) if prev == click && at.saturating_duration_since(prev_at) < window
        );
        self.last_raw = Some((click, at));

        if repeat {
            self.coalesced += 1;
            return Enqueued::Coalesced;
        }

        self.pending.push_back(click);
        let schedule_flush = !self.flush_scheduled;
        self.flush_scheduled = true;
        Enqueued::Buffered { schedule_flush }
    }

    /// Take every queued click in receipt order
    pub fn drain(&mut self) -> Vec<ClickType> {
        self.flush_scheduled = false;
        self.pending.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn flush_scheduled(&self) -> bool {
        self.flush_scheduled
    }

    /// Raw events folded away since creation
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ClickType::{Primary as L, Secondary as R};

    const WINDOW: Duration = Duration::from_millis(10);

    #[test]
    fn test_held_button_coalesces() {
        let mut buffer = DebounceBuffer::new();
        let start = Instant::now();

        assert_eq!(
            buffer.enqueue(L, start, WINDOW),
            Enqueued::Buffered { schedule_flush: true }
        );
        // Repeats every 4ms, each within the window of the previous one
        for i in 1..10 {
            let at = start + Duration::from_millis(4 * i);
            assert_eq!(buffer.enqueue(L, at, WINDOW), Enqueued::Coalesced);
        }

        assert_eq!(buffer.pending(), 1);
        assert_eq!(buffer.coalesced(), 9);
    }

    #[test]
    fn test_distinct_types_never_coalesce() {
        let mut buffer = DebounceBuffer::new();
        let at = Instant::now();

        buffer.enqueue(L, at, WINDOW);
        assert_eq!(
            buffer.enqueue(R, at, WINDOW),
            Enqueued::Buffered { schedule_flush: false }
        );
        buffer.enqueue(L, at, WINDOW);

        assert_eq!(buffer.drain(), vec![L, R, L]);
    }

    #[test]
    fn test_separated_same_type_clicks_are_kept() {
        let mut buffer = DebounceBuffer::new();
        let start = Instant::now();

        buffer.enqueue(L, start, WINDOW);
        buffer.enqueue(L, start + WINDOW, WINDOW);
        buffer.enqueue(L, start + WINDOW * 3, WINDOW);

        assert_eq!(buffer.drain(), vec![L, L, L]);
    }

    #[test]
    fn test_drain_resets_flush_flag() {
        let mut buffer = DebounceBuffer::new();
        let start = Instant::now();

        buffer.enqueue(L, start, WINDOW);
        assert!(buffer.flush_scheduled());
        assert_eq!(buffer.drain(), vec![L]);
        assert!(!buffer.flush_scheduled());

        assert_eq!(
            buffer.enqueue(R, start + WINDOW, WINDOW),
            Enqueued::Buffered { schedule_flush: true }
        );
    }

    #[test]
    fn test_repeat_across_flush_still_coalesces() {
        let mut buffer = DebounceBuffer::new();
        let start = Instant::now();

        buffer.enqueue(R, start, WINDOW);
        buffer.drain();
        assert_eq!(
            buffer.enqueue(R, start + Duration::from_millis(5), WINDOW),
            Enqueued::Coalesced
        );
    }
}
