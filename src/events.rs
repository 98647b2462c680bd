//! Interrupt-style event delivery.
//!
//! Events are produced by:
//! - the acquisition timer callback (ADC conversion latched)
//! - the tone timer callback
//! - the transmission-mode one-shot timer
//! - the bulk-copy engine completion ISR
//!
//! and consumed by the dispatcher in the idle loop, which runs each
//! handler to completion before looking at the next one.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────┐
//! │ Acq timer    │────▶│                │     │              │
//! │ Tone timer   │────▶│ Pending mask   │────▶│  Dispatcher  │
//! │ Mode timer   │────▶│  (AtomicU8)    │     │  (idle loop) │
//! │ Copy ISR     │────▶│                │     │              │
//! └──────────────┘     └────────────────┘     └──────────────┘
//! ```
//!
//! The mask behaves like an interrupt controller's pending register: a
//! source raised twice before it is serviced is serviced once.  Setting a
//! bit is an atomic `fetch_or`, so any number of producers may raise
//! concurrently.

use core::sync::atomic::{AtomicU8, Ordering};

/// Pipeline event sources, ordered by priority.
/// Lower discriminant = serviced first when several are pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// ADC conversion finished; the code is in the data latch.
    AdcComplete = 0,
    /// Bulk copy of the sample window finished.
    CopyComplete = 1,
    /// Transmission-mode timer expired.
    ModeTimer = 2,
    /// Tone timer tick.
    ToneTick = 3,
}

impl Event {
    /// All events in service order.
    pub const ALL: [Event; 4] = [
        Event::AdcComplete,
        Event::CopyComplete,
        Event::ModeTimer,
        Event::ToneTick,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A pending-event register.
pub struct PendingEvents {
    mask: AtomicU8,
}

impl PendingEvents {
    pub const fn new() -> Self {
        Self {
            mask: AtomicU8::new(0),
        }
    }

    /// Mark `event` pending.  Returns `false` if it already was (coalesced).
    /// Safe to call from ISR context.
    pub fn raise(&self, event: Event) -> bool {
        let prev = self.mask.fetch_or(event.bit(), Ordering::AcqRel);
        prev & event.bit() == 0
    }

    /// Atomically take every pending event, leaving the register empty.
    pub fn take(&self) -> PendingSet {
        PendingSet(self.mask.swap(0, Ordering::AcqRel))
    }

    pub fn is_empty(&self) -> bool {
        self.mask.load(Ordering::Acquire) == 0
    }

    /// Take the pending set and service it in priority order.
    pub fn drain(&self, mut handler: impl FnMut(Event)) {
        for event in self.take() {
            handler(event);
        }
    }
}

impl Default for PendingEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of the pending register, iterated in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSet(u8);

impl PendingSet {
    pub fn contains(&self, event: Event) -> bool {
        self.0 & event.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl Iterator for PendingSet {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        let event = Event::ALL.into_iter().find(|e| self.contains(*e))?;
        self.0 &= !event.bit();
        Some(event)
    }
}

// ── Global register ───────────────────────────────────────────
//
// Timer callbacks and the copy ISR raise into this; the idle loop drains it.

static PENDING: PendingEvents = PendingEvents::new();

/// Raise an event from any context.
pub fn push_event(event: Event) -> bool {
    PENDING.raise(event)
}

/// Service all pending events in priority order.
pub fn drain_events(handler: impl FnMut(Event)) {
    PENDING.drain(handler);
}

/// Check whether any event is pending.
pub fn queue_is_empty() -> bool {
    PENDING.is_empty()
}
