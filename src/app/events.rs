//! Outbound application events.
//!
//! The [`Pipeline`](super::service::Pipeline) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to the console, post to the
//! diagnostics channel, count them in a test.

use crate::alarm::AlarmLevel;
use crate::diagnostics::Fault;
use crate::sensors::co::CalibratedReading;
use crate::transmit::TransmissionMode;

/// Structured events emitted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The pipeline has started (carries the initial mode).
    Started(TransmissionMode),

    /// The alarm level changed.
    AlarmChanged { from: AlarmLevel, to: AlarmLevel },

    /// The transmission mode flipped.
    ModeChanged(TransmissionMode),

    /// A new averaged reading is available.
    AverageReady(AverageReport),

    /// A fault latched on.
    FaultRaised { fault: Fault, sample: u32 },

    /// A latched fault went away.
    FaultCleared { fault: Fault, sample: u32 },
}

/// Result of one completed snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AverageReport {
    pub value: CalibratedReading,
    /// `false` if the window still held boot-time zero slots.
    pub warm: bool,
    /// Real samples in the window when the snapshot was taken.
    pub filled: usize,
}
