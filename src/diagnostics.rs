//! Fault tracking and runtime diagnostics.
//!
//! ## Fault lifecycle
//!
//! 1. A handler observes a condition (e.g. raw code 0, UART stalled).
//! 2. [`FaultMonitor`] sets the corresponding bit; on the rising edge the
//!    fault is logged and a [`Diagnostic`] is posted to [`DIAGNOSTICS`].
//! 3. When the condition goes away the bit is cleared and the clear is
//!    logged and posted the same way.
//!
//! Several faults may be latched at once.  The pipeline keeps running in
//! every fault state: the alarm still classifies whatever the sensor
//! reports.
//!
//! The diagnostics channel is bounded.  If the idle loop falls behind,
//! new diagnostics are dropped and counted, never blocked on.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{error, info};

use crate::error::{CommsError, CopyError, Error, SensorFault};

// ---------------------------------------------------------------------------
// Fault identity
// ---------------------------------------------------------------------------

/// Latched fault conditions, one bit each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Fault {
    SensorDisconnected = 0,
    SensorSaturated = 1,
    AdcOutOfRange = 2,
    TransmitTimeout = 3,
    CopyOverrun = 4,
}

impl Fault {
    pub const ALL: [Fault; 5] = [
        Fault::SensorDisconnected,
        Fault::SensorSaturated,
        Fault::AdcOutOfRange,
        Fault::TransmitTimeout,
        Fault::CopyOverrun,
    ];

    /// The three mutually exclusive sample-level faults.
    pub const SENSOR: [Fault; 3] = [
        Fault::SensorDisconnected,
        Fault::SensorSaturated,
        Fault::AdcOutOfRange,
    ];

    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

impl From<SensorFault> for Fault {
    fn from(f: SensorFault) -> Self {
        match f {
            SensorFault::Disconnected => Fault::SensorDisconnected,
            SensorFault::Saturated => Fault::SensorSaturated,
            SensorFault::OutOfRange => Fault::AdcOutOfRange,
        }
    }
}

impl Fault {
    /// The latched fault an error corresponds to, if any.
    pub fn from_error(e: Error) -> Option<Self> {
        match e {
            Error::Sensor(f) => Some(f.into()),
            Error::Comms(CommsError::TransmitTimeout { .. }) => Some(Fault::TransmitTimeout),
            Error::Copy(CopyError::Busy) => Some(Fault::CopyOverrun),
            Error::Copy(CopyError::StartFailed(_)) | Error::Init(_) | Error::Config(_) => None,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorDisconnected => write!(f, "sensor disconnected"),
            Self::SensorSaturated => write!(f, "sensor saturated"),
            Self::AdcOutOfRange => write!(f, "ADC code out of range"),
            Self::TransmitTimeout => write!(f, "UART transmit timeout"),
            Self::CopyOverrun => write!(f, "copy overrun"),
        }
    }
}

// ---------------------------------------------------------------------------
// Fault monitor
// ---------------------------------------------------------------------------

/// Edge produced by a fault evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultEdge {
    Raised(Fault),
    Cleared(Fault),
}

/// Latched fault bitmask.
#[derive(Debug, Default, Clone)]
pub struct FaultMonitor {
    faults: u8,
    raised_total: u32,
}

impl FaultMonitor {
    pub const fn new() -> Self {
        Self {
            faults: 0,
            raised_total: 0,
        }
    }

    /// Set or clear `fault` according to `active`.  Returns the edge, if
    /// the latch changed.
    pub fn eval(&mut self, fault: Fault, active: bool) -> Option<FaultEdge> {
        if active {
            self.raise(fault)
        } else {
            self.clear(fault)
        }
    }

    pub fn raise(&mut self, fault: Fault) -> Option<FaultEdge> {
        if self.faults & fault.mask() != 0 {
            return None;
        }
        error!("FAULT SET: {fault}");
        self.faults |= fault.mask();
        self.raised_total = self.raised_total.saturating_add(1);
        Some(FaultEdge::Raised(fault))
    }

    pub fn clear(&mut self, fault: Fault) -> Option<FaultEdge> {
        if self.faults & fault.mask() == 0 {
            return None;
        }
        info!("FAULT CLEARED: {fault}");
        self.faults &= !fault.mask();
        Some(FaultEdge::Cleared(fault))
    }

    pub fn faults(&self) -> u8 {
        self.faults
    }

    pub fn has_fault(&self, fault: Fault) -> bool {
        self.faults & fault.mask() != 0
    }

    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    /// Rising edges seen since boot.
    pub fn raised_total(&self) -> u32 {
        self.raised_total
    }
}

// ---------------------------------------------------------------------------
// Diagnostics channel
// ---------------------------------------------------------------------------

/// One fault transition, stamped with the acquisition count it happened at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    pub edge: FaultEdge,
    pub sample: u32,
}

pub const DIAGNOSTICS_DEPTH: usize = 8;

/// Bounded, non-blocking diagnostics queue.
pub struct DiagnosticsChannel {
    channel: Channel<CriticalSectionRawMutex, Diagnostic, DIAGNOSTICS_DEPTH>,
    dropped: AtomicU32,
}

impl DiagnosticsChannel {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Post without blocking.  Returns `false` (and counts a drop) when full.
    pub fn report(&self, diagnostic: Diagnostic) -> bool {
        if self.channel.try_send(diagnostic).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Hand every queued diagnostic to `handler`.  Returns how many.
    pub fn drain(&self, mut handler: impl FnMut(Diagnostic)) -> usize {
        let mut n = 0;
        while let Ok(d) = self.channel.try_receive() {
            handler(d);
            n += 1;
        }
        n
    }

    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for DiagnosticsChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide diagnostics channel, drained by the idle loop.
pub static DIAGNOSTICS: DiagnosticsChannel = DiagnosticsChannel::new();

// ---------------------------------------------------------------------------
// Runtime metrics
// ---------------------------------------------------------------------------

/// Counters logged periodically by the idle loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeMetrics {
    pub uptime_secs: u64,
    pub samples: u32,
    pub lines_sent: u32,
    pub transmit_timeouts: u32,
    pub averages: u32,
    pub copy_overruns: u32,
    pub faults_raised: u32,
    pub active_faults: u8,
    pub diagnostics_dropped: u32,
}

impl fmt::Display for RuntimeMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "up={}s samples={} tx={} tx_timeouts={} avg={} overruns={} faults={} active={:#04x} diag_dropped={}",
            self.uptime_secs,
            self.samples,
            self.lines_sent,
            self.transmit_timeouts,
            self.averages,
            self.copy_overruns,
            self.faults_raised,
            self.active_faults,
            self.diagnostics_dropped,
        )
    }
}
