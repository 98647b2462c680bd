//! Windowed average over a bulk-copied snapshot.
//!
//! Entering Averaged mode asks the copy engine to duplicate the live
//! [`SampleWindow`] into its own buffer.  When the engine reports
//! completion, the average is computed from that copy, so acquisitions
//! landing in the meantime cannot tear it.
//!
//! ```text
//!   mode timer ─▶ trigger() ─▶ copy engine ─▶ CopyComplete ─▶ complete()
//!                    │                                            │
//!                 in_flight = true                        in_flight = false
//! ```

use log::{debug, warn};

use crate::app::ports::CopyEnginePort;
use crate::config::AveragingPolicy;
use crate::error::CopyError;
use crate::sensors::co::{CalibratedReading, Calibration, RawSample};
use crate::sensors::window::{SampleWindow, WindowSnapshot};

/// One completed average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AveragedReading {
    pub value: CalibratedReading,
    /// The snapshot had no boot-time zero slots.
    pub warm: bool,
    pub filled: usize,
}

/// Mean of `samples` under `policy`.  Sums are widened to `u32`.
pub fn average(
    samples: &[RawSample],
    policy: AveragingPolicy,
    cal: &Calibration,
) -> CalibratedReading {
    if samples.is_empty() {
        return 0;
    }
    let n = samples.len() as u32;
    match policy {
        AveragingPolicy::ConvertThenAverage => {
            let sum: u32 = samples.iter().map(|&s| u32::from(cal.convert(s))).sum();
            (sum / n) as CalibratedReading
        }
        AveragingPolicy::AverageThenConvert => {
            let sum: u32 = samples.iter().map(|&s| u32::from(s)).sum();
            cal.convert((sum / n) as RawSample)
        }
    }
}

#[derive(Debug, Clone)]
pub struct AveragingPath<const N: usize> {
    in_flight: bool,
    filled_at_trigger: usize,
    averaged: CalibratedReading,
    last: Option<AveragedReading>,
    completed: u32,
}

impl<const N: usize> AveragingPath<N> {
    pub const fn new() -> Self {
        Self {
            in_flight: false,
            filled_at_trigger: 0,
            averaged: 0,
            last: None,
            completed: 0,
        }
    }

    /// Start a snapshot of `window`.
    ///
    /// Fails with [`CopyError::Busy`] if the previous snapshot has not
    /// completed; the in-flight transfer is left alone.
    pub fn trigger(
        &mut self,
        window: &SampleWindow<N>,
        engine: &mut impl CopyEnginePort,
    ) -> Result<(), CopyError> {
        if self.in_flight {
            return Err(CopyError::Busy);
        }
        engine.start_copy(window.slots())?;
        self.in_flight = true;
        self.filled_at_trigger = window.filled();
        debug!("AVG | snapshot started ({}/{} filled)", window.filled(), N);
        Ok(())
    }

    /// Consume a finished transfer.  Returns `None` for a completion
    /// nobody asked for.
    pub fn complete(
        &mut self,
        engine: &mut impl CopyEnginePort,
        policy: AveragingPolicy,
        cal: &Calibration,
    ) -> Option<AveragedReading> {
        if !self.in_flight {
            debug!("AVG | spurious copy completion ignored");
            return None;
        }
        let mut buf = [0 as RawSample; N];
        engine.read_copy(&mut buf);
        engine.disable_copy();
        self.in_flight = false;

        let snapshot = WindowSnapshot::new(buf, self.filled_at_trigger);
        let reading = AveragedReading {
            value: average(snapshot.samples(), policy, cal),
            warm: snapshot.is_warm(),
            filled: snapshot.filled(),
        };
        if !reading.warm {
            warn!(
                "AVG | window not yet full ({}/{}), average includes empty slots",
                reading.filled, N
            );
        }
        self.averaged = reading.value;
        self.last = Some(reading);
        self.completed = self.completed.saturating_add(1);
        Some(reading)
    }

    /// Most recent average; 0 until the first snapshot completes.
    pub fn averaged(&self) -> CalibratedReading {
        self.averaged
    }

    pub fn last(&self) -> Option<AveragedReading> {
        self.last
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }
}

impl<const N: usize> Default for AveragingPath<N> {
    fn default() -> Self {
        Self::new()
    }
}
