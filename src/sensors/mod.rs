//! Sensor subsystem — CO response curve, sample window, and the ADC data
//! latch shared with the acquisition timer.
//!
//! The acquisition timer context converts and stores the code with
//! [`latch_conversion`]; the ADC-complete handler reads it back through
//! the [`SensorPort`](crate::app::ports::SensorPort).  Nothing else is
//! shared between the two contexts.

pub mod co;
pub mod window;

use core::sync::atomic::{AtomicU16, AtomicU32, Ordering};

use log::warn;

use crate::events::{Event, push_event};

/// Latest conversion result, written from timer context.
static ADC_DATA: AtomicU16 = AtomicU16::new(0);

/// Store a finished conversion and raise [`Event::AdcComplete`].
/// Lock-free; safe to call from interrupt context.
pub fn latch_conversion(raw: u16) {
    ADC_DATA.store(raw, Ordering::Release);
    push_event(Event::AdcComplete);
}

/// Failed driver reads since boot.
static READ_FAILURES: AtomicU32 = AtomicU32::new(0);

/// Latch the outcome of one driver read.
///
/// A failed read is not a sample: nothing is latched and no event is
/// raised, so a driver error is never mistaken for a disconnected sensor.
/// The return code is logged and counted instead.
pub fn latch_read(result: Result<u16, i32>) {
    match result {
        Ok(raw) => latch_conversion(raw),
        Err(rc) => {
            let n = READ_FAILURES.fetch_add(1, Ordering::Relaxed) + 1;
            warn!("ADC | read failed (rc={rc}), sample skipped ({n} total)");
        }
    }
}

/// Driver read failures since boot.
pub fn read_failures() -> u32 {
    READ_FAILURES.load(Ordering::Relaxed)
}

/// Read the data latch (what the ADC-complete handler sees).
pub fn latched_conversion() -> u16 {
    ADC_DATA.load(Ordering::Acquire)
}

/// Inject a conversion result on host builds (simulation / bench tests).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_co_adc(raw: u16) {
    latch_conversion(raw);
}
