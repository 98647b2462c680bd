//! Port traits — the hexagonal boundary between the pipeline and the board.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Pipeline (domain)
//! ```
//!
//! Driven adapters (ADC latch, GPIO outputs, UART, timers, copy engine,
//! event sinks) implement these traits.  The
//! [`Pipeline`](super::service::Pipeline) consumes them via generics, so
//! the domain core never touches hardware directly.
//!
//! Every method here is called from the dispatcher only.  None of them
//! may block for longer than a bounded spin.

use embassy_time::Duration;

use crate::alarm::IndicatorPattern;
use crate::error::CopyError;
use crate::sensors::co::RawSample;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the ADC data register.
pub trait SensorPort {
    /// Read the latched conversion result.  May carry more than 12 bits if
    /// the converter misbehaves; the pipeline masks and flags that.
    fn read_raw(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Output ports (driven adapter: domain → GPIO)
// ───────────────────────────────────────────────────────────────

/// The three alarm indicator lines.
pub trait IndicatorPort {
    /// Drive every line to the pattern's level in one call.
    fn show(&mut self, pattern: IndicatorPattern);
}

/// The buzzer line toggled by the tone generator.
pub trait BuzzerPort {
    fn set_buzzer(&mut self, high: bool);
}

// ───────────────────────────────────────────────────────────────
// Serial port (driven adapter: domain → companion UART)
// ───────────────────────────────────────────────────────────────

/// Non-blocking byte transmitter.
pub trait SerialPort {
    /// Queue one byte if the transmitter is ready.  Returns `false`
    /// without side effects when it is not.
    fn try_write(&mut self, byte: u8) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Timer ports
// ───────────────────────────────────────────────────────────────

/// The one-shot transmission-mode timer.
pub trait ModeTimerPort {
    /// Restart the one-shot timer so it expires `after` from now.
    fn arm_mode_timer(&mut self, after: Duration);
}

/// The periodic tone timer.  Runs only while the alarm is Critical, so
/// no `ToneTick` is raised at any other level.
pub trait ToneTimerPort {
    /// Start (or restart) ticking every `interval`.
    fn start_tone_timer(&mut self, interval: Duration);

    fn stop_tone_timer(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Copy engine port (memory-to-memory bulk transfer)
// ───────────────────────────────────────────────────────────────

/// Memory-to-memory copy engine used to snapshot the sample window.
///
/// Completion is signalled out of band by raising
/// [`Event::CopyComplete`](crate::events::Event::CopyComplete).
pub trait CopyEnginePort {
    /// Start copying `src` into the engine's destination buffer.
    fn start_copy(&mut self, src: &[RawSample]) -> Result<(), CopyError>;

    /// Read the destination buffer of the last finished transfer.
    fn read_copy(&mut self, dst: &mut [RawSample]);

    /// Power down the engine after a transfer has been consumed.
    fn disable_copy(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / diagnostics)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Aggregate
// ───────────────────────────────────────────────────────────────

/// Everything the pipeline drives.
pub trait Hardware:
    SensorPort
    + IndicatorPort
    + BuzzerPort
    + SerialPort
    + ModeTimerPort
    + ToneTimerPort
    + CopyEnginePort
{
}

impl<T> Hardware for T where
    T: SensorPort
        + IndicatorPort
        + BuzzerPort
        + SerialPort
        + ModeTimerPort
        + ToneTimerPort
        + CopyEnginePort
{
}
