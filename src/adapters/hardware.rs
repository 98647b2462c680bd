//! Hardware adapter — bridges board peripherals to the pipeline's ports.
//!
//! Owns the indicator and buzzer drivers, the companion UART and the copy
//! engine, and exposes them through the port traits in
//! [`crate::app::ports`].  This is the only module that reaches the real
//! peripherals; on non-espidf targets the underlying drivers are the
//! cfg-gated simulation versions.

use embassy_time::Duration;
use embedded_hal::digital::OutputPin;

use crate::alarm::IndicatorPattern;
use crate::app::ports::{
    BuzzerPort, CopyEnginePort, IndicatorPort, ModeTimerPort, SensorPort, SerialPort,
    ToneTimerPort,
};
use crate::drivers::copy_engine::CopyEngine;
use crate::drivers::hw_timer;
use crate::drivers::outputs::{Buzzer, Indicators};
use crate::drivers::uart::UartTx;
use crate::error::CopyError;
use crate::sensors::{self, co::RawSample};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<G, Y, R, B> {
    indicators: Indicators<G, Y, R>,
    buzzer: Buzzer<B>,
    uart: UartTx,
    copy: CopyEngine,
}

impl<G, Y, R, B> HardwareAdapter<G, Y, R, B>
where
    G: OutputPin,
    Y: OutputPin,
    R: OutputPin,
    B: OutputPin,
{
    pub fn new(
        indicators: Indicators<G, Y, R>,
        buzzer: Buzzer<B>,
        uart: UartTx,
        copy: CopyEngine,
    ) -> Self {
        Self {
            indicators,
            buzzer,
            uart,
            copy,
        }
    }

    pub fn uart_mut(&mut self) -> &mut UartTx {
        &mut self.uart
    }

    pub fn indicators(&self) -> &Indicators<G, Y, R> {
        &self.indicators
    }

    pub fn buzzer(&self) -> &Buzzer<B> {
        &self.buzzer
    }
}

// ── SensorPort ────────────────────────────────────────────────

impl<G, Y, R, B> SensorPort for HardwareAdapter<G, Y, R, B> {
    fn read_raw(&mut self) -> u16 {
        sensors::latched_conversion()
    }
}

// ── Output ports ──────────────────────────────────────────────

impl<G: OutputPin, Y: OutputPin, R: OutputPin, B> IndicatorPort for HardwareAdapter<G, Y, R, B> {
    fn show(&mut self, pattern: IndicatorPattern) {
        self.indicators.show(pattern);
    }
}

impl<G, Y, R, B: OutputPin> BuzzerPort for HardwareAdapter<G, Y, R, B> {
    fn set_buzzer(&mut self, high: bool) {
        self.buzzer.set(high);
    }
}

// ── SerialPort ────────────────────────────────────────────────

impl<G, Y, R, B> SerialPort for HardwareAdapter<G, Y, R, B> {
    fn try_write(&mut self, byte: u8) -> bool {
        self.uart.try_write(byte)
    }
}

// ── Timer ports ───────────────────────────────────────────────

impl<G, Y, R, B> ModeTimerPort for HardwareAdapter<G, Y, R, B> {
    fn arm_mode_timer(&mut self, after: Duration) {
        hw_timer::arm_mode_timer(after);
    }
}

impl<G, Y, R, B> ToneTimerPort for HardwareAdapter<G, Y, R, B> {
    fn start_tone_timer(&mut self, interval: Duration) {
        hw_timer::start_tone_timer(interval);
    }

    fn stop_tone_timer(&mut self) {
        hw_timer::stop_tone_timer();
    }
}

// ── CopyEnginePort ────────────────────────────────────────────

impl<G, Y, R, B> CopyEnginePort for HardwareAdapter<G, Y, R, B> {
    fn start_copy(&mut self, src: &[RawSample]) -> Result<(), CopyError> {
        self.copy.start_copy(src)
    }

    fn read_copy(&mut self, dst: &mut [RawSample]) {
        self.copy.read_copy(dst);
    }

    fn disable_copy(&mut self) {
        self.copy.disable_copy();
    }
}
