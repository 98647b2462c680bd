//! Companion-module UART transmitter.
//!
//! On target, [`UartTx::try_write`] pushes one byte into the hardware TX
//! FIFO via `uart_tx_chars`, which never blocks and returns 0 when the
//! FIFO is full.  That return value is the "transmitter ready" flag the
//! line sender polls.
//!
//! On host builds the transmitter records bytes and can be told to stall,
//! to exercise the timeout path.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::app::ports::SerialPort;

#[cfg(target_os = "espidf")]
pub struct UartTx {
    port: i32,
}

#[cfg(target_os = "espidf")]
impl UartTx {
    /// Wrap an already-installed UART driver (see
    /// [`init_peripherals`](super::hw_init::init_peripherals)).
    pub fn new(port: i32) -> Self {
        Self { port }
    }
}

#[cfg(target_os = "espidf")]
impl SerialPort for UartTx {
    fn try_write(&mut self, byte: u8) -> bool {
        // SAFETY: the driver for `port` was installed at boot; `byte` lives
        // for the duration of the call and the length is 1.
        let n = unsafe { uart_tx_chars(self.port, (&raw const byte).cast(), 1) };
        n == 1
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct UartTx {
    sent: Vec<u8>,
    stalled: bool,
}

#[cfg(not(target_os = "espidf"))]
impl UartTx {
    pub fn new(_port: i32) -> Self {
        Self::default()
    }

    /// While stalled the FIFO reports full on every poll.
    pub fn set_stalled(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    /// Bytes written so far, leaving the buffer empty.
    pub fn take_sent(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.sent)
    }
}

#[cfg(not(target_os = "espidf"))]
impl SerialPort for UartTx {
    fn try_write(&mut self, byte: u8) -> bool {
        if self.stalled {
            return false;
        }
        self.sent.push(byte);
        true
    }
}
