//! Unified error types for the COGuard firmware.
//!
//! A single `Error` enum that every subsystem can convert into.  All
//! variants are `Copy` so they can be passed through the pipeline and the
//! diagnostics channel without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The gas sensor produced an implausible code.
    Sensor(SensorFault),
    /// The serial link to the companion module failed.
    Comms(CommsError),
    /// The bulk-copy engine could not take a snapshot.
    Copy(CopyError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Copy(e) => write!(f, "copy engine: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// Raw code 0: sensing element open or not fitted.
    Disconnected,
    /// Raw code pinned at full scale.
    Saturated,
    /// Converter returned more than 12 significant bits.
    OutOfRange,
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "sensor disconnected"),
            Self::Saturated => write!(f, "sensor saturated"),
            Self::OutOfRange => write!(f, "ADC code out of range"),
        }
    }
}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The transmitter never reported ready within the spin budget.
    /// `sent` bytes of the line had already gone out.
    TransmitTimeout { sent: usize },
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransmitTimeout { sent } => {
                write!(f, "UART transmit timeout after {sent} bytes")
            }
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Copy engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyError {
    /// A snapshot was requested while the previous one was in flight.
    Busy,
    /// The engine refused the transfer (driver return code).
    StartFailed(i32),
}

impl fmt::Display for CopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "transfer already in flight"),
            Self::StartFailed(rc) => write!(f, "transfer start failed (rc={rc})"),
        }
    }
}

impl From<CopyError> for Error {
    fn from(e: CopyError) -> Self {
        Self::Copy(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_wrap_subsystem_errors() {
        assert_eq!(Error::from(SensorFault::Saturated), Error::Sensor(SensorFault::Saturated));
        assert_eq!(
            Error::from(CommsError::TransmitTimeout { sent: 3 }),
            Error::Comms(CommsError::TransmitTimeout { sent: 3 })
        );
        assert_eq!(Error::from(CopyError::Busy), Error::Copy(CopyError::Busy));
    }

    #[test]
    fn display_is_prefixed_by_subsystem() {
        let e = Error::from(CommsError::TransmitTimeout { sent: 2 });
        assert_eq!(e.to_string(), "comms: UART transmit timeout after 2 bytes");
        assert_eq!(Error::Config("x").to_string(), "config: x");
    }
}
