//! Transmission scheduler and companion-link line encoder.
//!
//! Wire format, one line per acquisition:
//!
//! ```text
//!   <tag><decimal>\n      e.g.  "U17\n"   "P4095\n"
//!   <decimal>\n           (untagged variant)
//! ```
//!
//! ASCII, no leading zeros, at most 7 bytes.  No checksum, no
//! acknowledgement.  The mode alternates Live → Averaged → Live on a
//! one-shot timer that the handler re-arms with the next mode's duration.

use core::fmt::{self, Write as _};

use embassy_time::Duration;
use log::trace;

use crate::app::ports::SerialPort;
use crate::config::SystemConfig;
use crate::error::CommsError;
use crate::sensors::co::CalibratedReading;

/// Longest possible line: tag + five digits + newline.
pub const MAX_LINE_LEN: usize = 7;

pub type WireLine = heapless::String<MAX_LINE_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionMode {
    Live,
    Averaged,
}

impl TransmissionMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Live => Self::Averaged,
            Self::Averaged => Self::Live,
        }
    }
}

impl fmt::Display for TransmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "LIVE"),
            Self::Averaged => write!(f, "AVERAGED"),
        }
    }
}

/// Single printable ASCII prefix byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTag(u8);

impl LineTag {
    /// `None` for anything that would break the line format.
    pub fn new(c: char) -> Option<Self> {
        (c.is_ascii_graphic() && !c.is_ascii_digit()).then_some(Self(c as u8))
    }

    pub fn as_char(self) -> char {
        self.0 as char
    }
}

/// Render `<tag><value>\n` into a fixed-capacity buffer.
pub fn encode_line(tag: Option<LineTag>, value: CalibratedReading) -> WireLine {
    let mut line = WireLine::new();
    // Capacity covers the widest u16 plus tag and newline.
    let _ = match tag {
        Some(t) => writeln!(line, "{}{}", t.as_char(), value),
        None => writeln!(line, "{}", value),
    };
    line
}

/// Push `line` out one byte at a time.
///
/// Each byte gets `spin_limit` attempts at the transmitter.  If the
/// transmitter never accepts it, the rest of the line is abandoned.
pub fn send_line(
    port: &mut impl SerialPort,
    line: &[u8],
    spin_limit: u32,
) -> Result<(), CommsError> {
    for (sent, &byte) in line.iter().enumerate() {
        let mut accepted = false;
        for _ in 0..spin_limit {
            if port.try_write(byte) {
                accepted = true;
                break;
            }
            core::hint::spin_loop();
        }
        if !accepted {
            return Err(CommsError::TransmitTimeout { sent });
        }
        trace!("TX | {:#04x}", byte);
    }
    Ok(())
}

/// What the mode-timer handler must do after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSwitch {
    pub mode: TransmissionMode,
    /// Duration to re-arm the one-shot mode timer with.
    pub rearm: Duration,
    /// Entering Averaged: request a window snapshot.
    pub start_snapshot: bool,
}

#[derive(Debug, Clone)]
pub struct TransmissionScheduler {
    mode: TransmissionMode,
    live_period: Duration,
    averaged_period: Duration,
    live_tag: Option<LineTag>,
    averaged_tag: Option<LineTag>,
}

impl TransmissionScheduler {
    pub fn from_config(config: &SystemConfig) -> Self {
        let tag = |c| if config.tag_lines { LineTag::new(c) } else { None };
        Self {
            mode: TransmissionMode::Live,
            live_period: config.live_period(),
            averaged_period: config.averaged_period(),
            live_tag: tag(config.live_tag),
            averaged_tag: tag(config.averaged_tag),
        }
    }

    pub fn mode(&self) -> TransmissionMode {
        self.mode
    }

    /// How long the current mode lasts.
    pub fn period(&self) -> Duration {
        match self.mode {
            TransmissionMode::Live => self.live_period,
            TransmissionMode::Averaged => self.averaged_period,
        }
    }

    /// Flip the mode on mode-timer expiry.
    pub fn toggle(&mut self) -> ModeSwitch {
        self.mode = self.mode.toggled();
        ModeSwitch {
            mode: self.mode,
            rearm: self.period(),
            start_snapshot: self.mode == TransmissionMode::Averaged,
        }
    }

    /// Line for the current mode.
    pub fn compose(&self, live: CalibratedReading, averaged: CalibratedReading) -> WireLine {
        match self.mode {
            TransmissionMode::Live => encode_line(self.live_tag, live),
            TransmissionMode::Averaged => encode_line(self.averaged_tag, averaged),
        }
    }
}
