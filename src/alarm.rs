//! Three-level CO alarm with debounced escalation.
//!
//! ```text
//!              reading ≥ threshold           count ≥ debounce
//!   ┌──────┐ ─────────────────────▶ ┌─────────┐ ──────────────▶ ┌──────────┐
//!   │ Safe │                        │ Caution │                 │ Critical │
//!   └──────┘ ◀───────────────────── └─────────┘                 └──────────┘
//!      ▲          reading < threshold                                │
//!      └─────────────────────────────────────────────────────────────┘
//!                         reading < threshold
//! ```
//!
//! Escalation needs `debounce` consecutive samples at or above the
//! threshold; a single sample below it drops straight back to Safe.

use core::fmt;

use crate::config::SystemConfig;
use crate::sensors::co::CalibratedReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum AlarmLevel {
    Safe = 0,
    Caution = 1,
    Critical = 2,
}

impl fmt::Display for AlarmLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Caution => write!(f, "CAUTION"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Which indicator lines are driven high.  Exactly one is lit per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorPattern {
    pub green: bool,
    pub yellow: bool,
    pub red: bool,
}

impl IndicatorPattern {
    pub const fn for_level(level: AlarmLevel) -> Self {
        match level {
            AlarmLevel::Safe => Self {
                green: true,
                yellow: false,
                red: false,
            },
            AlarmLevel::Caution => Self {
                green: false,
                yellow: true,
                red: false,
            },
            AlarmLevel::Critical => Self {
                green: false,
                yellow: false,
                red: true,
            },
        }
    }

    pub const fn lit_count(&self) -> u8 {
        self.green as u8 + self.yellow as u8 + self.red as u8
    }
}

/// Outputs the level requires after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmOutputs {
    pub indicators: IndicatorPattern,
    pub tone: bool,
}

impl AlarmOutputs {
    pub const fn for_level(level: AlarmLevel) -> Self {
        Self {
            indicators: IndicatorPattern::for_level(level),
            tone: matches!(level, AlarmLevel::Critical),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlarmStateMachine {
    threshold: CalibratedReading,
    debounce: u16,
    level: AlarmLevel,
    consecutive: u16,
}

impl AlarmStateMachine {
    pub fn new(threshold: CalibratedReading, debounce: u16) -> Self {
        Self {
            threshold,
            debounce,
            level: AlarmLevel::Safe,
            consecutive: 0,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.caution_threshold, config.debounce_samples)
    }

    /// Classify one reading.  Total; returns the level after the update.
    pub fn update(&mut self, reading: CalibratedReading) -> AlarmLevel {
        if reading < self.threshold {
            self.consecutive = 0;
            self.level = AlarmLevel::Safe;
        } else {
            self.consecutive = self.consecutive.saturating_add(1);
            self.level = if self.consecutive >= self.debounce {
                AlarmLevel::Critical
            } else {
                AlarmLevel::Caution
            };
        }
        self.level
    }

    pub fn level(&self) -> AlarmLevel {
        self.level
    }

    /// Consecutive at-or-above-threshold readings seen so far.
    pub fn consecutive(&self) -> u16 {
        self.consecutive
    }

    pub fn outputs(&self) -> AlarmOutputs {
        AlarmOutputs::for_level(self.level)
    }
}
