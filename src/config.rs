//! System configuration parameters
//!
//! Every tunable of the sampling/alarm/transmit pipeline lives here.
//! Values are fixed at build time through [`SystemConfig::default`];
//! nothing in control-flow code hard-codes a threshold or a period.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::transmit::LineTag;

/// Number of raw samples held by the acquisition window.
pub const WINDOW_LEN: usize = 10;

/// ADC transfer-function denominator (12-bit converter).
pub const ADC_FULL_SCALE: u16 = 4096;

/// Largest code a 12-bit conversion can produce.
pub const ADC_MAX_CODE: u16 = ADC_FULL_SCALE - 1;

/// Unit of every [`CalibratedReading`](crate::sensors::co::CalibratedReading).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingUnit {
    /// Gas concentration derived from the sensor-response curve.
    Ppm,
    /// Sensor output voltage.
    Millivolts,
}

/// How an averaged reading is derived from a window snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AveragingPolicy {
    /// Convert every raw sample, then take the arithmetic mean.
    ConvertThenAverage,
    /// Take the mean of the raw codes, then convert once.
    AverageThenConvert,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Acquisition ---
    /// ADC conversion period (milliseconds). The trigger output toggles
    /// every half period and the ADC converts on the falling edge.
    pub acquisition_period_ms: u32,
    /// Unit the converter produces.
    pub reading_unit: ReadingUnit,

    // --- Sensor calibration ---
    /// Load resistor in series with the sensing element (kΩ).
    pub load_resistance_kohm: f32,
    /// Sensor resistance in clean air, the R0 reference (kΩ).
    pub clean_air_resistance_kohm: f32,
    /// Exponent of the logarithmic response curve.
    pub response_exponent: f32,
    /// Multiplier applied after the power law.
    pub response_scale: f32,
    /// ADC reference voltage (mV), used by the millivolt unit.
    pub vref_mv: u16,

    // --- Alarm ---
    /// Readings at or above this value count towards the alarm.
    pub caution_threshold: u16,
    /// Consecutive above-threshold samples required to reach Critical.
    pub debounce_samples: u16,
    /// Buzzer toggle interval while Critical (microseconds).
    pub tone_toggle_interval_us: u32,

    // --- Transmission ---
    /// Time spent transmitting live readings before switching (ms).
    pub live_period_ms: u32,
    /// Time spent transmitting the averaged reading before switching (ms).
    pub averaged_period_ms: u32,
    /// Prefix tags on each line; `false` emits bare decimals.
    pub tag_lines: bool,
    /// Tag for the instantaneous reading.
    pub live_tag: char,
    /// Tag for the averaged reading.
    pub averaged_tag: char,
    /// Ready-flag polls per byte before a transmit is abandoned.
    pub tx_spin_limit: u32,
    /// Companion-module UART baud rate.
    pub uart_baud: u32,

    // --- Averaging ---
    pub averaging_policy: AveragingPolicy,

    // --- Diagnostics ---
    /// Runtime metrics log interval (seconds).
    pub metrics_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Acquisition
            acquisition_period_ms: 1000, // 1 Hz conversions
            reading_unit: ReadingUnit::Ppm,

            // Calibration
            load_resistance_kohm: 47.0,
            clean_air_resistance_kohm: 72.41,
            response_exponent: -1.52,
            response_scale: 100.0,
            vref_mv: 3300,

            // Alarm
            caution_threshold: 25,
            debounce_samples: 10, // 10 s at 1 Hz
            tone_toggle_interval_us: 50_000,

            // Transmission
            live_period_ms: 10_000,
            averaged_period_ms: 3_000,
            tag_lines: true,
            live_tag: 'U',
            averaged_tag: 'P',
            tx_spin_limit: 100_000,
            uart_baud: 9600,

            averaging_policy: AveragingPolicy::ConvertThenAverage,

            metrics_interval_secs: 60,
        }
    }
}

impl SystemConfig {
    pub fn acquisition_period(&self) -> Duration {
        Duration::from_millis(self.acquisition_period_ms as u64)
    }

    pub fn tone_toggle_interval(&self) -> Duration {
        Duration::from_micros(self.tone_toggle_interval_us as u64)
    }

    pub fn live_period(&self) -> Duration {
        Duration::from_millis(self.live_period_ms as u64)
    }

    pub fn averaged_period(&self) -> Duration {
        Duration::from_millis(self.averaged_period_ms as u64)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.acquisition_period_ms == 0 {
            return Err(Error::Config("acquisition_period_ms must be non-zero"));
        }
        if self.tone_toggle_interval_us == 0 {
            return Err(Error::Config("tone_toggle_interval_us must be non-zero"));
        }
        if self.live_period_ms == 0 || self.averaged_period_ms == 0 {
            return Err(Error::Config("transmission mode periods must be non-zero"));
        }
        if !positive(self.load_resistance_kohm) || !positive(self.clean_air_resistance_kohm) {
            return Err(Error::Config("calibration resistances must be positive"));
        }
        if !self.response_exponent.is_finite() || !self.response_scale.is_finite() {
            return Err(Error::Config("response curve constants must be finite"));
        }
        if self.vref_mv == 0 {
            return Err(Error::Config("vref_mv must be non-zero"));
        }
        if self.tx_spin_limit == 0 {
            return Err(Error::Config("tx_spin_limit must be non-zero"));
        }
        if self.tag_lines && self.live_tag == self.averaged_tag {
            return Err(Error::Config("live and averaged tags must differ"));
        }
        if self.tag_lines
            && (LineTag::new(self.live_tag).is_none() || LineTag::new(self.averaged_tag).is_none())
        {
            return Err(Error::Config("line tags must be printable non-digit ASCII"));
        }
        Ok(())
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}
