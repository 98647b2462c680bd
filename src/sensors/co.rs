//! Electrochemical/MOS CO sensor response curve.
//!
//! The sensing element sits in series with a load resistor; the ADC reads
//! the voltage across the load.  Sensor resistance follows from the divider:
//!
//! ```text
//!   Vs  = raw / 4096 · Vref
//!   Rs  = RL · (4096 − raw) / raw
//!   ppm = scale · (Rs / R0) ^ exponent
//! ```
//!
//! With a negative exponent, more gas → lower Rs → higher raw → higher ppm.
//! All intermediate arithmetic is `f32`; an integer-only version loses
//! almost all resolution at low codes.

use crate::config::{ADC_FULL_SCALE, ADC_MAX_CODE, ReadingUnit, SystemConfig};
use crate::error::SensorFault;

/// Unconverted 12-bit ADC code.
pub type RawSample = u16;

/// Reading in the configured unit (ppm or mV).
pub type CalibratedReading = u16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub load_resistance_kohm: f32,
    pub clean_air_resistance_kohm: f32,
    pub response_exponent: f32,
    pub response_scale: f32,
    pub vref_mv: u16,
    pub unit: ReadingUnit,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::from_config(&SystemConfig::default())
    }
}

impl Calibration {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            load_resistance_kohm: config.load_resistance_kohm,
            clean_air_resistance_kohm: config.clean_air_resistance_kohm,
            response_exponent: config.response_exponent,
            response_scale: config.response_scale,
            vref_mv: config.vref_mv,
            unit: config.reading_unit,
        }
    }

    /// Convert a raw code into the configured unit.
    pub fn convert(&self, raw: RawSample) -> CalibratedReading {
        match self.unit {
            ReadingUnit::Ppm => self.to_ppm(raw),
            ReadingUnit::Millivolts => self.to_millivolts(raw),
        }
    }

    pub fn to_ppm(&self, raw: RawSample) -> CalibratedReading {
        if raw == 0 {
            return 0;
        }
        let raw = raw.min(ADC_MAX_CODE) as f32;
        let rs = (ADC_FULL_SCALE as f32 - raw) * self.load_resistance_kohm / raw;
        let ratio = rs / self.clean_air_resistance_kohm;
        saturate(self.response_scale * ratio.powf(self.response_exponent))
    }

    pub fn to_millivolts(&self, raw: RawSample) -> CalibratedReading {
        let raw = raw.min(ADC_MAX_CODE) as u32;
        (raw * self.vref_mv as u32 / ADC_FULL_SCALE as u32) as u16
    }
}

/// Convert with the built-in calibration (ppm, default constants).
pub fn convert(raw: RawSample) -> CalibratedReading {
    Calibration::default().convert(raw)
}

/// Check a freshly latched ADC code.
///
/// Returns the code masked to 12 bits together with the fault it
/// indicates, if any.  A faulted sample is still usable: the converter
/// is total, and the alarm keeps running on whatever the sensor reports.
pub fn inspect(raw: u16) -> (RawSample, Option<SensorFault>) {
    if raw > ADC_MAX_CODE {
        return (raw & ADC_MAX_CODE, Some(SensorFault::OutOfRange));
    }
    match raw {
        0 => (0, Some(SensorFault::Disconnected)),
        ADC_MAX_CODE => (raw, Some(SensorFault::Saturated)),
        _ => (raw, None),
    }
}

/// Truncate towards zero; negative or NaN → 0, overflow → `u16::MAX`.
fn saturate(value: f32) -> u16 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= u16::MAX as f32 {
        u16::MAX
    } else {
        value as u16
    }
}
