//! GPIO / peripheral pin assignments for the COGuard main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Sensor — Analog (ADC1)
// ---------------------------------------------------------------------------

/// CO sensor output across the load resistor.
/// ADC1 channel 4 (GPIO 5 on ESP32-S3).
pub const CO_ADC_GPIO: i32 = 5;
/// ADC1 channel number for [`CO_ADC_GPIO`].
pub const CO_ADC_CHANNEL: u32 = 4;

// ---------------------------------------------------------------------------
// Alarm indicators (discrete LEDs, active HIGH)
// ---------------------------------------------------------------------------

pub const LED_GREEN_GPIO: i32 = 11;
pub const LED_YELLOW_GPIO: i32 = 12;
pub const LED_RED_GPIO: i32 = 13;

/// Piezo buzzer driven by the tone generator (active HIGH).
pub const BUZZER_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Companion module UART (TX only)
// ---------------------------------------------------------------------------

/// UART controller wired to the companion module.
pub const COMPANION_UART_PORT: i32 = 2;
pub const COMPANION_UART_TX_GPIO: i32 = 17;
