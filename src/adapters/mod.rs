//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                          | Connects to                 |
//! |-------------|-------------------------------------|-----------------------------|
//! | `hardware`  | SensorPort, IndicatorPort,          | ADC latch, GPIO, UART,      |
//! |             | BuzzerPort, SerialPort,             | esp_timer, GDMA memcpy      |
//! |             | ModeTimerPort, CopyEnginePort       |                             |
//! | `log_sink`  | EventSink                           | Serial log + diagnostics    |
//! | `time`      | —                                   | ESP32 system timer          |

pub mod hardware;
pub mod log_sink;
pub mod time;
