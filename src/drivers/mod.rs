//! Peripheral drivers: one-shot init, timers, UART, copy engine, GPIO outputs.

pub mod copy_engine;
pub mod hw_init;
pub mod hw_timer;
pub mod outputs;
pub mod uart;
