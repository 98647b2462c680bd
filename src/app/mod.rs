//! Application core — pure pipeline logic, zero I/O.
//!
//! The [`service::Pipeline`] owns the sampling, alarm, transmission and
//! averaging state and reacts to one [`crate::events::Event`] at a time.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
