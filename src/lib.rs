//! COGuard firmware library.
//!
//! Exposes the pipeline and its subsystems for integration testing and
//! host simulation.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alarm;
pub mod app;
pub mod averaging;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod pins;
pub mod tone;
pub mod transmit;

pub mod adapters;
pub mod drivers;
pub mod sensors;
