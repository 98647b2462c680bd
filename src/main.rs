//! COGuard Firmware — Main Entry Point
//!
//! Interrupt-style pipeline driven from the idle loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  HardwareAdapter                 LogEventSink   UptimeClock  │
//! │  (ADC latch · LEDs · buzzer ·    (EventSink)                 │
//! │   UART · mode timer · memcpy)                                │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ──────────────────     │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                 Pipeline (pure logic)                  │  │
//! │  │  window · alarm · tone · transmit · averaging · faults │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  esp_timer callbacks / GDMA ISR ──▶ pending-event register   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use log::{debug, info, warn};

use coguard::adapters::hardware::HardwareAdapter;
use coguard::adapters::log_sink::LogEventSink;
use coguard::adapters::time::{IntervalTicker, UptimeClock};
use coguard::app::service::Pipeline;
use coguard::config::SystemConfig;
use coguard::diagnostics::DIAGNOSTICS;
use coguard::drivers::copy_engine::CopyEngine;
use coguard::drivers::hw_init::{self, HwInitError};
use coguard::drivers::hw_timer;
use coguard::drivers::outputs::{Buzzer, Indicators};
use coguard::drivers::uart::UartTx;
use coguard::events::queue_is_empty;
use coguard::pins;

type BoardPin = PinDriver<'static, AnyOutputPin, Output>;

/// Claim one output line by its number in [`pins`].
fn output_pin(gpio: i32) -> Result<BoardPin, HwInitError> {
    // SAFETY: each GPIO number in `pins` is claimed exactly once, here at
    // boot, and nothing else in the firmware drives it.
    let pin = unsafe { AnyOutputPin::new(gpio) };
    PinDriver::output(pin).map_err(|_| HwInitError::GpioInitFailed)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  COGuard v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    config.validate().context("build-time configuration rejected")?;
    match serde_json::to_string(&config) {
        Ok(json) => info!("Config: {}", json),
        Err(e) => warn!("Config could not be serialised for logging: {}", e),
    }

    // ── 3. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals(&config).context("peripheral init")?;

    let indicators = Indicators::new(
        output_pin(pins::LED_GREEN_GPIO)?,
        output_pin(pins::LED_YELLOW_GPIO)?,
        output_pin(pins::LED_RED_GPIO)?,
    );
    let buzzer = Buzzer::new(output_pin(pins::BUZZER_GPIO)?);
    let mut hw = HardwareAdapter::new(
        indicators,
        buzzer,
        UartTx::new(pins::COMPANION_UART_PORT),
        CopyEngine::new(),
    );

    // ── 4. Pipeline ───────────────────────────────────────────
    let mut pipeline: Pipeline = Pipeline::new(config.clone());
    let mut sink = LogEventSink::new();
    pipeline.start(&mut hw, &mut sink);

    // ── 5. Timers (events start flowing here) ─────────────────
    if let Err(e) = hw_timer::start_timers(&config) {
        hw_timer::stop_timers();
        return Err(e).context("timer start");
    }

    // ── 6. Event loop ─────────────────────────────────────────
    let clock = UptimeClock::new();
    let mut metrics = IntervalTicker::new(config.metrics_interval_secs, clock.uptime_secs());

    info!("Entering event loop");
    loop {
        pipeline.service_pending(&mut hw, &mut sink);

        DIAGNOSTICS.drain(|d| debug!("DIAG | {:?} @ sample {}", d.edge, d.sample));

        let now = clock.uptime_secs();
        if metrics.due(now) {
            info!(
                "METRICS | {} adc_read_failures={}",
                pipeline.metrics(now, DIAGNOSTICS.dropped()),
                coguard::sensors::read_failures()
            );
        }

        if queue_is_empty() {
            // Yield to the esp_timer task and IDLE (feeds the task watchdog).
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }
}
