//! Hardware timers using ESP-IDF's esp_timer API.
//!
//! Three timers feed the pending-event register:
//!
//! | Timer       | Kind                 | Callback                               |
//! |-------------|----------------------|----------------------------------------|
//! | acquisition | periodic (1 s)       | ADC conversion → data latch → AdcComplete |
//! | tone        | periodic (50 ms), only while Critical | ToneTick              |
//! | mode        | one-shot, re-armed   | ModeTimer                              |
//!
//! Callbacks execute in the esp_timer task context (not ISR), so the
//! acquisition callback may run a oneshot ADC conversion.  None of them
//! touch pipeline state.
//!
//! On host builds [`VirtualTimer`] reproduces the same periodic and
//! one-shot semantics against a caller-driven clock.

use embassy_time::Duration;

use crate::events::{Event, PendingEvents};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use super::hw_init::{HwInitError, adc1_read};
#[cfg(target_os = "espidf")]
use crate::config::SystemConfig;
#[cfg(target_os = "espidf")]
use crate::events::push_event;

#[cfg(target_os = "espidf")]
static mut ACQ_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut TONE_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut MODE_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: TONE_TIMER is written once in `start_timers()` before the
/// event loop runs.  Only read from the single main task.
#[cfg(target_os = "espidf")]
unsafe fn tone_timer() -> esp_timer_handle_t {
    unsafe { TONE_TIMER }
}

/// SAFETY: MODE_TIMER is written once in `start_timers()` before the
/// event loop runs.  Only read from the single main task.
#[cfg(target_os = "espidf")]
unsafe fn mode_timer() -> esp_timer_handle_t {
    unsafe { MODE_TIMER }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn acquisition_cb(_arg: *mut core::ffi::c_void) {
    crate::sensors::latch_read(adc1_read(crate::pins::CO_ADC_CHANNEL));
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn tone_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::ToneTick);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn mode_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::ModeTimer);
}

#[cfg(target_os = "espidf")]
unsafe fn create_timer(
    callback: unsafe extern "C" fn(*mut core::ffi::c_void),
    name: &'static [u8],
    handle: *mut esp_timer_handle_t,
) -> Result<(), HwInitError> {
    let args = esp_timer_create_args_t {
        callback: Some(callback),
        arg: core::ptr::null_mut(),
        dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
        name: name.as_ptr() as *const _,
        skip_unhandled_events: false,
    };
    let ret = unsafe { esp_timer_create(&args, handle) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::TimerInitFailed(ret));
    }
    Ok(())
}

/// Create all three timers and start the acquisition timer.
///
/// The tone and mode timers are created idle.  The pipeline arms the mode
/// timer on start and runs the tone timer only while the alarm is Critical.
#[cfg(target_os = "espidf")]
pub fn start_timers(config: &SystemConfig) -> Result<(), HwInitError> {
    // SAFETY: the handles are written here once at boot from the single
    // main-task context before any callback can fire.  The callbacks only
    // touch atomics.
    unsafe {
        create_timer(acquisition_cb, b"co_acq\0", &raw mut ACQ_TIMER)?;
        create_timer(tone_cb, b"tone\0", &raw mut TONE_TIMER)?;
        create_timer(mode_cb, b"tx_mode\0", &raw mut MODE_TIMER)?;

        let ret = esp_timer_start_periodic(ACQ_TIMER, config.acquisition_period().as_micros());
        if ret != ESP_OK as i32 {
            return Err(HwInitError::TimerInitFailed(ret));
        }
    }
    info!(
        "hw_timer: acquisition@{}ms started, tone + mode idle",
        config.acquisition_period_ms
    );
    Ok(())
}

/// Restart the one-shot mode timer.
#[cfg(target_os = "espidf")]
pub fn arm_mode_timer(after: Duration) {
    // SAFETY: mode_timer() contract, main task only.
    unsafe {
        let t = mode_timer();
        if t.is_null() {
            return;
        }
        // Stopping an idle timer returns ESP_ERR_INVALID_STATE; harmless.
        esp_timer_stop(t);
        let ret = esp_timer_start_once(t, after.as_micros());
        if ret != ESP_OK as i32 {
            log::error!("hw_timer: mode timer re-arm failed (rc={})", ret);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn arm_mode_timer(after: Duration) {
    log::debug!("hw_timer(sim): mode timer armed for {}ms", after.as_millis());
}

/// Start the periodic tone timer.  Restarts it if already running.
#[cfg(target_os = "espidf")]
pub fn start_tone_timer(interval: Duration) {
    // SAFETY: tone_timer() contract, main task only.
    unsafe {
        let t = tone_timer();
        if t.is_null() {
            return;
        }
        esp_timer_stop(t);
        let ret = esp_timer_start_periodic(t, interval.as_micros());
        if ret != ESP_OK as i32 {
            log::error!("hw_timer: tone timer start failed (rc={})", ret);
        }
    }
}

/// Stop the tone timer; no further `ToneTick` is raised.
#[cfg(target_os = "espidf")]
pub fn stop_tone_timer() {
    // SAFETY: tone_timer() contract, main task only.
    unsafe {
        let t = tone_timer();
        if !t.is_null() {
            esp_timer_stop(t);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn start_tone_timer(interval: Duration) {
    log::debug!("hw_timer(sim): tone timer running every {}us", interval.as_micros());
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_tone_timer() {
    log::debug!("hw_timer(sim): tone timer stopped");
}

/// Stop all hardware timers.
#[cfg(target_os = "espidf")]
pub fn stop_timers() {
    // SAFETY: handles are valid if start_timers() got that far; the
    // null-check covers a partial start.
    unsafe {
        for t in [ACQ_TIMER, TONE_TIMER, MODE_TIMER] {
            if !t.is_null() {
                esp_timer_stop(t);
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Virtual timers (host simulation)
// ───────────────────────────────────────────────────────────────

/// Software stand-in for an esp_timer, driven by an explicit clock.
///
/// A periodic timer fires every `period` and never drifts: missed
/// expirations are all counted.  A one-shot timer fires once per
/// [`arm`](Self::arm).
#[derive(Debug, Clone)]
pub struct VirtualTimer {
    event: Event,
    period_us: u64,
    periodic: bool,
    deadline_us: Option<u64>,
}

impl VirtualTimer {
    /// A periodic timer, running from `now_us`.
    pub fn periodic(event: Event, period: Duration, now_us: u64) -> Self {
        let period_us = period.as_micros().max(1);
        Self {
            event,
            period_us,
            periodic: true,
            deadline_us: Some(now_us + period_us),
        }
    }

    /// An idle one-shot timer.
    pub fn one_shot(event: Event) -> Self {
        Self {
            event,
            period_us: 0,
            periodic: false,
            deadline_us: None,
        }
    }

    /// (Re)start so the next expiry is `after` from `now_us`.
    pub fn arm(&mut self, now_us: u64, after: Duration) {
        let after_us = after.as_micros();
        if self.periodic {
            self.period_us = after_us.max(1);
        }
        self.deadline_us = Some(now_us + after_us);
    }

    pub fn stop(&mut self) {
        self.deadline_us = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_us.is_some()
    }

    pub fn deadline_us(&self) -> Option<u64> {
        self.deadline_us
    }

    pub fn event(&self) -> Event {
        self.event
    }

    /// Advance to `now_us`.  Raises the timer's event into `pending` for
    /// each expiry and returns how many there were.
    pub fn poll(&mut self, now_us: u64, pending: &PendingEvents) -> u32 {
        let mut fired = 0;
        let period_us = self.period_us;
        while let Some(deadline) = self.deadline_us {
            if deadline > now_us {
                break;
            }
            pending.raise(self.event);
            fired += 1;
            self.deadline_us = self.periodic.then(|| deadline + period_us);
        }
        fired
    }
}
