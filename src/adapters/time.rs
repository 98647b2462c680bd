//! Monotonic uptime clock.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` (microsecond
//!   precision, monotonic since boot).
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant` for
//!   host-side simulation.

/// Uptime source for the idle loop's periodic work.
pub struct UptimeClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for UptimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl UptimeClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time reads a free-running counter.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since the clock was created.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    pub fn uptime_secs(&self) -> u64 {
        self.uptime_us() / 1_000_000
    }
}

/// Fires once every `interval_secs` of uptime.
#[derive(Debug, Clone)]
pub struct IntervalTicker {
    interval_secs: u64,
    next_secs: u64,
}

impl IntervalTicker {
    pub fn new(interval_secs: u32, now_secs: u64) -> Self {
        let interval_secs = u64::from(interval_secs.max(1));
        Self {
            interval_secs,
            next_secs: now_secs + interval_secs,
        }
    }

    /// `true` once per elapsed interval; skips intervals that were missed.
    pub fn due(&mut self, now_secs: u64) -> bool {
        if now_secs < self.next_secs {
            return false;
        }
        while self.next_secs <= now_secs {
            self.next_secs += self.interval_secs;
        }
        true
    }
}
