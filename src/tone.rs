//! Buzzer tone generator.
//!
//! Each tick of the tone timer flips the buzzer line while the generator
//! is enabled, so the audible square wave runs at half the tick rate.
//! Disabling always leaves the line low.

#[derive(Debug, Clone, Default)]
pub struct ToneGenerator {
    enabled: bool,
    high: bool,
    toggles: u32,
}

impl ToneGenerator {
    pub const fn new() -> Self {
        Self {
            enabled: false,
            high: false,
            toggles: 0,
        }
    }

    /// Gate the generator.  Returns the level the buzzer line must be
    /// driven to, if it changes.
    ///
    /// Enabling an already-enabled generator keeps its phase.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<bool> {
        if enabled == self.enabled {
            return None;
        }
        self.enabled = enabled;
        if !enabled && self.high {
            self.high = false;
            return Some(false);
        }
        None
    }

    /// One timer tick.  Returns the new buzzer level, or `None` while muted.
    pub fn tick(&mut self) -> Option<bool> {
        if !self.enabled {
            return None;
        }
        self.high = !self.high;
        self.toggles = self.toggles.wrapping_add(1);
        Some(self.high)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current buzzer line level.
    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn toggles(&self) -> u32 {
        self.toggles
    }
}
