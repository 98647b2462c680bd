//! Alarm indicator LEDs and buzzer line.
//!
//! Generic over `embedded-hal` 1.0 [`OutputPin`] so the same drivers run
//! on `esp-idf-hal` pin drivers on target and on mock pins in tests.
//! All lines are active HIGH.

use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

use crate::alarm::IndicatorPattern;

/// Green / yellow / red indicator LEDs.
pub struct Indicators<G, Y, R> {
    green: G,
    yellow: Y,
    red: R,
    shown: Option<IndicatorPattern>,
}

impl<G: OutputPin, Y: OutputPin, R: OutputPin> Indicators<G, Y, R> {
    pub fn new(green: G, yellow: Y, red: R) -> Self {
        Self {
            green,
            yellow,
            red,
            shown: None,
        }
    }

    /// Drive all three lines, every call, whatever was shown before.
    /// Lines being switched off are written first so two indicators are
    /// never lit together.
    pub fn show(&mut self, pattern: IndicatorPattern) {
        let mut ok = true;
        if !pattern.green {
            ok &= self.green.set_low().is_ok();
        }
        if !pattern.yellow {
            ok &= self.yellow.set_low().is_ok();
        }
        if !pattern.red {
            ok &= self.red.set_low().is_ok();
        }
        if pattern.green {
            ok &= self.green.set_high().is_ok();
        }
        if pattern.yellow {
            ok &= self.yellow.set_high().is_ok();
        }
        if pattern.red {
            ok &= self.red.set_high().is_ok();
        }
        if ok {
            self.shown = Some(pattern);
        } else {
            warn!("outputs: indicator write failed");
            self.shown = None;
        }
    }

    pub fn shown(&self) -> Option<IndicatorPattern> {
        self.shown
    }
}

/// Piezo buzzer line.
pub struct Buzzer<P> {
    pin: P,
    high: bool,
}

impl<P: OutputPin> Buzzer<P> {
    /// Takes the pin and drives it low.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("outputs: buzzer init write failed");
        }
        Self { pin, high: false }
    }

    pub fn set(&mut self, high: bool) {
        if self.pin.set_state(PinState::from(high)).is_err() {
            warn!("outputs: buzzer write failed");
            return;
        }
        self.high = high;
    }

    pub fn is_high(&self) -> bool {
        self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmLevel;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Pin that records its writes into a shared log.
    #[derive(Clone)]
    struct LogPin {
        name: &'static str,
        log: Rc<RefCell<Vec<(&'static str, bool)>>>,
    }

    impl ErrorType for LogPin {
        type Error = Infallible;
    }

    impl OutputPin for LogPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.log.borrow_mut().push((self.name, false));
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.log.borrow_mut().push((self.name, true));
            Ok(())
        }
    }

    fn pins() -> (LogPin, LogPin, LogPin, Rc<RefCell<Vec<(&'static str, bool)>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mk = |name| LogPin { name, log: log.clone() };
        (mk("green"), mk("yellow"), mk("red"), log)
    }

    #[test]
    fn switches_off_before_on() {
        let (g, y, r, log) = pins();
        let mut ind = Indicators::new(g, y, r);
        ind.show(IndicatorPattern::for_level(AlarmLevel::Critical));
        assert_eq!(
            *log.borrow(),
            [("green", false), ("yellow", false), ("red", true)]
        );
    }

    #[test]
    fn repeated_pattern_rewrites_every_line() {
        let (g, y, r, log) = pins();
        let mut ind = Indicators::new(g, y, r);
        let safe = IndicatorPattern::for_level(AlarmLevel::Safe);
        ind.show(safe);
        log.borrow_mut().clear();

        ind.show(safe);
        assert_eq!(
            *log.borrow(),
            [("yellow", false), ("red", false), ("green", true)]
        );
        assert_eq!(ind.shown(), Some(safe));
    }

    #[test]
    fn buzzer_starts_low_and_follows_set() {
        let (pin, _, _, log) = pins();
        let mut b = Buzzer::new(pin);
        assert_eq!(*log.borrow(), [("green", false)]);
        b.set(true);
        assert!(b.is_high());
        b.set(false);
        assert!(!b.is_high());
    }
}
