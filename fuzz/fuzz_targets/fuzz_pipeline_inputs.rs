//! Fuzz target: `Pipeline::dispatch`
//!
//! Interprets the input as a stream of (event, raw ADC code) pairs and
//! drives the full pipeline against a recording no-op hardware stub.
//! Asserts no panic and that the alarm, indicator, tone and tone-timer
//! state stay mutually consistent after every event.
//!
//! cargo fuzz run fuzz_pipeline_inputs

#![no_main]

use coguard::alarm::{AlarmLevel, IndicatorPattern};
use coguard::app::events::AppEvent;
use coguard::app::ports::{
    BuzzerPort, CopyEnginePort, EventSink, IndicatorPort, ModeTimerPort, SensorPort, SerialPort,
    ToneTimerPort,
};
use coguard::app::service::Pipeline;
use coguard::config::SystemConfig;
use coguard::error::CopyError;
use coguard::events::Event;
use coguard::sensors::co::RawSample;
use embassy_time::Duration;
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Stub {
    raw: u16,
    pattern: Option<IndicatorPattern>,
    buzzer: bool,
    copy: Vec<RawSample>,
    tone_running: bool,
}

impl SensorPort for Stub {
    fn read_raw(&mut self) -> u16 {
        self.raw
    }
}

impl IndicatorPort for Stub {
    fn show(&mut self, pattern: IndicatorPattern) {
        self.pattern = Some(pattern);
    }
}

impl BuzzerPort for Stub {
    fn set_buzzer(&mut self, high: bool) {
        self.buzzer = high;
    }
}

impl SerialPort for Stub {
    fn try_write(&mut self, _byte: u8) -> bool {
        true
    }
}

impl ModeTimerPort for Stub {
    fn arm_mode_timer(&mut self, _after: Duration) {}
}

impl ToneTimerPort for Stub {
    fn start_tone_timer(&mut self, _interval: Duration) {
        self.tone_running = true;
    }

    fn stop_tone_timer(&mut self) {
        self.tone_running = false;
    }
}

impl CopyEnginePort for Stub {
    fn start_copy(&mut self, src: &[RawSample]) -> Result<(), CopyError> {
        self.copy = src.to_vec();
        Ok(())
    }

    fn read_copy(&mut self, dst: &mut [RawSample]) {
        let n = dst.len().min(self.copy.len());
        dst[..n].copy_from_slice(&self.copy[..n]);
    }

    fn disable_copy(&mut self) {}
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let mut pipeline: Pipeline = Pipeline::new(SystemConfig::default());
    let mut hw = Stub::default();
    let mut sink = Discard;
    pipeline.start(&mut hw, &mut sink);

    for chunk in data.chunks_exact(3) {
        hw.raw = u16::from_le_bytes([chunk[1], chunk[2]]);
        let event = Event::ALL[usize::from(chunk[0]) % Event::ALL.len()];
        pipeline.dispatch(event, &mut hw, &mut sink);

        let level = pipeline.alarm_level();
        assert_eq!(hw.pattern, Some(IndicatorPattern::for_level(level)));
        assert_eq!(pipeline.tone().is_enabled(), level == AlarmLevel::Critical);
        assert_eq!(hw.tone_running, level == AlarmLevel::Critical);
        if level != AlarmLevel::Critical {
            assert!(!hw.buzzer, "buzzer must rest low outside Critical");
        }
        assert!(pipeline.window().filled() <= coguard::config::WINDOW_LEN);
    }
});
