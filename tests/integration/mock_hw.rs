//! Mock hardware and a virtual-time bench for integration tests.
//!
//! [`MockHardware`] records every output call so tests can assert on the
//! full command history without touching real GPIO or UART registers.
//! [`SimBench`] wires it to a [`Pipeline`] and three [`VirtualTimer`]s
//! and advances a simulated clock, delivering events through a local
//! pending register exactly as the idle loop does on target.

use coguard::alarm::IndicatorPattern;
use coguard::app::events::AppEvent;
use coguard::app::ports::{
    BuzzerPort, CopyEnginePort, EventSink, IndicatorPort, ModeTimerPort, SensorPort, SerialPort,
    ToneTimerPort,
};
use coguard::app::service::Pipeline;
use coguard::config::SystemConfig;
use coguard::drivers::hw_timer::VirtualTimer;
use coguard::error::CopyError;
use coguard::events::{Event, PendingEvents};
use coguard::sensors::co::RawSample;
use embassy_time::Duration;

// ── Output call record ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    Show(IndicatorPattern),
    Buzzer(bool),
    ArmModeTimer(Duration),
    StartToneTimer(Duration),
    StopToneTimer,
    StartCopy(usize),
    DisableCopy,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<HwCall>,
    /// Value the data latch returns.
    pub raw: u16,
    pub tx: Vec<u8>,
    /// While set, the UART never reports ready.
    pub tx_stalled: bool,
    /// Latest re-arm request, consumed by the bench.
    pub pending_arm: Option<Duration>,
    /// Tone timer start/stop requests, consumed by the bench.
    pub pending_tone_start: Option<Duration>,
    pub pending_tone_stop: bool,
    copy_buf: Vec<RawSample>,
    /// A transfer started and not yet signalled complete.
    pub copy_started: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            raw: 0,
            tx: Vec::new(),
            tx_stalled: false,
            pending_arm: None,
            pending_tone_start: None,
            pending_tone_stop: false,
            copy_buf: Vec::new(),
            copy_started: false,
        }
    }

    /// Completed lines on the wire, newline stripped.
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.tx)
            .split_terminator('\n')
            .map(str::to_owned)
            .collect()
    }

    pub fn buzzer_high(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                HwCall::Buzzer(level) => Some(*level),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn buzzer_toggles(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HwCall::Buzzer(_)))
            .count()
    }

    /// Times the buzzer line was driven high.
    pub fn buzzer_rises(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HwCall::Buzzer(true)))
            .count()
    }

    pub fn last_pattern(&self) -> Option<IndicatorPattern> {
        self.calls.iter().rev().find_map(|c| match c {
            HwCall::Show(p) => Some(*p),
            _ => None,
        })
    }

    pub fn copy_starts(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HwCall::StartCopy(_)))
            .count()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_raw(&mut self) -> u16 {
        self.raw
    }
}

impl IndicatorPort for MockHardware {
    fn show(&mut self, pattern: IndicatorPattern) {
        self.calls.push(HwCall::Show(pattern));
    }
}

impl BuzzerPort for MockHardware {
    fn set_buzzer(&mut self, high: bool) {
        self.calls.push(HwCall::Buzzer(high));
    }
}

impl SerialPort for MockHardware {
    fn try_write(&mut self, byte: u8) -> bool {
        if self.tx_stalled {
            return false;
        }
        self.tx.push(byte);
        true
    }
}

impl ModeTimerPort for MockHardware {
    fn arm_mode_timer(&mut self, after: Duration) {
        self.calls.push(HwCall::ArmModeTimer(after));
        self.pending_arm = Some(after);
    }
}

impl ToneTimerPort for MockHardware {
    fn start_tone_timer(&mut self, interval: Duration) {
        self.calls.push(HwCall::StartToneTimer(interval));
        self.pending_tone_start = Some(interval);
    }

    fn stop_tone_timer(&mut self) {
        self.calls.push(HwCall::StopToneTimer);
        self.pending_tone_stop = true;
    }
}

impl CopyEnginePort for MockHardware {
    fn start_copy(&mut self, src: &[RawSample]) -> Result<(), CopyError> {
        self.calls.push(HwCall::StartCopy(src.len()));
        self.copy_buf = src.to_vec();
        self.copy_started = true;
        Ok(())
    }

    fn read_copy(&mut self, dst: &mut [RawSample]) {
        let n = dst.len().min(self.copy_buf.len());
        dst[..n].copy_from_slice(&self.copy_buf[..n]);
    }

    fn disable_copy(&mut self) {
        self.calls.push(HwCall::DisableCopy);
    }
}

// ── Recording sink ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Simulation bench ──────────────────────────────────────────

/// Simulated time step.
pub const STEP_US: u64 = 1_000;

pub struct SimBench {
    pub pipeline: Pipeline,
    pub hw: MockHardware,
    pub sink: RecordingSink,
    pub now_us: u64,
    pending: PendingEvents,
    acquisition: VirtualTimer,
    tone: VirtualTimer,
    mode: VirtualTimer,
    /// `ToneTick`s raised by the tone timer so far.
    pub tone_ticks: u32,
    /// Delay between a copy start and its completion event; `None` means
    /// the engine never completes.
    pub copy_latency_us: Option<u64>,
    copy_done_at: Option<u64>,
}

#[allow(dead_code)]
impl SimBench {
    pub fn new(config: SystemConfig) -> Self {
        let acquisition = VirtualTimer::periodic(Event::AdcComplete, config.acquisition_period(), 0);
        // Idle until the pipeline asks for it.
        let mut tone = VirtualTimer::periodic(Event::ToneTick, config.tone_toggle_interval(), 0);
        tone.stop();
        let mut bench = Self {
            pipeline: Pipeline::new(config),
            hw: MockHardware::new(),
            sink: RecordingSink::default(),
            now_us: 0,
            pending: PendingEvents::new(),
            acquisition,
            tone,
            mode: VirtualTimer::one_shot(Event::ModeTimer),
            tone_ticks: 0,
            copy_latency_us: Some(200),
            copy_done_at: None,
        };
        bench.pipeline.start(&mut bench.hw, &mut bench.sink);
        bench.apply_requests();
        bench
    }

    /// Bench with a short UART spin budget so stalls resolve quickly.
    pub fn with_defaults() -> Self {
        Self::new(SystemConfig {
            tx_spin_limit: 3,
            ..SystemConfig::default()
        })
    }

    /// Advance simulated time by `ms` milliseconds.
    pub fn run_ms(&mut self, ms: u64) {
        let end = self.now_us + ms * 1_000;
        while self.now_us < end {
            self.now_us += STEP_US;
            self.step();
        }
    }

    pub fn run_secs(&mut self, secs: u64) {
        self.run_ms(secs * 1_000);
    }

    fn step(&mut self) {
        let now = self.now_us;
        self.acquisition.poll(now, &self.pending);
        self.tone_ticks += self.tone.poll(now, &self.pending);
        self.mode.poll(now, &self.pending);
        if self.copy_done_at.is_some_and(|t| t <= now) {
            self.copy_done_at = None;
            self.pending.raise(Event::CopyComplete);
        }

        let Self { pipeline, hw, sink, pending, .. } = self;
        pending.drain(|event| pipeline.dispatch(event, &mut *hw, &mut *sink));
        self.apply_requests();
    }

    /// Turn hardware requests made during dispatch into timer state.
    fn apply_requests(&mut self) {
        if let Some(after) = self.hw.pending_arm.take() {
            self.mode.arm(self.now_us, after);
        }
        if std::mem::take(&mut self.hw.pending_tone_stop) {
            self.tone.stop();
        }
        if let Some(interval) = self.hw.pending_tone_start.take() {
            self.tone.arm(self.now_us, interval);
        }
        if std::mem::take(&mut self.hw.copy_started) {
            self.copy_done_at = self.copy_latency_us.map(|l| self.now_us + l);
        }
    }

    pub fn faults_raised(&self) -> Vec<coguard::diagnostics::Fault> {
        self.sink
            .events
            .iter()
            .filter_map(|e| match e {
                AppEvent::FaultRaised { fault, .. } => Some(*fault),
                _ => None,
            })
            .collect()
    }

    pub fn faults_cleared(&self) -> Vec<coguard::diagnostics::Fault> {
        self.sink
            .events
            .iter()
            .filter_map(|e| match e {
                AppEvent::FaultCleared { fault, .. } => Some(*fault),
                _ => None,
            })
            .collect()
    }
}
