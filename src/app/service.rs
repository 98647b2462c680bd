//! Pipeline service — the hexagonal core.
//!
//! [`Pipeline`] owns every subsystem of the sampling/alarm/transmit chain
//! and is mutated only by the event dispatcher.  All I/O flows through
//! port traits injected at call sites, so the whole pipeline runs against
//! mock adapters on the host.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │           Pipeline            │
//!  Output ports ◀─│ window · alarm · tone · tx ·  │
//!  Copy engine ◀─▶│ averaging · faults            │
//!                 └──────────────────────────────┘
//! ```
//!
//! ## Handler order
//!
//! ADC complete → copy complete → mode timer → tone tick, as delivered
//! by [`crate::events`].  Each handler runs to completion.

use log::{error, info, warn};

use crate::alarm::{AlarmLevel, AlarmStateMachine};
use crate::averaging::AveragingPath;
use crate::config::{SystemConfig, WINDOW_LEN};
use crate::diagnostics::{Fault, FaultEdge, FaultMonitor, RuntimeMetrics};
use crate::error::{CopyError, Error};
use crate::events::{Event, drain_events};
use crate::sensors::co::{self, CalibratedReading, Calibration};
use crate::sensors::window::SampleWindow;
use crate::tone::ToneGenerator;
use crate::transmit::{TransmissionMode, TransmissionScheduler, send_line};

use super::events::{AppEvent, AverageReport};
use super::ports::{EventSink, Hardware};

// ───────────────────────────────────────────────────────────────
// Counters
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub samples: u32,
    pub lines_sent: u32,
    pub transmit_timeouts: u32,
    pub averages: u32,
    pub copy_overruns: u32,
}

// ───────────────────────────────────────────────────────────────
// Pipeline
// ───────────────────────────────────────────────────────────────

pub struct Pipeline<const N: usize = WINDOW_LEN> {
    config: SystemConfig,
    calibration: Calibration,
    window: SampleWindow<N>,
    live: CalibratedReading,
    alarm: AlarmStateMachine,
    tone: ToneGenerator,
    scheduler: TransmissionScheduler,
    averaging: AveragingPath<N>,
    faults: FaultMonitor,
    stats: PipelineStats,
}

impl<const N: usize> Pipeline<N> {
    /// Build the pipeline from a validated configuration.
    ///
    /// Nothing is driven until [`start`](Self::start).
    pub fn new(config: SystemConfig) -> Self {
        Self {
            calibration: Calibration::from_config(&config),
            window: SampleWindow::new(),
            live: 0,
            alarm: AlarmStateMachine::from_config(&config),
            tone: ToneGenerator::new(),
            scheduler: TransmissionScheduler::from_config(&config),
            averaging: AveragingPath::new(),
            faults: FaultMonitor::new(),
            stats: PipelineStats::default(),
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive the outputs to their Safe levels and arm the mode timer.
    pub fn start(&mut self, hw: &mut impl Hardware, sink: &mut impl EventSink) {
        let outputs = self.alarm.outputs();
        hw.show(outputs.indicators);
        hw.set_buzzer(false);
        hw.arm_mode_timer(self.scheduler.period());
        sink.emit(&AppEvent::Started(self.scheduler.mode()));
        info!(
            "Pipeline started: mode={} window={} threshold={} debounce={}",
            self.scheduler.mode(),
            N,
            self.config.caution_threshold,
            self.config.debounce_samples
        );
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Run the handler for one event.
    pub fn dispatch(&mut self, event: Event, hw: &mut impl Hardware, sink: &mut impl EventSink) {
        match event {
            Event::AdcComplete => self.on_adc_complete(hw, sink),
            Event::CopyComplete => self.on_copy_complete(hw, sink),
            Event::ModeTimer => self.on_mode_timer(hw, sink),
            Event::ToneTick => self.on_tone_tick(hw),
        }
    }

    /// Service everything pending in the global event register.
    pub fn service_pending(&mut self, hw: &mut impl Hardware, sink: &mut impl EventSink) {
        drain_events(|event| self.dispatch(event, &mut *hw, &mut *sink));
    }

    // ── Handlers ──────────────────────────────────────────────

    /// New conversion: record, convert, classify, drive outputs, transmit.
    pub fn on_adc_complete(&mut self, hw: &mut impl Hardware, sink: &mut impl EventSink) {
        self.stats.samples = self.stats.samples.wrapping_add(1);

        let (raw, fault) = co::inspect(hw.read_raw());
        let fault = fault.map(Fault::from);
        for f in Fault::SENSOR {
            let edge = self.faults.eval(f, fault == Some(f));
            self.report(edge, sink);
        }

        self.window.push(raw);
        self.live = self.calibration.convert(raw);

        let previous = self.alarm.level();
        let level = self.alarm.update(self.live);
        // Outputs are re-asserted on every sample, not only on a change.
        let outputs = self.alarm.outputs();
        hw.show(outputs.indicators);
        let was_enabled = self.tone.is_enabled();
        self.tone.set_enabled(outputs.tone);
        match (was_enabled, outputs.tone) {
            (false, true) => hw.start_tone_timer(self.config.tone_toggle_interval()),
            (true, false) => hw.stop_tone_timer(),
            _ => {}
        }
        if !outputs.tone {
            hw.set_buzzer(false);
        }
        if level != previous {
            sink.emit(&AppEvent::AlarmChanged {
                from: previous,
                to: level,
            });
        }

        let line = self.scheduler.compose(self.live, self.averaging.averaged());
        match send_line(hw, line.as_bytes(), self.config.tx_spin_limit) {
            Ok(()) => {
                self.stats.lines_sent = self.stats.lines_sent.wrapping_add(1);
                let edge = self.faults.clear(Fault::TransmitTimeout);
                self.report(edge, sink);
            }
            Err(e) => {
                self.stats.transmit_timeouts = self.stats.transmit_timeouts.wrapping_add(1);
                self.latch_error(e.into(), sink);
            }
        }
    }

    /// Snapshot copy finished: compute the average from the copy.
    pub fn on_copy_complete(&mut self, hw: &mut impl Hardware, sink: &mut impl EventSink) {
        let Some(reading) =
            self.averaging
                .complete(hw, self.config.averaging_policy, &self.calibration)
        else {
            return;
        };
        self.stats.averages = self.stats.averages.wrapping_add(1);
        sink.emit(&AppEvent::AverageReady(AverageReport {
            value: reading.value,
            warm: reading.warm,
            filled: reading.filled,
        }));
    }

    /// Mode timer expired: flip, re-arm, and snapshot on entry to Averaged.
    pub fn on_mode_timer(&mut self, hw: &mut impl Hardware, sink: &mut impl EventSink) {
        let switch = self.scheduler.toggle();
        hw.arm_mode_timer(switch.rearm);
        sink.emit(&AppEvent::ModeChanged(switch.mode));

        if !switch.start_snapshot {
            return;
        }
        match self.averaging.trigger(&self.window, hw) {
            Ok(()) => {
                let edge = self.faults.clear(Fault::CopyOverrun);
                self.report(edge, sink);
            }
            Err(e) => {
                if e == CopyError::Busy {
                    self.stats.copy_overruns = self.stats.copy_overruns.wrapping_add(1);
                }
                self.latch_error(e.into(), sink);
            }
        }
    }

    /// Tone timer tick.
    pub fn on_tone_tick(&mut self, hw: &mut impl Hardware) {
        if let Some(level) = self.tone.tick() {
            hw.set_buzzer(level);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn alarm_level(&self) -> AlarmLevel {
        self.alarm.level()
    }

    pub fn consecutive_above(&self) -> u16 {
        self.alarm.consecutive()
    }

    pub fn mode(&self) -> TransmissionMode {
        self.scheduler.mode()
    }

    /// Most recent live reading.
    pub fn live_reading(&self) -> CalibratedReading {
        self.live
    }

    /// Most recent averaged reading (0 before the first snapshot).
    pub fn averaged_reading(&self) -> CalibratedReading {
        self.averaging.averaged()
    }

    pub fn window(&self) -> &SampleWindow<N> {
        &self.window
    }

    pub fn tone(&self) -> &ToneGenerator {
        &self.tone
    }

    pub fn faults(&self) -> &FaultMonitor {
        &self.faults
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Counters for the periodic metrics log line.
    pub fn metrics(&self, uptime_secs: u64, diagnostics_dropped: u32) -> RuntimeMetrics {
        RuntimeMetrics {
            uptime_secs,
            samples: self.stats.samples,
            lines_sent: self.stats.lines_sent,
            transmit_timeouts: self.stats.transmit_timeouts,
            averages: self.stats.averages,
            copy_overruns: self.stats.copy_overruns,
            faults_raised: self.faults.raised_total(),
            active_faults: self.faults.faults(),
            diagnostics_dropped,
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Latch the fault `e` maps to; errors without one are only logged.
    fn latch_error(&mut self, e: Error, sink: &mut impl EventSink) {
        match Fault::from_error(e) {
            Some(fault) => {
                warn!("{e}");
                let edge = self.faults.raise(fault);
                self.report(edge, sink);
            }
            None => error!("{e}"),
        }
    }

    fn report(&self, edge: Option<FaultEdge>, sink: &mut impl EventSink) {
        let sample = self.stats.samples;
        match edge {
            Some(FaultEdge::Raised(fault)) => sink.emit(&AppEvent::FaultRaised { fault, sample }),
            Some(FaultEdge::Cleared(fault)) => sink.emit(&AppEvent::FaultCleared { fault, sample }),
            None => {}
        }
    }
}
