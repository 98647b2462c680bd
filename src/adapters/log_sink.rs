//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured pipeline events to the
//! ESP-IDF logger (console UART / USB-CDC in production), and forwards
//! fault transitions into the [`DIAGNOSTICS`] channel.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::diagnostics::{DIAGNOSTICS, Diagnostic, DiagnosticsChannel, FaultEdge};

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink<'a> {
    diagnostics: &'a DiagnosticsChannel,
}

impl LogEventSink<'static> {
    pub fn new() -> Self {
        Self {
            diagnostics: &DIAGNOSTICS,
        }
    }
}

impl Default for LogEventSink<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> LogEventSink<'a> {
    /// Sink that posts into a caller-owned channel.
    pub fn with_channel(diagnostics: &'a DiagnosticsChannel) -> Self {
        Self { diagnostics }
    }

    fn post(&self, edge: FaultEdge, sample: u32) {
        if !self.diagnostics.report(Diagnostic { edge, sample }) {
            debug!("DIAG | channel full, diagnostic dropped");
        }
    }
}

impl EventSink for LogEventSink<'_> {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | mode={}", mode);
            }
            AppEvent::AlarmChanged { from, to } => {
                info!("ALARM | {} -> {}", from, to);
            }
            AppEvent::ModeChanged(mode) => {
                info!("MODE | {}", mode);
            }
            AppEvent::AverageReady(avg) => {
                if avg.warm {
                    info!("AVG | value={}", avg.value);
                } else {
                    info!("AVG | value={} (warming up, {} samples)", avg.value, avg.filled);
                }
            }
            AppEvent::FaultRaised { fault, sample } => {
                warn!("FAULT | raised: {} @ sample {}", fault, sample);
                self.post(FaultEdge::Raised(*fault), *sample);
            }
            AppEvent::FaultCleared { fault, sample } => {
                info!("FAULT | cleared: {} @ sample {}", fault, sample);
                self.post(FaultEdge::Cleared(*fault), *sample);
            }
        }
    }
}
