//! Fault detection and recovery through the full pipeline.

use coguard::adapters::log_sink::LogEventSink;
use coguard::app::ports::EventSink;
use coguard::diagnostics::{DiagnosticsChannel, Fault, FaultEdge};
use coguard::sensors::co::convert;
use coguard::transmit::TransmissionMode;

use crate::mock_hw::SimBench;

const GAS_RAW: u16 = 2048;

#[test]
fn disconnected_sensor_raises_once_and_clears() {
    let mut b = SimBench::with_defaults();
    b.hw.raw = 0;
    b.run_secs(5);

    assert_eq!(b.faults_raised(), [Fault::SensorDisconnected]);
    assert!(b.pipeline.faults().has_fault(Fault::SensorDisconnected));
    // Zero code still converts and transmits.
    assert_eq!(b.hw.lines().len(), 5);
    assert!(b.hw.lines().iter().all(|l| l == "U0"));

    b.hw.raw = GAS_RAW;
    b.run_secs(1);
    assert_eq!(b.faults_cleared(), [Fault::SensorDisconnected]);
    assert!(!b.pipeline.faults().has_faults());
}

#[test]
fn saturated_sensor_reported() {
    let mut b = SimBench::with_defaults();
    b.hw.raw = 4095;
    b.run_secs(2);
    assert_eq!(b.faults_raised(), [Fault::SensorSaturated]);
}

#[test]
fn out_of_range_code_masked_and_reported() {
    let mut b = SimBench::with_defaults();
    b.hw.raw = 0x1000 | GAS_RAW;
    b.run_secs(1);

    assert_eq!(b.faults_raised(), [Fault::AdcOutOfRange]);
    assert_eq!(b.pipeline.window().latest(), Some(GAS_RAW));
    assert_eq!(b.pipeline.live_reading(), convert(GAS_RAW));
}

#[test]
fn stalled_uart_times_out_and_recovers() {
    let mut b = SimBench::with_defaults();
    b.hw.raw = GAS_RAW;
    b.hw.tx_stalled = true;
    b.run_secs(3);

    assert!(b.hw.tx.is_empty());
    assert_eq!(b.faults_raised(), [Fault::TransmitTimeout]);
    let stats = b.pipeline.stats();
    assert_eq!(stats.transmit_timeouts, 3);
    assert_eq!(stats.lines_sent, 0);
    // The pipeline kept acquiring while the link was down.
    assert_eq!(stats.samples, 3);

    b.hw.tx_stalled = false;
    b.run_secs(1);
    assert_eq!(b.faults_cleared(), [Fault::TransmitTimeout]);
    assert_eq!(b.hw.lines(), [format!("U{}", convert(GAS_RAW))]);
}

#[test]
fn copy_that_never_completes_flags_overrun() {
    let mut b = SimBench::with_defaults();
    b.copy_latency_us = None;
    b.hw.raw = GAS_RAW;
    b.run_secs(24);

    assert_eq!(b.hw.copy_starts(), 1, "second snapshot refused");
    assert_eq!(b.faults_raised(), [Fault::CopyOverrun]);
    assert_eq!(b.pipeline.stats().copy_overruns, 1);
    assert_eq!(b.pipeline.averaged_reading(), 0);
    assert_eq!(b.pipeline.mode(), TransmissionMode::Averaged);
    assert_eq!(b.hw.lines().last().map(String::as_str), Some("P0"));
}

#[test]
fn metrics_reflect_pipeline_counters() {
    let mut b = SimBench::with_defaults();
    b.hw.raw = GAS_RAW;
    b.run_secs(12);

    let m = b.pipeline.metrics(12, 0);
    assert_eq!(m.samples, 12);
    assert_eq!(m.lines_sent, 12);
    assert_eq!(m.averages, 1);
    assert_eq!(m.active_faults, 0);
    assert!(m.to_string().contains("samples=12"));
}

#[test]
fn log_sink_forwards_fault_edges_to_diagnostics() {
    let channel = DiagnosticsChannel::new();
    let mut b = SimBench::with_defaults();
    b.hw.raw = 0;
    b.run_secs(2);
    b.hw.raw = GAS_RAW;
    b.run_secs(1);

    let mut sink = LogEventSink::with_channel(&channel);
    for event in &b.sink.events {
        sink.emit(event);
    }

    let mut edges = Vec::new();
    channel.drain(|d| edges.push((d.edge, d.sample)));
    assert_eq!(
        edges,
        [
            (FaultEdge::Raised(Fault::SensorDisconnected), 1),
            (FaultEdge::Cleared(Fault::SensorDisconnected), 3),
        ]
    );
    assert_eq!(channel.dropped(), 0);
}
