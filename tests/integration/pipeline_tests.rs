//! End-to-end pipeline behaviour on a virtual clock.

use coguard::alarm::{AlarmLevel, IndicatorPattern};
use coguard::app::events::AppEvent;
use coguard::config::SystemConfig;
use coguard::sensors::co::convert;
use coguard::transmit::TransmissionMode;

use crate::mock_hw::{HwCall, SimBench};

/// Mid-scale code, well above the default caution threshold.
const GAS_RAW: u16 = 2048;
/// Clean-air code, well below the default caution threshold.
const CLEAN_RAW: u16 = 400;

fn bench_at(raw: u16) -> SimBench {
    let mut b = SimBench::with_defaults();
    b.hw.raw = raw;
    b
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_drives_safe_outputs_and_arms_live_period() {
    let b = bench_at(CLEAN_RAW);
    assert_eq!(
        b.hw.calls[..3],
        [
            HwCall::Show(IndicatorPattern::for_level(AlarmLevel::Safe)),
            HwCall::Buzzer(false),
            HwCall::ArmModeTimer(b.pipeline.config().live_period()),
        ]
    );
    assert_eq!(b.sink.events, [AppEvent::Started(TransmissionMode::Live)]);
    assert!(b.hw.tx.is_empty());
}

#[test]
fn clean_air_stays_safe() {
    let mut b = bench_at(CLEAN_RAW);
    b.run_secs(30);

    assert!(convert(CLEAN_RAW) < b.pipeline.config().caution_threshold);
    assert_eq!(b.pipeline.alarm_level(), AlarmLevel::Safe);
    assert_eq!(b.pipeline.consecutive_above(), 0);
    assert_eq!(b.pipeline.stats().samples, 30);
    assert!(!b.hw.buzzer_high());
    assert!(b.faults_raised().is_empty());
}

// ── Transmission ──────────────────────────────────────────────

#[test]
fn one_live_line_per_acquisition() {
    let mut b = bench_at(GAS_RAW);
    b.run_secs(5);

    let expected = format!("U{}", convert(GAS_RAW));
    assert_eq!(b.hw.lines(), vec![expected; 5]);
    assert_eq!(b.pipeline.stats().lines_sent, 5);
}

#[test]
fn averaged_reading_is_zero_before_first_snapshot() {
    let mut b = bench_at(GAS_RAW);
    b.run_secs(9);
    assert_eq!(b.pipeline.averaged_reading(), 0);
    assert_eq!(b.pipeline.mode(), TransmissionMode::Live);
}

#[test]
fn modes_alternate_ten_seconds_live_three_averaged() {
    let mut b = bench_at(GAS_RAW);
    b.run_secs(26);

    let value = convert(GAS_RAW);
    let live = format!("U{value}");
    // A full window of identical samples averages to the sample itself.
    let averaged = format!("P{value}");

    let lines = b.hw.lines();
    assert_eq!(lines.len(), 26);
    for (i, line) in lines.iter().enumerate() {
        let n = i + 1;
        let expected = if (11..=13).contains(&n) || (24..=26).contains(&n) {
            &averaged
        } else {
            &live
        };
        assert_eq!(line, expected, "line {n}");
    }

    let modes: Vec<_> = b
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ModeChanged(m) => Some(*m),
            _ => None,
        })
        .collect();
    assert_eq!(
        modes,
        [
            TransmissionMode::Averaged,
            TransmissionMode::Live,
            TransmissionMode::Averaged,
            // The 26 s conversion is serviced before the mode flip.
            TransmissionMode::Live,
        ]
    );
}

#[test]
fn each_averaged_entry_takes_one_snapshot() {
    let mut b = bench_at(GAS_RAW);
    b.run_secs(40);

    // Averaged entries at 10 s and 23 s and 36 s.
    assert_eq!(b.hw.copy_starts(), 3);
    assert_eq!(b.pipeline.stats().averages, 3);
    let disables = b
        .hw
        .calls
        .iter()
        .filter(|c| matches!(c, HwCall::DisableCopy))
        .count();
    assert_eq!(disables, 3);
}

#[test]
fn mode_timer_rearmed_with_period_of_new_mode() {
    let mut b = bench_at(GAS_RAW);
    b.run_secs(14);

    let config = b.pipeline.config().clone();
    let arms: Vec<_> = b
        .hw
        .calls
        .iter()
        .filter_map(|c| match c {
            HwCall::ArmModeTimer(d) => Some(*d),
            _ => None,
        })
        .collect();
    assert_eq!(
        arms,
        [
            config.live_period(),
            config.averaged_period(),
            config.live_period()
        ]
    );
}

#[test]
fn untagged_lines_are_bare_decimals() {
    let mut b = SimBench::new(SystemConfig {
        tag_lines: false,
        tx_spin_limit: 3,
        ..SystemConfig::default()
    });
    b.hw.raw = GAS_RAW;
    b.run_secs(12);

    let value = convert(GAS_RAW).to_string();
    assert!(b.hw.lines().iter().all(|l| *l == value));
}

// ── Averaging ─────────────────────────────────────────────────

#[test]
fn snapshot_before_window_fills_reports_cold_average() {
    let mut b = SimBench::new(SystemConfig {
        live_period_ms: 3_000,
        tx_spin_limit: 3,
        ..SystemConfig::default()
    });
    b.hw.raw = GAS_RAW;
    b.run_secs(4);

    // Three real samples, seven empty slots converting to zero.
    let expected = 3 * u32::from(convert(GAS_RAW)) / 10;
    let avg = b
        .sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::AverageReady(a) => Some(*a),
            _ => None,
        })
        .expect("average reported");
    assert_eq!(u32::from(avg.value), expected);
    assert!(!avg.warm);
    assert_eq!(avg.filled, 3);
    assert_eq!(b.hw.lines()[3], format!("P{expected}"));
}

#[test]
fn average_reflects_window_at_snapshot_time() {
    let mut b = bench_at(GAS_RAW);
    b.run_secs(10);
    // Readings change after the snapshot; the averaged line does not.
    b.hw.raw = CLEAN_RAW;
    b.run_secs(3);

    let lines = b.hw.lines();
    let averaged = format!("P{}", convert(GAS_RAW));
    assert_eq!(lines[10..13], [averaged.clone(), averaged.clone(), averaged]);
    assert_eq!(b.pipeline.live_reading(), convert(CLEAN_RAW));
}

// ── Alarm ─────────────────────────────────────────────────────

#[test]
fn sustained_gas_escalates_to_critical_after_debounce() {
    let mut b = bench_at(GAS_RAW);

    b.run_secs(1);
    assert_eq!(b.pipeline.alarm_level(), AlarmLevel::Caution);
    assert_eq!(
        b.hw.last_pattern(),
        Some(IndicatorPattern::for_level(AlarmLevel::Caution))
    );

    b.run_secs(8);
    assert_eq!(b.pipeline.alarm_level(), AlarmLevel::Caution);
    assert_eq!(b.hw.buzzer_rises(), 0);
    assert_eq!(b.tone_ticks, 0, "tone timer idle below Critical");

    b.run_secs(1);
    assert_eq!(b.pipeline.alarm_level(), AlarmLevel::Critical);
    assert_eq!(
        b.hw.last_pattern(),
        Some(IndicatorPattern::for_level(AlarmLevel::Critical))
    );

    b.run_secs(1);
    // 50 ms ticks from the Critical sample onward.
    assert_eq!(b.tone_ticks, 20);
    assert_eq!(b.pipeline.tone().toggles(), 20);
    assert_eq!(b.hw.buzzer_rises(), 10);
}

#[test]
fn clean_reading_silences_critical_alarm() {
    let mut b = bench_at(GAS_RAW);
    b.run_secs(12);
    assert_eq!(b.pipeline.alarm_level(), AlarmLevel::Critical);

    b.hw.raw = CLEAN_RAW;
    b.run_secs(1);
    assert_eq!(b.pipeline.alarm_level(), AlarmLevel::Safe);
    assert!(!b.pipeline.tone().is_enabled());
    assert!(!b.hw.buzzer_high());

    assert!(b.hw.calls.contains(&HwCall::StopToneTimer));
    let rises = b.hw.buzzer_rises();
    let ticks = b.tone_ticks;
    b.run_secs(2);
    assert_eq!(b.hw.buzzer_rises(), rises, "buzzer idle while safe");
    assert_eq!(b.tone_ticks, ticks, "tone timer stopped");
}

#[test]
fn tone_timer_never_started_in_clean_air() {
    let mut b = bench_at(CLEAN_RAW);
    b.run_secs(30);

    assert_eq!(b.tone_ticks, 0);
    assert!(!b
        .hw
        .calls
        .iter()
        .any(|c| matches!(c, HwCall::StartToneTimer(_))));
}

#[test]
fn every_sample_reasserts_indicators_and_buzzer() {
    let mut b = bench_at(CLEAN_RAW);
    b.hw.calls.clear();
    b.run_secs(3);

    let safe = IndicatorPattern::for_level(AlarmLevel::Safe);
    let shows = b
        .hw
        .calls
        .iter()
        .filter(|c| **c == HwCall::Show(safe))
        .count();
    let lows = b
        .hw
        .calls
        .iter()
        .filter(|c| **c == HwCall::Buzzer(false))
        .count();
    assert_eq!(shows, 3);
    assert_eq!(lows, 3);
}

#[test]
fn alarm_transitions_are_reported() {
    let mut b = bench_at(GAS_RAW);
    b.run_secs(10);
    b.hw.raw = CLEAN_RAW;
    b.run_secs(1);

    let changes: Vec<_> = b
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::AlarmChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        [
            (AlarmLevel::Safe, AlarmLevel::Caution),
            (AlarmLevel::Caution, AlarmLevel::Critical),
            (AlarmLevel::Critical, AlarmLevel::Safe),
        ]
    );
}

#[test]
fn single_dip_restarts_debounce() {
    let mut b = bench_at(GAS_RAW);
    b.run_secs(9);
    b.hw.raw = CLEAN_RAW;
    b.run_secs(1);
    b.hw.raw = GAS_RAW;
    b.run_secs(9);

    assert_eq!(b.pipeline.alarm_level(), AlarmLevel::Caution);
    assert_eq!(b.pipeline.consecutive_above(), 9);
}
