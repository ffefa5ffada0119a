//! Tests for the weight update rule.

use chrono::{TimeZone, Utc};

use crate::config::ScoringConfig;
use crate::probe::{Measurement, RESPONSE_TIME_CAP_MS};

use super::super::params::ScoringParams;
use super::super::record::EndpointRecord;
use super::ScoringEngine;

fn engine() -> ScoringEngine {
    ScoringEngine::default()
}

fn m(status: u32, response_time_ms: f64, bytes_per_sec: f64) -> Measurement {
    Measurement {
        response_time_ms,
        status_code: status,
        throughput_bytes_per_sec: bytes_per_sec,
        bytes_received: if bytes_per_sec > 0.0 { 1024 } else { 0 },
    }
}

fn record() -> EndpointRecord {
    EndpointRecord::new("https://gw.example.org", true)
}

#[test]
fn default_params_match_reference_constants() {
    let p = ScoringParams::default();
    assert!((p.alpha() - 2.0 / 11.0).abs() < 1e-12);
    assert!((p.k_time() - 1.25f64.ln()).abs() < 1e-12);
    assert!((p.k_speed_logistic() - (1.0 / 0.7 - 1.0)).abs() < 1e-12);
    assert_eq!(p.beta(), 2.0);
    assert_eq!(p.w_min(), 0.001);
    assert_eq!(p.history_len(), 10);
}

#[test]
fn params_fall_back_on_unusable_values() {
    let p = ScoringParams::from_config(&ScoringConfig {
        window: 0,
        beta: f64::NAN,
        w_min: -1.0,
        base_ln: 1.5,
        k_speed: 0.0,
        history_len: 0,
    });
    assert_eq!(p.window(), 1);
    assert_eq!(p.alpha(), 1.0);
    assert_eq!(p.beta(), 2.0);
    assert_eq!(p.w_min(), 0.001);
    assert_eq!(p.base_ln(), 0.8);
    assert_eq!(p.k_speed(), 0.7);
    assert_eq!(p.history_len(), 1);
}

#[test]
fn gamma_time_endpoints() {
    let e = engine();
    assert!((e.gamma_time(0.0) - 1.0).abs() < 1e-12);
    assert!((e.gamma_time(RESPONSE_TIME_CAP_MS) - 0.8).abs() < 1e-12);
}

#[test]
fn gamma_speed_endpoints() {
    let e = engine();
    assert!((e.gamma_speed(0.0) - 0.7).abs() < 1e-12);
    assert!((e.gamma_speed(1.0e6) - 1.0).abs() < 1e-12);
}

#[test]
fn gamma_time_is_monotone_in_response_time() {
    let e = engine();
    let mut prev = e.gamma_time(0.0);
    for step in 1..=150 {
        let g = e.gamma_time(step as f64 * 10.0);
        assert!(g <= prev, "gamma_time increased at {} ms", step * 10);
        prev = g;
    }
}

#[test]
fn gamma_speed_is_monotone_in_throughput() {
    let e = engine();
    let mut prev = e.gamma_speed(0.0);
    for step in 1..=200 {
        let g = e.gamma_speed(step as f64 * 50.0);
        assert!(g >= prev, "gamma_speed decreased at {} KB/s", step * 50);
        prev = g;
    }
}

#[test]
fn perfect_probe_on_perfect_record_keeps_full_weight() {
    let e = engine();
    let next = e.update(&record(), &m(206, 0.0, f64::INFINITY));
    assert!((next.success_ema - 1.0).abs() < 1e-12);
    assert!((next.weight - 1.0).abs() < 1e-9);
}

#[test]
fn single_update_matches_formula() {
    let e = engine();
    let mut r = record();
    r.success_ema = 0.5;
    let next = e.update(&r, &m(206, 750.0, 512.0 * 1024.0));

    let alpha: f64 = 2.0 / 11.0;
    let ema = alpha + (1.0 - alpha) * 0.5;
    let gamma_time = (-(1.25f64.ln()) * 0.5).exp();
    let gamma_speed = 1.0 / (1.0 + (1.0 / 0.7 - 1.0) * (-0.5f64).exp());
    let expected = ema.powi(2) * gamma_time * gamma_speed;

    assert!((next.success_ema - ema).abs() < 1e-12);
    assert!((next.weight - expected).abs() < 1e-12);
    let last = next.last_measurement.as_ref().unwrap();
    assert_eq!(last.status_code, 206);
    assert_eq!(last.response_time_ms, 750.0);
    assert_eq!(last.throughput_kbs, 512.0);
    assert_eq!(next.throughput_history.back(), Some(&512.0));
    assert_eq!(next.weight_history.back(), Some(&next.weight));
}

#[test]
fn response_time_is_clamped_before_scoring() {
    let e = engine();
    let slow = e.update(&record(), &m(206, 90_000.0, 2048.0));
    let capped = e.update(&record(), &m(206, RESPONSE_TIME_CAP_MS, 2048.0));
    assert_eq!(slow.weight, capped.weight);
    assert_eq!(
        slow.last_measurement.unwrap().response_time_ms,
        RESPONSE_TIME_CAP_MS
    );
}

#[test]
fn weight_never_drops_below_floor() {
    let e = engine();
    let mut r = record();
    for _ in 0..200 {
        r = e.update(&r, &Measurement::WORST_CASE);
        assert!(r.weight >= 0.001);
        assert!((0.0..=1.0).contains(&r.success_ema));
    }
    assert_eq!(r.weight, 0.001);
}

#[test]
fn ema_stays_in_unit_interval_for_mixed_outcomes() {
    let e = engine();
    let mut r = record();
    for i in 0..500u32 {
        let status = if (i * 7 + i / 3) % 5 < 2 { 206 } else { 502 };
        r = e.update(&r, &m(status, (i % 1600) as f64, (i % 13) as f64 * 4096.0));
        assert!((0.0..=1.0).contains(&r.success_ema));
        assert!(r.weight >= 0.001 && r.weight <= 1.0);
    }
}

#[test]
fn histories_keep_latest_ten_in_arrival_order() {
    let e = engine();
    let mut r = record();
    for i in 1..=14 {
        r = e.update(&r, &m(206, 100.0, i as f64 * 1024.0));
    }
    assert_eq!(r.throughput_history.len(), 10);
    assert_eq!(r.weight_history.len(), 10);
    let expected: Vec<f64> = (5..=14).map(|i| i as f64).collect();
    assert_eq!(r.throughput_history.iter().copied().collect::<Vec<_>>(), expected);
    assert_eq!(r.total_attempts, 14);
}

#[test]
fn avg_throughput_skips_zero_samples() {
    let e = engine();
    let mut r = record();
    r = e.update(&r, &m(206, 100.0, 100.0 * 1024.0));
    r = e.update(&r, &Measurement::WORST_CASE);
    r = e.update(&r, &m(206, 100.0, 300.0 * 1024.0));
    assert_eq!(r.throughput_history.len(), 3);
    assert!((r.avg_throughput - 200.0).abs() < 1e-9);
}

#[test]
fn status_200_is_excluded_from_success_accounting() {
    let e = engine();
    let r = e.update(&record(), &m(200, 100.0, 4096.0));
    assert_eq!(r.total_attempts, 1);
    assert_eq!(r.valid_test_count, 0);
    assert_eq!(r.success_count, 0);
    // Still scored as a non-success.
    assert!(r.success_ema < 1.0);
    assert_eq!(r.weight_history.len(), 1);
}

#[test]
fn status_206_counts_valid_and_success() {
    let e = engine();
    let r = e.update(&record(), &m(206, 100.0, 4096.0));
    assert_eq!((r.total_attempts, r.valid_test_count, r.success_count), (1, 1, 1));
}

#[test]
fn other_status_counts_valid_only() {
    let e = engine();
    let mut r = record();
    for status in [0, 404, 429, 502] {
        r = e.update(&r, &m(status, 100.0, 0.0));
    }
    assert_eq!((r.total_attempts, r.valid_test_count, r.success_count), (4, 4, 0));
    assert_eq!(r.success_rate(), 0.0);
}

#[test]
fn zero_byte_probe_scores_below_same_status_with_throughput() {
    let e = engine();
    let empty = Measurement {
        response_time_ms: RESPONSE_TIME_CAP_MS,
        status_code: 206,
        throughput_bytes_per_sec: 0.0,
        bytes_received: 0,
    };
    let with_data = Measurement {
        response_time_ms: RESPONSE_TIME_CAP_MS,
        status_code: 206,
        throughput_bytes_per_sec: 64.0 * 1024.0,
        bytes_received: 65_536,
    };
    let a = e.update(&record(), &empty);
    let b = e.update(&record(), &with_data);
    assert!(a.weight < b.weight);
}

#[test]
fn update_is_pure_and_deterministic() {
    let e = engine();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let r = record();
    let probe = m(206, 321.0, 77_000.0);
    let a = e.update_at(&r, &probe, at);
    let b = e.update_at(&r, &probe, at);
    assert_eq!(a, b);
    assert_eq!(r, record(), "input record must not change");
    assert_eq!(a.last_measurement.unwrap().timestamp, at);
}

#[test]
fn corrupted_record_is_repaired_before_update() {
    let e = engine();
    let mut r = record();
    r.success_ema = f64::NAN;
    r.weight = f64::NEG_INFINITY;
    r.total_attempts = 0;
    r.valid_test_count = 3;
    r.success_count = 3;
    let next = e.update(&r, &m(206, 0.0, 1.0e9));
    assert!((next.success_ema - 1.0).abs() < 1e-12);
    assert_eq!((next.total_attempts, next.valid_test_count, next.success_count), (1, 1, 1));
    assert_eq!(next.url, "https://gw.example.org");
    assert!(next.is_primary);
}

#[test]
fn non_finite_measurement_fields_are_contained() {
    let e = engine();
    let weird = Measurement {
        response_time_ms: f64::NAN,
        status_code: 206,
        throughput_bytes_per_sec: f64::NAN,
        bytes_received: 0,
    };
    let next = e.update(&record(), &weird);
    let last = next.last_measurement.as_ref().unwrap();
    assert_eq!(last.response_time_ms, RESPONSE_TIME_CAP_MS);
    assert_eq!(last.throughput_kbs, 0.0);
    assert!(next.weight.is_finite());
}
