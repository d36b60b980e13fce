// Reconciliation tests: synthetic timeline, resampling, counter deltas,
// failure modes that must leave the buffer untouched

mod common;

use common::history_response;
use msgmon::history::{self, FALLBACK_DELTA_MS, HistoryError};
use msgmon::models::{HistoryRequest, HistoryResponse, HistoryTransform};
use msgmon::series::{SampleValue, SeriesBuffer};

fn raw_request(metrics: &[&str], num_points: usize) -> HistoryRequest {
    HistoryRequest {
        metrics: metrics.iter().map(|m| m.to_string()).collect(),
        num_points,
        transform: HistoryTransform::Raw,
    }
}

#[test]
fn reconcile_spaces_timestamps_by_delta_ending_at_anchor() {
    let response = history_response(&[("Msgs", &[1.0, 2.0, 3.0, 4.0])], 1_000_000);
    let request = raw_request(&["Msgs"], 4);

    let samples = history::reconcile(&response, &request, 5000, 0).unwrap();

    let timestamps: Vec<i64> = samples.iter().map(|s| s.timestamp_ms).collect();
    assert_eq!(timestamps, vec![985_000, 990_000, 995_000, 1_000_000]);
    assert!(timestamps.windows(2).all(|w| w[1] - w[0] == 5000));
}

#[test]
fn reconcile_uses_now_when_anchor_absent() {
    let mut response = history_response(&[("Msgs", &[7.0])], 0);
    response.last_update_timestamp = None;
    let request = raw_request(&["Msgs"], 1);

    let samples = history::reconcile(&response, &request, 5000, 123_456).unwrap();
    assert_eq!(samples[0].timestamp_ms, 123_456);
}

#[test]
fn reconcile_falls_back_to_default_delta_when_invalid() {
    let response = history_response(&[("Msgs", &[1.0, 2.0])], 1_000_000);
    let request = raw_request(&["Msgs"], 2);

    let samples = history::reconcile(&response, &request, 0, 0).unwrap();
    assert_eq!(
        samples[1].timestamp_ms - samples[0].timestamp_ms,
        FALLBACK_DELTA_MS
    );
}

#[test]
fn reconcile_roundtrips_through_full_replace() {
    let response = history_response(&[("Msgs", &[1.5, 2.5, 3.5])], 900_000);
    let request = raw_request(&["Msgs"], 3);
    let samples = history::reconcile(&response, &request, 1000, 0).unwrap();

    let mut buffer = SeriesBuffer::new(3);
    buffer.full_replace(samples.clone());
    let stored: Vec<_> = buffer.iter().cloned().collect();
    assert_eq!(stored, samples);

    let values: Vec<f64> = stored.iter().filter_map(|s| s.value.scalar()).collect();
    assert_eq!(values, vec![1.5, 2.5, 3.5]);
}

#[test]
fn reconcile_builds_stacked_samples_in_lock_step() {
    let response = history_response(
        &[("Destinations", &[1.0, 2.0]), ("ClientStates", &[10.0, 20.0])],
        50_000,
    );
    let request = raw_request(&["Destinations", "ClientStates"], 2);

    let samples = history::reconcile(&response, &request, 5000, 0).unwrap();
    assert_eq!(samples.len(), 2);
    match &samples[1].value {
        SampleValue::Stacked(map) => {
            assert_eq!(map.get("Destinations"), Some(&2.0));
            assert_eq!(map.get("ClientStates"), Some(&20.0));
        }
        SampleValue::Scalar(_) => panic!("expected stacked sample"),
    }
}

#[test]
fn reconcile_fails_fast_on_length_mismatch() {
    let response = history_response(
        &[("Destinations", &[1.0, 2.0, 3.0]), ("ClientStates", &[10.0])],
        50_000,
    );
    let request = raw_request(&["Destinations", "ClientStates"], 3);

    let err = history::reconcile(&response, &request, 5000, 0).unwrap_err();
    assert!(matches!(err, HistoryError::LengthMismatch { .. }));
}

#[test]
fn reconcile_surfaces_nonzero_result_code() {
    let mut response = history_response(&[("Msgs", &[1.0])], 50_000);
    response.rc = 113;
    let request = raw_request(&["Msgs"], 1);

    let err = history::reconcile(&response, &request, 5000, 0).unwrap_err();
    match err {
        HistoryError::Query { code, .. } => assert_eq!(code, 113),
        other => panic!("expected query error, got {other}"),
    }
}

#[test]
fn reconcile_surfaces_error_body() {
    let mut response = history_response(&[("Msgs", &[1.0])], 50_000);
    response.error = Some("store offline".to_string());
    let request = raw_request(&["Msgs"], 1);

    let err = history::reconcile(&response, &request, 5000, 0).unwrap_err();
    assert!(err.to_string().contains("store offline"));
}

#[test]
fn reconcile_rejects_response_without_series() {
    let response = HistoryResponse::default();
    let request = raw_request(&["Msgs"], 1);
    let err = history::reconcile(&response, &request, 5000, 0).unwrap_err();
    assert!(matches!(err, HistoryError::Empty));
}

#[test]
fn per_second_transform_differences_cumulative_counters() {
    let mut response = history_response(&[("Msgs", &[0.0, 50.0, 150.0, 300.0])], 1_000_000);
    response.interval = Some(5);
    let request = HistoryRequest {
        metrics: vec!["Msgs".to_string()],
        num_points: 4,
        transform: HistoryTransform::PerSecond,
    };

    let samples = history::reconcile(&response, &request, 5000, 0).unwrap();
    let values: Vec<f64> = samples.iter().filter_map(|s| s.value.scalar()).collect();
    // oldest point repeats its successor
    assert_eq!(values, vec![10.0, 10.0, 20.0, 30.0]);
}

#[test]
fn deltas_per_second_clamps_counter_resets_to_zero() {
    let out = history::deltas_per_second(&[100.0, 200.0, 50.0, 60.0], 1.0);
    assert_eq!(out, vec![100.0, 100.0, 0.0, 10.0]);
}

#[test]
fn deltas_per_second_degenerate_inputs() {
    assert!(history::deltas_per_second(&[], 5.0).is_empty());
    assert_eq!(history::deltas_per_second(&[42.0], 5.0), vec![0.0]);
}

#[test]
fn resample_passes_short_series_through() {
    let values = vec![1.0, 2.0, 3.0];
    assert_eq!(history::resample(&values, 10), values);
    assert_eq!(history::resample(&values, 3), values);
}

#[test]
fn resample_reduces_to_requested_points() {
    let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let out = history::resample(&values, 25);
    assert_eq!(out.len(), 25);
}

#[test]
fn resample_preserves_uniform_series_values() {
    let values = vec![5.0; 40];
    let out = history::resample(&values, 10);
    assert_eq!(out.len(), 10);
    for v in out {
        assert!((v - 5.0).abs() < 1e-9);
    }
}

#[test]
fn reconcile_resamples_oversized_series() {
    let values: Vec<f64> = (0..50).map(|i| i as f64).collect();
    let response = history_response(&[("Msgs", &values)], 1_000_000);
    let request = raw_request(&["Msgs"], 10);

    let samples = history::reconcile(&response, &request, 5000, 0).unwrap();
    assert_eq!(samples.len(), 10);
    assert_eq!(samples.last().unwrap().timestamp_ms, 1_000_000);
}
