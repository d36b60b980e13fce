// Historical backfill: rebuilds a widget's series from a bulk query result,
// synthesizing the evenly spaced timeline the query response omits.

use std::collections::BTreeMap;

use crate::models::{HistoryRequest, HistoryResponse, HistoryTransform};
use crate::series::Sample;

/// Refresh delta used when the widget's configured interval is unset or
/// invalid (< 1 ms).
pub const FALLBACK_DELTA_MS: i64 = 5000;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The query collaborator reported failure. The live buffer must be
    /// left untouched and the error surfaced on the status channel.
    #[error("history query failed (code {code}): {message}")]
    Query { code: i32, message: String },
    /// Stacked sub-metric arrays must be read in lock-step; unequal lengths
    /// break the reconstruction and are a collaborator contract violation.
    #[error("history series length mismatch: {metric} has {len} points, expected {expected}")]
    LengthMismatch {
        metric: String,
        len: usize,
        expected: usize,
    },
    #[error("history response carried no series data")]
    Empty,
}

/// Reconstructs an evenly spaced sample series from a historical-query
/// response, oldest first, ready for `SeriesBuffer::full_replace`.
///
/// The response carries no per-point timestamps; sample `i` of `n` (oldest
/// first) is stamped `anchor - (n - 1 - i) * delta` so the series ends at
/// the anchor (`LastUpdateTimestamp`, or `now_ms` when absent).
pub fn reconcile(
    response: &HistoryResponse,
    request: &HistoryRequest,
    delta_ms: i64,
    now_ms: i64,
) -> Result<Vec<Sample>, HistoryError> {
    if response.rc != 0 || response.error.is_some() {
        return Err(HistoryError::Query {
            code: response.rc,
            message: response
                .error
                .clone()
                .unwrap_or_else(|| "history query error".to_string()),
        });
    }
    if response.series.is_empty() {
        return Err(HistoryError::Empty);
    }

    let delta = if delta_ms < 1 { FALLBACK_DELTA_MS } else { delta_ms };
    let anchor = response.last_update_timestamp.unwrap_or(now_ms);
    let interval_secs = response
        .interval
        .map(|i| i as f64)
        .unwrap_or(delta as f64 / 1000.0)
        .max(1.0);

    let mut series: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (metric, values) in &response.series {
        let values = match request.transform {
            HistoryTransform::Raw => values.clone(),
            HistoryTransform::PerSecond => deltas_per_second(values, interval_secs),
        };
        series.insert(metric.as_str(), resample(&values, request.num_points));
    }

    let expected = series.values().next().map(|v| v.len()).unwrap_or(0);
    for (metric, values) in &series {
        if values.len() != expected {
            return Err(HistoryError::LengthMismatch {
                metric: (*metric).to_string(),
                len: values.len(),
                expected,
            });
        }
    }

    let timestamp = |i: usize| anchor - ((expected - 1 - i) as i64) * delta;
    let samples = if series.len() == 1 {
        let values = series.values().next().unwrap();
        (0..expected)
            .map(|i| Sample::scalar(timestamp(i), values[i]))
            .collect()
    } else {
        (0..expected)
            .map(|i| {
                let stack: BTreeMap<String, f64> = series
                    .iter()
                    .map(|(metric, values)| ((*metric).to_string(), values[i]))
                    .collect();
                Sample::stacked(timestamp(i), stack)
            })
            .collect()
    };
    Ok(samples)
}

/// Reduces a series to `num_points` values by fractional-bucket averaging,
/// preserving the overall shape when the store returned more samples than
/// the widget plots. Series at or under the target length pass through.
pub fn resample(values: &[f64], num_points: usize) -> Vec<f64> {
    if num_points == 0 || values.len() <= num_points {
        return values.to_vec();
    }

    let delta = values.len() as f64 / num_points as f64;
    let mut out = Vec::with_capacity(num_points);
    let mut cur_delta = delta;
    let mut cur_point = 0.0;
    let mut i = 0;

    while i < values.len() && out.len() < num_points {
        if cur_delta >= 1.0 {
            cur_point += values[i];
            cur_delta -= 1.0;
            i += 1;
        } else {
            cur_point += cur_delta * values[i];
            out.push((cur_point / delta).max(0.0));
            cur_point = (1.0 - cur_delta) * values[i];
            cur_delta = delta - (1.0 - cur_delta);
            i += 1;
        }
    }
    while out.len() < num_points {
        out.push(out.last().copied().unwrap_or(0.0));
    }
    out
}

/// Differences a cumulative-counter series (oldest first) into per-second
/// rates. The oldest point has nothing to difference against and repeats its
/// successor. Negative steps (counter reset) clamp to 0.
pub fn deltas_per_second(values: &[f64], interval_secs: f64) -> Vec<f64> {
    if values.len() < 2 {
        return vec![0.0; values.len()];
    }
    let interval = interval_secs.max(1.0);
    let mut out = Vec::with_capacity(values.len());
    out.push(0.0);
    for i in 1..values.len() {
        out.push(((values[i] - values[i - 1]) / interval).max(0.0));
    }
    out[0] = out[1];
    out
}

/// Historical-query collaborator.
pub trait HistorySource: Send + Sync + 'static {
    fn fetch(
        &self,
        request: HistoryRequest,
    ) -> impl Future<Output = anyhow::Result<HistoryResponse>> + Send;
}

/// History source for hosts with no historical service: every query yields
/// an empty (but successful) series, so widgets start from a blank buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHistory;

impl HistorySource for NullHistory {
    async fn fetch(&self, request: HistoryRequest) -> anyhow::Result<HistoryResponse> {
        let mut response = HistoryResponse::default();
        for metric in request.metrics {
            response.series.insert(metric, Vec::new());
        }
        Ok(response)
    }
}
