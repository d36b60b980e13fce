// Fixed-capacity, time-ordered sample window. One buffer per chart widget;
// stacked widgets store a value per sub-metric in every sample.

use std::collections::{BTreeMap, VecDeque};

/// One plotted point: a scalar for single-series charts, a per-sub-metric
/// map for stacked charts. Every sample in a buffer must carry the same
/// key set; the aggregation layer zero-fills absent sub-metrics.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Scalar(f64),
    Stacked(BTreeMap<String, f64>),
}

impl SampleValue {
    pub fn scalar(&self) -> Option<f64> {
        match self {
            SampleValue::Scalar(v) => Some(*v),
            SampleValue::Stacked(_) => None,
        }
    }

    fn same_key_set(&self, other: &SampleValue) -> bool {
        match (self, other) {
            (SampleValue::Stacked(a), SampleValue::Stacked(b)) => {
                a.len() == b.len() && a.keys().zip(b.keys()).all(|(x, y)| x == y)
            }
            (SampleValue::Scalar(_), SampleValue::Scalar(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub value: SampleValue,
}

impl Sample {
    pub fn scalar(timestamp_ms: i64, value: f64) -> Self {
        Sample {
            timestamp_ms,
            value: SampleValue::Scalar(value),
        }
    }

    pub fn stacked(timestamp_ms: i64, values: BTreeMap<String, f64>) -> Self {
        Sample {
            timestamp_ms,
            value: SampleValue::Stacked(values),
        }
    }
}

/// Sliding window of the most recent samples, oldest first.
/// Capacity is `num_points + 1`; a live append on a full buffer evicts the
/// oldest sample before the new one lands.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl SeriesBuffer {
    pub fn new(num_points: usize) -> Self {
        let capacity = num_points + 1;
        SeriesBuffer {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Discards current contents and stores `samples`, chronologically
    /// ascending, truncated to the newest `capacity` entries. Used after
    /// historical reconciliation.
    pub fn full_replace(&mut self, mut samples: Vec<Sample>) {
        samples.sort_by_key(|s| s.timestamp_ms);
        let excess = samples.len().saturating_sub(self.capacity);
        self.samples = samples.into_iter().skip(excess).collect();
    }

    /// Appends one sample, evicting the oldest first when full. Appending a
    /// stacked sample whose key set differs from the buffer's is a caller
    /// error; the buffer does not self-heal.
    pub fn live_append(&mut self, sample: Sample) {
        if let Some(last) = self.samples.back() {
            debug_assert!(
                last.value.same_key_set(&sample.value),
                "sample key set diverged from buffer"
            );
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }
}
