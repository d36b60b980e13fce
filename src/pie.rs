// Pie-chart skew correction: once totals grow past a threshold, small but
// nonzero slices are rescaled so they stay visible next to dominant ones.

use crate::units;

pub const DEFAULT_SKEW_THRESHOLD: f64 = 100_000.0;

/// Smallest plotted value for a nonzero slice under skew correction.
const MIN_VISIBLE_SLICE: f64 = 0.1;

/// One pie slice, recomputed from the source payload on every refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub metric_key: String,
    pub raw_value: f64,
    pub display_value: String,
    pub legend_text: String,
    pub plotted_value: f64,
}

#[derive(Debug, Clone)]
pub struct PieScaler {
    skew_threshold: f64,
    no_data_marker: String,
}

impl PieScaler {
    pub fn new(skew_threshold: f64) -> Self {
        PieScaler {
            skew_threshold,
            no_data_marker: "no data".to_string(),
        }
    }

    /// Builds slices from `(key, raw_value)` pairs. When the total exceeds
    /// the skew threshold, each nonzero slice plots its rounded percentage
    /// of the total with a 0.1 floor; true-zero slices are never boosted.
    /// Below the threshold slices plot their raw values.
    pub fn scale<'a>(&self, values: impl IntoIterator<Item = (&'a str, f64)>) -> Vec<PieSlice> {
        let values: Vec<(&str, f64)> = values.into_iter().collect();
        let total: f64 = values.iter().map(|(_, v)| v).sum();
        let skewed = total > self.skew_threshold;

        values
            .into_iter()
            .map(|(key, raw)| {
                let plotted = if skewed && raw > 0.0 {
                    ((raw / total) * 100.0).round().max(MIN_VISIBLE_SLICE)
                } else {
                    raw
                };
                let display = units::format_slice_value(raw);
                PieSlice {
                    metric_key: key.to_string(),
                    raw_value: raw,
                    legend_text: format!("{key}: {display}"),
                    display_value: display,
                    plotted_value: plotted,
                }
            })
            .collect()
    }

    /// Forces the no-data state: every plotted value drops to 0 and legends
    /// show the marker. Visually identical to all-zero data, deliberately.
    pub fn mark_no_data(&self, slices: &mut [PieSlice]) {
        for slice in slices {
            slice.plotted_value = 0.0;
            slice.legend_text = format!("{}: {}", slice.metric_key, self.no_data_marker);
        }
    }
}

impl Default for PieScaler {
    fn default() -> Self {
        PieScaler::new(DEFAULT_SKEW_THRESHOLD)
    }
}
