// Legend inclusion state for stacked/multi-series widgets and the
// value-axis rescale decision.

/// One sub-series entry of a stacked or multi-series widget.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub metric_key: String,
    pub label: String,
    pub included: bool,
    pub detail: Option<String>,
}

impl LegendEntry {
    pub fn new(metric_key: impl Into<String>, label: impl Into<String>) -> Self {
        LegendEntry {
            metric_key: metric_key.into(),
            label: label.into(),
            included: true,
            detail: None,
        }
    }
}

/// Applied toggle, returned to the host. Persisting legend choices across
/// navigation is the host's concern; this record is the extension point.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendChange {
    pub metric_key: String,
    pub included: bool,
}

/// Tracks which sub-series the user has hidden and decides whether the
/// renderer must recompute its value axis from the visible data.
#[derive(Debug, Clone)]
pub struct LegendController {
    entries: Vec<LegendEntry>,
    fixed_axis_max: Option<f64>,
    last_toggle_deselected: bool,
}

impl LegendController {
    pub fn new(entries: Vec<LegendEntry>, fixed_axis_max: Option<f64>) -> Self {
        LegendController {
            entries,
            fixed_axis_max,
            last_toggle_deselected: false,
        }
    }

    pub fn entries(&self) -> &[LegendEntry] {
        &self.entries
    }

    pub fn is_included(&self, metric_key: &str) -> bool {
        self.entries
            .iter()
            .find(|e| e.metric_key == metric_key)
            .is_none_or(|e| e.included)
    }

    /// Records a user toggle. Unknown keys are ignored and yield `None`.
    pub fn toggle(&mut self, metric_key: &str, included: bool) -> Option<LegendChange> {
        let entry = self.entries.iter_mut().find(|e| e.metric_key == metric_key)?;
        entry.included = included;
        self.last_toggle_deselected = !included;
        Some(LegendChange {
            metric_key: entry.metric_key.clone(),
            included,
        })
    }

    /// True when the renderer must recompute its value axis: the toggle just
    /// applied was a deselect, some entry is currently hidden (the visible
    /// total may no longer reach a fixed maximum), or no fixed maximum is
    /// configured at all.
    pub fn should_rescale_axis(&self) -> bool {
        self.last_toggle_deselected
            || self.entries.iter().any(|e| !e.included)
            || self.fixed_axis_max.is_none()
    }
}
