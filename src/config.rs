use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dashboard: DashboardConfig,
    pub polling: PollingConfig,
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Live refresh interval; also the synthetic-timeline delta used when
    /// reconciling from history.
    pub refresh_interval_ms: u64,
    /// Points plotted per chart; buffers hold one extra sample.
    pub num_points: usize,
    /// Max snapshots kept in the broadcast channel for slow widgets.
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay from first data arrival to the first aggregation poll.
    pub first_poll_delay_ms: u64,
    /// Steady-state aggregation poll interval.
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Fixed value-axis maximum; 0 means the axis tracks the visible data.
    pub fixed_axis_max: f64,
    /// Pie totals above this are skew-corrected.
    pub pie_skew_threshold: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            refresh_interval_ms: 5000,
            num_points: 100,
            broadcast_capacity: 64,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            first_poll_delay_ms: 1000,
            poll_interval_ms: 2000,
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            fixed_axis_max: 0.0,
            pie_skew_threshold: crate::pie::DEFAULT_SKEW_THRESHOLD,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            dashboard: DashboardConfig::default(),
            polling: PollingConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads from CONFIG_FILE (default config.toml); built-in defaults when
    /// the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        match std::fs::read_to_string(&path) {
            Ok(s) => Self::load_from_str(&s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path, "no config file; using defaults");
                Ok(AppConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Fixed axis maximum, with 0 meaning "none configured".
    pub fn fixed_axis_max(&self) -> Option<f64> {
        (self.chart.fixed_axis_max > 0.0).then_some(self.chart.fixed_axis_max)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.dashboard.refresh_interval_ms > 0,
            "dashboard.refresh_interval_ms must be > 0, got {}",
            self.dashboard.refresh_interval_ms
        );
        anyhow::ensure!(
            self.dashboard.num_points > 0,
            "dashboard.num_points must be > 0, got {}",
            self.dashboard.num_points
        );
        anyhow::ensure!(
            self.dashboard.broadcast_capacity > 0,
            "dashboard.broadcast_capacity must be > 0, got {}",
            self.dashboard.broadcast_capacity
        );
        anyhow::ensure!(
            self.polling.first_poll_delay_ms > 0,
            "polling.first_poll_delay_ms must be > 0, got {}",
            self.polling.first_poll_delay_ms
        );
        anyhow::ensure!(
            self.polling.poll_interval_ms > 0,
            "polling.poll_interval_ms must be > 0, got {}",
            self.polling.poll_interval_ms
        );
        anyhow::ensure!(
            self.chart.fixed_axis_max >= 0.0,
            "chart.fixed_axis_max must be >= 0, got {}",
            self.chart.fixed_axis_max
        );
        anyhow::ensure!(
            self.chart.pie_skew_threshold > 0.0,
            "chart.pie_skew_threshold must be > 0, got {}",
            self.chart.pie_skew_threshold
        );
        Ok(())
    }
}
