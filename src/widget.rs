// Dashboard widget lifecycle: subscribe to the snapshot channel, aggregate
// per-entity records on poll ticks, keep the sliding window current, and
// feed the external renderer. Recovery from a data error always goes
// through full backfill, never incremental resume, so the plotted series
// shows no gap.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::aggregate::{ConnectionTotals, StatAggregator};
use crate::config::AppConfig;
use crate::history::{self, HistoryError, HistorySource};
use crate::legend::{LegendController, LegendEntry};
use crate::models::{
    HistoryRequest, HistoryResponse, HistoryTransform, MEMORY_DETAIL_KEYS, SnapshotPayload,
    TopicStats,
};
use crate::pie::{PieScaler, PieSlice};
use crate::poll::PollSchedule;
use crate::series::{Sample, SeriesBuffer};
use crate::status::StatusChannel;

/// What a widget plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    /// Message rate derived from server-wide endpoint totals (line chart).
    ServerThroughput,
    /// Stacked memory sub-metric areas, appended per Memory snapshot.
    MemoryDetail,
    /// Published-message share per topic (pie), rebuilt every poll.
    TopicActivity,
}

/// One redraw request handed to the external renderer. The engine never
/// draws; it re-feeds the full buffer and flags when the value axis must be
/// recomputed from the visible data.
#[derive(Debug, Clone)]
pub enum ChartUpdate {
    Series {
        samples: Vec<Sample>,
        rescale_axis: bool,
        totals: Option<ConnectionTotals>,
        rate: Option<f64>,
    },
    Pie {
        slices: Vec<PieSlice>,
    },
}

/// Per-widget timing and chart options.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub dataset: Dataset,
    pub num_points: usize,
    pub refresh_interval_ms: u64,
    pub first_poll_delay: Duration,
    pub poll_interval: Duration,
    pub fixed_axis_max: Option<f64>,
    pub pie_skew_threshold: f64,
}

impl WidgetConfig {
    pub fn from_app(config: &AppConfig, dataset: Dataset) -> Self {
        WidgetConfig {
            dataset,
            num_points: config.dashboard.num_points,
            refresh_interval_ms: config.dashboard.refresh_interval_ms,
            first_poll_delay: Duration::from_millis(config.polling.first_poll_delay_ms),
            poll_interval: Duration::from_millis(config.polling.poll_interval_ms),
            fixed_axis_max: config.fixed_axis_max(),
            pie_skew_threshold: config.chart.pie_skew_threshold,
        }
    }
}

/// Collaborators handed to a widget at spawn. The transport, renderer, and
/// historical service are referenced, never owned.
pub struct WidgetDeps<H: HistorySource> {
    pub snapshots: broadcast::Sender<SnapshotPayload>,
    pub chart_tx: mpsc::Sender<ChartUpdate>,
    pub status: StatusChannel,
    pub history: Arc<H>,
}

#[derive(Debug)]
enum WidgetCommand {
    ToggleLegend { metric_key: String, included: bool },
    Dispose,
}

/// Host-side handle to a running widget. Dropping it without calling
/// `dispose` still shuts the update task down (the command channel closes).
pub struct WidgetHandle {
    commands: mpsc::Sender<WidgetCommand>,
    handle: JoinHandle<()>,
}

impl WidgetHandle {
    /// Applies a user legend toggle; the widget re-feeds the renderer so it
    /// can recompute its scale from the still-visible series.
    pub async fn toggle_legend(&self, metric_key: &str, included: bool) {
        let _ = self
            .commands
            .send(WidgetCommand::ToggleLegend {
                metric_key: metric_key.to_string(),
                included,
            })
            .await;
    }

    /// Disposes the widget: the poll schedule is cancelled, in-flight
    /// history responses are orphaned, and the update task exits.
    pub async fn dispose(self) {
        let _ = self.commands.send(WidgetCommand::Dispose).await;
        let _ = self.handle.await;
    }
}

/// Spawns the widget's update task. Returns a handle for toggles/disposal.
pub fn spawn<H: HistorySource>(deps: WidgetDeps<H>, config: WidgetConfig) -> WidgetHandle {
    let (command_tx, command_rx) = mpsc::channel(8);
    let handle = tokio::spawn(run(deps, config, command_rx));
    WidgetHandle {
        commands: command_tx,
        handle,
    }
}

/// The historical query this widget issues on first show and on error
/// recovery. Pie datasets carry no history.
pub fn history_request(config: &WidgetConfig) -> Option<HistoryRequest> {
    match config.dataset {
        Dataset::ServerThroughput => Some(HistoryRequest {
            metrics: vec!["Msgs".to_string()],
            num_points: config.num_points,
            transform: HistoryTransform::PerSecond,
        }),
        Dataset::MemoryDetail => Some(HistoryRequest {
            metrics: MEMORY_DETAIL_KEYS.iter().map(|k| k.to_string()).collect(),
            num_points: config.num_points,
            transform: HistoryTransform::Raw,
        }),
        Dataset::TopicActivity => None,
    }
}

fn initial_legend(dataset: Dataset) -> Vec<LegendEntry> {
    match dataset {
        Dataset::MemoryDetail => vec![
            LegendEntry::new(MEMORY_DETAIL_KEYS[0], "Message payloads"),
            LegendEntry::new(MEMORY_DETAIL_KEYS[1], "Publish / subscribe"),
            LegendEntry::new(MEMORY_DETAIL_KEYS[2], "Destinations"),
            LegendEntry::new(MEMORY_DETAIL_KEYS[3], "Current activity"),
            LegendEntry::new(MEMORY_DETAIL_KEYS[4], "Client states"),
        ],
        Dataset::ServerThroughput | Dataset::TopicActivity => Vec::new(),
    }
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_else(|e| {
            warn!(error = %e, "system time error");
            0
        })
}

fn spawn_history_fetch<H: HistorySource>(
    history: Arc<H>,
    request: HistoryRequest,
    generation: u64,
    tx: mpsc::Sender<(u64, anyhow::Result<HistoryResponse>)>,
) {
    tokio::spawn(async move {
        let result = history.fetch(request).await;
        let _ = tx.send((generation, result)).await;
    });
}

async fn send_update(chart_tx: &mpsc::Sender<ChartUpdate>, update: ChartUpdate) {
    if chart_tx.send(update).await.is_err() {
        debug!("chart feed closed");
    }
}

async fn run<H: HistorySource>(
    deps: WidgetDeps<H>,
    config: WidgetConfig,
    mut commands: mpsc::Receiver<WidgetCommand>,
) {
    let mut snapshot_rx = deps.snapshots.subscribe();
    let mut buffer = SeriesBuffer::new(config.num_points);
    let mut aggregator = StatAggregator::new();
    let mut topics: HashMap<String, TopicStats> = HashMap::new();
    let mut legend = LegendController::new(initial_legend(config.dataset), config.fixed_axis_max);
    let pie = PieScaler::new(config.pie_skew_threshold);
    let mut poll = PollSchedule::new(config.first_poll_delay, config.poll_interval);
    let mut poll_deadline: Option<Instant> = None;
    let mut suppressed = false;
    // Bumped per historical query; a response stamped with an older value
    // was superseded and must not touch the buffer.
    let mut generation: u64 = 0;

    let (history_tx, mut history_rx) = mpsc::channel::<(u64, anyhow::Result<HistoryResponse>)>(4);

    // First show: rebuild the buffer from history before live appends resume.
    if let Some(request) = history_request(&config) {
        generation += 1;
        spawn_history_fetch(
            deps.history.clone(),
            request,
            generation,
            history_tx.clone(),
        );
    }

    loop {
        let sleep_at =
            poll_deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
        tokio::select! {
            result = snapshot_rx.recv() => {
                match result {
                    Ok(SnapshotPayload::Error(e)) => {
                        if !suppressed {
                            suppressed = true;
                            deps.status.error("Monitoring data error", e.message.clone(), Some(e.code));
                        }
                    }
                    Ok(SnapshotPayload::Clear) => {
                        if suppressed {
                            suppressed = false;
                            deps.status.clear();
                            aggregator.reset();
                            topics.clear();
                            // Resynchronize via backfill rather than resuming
                            // appends, so the series shows no discontinuity.
                            if let Some(request) = history_request(&config) {
                                generation += 1;
                                spawn_history_fetch(
                                    deps.history.clone(),
                                    request,
                                    generation,
                                    history_tx.clone(),
                                );
                            }
                        }
                    }
                    Ok(payload) if suppressed => {
                        debug!(kind = payload.kind(), "live update suppressed pending clear");
                    }
                    Ok(SnapshotPayload::Endpoint(record))
                        if config.dataset == Dataset::ServerThroughput =>
                    {
                        aggregator.observe(record);
                        if let Some(delay) = poll.on_first_data() {
                            poll_deadline = Some(Instant::now() + delay);
                        }
                    }
                    Ok(SnapshotPayload::Memory(memory))
                        if config.dataset == Dataset::MemoryDetail =>
                    {
                        buffer.live_append(Sample::stacked(now_ms(), memory.detail_values()));
                        send_update(&deps.chart_tx, ChartUpdate::Series {
                            samples: buffer.iter().cloned().collect(),
                            rescale_axis: legend.should_rescale_axis(),
                            totals: None,
                            rate: None,
                        }).await;
                    }
                    Ok(SnapshotPayload::Topic(topic))
                        if config.dataset == Dataset::TopicActivity =>
                    {
                        topics.insert(topic.topic_string.clone(), topic);
                        if let Some(delay) = poll.on_first_data() {
                            poll_deadline = Some(Instant::now() + delay);
                        }
                    }
                    Ok(payload) => {
                        debug!(kind = payload.kind(), "snapshot not relevant to this widget");
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "widget lagged behind snapshot channel");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            Some((stamp, result)) = history_rx.recv() => {
                if stamp != generation {
                    debug!("stale history response discarded");
                } else {
                    match (result, history_request(&config)) {
                        (Ok(response), Some(request)) => {
                            match history::reconcile(
                                &response,
                                &request,
                                config.refresh_interval_ms as i64,
                                now_ms(),
                            ) {
                                Ok(samples) => {
                                    buffer.full_replace(samples);
                                    send_update(&deps.chart_tx, ChartUpdate::Series {
                                        samples: buffer.iter().cloned().collect(),
                                        rescale_axis: legend.should_rescale_axis(),
                                        totals: None,
                                        rate: None,
                                    }).await;
                                }
                                Err(e) => {
                                    let code = match &e {
                                        HistoryError::Query { code, .. } => Some(*code),
                                        _ => None,
                                    };
                                    deps.status.error(
                                        "Historical data unavailable",
                                        e.to_string(),
                                        code,
                                    );
                                }
                            }
                        }
                        (Ok(_), None) => {
                            debug!("history response for a dataset without history");
                        }
                        (Err(e), _) => {
                            deps.status.error("Historical data unavailable", e.to_string(), None);
                        }
                    }
                }
            }
            _ = tokio::time::sleep_until(sleep_at), if poll_deadline.is_some() => {
                poll_deadline = poll.on_poll_fired().map(|delay| Instant::now() + delay);
                if !suppressed {
                    match config.dataset {
                        Dataset::ServerThroughput => {
                            let now = now_ms();
                            let (totals, rate) = aggregator.aggregate(now);
                            buffer.live_append(Sample::scalar(now, rate));
                            send_update(&deps.chart_tx, ChartUpdate::Series {
                                samples: buffer.iter().cloned().collect(),
                                rescale_axis: legend.should_rescale_axis(),
                                totals: Some(totals),
                                rate: Some(rate),
                            }).await;
                        }
                        Dataset::TopicActivity => {
                            let slices = pie.scale(
                                topics
                                    .values()
                                    .map(|t| (t.topic_string.as_str(), t.published_msgs as f64)),
                            );
                            send_update(&deps.chart_tx, ChartUpdate::Pie { slices }).await;
                        }
                        // Push-driven; nothing to poll.
                        Dataset::MemoryDetail => {}
                    }
                }
            }
            cmd = commands.recv() => {
                match cmd {
                    Some(WidgetCommand::ToggleLegend { metric_key, included }) => {
                        if let Some(change) = legend.toggle(&metric_key, included) {
                            debug!(
                                metric = %change.metric_key,
                                included = change.included,
                                "legend toggled"
                            );
                            send_update(&deps.chart_tx, ChartUpdate::Series {
                                samples: buffer.iter().cloned().collect(),
                                rescale_axis: legend.should_rescale_axis(),
                                totals: None,
                                rate: None,
                            }).await;
                        }
                    }
                    Some(WidgetCommand::Dispose) | None => {
                        poll.cancel();
                        break;
                    }
                }
            }
        }
    }
    debug!("widget disposed");
}
