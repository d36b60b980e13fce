use anyhow::Result;
use msgmon::*;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let (snapshot_tx, _) = broadcast::channel::<models::SnapshotPayload>(
        app_config.dashboard.broadcast_capacity,
    );
    let status = status::StatusChannel::new(16);
    let (chart_tx, mut chart_rx) = mpsc::channel::<widget::ChartUpdate>(32);

    let mut status_rx = status.subscribe();
    tokio::spawn(async move {
        loop {
            match status_rx.recv().await {
                Ok(status::StatusEvent::Message(m)) => {
                    tracing::warn!(
                        code = m.code,
                        title = %m.title,
                        "{}",
                        m.message
                    );
                }
                Ok(status::StatusEvent::Clear) => tracing::info!("status cleared"),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::spawn(async move {
        while let Some(update) = chart_rx.recv().await {
            match update {
                widget::ChartUpdate::Series {
                    samples,
                    rescale_axis,
                    totals: Some(totals),
                    rate: Some(rate),
                } => {
                    tracing::info!(
                        points = samples.len(),
                        rescale_axis,
                        rate = %units::format_message_count(rate),
                        active_connections =
                            %units::add_thousands_separators(totals.active_connections),
                        total_connections =
                            %units::add_thousands_separators(totals.total_connections),
                        bytes = %units::format_bytes(totals.bytes_volume() as f64),
                        "chart update"
                    );
                }
                widget::ChartUpdate::Series {
                    samples,
                    rescale_axis,
                    ..
                } => {
                    tracing::info!(points = samples.len(), rescale_axis, "chart update");
                }
                widget::ChartUpdate::Pie { slices } => {
                    tracing::info!(slices = slices.len(), "pie update");
                }
            }
        }
    });

    let handle = widget::spawn(
        widget::WidgetDeps {
            snapshots: snapshot_tx.clone(),
            chart_tx,
            status: status.clone(),
            history: Arc::new(history::NullHistory),
        },
        widget::WidgetConfig::from_app(&app_config, widget::Dataset::ServerThroughput),
    );

    tracing::info!("reading snapshot payloads from stdin, one {{path, body}} JSON object per line");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<models::ChannelMessage>(&line) {
                            Ok(message) => match models::SnapshotPayload::from_message(message) {
                                Some(payload) => {
                                    let _ = snapshot_tx.send(payload);
                                }
                                None => tracing::debug!("unrecognized snapshot dropped"),
                            },
                            Err(e) => tracing::debug!(error = %e, "malformed feed line dropped"),
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    // Let a pending poll fire so the last batch of records is aggregated.
    tokio::time::sleep(std::time::Duration::from_millis(
        app_config.polling.first_poll_delay_ms + app_config.polling.poll_interval_ms,
    ))
    .await;
    handle.dispose().await;

    Ok(())
}
