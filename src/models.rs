// Wire models for the snapshot channel and the historical-query collaborator.
// Field names are PascalCase on the wire, matching the monitoring endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-endpoint cumulative counters, one record per configured endpoint.
/// Counters only grow within a server session; absent fields read as 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointStats {
    pub name: String,
    #[serde(default)]
    pub active_connections: u64,
    #[serde(default)]
    pub bad_connections: u64,
    #[serde(default)]
    pub total_connections: u64,
    #[serde(default)]
    pub msg_read: u64,
    #[serde(default)]
    pub msg_write: u64,
    #[serde(default)]
    pub bytes_read: u64,
    #[serde(default)]
    pub bytes_write: u64,
}

/// Server memory snapshot. The five group fields are the sub-metrics of the
/// stacked memory-detail widget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct MemoryStats {
    #[serde(default)]
    pub memory_total_bytes: u64,
    #[serde(default)]
    pub memory_free_bytes: u64,
    #[serde(default)]
    pub memory_free_percent: f64,
    #[serde(default)]
    pub server_virtual_memory_bytes: u64,
    #[serde(default)]
    pub server_resident_set_bytes: u64,
    #[serde(default)]
    pub message_payloads: u64,
    #[serde(default)]
    pub publish_subscribe: u64,
    #[serde(default)]
    pub destinations: u64,
    #[serde(default)]
    pub current_activity: u64,
    #[serde(default)]
    pub client_states: u64,
}

/// Sub-metric keys of the stacked memory-detail widget, in wire order.
pub const MEMORY_DETAIL_KEYS: [&str; 5] = [
    "MessagePayloads",
    "PublishSubscribe",
    "Destinations",
    "CurrentActivity",
    "ClientStates",
];

impl MemoryStats {
    /// The stacked-sample value map: one entry per sub-metric, always the
    /// full key set so buffers stay key-uniform.
    pub fn detail_values(&self) -> BTreeMap<String, f64> {
        let mut values = BTreeMap::new();
        values.insert(MEMORY_DETAIL_KEYS[0].to_string(), self.message_payloads as f64);
        values.insert(MEMORY_DETAIL_KEYS[1].to_string(), self.publish_subscribe as f64);
        values.insert(MEMORY_DETAIL_KEYS[2].to_string(), self.destinations as f64);
        values.insert(MEMORY_DETAIL_KEYS[3].to_string(), self.current_activity as f64);
        values.insert(MEMORY_DETAIL_KEYS[4].to_string(), self.client_states as f64);
        values
    }
}

/// Persistent-store usage snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct StoreStats {
    #[serde(default)]
    pub disk_used_percent: f64,
    #[serde(default)]
    pub disk_free_bytes: u64,
    #[serde(default)]
    pub memory_used_percent: f64,
    #[serde(default)]
    pub pool1_used_percent: f64,
    #[serde(default)]
    pub pool2_used_percent: f64,
}

/// Per-topic messaging counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct TopicStats {
    pub topic_string: String,
    #[serde(default)]
    pub subscriptions: u64,
    #[serde(default)]
    pub published_msgs: u64,
    #[serde(default)]
    pub rejected_msgs: u64,
    #[serde(default)]
    pub failed_publishes: u64,
}

/// Explicit data-error flag published on the snapshot channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct DataError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Envelope used by the transport collaborator: a source path naming the
/// record kind plus the record body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelMessage {
    pub path: String,
    #[serde(default)]
    pub body: serde_json::Value,
}

/// One snapshot payload, tagged by the source path it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotPayload {
    Endpoint(EndpointStats),
    Store(StoreStats),
    Memory(MemoryStats),
    Topic(TopicStats),
    /// Live processing must be suppressed until a clear is observed.
    Error(DataError),
    /// Prior error condition resolved; widgets resynchronize via backfill.
    Clear,
}

impl SnapshotPayload {
    /// Resolves a source path and body into a typed payload. Paths that do
    /// not name one of the known record kinds, and bodies that do not match
    /// the kind's schema, yield `None` (filtered, not an error).
    pub fn parse(path: &str, body: serde_json::Value) -> Option<SnapshotPayload> {
        let kind = path.rsplit('/').next()?;
        match kind {
            "Endpoint" => serde_json::from_value(body)
                .ok()
                .map(SnapshotPayload::Endpoint),
            "Store" => serde_json::from_value(body).ok().map(SnapshotPayload::Store),
            "Memory" => serde_json::from_value(body)
                .ok()
                .map(SnapshotPayload::Memory),
            "Topic" => serde_json::from_value(body).ok().map(SnapshotPayload::Topic),
            "Error" => serde_json::from_value(body).ok().map(SnapshotPayload::Error),
            "Clear" => Some(SnapshotPayload::Clear),
            _ => None,
        }
    }

    pub fn from_message(message: ChannelMessage) -> Option<SnapshotPayload> {
        Self::parse(&message.path, message.body)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SnapshotPayload::Endpoint(_) => "Endpoint",
            SnapshotPayload::Store(_) => "Store",
            SnapshotPayload::Memory(_) => "Memory",
            SnapshotPayload::Topic(_) => "Topic",
            SnapshotPayload::Error(_) => "Error",
            SnapshotPayload::Clear => "Clear",
        }
    }
}

/// Transform applied to a historical series before it is plotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryTransform {
    /// Plot the stored values as-is (gauges, percentages).
    Raw,
    /// Difference adjacent cumulative-counter samples into per-second rates.
    PerSecond,
}

/// Request to the historical-query collaborator. A single metric yields a
/// flat response; several yield the stacked form.
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub metrics: Vec<String>,
    pub num_points: usize,
    pub transform: HistoryTransform,
}

/// Historical-query response: one value array per requested metric, oldest
/// first, plus the anchor timestamp of the newest sample. `rc != 0` or an
/// `error` body means the query failed and the series must be ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryResponse {
    #[serde(default, rename = "RC")]
    pub rc: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Millisecond epoch of the newest sample; "now" when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_timestamp: Option<i64>,
    /// Seconds between stored samples as reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(flatten)]
    pub series: BTreeMap<String, Vec<f64>>,
}
