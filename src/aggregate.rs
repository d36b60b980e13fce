// Server-wide aggregation: every refresh pass rebuilds one totals record
// from the currently known per-endpoint records, then rolls the throughput
// window that feeds the display rate.

use std::collections::HashMap;

use crate::models::EndpointStats;
use crate::rate::ThroughputWindow;

/// Server-wide cumulative totals. Recreated from zero on every aggregation
/// pass, never mutated incrementally, so endpoints that disappear between
/// passes fall out of the sums naturally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionTotals {
    pub active_connections: u64,
    pub total_connections: u64,
    pub bad_connections: u64,
    pub msg_read: u64,
    pub msg_write: u64,
    pub bytes_read: u64,
    pub bytes_write: u64,
}

impl ConnectionTotals {
    pub fn msg_volume(&self) -> u64 {
        self.msg_read + self.msg_write
    }

    pub fn bytes_volume(&self) -> u64 {
        self.bytes_read + self.bytes_write
    }
}

/// Merges per-endpoint snapshot records into server-wide totals.
#[derive(Debug, Default)]
pub struct StatAggregator {
    endpoints: HashMap<String, EndpointStats>,
    window: ThroughputWindow,
    totals: ConnectionTotals,
}

impl StatAggregator {
    pub fn new() -> Self {
        StatAggregator::default()
    }

    /// Upserts the latest record for one endpoint.
    pub fn observe(&mut self, record: EndpointStats) {
        self.endpoints.insert(record.name.clone(), record);
    }

    pub fn remove(&mut self, name: &str) {
        self.endpoints.remove(name);
    }

    /// Drops all entity records and the throughput window. Used when a
    /// widget resynchronizes after an error.
    pub fn reset(&mut self) {
        self.endpoints.clear();
        self.window = ThroughputWindow::new();
        self.totals = ConnectionTotals::default();
    }

    pub fn entity_count(&self) -> usize {
        self.endpoints.len()
    }

    pub fn totals(&self) -> ConnectionTotals {
        self.totals
    }

    /// One refresh pass: zeroed accumulator, sum every known record into it,
    /// replace the previous totals, roll `MsgRead + MsgWrite` into the
    /// throughput window, and return the totals with the current rate.
    /// Zero known endpoints yields all-zero totals, which is valid output.
    pub fn aggregate(&mut self, now_ms: i64) -> (ConnectionTotals, f64) {
        let mut acc = ConnectionTotals::default();
        for record in self.endpoints.values() {
            acc.active_connections += record.active_connections;
            acc.total_connections += record.total_connections;
            acc.bad_connections += record.bad_connections;
            acc.msg_read += record.msg_read;
            acc.msg_write += record.msg_write;
            acc.bytes_read += record.bytes_read;
            acc.bytes_write += record.bytes_write;
        }
        self.totals = acc;
        self.window.push(acc.msg_volume() as f64, now_ms);
        (acc, self.window.rate())
    }
}
