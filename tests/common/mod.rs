// Shared test helpers

use msgmon::models::*;

pub fn endpoint_record(name: &str, msg_read: u64, msg_write: u64) -> EndpointStats {
    EndpointStats {
        name: name.to_string(),
        active_connections: 10,
        bad_connections: 1,
        total_connections: 25,
        msg_read,
        msg_write,
        bytes_read: msg_read * 100,
        bytes_write: msg_write * 100,
    }
}

pub fn history_response(series: &[(&str, &[f64])], anchor_ms: i64) -> HistoryResponse {
    let mut response = HistoryResponse {
        last_update_timestamp: Some(anchor_ms),
        ..HistoryResponse::default()
    };
    for (metric, values) in series {
        response
            .series
            .insert(metric.to_string(), values.to_vec());
    }
    response
}
