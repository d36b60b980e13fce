// Page-level status channel: the one process-wide shared resource.
// Append-only broadcast of errors/warnings plus an explicit clear signal.

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    Message(StatusMessage),
    /// A prior error condition resolved; listeners may dismiss banners.
    Clear,
}

/// Broadcast handle shared by all widgets. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct StatusChannel {
    tx: broadcast::Sender<StatusEvent>,
}

impl StatusChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        StatusChannel { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, message: StatusMessage) {
        if self.tx.send(StatusEvent::Message(message)).is_err() {
            tracing::debug!("status channel has no listeners");
        }
    }

    pub fn error(&self, title: &str, message: impl Into<String>, code: Option<i32>) {
        self.publish(StatusMessage {
            severity: Severity::Error,
            title: title.to_string(),
            message: message.into(),
            code,
        });
    }

    pub fn clear(&self) {
        if self.tx.send(StatusEvent::Clear).is_err() {
            tracing::debug!("status channel has no listeners");
        }
    }
}
