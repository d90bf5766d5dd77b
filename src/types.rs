use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single log line picked up from a broker or input stream.
///
/// The collector itself is generic over the message type and never looks
/// inside; this is the concrete message used by the `collector` binary and
/// the file sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub received_at: DateTime<Utc>,
    pub line: String,
}

impl LogMessage {
    /// Wraps a raw line, stamping it with the current time.
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            received_at: Utc::now(),
            line: line.into(),
        }
    }
}

/// Counters reported by a collector once its processing loop has ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectorStats {
    /// Messages appended to the buffer.
    pub messages: u64,
    /// Batches handed to the sink, including empty ones.
    pub flushes: u64,
    /// Messages handed to the sink across all flushes.
    pub flushed_messages: u64,
    pub size_flushes: u64,
    pub tick_flushes: u64,
    /// Flushes performed on stream closure or cancellation.
    pub final_flushes: u64,
    /// Empty flushes suppressed by `skip_empty_flushes`.
    pub skipped_empty: u64,
}

impl CollectorStats {
    /// Messages received but never handed to the sink.
    ///
    /// Zero for any collector whose loop terminated normally.
    pub fn pending(&self) -> u64 {
        self.messages - self.flushed_messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_message_serializes_as_json_line() {
        let msg = LogMessage::new("GET /health 200");
        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains("\"line\":\"GET /health 200\""));
        assert!(json.contains("received_at"));
        assert!(!json.contains('\n'));

        let back: LogMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_stats_pending() {
        let stats = CollectorStats {
            messages: 29,
            flushed_messages: 20,
            ..Default::default()
        };
        assert_eq!(stats.pending(), 9);
    }
}
