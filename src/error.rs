//! Error types for the collector.

use thiserror::Error;

/// Errors surfaced by the collector.
///
/// Only construction and task supervision can fail. Once the processing loop
/// is running it never produces an error of its own; sink failures stay inside
/// the sink.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The collector was configured with invalid options and never started.
    #[error("creating collector: {0}")]
    Configuration(String),

    /// The processing loop task panicked or was aborted.
    #[error("collector task failed")]
    Task(#[from] tokio::task::JoinError),
}

impl CollectorError {
    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        CollectorError::Configuration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = CollectorError::configuration("sink not provided");
        assert_eq!(err.to_string(), "creating collector: sink not provided");
    }

    #[tokio::test]
    async fn test_task_error_wraps_join_error() {
        let handle: tokio::task::JoinHandle<()> = tokio::spawn(async { panic!("boom") });
        let join_err = handle.await.unwrap_err();

        let err = CollectorError::from(join_err);
        assert!(matches!(err, CollectorError::Task(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
