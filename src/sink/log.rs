use super::Sink;
use tracing::info;

/// Sink that only reports what it receives.
///
/// Useful as a default when no storage backend is configured.
#[derive(Debug, Default)]
pub struct LogSink {
    batches: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M> Sink<M> for LogSink
where
    M: Send + 'static,
{
    fn receive(&mut self, batch: Vec<M>) {
        self.batches += 1;
        info!(batch = self.batches, size = batch.len(), "batch received");
    }
}
