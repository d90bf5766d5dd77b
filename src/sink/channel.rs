use super::Sink;
use tokio::sync::mpsc;
use tracing::warn;

/// Sink that forwards each batch to another task.
///
/// The channel is unbounded so a slow consumer never stalls the collector's
/// processing loop. Batches sent after the receiver is gone are dropped.
#[derive(Debug)]
pub struct ChannelSink<M> {
    tx: mpsc::UnboundedSender<Vec<M>>,
}

impl<M> ChannelSink<M> {
    /// Creates a sink together with the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<M>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn from_sender(tx: mpsc::UnboundedSender<Vec<M>>) -> Self {
        Self { tx }
    }
}

impl<M> Sink<M> for ChannelSink<M>
where
    M: Send + 'static,
{
    fn receive(&mut self, batch: Vec<M>) {
        if let Err(mpsc::error::SendError(batch)) = self.tx.send(batch) {
            warn!(size = batch.len(), "batch receiver dropped, discarding batch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forwards_batches_in_order() {
        let (mut sink, mut rx) = ChannelSink::new();
        sink.receive(vec!["a", "b"]);
        sink.receive(vec!["c"]);

        assert_eq!(rx.recv().await, Some(vec!["a", "b"]));
        assert_eq!(rx.recv().await, Some(vec!["c"]));
    }

    #[test]
    fn test_dropped_receiver_discards_batch() {
        let (mut sink, rx) = ChannelSink::<u8>::new();
        drop(rx);
        sink.receive(vec![1, 2, 3]);
    }
}
