use super::Sink;
use std::sync::{Arc, Mutex, MutexGuard};

/// Sink that keeps every received batch in memory.
///
/// Clones share the same storage, so one clone can be handed to a collector
/// while another is used to inspect what was flushed.
#[derive(Debug)]
pub struct MemorySink<M> {
    batches: Arc<Mutex<Vec<Vec<M>>>>,
}

impl<M> Clone for MemorySink<M> {
    fn clone(&self) -> Self {
        Self {
            batches: self.batches.clone(),
        }
    }
}

impl<M> Default for MemorySink<M> {
    fn default() -> Self {
        Self {
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<M> MemorySink<M> {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-pushed batch behind,
    // so a poisoned lock is still safe to read.
    fn lock(&self) -> MutexGuard<'_, Vec<Vec<M>>> {
        self.batches.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of batches received so far, empty ones included.
    pub fn batch_count(&self) -> usize {
        self.lock().len()
    }

    /// Sizes of the received batches, in flush order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.lock().iter().map(Vec::len).collect()
    }

    /// Total number of messages received across all batches.
    pub fn len(&self) -> usize {
        self.lock().iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M: Clone> MemorySink<M> {
    /// Copies of the received batches, in flush order.
    pub fn batches(&self) -> Vec<Vec<M>> {
        self.lock().clone()
    }

    /// All received messages flattened in arrival order.
    pub fn messages(&self) -> Vec<M> {
        self.lock().iter().flatten().cloned().collect()
    }
}

impl<M> Sink<M> for MemorySink<M>
where
    M: Send + 'static,
{
    fn receive(&mut self, batch: Vec<M>) {
        self.lock().push(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_storage() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();

        writer.receive(vec![1, 2]);
        writer.receive(vec![]);
        writer.receive(vec![3]);

        assert_eq!(sink.batch_count(), 3);
        assert_eq!(sink.batch_sizes(), vec![2, 0, 1]);
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.messages(), vec![1, 2, 3]);
    }
}
