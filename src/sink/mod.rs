//! Sink Module
//!
//! Downstream targets that receive completed batches from the collector:
//! - `LogSink`: reports batch sizes through `tracing` and discards messages
//! - `MemorySink`: keeps every batch in memory, shared between clones
//! - `ChannelSink`: forwards batches to another task over a channel
//! - `FileSink`: appends messages to a file as JSON lines
//!
//! Any `FnMut(Vec<M>)` closure is a sink as well.

mod channel;
mod file;
mod log;
mod memory;

pub use channel::ChannelSink;
pub use file::FileSink;
pub use log::LogSink;
pub use memory::MemorySink;

/// A downstream target for batches.
///
/// The collector calls `receive` from its single processing task, one batch at
/// a time and never concurrently. Ownership of the messages moves to the sink.
/// Whatever the sink does with a failure (log, drop, retry) is its own
/// business; nothing is reported back to the collector.
pub trait Sink<M>: Send + 'static {
    fn receive(&mut self, batch: Vec<M>);
}

impl<M, F> Sink<M> for F
where
    F: FnMut(Vec<M>) + Send + 'static,
{
    fn receive(&mut self, batch: Vec<M>) {
        self(batch)
    }
}
