//! Batching Engine Module
//!
//! This module implements the collector: a single background task that owns
//! the message buffer and decides when to hand it to the sink.
//!
//! # Flush Triggers
//! 1. **Size**: the buffer reaches `batch_size` right after an append
//! 2. **Tick**: the tick source fires (the buffer may be empty)
//! 3. **Closed**: every sender of the message stream has been dropped
//! 4. **Cancelled**: the handle was shut down; queued messages are drained
//!    before the final flush
//!
//! The buffer is only ever touched from the processing task, so flushing and
//! appending can never interleave and no lock is involved.

use crate::{
    batch::trigger::{FlushTrigger, TickSource, Ticker},
    config::CollectorOptions,
    error::CollectorError,
    sink::Sink,
    types::CollectorStats,
};
use std::marker::PhantomData;
use std::mem;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Log collector
///
/// Batches a stream of messages and periodically flushes them to a [`Sink`].
/// A collector is built once, optionally given a custom tick source, and then
/// started with [`Collector::subscribe`]. It cannot be restarted.
pub struct Collector<M, S> {
    /// Buffered messages that forces a flush
    batch_size: usize,
    /// Suppress flushes of an empty buffer
    skip_empty_flushes: bool,
    /// Downstream target for completed batches
    sink: S,
    /// Source of time-based flushes (interval by default)
    ticks: TickSource,
    /// Cancels the processing loop once started
    cancel: CancellationToken,
    _message: PhantomData<fn(M)>,
}

impl<M, S> Collector<M, S>
where
    M: Send + 'static,
    S: Sink<M>,
{
    /// Creates a new collector
    ///
    /// # Arguments
    /// * `opts` - Batch size, flush interval and the sink to flush into
    ///
    /// # Returns
    /// * `Ok(Collector)` with an empty buffer and an interval tick source
    /// * `Err(CollectorError::Configuration)` if no sink was given, the batch
    ///   size is zero or the flush interval is zero
    pub fn new(opts: CollectorOptions<S>) -> Result<Self, CollectorError> {
        let sink = opts
            .sink
            .ok_or_else(|| CollectorError::configuration("sink not provided"))?;

        if opts.batch_size == 0 {
            return Err(CollectorError::configuration("batch size must be positive"));
        }
        if opts.flush_interval.is_zero() {
            return Err(CollectorError::configuration("flush interval must be positive"));
        }

        Ok(Self {
            batch_size: opts.batch_size,
            skip_empty_flushes: opts.skip_empty_flushes,
            sink,
            ticks: TickSource::Interval(opts.flush_interval),
            cancel: CancellationToken::new(),
            _message: PhantomData,
        })
    }

    /// Replaces the interval tick source with externally driven ticks.
    ///
    /// Each instant received on `ticks` forces one flush. Used to control
    /// flush timing from an external clock, e.g. in tests.
    pub fn with_ticker(mut self, ticks: mpsc::Receiver<Instant>) -> Self {
        self.ticks = TickSource::Channel(ticks);
        self
    }

    /// Ties the collector to an existing cancellation token.
    ///
    /// Cancelling `token` (or any of its parents) shuts the collector down the
    /// same way [`CollectorHandle::shutdown`] does.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Starts batching messages from `messages`.
    ///
    /// Spawns the collector's processing task on the current Tokio runtime and
    /// returns a handle to it. The task runs until every sender of `messages`
    /// is dropped or the collector is cancelled, then performs a final flush.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    pub fn subscribe(self, messages: mpsc::Receiver<M>) -> CollectorHandle {
        let Collector {
            batch_size,
            skip_empty_flushes,
            sink,
            ticks,
            cancel,
            ..
        } = self;

        info!(batch_size, skip_empty_flushes, ticks = ?ticks, "collector starting");

        let batcher = Batcher {
            batch_size,
            skip_empty_flushes,
            sink,
            messages: Vec::new(),
            stats: CollectorStats::default(),
        };
        let task = tokio::spawn(batcher.run(messages, ticks, cancel.clone()));

        CollectorHandle { cancel, task }
    }
}

/// Handle to a running collector.
///
/// Dropping the handle detaches the collector: it keeps running until its
/// message stream is closed.
#[derive(Debug)]
pub struct CollectorHandle {
    cancel: CancellationToken,
    task: JoinHandle<CollectorStats>,
}

impl CollectorHandle {
    /// Token that stops the collector when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Asks the collector to stop without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the processing task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the collector to stop on its own, i.e. after its message
    /// stream is closed and the final flush is done.
    pub async fn join(self) -> Result<CollectorStats, CollectorError> {
        Ok(self.task.await?)
    }

    /// Cancels the collector and waits for its final flush.
    ///
    /// Messages already queued in the input channel are still flushed; new
    /// sends fail once shutdown has begun.
    pub async fn shutdown(self) -> Result<CollectorStats, CollectorError> {
        self.cancel.cancel();
        self.join().await
    }
}

/// State owned by the processing task.
struct Batcher<M, S> {
    batch_size: usize,
    skip_empty_flushes: bool,
    sink: S,
    messages: Vec<M>,
    stats: CollectorStats,
}

impl<M, S> Batcher<M, S>
where
    M: Send + 'static,
    S: Sink<M>,
{
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<M>,
        ticks: TickSource,
        cancel: CancellationToken,
    ) -> CollectorStats {
        let mut ticker: Ticker = ticks.start();

        loop {
            // Queued messages win over a pending tick so that a tick flush
            // includes everything that arrived before it.
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    rx.close();
                    while let Some(msg) = rx.recv().await {
                        self.append(msg);
                    }
                    self.flush(FlushTrigger::Cancelled);
                    break;
                }

                msg = rx.recv() => match msg {
                    Some(msg) => self.append(msg),
                    None => {
                        self.flush(FlushTrigger::Closed);
                        break;
                    }
                },

                _ = ticker.tick() => self.flush(FlushTrigger::Tick),
            }
        }

        info!(stats = ?self.stats, "collector stopped");
        self.stats
    }

    fn append(&mut self, msg: M) {
        self.messages.push(msg);
        self.stats.messages += 1;

        if self.messages.len() >= self.batch_size {
            self.flush(FlushTrigger::Size);
        }
    }

    fn flush(&mut self, trigger: FlushTrigger) {
        if self.messages.is_empty() && self.skip_empty_flushes {
            self.stats.skipped_empty += 1;
            return;
        }

        let batch = mem::take(&mut self.messages);
        let size = batch.len();
        debug!(%trigger, size, "flushing batch");

        self.sink.receive(batch);

        self.stats.flushes += 1;
        self.stats.flushed_messages += size as u64;
        if trigger.is_final() {
            self.stats.final_flushes += 1;
        } else if trigger == FlushTrigger::Size {
            self.stats.size_flushes += 1;
        } else {
            self.stats.tick_flushes += 1;
        }
    }
}
