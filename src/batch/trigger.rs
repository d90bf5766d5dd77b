//! Flush Trigger Module
//!
//! Decides *when* a batch is sealed and handed to the sink:
//! - Size triggers fire from the processing loop right after an append
//! - Time triggers come from a [`TickSource`]
//! - Final triggers fire when the input stream closes or the collector is
//!   cancelled

use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Reason a flush was performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// The buffer reached the configured batch size.
    Size,
    /// The tick source fired.
    Tick,
    /// The message stream was closed.
    Closed,
    /// The collector was cancelled through its handle.
    Cancelled,
}

impl FlushTrigger {
    /// Whether this flush ends the processing loop.
    pub fn is_final(self) -> bool {
        matches!(self, FlushTrigger::Closed | FlushTrigger::Cancelled)
    }
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlushTrigger::Size => "size",
            FlushTrigger::Tick => "tick",
            FlushTrigger::Closed => "closed",
            FlushTrigger::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Source of time-based flushes.
///
/// Every tick forces a flush regardless of how many messages are buffered.
pub enum TickSource {
    /// Periodic timer with the given period. The timer is armed when the
    /// processing loop starts; the first tick arrives one full period later.
    /// A period too long to be represented as a deadline never ticks.
    Interval(Duration),
    /// Externally driven ticks, one flush per received instant.
    Channel(mpsc::Receiver<Instant>),
}

impl fmt::Debug for TickSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickSource::Interval(period) => f.debug_tuple("Interval").field(period).finish(),
            TickSource::Channel(_) => f.write_str("Channel"),
        }
    }
}

impl TickSource {
    pub(crate) fn start(self) -> Ticker {
        match self {
            TickSource::Interval(period) => match Instant::now().checked_add(period) {
                Some(first) => {
                    let mut timer = interval_at(first, period);
                    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    Ticker::Interval(timer)
                }
                None => {
                    tracing::debug!(?period, "flush interval out of range, time-based flushes disabled");
                    Ticker::Never
                }
            },
            TickSource::Channel(rx) => Ticker::Channel(Some(rx)),
        }
    }
}

/// A running tick source, owned by the processing loop.
pub(crate) enum Ticker {
    Interval(Interval),
    // None once the sender side has gone away.
    Channel(Option<mpsc::Receiver<Instant>>),
    Never,
}

impl Ticker {
    /// Waits for the next tick.
    ///
    /// A closed tick channel never fires again; the loop keeps running on
    /// size and stream-closure triggers alone.
    pub(crate) async fn tick(&mut self) -> Instant {
        match self {
            Ticker::Interval(timer) => timer.tick().await,
            Ticker::Channel(slot) => {
                if let Some(rx) = slot.as_mut() {
                    if let Some(at) = rx.recv().await {
                        return at;
                    }
                }
                if slot.take().is_some() {
                    tracing::debug!("tick channel closed, time-based flushes disabled");
                }
                std::future::pending().await
            }
            Ticker::Never => std::future::pending().await,
        }
    }
}
