//! Batching Module
//!
//! This module turns a stream of messages into batches:
//! - Collector: owns the buffer and the processing loop
//! - Trigger: tick sources and the reasons a batch is flushed

mod engine;
pub mod trigger;


pub use engine::{Collector, CollectorHandle};
pub use trigger::{FlushTrigger, TickSource};
