//! This crate batches a stream of log messages and hands the batches to a
//! downstream sink, flushing on batch size, on a periodic tick, and when the
//! input stream ends.

pub mod types; // Log message and collector statistics.
pub mod error; // Error type shared by construction and supervision.
pub mod config; // TOML configuration and collector options.
pub mod batch; // The collector and its flush triggers.
pub mod sink; // Sink trait and the built-in sinks.

// Re-export commonly used types for easier access.
pub use types::*;
pub use config::{CollectorOptions, Config};
pub use error::CollectorError;
pub use batch::{Collector, CollectorHandle, FlushTrigger};
pub use sink::Sink;
