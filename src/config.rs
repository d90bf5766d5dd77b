//! Configuration Module
//!
//! This module defines all configuration structures for the collector.
//! Configuration is loaded from TOML files and parsed using serde.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
///
/// Loaded from a TOML file (e.g., config/default.toml).
///
/// # Example TOML
/// ```toml
/// [collector]
/// batch_size = 100
/// flush_interval_ms = 5000
///
/// [sink]
/// kind = "file"
/// path = "collected.jsonl"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub collector: CollectorConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Batching configuration
///
/// Controls when batches are flushed to the sink.
///
/// # Fields
/// - `batch_size`: Number of buffered messages that forces a flush
/// - `flush_interval_ms`: Period of the time-based flush (in milliseconds)
/// - `skip_empty_flushes`: Suppress tick flushes when nothing is buffered
/// - `channel_capacity`: Capacity of the input channel feeding the collector
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    pub batch_size: usize,
    pub flush_interval_ms: u64,
    #[serde(default)]
    pub skip_empty_flushes: bool,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    1024
}

/// Sink selection
///
/// - `kind = "log"`: report batch sizes only (default)
/// - `kind = "file"`: append messages as JSON lines to `path`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    #[default]
    Log,
    File { path: PathBuf },
}

/// Options accepted by [`Collector::new`](crate::batch::Collector::new).
///
/// `sink` is optional here so that a missing sink is reported as a
/// configuration error rather than being impossible to express.
#[derive(Debug, Clone)]
pub struct CollectorOptions<S> {
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub sink: Option<S>,
    pub skip_empty_flushes: bool,
}

impl<S> CollectorOptions<S> {
    pub fn new(batch_size: usize, flush_interval: Duration) -> Self {
        Self {
            batch_size,
            flush_interval,
            sink: None,
            skip_empty_flushes: false,
        }
    }

    pub fn sink(mut self, sink: S) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn skip_empty_flushes(mut self, skip: bool) -> Self {
        self.skip_empty_flushes = skip;
        self
    }
}

impl CollectorConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// Builds collector options from this section, attaching `sink`.
    pub fn options<S>(&self, sink: S) -> CollectorOptions<S> {
        CollectorOptions::new(self.batch_size, self.flush_interval())
            .sink(sink)
            .skip_empty_flushes(self.skip_empty_flushes)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    /// * `Ok(Config)` if the file was successfully loaded and parsed
    /// * `Err` if the file couldn't be read or the TOML is invalid
    ///
    /// # Example
    /// ```no_run
    /// # use collector::Config;
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading config file {}", path))?;
        Self::parse(&content).with_context(|| format!("parsing config file {}", path))
    }

    /// Parse configuration from TOML text.
    ///
    /// Fails if `channel_capacity` is zero, since no input channel can be
    /// built with it.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        anyhow::ensure!(
            config.collector.channel_capacity > 0,
            "collector.channel_capacity must be positive"
        );
        Ok(config)
    }
}
