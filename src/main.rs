use collector::{
    Collector, Config, LogMessage, Sink,
    config::SinkConfig,
    sink::{FileSink, LogSink},
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Sink selected by the `[sink]` section of the configuration.
enum ConfiguredSink {
    Log(LogSink),
    File(FileSink),
}

impl ConfiguredSink {
    fn from_config(config: &SinkConfig) -> anyhow::Result<Self> {
        Ok(match config {
            SinkConfig::Log => ConfiguredSink::Log(LogSink::new()),
            SinkConfig::File { path } => ConfiguredSink::File(FileSink::open(path)?),
        })
    }
}

impl Sink<LogMessage> for ConfiguredSink {
    fn receive(&mut self, batch: Vec<LogMessage>) {
        match self {
            ConfiguredSink::Log(sink) => sink.receive(batch),
            ConfiguredSink::File(sink) => sink.receive(batch),
        }
    }
}

/// Forwards `reader` to the collector, one message per line, until EOF or
/// until the collector stops accepting input.
///
/// Lines are decoded lossily: invalid UTF-8 is replaced rather than ending
/// the input.
async fn forward_lines<R>(mut reader: R, tx: mpsc::Sender<LogMessage>) -> anyhow::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut forwarded = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        let line = String::from_utf8_lossy(&buf).into_owned();
        if tx.send(LogMessage::new(line)).await.is_err() {
            break;
        }
        forwarded += 1;
    }
    Ok(forwarded)
}

/// The main entry point for the collector binary.
///
/// Loads the configuration (path from the first argument, defaulting to
/// `config/default.toml`), batches lines read from stdin and flushes them to
/// the configured sink. EOF on stdin or ctrl-c triggers the final flush.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/default.toml".to_string());
    let config = Config::load(&path)?;
    info!("Collector starting with config: {:?}", config);

    let sink = ConfiguredSink::from_config(&config.sink)?;
    let (tx, rx) = mpsc::channel(config.collector.channel_capacity);
    let handle = Collector::new(config.collector.options(sink))?.subscribe(rx);

    let shutdown = handle.cancellation_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, flushing and shutting down");
                shutdown.cancel();
            }
            Err(e) => warn!("Unable to listen for ctrl-c: {:?}", e),
        }
    });

    let reader = tokio::spawn(forward_lines(BufReader::new(tokio::io::stdin()), tx));

    let stats = handle.join().await?;
    info!(
        "Collector finished: {} messages in {} batches",
        stats.messages, stats.flushes
    );

    if !reader.is_finished() {
        // A pending stdin read sits on a blocking thread that runtime shutdown
        // would wait for.
        std::process::exit(0);
    }
    reader.await??;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_input() {
        let input: &[u8] = b"first\r\nbad \xff\xfe bytes\nlast";
        let (tx, mut rx) = mpsc::channel(8);

        let forwarded = forward_lines(input, tx).await.unwrap();
        assert_eq!(forwarded, 3);

        let mut lines = Vec::new();
        while let Some(msg) = rx.recv().await {
            lines.push(msg.line);
        }
        assert_eq!(lines[0], "first");
        assert_eq!(lines[1], "bad \u{FFFD}\u{FFFD} bytes");
        assert_eq!(lines[2], "last");
    }

    #[tokio::test]
    async fn test_stops_when_collector_is_gone() {
        let input: &[u8] = b"a\nb\n";
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        assert_eq!(forward_lines(input, tx).await.unwrap(), 0);
    }
}
