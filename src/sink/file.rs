use super::Sink;
use anyhow::Context;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Sink that appends every message to a file, one JSON document per line.
///
/// A batch is encoded in memory and written with a single call, so a message
/// that fails to serialize never leaves half a line in the file. Such
/// messages are skipped. Write failures are logged and the batch is dropped;
/// nothing is retried.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening sink file {}", path.display()))?;

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode_batch<M: Serialize>(&self, batch: &[M]) -> Vec<u8> {
        let mut buf = Vec::new();
        for msg in batch {
            let start = buf.len();
            match serde_json::to_writer(&mut buf, msg) {
                Ok(()) => buf.push(b'\n'),
                Err(e) => {
                    buf.truncate(start);
                    warn!(path = %self.path.display(), "skipping unserializable message: {}", e);
                }
            }
        }
        buf
    }

    fn write_batch<M: Serialize>(&mut self, batch: &[M]) -> anyhow::Result<()> {
        let buf = self.encode_batch(batch);
        self.file.write_all(&buf)?;
        self.file.flush()?;
        Ok(())
    }
}

impl<M> Sink<M> for FileSink
where
    M: Serialize + Send + 'static,
{
    fn receive(&mut self, batch: Vec<M>) {
        match self.write_batch(&batch) {
            Ok(()) => debug!(path = %self.path.display(), size = batch.len(), "batch written"),
            Err(e) => error!(path = %self.path.display(), size = batch.len(), "failed to write batch: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogMessage;

    #[test]
    fn test_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let mut sink = FileSink::open(&path).unwrap();
        sink.receive(vec![LogMessage::new("one"), LogMessage::new("two")]);
        sink.receive(Vec::<LogMessage>::new());
        sink.receive(vec![LogMessage::new("three")]);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<LogMessage> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].line, "one");
        assert_eq!(lines[2].line, "three");
    }

    struct Entry {
        line: &'static str,
        broken: bool,
    }

    impl Serialize for Entry {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            use serde::ser::{Error, SerializeStruct};

            let mut state = serializer.serialize_struct("Entry", 2)?;
            state.serialize_field("line", self.line)?;
            if self.broken {
                return Err(S::Error::custom("broken entry"));
            }
            state.serialize_field("ok", &true)?;
            state.end()
        }
    }

    #[test]
    fn test_unserializable_message_leaves_no_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let entry = |line, broken| Entry { line, broken };

        let mut sink = FileSink::open(&path).unwrap();
        sink.receive(vec![entry("a", false), entry("b", true), entry("c", false)]);
        sink.receive(vec![entry("d", false)]);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        let written: Vec<&str> = lines.iter().map(|v| v["line"].as_str().unwrap()).collect();
        assert_eq!(written, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_reopening_keeps_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        FileSink::open(&path).unwrap().receive(vec![LogMessage::new("first")]);
        FileSink::open(&path).unwrap().receive(vec![LogMessage::new("second")]);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSink::open(dir.path().join("missing/out.jsonl")).unwrap_err();
        assert!(err.to_string().contains("opening sink file"));
    }
}
