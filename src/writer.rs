use crate::adapter::FieldKeys;
use crate::client::BatchClient;
use crate::record::LogRecord;
use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;

/// `io::Write` front-end of a [`BatchClient`].
///
/// In structured mode every `write` call is treated as one JSON log line
/// and parsed with the configured [`FieldKeys`]; lines that fail to parse
/// are rejected with [`io::ErrorKind::InvalidData`] and never reach the
/// buffer.
///
/// In plain mode bytes are collected until a newline, and each complete
/// line becomes one record, however many `write` calls it took. A trailing
/// partial line is emitted on `flush` or when the writer is dropped.
pub struct RecordWriter {
    client: BatchClient,
    keys: Option<FieldKeys>,
    pending: Vec<u8>,
}

impl RecordWriter {
    /// Writer for JSON log lines, e.g. the output of
    /// `tracing_subscriber::fmt().json()`.
    pub fn structured(client: BatchClient, keys: FieldKeys) -> Self {
        RecordWriter {
            client,
            keys: Some(keys),
            pending: Vec::new(),
        }
    }

    /// Writer for unstructured text lines.
    pub fn plain(client: BatchClient) -> Self {
        RecordWriter {
            client,
            keys: None,
            pending: Vec::new(),
        }
    }

    fn add_plain_line(&self, line: &[u8]) {
        let line = String::from_utf8_lossy(line);
        self.client
            .add_log(LogRecord::new(line.trim_end_matches(['\r', '\n'])));
    }

    fn emit_pending(&mut self) {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.add_plain_line(&line);
        }
    }
}

impl Clone for RecordWriter {
    // A clone starts without the partial line of its source.
    fn clone(&self) -> Self {
        RecordWriter {
            client: self.client.clone(),
            keys: self.keys,
            pending: Vec::new(),
        }
    }
}

impl Write for RecordWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.keys {
            Some(keys) => {
                let record = keys
                    .adapt(buf)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                self.client.add_log(record);
            }
            None => {
                self.pending.extend_from_slice(buf);
                while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = self.pending.drain(..=end).collect();
                    self.add_plain_line(&line);
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit_pending();
        Ok(())
    }
}

impl Drop for RecordWriter {
    fn drop(&mut self) {
        self.emit_pending();
    }
}

impl<'a> MakeWriter<'a> for RecordWriter {
    type Writer = RecordWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Replicates every write to several writers, in order.
///
/// The first writer that fails stops the fan-out for that call and its
/// error is returned; the remaining writers are not attempted. Wrap it in a
/// `Mutex` to use it as a `tracing_subscriber` writer.
pub struct MultiWriter {
    writers: Vec<Box<dyn Write + Send>>,
}

impl MultiWriter {
    pub fn new(writers: Vec<Box<dyn Write + Send>>) -> Self {
        MultiWriter { writers }
    }
}

impl Write for MultiWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for writer in self.writers.iter_mut() {
            writer.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for writer in self.writers.iter_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}
