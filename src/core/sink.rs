//! Sink trait for rendered output

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// Destination for rendered lines
///
/// Only `write` and `name` are required. The router calls `set_level` right
/// before each `write` so a sink can react to the severity of the line.
pub trait Sink: Send + Sync {
    /// Write one rendered line; returns the number of bytes accepted
    fn write(&mut self, bytes: &[u8]) -> Result<usize>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    fn set_level(&mut self, _level: LogLevel) {}

    fn name(&self) -> &str;
}

pub type SharedSink = Arc<Mutex<Box<dyn Sink>>>;

/// Wrap a sink so it can sit in several routes at once
pub fn shared<S: Sink + 'static>(sink: S) -> SharedSink {
    Arc::new(Mutex::new(Box::new(sink)))
}

/// Adapts any [`io::Write`] into a [`Sink`]
pub struct WriterSink<W> {
    name: String,
    writer: W,
}

impl<W: io::Write + Send + Sync> WriterSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write + Send + Sync> Sink for WriterSink<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        self.writer
            .write_all(bytes)
            .map_err(|e| LoggerError::io_operation("writing log line", self.name.clone(), e))?;
        Ok(bytes.len())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sink() {
        let mut sink = WriterSink::new("vec", Vec::new());
        assert_eq!(sink.write(b"line\n").unwrap(), 5);
        sink.close().unwrap();
        assert_eq!(sink.into_inner(), b"line\n");
    }

    #[test]
    fn test_shared_sink_name() {
        let sink = shared(WriterSink::new("buf", Vec::new()));
        assert_eq!(sink.lock().name(), "buf");
    }
}
