//! In-memory sink for tests and captures

use crate::core::{LogLevel, LoggerError, Result, Sink};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    last_level: Option<LogLevel>,
    pending_level: Option<LogLevel>,
    fail: bool,
    closed: bool,
}

/// Collects every line written to it
///
/// Clones share the same storage, so one handle can be given to a router
/// while another is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    name: String,
    inner: Arc<Mutex<Captured>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::default(),
        }
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Level of the most recent successful write
    pub fn last_level(&self) -> Option<LogLevel> {
        self.inner.lock().last_level
    }

    pub fn len(&self) -> usize {
        self.inner.lock().bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.bytes.clear();
        inner.last_level = None;
    }

    /// Make subsequent writes fail, for exercising error paths
    pub fn set_failing(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }
}

impl Sink for MemorySink {
    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(LoggerError::SinkClosed(self.name.clone()));
        }
        if inner.fail {
            return Err(LoggerError::writer(format!("{}: write rejected", self.name)));
        }
        inner.bytes.extend_from_slice(bytes);
        inner.last_level = inner.pending_level;
        Ok(bytes.len())
    }

    fn close(&mut self) -> Result<()> {
        self.inner.lock().closed = true;
        Ok(())
    }

    fn set_level(&mut self, level: LogLevel) {
        self.inner.lock().pending_level = Some(level);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_shared_between_clones() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.set_level(LogLevel::WARN);
        writer.write(b"a\nb\n").unwrap();
        assert_eq!(sink.lines(), vec!["a", "b"]);
        assert_eq!(sink.last_level(), Some(LogLevel::WARN));
    }

    #[test]
    fn test_failing_and_closed() {
        let sink = MemorySink::named("cap");
        let mut writer = sink.clone();
        sink.set_failing(true);
        assert!(writer.write(b"x").is_err());
        sink.set_failing(false);
        writer.close().unwrap();
        assert!(matches!(writer.write(b"x"), Err(LoggerError::SinkClosed(_))));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_clear() {
        let sink = MemorySink::new();
        sink.clone().write(b"x\n").unwrap();
        sink.clear();
        assert!(sink.is_empty());
        assert_eq!(sink.last_level(), None);
    }
}
