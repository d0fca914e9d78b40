//! Severity-based output routing
//!
//! A per-level override list wins when present. Otherwise levels flagged as
//! error-stream in the [`LevelRegistry`] go to the error sinks and everything
//! else goes to the normal sinks.

use super::error::{LoggerError, Result};
use super::log_level::{LevelRegistry, LogLevel};
use super::sink::SharedSink;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;

/// A sink write that did not go through
#[derive(Debug)]
pub struct SinkFailure {
    pub sink: String,
    pub error: LoggerError,
}

#[derive(Default)]
pub struct Router {
    normal: Vec<SharedSink>,
    error: Vec<SharedSink>,
    overrides: HashMap<LogLevel, Vec<SharedSink>>,
    /// Serializes whole routes when set
    strict: Option<Mutex<()>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same sinks for every level
    pub fn single(sinks: Vec<SharedSink>) -> Self {
        Self {
            error: sinks.clone(),
            normal: sinks,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn normal(mut self, sink: SharedSink) -> Self {
        self.normal.push(sink);
        self
    }

    #[must_use]
    pub fn error(mut self, sink: SharedSink) -> Self {
        self.error.push(sink);
        self
    }

    /// Route `level` to `sink` instead of the default lists
    #[must_use]
    pub fn level(mut self, level: LogLevel, sink: SharedSink) -> Self {
        self.overrides.entry(level).or_default().push(sink);
        self
    }

    /// Hold one lock across every sink write of a route
    #[must_use]
    pub fn strict(mut self, on: bool) -> Self {
        self.strict = on.then(|| Mutex::new(()));
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.normal.is_empty() && self.error.is_empty() && self.overrides.is_empty()
    }

    /// Sinks a line at `level` is written to
    pub fn sinks_for(&self, level: LogLevel) -> &[SharedSink] {
        if let Some(sinks) = self.overrides.get(&level) {
            return sinks;
        }
        if LevelRegistry::global().is_error_stream(level) {
            &self.error
        } else {
            &self.normal
        }
    }

    /// Write `bytes` to every sink for `level`
    ///
    /// Every sink is attempted; failures are collected, never raised.
    pub fn route(&self, level: LogLevel, bytes: &[u8]) -> Vec<SinkFailure> {
        let _order = self.strict.as_ref().map(|lock| lock.lock());
        let mut failures = Vec::new();
        for sink in self.sinks_for(level) {
            let mut sink = sink.lock();
            sink.set_level(level);
            let outcome = match sink.write(bytes) {
                Ok(n) if n < bytes.len() => Err(LoggerError::writer(format!(
                    "short write: {} of {} bytes",
                    n,
                    bytes.len()
                ))),
                Ok(_) => Ok(()),
                Err(e) => Err(e),
            };
            if let Err(error) = outcome {
                failures.push(SinkFailure {
                    sink: sink.name().to_string(),
                    error,
                });
            }
        }
        failures
    }

    /// Flush every distinct sink; the first error is returned after all were tried
    pub fn flush(&self) -> Result<()> {
        self.for_each_sink(|sink| sink.lock().flush())
    }

    pub fn close(&self) -> Result<()> {
        self.for_each_sink(|sink| sink.lock().close())
    }

    fn for_each_sink(&self, mut op: impl FnMut(&SharedSink) -> Result<()>) -> Result<()> {
        let mut seen: Vec<&SharedSink> = Vec::new();
        let mut first_error = None;
        let all = self
            .normal
            .iter()
            .chain(self.error.iter())
            .chain(self.overrides.values().flatten());
        for sink in all {
            if seen.iter().any(|s| std::sync::Arc::ptr_eq(s, sink)) {
                continue;
            }
            seen.push(sink);
            if let Err(e) = op(sink) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("normal", &self.normal.len())
            .field("error", &self.error.len())
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .field("strict", &self.is_strict())
            .finish()
    }
}
