//! # Rust Structured Logger
//!
//! A high-throughput structured logging engine. One call renders one line
//! into JSON, logfmt, colorful or plain text and routes the bytes to sinks
//! chosen by severity.
//!
//! ## Features
//!
//! - **Ordinal levels**: builtin severities plus user-registered levels with their own tags and colors
//! - **Logger hierarchy**: named, cached children that copy their parent's configuration
//! - **Pooled rendering**: reusable buffers and typed fast paths for numbers, times and durations
//! - **Severity routing**: separate normal and error sinks with per-level overrides
//!
//! ## Example
//!
//! ```
//! use rust_structured_logger::prelude::*;
//!
//! let capture = MemorySink::new();
//! let engine = Engine::builder()
//!     .name("app")
//!     .format(FormatMode::Logfmt)
//!     .sink(shared(capture.clone()))
//!     .build();
//!
//! let db = engine.logger("db");
//! db.info("connected", &args!["host", "localhost", "port", 5432]);
//! assert!(capture.contents().contains("host=localhost port=5432"));
//! ```

pub mod core;
pub mod macros;
pub mod painters;
pub mod sinks;

pub mod prelude {
    pub use crate::args;
    pub use crate::core::{
        shared, Arg, Attr, Attrs, Caller, ColorMode, Engine, EngineBuilder, EngineConfig,
        Escalation, FormatMode, LevelOptions, LogContext, LogLevel, LogMarshal, Logger,
        LoggerError, LoggerOption, Redactor, Result, Router, SharedSink, Sink, TimeLayout, Value,
    };
    pub use crate::sinks::{ConsoleSink, FileSink, MemorySink};
}

pub use self::core::{
    shared, Arg, Attr, Attrs, Caller, ColorMode, Engine, EngineBuilder, EngineConfig, Escalation,
    FormatMode, LevelOptions, LevelRegistry, LogContext, LogLevel, LogMarshal, Logger, LoggerError,
    LoggerMetrics, LoggerOption, Redactor, Result, Router, SharedSink, Sink, TimeLayout, Value,
};
pub use sinks::{ConsoleSink, FileSink, MemorySink};
