//! Logging macros for ergonomic log message formatting.
//!
//! These macros format the message like `format!`, record `file!()`,
//! `line!()` and `module_path!()` as the caller, and take attributes after a
//! `;` as `key => value` pairs. The logger argument may be left out to log
//! through the default logger.
//!
//! # Examples
//!
//! ```
//! use rust_structured_logger::prelude::*;
//! use rust_structured_logger::{info, warn};
//!
//! let capture = MemorySink::new();
//! let engine = Engine::builder()
//!     .format(FormatMode::Logfmt)
//!     .sink(shared(capture.clone()))
//!     .build();
//! let logger = engine.root();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments and attributes
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port; "tls" => true);
//! warn!(logger, "Slow request"; "path" => "/api", "ms" => 1200);
//!
//! assert_eq!(capture.lines().len(), 3);
//! assert!(capture.lines()[2].contains("path=/api ms=1200"));
//! ```

/// Log a message at any level.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let engine = Engine::builder().sink(shared(MemorySink::new())).build();
/// # let logger = engine.root();
/// use rust_structured_logger::log;
/// log!(logger, LogLevel::INFO, "Simple message");
/// log!(logger, LogLevel::ERROR, "Error code: {}", 500; "retry" => false);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $fmt:literal $(, $farg:expr)* $(,)? $(; $($key:expr => $val:expr),* $(,)?)?) => {
        $logger.log_at(
            $level,
            ::std::format!($fmt $(, $farg)*),
            &[$($($crate::core::Arg::from($crate::core::Attr::new($key, $val))),*)?],
            ::std::option::Option::None,
            $crate::core::Caller::new(::std::file!(), ::std::line!(), ::std::module_path!()),
        )
    };
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let engine = Engine::builder().level(LogLevel::TRACE).sink(shared(MemorySink::new())).build();
/// # let logger = engine.root();
/// use rust_structured_logger::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($fmt:literal $($rest:tt)*) => {
        $crate::log!($crate::core::default_logger(), $crate::LogLevel::TRACE, $fmt $($rest)*)
    };
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::TRACE, $($rest)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($fmt:literal $($rest:tt)*) => {
        $crate::log!($crate::core::default_logger(), $crate::LogLevel::DEBUG, $fmt $($rest)*)
    };
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::DEBUG, $($rest)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let engine = Engine::builder().sink(shared(MemorySink::new())).build();
/// # let logger = engine.root();
/// use rust_structured_logger::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100; "batch" => 7);
/// ```
#[macro_export]
macro_rules! info {
    ($fmt:literal $($rest:tt)*) => {
        $crate::log!($crate::core::default_logger(), $crate::LogLevel::INFO, $fmt $($rest)*)
    };
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::INFO, $($rest)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($fmt:literal $($rest:tt)*) => {
        $crate::log!($crate::core::default_logger(), $crate::LogLevel::WARN, $fmt $($rest)*)
    };
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::WARN, $($rest)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($fmt:literal $($rest:tt)*) => {
        $crate::log!($crate::core::default_logger(), $crate::LogLevel::ERROR, $fmt $($rest)*)
    };
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::ERROR, $($rest)+)
    };
}

/// Log a fatal-level message, then exit unless escalations are suppressed.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let engine = Engine::builder().no_interrupt(true).sink(shared(MemorySink::new())).build();
/// # let logger = engine.root();
/// use rust_structured_logger::fatal;
/// fatal!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($fmt:literal $($rest:tt)*) => {
        $crate::log!($crate::core::default_logger(), $crate::LogLevel::FATAL, $fmt $($rest)*)
    };
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::FATAL, $($rest)+)
    };
}

/// Log an OK-level message.
#[macro_export]
macro_rules! ok {
    ($fmt:literal $($rest:tt)*) => {
        $crate::log!($crate::core::default_logger(), $crate::LogLevel::OK, $fmt $($rest)*)
    };
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::OK, $($rest)+)
    };
}

/// Log a success-level message.
#[macro_export]
macro_rules! success {
    ($fmt:literal $($rest:tt)*) => {
        $crate::log!($crate::core::default_logger(), $crate::LogLevel::SUCCESS, $fmt $($rest)*)
    };
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::SUCCESS, $($rest)+)
    };
}

/// Log a fail-level message.
#[macro_export]
macro_rules! fail {
    ($fmt:literal $($rest:tt)*) => {
        $crate::log!($crate::core::default_logger(), $crate::LogLevel::FAIL, $fmt $($rest)*)
    };
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::FAIL, $($rest)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{shared, Engine, FormatMode, LogLevel};
    use crate::sinks::MemorySink;

    fn capture() -> (Engine, MemorySink) {
        let sink = MemorySink::new();
        let engine = Engine::builder()
            .format(FormatMode::Logfmt)
            .level(LogLevel::TRACE)
            .caller(true)
            .testing(true)
            .sink(shared(sink.clone()))
            .build();
        (engine, sink)
    }

    #[test]
    fn test_log_macro() {
        let (engine, sink) = capture();
        let logger = engine.root();
        log!(logger, LogLevel::INFO, "Test message");
        log!(logger, LogLevel::INFO, "Formatted: {}", 42);
        let lines = sink.lines();
        assert!(lines[0].contains("msg=\"Test message\""));
        assert!(lines[1].contains("msg=\"Formatted: 42\""));
    }

    #[test]
    fn test_attribute_tail() {
        let (engine, sink) = capture();
        let logger = engine.root();
        info!(logger, "Items: {}", 100; "batch" => 7, "dry_run" => true,);
        assert!(sink.lines()[0].contains("batch=7 dry_run=true"));
    }

    #[test]
    fn test_caller_is_macro_site() {
        let (engine, sink) = capture();
        let logger = engine.root();
        warn!(logger, "here");
        let line = &sink.lines()[0];
        assert!(line.contains("caller.file=src/macros.rs"), "{}", line);
        assert!(line.contains("caller.function=rust_structured_logger::macros::tests"));
    }

    #[test]
    fn test_level_macros() {
        let (engine, sink) = capture();
        let logger = engine.root();
        trace!(logger, "t");
        debug!(logger, "d");
        error!(logger, "e");
        fatal!(logger, "f");
        ok!(logger, "o");
        success!(logger, "s");
        fail!(logger, "x");
        let levels: Vec<bool> = ["trace", "debug", "error", "fatal", "ok", "success", "fail"]
            .iter()
            .zip(sink.lines())
            .map(|(title, line)| line.contains(&format!("level={}", title)))
            .collect();
        assert_eq!(levels, vec![true; 7]);
        assert_eq!(engine.metrics().escalations_suppressed(), 1);
    }
}
