//! Program location attached to a record

use once_cell::sync::Lazy;
use regex::Regex;
use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::panic::Location;

/// Source location of a log call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: Cow<'static, str>,
    pub line: u32,
    /// Function or module path, empty when unknown
    pub function: Cow<'static, str>,
}

impl Caller {
    pub fn new(
        file: impl Into<Cow<'static, str>>,
        line: u32,
        function: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }

    /// Location of the nearest `#[track_caller]` boundary
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: Cow::Borrowed(location.file()),
            line: location.line(),
            function: Cow::Borrowed(""),
        }
    }

    /// Resolve the caller from a captured backtrace
    ///
    /// Frames from this crate and the standard library are skipped first,
    /// then `extra` more frames. Returns `None` when the binary carries no
    /// symbol information.
    pub fn from_backtrace(extra: usize) -> Option<Self> {
        let trace = Backtrace::force_capture().to_string();
        parse_frames(&trace)
            .into_iter()
            .filter(|frame| !is_internal(&frame.function))
            .filter(|frame| frame.file.is_some())
            .nth(extra)
            .and_then(|frame| {
                let (file, line) = frame.file?;
                Some(Caller::new(file, line, frame.function))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub function: String,
    pub file: Option<(String, u32)>,
}

static FRAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+:\s+(?P<func>.+?)\s*$").expect("Invalid regex pattern")
});

static AT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s+at\s+(?P<file>.+?):(?P<line>\d+)(?::\d+)?\s*$")
        .expect("Invalid regex pattern")
});

static HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"::h[0-9a-f]{16}$").expect("Invalid regex pattern"));

/// Split `std::backtrace::Backtrace` text into frames
pub(crate) fn parse_frames(trace: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    for line in trace.lines() {
        if let Some(caps) = FRAME_RE.captures(line) {
            let function = HASH_RE.replace(&caps["func"], "").into_owned();
            frames.push(Frame {
                function,
                file: None,
            });
        } else if let Some(caps) = AT_RE.captures(line) {
            if let (Some(frame), Ok(line_no)) = (frames.last_mut(), caps["line"].parse::<u32>()) {
                // inlined frames list several locations; keep the first
                if frame.file.is_none() {
                    frame.file = Some((caps["file"].to_string(), line_no));
                }
            }
        }
    }
    frames
}

const INTERNAL_PREFIXES: [&str; 6] = ["std::", "core::", "alloc::", "backtrace::", "test::", "__"];

fn is_internal(function: &str) -> bool {
    let name = function.trim_start_matches('<');
    name.starts_with(concat!(env!("CARGO_CRATE_NAME"), "::"))
        || INTERNAL_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "   0: std::backtrace::Backtrace::force_capture
             at /rustc/abc/library/std/src/backtrace.rs:312:13
   1: rust_structured_logger::core::caller::Caller::from_backtrace::h0123456789abcdef
             at ./src/core/caller.rs:48:21
   2: rust_structured_logger::core::logger::Logger::log
             at ./src/core/logger.rs:400:9
   3: myapp::db::query_helper
             at ./src/db.rs:17:5
   4: myapp::handlers::list_users
             at ./src/handlers.rs:88:13
   5: main
";

    #[test]
    fn test_parse_frames() {
        let frames = parse_frames(TRACE);
        assert_eq!(frames.len(), 6);
        assert_eq!(frames[1].function, "rust_structured_logger::core::caller::Caller::from_backtrace");
        assert_eq!(frames[3].file, Some(("./src/db.rs".to_string(), 17)));
        assert_eq!(frames[5].file, None);
    }

    #[test]
    fn test_skips_internal_frames() {
        let external: Vec<Frame> = parse_frames(TRACE)
            .into_iter()
            .filter(|f| !is_internal(&f.function))
            .collect();
        assert_eq!(external[0].function, "myapp::db::query_helper");
        assert_eq!(external[1].function, "myapp::handlers::list_users");
    }

    #[test]
    fn test_trait_impl_frames_are_internal() {
        assert!(is_internal("<rust_structured_logger::sinks::MemorySink as rust_structured_logger::core::Sink>::write"));
        assert!(!is_internal("<myapp::Thing as core::fmt::Debug>::fmt"));
    }

    #[test]
    fn test_from_location() {
        let caller = Caller::from_location(Location::caller());
        assert!(caller.file.ends_with(".rs"));
        assert!(caller.line > 0);
        assert!(caller.function.is_empty());
    }
}
