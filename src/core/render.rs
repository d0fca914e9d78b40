//! Render driver
//!
//! [`render`] walks a loaded [`RenderContext`] through a painter and returns
//! the finished line. The slice borrows the context's buffer; copy it out
//! before the context goes back to its pool.

use super::caller::Caller;
use super::log_level::LogLevel;
use super::redact::Redactor;
use super::render_context::RenderContext;
use super::timestamp::TimeLayout;
use crate::painters::Painter;
use chrono::{DateTime, Utc};
use std::borrow::Cow;

/// The per-call inputs of one log line
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub level: LogLevel,
    pub time: DateTime<Utc>,
    pub logger: &'a str,
    pub message: &'a str,
    pub caller: Option<Caller>,
}

impl<'a> Record<'a> {
    /// Record stamped with the current time
    pub fn new(level: LogLevel, logger: &'a str, message: &'a str) -> Self {
        Self {
            level,
            time: Utc::now(),
            logger,
            message,
            caller: None,
        }
    }

    #[must_use]
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }
}

/// Node configuration that shapes one render
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    pub time_layout: &'a TimeLayout,
    pub utc: bool,
    /// Longest logger name seen, used for alignment by the colorful painter
    pub name_width: usize,
    pub redactor: Option<&'a Redactor>,
}

impl<'a> RenderOptions<'a> {
    pub fn new(time_layout: &'a TimeLayout) -> Self {
        Self {
            time_layout,
            utc: true,
            name_width: 0,
            redactor: None,
        }
    }
}

/// Paint the context's record and attributes into its buffer
///
/// The context must have been loaded with [`RenderContext::set`] and its
/// attributes resolved beforehand.
pub fn render<'c>(ctx: &'c mut RenderContext, opts: &RenderOptions<'_>, painter: &dyn Painter) -> &'c [u8] {
    painter.begin(ctx);
    painter.time(ctx, opts.time_layout, opts.utc);

    let logger = std::mem::take(&mut ctx.logger);
    painter.logger_name(ctx, &logger, opts.name_width);
    ctx.logger = logger;

    painter.level(ctx);

    let message = std::mem::take(&mut ctx.message);
    painter.message(ctx, &message);
    ctx.message = message;

    let attrs = std::mem::take(&mut ctx.attrs);
    for attr in &attrs {
        painter.attr(ctx, attr);
    }
    ctx.attrs = attrs;

    if let Some(caller) = ctx.caller.take() {
        let file = match opts.redactor {
            Some(redactor) => redactor.redact(&caller.file),
            None => Cow::Borrowed(caller.file.as_ref()),
        };
        painter.caller(ctx, &file, caller.line, &caller.function);
        drop(file);
        ctx.caller = Some(caller);
    }

    painter.deferred(ctx);
    painter.end(ctx);
    ctx.buf.push_byte(b'\n');
    ctx.buf.as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Attr, FormatMode, KeyIndex, Value};
    use crate::painters::painter_for;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn render_line(mode: FormatMode, record: Record<'_>, attrs: Vec<Attr>, opts: RenderOptions<'_>) -> String {
        let mut ctx = RenderContext::new();
        ctx.set(&record, mode, mode == FormatMode::Colorful);
        ctx.index = KeyIndex::of(&attrs);
        ctx.attrs = attrs;
        let bytes = render(&mut ctx, &opts, painter_for(mode));
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_json_line() {
        let layout = TimeLayout::Iso8601Micros;
        let record = Record::new(LogLevel::INFO, "app", "hello").with_time(fixed_time());
        let line = render_line(
            FormatMode::Json,
            record,
            vec![Attr::new("foo", 1)],
            RenderOptions::new(&layout),
        );
        assert_eq!(
            line,
            "{\"time\":\"2024-01-01T00:00:00.000000Z\",\"logger\":\"app\",\"level\":\"info\",\"msg\":\"hello\",\"foo\":1}\n"
        );
    }

    #[test]
    fn test_json_without_logger_and_with_caller() {
        let layout = TimeLayout::Unix;
        let record = Record::new(LogLevel::WARN, "", "disk")
            .with_time(fixed_time())
            .with_caller(Caller::new("/home/alice/app/src/main.rs", 12, "app::main"));
        let redactor = Redactor::empty().with_home("/home/alice");
        let opts = RenderOptions {
            redactor: Some(&redactor),
            ..RenderOptions::new(&layout)
        };
        let line = render_line(FormatMode::Json, record, vec![], opts);
        assert_eq!(
            line,
            "{\"time\":1704067200,\"level\":\"warn\",\"msg\":\"disk\",\"caller\":{\"file\":\"~/app/src/main.rs\",\"line\":12,\"function\":\"app::main\"}}\n"
        );
    }

    #[test]
    fn test_json_caller_shape_is_fixed() {
        let layout = TimeLayout::Unix;
        let record = Record::new(LogLevel::INFO, "", "m")
            .with_time(fixed_time())
            .with_caller(Caller::new("src/lib.rs", 3, ""));
        let line = render_line(FormatMode::Json, record, vec![], RenderOptions::new(&layout));
        assert!(
            line.ends_with(",\"caller\":{\"file\":\"src/lib.rs\",\"line\":3,\"function\":\"\"}}\n"),
            "{}",
            line
        );
    }

    #[test]
    fn test_logfmt_line() {
        let layout = TimeLayout::Rfc3339;
        let record = Record::new(LogLevel::ERROR, "db", "query failed").with_time(fixed_time());
        let attrs = vec![
            Attr::new("table", "users"),
            Attr::group("conn", vec![Attr::new("host", "db 1"), Attr::new("port", 5432)]),
            Attr::new("bad key!", true),
        ];
        let line = render_line(FormatMode::Logfmt, record, attrs, RenderOptions::new(&layout));
        assert_eq!(
            line,
            "time=2024-01-01T00:00:00Z logger=db level=error msg=\"query failed\" table=users conn.host=\"db 1\" conn.port=5432 badkey=true\n"
        );
    }

    #[test]
    fn test_logfmt_lists_and_custom_values_stay_one_field() {
        #[derive(Debug)]
        struct Pair;

        impl crate::core::LogMarshal for Pair {
            fn marshal_log(&self, _mode: FormatMode, buf: &mut crate::core::Buffer) -> crate::core::Result<()> {
                buf.push_str("left right");
                Ok(())
            }
        }

        let layout = TimeLayout::Unix;
        let record = Record::new(LogLevel::INFO, "", "m").with_time(fixed_time());
        let attrs = vec![
            Attr::new("tags", vec!["a", "b c"]),
            Attr::new("ids", Value::Ints(vec![1, 2])),
            Attr::new("pair", Value::custom(Pair)),
            Attr::new("after", 1),
        ];
        let line = render_line(FormatMode::Logfmt, record, attrs, RenderOptions::new(&layout));
        assert_eq!(
            line,
            "time=1704067200 level=info msg=m tags=\"[a,\\\"b c\\\"]\" ids=[1,2] pair=\"left right\" after=1\n"
        );
    }

    #[test]
    fn test_plain_line_with_continuation() {
        let layout = TimeLayout::Rfc3339;
        let record = Record::new(LogLevel::DEBUG, "svc", "first\nsecond\nthird")
            .with_time(fixed_time())
            .with_caller(Caller::new("src/lib.rs", 3, ""));
        let line = render_line(
            FormatMode::Plain,
            record,
            vec![Attr::new("n", Value::Float(0.5))],
            RenderOptions::new(&layout),
        );
        assert_eq!(
            line,
            "2024-01-01T00:00:00Z svc [DBG] first n=0.5 src/lib.rs:3\n    second\n    third\n"
        );
    }

    #[test]
    fn test_colorful_alignment_and_escapes() {
        let layout = TimeLayout::Rfc3339;
        let record = Record::new(LogLevel::INFO, "api", "ok").with_time(fixed_time());
        let opts = RenderOptions {
            name_width: 6,
            ..RenderOptions::new(&layout)
        };
        let line = render_line(FormatMode::Colorful, record, vec![Attr::new("k", "v")], opts);
        let expected = format!(
            "2024-01-01T00:00:00Z api    \x1b[32m[INF]\x1b[0m \x1b[32mok\x1b[0m{} k=v\n",
            " ".repeat(30)
        );
        assert_eq!(line, expected);
    }

    #[test]
    fn test_group_stays_nested_in_json() {
        let layout = TimeLayout::Unix;
        let record = Record::new(LogLevel::INFO, "", "m").with_time(fixed_time());
        let attrs = vec![Attr::group("req", vec![Attr::new("id", 5)])];
        let line = render_line(FormatMode::Json, record, attrs, RenderOptions::new(&layout));
        assert!(line.contains("\"req\":{\"id\":5}"));
        assert!(!line.contains("req.id"));
    }

    #[test]
    fn test_context_reuse_does_not_leak() {
        let layout = TimeLayout::Unix;
        let opts = RenderOptions::new(&layout);
        let mut ctx = RenderContext::new();

        ctx.set(&Record::new(LogLevel::INFO, "a", "first-secret"), FormatMode::Logfmt, false);
        ctx.attrs.push(Attr::new("token", "abc123"));
        let first = render(&mut ctx, &opts, painter_for(FormatMode::Logfmt)).to_vec();
        assert!(String::from_utf8_lossy(&first).contains("abc123"));

        ctx.set(&Record::new(LogLevel::INFO, "a", "second"), FormatMode::Logfmt, false);
        let second = String::from_utf8(render(&mut ctx, &opts, painter_for(FormatMode::Logfmt)).to_vec()).unwrap();
        assert!(!second.contains("first-secret"));
        assert!(!second.contains("abc123"));
        assert!(!second.contains("token"));
    }
}
