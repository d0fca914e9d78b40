//! Helpers shared by the logfmt, colorful and plain painters

use super::ERROR_MARKER;
use crate::core::{Attr, Buffer, FormatMode, RenderContext, Value};
use colored::Color;

pub(crate) const RESET: &str = "\x1b[0m";

/// Values are quoted when empty or when they contain a space, `=`, `"`, `\`
/// or a control character
pub(crate) fn needs_quote(s: &str) -> bool {
    s.is_empty()
        || s
            .bytes()
            .any(|b| b <= b' ' || b == b'=' || b == b'"' || b == b'\\' || b == 0x7f)
}

pub(crate) fn write_str(buf: &mut Buffer, s: &str) {
    if needs_quote(s) {
        buf.write_json_string(s);
    } else {
        buf.push_str(s);
    }
}

/// Quote whatever was written since `mark` if it needs quoting
pub(crate) fn quote_tail(buf: &mut Buffer, mark: usize) {
    let tail = String::from_utf8_lossy(&buf.as_bytes()[mark..]).into_owned();
    if needs_quote(&tail) {
        buf.truncate(mark);
        buf.write_json_string(&tail);
    }
}

/// Keep only `[A-Za-z0-9_.-]`
fn write_sanitized(buf: &mut Buffer, key: &str) -> usize {
    let mut written = 0;
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-') {
            buf.push_byte(b);
            written += 1;
        }
    }
    written
}

/// `key=value`, flattening groups into dotted keys
pub(crate) fn write_attr(ctx: &mut RenderContext, attr: &Attr, sanitize: bool) {
    if let Value::Group(children) = &attr.value {
        let saved = ctx.push_prefix(&attr.key);
        for child in children {
            write_attr(ctx, child, sanitize);
        }
        ctx.pop_prefix(saved);
        return;
    }

    ctx.next_field(b' ');
    if sanitize {
        write_sanitized(&mut ctx.buf, &ctx.key_prefix);
        if write_sanitized(&mut ctx.buf, &attr.key) == 0 {
            ctx.buf.push_byte(b'_');
        }
    } else {
        ctx.buf.push_str(&ctx.key_prefix);
        ctx.buf.push_str(&attr.key);
    }
    ctx.buf.push_byte(b'=');
    write_value(&mut ctx.buf, &attr.value, ctx.mode);
}

pub(crate) fn write_value(buf: &mut Buffer, value: &Value, mode: FormatMode) {
    match value {
        Value::Null => buf.push_str("null"),
        Value::Bool(v) => buf.write_bool(*v),
        Value::Int(v) => buf.write_int(*v),
        Value::Uint(v) => buf.write_uint(*v),
        Value::Float(v) => buf.write_float(*v),
        Value::Float32(v) => buf.write_float32(*v),
        Value::Complex { re, im } => buf.write_complex(*re, *im),
        Value::Complex32 { re, im } => buf.write_complex32(*re, *im),
        Value::Str(s) => write_str(buf, s),
        Value::Bytes(b) => write_str(buf, &String::from_utf8_lossy(b)),
        Value::Duration(d) => {
            buf.push_byte(b'"');
            buf.write_duration(*d);
            buf.push_byte(b'"');
        }
        Value::Time(t) => {
            buf.push_byte(b'"');
            buf.write_time(t);
            buf.push_byte(b'"');
        }
        Value::Strings(items) => write_list(buf, items, |buf, s| write_str(buf, s)),
        Value::Bools(items) => write_list(buf, items, |buf, v| buf.write_bool(*v)),
        Value::Ints(items) => write_list(buf, items, |buf, v| buf.write_int(*v)),
        Value::Floats(items) => write_list(buf, items, |buf, v| buf.write_float(*v)),
        Value::Json(v) => match serde_json::to_string(v) {
            Ok(s) => write_str(buf, &s),
            Err(e) => write_error(buf, &e),
        },
        Value::Custom(v) => {
            let mark = buf.len();
            match v.marshal_log(mode, buf) {
                Ok(()) => quote_tail(buf, mark),
                Err(e) => {
                    buf.truncate(mark);
                    write_error(buf, &e);
                }
            }
        }
        Value::Opaque(v) => write_str(buf, &format!("{:?}", v)),
        // flattened by write_attr
        Value::Group(_) => {}
    }
}

/// `[a,b]`, quoted as a whole when any item needs it
fn write_list<T>(buf: &mut Buffer, items: &[T], mut each: impl FnMut(&mut Buffer, &T)) {
    let mark = buf.len();
    buf.push_byte(b'[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push_byte(b',');
        }
        each(buf, item);
    }
    buf.push_byte(b']');
    quote_tail(buf, mark);
}

fn write_error(buf: &mut Buffer, err: &dyn std::fmt::Display) {
    write_str(buf, &format!("{}{}", ERROR_MARKER, err));
}

/// Open an ANSI color sequence; false when there is nothing to color
pub(crate) fn color_start(buf: &mut Buffer, fg: Option<Color>, bg: Option<Color>) -> bool {
    if fg.is_none() && bg.is_none() {
        return false;
    }
    buf.push_str("\x1b[");
    if let Some(fg) = fg {
        buf.push_str(&fg.to_fg_str());
    }
    if let Some(bg) = bg {
        if fg.is_some() {
            buf.push_byte(b';');
        }
        buf.push_str(&bg.to_bg_str());
    }
    buf.push_byte(b'm');
    true
}

/// First line of `message` and the rest, if any
pub(crate) fn split_message(message: &str) -> (&str, Option<&str>) {
    match message.split_once('\n') {
        Some((first, rest)) => (first.trim_end_matches('\r'), Some(rest)),
        None => (message, None),
    }
}

/// `file:line function`
pub(crate) fn write_caller_short(ctx: &mut RenderContext, file: &str, line: u32, function: &str) {
    ctx.next_field(b' ');
    ctx.buf.push_str(file);
    ctx.buf.push_byte(b':');
    ctx.buf.write_uint(u64::from(line));
    if !function.is_empty() {
        ctx.buf.push_byte(b' ');
        ctx.buf.push_str(function);
    }
}

/// Held-back message lines, each indented by four spaces
pub(crate) fn write_deferred(ctx: &mut RenderContext) {
    for line in ctx.deferred.lines() {
        ctx.buf.push_str("\n    ");
        ctx.buf.push_str(line);
    }
}
