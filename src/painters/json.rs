//! JSON painter: one object per line, groups as nested objects

use super::{Painter, ERROR_MARKER};
use crate::core::{Attr, Buffer, FormatMode, RenderContext, TimeLayout, Value};

/// `{"time":..,"logger":..,"level":..,"msg":..,<attrs>,"caller":{..}}`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPainter;

impl Painter for JsonPainter {
    fn mode(&self) -> FormatMode {
        FormatMode::Json
    }

    fn begin(&self, ctx: &mut RenderContext) {
        ctx.buf.push_byte(b'{');
    }

    fn end(&self, ctx: &mut RenderContext) {
        ctx.buf.push_byte(b'}');
    }

    fn time(&self, ctx: &mut RenderContext, layout: &TimeLayout, utc: bool) {
        ctx.next_field(b',');
        ctx.buf.push_str("\"time\":");
        let time = ctx.time;
        if layout.is_numeric() {
            layout.write(&time, utc, &mut ctx.buf);
            return;
        }
        ctx.buf.push_byte(b'"');
        let mark = ctx.buf.len();
        layout.write(&time, utc, &mut ctx.buf);
        if matches!(layout, TimeLayout::Custom(_)) {
            escape_tail(&mut ctx.buf, mark);
        }
        ctx.buf.push_byte(b'"');
    }

    fn logger_name(&self, ctx: &mut RenderContext, name: &str, _width: usize) {
        if name.is_empty() {
            return;
        }
        ctx.next_field(b',');
        ctx.buf.push_str("\"logger\":");
        ctx.buf.write_json_string(name);
    }

    fn level(&self, ctx: &mut RenderContext) {
        ctx.next_field(b',');
        ctx.buf.push_str("\"level\":");
        ctx.buf.write_json_string(&ctx.title);
    }

    fn message(&self, ctx: &mut RenderContext, message: &str) {
        ctx.next_field(b',');
        ctx.buf.push_str("\"msg\":");
        ctx.buf.write_json_string(message);
    }

    fn attr(&self, ctx: &mut RenderContext, attr: &Attr) {
        ctx.next_field(b',');
        write_attr(&mut ctx.buf, attr);
    }

    fn caller(&self, ctx: &mut RenderContext, file: &str, line: u32, function: &str) {
        ctx.next_field(b',');
        ctx.buf.push_str("\"caller\":{\"file\":");
        ctx.buf.write_json_string(file);
        ctx.buf.push_str(",\"line\":");
        ctx.buf.write_uint(u64::from(line));
        ctx.buf.push_str(",\"function\":");
        ctx.buf.write_json_string(function);
        ctx.buf.push_byte(b'}');
    }
}

fn escape_tail(buf: &mut Buffer, mark: usize) {
    let raw = String::from_utf8_lossy(&buf.as_bytes()[mark..]).into_owned();
    buf.truncate(mark);
    buf.write_json_escaped(&raw);
}

fn write_attr(buf: &mut Buffer, attr: &Attr) {
    buf.write_json_string(&attr.key);
    buf.push_byte(b':');
    write_value(buf, &attr.value);
}

/// Non-finite floats have no JSON number form and are written as strings
fn write_float(buf: &mut Buffer, v: f64) {
    if v.is_finite() {
        buf.write_float(v);
    } else {
        buf.push_byte(b'"');
        buf.write_float(v);
        buf.push_byte(b'"');
    }
}

fn write_list<T>(buf: &mut Buffer, items: &[T], mut each: impl FnMut(&mut Buffer, &T)) {
    buf.push_byte(b'[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push_byte(b',');
        }
        each(buf, item);
    }
    buf.push_byte(b']');
}

fn write_error(buf: &mut Buffer, err: &dyn std::fmt::Display) {
    buf.write_json_string(&format!("{}{}", ERROR_MARKER, err));
}

pub(crate) fn write_value(buf: &mut Buffer, value: &Value) {
    match value {
        Value::Null => buf.push_str("null"),
        Value::Bool(v) => buf.write_bool(*v),
        Value::Int(v) => buf.write_int(*v),
        Value::Uint(v) => buf.write_uint(*v),
        Value::Float(v) => write_float(buf, *v),
        Value::Float32(v) => {
            if v.is_finite() {
                buf.write_float32(*v);
            } else {
                write_float(buf, f64::from(*v));
            }
        }
        Value::Complex { re, im } => {
            buf.push_byte(b'"');
            buf.write_complex(*re, *im);
            buf.push_byte(b'"');
        }
        Value::Complex32 { re, im } => {
            buf.push_byte(b'"');
            buf.write_complex32(*re, *im);
            buf.push_byte(b'"');
        }
        Value::Str(s) => buf.write_json_string(s),
        Value::Bytes(b) => buf.write_json_string(&String::from_utf8_lossy(b)),
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
        Value::Strings(items) => write_list(buf, items, |buf, s| buf.write_json_string(s)),
        Value::Bools(items) => write_list(buf, items, |buf, v| buf.write_bool(*v)),
        Value::Ints(items) => write_list(buf, items, |buf, v| buf.write_int(*v)),
        Value::Floats(items) => write_list(buf, items, |buf, v| write_float(buf, *v)),
        Value::Json(v) => {
            let mark = buf.len();
            if let Err(e) = serde_json::to_writer(&mut *buf, v) {
                buf.truncate(mark);
                write_error(buf, &e);
            }
        }
        Value::Custom(v) => {
            let mark = buf.len();
            match v.marshal_log(FormatMode::Json, buf) {
                Ok(()) if buf.len() == mark => buf.push_str("null"),
                Ok(()) => {}
                Err(e) => {
                    buf.truncate(mark);
                    write_error(buf, &e);
                }
            }
        }
        Value::Opaque(v) => buf.write_json_string(&format!("{:?}", v)),
        Value::Group(attrs) => {
            buf.push_byte(b'{');
            for (i, attr) in attrs.iter().enumerate() {
                if i > 0 {
                    buf.push_byte(b',');
                }
                write_attr(buf, attr);
            }
            buf.push_byte(b'}');
        }
    }
}
