//! logfmt painter
//!
//! Fields are `key=value` pairs separated by a single space, in the same order
//! as the JSON painter. Keys keep only `[A-Za-z0-9_.-]`; nested groups become
//! dotted keys. Values are quoted (with JSON escaping) when empty or when they
//! contain a space, `=`, `"`, `\` or a control character.

use super::{text, Painter};
use crate::core::{Attr, FormatMode, RenderContext, TimeLayout};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogfmtPainter;

impl Painter for LogfmtPainter {
    fn mode(&self) -> FormatMode {
        FormatMode::Logfmt
    }

    fn time(&self, ctx: &mut RenderContext, layout: &TimeLayout, utc: bool) {
        ctx.next_field(b' ');
        ctx.buf.push_str("time=");
        let time = ctx.time;
        let mark = ctx.buf.len();
        layout.write(&time, utc, &mut ctx.buf);
        text::quote_tail(&mut ctx.buf, mark);
    }

    fn logger_name(&self, ctx: &mut RenderContext, name: &str, _width: usize) {
        if name.is_empty() {
            return;
        }
        ctx.next_field(b' ');
        ctx.buf.push_str("logger=");
        text::write_str(&mut ctx.buf, name);
    }

    fn level(&self, ctx: &mut RenderContext) {
        ctx.next_field(b' ');
        ctx.buf.push_str("level=");
        text::write_str(&mut ctx.buf, &ctx.title);
    }

    fn message(&self, ctx: &mut RenderContext, message: &str) {
        ctx.next_field(b' ');
        ctx.buf.push_str("msg=");
        text::write_str(&mut ctx.buf, message);
    }

    fn attr(&self, ctx: &mut RenderContext, attr: &Attr) {
        text::write_attr(ctx, attr, true);
    }

    fn caller(&self, ctx: &mut RenderContext, file: &str, line: u32, function: &str) {
        ctx.next_field(b' ');
        ctx.buf.push_str("caller.file=");
        text::write_str(&mut ctx.buf, file);
        ctx.buf.push_str(" caller.line=");
        ctx.buf.write_uint(u64::from(line));
        if !function.is_empty() {
            ctx.buf.push_str(" caller.function=");
            text::write_str(&mut ctx.buf, function);
        }
    }
}
