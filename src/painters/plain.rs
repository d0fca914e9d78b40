//! Plain painter: the colorful layout with no escapes and no alignment

use super::{text, Painter};
use crate::core::{Attr, FormatMode, RenderContext, TimeLayout};

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPainter;

impl Painter for PlainPainter {
    fn mode(&self) -> FormatMode {
        FormatMode::Plain
    }

    fn time(&self, ctx: &mut RenderContext, layout: &TimeLayout, utc: bool) {
        ctx.next_field(b' ');
        let time = ctx.time;
        layout.write(&time, utc, &mut ctx.buf);
    }

    fn logger_name(&self, ctx: &mut RenderContext, name: &str, _width: usize) {
        if name.is_empty() {
            return;
        }
        ctx.next_field(b' ');
        ctx.buf.push_str(name);
    }

    fn level(&self, ctx: &mut RenderContext) {
        ctx.next_field(b' ');
        ctx.buf.push_byte(b'[');
        ctx.buf.push_str(&ctx.tag);
        ctx.buf.push_byte(b']');
    }

    fn message(&self, ctx: &mut RenderContext, message: &str) {
        ctx.next_field(b' ');
        let (first, rest) = text::split_message(message);
        ctx.buf.push_str(first);
        if let Some(rest) = rest {
            ctx.deferred.push_str(rest);
        }
    }

    fn attr(&self, ctx: &mut RenderContext, attr: &Attr) {
        text::write_attr(ctx, attr, false);
    }

    fn caller(&self, ctx: &mut RenderContext, file: &str, line: u32, function: &str) {
        text::write_caller_short(ctx, file, line, function);
    }

    fn deferred(&self, ctx: &mut RenderContext) {
        text::write_deferred(ctx);
    }
}
