//! Colorful painter for terminals
//!
//! `<time> <logger padded> [TAG] <message padded> key=value ... file:line function`
//! ANSI escapes wrap only the level tag and the message. Message lines after
//! the first are appended below the record, indented by four spaces.

use super::{text, Painter};
use crate::core::{Attr, FormatMode, RenderContext, TimeLayout};

/// Column width the first message line is padded to
pub const MESSAGE_MIN_WIDTH: usize = 32;

#[derive(Debug, Clone, Copy, Default)]
pub struct ColorfulPainter;

impl Painter for ColorfulPainter {
    fn mode(&self) -> FormatMode {
        FormatMode::Colorful
    }

    fn time(&self, ctx: &mut RenderContext, layout: &TimeLayout, utc: bool) {
        ctx.next_field(b' ');
        let time = ctx.time;
        layout.write(&time, utc, &mut ctx.buf);
    }

    fn logger_name(&self, ctx: &mut RenderContext, name: &str, width: usize) {
        if name.is_empty() && width == 0 {
            return;
        }
        ctx.next_field(b' ');
        ctx.buf.push_str(name);
        ctx.buf.pad(width.saturating_sub(name.chars().count()));
    }

    fn level(&self, ctx: &mut RenderContext) {
        ctx.next_field(b' ');
        let colored = text::color_start(&mut ctx.buf, ctx.fg, ctx.bg);
        ctx.buf.push_byte(b'[');
        ctx.buf.push_str(&ctx.tag);
        ctx.buf.push_byte(b']');
        if colored {
            ctx.buf.push_str(text::RESET);
        }
    }

    fn message(&self, ctx: &mut RenderContext, message: &str) {
        ctx.next_field(b' ');
        let (first, rest) = text::split_message(message);
        let colored = text::color_start(&mut ctx.buf, ctx.fg, ctx.bg);
        ctx.buf.push_str(first);
        if colored {
            ctx.buf.push_str(text::RESET);
        }
        ctx.buf
            .pad(MESSAGE_MIN_WIDTH.saturating_sub(first.chars().count()));
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
