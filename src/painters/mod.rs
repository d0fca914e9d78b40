//! Per-format painters
//!
//! A painter fixes the punctuation, quoting and structure of one
//! [`FormatMode`]. Painters hold no state; everything a render needs lives in
//! the [`RenderContext`].

mod colorful;
mod json;
mod logfmt;
mod plain;
mod text;

pub use colorful::{ColorfulPainter, MESSAGE_MIN_WIDTH};
pub use json::JsonPainter;
pub use logfmt::LogfmtPainter;
pub use plain::PlainPainter;

use crate::core::{Attr, FormatMode, RenderContext, TimeLayout};

/// Prefix written in place of a value whose own serialization failed
pub const ERROR_MARKER: &str = "!ERROR:";

pub trait Painter: Send + Sync {
    fn mode(&self) -> FormatMode;

    fn begin(&self, _ctx: &mut RenderContext) {}

    fn end(&self, _ctx: &mut RenderContext) {}

    fn time(&self, ctx: &mut RenderContext, layout: &TimeLayout, utc: bool);

    /// `width` is the longest logger name seen so far
    fn logger_name(&self, ctx: &mut RenderContext, name: &str, width: usize);

    fn level(&self, ctx: &mut RenderContext);

    fn message(&self, ctx: &mut RenderContext, message: &str);

    fn attr(&self, ctx: &mut RenderContext, attr: &Attr);

    fn caller(&self, ctx: &mut RenderContext, file: &str, line: u32, function: &str);

    /// Message lines held back by [`Painter::message`]
    fn deferred(&self, _ctx: &mut RenderContext) {}
}

static JSON: JsonPainter = JsonPainter;
static LOGFMT: LogfmtPainter = LogfmtPainter;
static COLORFUL: ColorfulPainter = ColorfulPainter;
static PLAIN: PlainPainter = PlainPainter;

/// The painter for `mode`
pub fn painter_for(mode: FormatMode) -> &'static dyn Painter {
    match mode {
        FormatMode::Json => &JSON,
        FormatMode::Logfmt => &LOGFMT,
        FormatMode::Colorful => &COLORFUL,
        FormatMode::Plain => &PLAIN,
    }
}
