//! Pooled per-render state
//!
//! A [`RenderContext`] is checked out of a [`RenderPool`] for exactly one
//! render. The [`PooledContext`] guard resets it and hands it back when it
//! goes out of scope, including during unwinding, so no bytes or attributes
//! survive into the next checkout.

use super::attr::{self, Arg, Attr, Attrs, KeyIndex};
use super::buffer::Buffer;
use super::caller::Caller;
use super::log_level::{LevelRegistry, LogLevel, DEFAULT_TAG_WIDTH};
use super::output_format::FormatMode;
use super::render::Record;
use chrono::{DateTime, Utc};
use colored::Color;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::borrow::Cow;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Contexts kept idle by a pool created with [`RenderPool::default`]
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Contexts whose buffer grew past this are dropped instead of pooled
pub const MAX_POOLED_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Default)]
pub struct RenderContext {
    pub(crate) buf: Buffer,
    pub(crate) level: LogLevel,
    pub(crate) mode: FormatMode,
    pub(crate) title: Cow<'static, str>,
    pub(crate) tag: Cow<'static, str>,
    pub(crate) fg: Option<Color>,
    pub(crate) bg: Option<Color>,
    pub(crate) time: DateTime<Utc>,
    pub(crate) logger: String,
    pub(crate) message: String,
    pub(crate) caller: Option<Caller>,
    /// Resolved attributes for this render, de-duplicated through `index`
    pub(crate) attrs: Attrs,
    pub(crate) index: KeyIndex,
    /// Dotted path of the groups being flattened
    pub(crate) key_prefix: String,
    /// Message lines after the first, written at the end of the record
    pub(crate) deferred: String,
    pub(crate) fields: usize,
}

impl RenderContext {
    pub fn new() -> Self {
        Self {
            buf: Buffer::new(),
            ..Self::default()
        }
    }

    /// Reset and load the per-call state for `record`
    pub fn set(&mut self, record: &Record<'_>, mode: FormatMode, colors: bool) {
        self.reset();
        self.level = record.level;
        self.mode = mode;
        self.time = record.time;
        self.logger.push_str(record.logger);
        self.message.push_str(record.message);
        self.caller = record.caller.clone();

        let registry = LevelRegistry::global();
        match registry.info(record.level) {
            Some(info) => {
                self.title = Cow::Borrowed(info.title);
                self.tag = Cow::Borrowed(info.tag(DEFAULT_TAG_WIDTH));
                if colors {
                    self.fg = info.fg;
                    self.bg = info.bg;
                }
            }
            None => {
                self.title = Cow::Owned(registry.title(record.level));
                self.tag = Cow::Owned(registry.short_tag(record.level, DEFAULT_TAG_WIDTH));
            }
        }
    }

    /// Clear everything while keeping allocations
    pub fn reset(&mut self) {
        self.buf.reset();
        self.level = LogLevel::default();
        self.mode = FormatMode::default();
        self.title = Cow::Borrowed("");
        self.tag = Cow::Borrowed("");
        self.fg = None;
        self.bg = None;
        self.time = DateTime::<Utc>::default();
        self.logger.clear();
        self.message.clear();
        self.caller = None;
        self.attrs.clear();
        self.index.clear();
        self.key_prefix.clear();
        self.deferred.clear();
        self.fields = 0;
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[inline]
    pub fn mode(&self) -> FormatMode {
        self.mode
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buf
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Merge built attributes into this render, last value wins per key
    pub fn merge_attrs(&mut self, attrs: &[Attr]) {
        attr::merge_attrs(&mut self.attrs, &mut self.index, attrs);
    }

    /// Parse and merge an argument list into this render
    pub fn merge_args(&mut self, args: &[Arg]) {
        attr::merge_args(&mut self.attrs, &mut self.index, args);
    }

    /// Write `sep` unless this is the first top-level field
    #[inline]
    pub(crate) fn next_field(&mut self, sep: u8) {
        if self.fields > 0 {
            self.buf.push_byte(sep);
        }
        self.fields += 1;
    }

    /// Enter a group while flattening; returns the length to restore
    pub(crate) fn push_prefix(&mut self, key: &str) -> usize {
        let saved = self.key_prefix.len();
        self.key_prefix.push_str(key);
        self.key_prefix.push('.');
        saved
    }

    pub(crate) fn pop_prefix(&mut self, saved: usize) {
        self.key_prefix.truncate(saved);
    }
}

/// Free list of render contexts
#[derive(Debug)]
pub struct RenderPool {
    sender: Sender<RenderContext>,
    receiver: Receiver<RenderContext>,
    created: AtomicUsize,
}

impl RenderPool {
    /// Pool that keeps at most `size` idle contexts
    pub fn new(size: usize) -> Self {
        let (sender, receiver) = bounded(size.max(1));
        Self {
            sender,
            receiver,
            created: AtomicUsize::new(0),
        }
    }

    /// Take an idle context, or create one when the pool is empty
    pub fn checkout(&self) -> PooledContext<'_> {
        let ctx = match self.receiver.try_recv() {
            Ok(ctx) => ctx,
            Err(_) => {
                self.created.fetch_add(1, Ordering::Relaxed);
                RenderContext::new()
            }
        };
        PooledContext { ctx, pool: self }
    }

    /// Contexts currently waiting in the pool
    pub fn idle(&self) -> usize {
        self.receiver.len()
    }

    /// Contexts allocated over the pool's lifetime
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    fn release(&self, mut ctx: RenderContext) {
        if ctx.buf.capacity() > MAX_POOLED_CAPACITY {
            return;
        }
        ctx.reset();
        // a full pool just drops the surplus context
        let _ = self.sender.try_send(ctx);
    }
}

impl Default for RenderPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

/// Exclusive checkout of a [`RenderContext`], returned to its pool on drop
pub struct PooledContext<'a> {
    ctx: RenderContext,
    pool: &'a RenderPool,
}

impl Deref for PooledContext<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &RenderContext {
        &self.ctx
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut RenderContext {
        &mut self.ctx
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.ctx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record<'a>(message: &'a str) -> Record<'a> {
        Record::new(LogLevel::INFO, "app", message)
    }

    #[test]
    fn test_set_loads_record() {
        let mut ctx = RenderContext::new();
        ctx.set(&record("hello"), FormatMode::Json, false);
        assert_eq!(ctx.level(), LogLevel::INFO);
        assert_eq!(ctx.title, "info");
        assert_eq!(ctx.tag, "INF");
        assert_eq!(ctx.logger, "app");
        assert_eq!(ctx.message, "hello");
        assert!(ctx.fg.is_none());
    }

    #[test]
    fn test_set_with_colors() {
        let mut ctx = RenderContext::new();
        ctx.set(&record("x"), FormatMode::Colorful, true);
        assert_eq!(ctx.fg, Some(Color::Green));
    }

    #[test]
    fn test_set_clears_previous_state() {
        let mut ctx = RenderContext::new();
        ctx.set(&record("first"), FormatMode::Plain, false);
        ctx.buf.push_str("leftover");
        ctx.deferred.push_str("more");
        ctx.set(&record("second"), FormatMode::Plain, false);
        assert!(ctx.bytes().is_empty());
        assert!(ctx.deferred.is_empty());
        assert_eq!(ctx.message, "second");
    }

    #[test]
    fn test_pool_reuses_contexts() {
        let pool = RenderPool::new(4);
        {
            let mut ctx = pool.checkout();
            ctx.buf.push_str("secret");
        }
        assert_eq!(pool.idle(), 1);
        let ctx = pool.checkout();
        assert!(ctx.bytes().is_empty());
        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn test_pool_releases_on_panic() {
        let pool = RenderPool::new(4);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut ctx = pool.checkout();
            ctx.buf.push_str("partial");
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_pool_drops_surplus() {
        let pool = RenderPool::new(1);
        let a = pool.checkout();
        let b = pool.checkout();
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.created(), 2);
    }

    #[test]
    fn test_oversized_buffer_not_pooled() {
        let pool = RenderPool::new(2);
        {
            let mut ctx = pool.checkout();
            ctx.buf.pad(MAX_POOLED_CAPACITY + 1);
        }
        assert_eq!(pool.idle(), 0);
    }
}
