//! Log level definitions and the level registry
//!
//! Levels are small signed ordinals. A request at ordinal `R` is allowed by a
//! logger configured at ordinal `C` when `C >= R`, after `R` has been resolved
//! through the registry's treat-as table. `OFF` and `ALWAYS` short-circuit that
//! comparison from either side.
//!
//! Custom levels are registered at runtime on a [`LevelRegistry`]. The
//! process-wide registry behind [`LevelRegistry::global`] backs `Display`,
//! `FromStr` and serde for [`LogLevel`].

use super::error::{LoggerError, Result};
use colored::Color;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

/// Widest short tag the registry stores
pub const MAX_TAG_WIDTH: usize = 5;

/// Tag width used by the colorful and plain painters
pub const DEFAULT_TAG_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogLevel(i32);

impl LogLevel {
    pub const PANIC: LogLevel = LogLevel(0);
    pub const FATAL: LogLevel = LogLevel(1);
    pub const ERROR: LogLevel = LogLevel(2);
    pub const WARN: LogLevel = LogLevel(3);
    pub const INFO: LogLevel = LogLevel(4);
    pub const DEBUG: LogLevel = LogLevel(5);
    pub const TRACE: LogLevel = LogLevel(6);
    /// Disables everything
    pub const OFF: LogLevel = LogLevel(7);
    /// Enables everything
    pub const ALWAYS: LogLevel = LogLevel(8);
    pub const OK: LogLevel = LogLevel(9);
    pub const SUCCESS: LogLevel = LogLevel(10);
    pub const FAIL: LogLevel = LogLevel(11);

    pub const BUILTIN: [LogLevel; 12] = [
        LogLevel::PANIC,
        LogLevel::FATAL,
        LogLevel::ERROR,
        LogLevel::WARN,
        LogLevel::INFO,
        LogLevel::DEBUG,
        LogLevel::TRACE,
        LogLevel::OFF,
        LogLevel::ALWAYS,
        LogLevel::OK,
        LogLevel::SUCCESS,
        LogLevel::FAIL,
    ];

    #[inline]
    pub const fn from_i32(value: i32) -> Self {
        LogLevel(value)
    }

    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Title of this level in the global registry
    pub fn to_str(&self) -> &'static str {
        LevelRegistry::global()
            .info(*self)
            .map(|info| info.title)
            .unwrap_or("")
    }

    /// Foreground color registered for this level, if any
    pub fn color_code(&self) -> Option<Color> {
        LevelRegistry::global().info(*self).and_then(|info| info.fg)
    }

    pub fn is_registered(&self) -> bool {
        LevelRegistry::global().info(*self).is_some()
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::INFO
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match LevelRegistry::global().info(*self) {
            Some(info) => f.write_str(info.title),
            None => write!(f, "Level({})", self.0),
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        LevelRegistry::global().parse(s)
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Everything the registry knows about one level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub level: LogLevel,
    pub title: &'static str,
    /// Short tags indexed by `width - 1`
    pub tags: [&'static str; MAX_TAG_WIDTH],
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub treat_as: Option<LogLevel>,
    pub error_stream: bool,
}

impl LevelInfo {
    pub fn tag(&self, width: usize) -> &'static str {
        self.tags[width.clamp(1, MAX_TAG_WIDTH) - 1]
    }
}

/// Optional settings for [`LevelRegistry::register`]
///
/// # Example
///
/// ```
/// use rust_structured_logger::core::{LevelOptions, LogLevel};
/// use colored::Color;
///
/// let opts = LevelOptions::new()
///     .short_tag(3, "NTC")
///     .colors(Color::Cyan, None)
///     .treat_as(LogLevel::INFO);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LevelOptions {
    tags: [Option<String>; MAX_TAG_WIDTH],
    fg: Option<Color>,
    bg: Option<Color>,
    treat_as: Option<LogLevel>,
    error_stream: bool,
}

impl LevelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tag shown when the painter asks for `width` characters
    #[must_use]
    pub fn short_tag(mut self, width: usize, tag: impl Into<String>) -> Self {
        if (1..=MAX_TAG_WIDTH).contains(&width) {
            self.tags[width - 1] = Some(tag.into());
        }
        self
    }

    #[must_use]
    pub fn colors(mut self, fg: Color, bg: Option<Color>) -> Self {
        self.fg = Some(fg);
        self.bg = bg;
        self
    }

    /// Builtin level used for threshold comparison
    #[must_use]
    pub fn treat_as(mut self, level: LogLevel) -> Self {
        self.treat_as = Some(level);
        self
    }

    /// Route this level to the error sinks
    #[must_use]
    pub fn error_stream(mut self, on: bool) -> Self {
        self.error_stream = on;
        self
    }
}

type BuiltinRow = (LogLevel, &'static str, [&'static str; MAX_TAG_WIDTH], Color, Option<LogLevel>, bool);

const BUILTINS: [BuiltinRow; 12] = [
    (LogLevel::PANIC, "panic", ["P", "PN", "PNC", "PANC", "PANIC"], Color::BrightMagenta, None, true),
    (LogLevel::FATAL, "fatal", ["F", "FT", "FTL", "FATL", "FATAL"], Color::BrightRed, None, true),
    (LogLevel::ERROR, "error", ["E", "ER", "ERR", "ERRO", "ERROR"], Color::Red, None, true),
    (LogLevel::WARN, "warn", ["W", "WN", "WRN", "WARN", "WARN "], Color::Yellow, None, true),
    (LogLevel::INFO, "info", ["I", "IN", "INF", "INFO", "INFO "], Color::Green, None, false),
    (LogLevel::DEBUG, "debug", ["D", "DB", "DBG", "DEBG", "DEBUG"], Color::Blue, None, false),
    (LogLevel::TRACE, "trace", ["T", "TR", "TRC", "TRCE", "TRACE"], Color::BrightBlack, None, false),
    (LogLevel::OFF, "off", ["O", "OF", "OFF", "OFF ", "OFF  "], Color::White, None, false),
    (LogLevel::ALWAYS, "always", ["A", "AL", "ANY", "ALWY", "ALWYS"], Color::White, None, false),
    (LogLevel::OK, "ok", ["K", "OK", "OK ", "OK  ", "OK   "], Color::Green, Some(LogLevel::INFO), false),
    (LogLevel::SUCCESS, "success", ["S", "SC", "SUC", "SUCC", "SUCCS"], Color::BrightGreen, Some(LogLevel::INFO), false),
    (LogLevel::FAIL, "fail", ["F", "FL", "FAI", "FAIL", "FAIL "], Color::Red, Some(LogLevel::ERROR), true),
];

#[derive(Debug, Default)]
struct RegistryTable {
    by_value: HashMap<i32, LevelInfo>,
    by_title: HashMap<String, LogLevel>,
}

/// Append-only table of known levels
///
/// Registered titles and tags are interned for the life of the process so that
/// rendering never has to hold the registry lock.
#[derive(Debug)]
pub struct LevelRegistry {
    table: RwLock<RegistryTable>,
    debug_mode: AtomicBool,
}

static GLOBAL_REGISTRY: Lazy<LevelRegistry> = Lazy::new(LevelRegistry::new);

impl LevelRegistry {
    /// Create a registry holding only the builtin levels
    pub fn new() -> Self {
        let mut table = RegistryTable::default();
        for (level, title, tags, fg, treat_as, error_stream) in BUILTINS {
            table.by_value.insert(
                level.0,
                LevelInfo {
                    level,
                    title,
                    tags,
                    fg: Some(fg),
                    bg: None,
                    treat_as,
                    error_stream,
                },
            );
            table.by_title.insert(title.to_string(), level);
        }
        // accepted on input, never printed
        table.by_title.insert("warning".to_string(), LogLevel::WARN);

        Self {
            table: RwLock::new(table),
            debug_mode: AtomicBool::new(false),
        }
    }

    /// The process-wide registry, initialized on first use
    pub fn global() -> &'static LevelRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register a custom level
    ///
    /// Fails without side effects when `value` or `title` collides with an
    /// existing entry. Titles compare case-insensitively.
    pub fn register(&self, value: i32, title: &str, opts: LevelOptions) -> Result<LogLevel> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LoggerError::config("LevelRegistry", "level title is empty"));
        }
        for tag in opts.tags.iter().flatten() {
            let len = tag.chars().count();
            if len == 0 || len > MAX_TAG_WIDTH {
                return Err(LoggerError::config(
                    "LevelRegistry",
                    format!("short tag '{}' must be 1..={} characters", tag, MAX_TAG_WIDTH),
                ));
            }
        }

        let mut table = self.table.write();
        if let Some(existing) = table.by_value.get(&value) {
            return Err(LoggerError::duplicate_value(value, existing.title));
        }
        let key = title.to_lowercase();
        if table.by_title.contains_key(&key) {
            return Err(LoggerError::duplicate_title(title));
        }

        let level = LogLevel(value);
        let title: &'static str = Box::leak(title.to_string().into_boxed_str());
        let mut tags = [""; MAX_TAG_WIDTH];
        for (idx, slot) in tags.iter_mut().enumerate() {
            let tag = match &opts.tags[idx] {
                Some(tag) => tag.clone(),
                None => derive_tag(title, idx + 1),
            };
            *slot = Box::leak(tag.into_boxed_str());
        }

        table.by_value.insert(
            value,
            LevelInfo {
                level,
                title,
                tags,
                fg: opts.fg,
                bg: opts.bg,
                treat_as: opts.treat_as,
                error_stream: opts.error_stream,
            },
        );
        table.by_title.insert(key, level);
        Ok(level)
    }

    pub fn info(&self, level: LogLevel) -> Option<LevelInfo> {
        self.table.read().by_value.get(&level.0).copied()
    }

    /// Resolve a level through the treat-as table
    pub fn resolve(&self, level: LogLevel) -> LogLevel {
        self.info(level).and_then(|info| info.treat_as).unwrap_or(level)
    }

    /// Whether a logger at `current` lets a `requested` record through
    pub fn enabled(&self, current: LogLevel, requested: LogLevel) -> bool {
        if current == LogLevel::OFF || requested == LogLevel::OFF {
            return false;
        }
        if current == LogLevel::ALWAYS || requested == LogLevel::ALWAYS {
            return true;
        }
        if requested == LogLevel::DEBUG && self.debug_mode() {
            return true;
        }
        current.0 >= self.resolve(requested).0
    }

    pub fn parse(&self, s: &str) -> Result<LogLevel> {
        self.table
            .read()
            .by_title
            .get(&s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| LoggerError::InvalidLevel(s.to_string()))
    }

    pub fn title(&self, level: LogLevel) -> String {
        match self.info(level) {
            Some(info) => info.title.to_string(),
            None => format!("Level({})", level.0),
        }
    }

    /// Short tag for `level` at `width` (clamped to 1..=5)
    pub fn short_tag(&self, level: LogLevel, width: usize) -> String {
        match self.info(level) {
            Some(info) => info.tag(width).to_string(),
            None => derive_tag(&level.0.to_string(), width.clamp(1, MAX_TAG_WIDTH)),
        }
    }

    pub fn is_error_stream(&self, level: LogLevel) -> bool {
        self.info(level).map(|info| info.error_stream).unwrap_or(false)
    }

    /// When set, Debug requests pass regardless of threshold
    pub fn set_debug_mode(&self, on: bool) {
        self.debug_mode.store(on, Ordering::Relaxed);
    }

    #[inline]
    pub fn debug_mode(&self) -> bool {
        self.debug_mode.load(Ordering::Relaxed)
    }

    pub fn levels(&self) -> Vec<LogLevel> {
        let mut levels: Vec<LogLevel> = self.table.read().by_value.values().map(|i| i.level).collect();
        levels.sort();
        levels
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn derive_tag(title: &str, width: usize) -> String {
    let mut tag: String = title.to_uppercase().chars().take(width).collect();
    while tag.chars().count() < width {
        tag.push(' ');
    }
    tag
}

/// `Enabled` against the global registry
#[inline]
pub fn enabled(current: LogLevel, requested: LogLevel) -> bool {
    LevelRegistry::global().enabled(current, requested)
}

/// Register a custom level on the global registry
pub fn register_level(value: i32, title: &str, opts: LevelOptions) -> Result<LogLevel> {
    LevelRegistry::global().register(value, title, opts)
}

pub fn parse_level(s: &str) -> Result<LogLevel> {
    LevelRegistry::global().parse(s)
}

pub fn short_tag(level: LogLevel, width: usize) -> String {
    LevelRegistry::global().short_tag(level, width)
}
