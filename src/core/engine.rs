//! Engine: the explicit process-wide context
//!
//! An [`Engine`] owns the root logger and everything its nodes share: the
//! default router, the render pool, the path redactor, the escalation flags,
//! the longest logger name and the metrics. Build one with
//! [`Engine::builder`] or [`Engine::from_config`].
//!
//! A default engine is created on first use of [`default_engine`]. The free
//! functions at the bottom of this module log through the default logger,
//! which [`set_default`] replaces.

use super::attr::Arg;
use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::logger::{Logger, NodeConfig};
use super::metrics::LoggerMetrics;
use super::output_format::{ColorMode, FormatMode};
use super::redact::Redactor;
use super::render_context::{RenderPool, DEFAULT_POOL_SIZE};
use super::router::Router;
use super::sink::{shared, SharedSink};
use super::timestamp::TimeLayout;
use crate::sinks::ConsoleSink;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Exit status used when a Fatal record terminates the process
pub const FATAL_EXIT_CODE: i32 = 70;

/// Control flow owed by a record after it has been written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escalation {
    /// Panic with the record's message
    Panic(String),
    /// Terminate the process with the given status
    Exit(i32),
}

impl Escalation {
    /// Escalation for `level`; treat-as mappings only affect filtering
    pub fn for_level(level: LogLevel, message: &str) -> Option<Self> {
        match level {
            LogLevel::PANIC => Some(Escalation::Panic(message.to_string())),
            LogLevel::FATAL => Some(Escalation::Exit(FATAL_EXIT_CODE)),
            _ => None,
        }
    }
}

/// State shared by every node of one engine
pub(crate) struct EngineState {
    router: RwLock<Arc<Router>>,
    redactor: RwLock<Arc<Redactor>>,
    pub(crate) pool: RenderPool,
    pub(crate) metrics: LoggerMetrics,
    name_width: AtomicUsize,
    collect_recursive: AtomicBool,
    no_interrupt: AtomicBool,
    testing: AtomicBool,
    strict_lock: bool,
}

impl EngineState {
    pub(crate) fn router(&self) -> Arc<Router> {
        self.router.read().clone()
    }

    pub(crate) fn redactor(&self) -> Arc<Redactor> {
        self.redactor.read().clone()
    }

    pub(crate) fn note_name(&self, name: &str) {
        self.name_width
            .fetch_max(name.chars().count(), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn name_width(&self) -> usize {
        self.name_width.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn collect_recursive(&self) -> bool {
        self.collect_recursive.load(Ordering::Relaxed)
    }

    fn suppresses_escalation(&self) -> bool {
        self.testing.load(Ordering::Relaxed) || self.no_interrupt.load(Ordering::Relaxed)
    }

    /// Act on an escalation, unless testing or no-interrupt is set
    pub(crate) fn escalate(&self, escalation: Escalation) {
        if self.suppresses_escalation() {
            self.metrics.record_escalation_suppressed();
            return;
        }
        match escalation {
            Escalation::Panic(message) => panic!("{}", message),
            Escalation::Exit(code) => {
                if let Err(e) = self.router().flush() {
                    eprintln!("[LOGGER ERROR] Failed to flush before exit: {}", e);
                }
                std::process::exit(code);
            }
        }
    }
}

pub struct Engine {
    state: Arc<EngineState>,
    root: Logger,
}

impl Engine {
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Build an engine from a deserialized configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Ok(EngineBuilder::from_config(config)?.build())
    }

    pub fn root(&self) -> &Logger {
        &self.root
    }

    /// Create or fetch a child of the root
    pub fn logger(&self, name: &str) -> Logger {
        self.root.child(name)
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.state.metrics
    }

    pub fn pool(&self) -> &RenderPool {
        &self.state.pool
    }

    /// Router used by nodes without bound sinks
    pub fn router(&self) -> Arc<Router> {
        self.state.router()
    }

    pub fn set_router(&self, router: Router) {
        let router = if self.state.strict_lock && !router.is_strict() {
            router.strict(true)
        } else {
            router
        };
        *self.state.router.write() = Arc::new(router);
    }

    pub fn redactor(&self) -> Arc<Redactor> {
        self.state.redactor()
    }

    pub fn set_redactor(&self, redactor: Redactor) {
        *self.state.redactor.write() = Arc::new(redactor);
    }

    pub fn collect_recursive(&self) -> bool {
        self.state.collect_recursive()
    }

    /// Merge ancestor attributes into every render
    pub fn set_collect_recursive(&self, on: bool) {
        self.state.collect_recursive.store(on, Ordering::Relaxed);
    }

    pub fn set_no_interrupt(&self, on: bool) {
        self.state.no_interrupt.store(on, Ordering::Relaxed);
    }

    pub fn set_testing(&self, on: bool) {
        self.state.testing.store(on, Ordering::Relaxed);
    }

    pub fn is_strict(&self) -> bool {
        self.state.strict_lock
    }

    /// Width the colorful painter pads logger names to
    pub fn name_width(&self) -> usize {
        self.state.name_width()
    }

    /// Fire `escalation` with this engine's suppression rules
    pub fn escalate(&self, escalation: Escalation) {
        self.state.escalate(escalation);
    }

    /// Flush every sink reachable from the root
    pub fn flush(&self) -> Result<()> {
        self.root.flush()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("root", &self.root.name())
            .field("router", &*self.state.router.read())
            .field("collect_recursive", &self.collect_recursive())
            .field("strict_lock", &self.state.strict_lock)
            .finish()
    }
}

/// One redaction rule in an [`EngineConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactRule {
    pub pattern: String,
    pub alias: String,
}

/// Serializable engine configuration
///
/// Every field has a default, so a partial document is enough:
///
/// ```
/// use rust_structured_logger::core::{EngineConfig, FormatMode, LogLevel};
///
/// let config = EngineConfig::from_json(r#"{"format": "json", "level": "debug"}"#).unwrap();
/// assert_eq!(config.format, FormatMode::Json);
/// assert_eq!(config.level, LogLevel::DEBUG);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub name: String,
    pub level: LogLevel,
    pub format: FormatMode,
    pub color: ColorMode,
    pub utc: bool,
    pub time_layout: TimeLayout,
    pub caller: bool,
    pub collect_recursive: bool,
    pub no_interrupt: bool,
    pub testing: bool,
    pub strict_lock: bool,
    pub pool_size: usize,
    /// Rewrite the working and home directories in caller paths
    pub redact_env_paths: bool,
    pub redact_rules: Vec<RedactRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: LogLevel::INFO,
            format: FormatMode::default(),
            color: ColorMode::default(),
            utc: true,
            time_layout: TimeLayout::default(),
            caller: false,
            collect_recursive: false,
            no_interrupt: false,
            testing: false,
            strict_lock: cfg!(feature = "strict-lock"),
            pool_size: DEFAULT_POOL_SIZE,
            redact_env_paths: true,
            redact_rules: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation("reading engine config", path.display().to_string(), e)
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(LoggerError::config("EngineConfig", "pool_size must be at least 1"));
        }
        if !self.level.is_registered() {
            return Err(LoggerError::config(
                "EngineConfig",
                format!("level {} is not registered", self.level),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing an [`Engine`] with a fluent API
///
/// # Example
/// ```
/// use rust_structured_logger::prelude::*;
///
/// let capture = MemorySink::new();
/// let engine = Engine::builder()
///     .name("api")
///     .format(FormatMode::Json)
///     .level(LogLevel::DEBUG)
///     .sink(shared(capture.clone()))
///     .build();
///
/// engine.root().debug("ready", &args!["port", 8080]);
/// assert!(capture.contents().contains(r#""port":8080"#));
/// ```
pub struct EngineBuilder {
    name: String,
    node: NodeConfig,
    router: Option<Router>,
    sinks: Vec<SharedSink>,
    redactor: Option<Redactor>,
    collect_recursive: bool,
    no_interrupt: bool,
    testing: bool,
    strict_lock: bool,
    pool_size: usize,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            node: NodeConfig::default(),
            router: None,
            sinks: Vec::new(),
            redactor: None,
            collect_recursive: false,
            no_interrupt: false,
            testing: cfg!(test),
            strict_lock: cfg!(feature = "strict-lock"),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    /// Builder preloaded from `config`; fails on an invalid config or redaction pattern
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut redactor = if config.redact_env_paths {
            Redactor::from_env()
        } else {
            Redactor::empty()
        };
        for rule in &config.redact_rules {
            redactor = redactor.with_rule(&rule.pattern, rule.alias.clone())?;
        }

        Ok(Self::new()
            .name(config.name.clone())
            .level(config.level)
            .format(config.format)
            .color_mode(config.color)
            .utc(config.utc)
            .time_layout(config.time_layout.clone())
            .caller(config.caller)
            .collect_recursive(config.collect_recursive)
            .no_interrupt(config.no_interrupt)
            .testing(config.testing)
            .strict_lock(config.strict_lock)
            .pool_size(config.pool_size)
            .redactor(redactor))
    }

    /// Name of the root logger; empty names are left out of the output
    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.node.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn format(mut self, mode: FormatMode) -> Self {
        self.node.format = mode;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.node.color = mode;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn utc(mut self, on: bool) -> Self {
        self.node.utc = on;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn time_layout(mut self, layout: TimeLayout) -> Self {
        self.node.time_layout = layout;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn caller(mut self, on: bool) -> Self {
        self.node.caller = on;
        self
    }

    /// Add a sink that receives every level
    ///
    /// Ignored when a router is set. Without sinks or a router, normal
    /// levels go to stdout and error-stream levels to stderr.
    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: SharedSink) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Defaults to the working and home directories of the process
    #[must_use = "builder methods return a new value"]
    pub fn redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = Some(redactor);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn collect_recursive(mut self, on: bool) -> Self {
        self.collect_recursive = on;
        self
    }

    /// Suppress Panic and Fatal escalations
    #[must_use = "builder methods return a new value"]
    pub fn no_interrupt(mut self, on: bool) -> Self {
        self.no_interrupt = on;
        self
    }

    /// Mark the engine as running under test, which also suppresses escalations
    #[must_use = "builder methods return a new value"]
    pub fn testing(mut self, on: bool) -> Self {
        self.testing = on;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn strict_lock(mut self, on: bool) -> Self {
        self.strict_lock = on;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    pub fn build(self) -> Engine {
        let router = match self.router {
            Some(router) => router,
            None if self.sinks.is_empty() => Router::new()
                .normal(shared(ConsoleSink::stdout()))
                .error(shared(ConsoleSink::stderr())),
            None => Router::single(self.sinks),
        };
        let router = if self.strict_lock && !router.is_strict() {
            router.strict(true)
        } else {
            router
        };

        let state = Arc::new(EngineState {
            router: RwLock::new(Arc::new(router)),
            redactor: RwLock::new(Arc::new(self.redactor.unwrap_or_else(Redactor::from_env))),
            pool: RenderPool::new(self.pool_size),
            metrics: LoggerMetrics::new(),
            name_width: AtomicUsize::new(0),
            collect_recursive: AtomicBool::new(self.collect_recursive),
            no_interrupt: AtomicBool::new(self.no_interrupt),
            testing: AtomicBool::new(self.testing),
            strict_lock: self.strict_lock,
        });
        let root = Logger::new_root(self.name, self.node, Arc::clone(&state));
        Engine { state, root }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_ENGINE: Lazy<Engine> = Lazy::new(|| Engine::builder().build());

static DEFAULT_LOGGER: Lazy<RwLock<Logger>> =
    Lazy::new(|| RwLock::new(DEFAULT_ENGINE.root().clone()));

/// The process-wide engine, created on first use
pub fn default_engine() -> &'static Engine {
    &DEFAULT_ENGINE
}

/// Logger used by the free functions and the logger-less macros
pub fn default_logger() -> Logger {
    DEFAULT_LOGGER.read().clone()
}

/// Replace the default logger, returning the previous one
pub fn set_default(logger: Logger) -> Logger {
    std::mem::replace(&mut *DEFAULT_LOGGER.write(), logger)
}

#[track_caller]
pub fn log(level: LogLevel, message: impl AsRef<str>, args: &[Arg]) {
    default_logger().log(level, message, args);
}

#[track_caller]
pub fn panic(message: impl AsRef<str>, args: &[Arg]) {
    default_logger().panic(message, args);
}

#[track_caller]
pub fn fatal(message: impl AsRef<str>, args: &[Arg]) {
    default_logger().fatal(message, args);
}

#[track_caller]
pub fn error(message: impl AsRef<str>, args: &[Arg]) {
    default_logger().error(message, args);
}

#[track_caller]
pub fn warn(message: impl AsRef<str>, args: &[Arg]) {
    default_logger().warn(message, args);
}

#[track_caller]
pub fn info(message: impl AsRef<str>, args: &[Arg]) {
    default_logger().info(message, args);
}

#[track_caller]
pub fn debug(message: impl AsRef<str>, args: &[Arg]) {
    default_logger().debug(message, args);
}

#[track_caller]
pub fn trace(message: impl AsRef<str>, args: &[Arg]) {
    default_logger().trace(message, args);
}

#[track_caller]
pub fn print(message: impl AsRef<str>, args: &[Arg]) {
    default_logger().print(message, args);
}

#[track_caller]
pub fn ok(message: impl AsRef<str>, args: &[Arg]) {
    default_logger().ok(message, args);
}

#[track_caller]
pub fn success(message: impl AsRef<str>, args: &[Arg]) {
    default_logger().success(message, args);
}

#[track_caller]
pub fn fail(message: impl AsRef<str>, args: &[Arg]) {
    default_logger().fail(message, args);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::sinks::MemorySink;

    fn capture_engine(sink: &MemorySink) -> Engine {
        Engine::builder()
            .format(FormatMode::Logfmt)
            .testing(true)
            .sink(shared(sink.clone()))
            .build()
    }

    #[test]
    fn test_builder_defaults() {
        let engine = Engine::builder().build();
        assert_eq!(engine.root().level(), LogLevel::INFO);
        assert_eq!(engine.root().format(), FormatMode::Colorful);
        assert!(!engine.collect_recursive());
        assert!(!engine.router().is_empty());
    }

    #[test]
    fn test_escalation_for_level() {
        assert_eq!(
            Escalation::for_level(LogLevel::PANIC, "boom"),
            Some(Escalation::Panic("boom".into()))
        );
        assert_eq!(
            Escalation::for_level(LogLevel::FATAL, "down"),
            Some(Escalation::Exit(FATAL_EXIT_CODE))
        );
        assert_eq!(Escalation::for_level(LogLevel::ERROR, "e"), None);
    }

    #[test]
    fn test_treat_as_does_not_escalate() {
        use crate::core::log_level::{LevelOptions, LevelRegistry};

        let critical = LevelRegistry::global()
            .register(90, "critical", LevelOptions::new().treat_as(LogLevel::FATAL))
            .unwrap();
        let halt = LevelRegistry::global()
            .register(91, "halt", LevelOptions::new().treat_as(LogLevel::PANIC))
            .unwrap();
        assert_eq!(Escalation::for_level(critical, "c"), None);
        assert_eq!(Escalation::for_level(halt, "h"), None);

        let sink = MemorySink::new();
        let engine = capture_engine(&sink);
        assert_eq!(engine.root().emit(critical, "filtered like fatal", &[], None), None);
        assert_eq!(sink.lines().len(), 1);
        assert_eq!(engine.metrics().escalations_suppressed(), 0);
    }

    #[test]
    fn test_escalations_suppressed_under_testing() {
        let sink = MemorySink::new();
        let engine = capture_engine(&sink);
        engine.root().panic("boom", &[]);
        engine.root().fatal("down", &[]);
        assert_eq!(sink.lines().len(), 2);
        assert_eq!(engine.metrics().escalations_suppressed(), 2);
    }

    #[test]
    fn test_escalation_fires_when_filtered() {
        let sink = MemorySink::new();
        let engine = capture_engine(&sink);
        engine.root().set_level(LogLevel::OFF);
        engine.root().panic("quiet", &[]);
        assert!(sink.is_empty());
        assert_eq!(engine.metrics().escalations_suppressed(), 1);
    }

    #[test]
    fn test_panic_after_write_when_not_suppressed() {
        let sink = MemorySink::new();
        let engine = Engine::builder()
            .format(FormatMode::Plain)
            .testing(false)
            .sink(shared(sink.clone()))
            .build();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            engine.root().panic("really bad", &[]);
        }));
        assert!(result.is_err());
        assert!(sink.contents().contains("really bad"));
        // the context went back to the pool before the panic
        assert_eq!(engine.pool().idle(), 1);
    }

    #[test]
    fn test_name_width_tracks_longest() {
        let engine = Engine::builder().name("app").testing(true).build();
        assert_eq!(engine.name_width(), 3);
        engine.logger("scheduler");
        engine.logger("db");
        assert_eq!(engine.name_width(), 9);
    }

    #[test]
    fn test_sink_failure_reported_as_warn() {
        let good = MemorySink::named("good");
        let bad = MemorySink::named("bad");
        bad.set_failing(true);
        let engine = Engine::builder()
            .format(FormatMode::Logfmt)
            .testing(true)
            .router(Router::new().normal(shared(bad.clone())).error(shared(good.clone())))
            .build();

        engine.root().info("payload", &[]);
        let lines = good.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("level=warn"));
        assert!(lines[0].contains("sink=bad"));
        assert_eq!(engine.metrics().write_failures(), 1);
    }

    #[test]
    fn test_failed_warn_is_not_reported_again() {
        let bad = MemorySink::named("bad");
        bad.set_failing(true);
        let engine = Engine::builder()
            .testing(true)
            .sink(shared(bad.clone()))
            .build();
        engine.root().error("first", &[]);
        // error fails, the warn report fails too and stops there
        assert_eq!(engine.metrics().write_failures(), 2);
    }

    #[test]
    fn test_config_round_trip() {
        let config = EngineConfig::from_json(
            r#"{
                "name": "svc",
                "format": "logfmt",
                "level": "trace",
                "collect_recursive": true,
                "testing": true,
                "redact_env_paths": false,
                "redact_rules": [{"pattern": "^/srv/app", "alias": "<app>"}]
            }"#,
        )
        .unwrap();
        assert_eq!(config.time_layout, TimeLayout::Iso8601Nanos);

        let engine = Engine::from_config(&config).unwrap();
        assert_eq!(engine.root().name(), "svc");
        assert_eq!(engine.root().level(), LogLevel::TRACE);
        assert!(engine.collect_recursive());
        assert_eq!(engine.redactor().redact("/srv/app/main.rs"), "<app>/main.rs");
    }

    #[test]
    fn test_config_rejects_bad_pattern() {
        let config = EngineConfig {
            redact_rules: vec![RedactRule {
                pattern: "(".into(),
                alias: "x".into(),
            }],
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::from_config(&config),
            Err(LoggerError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let config = EngineConfig {
            pool_size: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_strict_lock_wraps_router() {
        let engine = Engine::builder().strict_lock(true).testing(true).build();
        assert!(engine.router().is_strict());
        engine.set_router(Router::new());
        assert!(engine.router().is_strict());
    }

    #[test]
    fn test_set_default_swaps_logger() {
        let sink = MemorySink::new();
        let engine = capture_engine(&sink);
        let previous = set_default(engine.logger("swapped"));
        info("through default", &args!["n", 1]);
        set_default(previous);
        assert!(sink.contents().contains("logger=swapped"));
        assert!(sink.contents().contains("n=1"));
    }
}
