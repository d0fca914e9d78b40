//! Logger hierarchy
//!
//! A [`Logger`] is a cheap handle to a named node. Nodes own their children
//! (cached by name) and hold a weak link to their parent. Each node carries
//! its own [`NodeConfig`]; a child copies its parent's configuration when it
//! is created and diverges from then on. Bound attributes are not copied.

use super::attr::{merge_args, merge_attrs, put_attr, Arg, Attr, Attrs, KeyIndex};
use super::caller::Caller;
use super::engine::{EngineState, Escalation};
use super::error::Result;
use super::log_context::LogContext;
use super::log_level::{LevelRegistry, LogLevel};
use super::output_format::{ColorMode, FormatMode};
use super::render::{render, Record, RenderOptions};
use super::render_context::RenderContext;
use super::router::{Router, SinkFailure};
use super::sink::SharedSink;
use super::timestamp::TimeLayout;
use crate::painters::painter_for;
use parking_lot::RwLock;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::panic::Location;
use std::sync::{Arc, Weak};

/// Length of the random suffix given to unnamed children
const RANDOM_NAME_LEN: usize = 8;

/// Per-node render configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub format: FormatMode,
    pub color: ColorMode,
    pub utc: bool,
    pub time_layout: TimeLayout,
    pub level: LogLevel,
    /// Own attributes, duplicates preserved until render time
    pub attrs: Attrs,
    /// Bound sinks; `None` writes through the engine's router
    pub router: Option<Arc<Router>>,
    pub context_keys: Vec<String>,
    pub extra_frames: usize,
    pub caller: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            format: FormatMode::default(),
            color: ColorMode::default(),
            utc: true,
            time_layout: TimeLayout::default(),
            level: LogLevel::INFO,
            attrs: Attrs::new(),
            router: None,
            context_keys: Vec::new(),
            extra_frames: 0,
            caller: false,
        }
    }
}

impl NodeConfig {
    /// Configuration handed to a new child
    fn inherit(&self) -> Self {
        Self {
            attrs: Attrs::new(),
            ..self.clone()
        }
    }

    fn apply(&mut self, option: &LoggerOption) {
        match option {
            LoggerOption::Format(mode) => self.format = *mode,
            LoggerOption::Color(mode) => self.color = *mode,
            LoggerOption::Utc(on) => self.utc = *on,
            LoggerOption::TimeLayout(layout) => self.time_layout = layout.clone(),
            LoggerOption::Level(level) => self.level = *level,
            LoggerOption::Attrs(attrs) => self.attrs.extend(attrs.iter().cloned()),
            LoggerOption::Sinks(sinks) => {
                self.router = Some(Arc::new(Router::single(sinks.clone())));
            }
            LoggerOption::Router(router) => self.router = Some(Arc::clone(router)),
            LoggerOption::ContextKeys(keys) => self.context_keys = keys.clone(),
            LoggerOption::ExtraFrames(n) => self.extra_frames = *n,
            LoggerOption::Caller(on) => self.caller = *on,
        }
    }
}

/// One configuration change, applied when a child is created
#[derive(Clone)]
pub enum LoggerOption {
    Format(FormatMode),
    Color(ColorMode),
    Utc(bool),
    TimeLayout(TimeLayout),
    Level(LogLevel),
    Attrs(Attrs),
    Sinks(Vec<SharedSink>),
    Router(Arc<Router>),
    ContextKeys(Vec<String>),
    ExtraFrames(usize),
    Caller(bool),
}

impl fmt::Debug for LoggerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerOption::Format(mode) => f.debug_tuple("Format").field(mode).finish(),
            LoggerOption::Color(mode) => f.debug_tuple("Color").field(mode).finish(),
            LoggerOption::Utc(on) => f.debug_tuple("Utc").field(on).finish(),
            LoggerOption::TimeLayout(layout) => f.debug_tuple("TimeLayout").field(layout).finish(),
            LoggerOption::Level(level) => f.debug_tuple("Level").field(level).finish(),
            LoggerOption::Attrs(attrs) => f.debug_tuple("Attrs").field(attrs).finish(),
            LoggerOption::Sinks(sinks) => f.debug_tuple("Sinks").field(&sinks.len()).finish(),
            LoggerOption::Router(router) => f.debug_tuple("Router").field(router).finish(),
            LoggerOption::ContextKeys(keys) => f.debug_tuple("ContextKeys").field(keys).finish(),
            LoggerOption::ExtraFrames(n) => f.debug_tuple("ExtraFrames").field(n).finish(),
            LoggerOption::Caller(on) => f.debug_tuple("Caller").field(on).finish(),
        }
    }
}

struct Node {
    name: String,
    parent: Weak<Node>,
    children: RwLock<HashMap<String, Logger>>,
    config: RwLock<NodeConfig>,
    engine: Arc<EngineState>,
}

/// Handle to a node of the logger hierarchy
#[derive(Clone)]
pub struct Logger {
    node: Arc<Node>,
}

impl Logger {
    pub(crate) fn new_root(name: impl Into<String>, config: NodeConfig, engine: Arc<EngineState>) -> Self {
        let name = name.into();
        engine.note_name(&name);
        Self {
            node: Arc::new(Node {
                name,
                parent: Weak::new(),
                children: RwLock::new(HashMap::new()),
                config: RwLock::new(config),
                engine,
            }),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn parent(&self) -> Option<Logger> {
        self.node.parent.upgrade().map(|node| Logger { node })
    }

    /// Topmost ancestor, or `self` for a root
    pub fn root(&self) -> Logger {
        let mut current = Arc::clone(&self.node);
        while let Some(parent) = current.parent.upgrade() {
            current = parent;
        }
        Logger { node: current }
    }

    /// Create or fetch the child called `name`
    ///
    /// An empty name is replaced by a random one, so every call creates a new
    /// child.
    pub fn child(&self, name: &str) -> Logger {
        self.child_with(name, &[])
    }

    /// Create or fetch a child; `options` only apply when it is created
    pub fn child_with(&self, name: &str, options: &[LoggerOption]) -> Logger {
        let name = if name.is_empty() {
            random_name()
        } else {
            name.to_string()
        };

        if let Some(existing) = self.node.children.read().get(&name) {
            return existing.clone();
        }

        let mut children = self.node.children.write();
        children
            .entry(name)
            .or_insert_with_key(|name| {
                let mut config = self.node.config.read().inherit();
                for option in options {
                    config.apply(option);
                }
                self.node.engine.note_name(name);
                Logger {
                    node: Arc::new(Node {
                        name: name.clone(),
                        parent: Arc::downgrade(&self.node),
                        children: RwLock::new(HashMap::new()),
                        config: RwLock::new(config),
                        engine: Arc::clone(&self.node.engine),
                    }),
                }
            })
            .clone()
    }

    /// Names of the cached children
    pub fn children(&self) -> Vec<String> {
        let mut names: Vec<String> = self.node.children.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot of this node's configuration
    pub fn config(&self) -> NodeConfig {
        self.node.config.read().clone()
    }

    pub fn level(&self) -> LogLevel {
        self.node.config.read().level
    }

    pub fn format(&self) -> FormatMode {
        self.node.config.read().format
    }

    /// This node's own attributes
    pub fn attrs(&self) -> Attrs {
        self.node.config.read().attrs.clone()
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        LevelRegistry::global().enabled(self.level(), level)
    }

    // set_*: change this node in place

    pub fn set_option(&self, option: LoggerOption) -> &Self {
        self.node.config.write().apply(&option);
        self
    }

    pub fn set_format(&self, mode: FormatMode) -> &Self {
        self.set_option(LoggerOption::Format(mode))
    }

    pub fn set_color_mode(&self, mode: ColorMode) -> &Self {
        self.set_option(LoggerOption::Color(mode))
    }

    pub fn set_utc(&self, on: bool) -> &Self {
        self.set_option(LoggerOption::Utc(on))
    }

    pub fn set_time_layout(&self, layout: TimeLayout) -> &Self {
        self.set_option(LoggerOption::TimeLayout(layout))
    }

    pub fn set_level(&self, level: LogLevel) -> &Self {
        self.set_option(LoggerOption::Level(level))
    }

    /// Append attributes parsed from `args`; duplicates are kept
    pub fn set_attrs(&self, args: &[Arg]) -> &Self {
        self.set_option(LoggerOption::Attrs(super::attr::build_attrs(args)))
    }

    /// Bind the same sinks for every level
    pub fn set_sinks(&self, sinks: Vec<SharedSink>) -> &Self {
        self.set_option(LoggerOption::Sinks(sinks))
    }

    pub fn set_router(&self, router: Router) -> &Self {
        self.set_option(LoggerOption::Router(Arc::new(router)))
    }

    /// Keys pulled out of a [`LogContext`] by the `*_ctx` methods
    pub fn set_context_keys<S: Into<String>>(&self, keys: impl IntoIterator<Item = S>) -> &Self {
        self.set_option(LoggerOption::ContextKeys(keys.into_iter().map(Into::into).collect()))
    }

    /// Frames to skip past the first frame outside this crate when resolving the caller
    pub fn set_extra_frames(&self, frames: usize) -> &Self {
        self.set_option(LoggerOption::ExtraFrames(frames))
    }

    pub fn set_caller(&self, on: bool) -> &Self {
        self.set_option(LoggerOption::Caller(on))
    }

    // with_*: new uniquely named child carrying the change

    pub fn with_option(&self, option: LoggerOption) -> Logger {
        self.child_with("", &[option])
    }

    pub fn with_format(&self, mode: FormatMode) -> Logger {
        self.with_option(LoggerOption::Format(mode))
    }

    pub fn with_color_mode(&self, mode: ColorMode) -> Logger {
        self.with_option(LoggerOption::Color(mode))
    }

    pub fn with_utc(&self, on: bool) -> Logger {
        self.with_option(LoggerOption::Utc(on))
    }

    pub fn with_time_layout(&self, layout: TimeLayout) -> Logger {
        self.with_option(LoggerOption::TimeLayout(layout))
    }

    pub fn with_level(&self, level: LogLevel) -> Logger {
        self.with_option(LoggerOption::Level(level))
    }

    pub fn with_attrs(&self, args: &[Arg]) -> Logger {
        self.with_option(LoggerOption::Attrs(super::attr::build_attrs(args)))
    }

    pub fn with_sinks(&self, sinks: Vec<SharedSink>) -> Logger {
        self.with_option(LoggerOption::Sinks(sinks))
    }

    pub fn with_router(&self, router: Router) -> Logger {
        self.with_option(LoggerOption::Router(Arc::new(router)))
    }

    pub fn with_context_keys<S: Into<String>>(&self, keys: impl IntoIterator<Item = S>) -> Logger {
        self.with_option(LoggerOption::ContextKeys(keys.into_iter().map(Into::into).collect()))
    }

    pub fn with_extra_frames(&self, frames: usize) -> Logger {
        self.with_option(LoggerOption::ExtraFrames(frames))
    }

    pub fn with_caller(&self, on: bool) -> Logger {
        self.with_option(LoggerOption::Caller(on))
    }

    // print methods

    #[track_caller]
    pub fn panic(&self, message: impl AsRef<str>, args: &[Arg]) {
        self.log(LogLevel::PANIC, message, args);
    }

    #[track_caller]
    pub fn fatal(&self, message: impl AsRef<str>, args: &[Arg]) {
        self.log(LogLevel::FATAL, message, args);
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>, args: &[Arg]) {
        self.log(LogLevel::ERROR, message, args);
    }

    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>, args: &[Arg]) {
        self.log(LogLevel::WARN, message, args);
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>, args: &[Arg]) {
        self.log(LogLevel::INFO, message, args);
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>, args: &[Arg]) {
        self.log(LogLevel::DEBUG, message, args);
    }

    #[track_caller]
    pub fn trace(&self, message: impl AsRef<str>, args: &[Arg]) {
        self.log(LogLevel::TRACE, message, args);
    }

    /// Log regardless of the node's threshold
    #[track_caller]
    pub fn print(&self, message: impl AsRef<str>, args: &[Arg]) {
        self.log(LogLevel::ALWAYS, message, args);
    }

    #[track_caller]
    pub fn ok(&self, message: impl AsRef<str>, args: &[Arg]) {
        self.log(LogLevel::OK, message, args);
    }

    #[track_caller]
    pub fn success(&self, message: impl AsRef<str>, args: &[Arg]) {
        self.log(LogLevel::SUCCESS, message, args);
    }

    #[track_caller]
    pub fn fail(&self, message: impl AsRef<str>, args: &[Arg]) {
        self.log(LogLevel::FAIL, message, args);
    }

    #[track_caller]
    pub fn panic_ctx(&self, ctx: &LogContext, message: impl AsRef<str>, args: &[Arg]) {
        self.log_ctx(ctx, LogLevel::PANIC, message, args);
    }

    #[track_caller]
    pub fn fatal_ctx(&self, ctx: &LogContext, message: impl AsRef<str>, args: &[Arg]) {
        self.log_ctx(ctx, LogLevel::FATAL, message, args);
    }

    #[track_caller]
    pub fn error_ctx(&self, ctx: &LogContext, message: impl AsRef<str>, args: &[Arg]) {
        self.log_ctx(ctx, LogLevel::ERROR, message, args);
    }

    #[track_caller]
    pub fn warn_ctx(&self, ctx: &LogContext, message: impl AsRef<str>, args: &[Arg]) {
        self.log_ctx(ctx, LogLevel::WARN, message, args);
    }

    #[track_caller]
    pub fn info_ctx(&self, ctx: &LogContext, message: impl AsRef<str>, args: &[Arg]) {
        self.log_ctx(ctx, LogLevel::INFO, message, args);
    }

    #[track_caller]
    pub fn debug_ctx(&self, ctx: &LogContext, message: impl AsRef<str>, args: &[Arg]) {
        self.log_ctx(ctx, LogLevel::DEBUG, message, args);
    }

    #[track_caller]
    pub fn trace_ctx(&self, ctx: &LogContext, message: impl AsRef<str>, args: &[Arg]) {
        self.log_ctx(ctx, LogLevel::TRACE, message, args);
    }

    #[track_caller]
    pub fn print_ctx(&self, ctx: &LogContext, message: impl AsRef<str>, args: &[Arg]) {
        self.log_ctx(ctx, LogLevel::ALWAYS, message, args);
    }

    #[track_caller]
    pub fn ok_ctx(&self, ctx: &LogContext, message: impl AsRef<str>, args: &[Arg]) {
        self.log_ctx(ctx, LogLevel::OK, message, args);
    }

    #[track_caller]
    pub fn success_ctx(&self, ctx: &LogContext, message: impl AsRef<str>, args: &[Arg]) {
        self.log_ctx(ctx, LogLevel::SUCCESS, message, args);
    }

    #[track_caller]
    pub fn fail_ctx(&self, ctx: &LogContext, message: impl AsRef<str>, args: &[Arg]) {
        self.log_ctx(ctx, LogLevel::FAIL, message, args);
    }

    /// Log at any level, then fire the level's escalation, if any
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>, args: &[Arg]) {
        let site = CallSite::Location(Location::caller());
        self.dispatch(level, message.as_ref(), args, None, site);
    }

    #[track_caller]
    pub fn log_ctx(&self, ctx: &LogContext, level: LogLevel, message: impl AsRef<str>, args: &[Arg]) {
        let site = CallSite::Location(Location::caller());
        self.dispatch(level, message.as_ref(), args, Some(ctx), site);
    }

    /// Log with an explicit source location, as the logging macros do
    pub fn log_at(
        &self,
        level: LogLevel,
        message: impl AsRef<str>,
        args: &[Arg],
        ctx: Option<&LogContext>,
        caller: Caller,
    ) {
        self.dispatch(level, message.as_ref(), args, ctx, CallSite::Explicit(caller));
    }

    /// Render and route one record without firing its escalation
    ///
    /// The returned escalation is what [`Logger::log`] would have acted on.
    #[track_caller]
    pub fn emit(
        &self,
        level: LogLevel,
        message: &str,
        args: &[Arg],
        ctx: Option<&LogContext>,
    ) -> Option<Escalation> {
        let site = CallSite::Location(Location::caller());
        self.write_record(level, message, args, ctx, Some(site))
    }

    /// Flush every sink reachable from this node and its descendants
    pub fn flush(&self) -> Result<()> {
        let mut routers: Vec<Arc<Router>> = Vec::new();
        self.collect_routers(&mut routers);
        let mut first_error = None;
        for router in routers {
            if let Err(e) = router.flush() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn collect_routers(&self, out: &mut Vec<Arc<Router>>) {
        let router = self.router();
        if !out.iter().any(|r| Arc::ptr_eq(r, &router)) {
            out.push(router);
        }
        for child in self.node.children.read().values() {
            child.collect_routers(out);
        }
    }

    /// The router this node writes through
    pub fn router(&self) -> Arc<Router> {
        match &self.node.config.read().router {
            Some(router) => Arc::clone(router),
            None => self.node.engine.router(),
        }
    }

    /// Only walks the stack when extra frames are configured
    fn resolve_caller(&self, site: CallSite, extra_frames: usize) -> Caller {
        if extra_frames == 0 {
            return site.into_caller();
        }
        self.node.engine.metrics.record_caller_lookup();
        Caller::from_backtrace(extra_frames).unwrap_or_else(|| site.into_caller())
    }

    fn dispatch(
        &self,
        level: LogLevel,
        message: &str,
        args: &[Arg],
        ctx: Option<&LogContext>,
        site: CallSite,
    ) {
        if let Some(escalation) = self.write_record(level, message, args, ctx, Some(site)) {
            self.node.engine.escalate(escalation);
        }
    }

    /// Render, route and release; returns the escalation owed by `level`
    fn write_record(
        &self,
        level: LogLevel,
        message: &str,
        args: &[Arg],
        context: Option<&LogContext>,
        site: Option<CallSite>,
    ) -> Option<Escalation> {
        let engine = &self.node.engine;
        let escalation = Escalation::for_level(level, message);

        if !self.enabled(level) {
            engine.metrics.record_filtered();
            return escalation;
        }

        let mut pooled = engine.pool.checkout();
        let router = {
            let ctx: &mut RenderContext = &mut pooled;
            let config = self.node.config.read();
            let mut record = Record::new(level, &self.node.name, message);
            if let Some(site) = site.filter(|_| config.caller) {
                record = record.with_caller(self.resolve_caller(site, config.extra_frames));
            }
            let colors = config.format == FormatMode::Colorful && config.color.enabled();
            ctx.set(&record, config.format, colors);
            self.resolve_attrs(&config, &mut ctx.attrs, &mut ctx.index, args, context);

            let redactor = engine.redactor();
            let opts = RenderOptions {
                time_layout: &config.time_layout,
                utc: config.utc,
                name_width: engine.name_width(),
                redactor: Some(redactor.as_ref()),
            };
            render(ctx, &opts, painter_for(config.format));
            match &config.router {
                Some(router) => Arc::clone(router),
                None => engine.router(),
            }
        };

        let bytes = pooled.bytes();
        engine.metrics.record_rendered(bytes.len());
        let failures = router.route(level, bytes);
        drop(pooled);

        for failure in failures {
            self.report_failure(level, failure);
        }
        escalation
    }

    /// Own (or ancestor) attributes, then context keys, then call arguments
    fn resolve_attrs(
        &self,
        config: &NodeConfig,
        attrs: &mut Attrs,
        index: &mut KeyIndex,
        args: &[Arg],
        context: Option<&LogContext>,
    ) {
        if self.node.engine.collect_recursive() {
            if let Some(parent) = self.node.parent.upgrade() {
                collect_ancestors(&parent, attrs, index);
            }
        }
        merge_attrs(attrs, index, &config.attrs);

        if let Some(context) = context {
            for attr in context.extract(&config.context_keys) {
                put_attr(attrs, index, attr);
            }
        }
        merge_args(attrs, index, args);
    }

    fn report_failure(&self, level: LogLevel, failure: SinkFailure) {
        self.node.engine.metrics.record_write_failure();
        if level == LogLevel::WARN {
            eprintln!(
                "[LOGGER WARNING] Sink '{}' failed to write a warning: {}",
                failure.sink, failure.error
            );
            return;
        }
        let args = [
            Arg::from(Attr::new("sink", failure.sink)),
            Arg::from(Attr::new("error", failure.error.to_string())),
        ];
        self.write_record(LogLevel::WARN, "log write failed", &args, None, None);
    }
}

/// Source of a print call, turned into a [`Caller`] only when it is rendered
enum CallSite {
    Location(&'static Location<'static>),
    Explicit(Caller),
}

impl CallSite {
    fn into_caller(self) -> Caller {
        match self {
            CallSite::Location(location) => Caller::from_location(location),
            CallSite::Explicit(caller) => caller,
        }
    }
}

/// Root-first walk; a descendant's value overwrites its ancestor's in place
fn collect_ancestors(node: &Node, attrs: &mut Attrs, index: &mut KeyIndex) {
    if let Some(parent) = node.parent.upgrade() {
        collect_ancestors(&parent, attrs, index);
    }
    merge_attrs(attrs, index, &node.config.read().attrs);
}

fn random_name() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_NAME_LEN)
        .map(char::from)
        .collect();
    format!("logger-{}", suffix)
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.node.name)
            .field("config", &*self.node.config.read())
            .field("children", &self.node.children.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::core::Engine;
    use crate::sinks::MemorySink;
    use crate::core::sink::shared;

    fn engine_with(sink: &MemorySink) -> Engine {
        Engine::builder()
            .format(FormatMode::Logfmt)
            .testing(true)
            .sink(shared(sink.clone()))
            .build()
    }

    #[test]
    fn test_child_is_cached_by_name() {
        let engine = Engine::builder().testing(true).build();
        let a = engine.root().child("db");
        let b = engine.root().child("db");
        assert!(Arc::ptr_eq(&a.node, &b.node));
        assert_eq!(engine.root().children(), vec!["db"]);
    }

    #[test]
    fn test_empty_name_is_random() {
        let engine = Engine::builder().testing(true).build();
        let a = engine.root().child("");
        let b = engine.root().child("");
        assert!(a.name().starts_with("logger-"));
        assert_eq!(a.name().len(), "logger-".len() + RANDOM_NAME_LEN);
        assert_ne!(a.name(), b.name());
    }

    #[test]
    fn test_parent_and_root() {
        let engine = Engine::builder().name("app").testing(true).build();
        let grandchild = engine.root().child("a").child("b");
        assert_eq!(grandchild.parent().map(|p| p.name().to_string()), Some("a".to_string()));
        assert_eq!(grandchild.root().name(), "app");
        assert!(engine.root().parent().is_none());
    }

    #[test]
    fn test_child_copies_config_then_diverges() {
        let engine = Engine::builder().testing(true).build();
        let root = engine.root();
        root.set_format(FormatMode::Json).set_attrs(&args!["svc", "api"]);

        let child = root.child("worker");
        assert_eq!(child.format(), FormatMode::Json);
        assert!(child.attrs().is_empty());

        root.set_format(FormatMode::Plain);
        assert_eq!(child.format(), FormatMode::Json);
    }

    #[test]
    fn test_options_apply_only_on_creation() {
        let engine = Engine::builder().testing(true).build();
        let first = engine
            .root()
            .child_with("x", &[LoggerOption::Level(LogLevel::TRACE)]);
        let again = engine
            .root()
            .child_with("x", &[LoggerOption::Level(LogLevel::ERROR)]);
        assert_eq!(first.level(), LogLevel::TRACE);
        assert_eq!(again.level(), LogLevel::TRACE);
    }

    #[test]
    fn test_with_creates_new_child() {
        let engine = Engine::builder().testing(true).build();
        let root = engine.root();
        let quiet = root.with_level(LogLevel::ERROR);
        assert_eq!(quiet.parent().map(|p| p.name().to_string()), Some(root.name().to_string()));
        assert_eq!(quiet.level(), LogLevel::ERROR);
        assert_eq!(root.level(), LogLevel::INFO);
    }

    #[test]
    fn test_threshold_filters() {
        let sink = MemorySink::new();
        let engine = engine_with(&sink);
        let log = engine.root();
        log.debug("hidden", &[]);
        log.info("shown", &[]);
        log.print("always", &[]);
        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("msg=shown"));
        assert_eq!(engine.metrics().filtered(), 1);
        assert_eq!(engine.metrics().bytes_rendered(), sink.len() as u64);
    }

    #[test]
    fn test_own_attrs_dedupe_at_render() {
        let sink = MemorySink::new();
        let engine = engine_with(&sink);
        let log = engine.root();
        log.set_attrs(&args!["k", 1]).set_attrs(&args!["k", 2]);
        log.info("m", &args!["other", true]);
        let line = &sink.lines()[0];
        assert!(line.ends_with("msg=m k=2 other=true"), "{}", line);
    }

    #[test]
    fn test_context_keys() {
        let sink = MemorySink::new();
        let engine = engine_with(&sink);
        let log = engine.root().with_context_keys(["request_id"]);
        let ctx = LogContext::new().with("request_id", "r-7").with("secret", "x");
        log.info_ctx(&ctx, "handled", &args!["status", 200]);
        let line = &sink.lines()[0];
        assert!(line.contains("request_id=r-7 status=200"), "{}", line);
        assert!(!line.contains("secret"));
    }

    #[test]
    fn test_caller_flag() {
        let sink = MemorySink::new();
        let engine = engine_with(&sink);
        let log = engine.root();
        log.info("no caller", &[]);
        log.set_caller(true);
        log.info("with caller", &[]);
        let lines = sink.lines();
        assert!(!lines[0].contains("caller.file="));
        assert!(lines[1].contains("caller.file="));
        assert!(lines[1].contains("logger.rs"));
    }

    #[test]
    fn test_extra_frames_walk_only_when_caller_renders() {
        let sink = MemorySink::new();
        let engine = engine_with(&sink);
        let log = engine.root();
        log.set_extra_frames(1);

        log.debug("filtered", &[]);
        log.info("no caller", &[]);
        assert_eq!(engine.metrics().caller_lookups(), 0);

        log.set_caller(true);
        log.debug("still filtered", &[]);
        assert_eq!(engine.metrics().caller_lookups(), 0);

        log.info("with caller", &[]);
        assert_eq!(engine.metrics().caller_lookups(), 1);
        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("caller.file="), "{}", lines[1]);
    }

    #[test]
    fn test_bound_sinks_override_engine_router() {
        let engine_sink = MemorySink::new();
        let own = MemorySink::named("own");
        let engine = engine_with(&engine_sink);
        let log = engine.root().with_sinks(vec![shared(own.clone())]);
        log.info("routed", &[]);
        assert!(engine_sink.is_empty());
        assert_eq!(own.lines().len(), 1);
    }

    #[test]
    fn test_emit_returns_escalation() {
        let sink = MemorySink::new();
        let engine = engine_with(&sink);
        let escalation = engine.root().emit(LogLevel::FATAL, "down", &[], None);
        assert_eq!(escalation, Some(Escalation::Exit(crate::core::engine::FATAL_EXIT_CODE)));
        assert!(sink.contents().contains("level=fatal"));
    }

    #[test]
    fn test_flush_reaches_child_routers() {
        let sink = MemorySink::new();
        let engine = engine_with(&sink);
        engine.root().with_sinks(vec![shared(MemorySink::new())]);
        assert!(engine.root().flush().is_ok());
    }
}
