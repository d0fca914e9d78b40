//! Core logger types and traits

pub mod attr;
pub mod buffer;
pub mod caller;
pub mod engine;
pub mod error;
pub mod log_context;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod redact;
pub mod render;
pub mod render_context;
pub mod router;
pub mod sink;
pub mod timestamp;
pub mod value;

pub use attr::{build_attrs, merge_args, merge_attrs, put_attr, Arg, Attr, Attrs, KeyIndex, BAD_KEY};
pub use buffer::{Buffer, MAX_BUFFER_SIZE};
pub use caller::Caller;
pub use engine::{
    default_engine, default_logger, set_default, Engine, EngineBuilder, EngineConfig, Escalation,
    RedactRule, FATAL_EXIT_CODE,
};
pub use error::{LoggerError, Result};
pub use log_context::LogContext;
pub use log_level::{
    enabled, parse_level, register_level, short_tag, LevelInfo, LevelOptions, LevelRegistry,
    LogLevel,
};
pub use logger::{Logger, LoggerOption, NodeConfig};
pub use metrics::{LoggerMetrics, MetricsSnapshot};
pub use output_format::{ColorMode, FormatMode};
pub use redact::Redactor;
pub use render::{render, Record, RenderOptions};
pub use render_context::{PooledContext, RenderContext, RenderPool, DEFAULT_POOL_SIZE};
pub use router::{Router, SinkFailure};
pub use sink::{shared, SharedSink, Sink, WriterSink};
pub use timestamp::TimeLayout;
pub use value::{LogMarshal, Value};
