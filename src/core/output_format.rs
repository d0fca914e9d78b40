//! Output format selection
//!
//! - Json: one object per line
//! - Logfmt: `key=value` pairs separated by single spaces
//! - Colorful: aligned, human-readable text with ANSI colors on the level tag and message
//! - Plain: the colorful layout without escapes or alignment padding

use super::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire format of a rendered line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatMode {
    /// Example: `{"time":"2024-01-01T00:00:00.000000000Z","level":"info","msg":"hello","foo":1}`
    Json,

    /// Example: `time=2024-01-01T00:00:00.000000000Z level=info msg=hello foo=1`
    Logfmt,

    /// Example: `2024-01-01T00:00:00.000000000Z app [INF] hello                            foo=1`
    #[default]
    Colorful,

    /// Example: `2024-01-01T00:00:00.000000000Z app [INF] hello foo=1`
    Plain,
}

impl FormatMode {
    pub const ALL: [FormatMode; 4] = [
        FormatMode::Json,
        FormatMode::Logfmt,
        FormatMode::Colorful,
        FormatMode::Plain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatMode::Json => "json",
            FormatMode::Logfmt => "logfmt",
            FormatMode::Colorful => "colorful",
            FormatMode::Plain => "plain",
        }
    }

    /// Whether nested groups are flattened into dotted keys
    pub fn flattens_groups(&self) -> bool {
        !matches!(self, FormatMode::Json)
    }

    /// Whether the level is shown as a bracketed short tag
    pub fn uses_short_tag(&self) -> bool {
        matches!(self, FormatMode::Colorful | FormatMode::Plain)
    }
}

impl fmt::Display for FormatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatMode {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(FormatMode::Json),
            "logfmt" => Ok(FormatMode::Logfmt),
            "colorful" | "color" | "text" => Ok(FormatMode::Colorful),
            "plain" => Ok(FormatMode::Plain),
            other => Err(LoggerError::config(
                "FormatMode",
                format!("unknown format mode '{}'", other),
            )),
        }
    }
}

/// Whether the colorful painter emits ANSI escapes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Follow `colored`'s terminal and `NO_COLOR`/`CLICOLOR` detection
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn enabled(&self) -> bool {
        match self {
            ColorMode::Auto => colored::control::SHOULD_COLORIZE.should_colorize(),
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

impl FromStr for ColorMode {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" | "on" | "true" => Ok(ColorMode::Always),
            "never" | "off" | "false" => Ok(ColorMode::Never),
            other => Err(LoggerError::config(
                "ColorMode",
                format!("unknown color mode '{}'", other),
            )),
        }
    }
}
