//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A level with the same ordinal is already registered
    #[error("duplicate level value {value} (already registered as '{existing}')")]
    DuplicateLevelValue { value: i32, existing: String },

    /// A level with the same title is already registered
    #[error("duplicate level title '{title}'")]
    DuplicateLevelTitle { title: String },

    /// Level text that does not name a registered level
    #[error("invalid log level: '{0}'")]
    InvalidLevel(String),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Redaction rule pattern failed to compile
    #[error("invalid redaction pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Write attempted on a sink after `close`
    #[error("sink '{0}' is closed")]
    SinkClosed(String),

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn duplicate_value(value: i32, existing: impl Into<String>) -> Self {
        LoggerError::DuplicateLevelValue {
            value,
            existing: existing.into(),
        }
    }

    pub fn duplicate_title(title: impl Into<String>) -> Self {
        LoggerError::DuplicateLevelTitle {
            title: title.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::duplicate_value(12, "notice");
        assert!(matches!(err, LoggerError::DuplicateLevelValue { value: 12, .. }));

        let err = LoggerError::config("LevelRegistry", "short tag too long");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::duplicate_title("notice");
        assert!(matches!(err, LoggerError::DuplicateLevelTitle { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::duplicate_value(4, "info");
        assert_eq!(
            err.to_string(),
            "duplicate level value 4 (already registered as 'info')"
        );

        let err = LoggerError::duplicate_title("info");
        assert_eq!(err.to_string(), "duplicate level title 'info'");

        let err = LoggerError::SinkClosed("stdout".into());
        assert_eq!(err.to_string(), "sink 'stdout' is closed");
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("writing log file", "cannot write to file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("writing log file"));
        assert!(err.to_string().contains("cannot write to file"));
    }
}
