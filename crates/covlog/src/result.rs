//! Result and error types for covlog.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for covlog operations
pub type CovlogResult<T> = Result<T, CovlogError>;

/// Errors that can occur while building reports
#[derive(Debug, Error)]
pub enum CovlogError {
    /// Reading or writing a file failed
    #[error("I/O error on {path}: {source}")]
    FileIo {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// External tool could not be started
    #[error("Failed to launch {tool}: {message}")]
    ToolNotFound {
        /// Program name
        tool: String,
        /// Error message
        message: String,
    },

    /// External tool exited with a non-zero status
    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        /// Program name
        tool: String,
        /// Exit status description
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// No per-directory dataset was produced, nothing to merge
    #[error("No coverage data: {message}")]
    NoCoverageData {
        /// Error message
        message: String,
    },

    /// Hex dump could not be decoded
    #[error("Malformed hex dump in {name} at line {line}: {message}")]
    HexDecode {
        /// Artifact name
        name: String,
        /// 1-based line number within the dump
        line: usize,
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Pipeline task was cancelled or panicked
    #[error("Pipeline task failed: {message}")]
    Task {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CovlogError {
    /// Wrap an I/O error with the path it happened on
    #[must_use]
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error came from an external tool run
    #[must_use]
    pub const fn is_tool_failure(&self) -> bool {
        matches!(self, Self::ToolFailed { .. } | Self::ToolNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_io_mentions_path() {
        let err = CovlogError::file_io(
            "/tmp/missing.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/missing.txt"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_tool_failed_display() {
        let err = CovlogError::ToolFailed {
            tool: "lcov".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "no data".to_string(),
        };
        assert_eq!(err.to_string(), "lcov failed (exit status: 1): no data");
        assert!(err.is_tool_failure());
    }

    #[test]
    fn test_config_error() {
        let err = CovlogError::config("bad root");
        assert!(err.to_string().contains("Configuration"));
        assert!(!err.is_tool_failure());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CovlogError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
