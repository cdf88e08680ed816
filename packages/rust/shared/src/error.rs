//! Error types for PitchLens.
//!
//! Library crates use [`PitchLensError`] via `thiserror`.
//! App crates (cli/server) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all PitchLens operations.
#[derive(Debug, thiserror::Error)]
pub enum PitchLensError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure talking to an external service.
    #[error("network error: {0}")]
    Network(String),

    /// An external service answered with a non-success status.
    #[error("{service} returned HTTP {status}: {body}")]
    Http {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The external service rejected our credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A bounded wait ran out.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Malformed JSON, HTML or model output.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Document text extraction error.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Report rendering error.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid request or input data.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PitchLensError>;

impl PitchLensError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an HTTP status error, truncating long response bodies.
    pub fn http(service: &'static str, status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > 500 {
            let cut = (0..=500).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
            body.truncate(cut);
            body.push_str("...");
        }
        Self::Http {
            service,
            status,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = PitchLensError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = PitchLensError::validation("startup name is required");
        assert!(err.to_string().contains("startup name"));
    }

    #[test]
    fn http_error_truncates_body() {
        let err = PitchLensError::http("platform", 502, "x".repeat(2000));
        let msg = err.to_string();
        assert!(msg.starts_with("platform returned HTTP 502"));
        assert!(msg.ends_with("..."));
        assert!(msg.len() < 600);
    }
}
