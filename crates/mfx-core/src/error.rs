//! Unified error type for MediaFX.
//!
//! All crates funnel their failures into [`Error`]. [`Error::kind`] maps every
//! variant onto the coarse taxonomy reported in per-item error records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unified error type covering all failure modes in MediaFX.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller-supplied parameters failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "font", "binary payload").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A binary source referenced a payload that is not attached to the item.
    #[error("Binary data not found in property \"{property}\"")]
    MissingPayload {
        /// Name of the payload property.
        property: String,
    },

    /// A source descriptor of an unknown kind.
    #[error("Unsupported source type: {0}")]
    UnsupportedSource(String),

    /// A source could not be turned into a local file.
    #[error("Failed to resolve {source_ref}: {message}")]
    Resolution {
        /// The URL or payload name being resolved.
        source_ref: String,
        /// Human-readable error description.
        message: String,
    },

    /// Media probing failed.
    #[error("Probe error: {0}")]
    Probe(String),

    /// An external tool (ffmpeg, ffprobe) failed to spawn or exited non-zero.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description, including captured stderr.
        message: String,
    },

    /// An operation failed while running the engine; the message carries
    /// operation-specific guidance followed by the engine diagnostics.
    #[error("Operation error [{operation}]: {message}")]
    Operation {
        /// The operation that failed (e.g. "merge").
        operation: String,
        /// Human-readable error description.
        message: String,
    },

    /// The installed engine lacks a capability and no fallback exists.
    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying serde_json error.
        #[from]
        source: serde_json::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error classification used in error records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationError,
    NotFound,
    ResolutionError,
    ProbeError,
    EngineExecutionError,
    UnsupportedCapability,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ValidationError => "ValidationError",
            Self::NotFound => "NotFound",
            Self::ResolutionError => "ResolutionError",
            Self::ProbeError => "ProbeError",
            Self::EngineExecutionError => "EngineExecutionError",
            Self::UnsupportedCapability => "UnsupportedCapability",
            Self::Internal => "Internal",
        };
        f.write_str(s)
    }
}

impl Error {
    /// Classify this error into the reporting taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::UnsupportedSource(_) => ErrorKind::ValidationError,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::MissingPayload { .. } | Error::Resolution { .. } => ErrorKind::ResolutionError,
            Error::Probe(_) => ErrorKind::ProbeError,
            Error::Tool { .. } | Error::Operation { .. } => ErrorKind::EngineExecutionError,
            Error::UnsupportedCapability(_) => ErrorKind::UnsupportedCapability,
            Error::Io { .. } | Error::Json { .. } | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Resolution`].
    pub fn resolution(source_ref: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::Resolution {
            source_ref: source_ref.into(),
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Operation`].
    pub fn operation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Operation {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display() {
        let err = Error::validation("font key too short");
        assert_eq!(err.to_string(), "Validation error: font key too short");
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn not_found_display() {
        let err = Error::not_found("font", "my-font");
        assert_eq!(err.to_string(), "font not found: my-font");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn missing_payload_display() {
        let err = Error::MissingPayload {
            property: "data".into(),
        };
        assert_eq!(
            err.to_string(),
            "Binary data not found in property \"data\""
        );
        assert_eq!(err.kind(), ErrorKind::ResolutionError);
    }

    #[test]
    fn unsupported_source_is_validation() {
        let err = Error::UnsupportedSource("ftp".into());
        assert_eq!(err.to_string(), "Unsupported source type: ftp");
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn resolution_display() {
        let err = Error::resolution("https://example.com/a.mp4", "HTTP 404");
        assert_eq!(
            err.to_string(),
            "Failed to resolve https://example.com/a.mp4: HTTP 404"
        );
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
        assert_eq!(err.kind(), ErrorKind::EngineExecutionError);
    }

    #[test]
    fn operation_display() {
        let err = Error::operation("merge", "Error merging videos.");
        assert_eq!(
            err.to_string(),
            "Operation error [merge]: Error merging videos."
        );
        assert_eq!(err.kind(), ErrorKind::EngineExecutionError);
    }

    #[test]
    fn probe_kind() {
        let err = Error::Probe("corrupt header".into());
        assert_eq!(err.to_string(), "Probe error: corrupt header");
        assert_eq!(err.kind(), ErrorKind::ProbeError);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn kind_display() {
        assert_eq!(
            ErrorKind::EngineExecutionError.to_string(),
            "EngineExecutionError"
        );
    }
}
