//! Error types for reconciliation.
//!
//! Errors are categorized so the CLI can report them consistently and so
//! callers can tell spec problems apart from gateway problems.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The spec is malformed (bad trigger, duplicate name, unknown key).
    Validation,
    /// Spec and remote state disagree about a cross-resource reference.
    Reference,
    /// The remote API rejected a request or could not be reached.
    Gateway,
    /// Local filesystem problem.
    Io,
    /// A payload could not be decoded or parsed.
    Format,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Invalid specification",
            Self::Reference => "Broken resource reference",
            Self::Gateway => "Remote API error",
            Self::Io => "Filesystem error",
            Self::Format => "Invalid data format",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Validation => "Fix the offending resource in your YAML files and try again",
            Self::Reference => "Make sure every function references a declared webhook",
            Self::Gateway => "Check your API URL, token and network connection",
            Self::Io => "Check that the referenced files exist and are readable",
            Self::Format => "The payload may be corrupted, try redeploying it",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while loading, diffing or applying state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A resource in the spec is malformed.
    #[error("{0}")]
    Validation(String),

    /// A function references a webhook that cannot be found.
    #[error("{0}")]
    Reference(String),

    /// The API answered with a non-success status.
    #[error("{status} {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the server.
        body: String,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// A read of remote state failed.
    #[error("Error occurred while fetching {what}: {source}")]
    Fetch {
        /// What was being fetched.
        what: String,
        /// Underlying error.
        #[source]
        source: Box<Error>,
    },

    /// A create, update or delete call failed.
    #[error("Error occurred while {action}: {source}")]
    Mutation {
        /// What was being attempted.
        action: String,
        /// Underlying error.
        #[source]
        source: Box<Error>,
    },

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Failed to build or read a zip archive.
    #[error("archive error: {0}")]
    Archive(String),

    /// Failed to decode a base64 payload.
    #[error("decode error: {0}")]
    Decode(String),

    /// Failed to parse a YAML or JSON document.
    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap an error raised while reading remote state.
    pub fn fetch(what: impl Into<String>, source: Error) -> Self {
        Self::Fetch {
            what: what.into(),
            source: Box::new(source),
        }
    }

    /// Wrap an error raised while changing remote state.
    pub fn mutation(action: impl Into<String>, source: Error) -> Self {
        Self::Mutation {
            action: action.into(),
            source: Box::new(source),
        }
    }

    /// HTTP status code, if this error came from an API response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Fetch { source, .. } | Self::Mutation { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Validation(_) => ErrorCategory::Validation,
            Error::Reference(_) => ErrorCategory::Reference,
            Error::Api { .. } | Error::Http(_) => ErrorCategory::Gateway,
            Error::Fetch { source, .. } | Error::Mutation { source, .. } => source.category(),
            Error::Io { .. } => ErrorCategory::Io,
            Error::Archive(_) | Error::Decode(_) | Error::Parse(_) => ErrorCategory::Format,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Api {
                status: code,
                body: String::new(),
            },
            other => Self::Http(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::Api {
            status: 422,
            body: "invalid trigger".to_string(),
        };
        assert_eq!(err.to_string(), "422 invalid trigger");
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.category(), ErrorCategory::Gateway);
    }

    #[test]
    fn test_fetch_wraps_source() {
        let err = Error::fetch(
            "webhooks",
            Error::Api {
                status: 500,
                body: "boom".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "Error occurred while fetching webhooks: 500 boom"
        );
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.category(), ErrorCategory::Gateway);
    }

    #[test]
    fn test_mutation_wraps_source() {
        let err = Error::mutation(
            "creating function f",
            Error::Api {
                status: 400,
                body: "bad".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "Error occurred while creating function f: 400 bad"
        );
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_validation_category() {
        let err = Error::Validation("Function f has an invalid trigger".to_string());
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.status().is_none());
    }

    #[test]
    fn test_io_constructor() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/some/path", io_err);
        match err {
            Error::Io { path, .. } => assert_eq!(path, PathBuf::from("/some/path")),
            _ => panic!("Expected Error::Io"),
        }
    }

    #[test]
    fn test_category_advice() {
        assert!(!ErrorCategory::Validation.advice().is_empty());
        assert!(!ErrorCategory::Gateway.advice().is_empty());
        assert!(format!("{}", ErrorCategory::Reference).contains("reference"));
    }
}
