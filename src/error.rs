use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::diagnostics::{self, DEFAULT_DELIMITER, ErrorEntry};

/// Main error type that encompasses all failure modes of a validation attempt
///
/// A document that does not conform to its schema is not an error: it is
/// reported as [`crate::ValidationOutcome::Invalid`].
#[derive(Error, Debug)]
pub enum XsdError {
    #[error("LibXML2 initialization failed: {0}")]
    Init(#[from] InitError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("LibXML2 internal error: {0}")]
    LibXml2(#[from] LibXml2Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status error: {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout: {url} after {timeout_seconds} seconds")]
    Timeout { url: String, timeout_seconds: u64 },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl XsdError {
    /// Diagnostics attached to a parse failure, if any
    pub fn parse_errors(&self) -> Option<&[ErrorEntry]> {
        match self {
            XsdError::Parse(err) => Some(&err.errors),
            _ => None,
        }
    }
}

/// Runtime startup failures
#[derive(Error, Debug)]
pub enum InitError {
    #[error("runtime already initialized; call cleanup before initializing again")]
    AlreadyInitialized,

    #[error("libxml2 was built without {feature} support")]
    MissingFeature { feature: &'static str },

    #[error("reclamation interval must be greater than zero")]
    InvalidInterval,

    #[error("failed to start reclamation worker: {0}")]
    ReclamationSpawn(#[source] std::io::Error),
}

/// Failures of the native engine that are not a verdict on the input
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("{context} context creation failed")]
    ContextCreationFailed { context: &'static str },

    #[error("{operation} failed with code {code}")]
    Internal { operation: &'static str, code: i32 },

    #[error("invalid schema location {location:?}: contains a NUL byte")]
    InvalidSource { location: String },

    #[error("buffer of {len} bytes exceeds the libxml2 size limit")]
    BufferTooLarge { len: usize },

    #[error("{count} handle(s) still alive at teardown; native state was not released")]
    OutstandingHandles { count: usize },
}

/// What was being parsed when a [`ParseError`] occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTarget {
    Schema { source: String },
    Document,
}

impl fmt::Display for ParseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseTarget::Schema { source } => write!(f, "schema {}", source),
            ParseTarget::Document => f.write_str("XML document"),
        }
    }
}

/// A schema or document could not be parsed
///
/// `errors` holds whatever libxml2 reported before giving up, limited by the
/// parse [`crate::ErrorMode`]. It may be empty when libxml2 failed without a
/// diagnostic, for example on a missing schema file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", describe_parse_failure(.target, .errors))]
pub struct ParseError {
    pub target: ParseTarget,
    pub errors: Vec<ErrorEntry>,
}

fn describe_parse_failure(target: &ParseTarget, errors: &[ErrorEntry]) -> String {
    if errors.is_empty() {
        format!("failed to parse {}", target)
    } else {
        format!(
            "failed to parse {}: {}",
            target,
            diagnostics::join(errors, DEFAULT_DELIMITER)
        )
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, XsdError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;
