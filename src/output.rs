//! Output and Reporting
//!
//! Renders the verdict of one validation run for stdout and maps it to the
//! process exit code.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::diagnostics::{DEFAULT_DELIMITER, ErrorSet};
use crate::validator::ValidationOutcome;

/// Message printed for a conforming document
pub const VALID_MESSAGE: &str = "Xml is Valid!";

/// Exit code for a conforming document
pub const EXIT_SUCCESS: u8 = 0;

/// Exit code for a document that violates its schema
pub const EXIT_INVALID: u8 = 2;

/// Exit code for usage, IO, parse and libxml2 failures
pub const EXIT_FAILURE: u8 = 1;

/// Output format
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text, errors joined by the delimiter
    #[default]
    Human,
    /// One JSON object
    Json,
}

/// Output formatter for validation verdicts
pub struct Output {
    format: OutputFormat,
    delimiter: String,
}

impl Output {
    pub fn new(format: OutputFormat, delimiter: impl Into<String>) -> Self {
        Self {
            format,
            delimiter: delimiter.into(),
        }
    }

    pub fn format_outcome(&self, outcome: &ValidationOutcome) -> String {
        match self.format {
            OutputFormat::Human => match outcome {
                ValidationOutcome::Valid => VALID_MESSAGE.to_string(),
                ValidationOutcome::Invalid(errors) => errors.join(&self.delimiter),
            },
            OutputFormat::Json => self.format_json(outcome.errors()),
        }
    }

    fn format_json(&self, errors: Option<&ErrorSet>) -> String {
        let value = match errors {
            None => json!({ "valid": true, "errors": [] }),
            Some(errors) => json!({ "valid": false, "errors": errors }),
        };
        value.to_string()
    }

    /// Message for a failure that is not a validation verdict
    pub fn format_failure(&self, details: &str) -> String {
        match self.format {
            OutputFormat::Human => format!(
                "An error occurred when trying to validate xml with xsd, error: {}",
                details
            ),
            OutputFormat::Json => json!({ "valid": false, "failure": details }).to_string(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new(OutputFormat::Human, DEFAULT_DELIMITER)
    }
}

/// Exit code for a validation verdict
pub fn exit_code(outcome: &ValidationOutcome) -> u8 {
    match outcome {
        ValidationOutcome::Valid => EXIT_SUCCESS,
        ValidationOutcome::Invalid(_) => EXIT_INVALID,
    }
}
