use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::diagnostics::ErrorMode;
use crate::output::OutputFormat;

/// Verbosity levels for log output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show detailed information
    Verbose,
}

impl VerbosityLevel {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            VerbosityLevel::Quiet
        } else if verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Default `tracing` filter directive when `RUST_LOG` is unset
    pub fn filter_directive(self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "debug",
        }
    }
}

/// XML Schema validation tool
///
/// cat crs_payload.xml | validatexml-xsd -s CrsXML_v2.0.xsd -v
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "validatexml-xsd")]
#[command(about = "Validate an XML document against an XSD schema")]
#[command(version)]
pub struct Cli {
    /// Validate the XML document (use -s to specify the xsd file)
    #[arg(short = 'v', long = "validate")]
    pub do_validate: bool,

    /// Path or URL of the xsd file
    #[arg(short = 's', long = "schema")]
    pub schema: Option<String>,

    /// Path to the input XML file; standard input is used when omitted
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Parse errors to report
    #[arg(long = "parse-errors", value_enum)]
    pub parse_errors: Option<ErrorMode>,

    /// Validation errors to report
    #[arg(long = "validation-errors", value_enum)]
    pub validation_errors: Option<ErrorMode>,

    /// Output format
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Separator between reported errors
    #[arg(long = "delimiter")]
    pub delimiter: Option<String>,

    /// Timeout in seconds for fetching a remote schema
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check the flag combination, returning the schema source to use
    pub fn validate(&self) -> Result<&str, String> {
        if !self.do_validate {
            return Err("Please, specify -v to validate".to_string());
        }
        match self.schema.as_deref() {
            Some(schema) if !schema.trim().is_empty() => Ok(schema),
            _ => Err("Please, specify a xsd schema for validate".to_string()),
        }
    }
}
