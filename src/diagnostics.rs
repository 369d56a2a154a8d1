//! Structured diagnostics
//!
//! libxml2 reports problems through a callback, one `xmlError` record at a time.
//! This module turns those records into [`ErrorEntry`] values, decides how many
//! of them to keep ([`ErrorMode`]) and renders them the way callers print them:
//! `Error Line {line}: {message}`, joined with a delimiter.

use std::fmt;
use std::slice;

use serde::{Deserialize, Serialize};

/// Delimiter used when joining formatted entries
pub const DEFAULT_DELIMITER: &str = ";";

/// How many diagnostics to collect during parsing or validation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Keep only the first error reported
    #[default]
    Default,
    /// Keep every error reported
    Verbose,
}

impl ErrorMode {
    /// Maximum number of entries kept, `None` meaning unbounded
    pub fn limit(self) -> Option<usize> {
        match self {
            ErrorMode::Default => Some(1),
            ErrorMode::Verbose => None,
        }
    }
}

impl std::str::FromStr for ErrorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(ErrorMode::Default),
            "verbose" => Ok(ErrorMode::Verbose),
            other => Err(format!("unknown error mode: {}", other)),
        }
    }
}

/// One diagnostic reported by libxml2
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Line reported by libxml2; zero or negative means the location is unknown
    pub line: i32,
    /// libxml2 error code (`xmlParserErrors`), zero when not known
    pub code: i32,
    /// Message with apostrophes stripped
    pub message: String,
}

impl ErrorEntry {
    /// Build an entry from a raw libxml2 record.
    ///
    /// libxml2 quotes identifiers with apostrophes (`Element 'shipto': ...`) and
    /// terminates messages with a newline. Both are removed; the line number is
    /// kept exactly as reported.
    pub fn normalize(line: i32, raw_message: &str) -> Self {
        Self {
            line,
            code: 0,
            message: raw_message.trim_end().replace('\'', ""),
        }
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }

    /// Whether libxml2 reported a usable location
    pub fn has_location(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error Line {}: {}", self.line, self.message)
    }
}

/// Render entries as `Error Line {n}: {message}` joined by `delimiter`
pub fn join(entries: &[ErrorEntry], delimiter: &str) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// Ordered, non-empty sequence of diagnostics
///
/// The order is the order in which libxml2 reported the errors. An empty set
/// cannot be built: "no errors" is represented by the absence of a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorSet(Vec<ErrorEntry>);

impl ErrorSet {
    /// Returns `None` when `entries` is empty
    pub fn new(entries: Vec<ErrorEntry>) -> Option<Self> {
        if entries.is_empty() {
            None
        } else {
            Some(Self(entries))
        }
    }

    pub fn single(entry: ErrorEntry) -> Self {
        Self(vec![entry])
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.0
    }

    pub fn first(&self) -> &ErrorEntry {
        &self.0[0]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with slices
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, ErrorEntry> {
        self.0.iter()
    }

    pub fn lines(&self) -> Vec<i32> {
        self.0.iter().map(|entry| entry.line).collect()
    }

    pub fn join(&self, delimiter: &str) -> String {
        join(&self.0, delimiter)
    }
}

impl fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(DEFAULT_DELIMITER))
    }
}

impl<'a> IntoIterator for &'a ErrorSet {
    type Item = &'a ErrorEntry;
    type IntoIter = slice::Iter<'a, ErrorEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Accumulates entries reported during one native call
///
/// A pointer to the collector is handed to libxml2 as callback user data, so
/// it must stay at a fixed address for the duration of that call.
#[derive(Debug)]
pub struct ErrorCollector {
    mode: ErrorMode,
    entries: Vec<ErrorEntry>,
    suppressed: usize,
}

impl ErrorCollector {
    pub fn new(mode: ErrorMode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
            suppressed: 0,
        }
    }

    pub fn record(&mut self, entry: ErrorEntry) {
        if let Some(limit) = self.mode.limit()
            && self.entries.len() >= limit
        {
            self.suppressed += 1;
            return;
        }
        self.entries.push(entry);
    }

    /// Number of entries dropped because of the mode's limit
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ErrorEntry> {
        self.entries
    }
}
