//! # xsdvalidate
//!
//! Validate XML documents against XSD schemas through libxml2 and get back
//! ordered, line-addressed errors.
//!
//! The library manages the native side for you: [`XsdRuntime`] owns libxml2's
//! process-wide state, [`SchemaHandle`] and [`DocumentHandle`] own compiled
//! schemas and parsed documents, and [`SchemaHandle::validate`] turns
//! libxml2's callback diagnostics into a [`ValidationOutcome`].

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod http_client;
pub mod libxml2;
pub mod output;
pub mod runtime;
pub mod schema;
pub mod validator;

pub use cli::{Cli, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager, EnvProvider, SystemEnvProvider};
pub use diagnostics::{DEFAULT_DELIMITER, ErrorCollector, ErrorEntry, ErrorMode, ErrorSet};
pub use document::DocumentHandle;
pub use error::{InitError, LibXml2Error, ParseError, ParseTarget, Result, XsdError};
pub use http_client::{AsyncHttpClient, HttpClientConfig};
pub use output::{Output, OutputFormat};
pub use runtime::XsdRuntime;
pub use schema::{SchemaHandle, SchemaSource};
pub use validator::ValidationOutcome;
