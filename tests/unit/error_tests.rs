//! Error type tests
//!
//! Rendering of the error hierarchy as it reaches users of the library and
//! the CLI.

use std::error::Error;

use xsdvalidate::{ErrorEntry, InitError, LibXml2Error, ParseError, ParseTarget, XsdError};

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
    let error: XsdError = io_error.into();

    assert!(error.to_string().contains("File not found"));
    assert!(error.parse_errors().is_none());
}

#[test]
fn test_document_parse_error() {
    let error: XsdError = ParseError {
        target: ParseTarget::Document,
        errors: vec![ErrorEntry::normalize(
            9,
            "Opening and ending tag mismatch: shipto line 4 and shipt\n",
        )],
    }
    .into();

    assert_eq!(
        error.to_string(),
        "failed to parse XML document: Error Line 9: Opening and ending tag mismatch: shipto line 4 and shipt"
    );
    assert_eq!(error.parse_errors().unwrap()[0].line, 9);
}

#[test]
fn test_schema_parse_error_without_diagnostics() {
    let error = ParseError {
        target: ParseTarget::Schema {
            source: "missing.xsd".to_string(),
        },
        errors: Vec::new(),
    };

    assert_eq!(error.to_string(), "failed to parse schema missing.xsd");
}

#[test]
fn test_init_errors() {
    let error: XsdError = InitError::AlreadyInitialized.into();
    assert!(error.to_string().contains("already initialized"));

    let error = InitError::MissingFeature { feature: "schema" };
    assert_eq!(error.to_string(), "libxml2 was built without schema support");

    let error = InitError::ReclamationSpawn(std::io::Error::other("no threads"));
    assert!(error.source().is_some());
}

#[test]
fn test_libxml2_errors() {
    let error = LibXml2Error::Internal {
        operation: "xmlSchemaValidateDoc",
        code: -1,
    };
    assert_eq!(error.to_string(), "xmlSchemaValidateDoc failed with code -1");

    let error: XsdError = LibXml2Error::OutstandingHandles { count: 2 }.into();
    assert!(error.to_string().contains("2 handle(s) still alive"));
}

#[test]
fn test_http_errors() {
    let status_error = XsdError::HttpStatus {
        url: "http://example.com/schema.xsd".to_string(),
        status: 404,
    };
    let message = status_error.to_string();
    assert!(message.contains("404"));
    assert!(message.contains("http://example.com"));

    let timeout_error = XsdError::Timeout {
        url: "http://example.com/schema.xsd".to_string(),
        timeout_seconds: 30,
    };
    assert!(timeout_error.to_string().contains("30 seconds"));
}
