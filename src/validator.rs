//! Schema validation
//!
//! Validation combines a [`SchemaHandle`] with a [`DocumentHandle`]. Every call
//! creates its own `xmlSchemaValidCtxt`, so calls are independent: the same
//! pair can be validated repeatedly, with different modes, from any thread.

use std::ffi::c_void;

use libc::c_int;
use serde::Serialize;
use tracing::debug;

use crate::diagnostics::{ErrorCollector, ErrorEntry, ErrorMode, ErrorSet};
use crate::document::DocumentHandle;
use crate::error::{LibXml2Error, LibXml2Result, Result};
use crate::libxml2::{
    StructuredErrorScope, collect_structured_error, xmlSchemaFreeValidCtxt, xmlSchemaNewValidCtxt,
    xmlSchemaSetValidStructuredErrors, xmlSchemaValidateDoc,
};
use crate::schema::SchemaHandle;

/// Verdict of validating one document against one schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "errors", rename_all = "lowercase")]
pub enum ValidationOutcome {
    /// The document conforms to the schema
    Valid,
    /// The document violates the schema
    Invalid(ErrorSet),
}

impl ValidationOutcome {
    /// Build an outcome from the `xmlSchemaValidateDoc` return code
    ///
    /// `0` is valid, a positive code counts violations, a negative code is an
    /// internal libxml2 failure. A positive code without any collected entry
    /// still yields an `Invalid` outcome, with a single unlocated entry.
    pub fn from_code(code: c_int, entries: Vec<ErrorEntry>) -> LibXml2Result<Self> {
        match code {
            0 => Ok(ValidationOutcome::Valid),
            n if n > 0 => {
                let errors = ErrorSet::new(entries).unwrap_or_else(|| {
                    ErrorSet::single(
                        ErrorEntry::normalize(
                            0,
                            &format!("document failed schema validation with code {}", n),
                        )
                        .with_code(n),
                    )
                });
                Ok(ValidationOutcome::Invalid(errors))
            }
            n => Err(LibXml2Error::Internal {
                operation: "schema validation",
                code: n,
            }),
        }
    }

    /// Check if validation was successful
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// Check if validation failed due to schema violations
    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationOutcome::Invalid(_))
    }

    pub fn errors(&self) -> Option<&ErrorSet> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Invalid(errors) => Some(errors),
        }
    }

    /// Entries reported, empty when valid
    pub fn entries(&self) -> &[ErrorEntry] {
        self.errors().map(ErrorSet::entries).unwrap_or(&[])
    }
}

impl<'rt> SchemaHandle<'rt> {
    /// Validate a parsed document against this schema
    ///
    /// `validate_mode` decides whether only the first violation or all of them
    /// are returned.
    ///
    /// # Errors
    ///
    /// Fails with [`LibXml2Error`] when libxml2 cannot create a validation
    /// context or reports an internal error; a non-conforming document is an
    /// `Ok(ValidationOutcome::Invalid(..))`.
    ///
    /// # Panics
    ///
    /// Panics if either handle has been freed.
    pub fn validate(
        &self,
        document: &DocumentHandle<'_>,
        validate_mode: ErrorMode,
    ) -> Result<ValidationOutcome> {
        let schema = self.as_ptr();
        let doc = document.as_ptr();

        let mut collector = ErrorCollector::new(validate_mode);
        let collector_ptr: *mut ErrorCollector = &mut collector;

        let code = unsafe {
            // Create validation context (per call, never shared)
            let ctxt = xmlSchemaNewValidCtxt(schema);
            if ctxt.is_null() {
                return Err(LibXml2Error::ContextCreationFailed {
                    context: "schema validation",
                }
                .into());
            }

            // Anything libxml2 reports outside the context handler lands here too
            let _scope = StructuredErrorScope::install(collector_ptr);
            xmlSchemaSetValidStructuredErrors(
                ctxt,
                Some(collect_structured_error),
                collector_ptr as *mut c_void,
            );
            let code = xmlSchemaValidateDoc(ctxt, doc);

            // Always free the validation context
            xmlSchemaFreeValidCtxt(ctxt);
            code
        };

        debug!(
            schema = self.source(),
            code,
            suppressed = collector.suppressed(),
            "document validated"
        );
        Ok(ValidationOutcome::from_code(code, collector.into_entries())?)
    }

    /// Parse `buf` and validate it in one call, using `mode` for both steps
    ///
    /// Equivalent to [`DocumentHandle::parse`] followed by
    /// [`SchemaHandle::validate`]; the intermediate document is freed before
    /// returning.
    pub fn validate_bytes(&self, buf: &[u8], mode: ErrorMode) -> Result<ValidationOutcome> {
        self.validate_bytes_with(buf, mode, mode)
    }

    /// Like [`SchemaHandle::validate_bytes`] with separate parse and
    /// validation modes
    pub fn validate_bytes_with(
        &self,
        buf: &[u8],
        parse_mode: ErrorMode,
        validate_mode: ErrorMode,
    ) -> Result<ValidationOutcome> {
        let document = DocumentHandle::parse(self.runtime(), buf, parse_mode)?;
        self.validate(&document, validate_mode)
    }
}
