//! Compiled XSD schemas

use std::ffi::{CString, c_void};
use std::fmt;
use std::path::PathBuf;
use std::ptr;

use libc::{c_char, c_int};
use tracing::debug;

use crate::diagnostics::{ErrorCollector, ErrorMode};
use crate::error::{LibXml2Error, ParseError, ParseTarget, Result};
use crate::libxml2::{
    StructuredErrorScope, XmlDoc, XmlSchema, XmlSchemaParserCtxt, collect_structured_error,
    xmlFreeDoc, xmlReadMemory, xmlSchemaFree, xmlSchemaFreeParserCtxt, xmlSchemaNewDocParserCtxt,
    xmlSchemaNewParserCtxt, xmlSchemaParse, xmlSchemaSetParserStructuredErrors,
};
use crate::runtime::XsdRuntime;

/// Where a schema comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// Local file path
    Path(PathBuf),
    /// Remote `http://` or `https://` URL
    Url(String),
}

impl SchemaSource {
    pub fn classify(source: &str) -> Self {
        let lower = source.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            SchemaSource::Url(source.trim().to_string())
        } else {
            SchemaSource::Path(PathBuf::from(source))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SchemaSource::Url(_))
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaSource::Path(path) => write!(f, "{}", path.display()),
            SchemaSource::Url(url) => f.write_str(url),
        }
    }
}

/// Owning handle to a compiled libxml2 schema
///
/// The schema is freed by [`SchemaHandle::free`] or when the handle is dropped,
/// whichever comes first. A compiled schema is only read during validation,
/// so one handle can validate documents from many threads at once.
///
/// Validating through a freed handle panics.
pub struct SchemaHandle<'rt> {
    runtime: &'rt XsdRuntime,
    ptr: *mut XmlSchema,
    // Schema document compiled from memory, freed after the schema
    doc: *mut XmlDoc,
    source: String,
}

// Safety: libxml2 documentation states that compiled xmlSchema structures are
// thread-safe for reading. See: http://xmlsoft.org/threads.html
// The pointers are only written by `free`, which requires `&mut self`.
unsafe impl Send for SchemaHandle<'_> {}
unsafe impl Sync for SchemaHandle<'_> {}

impl<'rt> SchemaHandle<'rt> {
    /// Parse and compile the XSD at `source`
    ///
    /// `source` is a file path or a URL; libxml2 resolves it, along with any
    /// `xs:include`/`xs:import` relative to it. URL loading blocks the calling
    /// thread and has no timeout at this layer.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] with the diagnostics collected under
    /// `parse_mode` when the schema cannot be read or compiled.
    pub fn parse(runtime: &'rt XsdRuntime, source: &str, parse_mode: ErrorMode) -> Result<Self> {
        let c_source = CString::new(source).map_err(|_| LibXml2Error::InvalidSource {
            location: source.to_string(),
        })?;

        let _serialized = runtime.lock_schema_parser();
        let ctxt = unsafe { xmlSchemaNewParserCtxt(c_source.as_ptr()) };
        if ctxt.is_null() {
            return Err(LibXml2Error::ContextCreationFailed {
                context: "schema parser",
            }
            .into());
        }

        Self::compile(runtime, ctxt, ptr::null_mut(), source, parse_mode)
    }

    /// Parse and compile an XSD held in memory
    ///
    /// `base_url` is the location the bytes were fetched from. It labels the
    /// handle and its errors, and relative `xs:include`/`xs:import` locations
    /// resolve against it exactly as they would for [`SchemaHandle::parse`].
    pub fn parse_memory(
        runtime: &'rt XsdRuntime,
        base_url: &str,
        schema_data: &[u8],
        parse_mode: ErrorMode,
    ) -> Result<Self> {
        let size = c_int::try_from(schema_data.len()).map_err(|_| LibXml2Error::BufferTooLarge {
            len: schema_data.len(),
        })?;
        let c_base = CString::new(base_url).map_err(|_| LibXml2Error::InvalidSource {
            location: base_url.to_string(),
        })?;

        let _serialized = runtime.lock_schema_parser();

        let mut collector = ErrorCollector::new(parse_mode);
        let doc = unsafe {
            let _scope = StructuredErrorScope::install(&mut collector);
            xmlReadMemory(
                schema_data.as_ptr() as *const c_char,
                size,
                c_base.as_ptr(),
                ptr::null(),
                0,
            )
        };
        if doc.is_null() {
            debug!(base_url, "schema document parsing failed");
            return Err(ParseError {
                target: ParseTarget::Schema {
                    source: base_url.to_string(),
                },
                errors: collector.into_entries(),
            }
            .into());
        }

        // The context does not take ownership of `doc`
        let ctxt = unsafe { xmlSchemaNewDocParserCtxt(doc) };
        if ctxt.is_null() {
            unsafe { xmlFreeDoc(doc) };
            return Err(LibXml2Error::ContextCreationFailed {
                context: "schema parser",
            }
            .into());
        }

        Self::compile(runtime, ctxt, doc, base_url, parse_mode)
    }

    /// Runs `xmlSchemaParse` on `ctxt` and always frees the context
    ///
    /// `doc` is the caller-owned schema document, or null when libxml2 loaded
    /// it; on success the handle takes it over.
    fn compile(
        runtime: &'rt XsdRuntime,
        ctxt: *mut XmlSchemaParserCtxt,
        doc: *mut XmlDoc,
        source: &str,
        parse_mode: ErrorMode,
    ) -> Result<Self> {
        let mut collector = ErrorCollector::new(parse_mode);
        let collector_ptr: *mut ErrorCollector = &mut collector;

        let ptr = unsafe {
            // Schema diagnostics go to the context handler; I/O and XML syntax
            // errors while loading schema documents go to the thread handler.
            let _scope = StructuredErrorScope::install(collector_ptr);
            xmlSchemaSetParserStructuredErrors(
                ctxt,
                Some(collect_structured_error),
                collector_ptr as *mut c_void,
            );
            let schema = xmlSchemaParse(ctxt);
            xmlSchemaFreeParserCtxt(ctxt);
            schema
        };

        if ptr.is_null() {
            if !doc.is_null() {
                unsafe { xmlFreeDoc(doc) };
            }
            debug!(source, suppressed = collector.suppressed(), "schema parsing failed");
            return Err(ParseError {
                target: ParseTarget::Schema {
                    source: source.to_string(),
                },
                errors: collector.into_entries(),
            }
            .into());
        }

        runtime.handle_created();
        debug!(source, "schema compiled");
        Ok(Self {
            runtime,
            ptr,
            doc,
            source: source.to_string(),
        })
    }

    /// Release the compiled schema; calling it again does nothing
    pub fn free(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        unsafe {
            xmlSchemaFree(self.ptr);
            if !self.doc.is_null() {
                xmlFreeDoc(self.doc);
            }
        }
        self.ptr = ptr::null_mut();
        self.doc = ptr::null_mut();
        self.runtime.handle_released();
        debug!(source = %self.source, "schema freed");
    }

    pub fn is_freed(&self) -> bool {
        self.ptr.is_null()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn runtime(&self) -> &'rt XsdRuntime {
        self.runtime
    }

    /// Raw pointer for FFI calls
    ///
    /// # Panics
    ///
    /// Panics if the handle has been freed.
    pub(crate) fn as_ptr(&self) -> *mut XmlSchema {
        assert!(
            !self.ptr.is_null(),
            "schema handle for {} used after free",
            self.source
        );
        self.ptr
    }
}

impl fmt::Debug for SchemaHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaHandle")
            .field("source", &self.source)
            .field("freed", &self.is_freed())
            .finish()
    }
}

impl Drop for SchemaHandle<'_> {
    fn drop(&mut self) {
        self.free();
    }
}
