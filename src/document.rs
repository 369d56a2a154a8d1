//! Parsed XML documents

use std::fmt;

use libc::{c_char, c_int};
use tracing::debug;

use crate::diagnostics::{ErrorCollector, ErrorMode};
use crate::error::{LibXml2Error, ParseError, ParseTarget, Result};
use crate::libxml2::{StructuredErrorScope, XML_PARSE_NONET, XmlDoc, xmlFreeDoc, xmlReadMemory};
use crate::runtime::XsdRuntime;

/// Owning handle to a libxml2 document tree
///
/// Built from bytes only; the parser is not allowed to fetch external
/// resources over the network. Validation never modifies the tree, so one
/// document can be validated against several schemas concurrently.
pub struct DocumentHandle<'rt> {
    runtime: &'rt XsdRuntime,
    ptr: *mut XmlDoc,
    size: usize,
}

// Safety: the tree is only read after parsing; `free` requires `&mut self`.
unsafe impl Send for DocumentHandle<'_> {}
unsafe impl Sync for DocumentHandle<'_> {}

impl<'rt> DocumentHandle<'rt> {
    /// Parse an XML document from `buf`
    ///
    /// # Errors
    ///
    /// Malformed XML yields a [`ParseError`] whose entries carry the line numbers
    /// reported by libxml2, limited by `parse_mode`.
    pub fn parse(runtime: &'rt XsdRuntime, buf: &[u8], parse_mode: ErrorMode) -> Result<Self> {
        let size =
            c_int::try_from(buf.len()).map_err(|_| LibXml2Error::BufferTooLarge { len: buf.len() })?;

        let mut collector = ErrorCollector::new(parse_mode);
        let collector_ptr: *mut ErrorCollector = &mut collector;

        let ptr = unsafe {
            let _scope = StructuredErrorScope::install(collector_ptr);
            xmlReadMemory(
                buf.as_ptr() as *const c_char,
                size,
                std::ptr::null(),
                std::ptr::null(),
                XML_PARSE_NONET,
            )
        };

        if ptr.is_null() {
            debug!(
                size = buf.len(),
                suppressed = collector.suppressed(),
                "document parsing failed"
            );
            return Err(ParseError {
                target: ParseTarget::Document,
                errors: collector.into_entries(),
            }
            .into());
        }

        runtime.handle_created();
        debug!(size = buf.len(), "document parsed");
        Ok(Self {
            runtime,
            ptr,
            size: buf.len(),
        })
    }

    /// Release the document tree; calling it again does nothing
    pub fn free(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        unsafe {
            xmlFreeDoc(self.ptr);
        }
        self.ptr = std::ptr::null_mut();
        self.runtime.handle_released();
        debug!(size = self.size, "document freed");
    }

    pub fn is_freed(&self) -> bool {
        self.ptr.is_null()
    }

    /// Size in bytes of the buffer the document was parsed from
    pub fn source_len(&self) -> usize {
        self.size
    }

    pub fn runtime(&self) -> &'rt XsdRuntime {
        self.runtime
    }

    /// # Panics
    ///
    /// Panics if the handle has been freed.
    pub(crate) fn as_ptr(&self) -> *mut XmlDoc {
        assert!(!self.ptr.is_null(), "document handle used after free");
        self.ptr
    }
}

impl fmt::Debug for DocumentHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("size", &self.size)
            .field("freed", &self.is_freed())
            .finish()
    }
}

impl Drop for DocumentHandle<'_> {
    fn drop(&mut self) {
        self.free();
    }
}
