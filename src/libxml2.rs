//! LibXML2 FFI glue
//!
//! Raw declarations for the parts of libxml2 this crate drives, plus the two
//! pieces of glue every native call needs: the structured-error callback that
//! feeds an [`ErrorCollector`], and [`StructuredErrorScope`], which installs that
//! callback as the calling thread's handler for the duration of one call.
//!
//! ## Thread Safety Strategy
//!
//! According to the libxml2 documentation (http://xmlsoft.org/threads.html):
//!
//! - Parsing of distinct documents is thread-safe when each call uses its own
//!   context
//! - Validation is thread-safe for different validation contexts, and compiled
//!   schemas are read-only during validation
//! - Error handler globals (`xmlSetStructuredErrorFunc`) are thread-local
//!
//! Schema compilation is still serialized by [`crate::XsdRuntime`]; document
//! parsing and validation run fully parallel. Each validation creates its own
//! `xmlSchemaValidCtxt`.

use std::ffi::{CStr, c_void};

use libc::{c_char, c_int};

use crate::diagnostics::{ErrorCollector, ErrorEntry};

/// ## Opaque libxml2 structures
#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

/// `xmlError` as laid out by libxml2
#[repr(C)]
pub struct XmlErrorRecord {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *const XmlErrorRecord)>;

// xmlErrorLevel
pub const XML_ERR_WARNING: c_int = 1;
pub const XML_ERR_ERROR: c_int = 2;

// xmlParserOption
pub const XML_PARSE_NONET: c_int = 1 << 11;

// xmlFeature
pub const XML_WITH_THREAD: c_int = 1;
pub const XML_WITH_SCHEMAS: c_int = 25;

// External libxml2 FFI declarations
#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();
    pub fn xmlInitGlobals();
    pub fn xmlCleanupParser();
    pub fn xmlHasFeature(feature: c_int) -> c_int;

    pub fn xmlSetStructuredErrorFunc(ctx: *mut c_void, handler: XmlStructuredErrorFunc);

    // Document parsing
    pub fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    pub fn xmlFreeDoc(doc: *mut XmlDoc);

    // Schema parsing functions
    pub fn xmlSchemaNewParserCtxt(url: *const c_char) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaNewDocParserCtxt(doc: *mut XmlDoc) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaParse(ctxt: *mut XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation functions
    pub fn xmlSchemaNewValidCtxt(schema: *mut XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;
}

/// Callback for libxml2 to report errors (structured)
///
/// `user_data` must point to a live [`ErrorCollector`]. Warnings are dropped.
pub unsafe extern "C" fn collect_structured_error(
    user_data: *mut c_void,
    error: *const XmlErrorRecord,
) {
    if user_data.is_null() || error.is_null() {
        return;
    }

    let collector = unsafe { &mut *(user_data as *mut ErrorCollector) };
    let error = unsafe { &*error };

    if error.level < XML_ERR_ERROR {
        return;
    }

    let message = if error.message.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(error.message) }
            .to_string_lossy()
            .into_owned()
    };

    collector.record(ErrorEntry::normalize(error.line, &message).with_code(error.code));
}

/// Routes the calling thread's libxml2 errors into a collector
///
/// libxml2 keeps the structured error handler in thread-local storage, so the
/// scope only affects native calls made on this thread. The handler is reset
/// when the scope is dropped; the collector must outlive the scope.
pub struct StructuredErrorScope {
    _not_send: std::marker::PhantomData<*mut c_void>,
}

impl StructuredErrorScope {
    /// # Safety
    ///
    /// `collector` must stay valid and must not be accessed through any other
    /// path until the returned scope is dropped.
    pub unsafe fn install(collector: *mut ErrorCollector) -> Self {
        unsafe {
            xmlSetStructuredErrorFunc(collector as *mut c_void, Some(collect_structured_error));
        }
        Self {
            _not_send: std::marker::PhantomData,
        }
    }
}

impl Drop for StructuredErrorScope {
    fn drop(&mut self) {
        unsafe {
            xmlSetStructuredErrorFunc(std::ptr::null_mut(), None);
        }
    }
}

/// Ask the allocator to hand freed native memory back to the OS
///
/// libxml2 frees through the C allocator, which keeps released pages cached.
/// Returns true when memory was actually released.
pub fn reclaim_native_memory() -> bool {
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    {
        unsafe { libc::malloc_trim(0) != 0 }
    }
    #[cfg(not(all(target_os = "linux", target_env = "gnu")))]
    {
        false
    }
}
