//! C-compatible FFI API for cross-language bindings.
//!
//! # ABI Contract
//!
//! All exported functions use the `extern "C"` calling convention and
//! `#[no_mangle]` symbol names. The header `include/typeset.h` is generated
//! from this module by `build.rs`.
//!
//! ## Memory management
//! - Buffers returned by `typeset_*` functions are allocated on the Rust heap.
//! - Callers **must** free them with `typeset_free_buffer` / `typeset_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! - Functions that can fail return a `c_int` (0 = success, non-zero = error).
//! - Error details can be retrieved via `typeset_last_error`.
//!
//! ## Usage from C
//! ```c
//! uint8_t *pdf; uint32_t len, pages;
//! if (typeset_compile(xml, strlen(xml), NULL, &pdf, &len, &pages) != 0)
//!     fprintf(stderr, "%s\n", typeset_last_error());
//! typeset_free_buffer(pdf, len);
//! ```

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::PathBuf;
use std::ptr;
use std::slice;

use crate::pipeline::{generate_layout, generate_pdf, PipelineConfig};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Optional configuration passed to the compile functions.
///
/// Every field may be `NULL`.
#[repr(C)]
pub struct TypesetConfig {
    /// Null-terminated UTF-8 title; `NULL` uses the document's subject.
    pub title: *const c_char,
    /// Directory of `<Family>-Regular.ttf` style font files.
    pub font_dir: *const c_char,
    /// Base directory for relative image paths.
    pub resource_dir: *const c_char,
}

/// # Safety
/// `ptr`, if non-null, must point to a valid null-terminated string.
unsafe fn optional_str(ptr: *const c_char) -> Result<Option<String>, String> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(|s| Some(s.to_string()))
        .map_err(|e| format!("Invalid UTF-8 in config: {e}"))
}

/// # Safety
/// `cfg`, if non-null, must point to a fully initialised [`TypesetConfig`].
unsafe fn pipeline_config_from_c(cfg: *const TypesetConfig) -> Result<PipelineConfig, String> {
    let Some(cfg) = cfg.as_ref() else {
        return Ok(PipelineConfig::default());
    };
    Ok(PipelineConfig {
        title: optional_str(cfg.title)?,
        font_dir: optional_str(cfg.font_dir)?.map(PathBuf::from),
        resource_dir: optional_str(cfg.resource_dir)?.map(PathBuf::from),
    })
}

/// # Safety
/// `xml_ptr` must point to `xml_len` valid bytes.
unsafe fn input<'a>(xml_ptr: *const u8, xml_len: u32) -> Result<&'a str, String> {
    let bytes = slice::from_raw_parts(xml_ptr, xml_len as usize);
    std::str::from_utf8(bytes).map_err(|e| format!("Invalid UTF-8: {e}"))
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Compile an XML document to PDF.
///
/// # Returns
/// `0` on success, `1` for null arguments, `2` for invalid input or config,
/// `3` when loading or rendering fails. On error, call `typeset_last_error`.
///
/// # Safety
/// - `xml_ptr` must point to `xml_len` valid bytes.
/// - `cfg` may be null; otherwise see [`TypesetConfig`].
/// - `out_buf`, `out_len` and `out_pages` must be valid pointers.
/// - The caller must free `*out_buf` by calling `typeset_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn typeset_compile(
    xml_ptr: *const u8,
    xml_len: u32,
    cfg: *const TypesetConfig,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
    out_pages: *mut u32,
) -> c_int {
    if xml_ptr.is_null() || out_buf.is_null() || out_len.is_null() || out_pages.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }
    let (xml, config) = match input(xml_ptr, xml_len).and_then(|xml| Ok((xml, pipeline_config_from_c(cfg)?))) {
        Ok(v) => v,
        Err(e) => {
            set_last_error(&e);
            return 2;
        }
    };

    match generate_pdf(xml, &config) {
        Ok(compiled) => {
            let len = compiled.bytes.len() as u32;
            let buf = compiled.bytes.into_boxed_slice();
            *out_buf = Box::into_raw(buf) as *mut u8;
            *out_len = len;
            *out_pages = compiled.pages as u32;
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            3
        }
    }
}

/// Run the layout only and return the recorded draw operations as JSON.
///
/// # Safety
/// Same as `typeset_compile`. `*out_json` must be freed with
/// `typeset_free_string`.
#[no_mangle]
pub unsafe extern "C" fn typeset_compile_layout(
    xml_ptr: *const u8,
    xml_len: u32,
    cfg: *const TypesetConfig,
    out_json: *mut *mut c_char,
) -> c_int {
    if xml_ptr.is_null() || out_json.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }
    let (xml, config) = match input(xml_ptr, xml_len).and_then(|xml| Ok((xml, pipeline_config_from_c(cfg)?))) {
        Ok(v) => v,
        Err(e) => {
            set_last_error(&e);
            return 2;
        }
    };

    let json = match generate_layout(xml, &config) {
        Ok(recording) => match recording.to_json() {
            Ok(json) => json,
            Err(e) => {
                set_last_error(&format!("JSON encoding failed: {e}"));
                return 3;
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            return 3;
        }
    };
    match CString::new(json) {
        Ok(cs) => {
            *out_json = cs.into_raw();
            0
        }
        Err(_) => {
            set_last_error("JSON contained null byte");
            3
        }
    }
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a PDF buffer returned by `typeset_compile`.
///
/// # Safety
/// `buf` must have been returned by `typeset_compile`, and `len` must be the
/// corresponding length.
#[no_mangle]
pub unsafe extern "C" fn typeset_free_buffer(buf: *mut u8, len: u32) {
    if !buf.is_null() {
        let _ = Box::from_raw(slice::from_raw_parts_mut(buf, len as usize));
    }
}

/// Free a string returned by `typeset_compile_layout`.
///
/// # Safety
/// `s` must have been returned by Rust's `CString::into_raw`.
#[no_mangle]
pub unsafe extern "C" fn typeset_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// The last error message on this thread, or null.
///
/// The pointer stays valid until the next failing `typeset_*` call on the
/// same thread. The caller must **not** free it.
#[no_mangle]
pub extern "C" fn typeset_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        let borrow = e.borrow();
        match borrow.as_ref() {
            Some(cs) => cs.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Library version as a static null-terminated string.
#[no_mangle]
pub extern "C" fn typeset_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
