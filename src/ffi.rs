//! C-compatible FFI API for the invoice UI host.
//!
//! # ABI Contract
//!
//! All exported functions use `extern "C"` calling convention and `#[no_mangle]`
//! to ensure stable symbol names. Structured values (invoice state, events,
//! previews, layouts) cross the boundary as UTF-8 JSON.
//!
//! ## Memory management
//! - Buffers and strings returned by `inv_*` functions are allocated on the
//!   Rust heap.
//! - Callers **must** free them with `inv_free_buffer` / `inv_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! - Functions that can fail return a `c_int` (0 = success, non-zero = error).
//! - Error details can be retrieved via `inv_last_error`.
//!
//! | code | meaning                                   |
//! |------|-------------------------------------------|
//! | 1    | null pointer argument                     |
//! | 2    | invalid UTF-8                             |
//! | 3    | invalid JSON input                        |
//! | 4    | capture missing (no image supplied)       |
//! | 5    | export failed (template / image / PDF)    |
//! | 6    | output contained an interior null byte    |
//! | 7    | output too large for a 32-bit length      |
//!
//! ## Thread safety
//! - The `inv_last_error` uses a thread-local, so it is safe to call from
//!   multiple threads.
//!
//! ## Export flow
//! The host captures the HTML from `inv_render_html` as an image (this is the
//! only asynchronous step, and it stays on the host side), then passes the
//! encoded image bytes to `inv_export_pdf`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;

use crate::error::{CaptureError, ExportError};
use crate::invoice::{apply, InvoiceEvent, InvoiceState};
use crate::pagination::{paginate, PageGeometry};
use crate::pipeline::{export_captured, CapturedImage, ExportConfig};
use crate::preview::build_preview;
use crate::templates::invoice_html;
use crate::words::to_words;

const ERR_NULL: c_int = 1;
const ERR_UTF8: c_int = 2;
const ERR_JSON: c_int = 3;
const ERR_CAPTURE: c_int = 4;
const ERR_EXPORT: c_int = 5;
const ERR_NUL_BYTE: c_int = 6;
const ERR_TOO_LARGE: c_int = 7;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    log::debug!("ffi error: {msg}");
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

// ---------------------------------------------------------------------------
// C-compatible configuration types
// ---------------------------------------------------------------------------

/// Optional export configuration passed to [`inv_export_pdf_ex`].
///
/// Fields set to `0` (or `NULL` for `title`) fall back to their defaults:
/// - `page_width`    → 210 mm
/// - `page_height`   → 297 mm
/// - `page_margin`   → 5 mm
/// - `image_quality` → 0.98
/// - `title`         → "Tax Invoice"
#[repr(C)]
pub struct InvExportConfig {
    /// Null-terminated UTF-8 document title embedded in PDF metadata.
    /// Pass `NULL` to use the default title.
    pub title: *const c_char,
    /// Page width in mm. Pass `0.0` to use the default (A4 = 210).
    pub page_width: f32,
    /// Page height in mm. Pass `0.0` to use the default (A4 = 297).
    pub page_height: f32,
    /// Page margin in mm. Pass `0.0` to use the default (5).
    pub page_margin: f32,
    /// JPEG quality 0–1. Pass `0.0` to use the default (0.98).
    pub image_quality: f32,
}

/// Convert an `InvExportConfig` (FFI) to an `ExportConfig` (Rust).
///
/// # Safety
/// `cfg.title`, if non-null, must point to a valid null-terminated UTF-8 string.
unsafe fn export_config_from_c(cfg: &InvExportConfig) -> ExportConfig {
    let defaults = ExportConfig::default();
    let or_default = |v: f32, d: f32| if v == 0.0 { d } else { v };

    let title = if cfg.title.is_null() {
        defaults.title.clone()
    } else {
        CStr::from_ptr(cfg.title)
            .to_str()
            .map(str::to_string)
            .unwrap_or_else(|_| defaults.title.clone())
    };

    ExportConfig {
        title,
        page_width: or_default(cfg.page_width, defaults.page_width),
        page_height: or_default(cfg.page_height, defaults.page_height),
        page_margin: or_default(cfg.page_margin, defaults.page_margin),
        image_quality: or_default(cfg.image_quality, defaults.image_quality),
        capture_scale: defaults.capture_scale,
    }
}

// ---------------------------------------------------------------------------
// Marshalling helpers
// ---------------------------------------------------------------------------

/// Borrow `len` bytes at `ptr` as UTF-8.
///
/// # Safety
/// `ptr` must be non-null and point to `len` readable bytes.
unsafe fn str_arg<'a>(ptr: *const u8, len: u32) -> Result<&'a str, c_int> {
    let bytes = slice::from_raw_parts(ptr, len as usize);
    std::str::from_utf8(bytes).map_err(|e| {
        set_last_error(&format!("Invalid UTF-8: {e}"));
        ERR_UTF8
    })
}

/// Parse a JSON invoice state argument.
///
/// # Safety
/// Same as [`str_arg`].
unsafe fn state_arg(ptr: *const u8, len: u32) -> Result<InvoiceState, c_int> {
    let json = str_arg(ptr, len)?;
    InvoiceState::from_json(json).map_err(|e| {
        set_last_error(&format!("Invalid invoice state JSON: {e}"));
        ERR_JSON
    })
}

/// Hand `s` to the caller as a C string.
///
/// # Safety
/// `out` must be a valid pointer.
unsafe fn write_string(out: *mut *mut c_char, s: String) -> c_int {
    match CString::new(s) {
        Ok(cs) => {
            *out = cs.into_raw();
            0
        }
        Err(_) => {
            set_last_error("Output contained null byte");
            ERR_NUL_BYTE
        }
    }
}

/// Length of an output buffer as reported through the ABI.
fn buffer_len(len: usize) -> Result<u32, c_int> {
    u32::try_from(len).map_err(|_| {
        set_last_error(&format!("Output of {len} bytes exceeds the 32-bit length limit"));
        ERR_TOO_LARGE
    })
}

/// Hand `bytes` to the caller as a heap buffer.
///
/// # Safety
/// `out_buf` and `out_len` must be valid pointers.
unsafe fn write_buffer(out_buf: *mut *mut u8, out_len: *mut u32, bytes: Vec<u8>, len: u32) {
    let buf = bytes.into_boxed_slice();
    *out_buf = Box::into_raw(buf) as *mut u8;
    *out_len = len;
}

// ---------------------------------------------------------------------------
// State + preview
// ---------------------------------------------------------------------------

/// Apply one form event to an invoice state.
///
/// # Parameters
/// - `state_ptr`, `state_len`: current state as JSON
/// - `event_ptr`, `event_len`: event as JSON, e.g.
///   `{"type":"toggle_tax","kind":"igst","enabled":true}`
/// - `out_state_json`: receives the next state as a null-terminated JSON string
///
/// # Returns
/// `0` on success, non-zero on error. On error, call `inv_last_error`.
///
/// # Safety
/// - `state_ptr` / `event_ptr` must point to `state_len` / `event_len` valid bytes.
/// - `out_state_json` must be a valid pointer; free the result with `inv_free_string`.
#[no_mangle]
pub unsafe extern "C" fn inv_apply_event(
    state_ptr: *const u8,
    state_len: u32,
    event_ptr: *const u8,
    event_len: u32,
    out_state_json: *mut *mut c_char,
) -> c_int {
    if state_ptr.is_null() || event_ptr.is_null() || out_state_json.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }

    let state = match state_arg(state_ptr, state_len) {
        Ok(s) => s,
        Err(rc) => return rc,
    };
    let event_json = match str_arg(event_ptr, event_len) {
        Ok(s) => s,
        Err(rc) => return rc,
    };
    let event: InvoiceEvent = match serde_json::from_str(event_json) {
        Ok(e) => e,
        Err(e) => {
            set_last_error(&format!("Invalid event JSON: {e}"));
            return ERR_JSON;
        }
    };

    write_string(out_state_json, apply(state, event).to_json())
}

/// Build the preview document for an invoice state. Returns JSON.
///
/// # Safety
/// - `state_ptr` must point to `state_len` valid bytes.
/// - `out_json_ptr` must be a valid pointer; free the result with `inv_free_string`.
#[no_mangle]
pub unsafe extern "C" fn inv_build_preview(
    state_ptr: *const u8,
    state_len: u32,
    out_json_ptr: *mut *mut c_char,
) -> c_int {
    if state_ptr.is_null() || out_json_ptr.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }

    match state_arg(state_ptr, state_len) {
        Ok(state) => write_string(out_json_ptr, build_preview(&state).to_json()),
        Err(rc) => rc,
    }
}

/// Render the preview of an invoice state as a standalone HTML page.
///
/// # Safety
/// Same as [`inv_build_preview`].
#[no_mangle]
pub unsafe extern "C" fn inv_render_html(
    state_ptr: *const u8,
    state_len: u32,
    out_html_ptr: *mut *mut c_char,
) -> c_int {
    if state_ptr.is_null() || out_html_ptr.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }

    match state_arg(state_ptr, state_len) {
        Ok(state) => match invoice_html(&build_preview(&state)) {
            Ok(html) => write_string(out_html_ptr, html),
            Err(e) => {
                set_last_error(&e.to_string());
                ERR_EXPORT
            }
        },
        Err(rc) => rc,
    }
}

/// Compute only the page placements for an image (no PDF rendering).
/// All page measurements are in mm; returns the layout as JSON.
///
/// # Safety
/// `out_json_ptr` must be a valid pointer; free the result with `inv_free_string`.
#[no_mangle]
pub unsafe extern "C" fn inv_paginate(
    image_height: f32,
    image_width: f32,
    page_width: f32,
    page_height: f32,
    margin: f32,
    out_json_ptr: *mut *mut c_char,
) -> c_int {
    if out_json_ptr.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }

    let geometry = PageGeometry {
        page_width,
        page_height,
        margin,
    };
    write_string(out_json_ptr, paginate(image_height, image_width, &geometry).to_json())
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Export an invoice as a paginated PDF from a captured image.
///
/// # Parameters
/// - `state_ptr`, `state_len`: invoice state as JSON
/// - `image_ptr`, `image_len`: the captured invoice as PNG or JPEG bytes.
///   Pass `NULL` (or length 0) when the capture failed; the export then
///   fails with code 4 and no document is produced.
/// - `out_buf`, `out_len`: PDF output (free with `inv_free_buffer`)
/// - `out_name`: receives the file name `invoice_<number|draft>.pdf`
///   (free with `inv_free_string`); may be `NULL` if not needed
///
/// # Returns
/// `0` on success.
///
/// # Safety
/// - `state_ptr` must point to `state_len` valid bytes; `image_ptr`, if
///   non-null, to `image_len` valid bytes.
/// - `out_buf` and `out_len` must be valid pointers.
#[no_mangle]
pub unsafe extern "C" fn inv_export_pdf(
    state_ptr: *const u8,
    state_len: u32,
    image_ptr: *const u8,
    image_len: u32,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
    out_name: *mut *mut c_char,
) -> c_int {
    inv_export_pdf_ex(
        state_ptr,
        state_len,
        image_ptr,
        image_len,
        ptr::null(),
        out_buf,
        out_len,
        out_name,
    )
}

/// Same as [`inv_export_pdf`] with a custom [`InvExportConfig`].
///
/// # Safety
/// Same as [`inv_export_pdf`]. Additionally `cfg`, if non-null, must point to
/// a fully-initialised [`InvExportConfig`] whose `title` field (if non-null)
/// is a valid null-terminated UTF-8 string.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn inv_export_pdf_ex(
    state_ptr: *const u8,
    state_len: u32,
    image_ptr: *const u8,
    image_len: u32,
    cfg: *const InvExportConfig,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
    out_name: *mut *mut c_char,
) -> c_int {
    if state_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }

    let state = match state_arg(state_ptr, state_len) {
        Ok(s) => s,
        Err(rc) => return rc,
    };

    if image_ptr.is_null() || image_len == 0 {
        let err = ExportError::from(CaptureError::new("no captured image supplied"));
        set_last_error(&err.to_string());
        return ERR_CAPTURE;
    }
    let image = CapturedImage::from_bytes(slice::from_raw_parts(image_ptr, image_len as usize));

    let config = if cfg.is_null() {
        ExportConfig::default()
    } else {
        export_config_from_c(&*cfg)
    };

    match export_captured(&state, image, &config) {
        Ok(doc) => {
            let len = match buffer_len(doc.bytes.len()) {
                Ok(len) => len,
                Err(rc) => return rc,
            };
            if !out_name.is_null() {
                let rc = write_string(out_name, doc.file_name);
                if rc != 0 {
                    return rc;
                }
            }
            write_buffer(out_buf, out_len, doc.bytes, len);
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            ERR_EXPORT
        }
    }
}

// ---------------------------------------------------------------------------
// Words
// ---------------------------------------------------------------------------

/// Spell out `n` in words (Indian grouping). Free the result with
/// `inv_free_string`.
#[no_mangle]
pub extern "C" fn inv_number_to_words(n: u64) -> *mut c_char {
    // Word output is plain ASCII, so this cannot contain a null byte.
    CString::new(to_words(n))
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a PDF buffer returned by `inv_export_pdf`.
///
/// # Safety
/// `buf` must have been returned by a previous `inv_export_pdf` (or similar)
/// call, and `len` must be the corresponding length.
#[no_mangle]
pub unsafe extern "C" fn inv_free_buffer(buf: *mut u8, len: u32) {
    if !buf.is_null() {
        let _ = Box::from_raw(slice::from_raw_parts_mut(buf, len as usize));
    }
}

/// Free a string returned by any `inv_*` function other than
/// `inv_last_error` / `inv_version`.
///
/// # Safety
/// `s` must have been returned by Rust's `CString::into_raw`.
#[no_mangle]
pub unsafe extern "C" fn inv_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Retrieve the last error message. Returns a null-terminated string.
///
/// The returned pointer is valid until the next `inv_*` call on the same
/// thread. The caller should **not** free this pointer – it is managed
/// internally.
///
/// Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn inv_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        let borrow = e.borrow();
        match borrow.as_ref() {
            Some(cs) => cs.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Return the library version as a null-terminated string.
/// The caller must **not** free this pointer.
#[no_mangle]
pub extern "C" fn inv_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
