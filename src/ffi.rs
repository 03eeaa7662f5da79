//! FFI bindings for Keyprint
//!
//! This module provides C-compatible functions for calling Keyprint from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `keyprint_free_string`.
//!
//! Capture sessions are owned handles: each host capture gets its own
//! `CaptureSessionHandle`, and nothing is shared between handles.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::capture::CaptureSession;
use crate::features::FeatureExtractor;
use crate::pipeline::{enroll_json, events_to_features_json, verify_json};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Derive a feature vector from an interaction stream (JSON array or NDJSON).
///
/// # Safety
/// - `events_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `keyprint_free_string`.
/// - Returns NULL on error; call `keyprint_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn keyprint_extract_features(events_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let events_str = match cstr_to_string(events_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid events string pointer");
            return ptr::null_mut();
        }
    };

    match events_to_features_json(&events_str) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Enroll a profile for `user_id` from an interaction stream.
///
/// # Safety
/// - `user_id` and `events_json` must be valid null-terminated C strings.
/// - Returns a newly allocated profile JSON string that must be freed with
///   `keyprint_free_string`.
/// - Returns NULL on error; call `keyprint_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn keyprint_enroll(
    user_id: *const c_char,
    events_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let user_str = match cstr_to_string(user_id) {
        Some(s) if !s.is_empty() => s,
        _ => {
            set_last_error("Invalid user_id string pointer");
            return ptr::null_mut();
        }
    };

    let events_str = match cstr_to_string(events_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid events string pointer");
            return ptr::null_mut();
        }
    };

    match enroll_json(&user_str, &events_str) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Verify an interaction stream against an enrolled profile.
///
/// # Safety
/// - `profile_json` and `events_json` must be valid null-terminated C strings.
/// - Returns a newly allocated report JSON string that must be freed with
///   `keyprint_free_string`.
/// - Returns NULL on error; call `keyprint_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn keyprint_verify(
    profile_json: *const c_char,
    events_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let profile_str = match cstr_to_string(profile_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid profile string pointer");
            return ptr::null_mut();
        }
    };

    let events_str = match cstr_to_string(events_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid events string pointer");
            return ptr::null_mut();
        }
    };

    match verify_json(&profile_str, &events_str) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Capture Session API
// ============================================================================

/// Opaque handle to a CaptureSession
pub struct CaptureSessionHandle {
    session: CaptureSession,
}

/// Create a new capture session that is already recording.
///
/// # Safety
/// - Returns a pointer to a newly allocated session.
/// - Must be freed with `keyprint_session_free`.
#[no_mangle]
pub unsafe extern "C" fn keyprint_session_new() -> *mut CaptureSessionHandle {
    clear_last_error();

    let mut session = CaptureSession::new();
    session.start();
    Box::into_raw(Box::new(CaptureSessionHandle { session }))
}

/// Free a capture session.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `keyprint_session_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn keyprint_session_free(handle: *mut CaptureSessionHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Reset the session and begin recording again.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `keyprint_session_new`.
/// - Returns 0 on success, -1 on a NULL handle.
#[no_mangle]
pub unsafe extern "C" fn keyprint_session_start(handle: *mut CaptureSessionHandle) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    (*handle).session.start();
    0
}

/// Stop recording. Later events are ignored.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `keyprint_session_new`.
/// - Returns 0 on success, -1 on a NULL handle.
#[no_mangle]
pub unsafe extern "C" fn keyprint_session_stop(handle: *mut CaptureSessionHandle) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    (*handle).session.stop();
    0
}

/// Record a key press.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `keyprint_session_new`.
/// - `key` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on invalid arguments.
#[no_mangle]
pub unsafe extern "C" fn keyprint_session_key_down(
    handle: *mut CaptureSessionHandle,
    key: *const c_char,
    timestamp_ms: i64,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    let Some(key_str) = cstr_to_string(key) else {
        set_last_error("Invalid key string pointer");
        return -1;
    };

    (*handle).session.record_key_down(&key_str, timestamp_ms);
    0
}

/// Record a key release.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `keyprint_session_new`.
/// - `key` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on invalid arguments.
#[no_mangle]
pub unsafe extern "C" fn keyprint_session_key_up(
    handle: *mut CaptureSessionHandle,
    key: *const c_char,
    timestamp_ms: i64,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    let Some(key_str) = cstr_to_string(key) else {
        set_last_error("Invalid key string pointer");
        return -1;
    };

    (*handle).session.record_key_up(&key_str, timestamp_ms);
    0
}

/// Record a pointer position.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `keyprint_session_new`.
/// - Returns 0 on success, -1 on a NULL handle.
#[no_mangle]
pub unsafe extern "C" fn keyprint_session_pointer_move(
    handle: *mut CaptureSessionHandle,
    x: f64,
    y: f64,
    timestamp_ms: i64,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    (*handle).session.record_pointer_move(x, y, timestamp_ms);
    0
}

/// Number of events recorded so far, or -1 on a NULL handle.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `keyprint_session_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn keyprint_session_event_count(handle: *const CaptureSessionHandle) -> i64 {
    if handle.is_null() {
        return -1;
    }
    (*handle).session.event_count() as i64
}

/// Stop the session and derive its feature vector as JSON.
///
/// A session that is still recording is stopped first; call
/// `keyprint_session_start` to record again.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `keyprint_session_new`.
/// - Returns a newly allocated string that must be freed with `keyprint_free_string`.
/// - Returns NULL on error; call `keyprint_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn keyprint_session_extract_json(
    handle: *mut CaptureSessionHandle,
) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }

    let session = &mut (*handle).session;
    if session.is_capturing() {
        session.stop();
    }
    let features = FeatureExtractor::extract(session);
    match serde_json::to_string(&features) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Keyprint functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Keyprint function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn keyprint_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Keyprint function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn keyprint_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Keyprint library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn keyprint_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
