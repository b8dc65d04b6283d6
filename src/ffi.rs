//! FFI bindings for BetterRest
//!
//! This module provides C-compatible functions for calling the estimator from a
//! host app. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `rest_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

use crate::encoder::ReportEncoder;
use crate::error::EstimationError;
use crate::estimator::{shared_bundled, BedtimeEstimator};
use crate::model::SleepModel;
use crate::types::{BedtimeInputs, WakeTime};

/// Code reported for misuse of the C API itself (null or non-UTF-8 pointers)
const INVALID_ARGUMENT_CODE: &str = "INVALID_ARGUMENT";

// Thread-local storage for the last error message and its code
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
    static LAST_ERROR_CODE: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(code: &str, msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
    LAST_ERROR_CODE.with(|c| {
        *c.borrow_mut() = CString::new(code).ok();
    });
}

fn set_estimation_error(error: &EstimationError) {
    set_last_error(error.code(), &error.to_string());
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
    LAST_ERROR_CODE.with(|c| {
        *c.borrow_mut() = None;
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

fn estimate_to_json(
    estimator: &BedtimeEstimator,
    hour: u32,
    minute: u32,
    sleep_hours: f64,
    coffee_cups: u32,
) -> Result<String, EstimationError> {
    let inputs = BedtimeInputs::new(WakeTime::new(hour, minute)?, sleep_hours, coffee_cups)?;
    let bedtime = estimator.estimate_inputs(&inputs)?;
    ReportEncoder::new().encode_to_json(
        &inputs,
        &bedtime,
        estimator.model().version(),
        estimator.wake_encoding(),
    )
}

fn finish(result: Result<String, EstimationError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_estimation_error(&e);
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Estimate a bedtime with the bundled model and return a JSON report.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `rest_free_string`.
/// - Returns NULL on error; call `rest_last_error` to get the error message.
/// - The bundled model is parsed once per process and shared across calls.
#[no_mangle]
pub unsafe extern "C" fn rest_estimate_bedtime(
    hour: u32,
    minute: u32,
    sleep_hours: f64,
    coffee_cups: u32,
) -> *mut c_char {
    clear_last_error();

    let result = shared_bundled()
        .and_then(|estimator| estimate_to_json(estimator, hour, minute, sleep_hours, coffee_cups));
    finish(result)
}

// ============================================================================
// Stateful Estimator API
// ============================================================================

/// Opaque handle to a loaded estimator
pub struct RestEstimatorHandle {
    estimator: BedtimeEstimator,
}

/// Load an estimator from a model artifact path, or the bundled model when
/// `model_path` is NULL.
///
/// # Safety
/// - `model_path` must be NULL or a valid null-terminated C string.
/// - Must be freed with `rest_estimator_free`.
/// - Returns NULL on error; call `rest_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rest_estimator_load(
    model_path: *const c_char,
) -> *mut RestEstimatorHandle {
    clear_last_error();

    let estimator = if model_path.is_null() {
        BedtimeEstimator::bundled()
    } else {
        match cstr_to_string(model_path) {
            Some(path) => BedtimeEstimator::from_path(Path::new(&path)),
            None => {
                set_last_error(INVALID_ARGUMENT_CODE, "Invalid model path string pointer");
                return ptr::null_mut();
            }
        }
    };

    match estimator {
        Ok(estimator) => Box::into_raw(Box::new(RestEstimatorHandle { estimator })),
        Err(e) => {
            set_estimation_error(&e);
            ptr::null_mut()
        }
    }
}

/// Free an estimator.
///
/// # Safety
/// - `estimator` must be a valid pointer returned by `rest_estimator_load`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn rest_estimator_free(estimator: *mut RestEstimatorHandle) {
    if !estimator.is_null() {
        drop(Box::from_raw(estimator));
    }
}

/// Estimate a bedtime with a loaded estimator and return a JSON report.
///
/// # Safety
/// - `estimator` must be a valid pointer returned by `rest_estimator_load`.
/// - Returns a newly allocated string that must be freed with `rest_free_string`.
/// - Returns NULL on error; call `rest_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rest_estimator_estimate(
    estimator: *const RestEstimatorHandle,
    hour: u32,
    minute: u32,
    sleep_hours: f64,
    coffee_cups: u32,
) -> *mut c_char {
    clear_last_error();

    if estimator.is_null() {
        set_last_error(INVALID_ARGUMENT_CODE, "Null estimator pointer");
        return ptr::null_mut();
    }

    let handle = &*estimator;
    finish(estimate_to_json(
        &handle.estimator,
        hour,
        minute,
        sleep_hours,
        coffee_cups,
    ))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by BetterRest functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a BetterRest function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn rest_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next BetterRest call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn rest_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the stable code of the last error, e.g. `INVALID_INPUT`.
///
/// Hosts should branch on this code and show their own text; the message from
/// `rest_last_error` is diagnostic detail.
///
/// # Safety
/// - Returns a pointer to a thread-local string.
/// - The returned pointer is valid until the next BetterRest call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn rest_last_error_code() -> *const c_char {
    LAST_ERROR_CODE.with(|c| match &*c.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn rest_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BUNDLED_MODEL_JSON;
    use crate::REST_VERSION;
    use std::io::Write;

    #[test]
    fn test_ffi_estimate_bedtime() {
        unsafe {
            let result = rest_estimate_bedtime(7, 0, 8.0, 1);
            assert!(!result.is_null());

            let json = CStr::from_ptr(result).to_str().unwrap();
            let report: serde_json::Value = serde_json::from_str(json).unwrap();
            assert_eq!(report["bedtime"], "22:47:10");
            assert_eq!(report["producer"]["name"], "better-rest");

            rest_free_string(result);
        }
    }

    #[test]
    fn test_ffi_estimator_lifecycle() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BUNDLED_MODEL_JSON.as_bytes()).unwrap();
        let path = CString::new(file.path().to_str().unwrap()).unwrap();

        unsafe {
            let estimator = rest_estimator_load(path.as_ptr());
            assert!(!estimator.is_null());

            let result = rest_estimator_estimate(estimator, 6, 30, 7.5, 0);
            assert!(!result.is_null());
            rest_free_string(result);

            rest_estimator_free(estimator);

            let bundled = rest_estimator_load(ptr::null());
            assert!(!bundled.is_null());
            rest_estimator_free(bundled);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let result = rest_estimate_bedtime(7, 0, 30.0, 1);
            assert!(result.is_null());

            let error = rest_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("desired sleep"));

            let missing = CString::new("/nonexistent/SleepCalculator.json").unwrap();
            let estimator = rest_estimator_load(missing.as_ptr());
            assert!(estimator.is_null());
            assert!(!rest_last_error().is_null());

            let result = rest_estimator_estimate(ptr::null(), 7, 0, 8.0, 1);
            assert!(result.is_null());
        }
    }

    fn last_code() -> Option<String> {
        unsafe {
            let code = rest_last_error_code();
            if code.is_null() {
                None
            } else {
                Some(CStr::from_ptr(code).to_str().unwrap().to_string())
            }
        }
    }

    #[test]
    fn test_ffi_error_codes() {
        unsafe {
            assert!(rest_estimate_bedtime(7, 0, 30.0, 1).is_null());
            assert_eq!(last_code().as_deref(), Some("INVALID_INPUT"));

            assert!(rest_estimate_bedtime(24, 0, 8.0, 1).is_null());
            assert_eq!(last_code().as_deref(), Some("INVALID_INPUT"));

            let missing = CString::new("/nonexistent/SleepCalculator.json").unwrap();
            assert!(rest_estimator_load(missing.as_ptr()).is_null());
            assert_eq!(last_code().as_deref(), Some("MODEL_UNAVAILABLE"));

            assert!(rest_estimator_estimate(ptr::null(), 7, 0, 8.0, 1).is_null());
            assert_eq!(last_code().as_deref(), Some("INVALID_ARGUMENT"));

            let result = rest_estimate_bedtime(7, 0, 8.0, 1);
            assert!(!result.is_null());
            assert_eq!(last_code(), None);
            assert!(rest_last_error().is_null());
            rest_free_string(result);
        }
    }

    #[test]
    fn test_ffi_stateless_calls_share_bundled_estimator() {
        let first = shared_bundled().unwrap() as *const BedtimeEstimator;
        unsafe {
            let result = rest_estimate_bedtime(6, 45, 8.0, 2);
            assert!(!result.is_null());
            rest_free_string(result);
        }
        let second = shared_bundled().unwrap() as *const BedtimeEstimator;
        assert_eq!(first, second);
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = rest_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, REST_VERSION);
        }
    }
}
