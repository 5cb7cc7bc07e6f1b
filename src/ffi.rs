//! FFI bindings for CGM Flux
//!
//! This module provides C-compatible functions for calling cgm-flux from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `cgm_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::CgmProcessor;
use crate::recommend::RecommendationEngine;

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

/// Config from an optional C string; NULL means defaults
unsafe fn config_from_ptr(config_json: *const c_char) -> Result<AnalysisConfig, AnalysisError> {
    if config_json.is_null() {
        return Ok(AnalysisConfig::default());
    }
    match cstr_to_string(config_json) {
        Some(json) => AnalysisConfig::from_json(&json),
        None => Err(AnalysisError::InvalidConfig(
            "config is not valid UTF-8".to_string(),
        )),
    }
}

/// Hand a result to the caller as an owned C string, or record the error
fn finish(result: Result<String, AnalysisError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze a CGM JSON payload and return the interpretation report JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `config_json` must be NULL (defaults) or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `cgm_free_string`.
/// - Returns NULL on error; call `cgm_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cgm_analyze(
    json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(
        config_from_ptr(config_json)
            .and_then(CgmProcessor::with_config)
            .and_then(|processor| processor.process(&json_str)),
    )
}

/// Map a recommendation-flag object to a JSON array of advisories.
///
/// Unknown keys are ignored and missing flags read as false.
///
/// # Safety
/// - `context_json` must be a valid null-terminated C string holding a JSON object.
/// - Returns a newly allocated string that must be freed with `cgm_free_string`.
/// - Returns NULL on error; call `cgm_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cgm_recommend(context_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(context_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let result = serde_json::from_str::<serde_json::Value>(&json_str)
        .map_err(AnalysisError::JsonError)
        .and_then(|value| match value.as_object() {
            Some(flags) => Ok(RecommendationEngine::recommend_map(flags)),
            None => Err(AnalysisError::UnrecognizedFormat(
                "recommendation context must be a JSON object".to_string(),
            )),
        })
        .and_then(|advice| serde_json::to_string(&advice).map_err(AnalysisError::JsonError));

    finish(result)
}

// ============================================================================
// Processor API
// ============================================================================

/// Opaque handle to a CgmProcessor
pub struct CgmProcessorHandle {
    processor: CgmProcessor,
}

/// Create a new CgmProcessor.
///
/// # Safety
/// - `config_json` must be NULL (defaults) or a valid null-terminated C string.
/// - Returns a pointer to a newly allocated CgmProcessor.
/// - Must be freed with `cgm_processor_free`.
/// - Returns NULL on error; call `cgm_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cgm_processor_new(config_json: *const c_char) -> *mut CgmProcessorHandle {
    clear_last_error();

    match config_from_ptr(config_json).and_then(CgmProcessor::with_config) {
        Ok(processor) => Box::into_raw(Box::new(CgmProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a CgmProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `cgm_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn cgm_processor_free(processor: *mut CgmProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Analyze a CGM JSON payload with a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `cgm_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `cgm_free_string`.
/// - Returns NULL on error; call `cgm_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cgm_processor_process(
    processor: *const CgmProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(handle.processor.process(&json_str))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by cgm-flux functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a cgm-flux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn cgm_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next cgm-flux call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn cgm_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
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
pub unsafe extern "C" fn cgm_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_dexcom_json() -> CString {
        CString::new(
            r#"{
            "records": [
                { "systemTime": "2024-01-15T10:00:00Z", "value": 110 },
                { "systemTime": "2024-01-15T10:05:00Z", "value": 120 },
                { "systemTime": "2024-01-15T10:10:00Z", "value": 130 }
            ]
        }"#,
        )
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        cgm_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_analyze() {
        let json = sample_dexcom_json();

        unsafe {
            let result = take_string(cgm_analyze(json.as_ptr(), ptr::null()));
            let report: serde_json::Value = serde_json::from_str(&result).unwrap();

            assert_eq!(report["producer"]["name"], "cgm-flux");
            assert_eq!(report["summary"]["metrics"]["mean_glucose"], 120.0);
            assert!(cgm_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_analyze_with_config() {
        let json = sample_dexcom_json();
        let config = CString::new(r#"{"ranges": {"tir_high": 115}}"#).unwrap();

        unsafe {
            let result = take_string(cgm_analyze(json.as_ptr(), config.as_ptr()));
            let report: serde_json::Value = serde_json::from_str(&result).unwrap();
            assert_eq!(report["summary"]["metrics"]["above_180_count"], 2);
        }
    }

    #[test]
    fn test_ffi_recommend() {
        let context = CString::new(r#"{"dawn_present": true, "unknown": true}"#).unwrap();

        unsafe {
            let result = take_string(cgm_recommend(context.as_ptr()));
            let advice: Vec<String> = serde_json::from_str(&result).unwrap();
            assert_eq!(advice, vec![crate::recommend::DAWN_ADVICE.to_string()]);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = cgm_processor_new(ptr::null());
            assert!(!processor.is_null());

            let json = sample_dexcom_json();
            let first = take_string(cgm_processor_process(processor, json.as_ptr()));
            let second = take_string(cgm_processor_process(processor, json.as_ptr()));

            let first: serde_json::Value = serde_json::from_str(&first).unwrap();
            let second: serde_json::Value = serde_json::from_str(&second).unwrap();
            assert_eq!(
                first["producer"]["instance_id"],
                second["producer"]["instance_id"]
            );

            cgm_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_invalid_config() {
        let config = CString::new(r#"{"spikes": {"lookahead_samples": 0}}"#).unwrap();

        unsafe {
            let processor = cgm_processor_new(config.as_ptr());
            assert!(processor.is_null());

            let error = CStr::from_ptr(cgm_last_error()).to_str().unwrap();
            assert!(error.contains("lookahead_samples"));
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = cgm_analyze(invalid_json.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = cgm_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            let empty = CString::new("[]").unwrap();
            assert!(cgm_analyze(empty.as_ptr(), ptr::null()).is_null());
            let error_str = CStr::from_ptr(cgm_last_error()).to_str().unwrap();
            assert!(error_str.contains("No valid CGM glucose data"));

            assert!(cgm_processor_process(ptr::null(), empty.as_ptr()).is_null());
            assert!(cgm_recommend(ptr::null()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = cgm_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, env!("CARGO_PKG_VERSION"));
        }
    }
}
