//! C ABI for the trellis speech recognizer
//!
//! Opaque handles over the model package and recognizer:
//!
//! ```c
//! trellis_package* pkg;
//! trellis_init("model/config.json", &pkg);
//!
//! trellis_stt* stt;
//! trellis_stt_init(pkg, &stt);
//! trellis_stt_speech(stt, samples, n, 16000.0f);
//! trellis_stt_to(stt);
//! const char* text = trellis_stt_text(stt);
//! trellis_stt_clear(stt);
//!
//! trellis_stt_deinit(stt);
//! trellis_deinit(pkg);
//! ```
//!
//! Every call returns 0 on success or the error kind's code. Concurrent
//! calls on distinct handles are safe; concurrent calls on one handle are
//! undefined. Text pointers stay valid until the next call on that handle.

use std::ffi::{c_char, CStr, CString};
use std::path::Path;

use trellis_core::Result;
use trellis_pipeline::{SpeechToText, SttModel};

const OK: i32 = 0;
const ERR_INVALID_ARGUMENT: i32 = 1;

/// Opaque handle over an immutable model package.
pub struct TrellisPackage {
    model: SttModel,
}

/// Opaque handle over one recognizer session.
pub struct TrellisStt {
    stt: SpeechToText,
    text: CString,
}

fn rc(result: Result<()>) -> i32 {
    match result {
        Ok(()) => OK,
        Err(e) => {
            tracing::warn!(error = %e, "stt call failed");
            e.code()
        }
    }
}

/// Load a model package from a JSON config path.
///
/// # Safety
/// `config_path` must be a valid NUL-terminated string and `pkg_out` a valid
/// pointer; on success `*pkg_out` owns the package until `trellis_deinit`.
#[no_mangle]
pub unsafe extern "C" fn trellis_init(
    config_path: *const c_char,
    pkg_out: *mut *mut TrellisPackage,
) -> i32 {
    if config_path.is_null() || pkg_out.is_null() {
        return ERR_INVALID_ARGUMENT;
    }

    let Ok(path) = CStr::from_ptr(config_path).to_str() else {
        return ERR_INVALID_ARGUMENT;
    };

    match SttModel::load(Path::new(path)) {
        Ok(model) => {
            *pkg_out = Box::into_raw(Box::new(TrellisPackage { model }));
            OK
        }
        Err(e) => {
            tracing::warn!(error = %e, path, "package load failed");
            e.code()
        }
    }
}

/// Release a model package.
///
/// # Safety
/// `pkg` must come from `trellis_init` and not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn trellis_deinit(pkg: *mut TrellisPackage) -> i32 {
    if pkg.is_null() {
        return ERR_INVALID_ARGUMENT;
    }
    drop(Box::from_raw(pkg));
    OK
}

/// Create a recognizer over a loaded package.
///
/// # Safety
/// `pkg` must be a live package handle and `stt_out` a valid pointer; on
/// success `*stt_out` owns the recognizer until `trellis_stt_deinit`.
#[no_mangle]
pub unsafe extern "C" fn trellis_stt_init(
    pkg: *const TrellisPackage,
    stt_out: *mut *mut TrellisStt,
) -> i32 {
    if pkg.is_null() || stt_out.is_null() {
        return ERR_INVALID_ARGUMENT;
    }

    match SpeechToText::from_model(&(*pkg).model) {
        Ok(stt) => {
            *stt_out = Box::into_raw(Box::new(TrellisStt {
                stt,
                text: CString::default(),
            }));
            OK
        }
        Err(e) => e.code(),
    }
}

/// Release a recognizer.
///
/// # Safety
/// `stt` must come from `trellis_stt_init` and not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn trellis_stt_deinit(stt: *mut TrellisStt) -> i32 {
    if stt.is_null() {
        return ERR_INVALID_ARGUMENT;
    }
    drop(Box::from_raw(stt));
    OK
}

/// Feed `num_samples` audio samples at the given rate.
///
/// # Safety
/// `stt` must be a live recognizer handle; `samples` must point to
/// `num_samples` readable f32 values.
#[no_mangle]
pub unsafe extern "C" fn trellis_stt_speech(
    stt: *mut TrellisStt,
    samples: *const f32,
    num_samples: usize,
    sample_rate: f32,
) -> i32 {
    if stt.is_null() || samples.is_null() || num_samples == 0 {
        return ERR_INVALID_ARGUMENT;
    }

    let chunk = std::slice::from_raw_parts(samples, num_samples);
    rc((*stt).stt.speech(chunk, sample_rate))
}

/// Flush the stream and finalize the recognition result.
///
/// # Safety
/// `stt` must be a live recognizer handle.
#[no_mangle]
pub unsafe extern "C" fn trellis_stt_to(stt: *mut TrellisStt) -> i32 {
    if stt.is_null() {
        return ERR_INVALID_ARGUMENT;
    }
    rc((*stt).stt.to())
}

/// Read the recognized text. Returns NULL on a null handle; the pointer
/// stays valid until the next call on this handle.
///
/// # Safety
/// `stt` must be a live recognizer handle.
#[no_mangle]
pub unsafe extern "C" fn trellis_stt_text(stt: *mut TrellisStt) -> *const c_char {
    if stt.is_null() {
        return std::ptr::null();
    }

    let handle = &mut *stt;
    let text = handle.stt.text();
    // interior NULs cannot come out of a vocabulary, but never panic across
    // the ABI boundary
    handle.text = CString::new(text).unwrap_or_default();
    handle.text.as_ptr()
}

/// Reset the recognizer for the next utterance.
///
/// # Safety
/// `stt` must be a live recognizer handle.
#[no_mangle]
pub unsafe extern "C" fn trellis_stt_clear(stt: *mut TrellisStt) -> i32 {
    if stt.is_null() {
        return ERR_INVALID_ARGUMENT;
    }
    rc((*stt).stt.clear())
}
