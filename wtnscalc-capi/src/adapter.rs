//! The C boundary.
//!
//! [`witnesscalc_raw`] is the body shared by every exported
//! `witnesscalc_<circuit>` function. It owns the pointer handling, the
//! capacity negotiation for the witness buffer, the diagnostic buffer and
//! the unwind guard; the calculator behind it never sees a raw pointer.

use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    ptr, slice,
};

use libc::{c_char, c_int, c_ulong};
use wtnscalc::WitnessCalculator;

/// The witness was calculated and written in full.
pub const WITNESSCALC_OK: c_int = 0;
/// The calculation failed; the diagnostic buffer says why.
pub const WITNESSCALC_ERROR: c_int = 1;
/// The witness buffer is too small; `*wtns_size` holds the required size.
pub const WITNESSCALC_ERROR_SHORT_BUFFER: c_int = 2;

/// Runs `calculator` over the caller's buffers.
///
/// On success the encoded witness is copied into `wtns_buffer` and
/// `*wtns_size` is set to its length. If the capacity in `*wtns_size` is too
/// small, or `wtns_buffer` is null, nothing is written, `*wtns_size` is set
/// to the required length and the call returns
/// [`WITNESSCALC_ERROR_SHORT_BUFFER`]; callers may probe with a null buffer
/// to size their allocation. Failures return [`WITNESSCALC_ERROR`] with a
/// NUL-terminated diagnostic in `error_msg` (unless that buffer is null or
/// zero-sized). Panics from the calculator are caught and reported the same
/// way, never unwound across the boundary.
///
/// # Safety
///
/// Non-null `circuit_buffer` and `json_buffer` must be readable for their
/// declared sizes, a non-null `wtns_buffer` must be writable for the
/// capacity at `*wtns_size`, a non-null `error_msg` must be writable for
/// `error_msg_maxsize` bytes, and `wtns_size` must be a valid pointer. No
/// buffer may be mutated concurrently for the duration of the call.
#[allow(clippy::too_many_arguments)]
pub unsafe fn witnesscalc_raw<C: WitnessCalculator>(
    calculator: &C,
    circuit_buffer: *const c_char,
    circuit_size: c_ulong,
    json_buffer: *const c_char,
    json_size: c_ulong,
    wtns_buffer: *mut c_char,
    wtns_size: *mut c_ulong,
    error_msg: *mut c_char,
    error_msg_maxsize: c_ulong,
) -> c_int {
    // Raw pointers are not unwind safe in the trait sense, but nothing here
    // is observable after a caught panic: the guarded code only writes
    // caller buffers, and those are left as the panic found them.
    let outcome = catch_unwind(AssertUnwindSafe(|| unsafe {
        run(
            calculator,
            circuit_buffer,
            circuit_size,
            json_buffer,
            json_size,
            wtns_buffer,
            wtns_size,
            error_msg,
            error_msg_maxsize,
        )
    }));
    match outcome {
        Ok(status) => status,
        Err(cause) => {
            let message = panic_message(cause.as_ref());
            log::error!("witness calculation panicked: {message}");
            unsafe {
                write_error(
                    error_msg,
                    error_msg_maxsize,
                    &format!("internal error: {message}"),
                );
            }
            WITNESSCALC_ERROR
        }
    }
}

#[allow(clippy::too_many_arguments)]
unsafe fn run<C: WitnessCalculator>(
    calculator: &C,
    circuit_buffer: *const c_char,
    circuit_size: c_ulong,
    json_buffer: *const c_char,
    json_size: c_ulong,
    wtns_buffer: *mut c_char,
    wtns_size: *mut c_ulong,
    error_msg: *mut c_char,
    error_msg_maxsize: c_ulong,
) -> c_int {
    if wtns_size.is_null() {
        unsafe { write_error(error_msg, error_msg_maxsize, "wtns_size pointer is null") };
        return WITNESSCALC_ERROR;
    }
    let Some(circuit) = (unsafe { input_slice(circuit_buffer, circuit_size) }) else {
        unsafe { write_error(error_msg, error_msg_maxsize, "circuit buffer is null") };
        return WITNESSCALC_ERROR;
    };
    let Some(json) = (unsafe { input_slice(json_buffer, json_size) }) else {
        unsafe { write_error(error_msg, error_msg_maxsize, "json buffer is null") };
        return WITNESSCALC_ERROR;
    };

    let encoded = match calculator.calc_witness(circuit, json) {
        Ok(encoded) => encoded,
        Err(err) => {
            log::error!("witness calculation failed: {err}");
            unsafe { write_error(error_msg, error_msg_maxsize, &err.to_string()) };
            return WITNESSCALC_ERROR;
        }
    };

    let required = encoded.len() as c_ulong;
    let capacity = if wtns_buffer.is_null() {
        0
    } else {
        unsafe { *wtns_size }
    };
    if capacity < required {
        unsafe {
            *wtns_size = required;
            write_error(
                error_msg,
                error_msg_maxsize,
                &format!("witness buffer too small: {required} bytes required, {capacity} available"),
            );
        }
        return WITNESSCALC_ERROR_SHORT_BUFFER;
    }

    unsafe {
        ptr::copy_nonoverlapping(encoded.as_ptr(), wtns_buffer as *mut u8, encoded.len());
        *wtns_size = required;
    }
    WITNESSCALC_OK
}

/// Borrows an input buffer. Zero-size buffers may be null; a null pointer
/// with a nonzero size is the caller's error and yields `None`.
unsafe fn input_slice<'a>(data: *const c_char, size: c_ulong) -> Option<&'a [u8]> {
    if size == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        return None;
    }
    Some(unsafe { slice::from_raw_parts(data as *const u8, size as usize) })
}

/// Writes a NUL-terminated diagnostic into the caller's buffer, truncating
/// over-long messages at a character boundary. A null buffer or zero
/// capacity suppresses the diagnostic.
unsafe fn write_error(error_msg: *mut c_char, maxsize: c_ulong, message: &str) {
    if error_msg.is_null() || maxsize == 0 {
        return;
    }
    let budget = (maxsize - 1) as usize;
    let mut end = budget.min(message.len());
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    unsafe {
        ptr::copy_nonoverlapping(message.as_ptr(), error_msg as *mut u8, end);
        *error_msg.add(end) = 0;
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> &str {
    if let Some(s) = cause.downcast_ref::<&str>() {
        s
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}
