//! C ABI entry points for the wtnscalc witness calculator.
//!
//! Every supported circuit exports one function named
//! `witnesscalc_<circuit>`, all sharing the signature declared in
//! `include/witnesscalc.h`:
//!
//! ```c
//! int witnesscalc_register_sha256WithRSAEncryption_65537(
//!     const char *circuit_buffer,  unsigned long  circuit_size,
//!     const char *json_buffer,     unsigned long  json_size,
//!     char       *wtns_buffer,     unsigned long *wtns_size,
//!     char       *error_msg,       unsigned long  error_msg_maxsize);
//! ```
//!
//! The caller owns every buffer. `circuit_buffer` holds the compiled
//! circuit graph, `json_buffer` the input assignment; on
//! [`WITNESSCALC_OK`] the encoded witness is written to `wtns_buffer` and
//! `*wtns_size` becomes its length. A too-small buffer yields
//! [`WITNESSCALC_ERROR_SHORT_BUFFER`] with the required length in
//! `*wtns_size`, and any failure yields [`WITNESSCALC_ERROR`] with a
//! NUL-terminated explanation in `error_msg`. No call transfers ownership
//! in either direction and nothing has to be freed afterwards.

mod adapter;
mod variants;

pub use adapter::{
    WITNESSCALC_ERROR, WITNESSCALC_ERROR_SHORT_BUFFER, WITNESSCALC_OK, witnesscalc_raw,
};
pub use variants::*;

#[doc(hidden)]
pub use libc as __libc;
#[doc(hidden)]
pub use paste::paste as __paste;
#[doc(hidden)]
pub use wtnscalc as __engine;

/// Defines the exported C entry point `witnesscalc_<circuit>`.
///
/// The one-argument form binds the entry point to the engine's default
/// graph calculator; the two-argument form accepts any `Default` type
/// implementing [`WitnessCalculator`](wtnscalc::WitnessCalculator).
///
/// ```no_run
/// wtnscalc_capi::witnesscalc_entry!(multiplier2);
/// ```
#[macro_export]
macro_rules! witnesscalc_entry {
    ($circuit:ident) => {
        $crate::witnesscalc_entry!($circuit, $crate::__engine::GraphCalculator);
    };
    ($circuit:ident, $calculator:ty) => {
        $crate::__paste! {
            #[unsafe(no_mangle)]
            #[allow(non_snake_case)]
            pub unsafe extern "C" fn [<witnesscalc_ $circuit>](
                circuit_buffer: *const $crate::__libc::c_char,
                circuit_size: $crate::__libc::c_ulong,
                json_buffer: *const $crate::__libc::c_char,
                json_size: $crate::__libc::c_ulong,
                wtns_buffer: *mut $crate::__libc::c_char,
                wtns_size: *mut $crate::__libc::c_ulong,
                error_msg: *mut $crate::__libc::c_char,
                error_msg_maxsize: $crate::__libc::c_ulong,
            ) -> $crate::__libc::c_int {
                let calculator = <$calculator as ::std::default::Default>::default();
                unsafe {
                    $crate::witnesscalc_raw(
                        &calculator,
                        circuit_buffer,
                        circuit_size,
                        json_buffer,
                        json_size,
                        wtns_buffer,
                        wtns_size,
                        error_msg,
                        error_msg_maxsize,
                    )
                }
            }
        }
    };
}
