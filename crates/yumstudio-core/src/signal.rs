//! Signal callbacks.
//!
//! The engine invokes a connected callback directly when the signal fires, on
//! whatever thread it fires from. The binding adds no queuing, retry or ordering
//! between callbacks connected to the same signal.

use std::ffi::c_void;
use std::slice;

/// Shape of a signal callback: the signal's arguments as opaque pointers.
pub type SignalCallback = unsafe extern "C" fn(argv: *mut *mut c_void, argc: u64);

/// Borrows the argument array handed to a [`SignalCallback`].
///
/// A null `argv`, a zero `argc`, or an `argc` that does not fit `usize`
/// yields an empty slice.
///
/// # Safety
///
/// Unless null, `argv` must point to `argc` readable pointers that stay valid
/// for `'a`, which in practice means the duration of the callback.
pub unsafe fn signal_args<'a>(argv: *mut *mut c_void, argc: u64) -> &'a [*mut c_void] {
    let Ok(len) = usize::try_from(argc) else {
        return &[];
    };
    if argv.is_null() || len == 0 {
        return &[];
    }
    unsafe { slice::from_raw_parts(argv.cast_const(), len) }
}
