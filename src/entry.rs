//! Symbols the host looks up after loading the module.
//!
//! Exported unmangled when the `entry` feature is on (the default). Disable it
//! when several crates linked into one module would export them twice.

use tracing::debug;
use yumstudio_sys::ysnative;

/// Module entry point. The host calls this once, before anything else, with
/// its populated table. The table is copied; the host may free it afterwards.
///
/// # Safety
///
/// `native` must be null or point to a `ysnative` whose non-null slots honor
/// the contract documented on [`yumstudio_core::NativeTable::from_raw`].
#[allow(non_snake_case)]
#[cfg_attr(feature = "entry", unsafe(no_mangle))]
pub unsafe extern "C" fn YumStudioModuleEntry(native: *const ysnative) {
    if unsafe { yumstudio_core::register_raw(native) } {
        debug!(generation = yumstudio_core::generation(), "module entry");
    }
}

/// The table currently in use. Never null; all slots are null before
/// [`YumStudioModuleEntry`] has run.
#[cfg_attr(feature = "entry", unsafe(no_mangle))]
pub extern "C" fn ys_get_native() -> *const ysnative {
    yumstudio_core::raw_table()
}
