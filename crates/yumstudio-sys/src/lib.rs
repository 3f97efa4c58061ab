//! Raw declarations of the YumStudio native ABI.
//!
//! These types mirror `native_types.h` and `ysctypes.h` field for field and are
//! shared by the host process (which fills the table) and the module (which
//! calls through it). Nothing here has behavior; the safe layer lives in
//! `yumstudio-core`.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use std::ffi::{c_char, c_void};

/// Length type used across the C/C++ API.
pub type ysxlen = u64;

/// UID returned when a node could not be created or found.
pub const INVALID_NODE: u64 = u64::MAX;

/// Signal callback: receives the signal arguments as an array of opaque pointers.
pub type ysgd_callback = Option<unsafe extern "C" fn(argv: *mut *mut c_void, argc: u64)>;

/// Creates a new node. Returns its UID, or `INVALID_NODE` if creation fails.
pub type ysnative_create = Option<unsafe extern "C" fn() -> u64>;

/// Queues the node to be freed.
pub type ysnative_queuefree = Option<unsafe extern "C" fn(node: u64)>;

/// Writes at most `count` child UIDs of `node` into `buffer`.
pub type ysnative_get_children =
    Option<unsafe extern "C" fn(node: u64, buffer: *mut u64, count: u64)>;

/// Returns the parent UID of `node`, or `INVALID_NODE` for a root.
pub type ysnative_get_parent = Option<unsafe extern "C" fn(node: u64) -> u64>;

/// Writes at most `count` ancestor UIDs of `node` into `buffer`.
pub type ysnative_get_parents =
    Option<unsafe extern "C" fn(node: u64, buffer: *mut u64, count: u64)>;

/// Looks a node up by name. Returns `INVALID_NODE` if it does not exist.
pub type ysnative_get_node = Option<unsafe extern "C" fn(name: *const c_char) -> u64>;

/// Adds `child` to `parent`.
pub type ysnative_add_child = Option<unsafe extern "C" fn(parent: u64, child: u64)>;

/// Adds `count` nodes from `nodes` to `parent`.
pub type ysnative_add_children =
    Option<unsafe extern "C" fn(parent: u64, nodes: *mut u64, count: u64)>;

/// Connects `callback` to the signal `method_name` of `node`.
pub type ysnative_connect =
    Option<unsafe extern "C" fn(node: u64, method_name: *const c_char, callback: ysgd_callback)>;

/// A YumStudio C(++) module native backend.
///
/// The first eight fields keep the order of `native_types.h` so hosts built
/// against it stay compatible; `get_children` is appended after them.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct ysnative {
    pub add_child: ysnative_add_child,
    pub add_children: ysnative_add_children,
    pub connect: ysnative_connect,
    pub get_node: ysnative_get_node,
    pub get_parent: ysnative_get_parent,
    pub get_parents: ysnative_get_parents,
    pub create: ysnative_create,
    pub queuefree: ysnative_queuefree,
    pub get_children: ysnative_get_children,
}

impl ysnative {
    /// A table with every slot null.
    pub const fn zeroed() -> Self {
        Self {
            add_child: None,
            add_children: None,
            connect: None,
            get_node: None,
            get_parent: None,
            get_parents: None,
            create: None,
            queuefree: None,
            get_children: None,
        }
    }
}
