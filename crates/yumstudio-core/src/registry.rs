//! The process-wide native table.
//!
//! The host registers its table once during module load, before any node
//! handle is touched. Registration publishes an immutable copy through a single
//! atomic pointer, so steady-state reads take no lock and a reader always sees
//! one whole table. Re-registering rebinds later calls to the new table.
//! Superseded tables are leaked rather than freed because earlier readers may
//! still hold `&'static` references to them.

use std::ffi::CStr;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

use tracing::{debug, error, warn};
use yumstudio_sys::ysnative;

use crate::backend::NodeBackend;
use crate::error::{NativeError, NativeResult};
use crate::signal::SignalCallback;
use crate::table::{NativeTable, Slots};
use crate::uid::Uid;

static EMPTY: NativeTable = NativeTable::EMPTY;

/// Null until the first registration.
static CURRENT: AtomicPtr<NativeTable> = AtomicPtr::new(ptr::null_mut());

static GENERATION: AtomicU64 = AtomicU64::new(0);

/// Installs `table` as the process-wide native table.
///
/// Replaces any previous table. Calls that start after this returns go through
/// `table`; a table already fetched by another thread stays valid. Each call
/// leaks one `NativeTable`, so register at load time rather than per use.
pub fn register(table: NativeTable) {
    let missing = table.missing();
    let published: &'static mut NativeTable = Box::leak(Box::new(table));
    CURRENT.store(published, Ordering::Release);
    let generation = GENERATION.fetch_add(1, Ordering::AcqRel) + 1;

    debug!(generation, ?missing, "registered native table");
    if !missing.is_empty() {
        warn!(?missing, "native table registered with null slots");
    }
}

/// Installs the table behind `native`, as handed over by the host.
///
/// Returns `false` and keeps the current table if `native` is null.
///
/// # Safety
///
/// A non-null `native` must point to a readable `ysnative` whose slots satisfy
/// the contract of [`NativeTable::from_raw`].
pub unsafe fn register_raw(native: *const ysnative) -> bool {
    if native.is_null() {
        error!("module entry called with a null native table");
        return false;
    }
    let raw = unsafe { native.read() };
    register(unsafe { NativeTable::from_raw(raw) });
    true
}

/// The current native table, or an all-null table before registration.
#[inline]
pub fn get_table() -> &'static NativeTable {
    let current = CURRENT.load(Ordering::Acquire);
    if current.is_null() {
        &EMPTY
    } else {
        // Published tables are leaked and never mutated after the store.
        unsafe { &*current }
    }
}

/// Stable pointer to the current table's C record. Never null.
pub fn raw_table() -> *const ysnative {
    get_table().as_raw()
}

/// The current table, if it has every slot in `required`.
pub fn ensure_ready(required: Slots) -> NativeResult<&'static NativeTable> {
    let table = get_table();
    let missing = table.missing().intersection(required);
    if missing.is_empty() {
        Ok(table)
    } else {
        Err(NativeError::NotRegistered(missing))
    }
}

/// Number of registrations so far; 0 means the host never called the entry.
pub fn generation() -> u64 {
    GENERATION.load(Ordering::Acquire)
}

/// The process-wide native table as a [`NodeBackend`].
///
/// Resolves the current table on every call, so handles built before a
/// re-registration follow the new table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Native;

impl NodeBackend for Native {
    #[inline]
    #[track_caller]
    fn create(&self) -> Uid {
        get_table().create()
    }

    #[inline]
    #[track_caller]
    fn queue_free(&self, node: Uid) {
        get_table().queue_free(node)
    }

    #[inline]
    #[track_caller]
    fn get_children(&self, node: Uid, out: &mut [Uid]) {
        get_table().get_children(node, out)
    }

    #[inline]
    #[track_caller]
    fn get_parent(&self, node: Uid) -> Uid {
        get_table().get_parent(node)
    }

    #[inline]
    #[track_caller]
    fn get_parents(&self, node: Uid, out: &mut [Uid]) {
        get_table().get_parents(node, out)
    }

    #[inline]
    #[track_caller]
    fn get_node(&self, name: &CStr) -> Uid {
        get_table().get_node(name)
    }

    #[inline]
    #[track_caller]
    fn add_child(&self, parent: Uid, child: Uid) {
        get_table().add_child(parent, child)
    }

    #[inline]
    #[track_caller]
    fn add_children(&self, parent: Uid, children: &[Uid]) {
        get_table().add_children(parent, children)
    }

    #[inline]
    #[track_caller]
    fn connect(&self, node: Uid, signal: &CStr, callback: SignalCallback) {
        get_table().connect(node, signal, callback)
    }
}
