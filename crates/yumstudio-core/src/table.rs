//! The native function table.
//!
//! [`NativeTable`] wraps the raw [`ysnative`] record the host hands over at load
//! time. Building one from raw pointers is `unsafe`: that is where the caller
//! vouches for the host's contract, which in turn lets every forwarding call be
//! a safe function.

use std::ffi::CStr;

use bitflags::bitflags;
use yumstudio_sys::ysnative;

use crate::backend::NodeBackend;
use crate::signal::SignalCallback;
use crate::uid::Uid;

bitflags! {
    /// One flag per slot of the native table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Slots: u16 {
        const ADD_CHILD = 1 << 0;
        const ADD_CHILDREN = 1 << 1;
        const CONNECT = 1 << 2;
        const GET_NODE = 1 << 3;
        const GET_PARENT = 1 << 4;
        const GET_PARENTS = 1 << 5;
        const CREATE = 1 << 6;
        const QUEUEFREE = 1 << 7;
        const GET_CHILDREN = 1 << 8;
    }
}

/// Safe view over a host-provided [`ysnative`] table.
///
/// Every slot is optional. Calling an operation whose slot is null is a
/// programming error and panics with the slot's name; use
/// [`NativeTable::missing`] or [`crate::ensure_ready`] to check beforehand.
#[repr(transparent)]
#[derive(Debug, Clone, Copy)]
pub struct NativeTable {
    raw: ysnative,
}

impl NativeTable {
    /// A table with every slot null, as seen before registration.
    pub const EMPTY: NativeTable = NativeTable {
        raw: ysnative::zeroed(),
    };

    /// Wraps a raw table.
    ///
    /// # Safety
    ///
    /// Every non-null slot must be sound to call with any UID and with the
    /// arguments documented on the matching `ysnative_*` type: buffers are
    /// valid for exactly `count` writes (or reads, for `add_children`, which
    /// must not write through its pointer), names are NUL-terminated and only
    /// borrowed for the duration of the call.
    pub const unsafe fn from_raw(raw: ysnative) -> Self {
        Self { raw }
    }

    /// The underlying C record.
    pub const fn as_raw(&self) -> &ysnative {
        &self.raw
    }

    /// Slots that hold a function pointer.
    pub fn registered(&self) -> Slots {
        let raw = &self.raw;
        let mut slots = Slots::empty();
        slots.set(Slots::ADD_CHILD, raw.add_child.is_some());
        slots.set(Slots::ADD_CHILDREN, raw.add_children.is_some());
        slots.set(Slots::CONNECT, raw.connect.is_some());
        slots.set(Slots::GET_NODE, raw.get_node.is_some());
        slots.set(Slots::GET_PARENT, raw.get_parent.is_some());
        slots.set(Slots::GET_PARENTS, raw.get_parents.is_some());
        slots.set(Slots::CREATE, raw.create.is_some());
        slots.set(Slots::QUEUEFREE, raw.queuefree.is_some());
        slots.set(Slots::GET_CHILDREN, raw.get_children.is_some());
        slots
    }

    /// Slots that are still null.
    pub fn missing(&self) -> Slots {
        Slots::all().difference(self.registered())
    }

    /// Whether every slot is filled.
    pub fn is_ready(&self) -> bool {
        self.missing().is_empty()
    }
}

impl Default for NativeTable {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[inline]
#[track_caller]
fn slot<F>(slot: Option<F>, which: Slots) -> F {
    match slot {
        Some(f) => f,
        None => unregistered(which),
    }
}

#[cold]
#[track_caller]
fn unregistered(which: Slots) -> ! {
    let name = which.iter_names().next().map_or("?", |(name, _)| name);
    panic!("native slot {name} is not registered; the host must call the module entry first")
}

// All calls below rely on the contract accepted in `NativeTable::from_raw`.
impl NodeBackend for NativeTable {
    #[track_caller]
    fn create(&self) -> Uid {
        let f = slot(self.raw.create, Slots::CREATE);
        Uid::new(unsafe { f() })
    }

    #[track_caller]
    fn queue_free(&self, node: Uid) {
        let f = slot(self.raw.queuefree, Slots::QUEUEFREE);
        unsafe { f(node.raw()) }
    }

    #[track_caller]
    fn get_children(&self, node: Uid, out: &mut [Uid]) {
        let f = slot(self.raw.get_children, Slots::GET_CHILDREN);
        unsafe { f(node.raw(), out.as_mut_ptr().cast::<u64>(), out.len() as u64) }
    }

    #[track_caller]
    fn get_parent(&self, node: Uid) -> Uid {
        let f = slot(self.raw.get_parent, Slots::GET_PARENT);
        Uid::new(unsafe { f(node.raw()) })
    }

    #[track_caller]
    fn get_parents(&self, node: Uid, out: &mut [Uid]) {
        let f = slot(self.raw.get_parents, Slots::GET_PARENTS);
        unsafe { f(node.raw(), out.as_mut_ptr().cast::<u64>(), out.len() as u64) }
    }

    #[track_caller]
    fn get_node(&self, name: &CStr) -> Uid {
        let f = slot(self.raw.get_node, Slots::GET_NODE);
        Uid::new(unsafe { f(name.as_ptr()) })
    }

    #[track_caller]
    fn add_child(&self, parent: Uid, child: Uid) {
        let f = slot(self.raw.add_child, Slots::ADD_CHILD);
        unsafe { f(parent.raw(), child.raw()) }
    }

    #[track_caller]
    fn add_children(&self, parent: Uid, children: &[Uid]) {
        let f = slot(self.raw.add_children, Slots::ADD_CHILDREN);
        // The C signature is not const-qualified; the host only reads.
        let nodes = children.as_ptr().cast::<u64>().cast_mut();
        unsafe { f(parent.raw(), nodes, children.len() as u64) }
    }

    #[track_caller]
    fn connect(&self, node: Uid, signal: &CStr, callback: SignalCallback) {
        let f = slot(self.raw.connect, Slots::CONNECT);
        unsafe { f(node.raw(), signal.as_ptr(), Some(callback)) }
    }
}
