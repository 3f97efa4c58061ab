//! The capability interface node handles dispatch through.

use std::ffi::CStr;

use crate::signal::SignalCallback;
use crate::uid::Uid;

/// The set of engine operations a [`Node`](crate::Node) forwards to.
///
/// The registered [`NativeTable`](crate::NativeTable), the process-wide
/// [`Native`](crate::Native) view of it, and
/// [`FakeEngine`](crate::fake::FakeEngine) all implement this, so handle code
/// never depends on a concrete engine.
///
/// Implementations decide what invalid UIDs mean; the binding does not
/// validate arguments before forwarding.
pub trait NodeBackend {
    /// Creates a node, returning [`Uid::INVALID`] on failure.
    fn create(&self) -> Uid;

    /// Requests deferred destruction of `node`.
    fn queue_free(&self, node: Uid);

    /// Writes at most `out.len()` children of `node` into `out`.
    fn get_children(&self, node: Uid, out: &mut [Uid]);

    /// Parent of `node`, or [`Uid::INVALID`] for a root.
    fn get_parent(&self, node: Uid) -> Uid;

    /// Writes at most `out.len()` ancestors of `node` into `out`.
    fn get_parents(&self, node: Uid, out: &mut [Uid]);

    /// Looks a node up by name, returning [`Uid::INVALID`] if absent.
    fn get_node(&self, name: &CStr) -> Uid;

    fn add_child(&self, parent: Uid, child: Uid);

    fn add_children(&self, parent: Uid, children: &[Uid]);

    /// Registers `callback` for `signal` on `node`.
    fn connect(&self, node: Uid, signal: &CStr, callback: SignalCallback);
}

impl<T: NodeBackend + ?Sized> NodeBackend for &T {
    #[inline]
    fn create(&self) -> Uid {
        (**self).create()
    }

    #[inline]
    fn queue_free(&self, node: Uid) {
        (**self).queue_free(node)
    }

    #[inline]
    fn get_children(&self, node: Uid, out: &mut [Uid]) {
        (**self).get_children(node, out)
    }

    #[inline]
    fn get_parent(&self, node: Uid) -> Uid {
        (**self).get_parent(node)
    }

    #[inline]
    fn get_parents(&self, node: Uid, out: &mut [Uid]) {
        (**self).get_parents(node, out)
    }

    #[inline]
    fn get_node(&self, name: &CStr) -> Uid {
        (**self).get_node(name)
    }

    #[inline]
    fn add_child(&self, parent: Uid, child: Uid) {
        (**self).add_child(parent, child)
    }

    #[inline]
    fn add_children(&self, parent: Uid, children: &[Uid]) {
        (**self).add_children(parent, children)
    }

    #[inline]
    fn connect(&self, node: Uid, signal: &CStr, callback: SignalCallback) {
        (**self).connect(node, signal, callback)
    }
}
