//! Node handles.

use std::fmt;

use tracing::{debug, trace};

use crate::backend::NodeBackend;
use crate::error::{NativeError, NativeResult, to_c_name};
use crate::registry::Native;
use crate::signal::SignalCallback;
use crate::uid::Uid;

/// Capacity used by [`Node::get_parents`].
pub const DEFAULT_ANCESTOR_CAPACITY: usize = 256;

/// Largest buffer a sequence query hands to the engine. Larger requested
/// capacities are clamped to this.
pub const MAX_QUERY_CAPACITY: usize = 1 << 20;

/// A handle to a node owned by the host engine.
///
/// The handle holds the node's [`Uid`] and forwards every operation to its
/// backend, by default the process-wide [`Native`] table. It does not own the
/// engine object: several handles may name the same UID, and the engine alone
/// decides when the object actually goes away.
///
/// Dropping a handle sends one queue-free request for its UID. The request is
/// deferred and never confirmed. When two aliases of one UID are dropped, both
/// requests reach the engine; whether the second can hit a reused UID depends on
/// the engine's reuse policy. Use [`Node::into_uid`] to give the UID up without
/// freeing it.
///
/// A handle holding [`Uid::INVALID`] never reaches the engine: queries return
/// the sentinel or an empty list, mutations do nothing, [`Node::connect`]
/// fails with [`NativeError::InvalidHandle`], and drop sends nothing.
pub struct Node<B: NodeBackend = Native> {
    uid: Uid,
    backend: B,
}

impl Node<Native> {
    /// Creates a new engine node through the registered table.
    ///
    /// # Panics
    ///
    /// If the host has not registered the create slot.
    #[track_caller]
    pub fn create() -> NativeResult<Self> {
        Self::create_in(Native)
    }

    /// Wraps `uid` without contacting the engine.
    pub fn from_uid(uid: Uid) -> Self {
        Self::from_uid_in(uid, Native)
    }

    /// Looks a node up by name through the registered table.
    #[track_caller]
    pub fn from_name(name: &str) -> NativeResult<Self> {
        Self::from_name_in(name, Native)
    }
}

impl<B: NodeBackend> Node<B> {
    #[track_caller]
    pub fn create_in(backend: B) -> NativeResult<Self> {
        let uid = backend.create();
        if !uid.is_valid() {
            debug!("host engine refused to create a node");
            return Err(NativeError::CreationFailed);
        }
        trace!(%uid, "created node");
        Ok(Self { uid, backend })
    }

    pub fn from_uid_in(uid: Uid, backend: B) -> Self {
        Self { uid, backend }
    }

    #[track_caller]
    pub fn from_name_in(name: &str, backend: B) -> NativeResult<Self> {
        let c_name = to_c_name(name)?;
        let uid = backend.get_node(&c_name);
        if !uid.is_valid() {
            debug!(name, "node lookup failed");
            return Err(NativeError::NodeNotFound {
                name: name.to_owned(),
            });
        }
        Ok(Self { uid, backend })
    }

    #[inline]
    pub fn uid(&self) -> Uid {
        self.uid
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.uid.is_valid()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Parent of this node, or [`Uid::INVALID`] if it is a root.
    #[track_caller]
    pub fn get_parent(&self) -> Uid {
        if !self.is_valid() {
            return Uid::INVALID;
        }
        self.backend.get_parent(self.uid)
    }

    /// Ancestors of this node, in the order the engine reports them.
    ///
    /// At most [`DEFAULT_ANCESTOR_CAPACITY`] entries are returned.
    #[track_caller]
    pub fn get_parents(&self) -> Vec<Uid> {
        self.get_parents_with_capacity(DEFAULT_ANCESTOR_CAPACITY)
    }

    #[track_caller]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn get_parents_with_capacity(&self, capacity: usize) -> Vec<Uid> {
        let Some(mut out) = self.query_buffer(capacity) else {
            return Vec::new();
        };
        self.backend.get_parents(self.uid, &mut out);
        truncate_at_sentinel(out)
    }

    /// Up to `capacity` children of this node. Children past `capacity` are
    /// silently dropped, so size it to the expected child count. `capacity`
    /// is clamped to [`MAX_QUERY_CAPACITY`].
    #[track_caller]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn get_children(&self, capacity: usize) -> Vec<Uid> {
        let Some(mut out) = self.query_buffer(capacity) else {
            return Vec::new();
        };
        self.backend.get_children(self.uid, &mut out);
        truncate_at_sentinel(out)
    }

    #[track_caller]
    pub fn add_child(&self, child: impl Into<Uid>) {
        if self.is_valid() {
            self.backend.add_child(self.uid, child.into())
        }
    }

    /// Prefer this over repeated [`Node::add_child`] calls.
    #[track_caller]
    pub fn add_children(&self, children: &[Uid]) {
        if self.is_valid() {
            self.backend.add_children(self.uid, children)
        }
    }

    /// Connects `callback` to `signal` on this node.
    ///
    /// The engine calls `callback` directly, from its own thread, each time the
    /// signal fires.
    #[track_caller]
    pub fn connect(&self, signal: &str, callback: SignalCallback) -> NativeResult<()> {
        if !self.is_valid() {
            return Err(NativeError::InvalidHandle);
        }
        let c_signal = to_c_name(signal)?;
        self.backend.connect(self.uid, &c_signal, callback);
        Ok(())
    }

    /// Requests deferred destruction now; same as dropping the handle.
    pub fn queue_free(self) {
        drop(self)
    }

    /// Gives up the UID without requesting destruction.
    pub fn into_uid(mut self) -> Uid {
        std::mem::replace(&mut self.uid, Uid::INVALID)
    }

    /// Sentinel-filled out-buffer for a sequence query, or `None` for an
    /// invalid handle or a buffer that cannot be allocated.
    fn query_buffer(&self, capacity: usize) -> Option<Vec<Uid>> {
        let capacity = capacity.min(MAX_QUERY_CAPACITY);
        if !self.is_valid() {
            return None;
        }
        let mut out = Vec::new();
        if out.try_reserve_exact(capacity).is_err() {
            debug!(capacity, "could not allocate query buffer");
            return None;
        }
        out.resize(capacity, Uid::INVALID);
        Some(out)
    }
}

impl<B: NodeBackend> Drop for Node<B> {
    fn drop(&mut self) {
        if self.uid.is_valid() {
            trace!(uid = %self.uid, "queueing node for free");
            self.backend.queue_free(self.uid);
        }
    }
}

impl<B: NodeBackend> fmt::Debug for Node<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node").field("uid", &self.uid).finish_non_exhaustive()
    }
}

impl<B: NodeBackend> From<&Node<B>> for Uid {
    fn from(node: &Node<B>) -> Self {
        node.uid
    }
}

fn truncate_at_sentinel(mut out: Vec<Uid>) -> Vec<Uid> {
    let len = out.iter().position(|uid| !uid.is_valid()).unwrap_or(out.len());
    out.truncate(len);
    out
}
