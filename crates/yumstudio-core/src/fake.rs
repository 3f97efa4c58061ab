//! In-memory stand-in for the host engine.
//!
//! [`FakeEngine`] keeps a small scene tree, records every call it receives, and
//! implements [`NodeBackend`] directly. [`install`] additionally registers a
//! native table of `extern "C"` trampolines into a process-wide instance, so the
//! whole path from [`Node`](crate::Node) through the registered table can be
//! exercised without a real engine.
//!
//! ```
//! # #[cfg(feature = "fake")] {
//! use yumstudio_core::Node;
//! use yumstudio_core::fake::FakeEngine;
//!
//! let engine = FakeEngine::new();
//! let root = engine.spawn("Root");
//! let node = Node::from_name_in("Root", &engine).unwrap();
//! assert_eq!(node.uid(), root);
//! # }
//! ```

use std::ffi::{CStr, CString, c_char, c_void};
use std::slice;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use rustc_hash::FxHashMap;
use yumstudio_sys::{ysgd_callback, ysnative};

use crate::backend::NodeBackend;
use crate::registry;
use crate::signal::SignalCallback;
use crate::table::NativeTable;
use crate::uid::Uid;

/// A call received by a [`FakeEngine`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    Create,
    QueueFree(Uid),
    GetChildren { node: Uid, capacity: usize },
    GetParent(Uid),
    GetParents { node: Uid, capacity: usize },
    GetNode(String),
    AddChild { parent: Uid, child: Uid },
    AddChildren { parent: Uid, children: Vec<Uid> },
    Connect { node: Uid, signal: String },
}

#[derive(Debug)]
struct FakeNode {
    parent: Uid,
    children: Vec<Uid>,
    name: Option<String>,
    queued_free: bool,
}

#[derive(Debug)]
struct Connection {
    node: Uid,
    signal: CString,
    callback: SignalCallback,
}

#[derive(Debug, Default)]
struct Scene {
    next_uid: u64,
    nodes: FxHashMap<Uid, FakeNode>,
    names: FxHashMap<String, Uid>,
    connections: Vec<Connection>,
    calls: Vec<NativeCall>,
    refuse_create: bool,
}

impl Scene {
    fn allocate(&mut self, name: Option<String>) -> Uid {
        let uid = Uid::new(self.next_uid);
        self.next_uid += 1;
        if let Some(name) = &name {
            self.names.insert(name.clone(), uid);
        }
        self.nodes.insert(
            uid,
            FakeNode {
                parent: Uid::INVALID,
                children: Vec::new(),
                name,
                queued_free: false,
            },
        );
        uid
    }

    fn parent_of(&self, node: Uid) -> Uid {
        self.nodes.get(&node).map_or(Uid::INVALID, |n| n.parent)
    }

    fn is_ancestor(&self, candidate: Uid, node: Uid) -> bool {
        let mut current = self.parent_of(node);
        while current.is_valid() {
            if current == candidate {
                return true;
            }
            current = self.parent_of(current);
        }
        false
    }

    /// Attaches `child` under `parent`; invalid requests are ignored.
    fn attach(&mut self, parent: Uid, child: Uid) {
        if parent == child
            || !self.nodes.contains_key(&parent)
            || self.parent_of(child).is_valid()
            || self.is_ancestor(child, parent)
        {
            return;
        }
        let Some(node) = self.nodes.get_mut(&child) else {
            return;
        };
        node.parent = parent;
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.push(child);
        }
    }

    fn remove_subtree(&mut self, root: Uid) -> usize {
        let Some(node) = self.nodes.remove(&root) else {
            return 0;
        };
        if let Some(parent) = self.nodes.get_mut(&node.parent) {
            parent.children.retain(|&c| c != root);
        }
        // A later spawn may have taken the name over.
        if let Some(name) = node.name
            && self.names.get(&name) == Some(&root)
        {
            self.names.remove(&name);
        }
        self.connections.retain(|c| c.node != root);

        let mut removed = 1;
        for child in node.children {
            // Detached first so the child does not try to unlink from us.
            if let Some(c) = self.nodes.get_mut(&child) {
                c.parent = Uid::INVALID;
            }
            removed += self.remove_subtree(child);
        }
        removed
    }
}

/// An in-memory host engine.
#[derive(Debug, Default)]
pub struct FakeEngine {
    scene: Mutex<Scene>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn scene(&self) -> MutexGuard<'_, Scene> {
        self.scene.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a root node reachable by `name`. Not recorded as a call.
    pub fn spawn(&self, name: &str) -> Uid {
        self.scene().allocate(Some(name.to_owned()))
    }

    /// Makes subsequent creates return [`Uid::INVALID`].
    pub fn refuse_create(&self, refuse: bool) {
        self.scene().refuse_create = refuse;
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.scene().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<NativeCall> {
        std::mem::take(&mut self.scene().calls)
    }

    /// Whether `node` exists, including nodes queued for free.
    pub fn contains(&self, node: Uid) -> bool {
        self.scene().nodes.contains_key(&node)
    }

    pub fn is_queued_for_free(&self, node: Uid) -> bool {
        self.scene().nodes.get(&node).is_some_and(|n| n.queued_free)
    }

    /// Frees every queued node with its subtree, as at a frame boundary.
    /// Returns the number of nodes removed.
    pub fn process_frees(&self) -> usize {
        let mut scene = self.scene();
        let queued: Vec<Uid> = scene
            .nodes
            .iter()
            .filter(|(_, n)| n.queued_free)
            .map(|(&uid, _)| uid)
            .collect();
        queued.into_iter().map(|uid| scene.remove_subtree(uid)).sum()
    }

    pub fn connection_count(&self, node: Uid) -> usize {
        self.scene().connections.iter().filter(|c| c.node == node).count()
    }

    /// Fires `signal` on `node`, calling every connected callback with `args`.
    /// Returns the number of callbacks called.
    ///
    /// The scene is unlocked while callbacks run, so they may call back into
    /// the engine.
    ///
    /// # Safety
    ///
    /// Every callback connected to `signal` must be sound to call with `args`.
    pub unsafe fn emit(&self, node: Uid, signal: &str, args: &mut [*mut c_void]) -> usize {
        let callbacks: Vec<SignalCallback> = self
            .scene()
            .connections
            .iter()
            .filter(|c| c.node == node && c.signal.as_bytes() == signal.as_bytes())
            .map(|c| c.callback)
            .collect();
        for callback in &callbacks {
            unsafe { callback(args.as_mut_ptr(), args.len() as u64) };
        }
        callbacks.len()
    }

    /// Drops every node, connection and recorded call.
    pub fn reset(&self) {
        *self.scene() = Scene::default();
    }
}

impl NodeBackend for FakeEngine {
    fn create(&self) -> Uid {
        let mut scene = self.scene();
        scene.calls.push(NativeCall::Create);
        if scene.refuse_create {
            return Uid::INVALID;
        }
        scene.allocate(None)
    }

    fn queue_free(&self, node: Uid) {
        let mut scene = self.scene();
        scene.calls.push(NativeCall::QueueFree(node));
        if let Some(n) = scene.nodes.get_mut(&node) {
            n.queued_free = true;
        }
    }

    fn get_children(&self, node: Uid, out: &mut [Uid]) {
        let mut scene = self.scene();
        scene.calls.push(NativeCall::GetChildren {
            node,
            capacity: out.len(),
        });
        if let Some(n) = scene.nodes.get(&node) {
            for (slot, &child) in out.iter_mut().zip(&n.children) {
                *slot = child;
            }
        }
    }

    fn get_parent(&self, node: Uid) -> Uid {
        let mut scene = self.scene();
        scene.calls.push(NativeCall::GetParent(node));
        scene.parent_of(node)
    }

    /// Nearest ancestor first.
    fn get_parents(&self, node: Uid, out: &mut [Uid]) {
        let mut scene = self.scene();
        scene.calls.push(NativeCall::GetParents {
            node,
            capacity: out.len(),
        });
        let mut current = scene.parent_of(node);
        for slot in out.iter_mut() {
            if !current.is_valid() {
                break;
            }
            *slot = current;
            current = scene.parent_of(current);
        }
    }

    fn get_node(&self, name: &CStr) -> Uid {
        let name = name.to_string_lossy().into_owned();
        let mut scene = self.scene();
        let uid = scene.names.get(&name).copied().unwrap_or(Uid::INVALID);
        scene.calls.push(NativeCall::GetNode(name));
        uid
    }

    fn add_child(&self, parent: Uid, child: Uid) {
        let mut scene = self.scene();
        scene.calls.push(NativeCall::AddChild { parent, child });
        scene.attach(parent, child);
    }

    fn add_children(&self, parent: Uid, children: &[Uid]) {
        let mut scene = self.scene();
        scene.calls.push(NativeCall::AddChildren {
            parent,
            children: children.to_vec(),
        });
        for &child in children {
            scene.attach(parent, child);
        }
    }

    fn connect(&self, node: Uid, signal: &CStr, callback: SignalCallback) {
        let mut scene = self.scene();
        scene.calls.push(NativeCall::Connect {
            node,
            signal: signal.to_string_lossy().into_owned(),
        });
        scene.connections.push(Connection {
            node,
            signal: signal.to_owned(),
            callback,
        });
    }
}

// ============================================================================
// Process-wide instance behind a registered native table
// ============================================================================

static INSTALLED: OnceLock<FakeEngine> = OnceLock::new();

/// Registration generation of the last table [`install`] registered.
static INSTALLED_AT: AtomicU64 = AtomicU64::new(0);

/// Makes [`native_table`] the process-wide table and returns the engine
/// behind it. The engine is created on first use and kept afterwards; call
/// [`FakeEngine::reset`] to start from an empty scene.
///
/// Registering leaks the table (see [`register`](crate::register)), so this
/// only registers when the fake table is not already current.
pub fn install() -> &'static FakeEngine {
    let engine = INSTALLED.get_or_init(FakeEngine::new);
    let current = registry::generation();
    if current == 0 || INSTALLED_AT.load(Ordering::Acquire) != current {
        registry::register(native_table());
        INSTALLED_AT.store(registry::generation(), Ordering::Release);
    }
    engine
}

/// The process-wide engine, if [`install`] has run.
pub fn installed() -> Option<&'static FakeEngine> {
    INSTALLED.get()
}

/// A fully populated table whose slots forward to the installed engine.
///
/// Before [`install`] runs, the slots behave like an engine with no nodes.
pub fn native_table() -> NativeTable {
    let raw = ysnative {
        add_child: Some(fake_add_child),
        add_children: Some(fake_add_children),
        connect: Some(fake_connect),
        get_node: Some(fake_get_node),
        get_parent: Some(fake_get_parent),
        get_parents: Some(fake_get_parents),
        create: Some(fake_create),
        queuefree: Some(fake_queuefree),
        get_children: Some(fake_get_children),
    };
    // The trampolines accept any UID, honor buffer lengths and only borrow names.
    unsafe { NativeTable::from_raw(raw) }
}

/// Element count of a host buffer, or `None` when it does not fit `usize`.
fn buffer_len(buffer: *const u64, count: u64) -> Option<usize> {
    if buffer.is_null() {
        return None;
    }
    usize::try_from(count).ok().filter(|&len| len > 0)
}

unsafe fn out_slice<'a>(buffer: *mut u64, count: u64) -> &'a mut [Uid] {
    match buffer_len(buffer, count) {
        Some(len) => unsafe { slice::from_raw_parts_mut(buffer.cast::<Uid>(), len) },
        None => &mut [],
    }
}

unsafe extern "C" fn fake_create() -> u64 {
    installed().map_or(Uid::INVALID, |e| e.create()).raw()
}

unsafe extern "C" fn fake_queuefree(node: u64) {
    if let Some(engine) = installed() {
        engine.queue_free(Uid::new(node));
    }
}

unsafe extern "C" fn fake_get_children(node: u64, buffer: *mut u64, count: u64) {
    if let Some(engine) = installed() {
        engine.get_children(Uid::new(node), unsafe { out_slice(buffer, count) });
    }
}

unsafe extern "C" fn fake_get_parent(node: u64) -> u64 {
    installed()
        .map_or(Uid::INVALID, |e| e.get_parent(Uid::new(node)))
        .raw()
}

unsafe extern "C" fn fake_get_parents(node: u64, buffer: *mut u64, count: u64) {
    if let Some(engine) = installed() {
        engine.get_parents(Uid::new(node), unsafe { out_slice(buffer, count) });
    }
}

unsafe extern "C" fn fake_get_node(name: *const c_char) -> u64 {
    match installed() {
        Some(engine) if !name.is_null() => {
            engine.get_node(unsafe { CStr::from_ptr(name) }).raw()
        }
        _ => Uid::INVALID.raw(),
    }
}

unsafe extern "C" fn fake_add_child(parent: u64, child: u64) {
    if let Some(engine) = installed() {
        engine.add_child(Uid::new(parent), Uid::new(child));
    }
}

unsafe extern "C" fn fake_add_children(parent: u64, nodes: *mut u64, count: u64) {
    let Some(engine) = installed() else {
        return;
    };
    let children: &[Uid] = match buffer_len(nodes, count) {
        Some(len) => unsafe { slice::from_raw_parts(nodes.cast_const().cast::<Uid>(), len) },
        None => &[],
    };
    engine.add_children(Uid::new(parent), children);
}

unsafe extern "C" fn fake_connect(node: u64, method_name: *const c_char, callback: ysgd_callback) {
    let (Some(engine), Some(callback)) = (installed(), callback) else {
        return;
    };
    if method_name.is_null() {
        return;
    }
    engine.connect(Uid::new(node), unsafe { CStr::from_ptr(method_name) }, callback);
}

#[cfg(test)]
mod tests {
    use super::*;

    static FIRED: AtomicU64 = AtomicU64::new(0);

    unsafe extern "C" fn count_args(_argv: *mut *mut c_void, argc: u64) {
        FIRED.fetch_add(argc, Ordering::SeqCst);
    }

    #[test]
    fn creates_sequential_uids() {
        let engine = FakeEngine::new();
        assert_eq!(engine.create(), Uid::new(0));
        assert_eq!(engine.create(), Uid::new(1));
    }

    #[test]
    fn refusing_create_returns_sentinel() {
        let engine = FakeEngine::new();
        engine.refuse_create(true);
        assert_eq!(engine.create(), Uid::INVALID);
        engine.refuse_create(false);
        assert!(engine.create().is_valid());
    }

    #[test]
    fn add_child_rejects_cycles_and_reparenting() {
        let engine = FakeEngine::new();
        let a = engine.create();
        let b = engine.create();
        let c = engine.create();
        engine.add_child(a, b);
        engine.add_child(b, a);
        engine.add_child(c, b);
        engine.add_child(a, a);

        assert_eq!(engine.get_parent(b), a);
        assert_eq!(engine.get_parent(a), Uid::INVALID);
        let mut out = [Uid::INVALID; 4];
        engine.get_children(c, &mut out);
        assert_eq!(out, [Uid::INVALID; 4]);
    }

    #[test]
    fn process_frees_removes_subtrees() {
        let engine = FakeEngine::new();
        let root = engine.spawn("Root");
        let child = engine.create();
        let grandchild = engine.create();
        let other = engine.create();
        engine.add_child(root, child);
        engine.add_child(child, grandchild);
        engine.add_child(root, other);

        engine.queue_free(child);
        assert!(engine.contains(child));
        assert_eq!(engine.process_frees(), 2);
        assert!(!engine.contains(child));
        assert!(!engine.contains(grandchild));

        let mut out = [Uid::INVALID; 4];
        engine.get_children(root, &mut out);
        assert_eq!(out[..2], [other, Uid::INVALID]);
    }

    #[test]
    fn freeing_a_named_node_forgets_its_name() {
        let engine = FakeEngine::new();
        let uid = engine.spawn("Temp");
        engine.queue_free(uid);
        engine.process_frees();
        assert_eq!(engine.get_node(c"Temp"), Uid::INVALID);
    }

    #[test]
    fn freeing_a_shadowed_name_keeps_the_newer_node() {
        let engine = FakeEngine::new();
        let older = engine.spawn("Player");
        let newer = engine.spawn("Player");
        engine.queue_free(older);
        engine.process_frees();
        assert_eq!(engine.get_node(c"Player"), newer);
    }

    #[test]
    fn host_buffer_length_must_fit_usize() {
        let mut storage = [0u64; 2];
        assert_eq!(buffer_len(storage.as_mut_ptr(), 2), Some(2));
        assert_eq!(buffer_len(storage.as_mut_ptr(), 0), None);
        assert_eq!(buffer_len(std::ptr::null(), 2), None);
        if usize::BITS < u64::BITS {
            assert_eq!(buffer_len(storage.as_mut_ptr(), u64::MAX), None);
        }
    }

    #[test]
    fn emit_calls_matching_connections() {
        let engine = FakeEngine::new();
        let node = engine.create();
        let other = engine.create();
        engine.connect(node, c"pressed", count_args);
        engine.connect(node, c"pressed", count_args);
        engine.connect(node, c"released", count_args);
        engine.connect(other, c"pressed", count_args);
        assert_eq!(engine.connection_count(node), 3);

        let mut payload = 0u32;
        let mut args = [(&raw mut payload).cast::<c_void>()];
        let before = FIRED.load(Ordering::SeqCst);
        let called = unsafe { engine.emit(node, "pressed", &mut args) };
        assert_eq!(called, 2);
        assert_eq!(FIRED.load(Ordering::SeqCst) - before, 2);
    }

    #[test]
    fn reset_clears_everything() {
        let engine = FakeEngine::new();
        let uid = engine.spawn("Gone");
        engine.create();
        engine.reset();
        assert!(!engine.contains(uid));
        assert!(engine.calls().is_empty());
        assert_eq!(engine.create(), Uid::new(0));
    }
}
